use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use plotters::prelude::*;
use tracing::{debug, warn};

use crate::error::Result;
use crate::fmt::{thousands, units};
use crate::models::{Tier, YearMonth};
use crate::reports::SalesReport;
use crate::settings::ChartSettings;

const FONT: &str = "sans-serif";
const TITLE_SIZE: f64 = 24.0;
const LABEL_SIZE: f64 = 14.0;

/// Bottom-to-top stacking order for the monthly tier chart.
const STACK_ORDER: [Tier; 3] = [Tier::LowVolume, Tier::Intermediate, Tier::MostSold];

const PAGE_STYLE: &str = "body{font-family:sans-serif;margin:24px;color:#222}\
figure{margin:0}\
table{border-collapse:collapse;margin-top:16px;font-size:13px}\
th,td{border:1px solid #ccc;padding:4px 8px}\
td.num{text-align:right}\
summary{cursor:pointer;font-weight:bold;margin-top:16px}";

// ---------------------------------------------------------------------------
// Rendered output
// ---------------------------------------------------------------------------

/// Tabular data behind a chart, listed under it on the page.
#[derive(Debug, Clone, Default)]
pub struct DetailTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub title: String,
    pub size: (u32, u32),
    pub svg: String,
    /// Bounds of the value axis; `None` for charts without one.
    pub value_axis: Option<Range<f64>>,
    pub detail: DetailTable,
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn looks_numeric(cell: &str) -> bool {
    !cell.is_empty() && cell.chars().all(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
}

impl RenderedChart {
    pub fn to_html(&self) -> String {
        let mut table = String::from("<table>\n<tr>");
        for h in &self.detail.headers {
            table.push_str(&format!("<th>{}</th>", escape_html(h)));
        }
        table.push_str("</tr>\n");
        for row in &self.detail.rows {
            table.push_str("<tr>");
            for cell in row {
                let class = if looks_numeric(cell) { " class=\"num\"" } else { "" };
                table.push_str(&format!("<td{class}>{}</td>", escape_html(cell)));
            }
            table.push_str("</tr>\n");
        }
        table.push_str("</table>");

        format!(
            "<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{title}</title>\n<style>{PAGE_STYLE}</style>\n</head>\n<body>\n\
             <figure>\n{svg}\n</figure>\n<details open>\n<summary>Detalle</summary>\n{table}\n\
             </details>\n</body>\n</html>\n",
            title = escape_html(&self.title),
            svg = self.svg,
        )
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

pub trait ChartViewer {
    fn show(&mut self, chart: &RenderedChart) -> Result<()>;
}

const PAGE_PREFIX: &str = "ventas-";
const PAGE_DIR: &str = "ventas-charts";

/// Writes each chart page into a scratch directory and hands it to the
/// desktop's default browser. Pages from the previous run are removed when
/// the viewer is created; the current run's pages stay until the next one so
/// the browser can still load them after the process exits.
#[derive(Debug)]
pub struct BrowserViewer {
    pub dir: PathBuf,
    pub pages: Vec<PathBuf>,
}

impl BrowserViewer {
    pub fn new() -> Result<Self> {
        Self::in_dir(std::env::temp_dir().join(PAGE_DIR))
    }

    pub fn in_dir(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        let mut removed = 0;
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_page = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(PAGE_PREFIX) && n.ends_with(".html"));
            if is_page {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        debug!(dir = %dir.display(), removed, "cleared previous chart pages");
        Ok(Self {
            dir,
            pages: Vec::new(),
        })
    }
}

impl ChartViewer for BrowserViewer {
    fn show(&mut self, chart: &RenderedChart) -> Result<()> {
        let mut file = tempfile::Builder::new()
            .prefix(PAGE_PREFIX)
            .suffix(".html")
            .tempfile_in(&self.dir)?;
        file.write_all(chart.to_html().as_bytes())?;
        let (_, path) = file.keep().map_err(|e| e.error)?;
        debug!(path = %path.display(), title = %chart.title, "wrote chart page");

        if let Err(e) = open_in_browser(&path) {
            warn!(path = %path.display(), "could not open chart page: {e}");
        }
        self.pages.push(path);
        Ok(())
    }
}

fn open_in_browser(path: &Path) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    let mut cmd = {
        let mut c = Command::new("open");
        c.arg(path);
        c
    };
    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]).arg(path);
        c
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut cmd = {
        let mut c = Command::new("xdg-open");
        c.arg(path);
        c
    };
    cmd.stdout(Stdio::null()).stderr(Stdio::null()).spawn()?;
    Ok(())
}

/// Render every chart and pass each one to `viewer`. Returns how many were shown.
pub fn show_all(
    report: &SalesReport,
    settings: &ChartSettings,
    viewer: &mut dyn ChartViewer,
) -> Result<usize> {
    let charts = render_all(report, settings)?;
    for chart in &charts {
        viewer.show(chart)?;
    }
    Ok(charts.len())
}

pub fn render_all(report: &SalesReport, settings: &ChartSettings) -> Result<Vec<RenderedChart>> {
    Ok(vec![
        monthly_trend(report, settings)?,
        product_history(report, settings)?,
        product_ranking(report, settings)?,
        tier_share(report, settings)?,
        monthly_by_tier(report, settings)?,
    ])
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn rgb(c: (u8, u8, u8)) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

/// Value axis covering zero and every value, with 10% headroom on each side
/// that has data. Returns and credit notes can push values below zero.
fn value_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let bottom = lo * 1.1;
    let top = if hi > 0.0 {
        hi * 1.1
    } else if bottom < 0.0 {
        0.0
    } else {
        1.0
    };
    bottom..top
}

/// Category axis with exactly `n` slots. Integer ranges are inclusive of
/// their end once segmented, and a single-value range has no width.
fn slots(n: usize) -> Range<usize> {
    0..n.max(2) - 1
}

fn segment_label(v: &SegmentValue<usize>, labels: &[String]) -> String {
    match v {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
            labels.get(*i).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    }
}

fn distinct_months<'a>(months: impl Iterator<Item = &'a YearMonth>) -> Vec<YearMonth> {
    months.copied().collect::<BTreeSet<_>>().into_iter().collect()
}

// ---------------------------------------------------------------------------
// 1. Monthly trend
// ---------------------------------------------------------------------------

fn monthly_trend(report: &SalesReport, settings: &ChartSettings) -> anyhow::Result<RenderedChart> {
    let n = report.monthly.len();
    let labels = &report.month_labels;
    let range = value_range(report.monthly.iter().map(|m| m.amount));
    let points: Vec<(SegmentValue<usize>, f64)> = report
        .monthly
        .iter()
        .enumerate()
        .map(|(i, m)| (SegmentValue::CenterOf(i), m.amount))
        .collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, settings.trend_size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(&settings.titles.trend, (FONT, TITLE_SIZE).into_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(110)
            .build_cartesian_2d(slots(n).into_segmented(), range.clone())?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|v| segment_label(v, labels))
            .y_label_formatter(&|v| thousands(*v))
            .x_desc("Mes")
            .y_desc("Total de Ventas (Soles)")
            .label_style((FONT, LABEL_SIZE).into_font())
            .draw()?;
        chart.draw_series(LineSeries::new(points.clone(), BLUE.stroke_width(3)))?;
        chart.draw_series(points.into_iter().map(|p| Circle::new(p, 5, BLUE.filled())))?;
        root.present()?;
    }

    let rows = report
        .monthly
        .iter()
        .zip(labels)
        .map(|(m, label)| vec![m.month.to_string(), label.clone(), thousands(m.amount)])
        .collect();
    Ok(RenderedChart {
        title: settings.titles.trend.clone(),
        size: settings.trend_size,
        svg,
        value_axis: Some(range),
        detail: DetailTable {
            headers: vec!["Mes".into(), "Etiqueta".into(), "Total de Ventas (Soles)".into()],
            rows,
        },
    })
}

// ---------------------------------------------------------------------------
// 2. Per-product history
// ---------------------------------------------------------------------------

fn product_history(report: &SalesReport, settings: &ChartSettings) -> anyhow::Result<RenderedChart> {
    let grid = &report.product_monthly;
    let months = distinct_months(grid.iter().map(|p| &p.month));
    let month_index: HashMap<YearMonth, usize> =
        months.iter().enumerate().map(|(i, m)| (*m, i)).collect();
    let labels: Vec<String> = months.iter().map(YearMonth::to_string).collect();
    let products: BTreeSet<&str> = grid.iter().map(|p| p.product.as_str()).collect();
    let range = value_range(grid.iter().map(|p| p.amount));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, settings.history_size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(&settings.titles.product_history, (FONT, TITLE_SIZE).into_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(110)
            .build_cartesian_2d(slots(months.len()).into_segmented(), range.clone())?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(months.len())
            .x_label_formatter(&|v| segment_label(v, &labels))
            .y_label_formatter(&|v| thousands(*v))
            .x_desc("Mes")
            .y_desc("Total de Ventas (Soles)")
            .label_style((FONT, LABEL_SIZE).into_font())
            .draw()?;

        for (idx, product) in products.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            let points: Vec<(SegmentValue<usize>, f64)> = grid
                .iter()
                .filter(|p| p.product == *product)
                .map(|p| (SegmentValue::CenterOf(month_index[&p.month]), p.amount))
                .collect();
            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(4)))?
                .label(*product)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(4)));
            chart.draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font((FONT, 12.0).into_font())
            .draw()?;
        root.present()?;
    }

    let rows = grid
        .iter()
        .map(|p| vec![p.month.to_string(), p.product.clone(), thousands(p.amount)])
        .collect();
    Ok(RenderedChart {
        title: settings.titles.product_history.clone(),
        size: settings.history_size,
        svg,
        value_axis: Some(range),
        detail: DetailTable {
            headers: vec!["Mes".into(), "Producto".into(), "Total de Ventas (Soles)".into()],
            rows,
        },
    })
}

// ---------------------------------------------------------------------------
// 3. Ranking by units
// ---------------------------------------------------------------------------

fn product_ranking(report: &SalesReport, settings: &ChartSettings) -> anyhow::Result<RenderedChart> {
    let ranking = &report.ranking;
    let n = ranking.len();
    let (width, min_height) = settings.ranking_size;
    let height = min_height.max(settings.ranking_row_height.saturating_mul(n as u32));
    let range = value_range(ranking.iter().map(|p| p.quantity));
    // Rank 0 sits in the highest row.
    let row_names: Vec<String> = ranking.iter().rev().map(|p| p.product.clone()).collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(&settings.titles.ranking, (FONT, TITLE_SIZE).into_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(300)
            .build_cartesian_2d(range.clone(), slots(n).into_segmented())?;
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&|v| segment_label(v, &row_names))
            .x_label_formatter(&|v| units(*v))
            .x_desc("Cantidad de Unidades Vendidas")
            .y_desc("Producto")
            .label_style((FONT, LABEL_SIZE).into_font())
            .draw()?;

        for tier in Tier::ALL {
            let color = rgb(settings.tier_color(tier));
            let bars: Vec<Rectangle<(f64, SegmentValue<usize>)>> = ranking
                .iter()
                .enumerate()
                .filter(|(_, p)| p.tier == tier)
                .map(|(rank, p)| {
                    let row = n - 1 - rank;
                    let mut bar = Rectangle::new(
                        [
                            (0.0, SegmentValue::Exact(row)),
                            (p.quantity, SegmentValue::Exact(row + 1)),
                        ],
                        color.filled(),
                    );
                    bar.set_margin(3, 3, 0, 0);
                    bar
                })
                .collect();
            if bars.is_empty() {
                continue;
            }
            chart
                .draw_series(bars)?
                .label(tier.label())
                .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 16, y + 6)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font((FONT, LABEL_SIZE).into_font())
            .draw()?;
        root.present()?;
    }

    let rows = ranking
        .iter()
        .enumerate()
        .map(|(rank, p)| {
            vec![
                (rank + 1).to_string(),
                p.product.clone(),
                units(p.quantity),
                p.tier.label().to_string(),
            ]
        })
        .collect();
    Ok(RenderedChart {
        title: settings.titles.ranking.clone(),
        size: (width, height),
        svg,
        value_axis: Some(range),
        detail: DetailTable {
            headers: vec![
                "#".into(),
                "Producto".into(),
                "Cantidad Vendida".into(),
                "Categoría".into(),
            ],
            rows,
        },
    })
}

// ---------------------------------------------------------------------------
// 4. Tier share
// ---------------------------------------------------------------------------

fn tier_share(report: &SalesReport, settings: &ChartSettings) -> anyhow::Result<RenderedChart> {
    let totals: Vec<(Tier, f64)> = Tier::ALL
        .iter()
        .map(|&tier| {
            let units: f64 = report
                .ranking
                .iter()
                .filter(|p| p.tier == tier)
                .map(|p| p.quantity)
                .sum();
            (tier, units)
        })
        .filter(|(_, units)| *units > 0.0)
        .collect();
    let sum: f64 = totals.iter().map(|(_, u)| u).sum();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, settings.tier_share_size).into_drawing_area();
        root.fill(&WHITE)?;
        let area = root.titled(&settings.titles.tier_share, (FONT, TITLE_SIZE).into_font())?;
        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = w.min(h) as f64 * 0.35;

        if totals.is_empty() {
            area.draw(&Text::new(
                "Sin unidades vendidas",
                (center.0 - 80, center.1),
                (FONT, LABEL_SIZE + 4.0).into_font(),
            ))?;
        }

        // Start at twelve o'clock, clockwise.
        let mut start = -90.0f64;
        for (tier, qty) in &totals {
            let sweep = qty / sum * 360.0;
            let color = rgb(settings.tier_color(*tier));
            let steps = (sweep.ceil() as usize).max(1);
            let mut outline = vec![center];
            for s in 0..=steps {
                let a = (start + sweep * s as f64 / steps as f64).to_radians();
                outline.push((
                    center.0 + (radius * a.cos()).round() as i32,
                    center.1 + (radius * a.sin()).round() as i32,
                ));
            }
            area.draw(&Polygon::new(outline, color.filled()))?;

            let mid = (start + sweep / 2.0).to_radians();
            let anchor = (
                center.0 + (radius * 1.15 * mid.cos()) as i32 - 60,
                center.1 + (radius * 1.15 * mid.sin()) as i32,
            );
            area.draw(&Text::new(
                format!("{}: {} ({:.1}%)", tier.label(), units(*qty), qty / sum * 100.0),
                anchor,
                (FONT, LABEL_SIZE + 2.0).into_font(),
            ))?;
            start += sweep;
        }
        root.present()?;
    }

    let rows = totals
        .iter()
        .map(|(tier, qty)| {
            let products = report.ranking.iter().filter(|p| p.tier == *tier).count();
            vec![
                tier.label().to_string(),
                products.to_string(),
                units(*qty),
                format!("{:.1}", qty / sum * 100.0),
            ]
        })
        .collect();
    Ok(RenderedChart {
        title: settings.titles.tier_share.clone(),
        size: settings.tier_share_size,
        svg,
        value_axis: None,
        detail: DetailTable {
            headers: vec![
                "Categoría".into(),
                "Productos".into(),
                "Cantidad Vendida".into(),
                "%".into(),
            ],
            rows,
        },
    })
}

// ---------------------------------------------------------------------------
// 5. Monthly units stacked by tier
// ---------------------------------------------------------------------------

fn monthly_by_tier(report: &SalesReport, settings: &ChartSettings) -> anyhow::Result<RenderedChart> {
    let detail = &report.category_detail;
    let months = distinct_months(detail.iter().map(|d| &d.month));
    let month_index: HashMap<YearMonth, usize> =
        months.iter().enumerate().map(|(i, m)| (*m, i)).collect();
    let labels: Vec<String> = months.iter().map(YearMonth::to_string).collect();

    // Running stack heights in drawing order, so negative segments stay on the axis.
    let mut running = vec![0.0f64; months.len()];
    let mut stack_edges = Vec::with_capacity(detail.len());
    for tier in STACK_ORDER {
        for d in detail.iter().filter(|d| d.tier == tier) {
            let i = month_index[&d.month];
            running[i] += d.quantity;
            stack_edges.push(running[i]);
        }
    }
    let range = value_range(stack_edges);

    let mut svg = String::new();
    {
        let root =
            SVGBackend::with_string(&mut svg, settings.monthly_by_tier_size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(&settings.titles.monthly_by_tier, (FONT, TITLE_SIZE).into_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d(slots(months.len()).into_segmented(), range.clone())?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(months.len())
            .x_label_formatter(&|v| segment_label(v, &labels))
            .y_label_formatter(&|v| units(*v))
            .x_desc("Mes")
            .y_desc("Cantidad Vendida")
            .label_style((FONT, LABEL_SIZE).into_font())
            .draw()?;

        let mut base = vec![0.0f64; months.len()];
        for tier in STACK_ORDER {
            let color = rgb(settings.tier_color(tier));
            let mut segments = Vec::new();
            for d in detail.iter().filter(|d| d.tier == tier) {
                let i = month_index[&d.month];
                let corners = [
                    (SegmentValue::Exact(i), base[i]),
                    (SegmentValue::Exact(i + 1), base[i] + d.quantity),
                ];
                base[i] += d.quantity;
                segments.push(corners);
            }
            if segments.is_empty() {
                continue;
            }

            chart
                .draw_series(segments.iter().map(|corners| {
                    let mut bar = Rectangle::new(corners.clone(), color.filled());
                    bar.set_margin(0, 0, 8, 8);
                    bar
                }))?
                .label(tier.label())
                .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 16, y + 6)], color.filled()));
            // Product boundaries inside each tier block.
            chart.draw_series(segments.into_iter().map(|corners| {
                let mut edge = Rectangle::new(corners, WHITE.stroke_width(1));
                edge.set_margin(0, 0, 8, 8);
                edge
            }))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font((FONT, LABEL_SIZE).into_font())
            .draw()?;
        root.present()?;
    }

    let mut ordered: Vec<_> = detail.iter().collect();
    ordered.sort_by_key(|d| (d.month, STACK_ORDER.iter().position(|t| *t == d.tier)));
    let rows = ordered
        .into_iter()
        .map(|d| {
            vec![
                d.month.to_string(),
                d.product.clone(),
                d.tier.label().to_string(),
                units(d.quantity),
            ]
        })
        .collect();
    Ok(RenderedChart {
        title: settings.titles.monthly_by_tier.clone(),
        size: settings.monthly_by_tier_size,
        svg,
        value_axis: Some(range),
        detail: DetailTable {
            headers: vec![
                "Mes".into(),
                "Producto".into(),
                "Categoría".into(),
                "Cantidad Vendida".into(),
            ],
            rows,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DropStats, SalesRecord};
    use crate::reports::build_report;
    use crate::settings::{DateWindow, TierThresholds};
    use chrono::NaiveDate;

    #[derive(Default)]
    struct Recording {
        titles: Vec<String>,
    }

    impl ChartViewer for Recording {
        fn show(&mut self, chart: &RenderedChart) -> Result<()> {
            self.titles.push(chart.title.clone());
            Ok(())
        }
    }

    fn rec(y: i32, m: u32, d: u32, product: &str, quantity: f64, amount: f64) -> SalesRecord {
        SalesRecord {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            product: product.to_string(),
            quantity,
            amount,
        }
    }

    fn report_with_products(count: usize) -> SalesReport {
        let mut records = Vec::new();
        for i in 0..count {
            records.push(rec(2024, 7, 3, &format!("Producto {i:02}"), (count - i) as f64, 10.0));
            records.push(rec(2025, 7, 3, &format!("Producto {i:02}"), 1.0, 5.0));
        }
        build_report(&records, DateWindow::default(), &TierThresholds::default(), DropStats::default())
    }

    #[test]
    fn test_render_all_produces_five_charts_in_order() {
        let settings = ChartSettings::default();
        let charts = render_all(&report_with_products(3), &settings).unwrap();
        let titles: Vec<&str> = charts.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                settings.titles.trend.as_str(),
                settings.titles.product_history.as_str(),
                settings.titles.ranking.as_str(),
                settings.titles.tier_share.as_str(),
                settings.titles.monthly_by_tier.as_str(),
            ]
        );
        for chart in &charts {
            assert!(chart.svg.contains("<svg"), "{}", chart.title);
        }
        assert!(charts[0].svg.contains("Tendencia de Ventas Mensuales"));
    }

    #[test]
    fn test_trend_detail_uses_custom_month_labels() {
        let charts = render_all(&report_with_products(2), &ChartSettings::default()).unwrap();
        let rows = &charts[0].detail.rows;
        // July 2024 through July 2025, zero-filled.
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[0][1], "julio(2024)");
        assert_eq!(rows[12][1], "julio(2025)");
        assert_eq!(rows[1][2], "0.00");
    }

    #[test]
    fn test_ranking_height_grows_with_products() {
        let settings = ChartSettings::default();
        let small = render_all(&report_with_products(3), &settings).unwrap();
        assert_eq!(small[2].size, (1600, 600));
        let large = render_all(&report_with_products(40), &settings).unwrap();
        assert_eq!(large[2].size, (1600, 1600));
        assert_eq!(large[2].detail.rows.len(), 40);
        assert_eq!(large[2].detail.rows[0][3], "Más Vendido");
        assert_eq!(large[2].detail.rows[10][3], "Intermedio");
        assert_eq!(large[2].detail.rows[39][3], "Casi Nada");
    }

    #[test]
    fn test_tier_share_rows_cover_all_units() {
        let report = report_with_products(40);
        let charts = render_all(&report, &ChartSettings::default()).unwrap();
        let share = &charts[3].detail;
        assert_eq!(share.rows.len(), 3);
        let products: usize = share.rows.iter().map(|r| r[1].parse::<usize>().unwrap()).sum();
        assert_eq!(products, 40);
    }

    #[test]
    fn test_monthly_by_tier_detail_stacks_low_volume_first() {
        let charts = render_all(&report_with_products(40), &ChartSettings::default()).unwrap();
        let rows = &charts[4].detail.rows;
        assert_eq!(rows.len(), 80);
        assert_eq!(rows[0][0], "2024-07");
        assert_eq!(rows[0][2], "Casi Nada");
        assert_eq!(rows[39][2], "Más Vendido");
        assert_eq!(rows[40][0], "2025-07");
    }

    #[test]
    fn test_single_product_single_month_renders() {
        let records = vec![rec(2024, 9, 1, "Arroz", 2.0, 20.0)];
        let report =
            build_report(&records, DateWindow::default(), &TierThresholds::default(), DropStats::default());
        let charts = render_all(&report, &ChartSettings::default()).unwrap();
        assert_eq!(charts.len(), 5);
    }

    #[test]
    fn test_show_all_hands_every_chart_to_viewer() {
        let mut viewer = Recording::default();
        let shown = show_all(&report_with_products(5), &ChartSettings::default(), &mut viewer).unwrap();
        assert_eq!(shown, 5);
        assert_eq!(viewer.titles.len(), 5);
    }

    #[test]
    fn test_html_page_escapes_and_lists_detail() {
        let chart = RenderedChart {
            title: "Ventas <A&B>".into(),
            size: (10, 10),
            svg: "<svg></svg>".into(),
            value_axis: None,
            detail: DetailTable {
                headers: vec!["Producto".into(), "Cantidad".into()],
                rows: vec![vec!["Pan & Queso".into(), "1,200".into()]],
            },
        };
        let html = chart.to_html();
        assert!(html.contains("<title>Ventas &lt;A&amp;B&gt;</title>"));
        assert!(html.contains("<svg></svg>"));
        assert!(html.contains("<td>Pan &amp; Queso</td>"));
        assert!(html.contains("<td class=\"num\">1,200</td>"));
        assert!(html.contains("<meta charset=\"utf-8\">"));
    }

    #[test]
    fn test_value_range_covers_negatives() {
        let r = value_range([100.0, -50.0]);
        assert!((r.start + 55.0).abs() < 1e-9, "{r:?}");
        assert!((r.end - 110.0).abs() < 1e-9, "{r:?}");
        assert_eq!(value_range([0.0, 0.0]), 0.0..1.0);
        assert_eq!(value_range(Vec::new()), 0.0..1.0);
        let r = value_range([-4.0]);
        assert!((r.start + 4.4).abs() < 1e-9, "{r:?}");
        assert_eq!(r.end, 0.0);
    }

    #[test]
    fn test_charts_include_negative_values_on_axis() {
        let records = vec![
            rec(2024, 7, 2, "Arroz", 4.0, 100.0),
            rec(2024, 8, 2, "Arroz", -6.0, -50.0),
        ];
        let report =
            build_report(&records, DateWindow::default(), &TierThresholds::default(), DropStats::default());
        let charts = render_all(&report, &ChartSettings::default()).unwrap();

        let trend = charts[0].value_axis.clone().unwrap();
        assert!(trend.start <= -50.0 && trend.end >= 100.0, "{trend:?}");
        let history = charts[1].value_axis.clone().unwrap();
        assert!(history.start <= -50.0, "{history:?}");
        // Arroz nets -2 units overall.
        let ranking = charts[2].value_axis.clone().unwrap();
        assert!(ranking.start <= -2.0 && ranking.end >= 0.0, "{ranking:?}");
        assert!(charts[3].value_axis.is_none());
        let stacked = charts[4].value_axis.clone().unwrap();
        assert!(stacked.start <= -6.0 && stacked.end >= 4.0, "{stacked:?}");
    }

    #[test]
    fn test_browser_viewer_clears_previous_pages() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("ventas-abc123.html");
        let unrelated = dir.path().join("notas.txt");
        std::fs::write(&stale, "<html></html>").unwrap();
        std::fs::write(&unrelated, "keep").unwrap();

        let viewer = BrowserViewer::in_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(viewer.dir, dir.path());
        assert!(viewer.pages.is_empty());
        assert!(!stale.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn test_browser_viewer_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("charts");
        BrowserViewer::in_dir(nested.clone()).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_slots_has_requested_width() {
        assert_eq!(slots(1), 0..1);
        assert_eq!(slots(2), 0..1);
        assert_eq!(slots(13), 0..12);
    }
}
