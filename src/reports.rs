use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Datelike;
use tracing::{debug, info};

use crate::error::Result;
use crate::importer;
use crate::models::{
    CategoryDetail, DropStats, MonthlyTotal, ProductMonth, RankedProduct, SalesRecord, Tier,
    YearMonth,
};
use crate::settings::{DateWindow, ReportSettings, TierThresholds};

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Setiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get((month as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("")
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct SalesReport {
    pub window: DateWindow,
    pub stats: DropStats,
    pub rows_in_window: usize,
    pub monthly: Vec<MonthlyTotal>,
    pub month_labels: Vec<String>,
    pub total: f64,
    pub product_monthly: Vec<ProductMonth>,
    pub ranking: Vec<RankedProduct>,
    pub category_detail: Vec<CategoryDetail>,
}

pub enum Outcome {
    Report(SalesReport),
    /// Nothing survived the date filter.
    NoDataInRange,
}

/// Load, clean, filter and aggregate the export named in `settings`.
pub fn generate(settings: &ReportSettings) -> Result<Outcome> {
    let table = importer::load_table(&settings.input_file)?;
    let cleaned = importer::clean(&table, &settings.columns)?;
    if cleaned.stats.dropped() > 0 {
        info!(
            dropped = cleaned.stats.dropped(),
            read = cleaned.stats.read,
            "discarded rows with missing or unparsable fields"
        );
    }

    let records = filter_window(cleaned.records, &settings.window);
    debug!(
        rows = records.len(),
        start = %settings.window.start,
        end = %settings.window.end,
        "filtered to date window"
    );
    if records.is_empty() {
        return Ok(Outcome::NoDataInRange);
    }

    Ok(Outcome::Report(build_report(
        &records,
        settings.window,
        &settings.thresholds,
        cleaned.stats,
    )))
}

pub fn build_report(
    records: &[SalesRecord],
    window: DateWindow,
    thresholds: &TierThresholds,
    stats: DropStats,
) -> SalesReport {
    let monthly = monthly_totals(records);
    let months: Vec<YearMonth> = monthly.iter().map(|m| m.month).collect();
    let ranking = rank_products(records, thresholds);
    let category_detail = category_detail(records, &ranking);
    SalesReport {
        window,
        stats,
        rows_in_window: records.len(),
        month_labels: month_labels(&months, &window),
        monthly,
        total: grand_total(records),
        product_monthly: product_monthly(records),
        ranking,
        category_detail,
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

pub fn filter_window(records: Vec<SalesRecord>, window: &DateWindow) -> Vec<SalesRecord> {
    records
        .into_iter()
        .filter(|r| window.contains(r.date))
        .collect()
}

// ---------------------------------------------------------------------------
// Monthly totals
// ---------------------------------------------------------------------------

/// Amount per calendar month from the first month with data to the last,
/// with empty months in between reported as zero.
pub fn monthly_totals(records: &[SalesRecord]) -> Vec<MonthlyTotal> {
    let mut by_month: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for r in records {
        *by_month.entry(r.month()).or_default() += r.amount;
    }
    let (Some(&first), Some(&last)) = (by_month.keys().next(), by_month.keys().next_back()) else {
        return Vec::new();
    };

    let mut months = Vec::new();
    let mut current = first;
    while current <= last {
        months.push(MonthlyTotal {
            month: current,
            amount: by_month.get(&current).copied().unwrap_or(0.0),
        });
        current = current.succ();
    }
    months
}

/// Spanish month names for axis ticks. July of the window's first and last
/// year is labelled with its year, e.g. `julio(2024)` and `julio(2025)`.
pub fn month_labels(months: &[YearMonth], window: &DateWindow) -> Vec<String> {
    let marked_years = [window.start.year(), window.end.year()];
    months
        .iter()
        .map(|m| {
            let name = month_name(m.month);
            if m.month == 7 && marked_years.contains(&m.year) {
                format!("{}({})", name.to_lowercase(), m.year)
            } else {
                name.to_string()
            }
        })
        .collect()
}

pub fn grand_total(records: &[SalesRecord]) -> f64 {
    records.iter().map(|r| r.amount).sum()
}

// ---------------------------------------------------------------------------
// Per-product monthly grid
// ---------------------------------------------------------------------------

/// Amount per (month, product) for every month with data and every product,
/// zero where a product had no sales that month.
pub fn product_monthly(records: &[SalesRecord]) -> Vec<ProductMonth> {
    let mut sums: HashMap<(YearMonth, &str), f64> = HashMap::new();
    let mut months: BTreeSet<YearMonth> = BTreeSet::new();
    let mut products: BTreeSet<&str> = BTreeSet::new();
    for r in records {
        months.insert(r.month());
        products.insert(r.product.as_str());
        *sums.entry((r.month(), r.product.as_str())).or_default() += r.amount;
    }

    let mut grid = Vec::with_capacity(months.len() * products.len());
    for &month in &months {
        for &product in &products {
            grid.push(ProductMonth {
                month,
                product: product.to_string(),
                amount: sums.get(&(month, product)).copied().unwrap_or(0.0),
            });
        }
    }
    grid
}

// ---------------------------------------------------------------------------
// Ranking and tiers
// ---------------------------------------------------------------------------

/// Units sold per product, highest first. Equal totals are ordered by
/// product name.
pub fn rank_products(records: &[SalesRecord], thresholds: &TierThresholds) -> Vec<RankedProduct> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for r in records {
        *totals.entry(r.product.as_str()).or_default() += r.quantity;
    }

    let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .enumerate()
        .map(|(rank, (product, quantity))| RankedProduct {
            product: product.to_string(),
            quantity,
            tier: thresholds.tier_for_rank(rank),
        })
        .collect()
}

/// Units per (month, product, tier), tier joined from the ranking.
pub fn category_detail(records: &[SalesRecord], ranking: &[RankedProduct]) -> Vec<CategoryDetail> {
    let tiers: HashMap<&str, Tier> = ranking
        .iter()
        .map(|p| (p.product.as_str(), p.tier))
        .collect();

    let mut sums: BTreeMap<(YearMonth, &str, Tier), f64> = BTreeMap::new();
    for r in records {
        let tier = tiers
            .get(r.product.as_str())
            .copied()
            .unwrap_or(Tier::LowVolume);
        *sums.entry((r.month(), r.product.as_str(), tier)).or_default() += r.quantity;
    }

    sums.into_iter()
        .map(|((month, product, tier), quantity)| CategoryDetail {
            month,
            product: product.to_string(),
            tier,
            quantity,
        })
        .collect()
}
