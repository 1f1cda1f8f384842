pub mod text;

use tracing::{debug, info};

use crate::error::Result;
use crate::reports::{self, Outcome};
use crate::settings::ReportSettings;

pub const NO_DATA_MESSAGE: &str =
    "No se encontraron datos de ventas en el rango de fechas especificado.";

/// Build the report from the fixed settings, print it, then show the charts.
pub fn run(no_charts: bool) -> Result<()> {
    let settings = ReportSettings::default();
    let report = match reports::generate(&settings)? {
        Outcome::Report(report) => report,
        Outcome::NoDataInRange => {
            println!("{NO_DATA_MESSAGE}");
            return Ok(());
        }
    };

    debug!(
        read = report.stats.read,
        kept = report.stats.kept,
        in_window = report.rows_in_window,
        products = report.ranking.len(),
        "report built"
    );
    print!("{}", text::format_summary(&report, &settings));

    #[cfg(feature = "charts")]
    if !no_charts {
        let chart_settings = crate::settings::ChartSettings::default();
        let mut viewer = crate::charts::BrowserViewer::new()?;
        let shown = crate::charts::show_all(&report, &chart_settings, &mut viewer)?;
        info!(charts = shown, dir = %viewer.dir.display(), "charts displayed");
        return Ok(());
    }

    #[cfg(not(feature = "charts"))]
    let _ = no_charts;
    info!("charts skipped");
    Ok(())
}
