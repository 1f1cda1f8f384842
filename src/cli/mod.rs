pub mod report;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "ventas",
    version,
    about = "Monthly sales report and charts for Lista_Ventas_Detalle.csv."
)]
pub struct Cli {
    /// Print the text report only; do not open charts
    #[arg(long = "no-charts")]
    pub no_charts: bool,

    /// Log pipeline diagnostics (dropped rows, window size) to stderr
    #[arg(short, long)]
    pub verbose: bool,
}
