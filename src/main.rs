#[cfg(feature = "charts")]
mod charts;
mod cli;
mod error;
mod fmt;
mod importer;
mod models;
mod reports;
mod settings;

use clap::Parser;
use tracing::Level;

use cli::Cli;

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = cli::report::run(cli.no_charts) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
