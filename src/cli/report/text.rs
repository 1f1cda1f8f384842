use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::fmt::thousands;
use crate::reports::{self, month_name};
use crate::settings::ReportSettings;

const RULE_WIDTH: usize = 50;

/// "Julio 2024 - Julio 2025"
pub fn window_label(report: &reports::SalesReport) -> String {
    use chrono::Datelike;
    let start = report.window.start;
    let end = report.window.end;
    format!(
        "{} {} - {} {}",
        month_name(start.month()),
        start.year(),
        month_name(end.month()),
        end.year()
    )
}

pub fn format_monthly_table(report: &reports::SalesReport, settings: &ReportSettings) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#"),
        Cell::new(&settings.columns.date),
        Cell::new(&settings.columns.amount),
        Cell::new("MES"),
    ]);
    for (i, m) in report.monthly.iter().enumerate() {
        let first_day = m
            .month
            .first_day()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(i),
            Cell::new(first_day),
            Cell::new(thousands(m.amount)).set_alignment(CellAlignment::Right),
            Cell::new(m.month.to_string()),
        ]);
    }
    table.to_string()
}

/// Monthly totals table plus the period total, framed by rules.
pub fn format_summary(report: &reports::SalesReport, settings: &ReportSettings) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let heading = format!("--- Reporte de Ventas Mensuales ({}) ---", window_label(report));
    let total_line = format!(
        "VENTAS TOTALES DEL PERIODO: {} {}",
        thousands(report.total),
        settings.currency
    );
    format!(
        "{}\n{}\n\n{rule}\n{}\n{rule}\n",
        heading.bold(),
        format_monthly_table(report, settings),
        total_line.bold()
    )
}
