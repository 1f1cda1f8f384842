use std::io::ErrorKind;
use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{ReportError, Result};
use crate::models::{DropStats, SalesRecord};
use crate::settings::Columns;

/// Cell values read as missing, matching the spreadsheet export's null markers.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Decode ISO-8859-1: every byte maps to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

pub fn parse_number(raw: &str) -> Option<f64> {
    let v: f64 = raw.trim().parse().ok()?;
    v.is_finite().then_some(v)
}

pub fn parse_date_dmy(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").ok()
}

pub fn parse_product(raw: &str) -> Option<String> {
    if NA_VALUES.contains(&raw) {
        return None;
    }
    Some(raw.to_string())
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Header plus data rows, still as text.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read the export: Latin-1 text whose first record is a title line and
/// whose second record is the real header.
pub fn load_table(file_path: &Path) -> Result<RawTable> {
    let bytes = std::fs::read(file_path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ReportError::FileNotFound(file_path.display().to_string()),
        _ => ReportError::Io(e),
    })?;
    parse_table(&decode_latin1(&bytes))
}

pub fn parse_table(content: &str) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = rdr.records();
    // Title line above the header.
    records.next().transpose()?;
    let headers: Vec<String> = match records.next().transpose()? {
        Some(record) => record.iter().map(|h| h.trim().to_string()).collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for result in records {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    debug!(columns = headers.len(), rows = rows.len(), "loaded sales table");
    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CleanedSales {
    pub records: Vec<SalesRecord>,
    pub stats: DropStats,
}

fn column_index(headers: &[String], name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name.trim())
        .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
}

/// Coerce the four required columns and drop any row where one of them is
/// missing or unparsable. Bad values never raise an error.
pub fn clean(table: &RawTable, columns: &Columns) -> Result<CleanedSales> {
    let idx_date = column_index(&table.headers, &columns.date)?;
    let idx_product = column_index(&table.headers, &columns.product)?;
    let idx_quantity = column_index(&table.headers, &columns.quantity)?;
    let idx_amount = column_index(&table.headers, &columns.amount)?;

    let mut stats = DropStats {
        read: table.rows.len(),
        ..DropStats::default()
    };
    let mut records = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");

        let date = parse_date_dmy(cell(idx_date));
        let product = parse_product(cell(idx_product));
        let quantity = parse_number(cell(idx_quantity));
        let amount = parse_number(cell(idx_amount));

        stats.bad_date += usize::from(date.is_none());
        stats.bad_product += usize::from(product.is_none());
        stats.bad_quantity += usize::from(quantity.is_none());
        stats.bad_amount += usize::from(amount.is_none());

        let (Some(date), Some(product), Some(quantity), Some(amount)) =
            (date, product, quantity, amount)
        else {
            continue;
        };
        records.push(SalesRecord {
            date,
            product,
            quantity,
            amount,
        });
    }

    stats.kept = records.len();
    debug!(
        read = stats.read,
        kept = stats.kept,
        bad_date = stats.bad_date,
        bad_product = stats.bad_product,
        bad_quantity = stats.bad_quantity,
        bad_amount = stats.bad_amount,
        "cleaned sales rows"
    );
    Ok(CleanedSales { records, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_export(dir: &Path, name: &str, rows: &[&str]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut content =
            String::from("LISTA DE VENTAS DETALLE,,,\n FECHA ,ARTICULOS, CANTIDAD ,IMPORTE EN SOLES \n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        std::fs::write(&path, &content).unwrap();
        path
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("12"), Some(12.0));
        assert_eq!(parse_number("  42.50 "), Some(42.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("1,234.56"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn test_parse_date_dmy() {
        assert_eq!(parse_date_dmy("01/07/2024"), NaiveDate::from_ymd_opt(2024, 7, 1));
        assert_eq!(parse_date_dmy("31/12/2024"), NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(parse_date_dmy("1/8/2024"), NaiveDate::from_ymd_opt(2024, 8, 1));
        assert_eq!(parse_date_dmy("2024-07-01"), None);
        assert_eq!(parse_date_dmy("invalid"), None);
    }

    #[test]
    fn test_parse_date_dmy_rejects_invalid_dates() {
        assert_eq!(parse_date_dmy("30/02/2025"), None); // Feb 30
        assert_eq!(parse_date_dmy("15/13/2025"), None); // month 13
        assert_eq!(parse_date_dmy("00/01/2025"), None); // day 0
    }

    #[test]
    fn test_parse_product_na_markers() {
        assert_eq!(parse_product(""), None);
        assert_eq!(parse_product("NA"), None);
        assert_eq!(parse_product("N/A"), None);
        assert_eq!(parse_product("nan"), None);
        assert_eq!(parse_product("Arroz"), Some("Arroz".to_string()));
        assert_eq!(parse_product(" Arroz"), Some(" Arroz".to_string()));
    }

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode_latin1(b"A\xd1O"), "AÑO");
        assert_eq!(decode_latin1(b"caf\xe9"), "café");
    }

    #[test]
    fn test_load_table_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_table(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, ReportError::FileNotFound(_)));
        assert!(err.to_string().contains("no fue encontrado"));
    }

    #[test]
    fn test_load_table_skips_title_and_trims_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(dir.path(), "ventas.csv", &["01/07/2024,Arroz,2,100"]);
        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec!["FECHA", "ARTICULOS", "CANTIDAD", "IMPORTE EN SOLES"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][1], "Arroz");
    }

    #[test]
    fn test_load_table_decodes_latin1_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        let mut bytes = b"titulo\nFECHA,ARTICULOS,CANTIDAD,IMPORTE EN SOLES\n01/07/2024,Pi".to_vec();
        bytes.push(0xf1);
        bytes.extend_from_slice(b"a,1,10\n");
        std::fs::write(&path, bytes).unwrap();
        let table = load_table(&path).unwrap();
        assert_eq!(table.rows[0][1], "Piña");
    }

    #[test]
    fn test_clean_drops_rows_with_bad_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(
            dir.path(),
            "ventas.csv",
            &[
                "01/07/2024,Arroz,2,100",
                "not a date,Arroz,2,100",
                "02/07/2024,,2,100",
                "03/07/2024,Azucar,dos,100",
                "04/07/2024,Azucar,2,",
                "05/07/2024,Aceite,1",
                "06/07/2024,Aceite,1,55.5",
            ],
        );
        let table = load_table(&path).unwrap();
        let cleaned = clean(&table, &Columns::default()).unwrap();
        assert_eq!(cleaned.records.len(), 2);
        assert!(cleaned.records.len() <= table.rows.len());
        assert_eq!(cleaned.records[0].product, "Arroz");
        assert_eq!(cleaned.records[1].amount, 55.5);
        assert_eq!(cleaned.stats.read, 7);
        assert_eq!(cleaned.stats.kept, 2);
        assert_eq!(cleaned.stats.dropped(), 5);
        assert_eq!(cleaned.stats.bad_date, 1);
        assert_eq!(cleaned.stats.bad_product, 1);
        assert_eq!(cleaned.stats.bad_quantity, 1);
        assert_eq!(cleaned.stats.bad_amount, 2);
    }

    #[test]
    fn test_clean_missing_column() {
        let table = parse_table("titulo\nFECHA,ARTICULOS,CANTIDAD\n01/07/2024,Arroz,2\n").unwrap();
        let err = clean(&table, &Columns::default()).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn(ref c) if c == "IMPORTE EN SOLES"));
    }

    #[test]
    fn test_clean_uses_header_positions() {
        let table = parse_table(
            "titulo\nIMPORTE EN SOLES,CODIGO,ARTICULOS,FECHA,CANTIDAD\n250.75,X1,Leche,15/01/2025,3\n",
        )
        .unwrap();
        let cleaned = clean(&table, &Columns::default()).unwrap();
        assert_eq!(cleaned.records.len(), 1);
        let r = &cleaned.records[0];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(r.product, "Leche");
        assert_eq!(r.quantity, 3.0);
        assert_eq!(r.amount, 250.75);
    }
}
