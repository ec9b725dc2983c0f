use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::debug;

use super::model::{CellValue, DataTable, Row};

/// The dataset used when no file is supplied on the command line.
/// Regenerate with the `generate_example` binary.
const EXAMPLE_CSV: &str = include_str!("../../data/example.csv");

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a delimited text table from a file.
///
/// Layout: first row = column headers, subsequent rows = records. The field
/// delimiter (comma or semicolon) is sniffed from the header line.
pub fn load_file(path: &Path) -> Result<DataTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    load_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Load the bundled example dataset.
pub fn load_example() -> Result<DataTable> {
    load_str(EXAMPLE_CSV).context("parsing bundled example dataset")
}

// ---------------------------------------------------------------------------
// Delimited-text parsing
// ---------------------------------------------------------------------------

fn load_str(text: &str) -> Result<DataTable> {
    let delimiter = sniff_delimiter(text);
    debug!("using {:?} as field delimiter", delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("reading headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() {
        bail!("header row is empty");
    }

    let mut rows: Vec<Row> = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;

        let mut row = BTreeMap::new();
        for (col_idx, col_name) in headers.iter().enumerate() {
            let raw = record.get(col_idx).unwrap_or("").trim();
            row.insert(col_name.clone(), guess_cell_type(raw));
        }
        rows.push(row);
    }

    Ok(DataTable::new(headers, rows))
}

/// Pick the field delimiter from the header line: semicolon when it splits
/// the header into more fields than comma does.
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    let commas = header.matches(',').count();
    let semicolons = header.matches(';').count();
    if semicolons > commas { b';' } else { b',' }
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated() {
        let table = load_str("group,value\na,1.5\nb,2\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_names, vec!["group", "value"]);
        assert_eq!(table.cell(0, "value"), CellValue::Float(1.5));
        assert_eq!(table.cell(1, "value"), CellValue::Integer(2));
    }

    #[test]
    fn parses_semicolon_separated() {
        let table = load_str("group;value\na;1.5\nb;2.5\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "group"), CellValue::String("a".into()));
        assert_eq!(table.cell(1, "value"), CellValue::Float(2.5));
    }

    #[test]
    fn empty_fields_become_null() {
        let table = load_str("group,value\na,\n,2\n").unwrap();
        assert!(table.cell(0, "value").is_null());
        assert!(table.cell(1, "group").is_null());
    }

    #[test]
    fn type_guessing() {
        assert_eq!(guess_cell_type("42"), CellValue::Integer(42));
        assert_eq!(guess_cell_type("4.2"), CellValue::Float(4.2));
        assert_eq!(guess_cell_type("true"), CellValue::Bool(true));
        assert_eq!(guess_cell_type("abc"), CellValue::String("abc".into()));
        assert_eq!(guess_cell_type(""), CellValue::Null);
    }

    #[test]
    fn bundled_example_loads() {
        let table = load_example().unwrap();
        assert!(!table.is_empty());
        assert!(table.has_column("yield"));
        assert!(table.has_column("batch"));
    }
}
