//! Writing result tables to files and the terminal.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use clap::ValueEnum;
use comfy_table::{presets, ContentArrangement, Table};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::table::{cell_text, ResultTable};

/// Errors raised while writing a table.
#[derive(Debug, Error)]
pub enum ExportError {
    /// File could not be created or written.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding failed.
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding failed.
    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Spreadsheet encoding failed.
    #[error("Failed to write spreadsheet: {0}")]
    Excel(#[from] XlsxError),

    /// The table does not fit in a worksheet.
    #[error("Table too large for a worksheet: {0}")]
    SheetLimit(String),
}

/// File format for `--output`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated values with a header row.
    #[default]
    Csv,
    /// Pretty-printed JSON array of records.
    Json,
    /// XLSX workbook with a single sheet.
    Excel,
}

/// Write a table to `path` in the given format.
pub fn write_table(
    table: &ResultTable,
    path: &Path,
    format: OutputFormat,
) -> Result<(), ExportError> {
    debug!(path = %path.display(), ?format, rows = table.len(), "Writing table");

    match format {
        OutputFormat::Csv => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_csv(table, &mut writer)?;
            writer.flush()?;
        }
        OutputFormat::Json => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_json(table, &mut writer)?;
            writer.flush()?;
        }
        OutputFormat::Excel => write_excel(table, path)?,
    }
    Ok(())
}

/// Write a header row then one line per row, without an index column.
pub fn write_csv<W: Write>(table: &ResultTable, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(table.columns())?;
    for row in table.rows() {
        csv_writer.write_record(row.iter().map(cell_text))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the table as a JSON array of objects with 2-space indentation.
pub fn write_json<W: Write>(table: &ResultTable, mut writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, table)?;
    writeln!(writer)?;
    Ok(())
}

/// Write the table to an XLSX workbook with a bold header row.
pub fn write_excel(table: &ResultTable, path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Results")?;

    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, sheet_col(col)?, name.as_str(), &header)?;
    }

    for (idx, cells) in table.rows().iter().enumerate() {
        let row = sheet_row(idx + 1)?;
        for (col, cell) in cells.iter().enumerate() {
            let col = sheet_col(col)?;
            match cell {
                Value::Null => {}
                Value::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                Value::Number(n) => match n.as_f64() {
                    Some(f) => {
                        worksheet.write_number(row, col, f)?;
                    }
                    None => {
                        worksheet.write_string(row, col, n.to_string())?;
                    }
                },
                other => {
                    worksheet.write_string(row, col, cell_text(other))?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Render the table as text for the terminal.
pub fn render_text(table: &ResultTable) -> String {
    let mut text_table = Table::new();
    text_table
        .load_preset(presets::UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(table.columns());

    for row in table.rows() {
        text_table.add_row(row.iter().map(cell_text));
    }

    text_table.to_string()
}

fn sheet_row(idx: usize) -> Result<u32, ExportError> {
    u32::try_from(idx).map_err(|_| ExportError::SheetLimit(format!("row {}", idx)))
}

fn sheet_col(idx: usize) -> Result<u16, ExportError> {
    u16::try_from(idx).map_err(|_| ExportError::SheetLimit(format!("column {}", idx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> ResultTable {
        let mut table = ResultTable::new(["key", "summary", "components", "subtask"]);
        table.push_row(vec![
            json!("PROJ-1"),
            json!("Login, broken"),
            json!(["api", "ui"]),
            json!(false),
        ]);
        table.push_row(vec![json!("PROJ-2"), Value::Null, json!([]), json!(true)]);
        table
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        write_csv(&sample(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "key,summary,components,subtask");
        assert_eq!(lines[1], r#"PROJ-1,"Login, broken","api, ui",false"#);
        assert_eq!(lines[2], "PROJ-2,,,true");
    }

    #[test]
    fn test_write_json_pretty_records() {
        let mut out = Vec::new();
        write_json(&sample(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[\n  {\n    \"key\": \"PROJ-1\""));

        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["components"], json!(["api", "ui"]));
        assert_eq!(parsed[1]["summary"], Value::Null);
    }

    #[test]
    fn test_write_table_csv_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("issues.csv");

        write_table(&sample(), &path, OutputFormat::Csv).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_write_table_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("issues.json");

        write_table(&sample(), &path, OutputFormat::Json).unwrap();

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_write_table_excel_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("issues.xlsx");

        write_table(&sample(), &path, OutputFormat::Excel).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // XLSX is a zip archive.
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_write_table_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope").join("issues.csv");

        let err = write_table(&sample(), &path, OutputFormat::Csv).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }

    #[test]
    fn test_render_text_contains_cells() {
        let text = render_text(&sample());
        assert!(text.contains("key"));
        assert!(text.contains("PROJ-1"));
        assert!(text.contains("api, ui"));
    }

    #[test]
    fn test_output_format_default_is_csv() {
        assert_eq!(OutputFormat::default(), OutputFormat::Csv);
    }
}
