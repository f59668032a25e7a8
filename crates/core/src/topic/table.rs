//! Tabular topic files: CSV text and Excel workbooks.
//!
//! Both formats are read into a [`TopicTable`]: the first non-blank row is the
//! header, blank rows are skipped. Excel workbooks are read from their first
//! sheet.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Reader};
use serde::Serialize;

use super::{Topic, TopicSourceError};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Format of a topic file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    /// `.xlsx`, `.xlsm` and legacy `.xls` workbooks.
    Excel,
}

impl TableFormat {
    pub fn from_filename(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(TableFormat::Csv),
            "xlsx" | "xlsm" | "xls" => Some(TableFormat::Excel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Excel => "excel",
        }
    }
}

/// Header and leading rows of an uploaded topic file.
#[derive(Debug, Clone, Serialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub preview: Vec<BTreeMap<String, String>>,
    pub total_rows: usize,
}

/// A parsed topic file.
#[derive(Debug, Clone)]
pub struct TopicTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TopicTable {
    pub fn parse(format: TableFormat, bytes: &[u8]) -> Result<Self, TopicSourceError> {
        match format {
            TableFormat::Csv => Self::from_csv(bytes),
            TableFormat::Excel => Self::from_excel(bytes),
        }
    }

    /// Reads UTF-8 CSV with RFC 4180 quoting. A leading BOM is ignored.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, TopicSourceError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| TopicSourceError::Parse(e.to_string()))?;
            records.push(record.iter().map(str::to_string).collect());
        }
        Self::from_records(records)
    }

    /// Reads the first sheet of an Excel workbook.
    pub fn from_excel(bytes: &[u8]) -> Result<Self, TopicSourceError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| TopicSourceError::Parse(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| TopicSourceError::Parse("workbook has no sheets".to_string()))?
            .map_err(|e| TopicSourceError::Parse(e.to_string()))?;

        let records = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        Self::from_records(records)
    }

    fn from_records(records: Vec<Vec<String>>) -> Result<Self, TopicSourceError> {
        let mut records = records
            .into_iter()
            .filter(|record| record.iter().any(|field| !field.trim().is_empty()));

        let columns = records
            .next()
            .ok_or_else(|| TopicSourceError::Parse("file has no header row".to_string()))?
            .into_iter()
            .map(|c| c.trim().to_string())
            .collect();

        Ok(Self {
            columns,
            rows: records.collect(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows, header excluded.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Non-blank cells of the named column, in row order.
    pub fn column_topics(&self, column: &str) -> Result<Vec<Topic>, TopicSourceError> {
        let index = self
            .columns
            .iter()
            .position(|c| c == column.trim())
            .ok_or_else(|| TopicSourceError::ColumnNotFound {
                column: column.to_string(),
                available: self.columns.clone(),
            })?;

        Ok(self
            .rows
            .iter()
            .filter_map(|row| row.get(index).and_then(Topic::new))
            .collect())
    }

    /// Header, the first `rows` data rows keyed by column name, and the row count.
    pub fn preview(&self, rows: usize) -> TablePreview {
        let preview = self
            .rows
            .iter()
            .take(rows)
            .map(|row| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| (col.clone(), row.get(i).cloned().unwrap_or_default()))
                    .collect()
            })
            .collect();

        TablePreview {
            columns: self.columns.clone(),
            preview,
            total_rows: self.rows.len(),
        }
    }
}
