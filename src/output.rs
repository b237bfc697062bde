//! Output writer: per-document JSON records and optional CSV flat files.
//!
//! One JSON record per document keeps all of its tables, their provenance
//! (page, backend, score) and the cell data itself in a single artifact,
//! which is what downstream consumers ingest. CSV emission is opt-in: flat
//! files are convenient for spreadsheets but redundant next to the record.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::table::{AcceptedTable, ExtractionMethod};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::info;

/// Artifact paths recorded in the manifest, relative to their output dirs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFiles {
    /// `{stem}.json` in the JSON output directory.
    pub json: String,
    /// `{stem}_table_{n}.csv` files; empty unless CSV output was requested.
    pub csv: Vec<String>,
}

/// The per-document record serialised to `{stem}.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub filename: String,
    /// ISO-8601 timestamp of this processing run.
    pub processed_date: String,
    pub num_tables: usize,
    pub tables: Vec<TableRecord>,
}

/// One accepted table inside a [`DocumentRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRecord {
    /// 1-based index within the document.
    pub table_number: usize,
    /// 1-based source page.
    pub page_number: u32,
    pub extraction_method: ExtractionMethod,
    pub quality_score: f64,
    /// ISO-8601 timestamp of the extraction itself.
    pub extraction_time: String,
    pub num_rows: usize,
    pub num_columns: usize,
    pub column_names: Vec<String>,
    /// Row-oriented cell data; every row has `num_columns` entries.
    pub table_data: Vec<Vec<String>>,
}

impl DocumentRecord {
    /// Build the record for a document's accepted tables.
    pub fn new(stem: &str, tables: &[AcceptedTable]) -> Self {
        Self {
            filename: stem.to_string(),
            processed_date: chrono::Utc::now().to_rfc3339(),
            num_tables: tables.len(),
            tables: tables.iter().map(TableRecord::from_table).collect(),
        }
    }
}

impl TableRecord {
    fn from_table(table: &AcceptedTable) -> Self {
        Self {
            table_number: table.table_number,
            page_number: table.page,
            extraction_method: table.method,
            quality_score: table.quality_score,
            extraction_time: table.extracted_at.clone(),
            num_rows: table.num_rows(),
            num_columns: table.num_columns(),
            column_names: table.column_names.clone(),
            table_data: table.rows.clone(),
        }
    }
}

/// Write a document's accepted tables: the JSON record, plus one CSV per
/// table when `config.save_csv` is set.
///
/// Errors are returned (not panicked) so the batch driver can mark the
/// document unsuccessful and move on.
pub fn write_document(
    config: &ExtractionConfig,
    stem: &str,
    tables: &[AcceptedTable],
) -> Result<SavedFiles, ExtractError> {
    let record = DocumentRecord::new(stem, tables);
    let json_name = format!("{stem}.json");
    let json_path = config.json_dir.join(&json_name);

    let json = serde_json::to_string_pretty(&record).map_err(|e| ExtractError::SerializeFailed {
        document: stem.to_string(),
        source: e,
    })?;

    // Atomic write: a crash never leaves a truncated record behind.
    let mut tmp = tempfile::NamedTempFile::new_in(&config.json_dir).map_err(|e| {
        ExtractError::OutputWriteFailed {
            path: json_path.clone(),
            source: e,
        }
    })?;
    tmp.write_all(json.as_bytes())
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: json_path.clone(),
            source: e,
        })?;
    tmp.persist(&json_path)
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: json_path.clone(),
            source: e.error,
        })?;

    let mut csv_names = Vec::new();
    if config.save_csv {
        for table in tables {
            csv_names.push(write_csv(config, stem, table)?);
        }
    }

    info!(
        "Saved {} tables from '{stem}'{}",
        tables.len(),
        if config.save_csv { " (with CSV files)" } else { "" }
    );

    Ok(SavedFiles {
        json: json_name,
        csv: csv_names,
    })
}

fn write_csv(
    config: &ExtractionConfig,
    stem: &str,
    table: &AcceptedTable,
) -> Result<String, ExtractError> {
    let name = format!("{stem}_table_{}.csv", table.table_number);
    let path = config.csv_dir.join(&name);

    let mut writer = csv::Writer::from_path(&path).map_err(|e| ExtractError::CsvWriteFailed {
        path: path.clone(),
        source: e,
    })?;
    writer
        .write_record(&table.column_names)
        .map_err(|e| ExtractError::CsvWriteFailed {
            path: path.clone(),
            source: e,
        })?;
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|e| ExtractError::CsvWriteFailed {
                path: path.clone(),
                source: e,
            })?;
    }
    writer.flush().map_err(|e| ExtractError::OutputWriteFailed {
        path: path.clone(),
        source: e,
    })?;

    Ok(name)
}
