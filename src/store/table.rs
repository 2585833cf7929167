//! Question table (CSV) reader and writer

use crate::error::{Error, Result};
use crate::extract::{QuestionRecord, QuestionRow};
use std::path::Path;

/// Column header of the question table
const COLUMNS: [&str; 6] = ["id", "question", "options", "answer", "images", "page"];

/// Write one row per record, in the order given
pub fn write_table<P: AsRef<Path>>(path: P, records: &[QuestionRecord]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    // serialize() only emits the header with the first row
    if records.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    for record in records {
        writer.serialize(record.to_row())?;
    }
    writer.flush()?;

    tracing::debug!(path = %path.display(), rows = records.len(), "question table written");
    Ok(())
}

/// Loaded question table, read-only for a study session
#[derive(Debug, Clone, Default)]
pub struct QuestionTable {
    rows: Vec<QuestionRow>,
}

impl QuestionTable {
    /// Load a table written by [`write_table`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Error::TableNotFound {
                path: path.display().to_string(),
            });
        }

        let mut reader = csv::Reader::from_path(path)?;
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<QuestionRow>, csv::Error>>()?;

        tracing::info!(path = %path.display(), rows = rows.len(), "question table loaded");
        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<QuestionRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[QuestionRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&QuestionRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lowest and highest numeric question key, `None` for an empty table
    pub fn key_bounds(&self) -> Option<(u32, u32)> {
        let keys = self.rows.iter().map(QuestionRow::numeric_key);
        let min = keys.clone().min()?;
        let max = keys.max()?;
        Some((min, max))
    }
}
