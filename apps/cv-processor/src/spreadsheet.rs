//! Spreadsheet Store — the output table, persisted as one CSV file.
//!
//! Every append loads the whole table and rewrites it. The rewrite goes to a
//! temporary file beside the output which then replaces it, so a crash never
//! leaves a half-written table behind. The initial header is written the same
//! way. Single writer only.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::errors::AppError;
use crate::extraction::fields::header;
use crate::extraction::ExtractionRecord;

/// Header plus data rows, as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct SpreadsheetStore {
    path: PathBuf,
}

impl SpreadsheetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes an empty table with the fixed header if the file does not exist.
    /// Returns whether a file was created. Never touches an existing file.
    pub fn initialize(&self) -> Result<bool, AppError> {
        let table = Table {
            header: header().into_iter().map(String::from).collect(),
            rows: Vec::new(),
        };
        let tmp = self.write_temp(&table)?;

        match tmp.persist_noclobber(&self.path) {
            Ok(_) => {}
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        }

        info!("Created output table {}", self.path.display());
        Ok(true)
    }

    pub fn load(&self) -> Result<Table, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let mut columns: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        // a file left empty by an interrupted write gets its header back
        if columns.iter().all(|c| c.is_empty()) {
            columns = header().into_iter().map(String::from).collect();
        }
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(String::from).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

        Ok(Table {
            header: columns,
            rows,
        })
    }

    /// Serial number for the next appended row: data rows + 1.
    /// A missing file counts as an empty table; any other read failure propagates.
    pub fn next_serial(&self) -> Result<u64, AppError> {
        match self.load() {
            Ok(table) => Ok(table.rows.len() as u64 + 1),
            Err(AppError::Spreadsheet(e)) if is_not_found(&e) => Ok(1),
            Err(e) => Err(e),
        }
    }

    /// Appends `serial_no` followed by the record's fields in column order,
    /// then rewrites the file. Existing rows are written back unchanged.
    pub fn append(&self, record: &ExtractionRecord, serial_no: u64) -> Result<(), AppError> {
        let mut table = self.load()?;

        let row = std::iter::once(serial_no.to_string())
            .chain(record.columns().map(String::from))
            .collect();
        table.rows.push(row);

        self.write(&table)?;
        info!("Appended row for Sr No {}", serial_no);
        Ok(())
    }

    fn write(&self, table: &Table) -> Result<(), AppError> {
        self.write_temp(table)?.persist(&self.path)?;
        Ok(())
    }

    /// Writes `table` to a temporary file beside the output, ready to be persisted.
    fn write_temp(&self, table: &Table) -> Result<NamedTempFile, AppError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir).map_err(|e| AppError::io(dir, e))?;

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(tmp);
        writer.write_record(&table.header)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        let mut tmp = writer
            .into_inner()
            .map_err(|e| AppError::io(&self.path, e.into_error()))?;
        tmp.flush().map_err(|e| AppError::io(&self.path, e))?;
        Ok(tmp)
    }
}

fn is_not_found(err: &csv::Error) -> bool {
    matches!(err.kind(), csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound)
}
