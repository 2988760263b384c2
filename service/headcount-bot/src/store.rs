use crate::error::PersistenceError;
use crate::report::ReportRow;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

type Result<T> = std::result::Result<T, PersistenceError>;

/// CSV-backed, append-only log of completed headcounts.
///
/// Each append reads the whole table, adds one row and replaces the file via
/// a temp file in the same directory, so readers see either the old table or
/// the new one. Appends from separate processes are not coordinated.
#[derive(Debug, Clone)]
pub struct ReportLog {
    path: PathBuf,
    header: Vec<String>,
}

impl ReportLog {
    pub fn new(path: impl Into<PathBuf>, header: Vec<String>) -> Self {
        Self {
            path: path.into(),
            header,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows currently on disk. A missing or empty file is an empty table.
    pub fn load(&self) -> Result<Vec<Vec<String>>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Report log does not exist yet");
                return Ok(Vec::new());
            }
            Err(err) => return Err(self.io_error(&self.path, err)),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file);

        let found: Vec<String> = reader
            .headers()
            .map_err(|err| self.csv_error(err))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| self.csv_error(err))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        if found.is_empty() && rows.is_empty() {
            return Ok(rows);
        }
        if found != self.header {
            return Err(PersistenceError::HeaderMismatch {
                path: self.path.clone(),
                expected: self.header.clone(),
                found,
            });
        }

        Ok(rows)
    }

    /// Appends `row` after every existing row and rewrites the file.
    pub fn append(&self, row: &ReportRow) -> Result<()> {
        let mut rows = self.load()?;
        rows.push(row.to_record());

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|err| self.io_error(dir, err))?;

        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            writer
                .write_record(&self.header)
                .map_err(|err| self.csv_error(err))?;
            for record in &rows {
                writer
                    .write_record(record)
                    .map_err(|err| self.csv_error(err))?;
            }
            writer
                .flush()
                .map_err(|err| self.io_error(dir, err))?;
        }

        tmp.as_file()
            .sync_all()
            .map_err(|err| self.io_error(dir, err))?;
        tmp.persist(&self.path)
            .map_err(|source| PersistenceError::Persist {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), rows = rows.len(), "Report log rewritten");
        Ok(())
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> PersistenceError {
        PersistenceError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}
