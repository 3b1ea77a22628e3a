use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What was changed for one duplicate cluster.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub timestamp: String,
    pub retained: String,
    pub deleted: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renamed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    pub action: String, // "applied"
}

impl HistoryRecord {
    pub fn applied(
        retained: &str,
        deleted: Vec<String>,
        renamed: Option<String>,
        metadata: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            retained: retained.to_string(),
            deleted,
            renamed,
            metadata,
            action: "applied".to_string(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty() && self.renamed.is_none() && self.metadata.is_none()
    }
}

/// Append-only JSON-lines log of applied actions.
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &HistoryRecord) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        let line = serde_json::to_string(record)?;
        writeln!(out, "{line}").map_err(|e| self.io_error(e))
    }

    /// Every line in order; malformed lines come back as errors so the
    /// caller can report and skip them. A missing log reads as empty.
    pub fn read(&self) -> Result<Vec<Result<HistoryRecord, serde_json::Error>>, HistoryError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line));
        }
        Ok(records)
    }

    fn io_error(&self, source: io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let log = HistoryLog::new(temp_dir.path().join("nested").join("history.jsonl"));

        let first = HistoryRecord::applied("i1", vec!["i2".to_string()], None, None);
        let second = HistoryRecord::applied(
            "i3",
            vec![],
            Some("Fox Creek Trails".to_string()),
            Some("Feel: 3".to_string()),
        );
        log.append(&first).unwrap();
        log.append(&second).unwrap();

        let records: Vec<HistoryRecord> = log.read().unwrap().into_iter().map(Result::unwrap).collect();
        assert_eq!(records, vec![first, second]);
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let log = HistoryLog::new(temp_dir.path().join("history.jsonl"));
        assert!(log.read().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_line_reported_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.jsonl");
        let good = HistoryRecord::applied("i1", vec!["i2".to_string()], None, None);
        fs::write(
            &path,
            format!("{}\nnot json\n\n", serde_json::to_string(&good).unwrap()),
        )
        .unwrap();

        let records = HistoryLog::new(&path).read().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].as_ref().unwrap(), &good);
        assert!(records[1].is_err());
    }

    #[test]
    fn test_noop_record() {
        assert!(HistoryRecord::applied("i1", vec![], None, None).is_noop());
        assert!(!HistoryRecord::applied("i1", vec!["i2".to_string()], None, None).is_noop());
    }
}
