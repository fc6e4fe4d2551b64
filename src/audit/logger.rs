//! Append-only JSONL audit log
//!
//! A batch is encoded up front and appended with one write, so a failed
//! serialization never leaves half a batch in the file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, ErrorKind, Write};
use std::path::PathBuf;

use crate::error::{TallyError, TallyResult};

use super::entry::AuditEntry;

pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    pub fn log(&self, entry: &AuditEntry) -> TallyResult<()> {
        self.log_batch(std::slice::from_ref(entry))
    }

    /// Append `entries` in order, one JSON object per line
    pub fn log_batch(&self, entries: &[AuditEntry]) -> TallyResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut lines = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut lines, entry)?;
            lines.push(b'\n');
        }

        if let Some(dir) = self.log_path.parent() {
            fs::create_dir_all(dir)?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .and_then(|mut file| file.write_all(&lines))
            .map_err(|e| TallyError::Io(format!("Cannot append to audit log: {}", e)))
    }

    /// Every entry, oldest first; an absent log reads as empty
    pub fn read_all(&self) -> TallyResult<Vec<AuditEntry>> {
        let file = match File::open(&self.log_path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::Deserializer::from_reader(BufReader::new(file))
            .into_iter::<AuditEntry>()
            .enumerate()
            .map(|(index, entry)| {
                entry.map_err(|e| {
                    TallyError::Json(format!("Corrupt audit entry #{}: {}", index + 1, e))
                })
            })
            .collect()
    }

    /// The newest `count` entries, oldest first
    pub fn read_recent(&self, count: usize) -> TallyResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        let keep_from = entries.len().saturating_sub(count);
        Ok(entries.split_off(keep_from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::{EntityType, Operation};
    use crate::models::UserId;
    use serde_json::json;
    use tempfile::TempDir;

    fn expense_created(n: usize) -> AuditEntry {
        AuditEntry::create(
            &UserId::new("u1").unwrap(),
            EntityType::Expense,
            format!("exp-{}", n),
            Some(format!("Category {}", n)),
            &json!({ "amount": n }),
        )
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("nested").join("audit.log"));

        assert!(logger.read_all().unwrap().is_empty());
        assert!(logger.read_recent(5).unwrap().is_empty());
    }

    #[test]
    fn test_batches_append_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("audit.log");
        let logger = AuditLogger::new(path.clone());

        logger.log(&expense_created(0)).unwrap();
        logger
            .log_batch(&[expense_created(1), expense_created(2)])
            .unwrap();
        logger.log_batch(&[]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);

        let reopened = AuditLogger::new(path);
        let entries = reopened.read_all().unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["exp-0", "exp-1", "exp-2"]);
        assert!(entries.iter().all(|e| e.operation == Operation::Create));
    }

    #[test]
    fn test_read_recent_keeps_newest() {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("audit.log"));
        let batch: Vec<_> = (0..6).map(expense_created).collect();
        logger.log_batch(&batch).unwrap();

        let ids: Vec<_> = logger
            .read_recent(2)
            .unwrap()
            .into_iter()
            .map(|e| e.entity_id)
            .collect();
        assert_eq!(ids, vec!["exp-4", "exp-5"]);
        assert_eq!(logger.read_recent(100).unwrap().len(), 6);
    }

    #[test]
    fn test_corrupt_line_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("audit.log");
        let logger = AuditLogger::new(path.clone());
        logger.log(&expense_created(0)).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();

        let err = logger.read_all().unwrap_err();
        assert!(matches!(err, TallyError::Json(ref msg) if msg.contains("#2")));
    }
}
