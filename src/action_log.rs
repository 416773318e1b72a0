/*!
 * JSON-lines action log reader
 *
 * Each non-blank line holds one record:
 *
 * ```text
 * {"bulk": 1, "action": {"kind": "modify_file", "action_id": 1, "path": ["a", "b.txt"], "hash": "H1"}}
 * ```
 *
 * Lines starting with `#` are comments.
 */

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::{ReplayFsError, Result, ResultExt};
use crate::types::BulkNumber;

/// One action together with the bulk it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub bulk: BulkNumber,
    pub action: Action,
}

/// Ordered sequence of records read from a log
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    records: Vec<LogRecord>,
}

impl ActionLog {
    pub fn new(records: Vec<LogRecord>) -> Self {
        Self { records }
    }

    /// Load a log file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse records from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let record = serde_json::from_str(trimmed).map_err(|source| {
                ReplayFsError::ActionLog {
                    line: index + 1,
                    source,
                }
            })?;
            records.push(record);
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
