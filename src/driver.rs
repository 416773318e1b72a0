/*!
 * Batch driver feeding an action log into the replay engine
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use indicatif::ProgressBar;
use tracing::{debug, info};

use crate::action::ActionKind;
use crate::action_log::{ActionLog, LogRecord};
use crate::bail;
use crate::error::Result;
use crate::tree::FileSystem;
use crate::types::{ActionId, BulkNumber};

/// Replay statistics
#[derive(Debug, Clone, Default)]
pub struct ReplayStatistics {
    /// Number of bulks opened
    pub batches: usize,
    /// Number of actions executed
    pub actions_applied: usize,
    /// Executed actions per kind
    pub per_kind: BTreeMap<ActionKind, usize>,
    /// Bulk of the last executed batch
    pub last_bulk: Option<BulkNumber>,
    /// Id of the last executed action
    pub last_action_id: Option<ActionId>,
}

/// Applies log records to a [`FileSystem`] one bulk at a time
///
/// Consecutive records with the same bulk form a batch. Bulks start at
/// [`INITIAL_BULK`](crate::types::INITIAL_BULK) and must never fall below the
/// tree's current bulk; action ids must strictly increase. The offending record
/// is rejected before it touches the tree.
pub struct Replayer {
    /// Progress bar
    pub progress: Arc<ProgressBar>,
    /// Replay statistics
    statistics: ReplayStatistics,
}

impl Replayer {
    /// Create a new replayer
    pub fn new(progress: Arc<ProgressBar>) -> Self {
        Self {
            progress,
            statistics: ReplayStatistics::default(),
        }
    }

    /// Get replay statistics
    pub fn get_statistics(&self) -> ReplayStatistics {
        self.statistics.clone()
    }

    /// Replay every record of `log` into `fs`
    pub fn replay(&mut self, fs: &mut FileSystem, log: &ActionLog) -> Result<()> {
        let records = log.records();
        let mut start = 0;

        while start < records.len() {
            let bulk = records[start].bulk;
            let end = records[start..]
                .iter()
                .position(|record| record.bulk != bulk)
                .map_or(records.len(), |offset| start + offset);

            self.replay_batch(fs, bulk, &records[start..end])?;
            start = end;
        }

        Ok(())
    }

    fn replay_batch(
        &mut self,
        fs: &mut FileSystem,
        bulk: BulkNumber,
        batch: &[LogRecord],
    ) -> Result<()> {
        let current = fs.current_bulk();
        if bulk < current {
            bail!(OutOfOrder, "bulk {} precedes current bulk {}", bulk, current);
        }

        fs.begin_bulk(bulk)?;
        info!(bulk, actions = batch.len(), "replaying batch");
        self.progress.set_message(format!("Bulk {}", bulk));

        for record in batch {
            let action_id = record.action.action_id();
            if let Some(last) = self.statistics.last_action_id {
                if action_id <= last {
                    bail!(
                        OutOfOrder,
                        "action {} follows action {} in bulk {}",
                        action_id,
                        last,
                        bulk
                    );
                }
            }

            debug!(action_id, kind = %record.action.kind(), "executing action");
            fs.execute(&record.action)?;

            self.statistics.actions_applied += 1;
            *self
                .statistics
                .per_kind
                .entry(record.action.kind())
                .or_insert(0) += 1;
            self.statistics.last_action_id = Some(action_id);
            self.progress.inc(1);
        }

        self.statistics.batches += 1;
        self.statistics.last_bulk = Some(bulk);
        Ok(())
    }
}
