/*!
 * replayfs - Materialize a versioned folder/file tree from an action log
 *
 * This library replays ordered change records (modify, remove and rename of
 * file versions) into an in-memory tree whose folders remember the most
 * recent bulk that changed anything beneath them.
 */

pub mod action;
pub mod action_log;
pub mod config;
pub mod driver;
pub mod error;
pub mod report;
pub mod tree;
pub mod types;
pub mod utils;
pub mod writer;

#[cfg(test)]
mod tests;

// Re-export main components for easier access
pub use action::{Action, ActionKind};
pub use action_log::{ActionLog, LogRecord};
pub use config::Config;
pub use driver::{ReplayStatistics, Replayer};
pub use error::{ReplayFsError, Result};
pub use report::{ReplayReport, ReportFormat, Reporter};
pub use tree::{ChangedEntry, EntryKind, File, FileSystem, FileVersion, Folder, TreeError, TreeStats};
pub use types::{ActionId, BulkNumber, ContentHash, NO_PREDECESSOR};
pub use writer::XmlWriter;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
