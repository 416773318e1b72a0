/*!
 * Error types for the versioned tree
 */

use thiserror::Error;

use crate::types::{ActionId, BulkNumber};

/// Errors raised by tree lookups and mutations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A path segment did not resolve
    #[error("No such path: {0}")]
    NoSuchPath(String),

    /// The named version is not held by the file called `name`
    #[error("No such version {version} in file {name}")]
    NoSuchVersion { name: String, version: ActionId },

    /// Detaching a file that still holds versions
    #[error("Attempt to remove non-empty file: {0}")]
    NotEmptyFileRemove(String),

    /// A batch was opened with a bulk number lower than the current one
    #[error("Bulk {requested} is older than current bulk {current}")]
    BulkOutOfOrder {
        current: BulkNumber,
        requested: BulkNumber,
    },
}

/// Specialized Result type for tree operations
pub type TreeResult<T> = Result<T, TreeError>;
