/*!
 * File nodes and their retained versions
 */

use std::collections::BTreeMap;

use crate::tree::error::{TreeError, TreeResult};
use crate::tree::FolderId;
use crate::types::{ActionId, BulkNumber, ContentHash};

/// One retained content snapshot of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVersion {
    /// Recency stamp of the batch that created the version
    pub bulk_number: BulkNumber,
    /// Action that created the version
    pub action_id: ActionId,
    /// Opaque content fingerprint
    pub hash: ContentHash,
}

/// A named leaf node holding any number of concurrent versions
///
/// Updates only evict the version named by their `prev_action_id`, so a file
/// may hold several versions at once when histories branch.
#[derive(Debug, Clone)]
pub struct File {
    name: String,
    parent: FolderId,
    versions: BTreeMap<ActionId, FileVersion>,
    bulk_number: BulkNumber,
}

impl File {
    pub(crate) fn new(parent: FolderId, name: impl Into<String>, bulk_number: BulkNumber) -> Self {
        Self {
            name: name.into(),
            parent,
            versions: BTreeMap::new(),
            bulk_number,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> FolderId {
        self.parent
    }

    /// Versions ordered by action id
    pub fn versions(&self) -> impl Iterator<Item = &FileVersion> {
        self.versions.values()
    }

    pub fn version(&self, action_id: ActionId) -> Option<&FileVersion> {
        self.versions.get(&action_id)
    }

    /// Version created by the highest action id
    pub fn latest(&self) -> Option<&FileVersion> {
        self.versions.values().next_back()
    }

    /// Most recent bulk that added or removed a version
    pub fn bulk_number(&self) -> BulkNumber {
        self.bulk_number
    }

    pub(crate) fn touch(&mut self, bulk_number: BulkNumber) {
        self.bulk_number = self.bulk_number.max(bulk_number);
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Insert a version and evict the one it supersedes, if still present
    pub fn add_version(
        &mut self,
        prev_action_id: ActionId,
        bulk_number: BulkNumber,
        action_id: ActionId,
        hash: impl Into<ContentHash>,
    ) {
        self.touch(bulk_number);
        self.versions.remove(&prev_action_id);
        self.versions.insert(
            action_id,
            FileVersion {
                bulk_number,
                action_id,
                hash: hash.into(),
            },
        );
    }

    /// Remove a named version
    ///
    /// Leaves the bulk number alone; the caller stamps the removal.
    pub fn remove_version(&mut self, action_id: ActionId) -> TreeResult<FileVersion> {
        self.versions
            .remove(&action_id)
            .ok_or_else(|| TreeError::NoSuchVersion {
                name: self.name.clone(),
                version: action_id,
            })
    }
}
