/*!
 * Folder nodes
 */

use std::collections::BTreeMap;

use crate::tree::{FileId, FolderId};
use crate::types::{is_file_name, BulkNumber};

/// A named container of child folders and files
///
/// Folder and file names live in separate maps. `bulk_number` is the highest
/// recency stamp of anything touched in this subtree.
#[derive(Debug, Clone)]
pub struct Folder {
    name: String,
    parent: Option<FolderId>,
    folders: BTreeMap<String, FolderId>,
    files: BTreeMap<String, FileId>,
    pub(crate) bulk_number: BulkNumber,
}

impl Folder {
    pub(crate) fn new(
        parent: Option<FolderId>,
        name: impl Into<String>,
        bulk_number: BulkNumber,
    ) -> Self {
        Self {
            name: name.into(),
            parent,
            folders: BTreeMap::new(),
            files: BTreeMap::new(),
            bulk_number,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent folder, `None` for the root
    pub fn parent(&self) -> Option<FolderId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn bulk_number(&self) -> BulkNumber {
        self.bulk_number
    }

    /// Child folders in name order
    pub fn folders(&self) -> impl Iterator<Item = (&str, FolderId)> {
        self.folders.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Child files in name order
    pub fn files(&self) -> impl Iterator<Item = (&str, FileId)> {
        self.files.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn folder_id(&self, name: &str) -> Option<FolderId> {
        self.folders.get(name).copied()
    }

    pub fn file_id(&self, name: &str) -> Option<FileId> {
        self.files.get(name).copied()
    }

    /// Name-based containment test
    ///
    /// Looks in the file map when `name` contains a `.`, otherwise in the
    /// folder map, regardless of what is actually stored under that name.
    pub fn contains(&self, name: &str) -> bool {
        if is_file_name(name) {
            self.files.contains_key(name)
        } else {
            self.folders.contains_key(name)
        }
    }

    pub(crate) fn attach_folder(&mut self, name: &str, id: FolderId) {
        self.folders.insert(name.to_string(), id);
    }

    pub(crate) fn attach_file(&mut self, name: &str, id: FileId) {
        self.files.insert(name.to_string(), id);
    }

    pub(crate) fn detach_file(&mut self, name: &str) -> Option<FileId> {
        self.files.remove(name)
    }
}
