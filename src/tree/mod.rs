/*!
 * Versioned folder/file tree and the action replay engine
 *
 * Folders and files live in two arenas and refer to their parents by id.
 * Every structural change stamps the touched folder with the current bulk
 * number and propagates it upward, so each folder records the most recent
 * bulk that changed anything beneath it.
 */

mod arena;
mod error;
mod file;
mod folder;

pub use arena::{Arena, Id};
pub use error::{TreeError, TreeResult};
pub use file::{File, FileVersion};
pub use folder::Folder;

use tracing::debug;

use crate::action::Action;
use crate::types::{ActionId, BulkNumber, INITIAL_BULK, ROOT_BULK};
use crate::utils::display_path;

/// Handle to a folder node
pub type FolderId = Id<Folder>;

/// Handle to a file node
pub type FileId = Id<File>;

/// Kind of node reported by [`FileSystem::changed_since`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File,
}

/// A node touched after a given bulk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedEntry {
    pub kind: EntryKind,
    /// Display path from the root, e.g. `/a/b.txt`
    pub path: String,
    /// Folder bulk number, or the last bulk that added or removed a version
    pub bulk_number: BulkNumber,
}

/// Node counts of a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Number of folders, root included
    pub folders: usize,
    pub files: usize,
    pub versions: usize,
}

/// Versioned tree mutated by replaying actions
///
/// Single writer: actions must be applied in increasing bulk and action id
/// order by one caller. Readers needing concurrency have to wrap it.
#[derive(Debug)]
pub struct FileSystem {
    folders: Arena<Folder>,
    files: Arena<File>,
    root: FolderId,
    current_bulk: BulkNumber,
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem {
    /// Create an empty tree holding only the root folder
    pub fn new() -> Self {
        let mut folders = Arena::new();
        let root = folders.insert(Folder::new(None, "", ROOT_BULK));

        Self {
            folders,
            files: Arena::new(),
            root,
            current_bulk: INITIAL_BULK,
        }
    }

    pub fn root(&self) -> FolderId {
        self.root
    }

    pub fn root_folder(&self) -> &Folder {
        // The root is inserted on construction and folders are never removed
        &self.folders[self.root]
    }

    /// Bulk number stamped on every touch made by [`execute`](Self::execute)
    pub fn current_bulk(&self) -> BulkNumber {
        self.current_bulk
    }

    /// Open a batch: subsequent actions are stamped with `bulk`
    ///
    /// Reopening the current bulk is allowed, going backwards is not.
    pub fn begin_bulk(&mut self, bulk: BulkNumber) -> TreeResult<()> {
        if bulk < self.current_bulk {
            return Err(TreeError::BulkOutOfOrder {
                current: self.current_bulk,
                requested: bulk,
            });
        }
        self.current_bulk = bulk;
        Ok(())
    }

    /// Apply one action to the tree
    ///
    /// Lookup misses while removing are absorbed and leave the tree unchanged.
    /// Only an attempt to detach a non-empty file surfaces as an error.
    pub fn execute(&mut self, action: &Action) -> TreeResult<()> {
        match action {
            Action::CreateFolder { action_id }
            | Action::RemoveFolder { action_id }
            | Action::RenameFolder { action_id } => {
                debug!(action_id, kind = %action.kind(), "folder action has no effect");
                Ok(())
            }
            Action::ModifyFile {
                action_id,
                path,
                hash,
                prev_action_id,
            } => {
                self.modify_file(path, hash, *prev_action_id, *action_id);
                Ok(())
            }
            Action::RemoveFile {
                action_id,
                path,
                prev_action_id,
            } => self.remove_file_version(path, *prev_action_id, *action_id),
            Action::RenameFile {
                action_id,
                old_path,
                new_path,
                hash,
                prev_action_id,
            } => {
                self.remove_file_version(old_path, *prev_action_id, *action_id)?;
                self.modify_file(new_path, hash, *prev_action_id, *action_id);
                Ok(())
            }
        }
    }

    /// Open `bulk` and apply `action` in it
    pub fn execute_in_bulk(&mut self, bulk: BulkNumber, action: &Action) -> TreeResult<()> {
        self.begin_bulk(bulk)?;
        self.execute(action)
    }

    fn modify_file(
        &mut self,
        path: &[String],
        hash: &str,
        prev_action_id: ActionId,
        action_id: ActionId,
    ) {
        let bulk = self.current_bulk;
        let Some(file_id) = self.create_file_if_not_exists(path) else {
            debug!(action_id, "modify on the root path ignored");
            return;
        };

        if let Some(file) = self.files.get_mut(file_id) {
            file.add_version(prev_action_id, bulk, action_id, hash);
            let parent = file.parent();
            self.update_bulk_number(parent, bulk);
        }
    }

    fn remove_file_version(
        &mut self,
        path: &[String],
        prev_action_id: ActionId,
        action_id: ActionId,
    ) -> TreeResult<()> {
        let bulk = self.current_bulk;

        let Some(file_id) = self.resolve_file(path) else {
            debug!(action_id, path = %display_path(path), "remove skipped: no such path");
            return Ok(());
        };
        let Some(file) = self.files.get_mut(file_id) else {
            return Ok(());
        };

        match file.remove_version(prev_action_id) {
            Ok(_) => file.touch(bulk),
            Err(TreeError::NoSuchVersion { version, .. }) => {
                debug!(
                    action_id,
                    version,
                    path = %display_path(path),
                    "remove skipped: no such version"
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let parent = file.parent();
        if file.is_empty() {
            let name = file.name().to_string();
            self.remove_file(parent, &name)
        } else {
            self.update_bulk_number(parent, bulk);
            Ok(())
        }
    }

    /// Resolve a folder path, creating every missing folder along the way
    pub fn create_folder_if_not_exists<S: AsRef<str>>(&mut self, path: &[S]) -> FolderId {
        path.iter().fold(self.root, |folder, name| {
            self.add_folder_if_not_exists(folder, name.as_ref())
        })
    }

    /// Resolve a file path, creating the file and its ancestors when missing
    ///
    /// Returns `None` for the empty path, which names the root folder.
    pub fn create_file_if_not_exists<S: AsRef<str>>(&mut self, path: &[S]) -> Option<FileId> {
        let (name, parent_path) = path.split_last()?;
        let parent = self.create_folder_if_not_exists(parent_path);
        Some(self.add_file_if_not_exists(parent, name.as_ref()))
    }

    /// Return the child folder `name` of `parent`, creating it if needed
    pub fn add_folder_if_not_exists(&mut self, parent: FolderId, name: &str) -> FolderId {
        if let Some(id) = self.folders.get(parent).and_then(|f| f.folder_id(name)) {
            return id;
        }

        let bulk = self.current_bulk;
        let id = self.folders.insert(Folder::new(Some(parent), name, bulk));
        if let Some(folder) = self.folders.get_mut(parent) {
            folder.attach_folder(name, id);
        }
        self.update_bulk_number(parent, bulk);
        id
    }

    /// Return the child file `name` of `parent`, creating it if needed
    pub fn add_file_if_not_exists(&mut self, parent: FolderId, name: &str) -> FileId {
        if let Some(id) = self.folders.get(parent).and_then(|f| f.file_id(name)) {
            return id;
        }

        let id = self.files.insert(File::new(parent, name, self.current_bulk));
        if let Some(folder) = self.folders.get_mut(parent) {
            folder.attach_file(name, id);
        }
        self.update_bulk_number(parent, self.current_bulk);
        id
    }

    /// Detach and drop an empty file
    pub fn remove_file(&mut self, parent: FolderId, name: &str) -> TreeResult<()> {
        let file_id = self
            .folders
            .get(parent)
            .and_then(|f| f.file_id(name))
            .ok_or_else(|| TreeError::NoSuchPath(self.child_path(parent, name)))?;

        let is_empty = self.files.get(file_id).map_or(true, File::is_empty);
        if !is_empty {
            return Err(TreeError::NotEmptyFileRemove(self.file_path(file_id)));
        }

        if let Some(folder) = self.folders.get_mut(parent) {
            folder.detach_file(name);
        }
        self.files.remove(file_id);
        self.update_bulk_number(parent, self.current_bulk);
        Ok(())
    }

    /// Raise `folder` and its ancestors to `bulk`
    ///
    /// Stops at the first folder already at or above `bulk`; everything above
    /// it is at least as recent.
    pub fn update_bulk_number(&mut self, folder: FolderId, bulk: BulkNumber) {
        let mut current = Some(folder);
        while let Some(id) = current {
            let Some(folder) = self.folders.get_mut(id) else {
                break;
            };
            if folder.bulk_number >= bulk {
                break;
            }
            folder.bulk_number = bulk;
            current = folder.parent();
        }
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.get(id)
    }

    pub fn file(&self, id: FileId) -> Option<&File> {
        self.files.get(id)
    }

    pub fn resolve_folder<S: AsRef<str>>(&self, path: &[S]) -> Option<FolderId> {
        path.iter().try_fold(self.root, |id, name| {
            self.folders.get(id)?.folder_id(name.as_ref())
        })
    }

    pub fn resolve_file<S: AsRef<str>>(&self, path: &[S]) -> Option<FileId> {
        let (name, parent_path) = path.split_last()?;
        let parent = self.resolve_folder(parent_path)?;
        self.folders.get(parent)?.file_id(name.as_ref())
    }

    /// Folder at `path`; the empty path is the root
    pub fn get_folder<S: AsRef<str>>(&self, path: &[S]) -> TreeResult<&Folder> {
        self.resolve_folder(path)
            .and_then(|id| self.folders.get(id))
            .ok_or_else(|| TreeError::NoSuchPath(display_path(path)))
    }

    pub fn get_file<S: AsRef<str>>(&self, path: &[S]) -> TreeResult<&File> {
        self.resolve_file(path)
            .and_then(|id| self.files.get(id))
            .ok_or_else(|| TreeError::NoSuchPath(display_path(path)))
    }

    /// Whether `path` names an existing node
    ///
    /// The last segment is checked with the `.` heuristic of
    /// [`Folder::contains`]. Never fails; the empty path is always present.
    pub fn contains<S: AsRef<str>>(&self, path: &[S]) -> bool {
        let Some((name, parent_path)) = path.split_last() else {
            return true;
        };
        self.resolve_folder(parent_path)
            .and_then(|id| self.folders.get(id))
            .map_or(false, |folder| folder.contains(name.as_ref()))
    }

    /// Display path of a folder, `/` for the root
    pub fn folder_path(&self, id: FolderId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(folder) = current.and_then(|id| self.folders.get(id)) {
            if folder.is_root() {
                break;
            }
            names.push(folder.name());
            current = folder.parent();
        }
        names.reverse();
        display_path(&names)
    }

    pub fn file_path(&self, id: FileId) -> String {
        self.files
            .get(id)
            .map(|file| self.child_path(file.parent(), file.name()))
            .unwrap_or_default()
    }

    fn child_path(&self, parent: FolderId, name: &str) -> String {
        let parent = self.folder_path(parent);
        if parent == "/" {
            format!("/{}", name)
        } else {
            format!("{}/{}", parent, name)
        }
    }

    /// Nodes changed after `since`
    ///
    /// Only descends into folders whose bulk number is above `since`, so
    /// untouched subtrees are never visited. Files are reported when a version
    /// was added or removed after `since`. Detached files are gone and only
    /// show up through their folder.
    pub fn changed_since(&self, since: BulkNumber) -> Vec<ChangedEntry> {
        let mut entries = Vec::new();
        let mut pending = vec![self.root];

        while let Some(id) = pending.pop() {
            let Some(folder) = self.folders.get(id) else {
                continue;
            };
            if folder.bulk_number <= since {
                continue;
            }

            entries.push(ChangedEntry {
                kind: EntryKind::Folder,
                path: self.folder_path(id),
                bulk_number: folder.bulk_number,
            });

            for (_, file_id) in folder.files() {
                let Some(bulk) = self.files.get(file_id).map(File::bulk_number) else {
                    continue;
                };
                if bulk > since {
                    entries.push(ChangedEntry {
                        kind: EntryKind::File,
                        path: self.file_path(file_id),
                        bulk_number: bulk,
                    });
                }
            }

            // Reversed so children pop in name order
            let children: Vec<FolderId> = folder.folders().map(|(_, child)| child).collect();
            pending.extend(children.into_iter().rev());
        }

        entries
    }

    pub fn stats(&self) -> TreeStats {
        TreeStats {
            folders: self.folders.len(),
            files: self.files.len(),
            versions: self.files.iter().map(|(_, file)| file.len()).sum(),
        }
    }
}
