/*!
 * Change records replayed against the versioned tree
 */

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::types::{ActionId, ContentHash};

/// Discriminant of an [`Action`], used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    CreateFolder,
    RemoveFolder,
    ModifyFile,
    RemoveFile,
    RenameFile,
    RenameFolder,
}

/// A single immutable change record
///
/// Folder variants are accepted by the replay engine but do not change the
/// tree; folders only come into existence while resolving a file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Declared folder creation (no structural effect)
    CreateFolder { action_id: ActionId },

    /// Declared folder removal (no structural effect)
    RemoveFolder { action_id: ActionId },

    /// Create or update the content of a file
    ModifyFile {
        action_id: ActionId,
        path: Vec<String>,
        hash: ContentHash,
        #[serde(default)]
        prev_action_id: ActionId,
    },

    /// Remove the version named by `prev_action_id`
    RemoveFile {
        action_id: ActionId,
        path: Vec<String>,
        #[serde(default)]
        prev_action_id: ActionId,
    },

    /// Move a file version to a new path, replayed as a removal then a modification
    RenameFile {
        action_id: ActionId,
        old_path: Vec<String>,
        new_path: Vec<String>,
        hash: ContentHash,
        #[serde(default)]
        prev_action_id: ActionId,
    },

    /// Declared folder rename (no structural effect)
    RenameFolder { action_id: ActionId },
}

fn to_segments<S: AsRef<str>>(path: &[S]) -> Vec<String> {
    path.iter().map(|s| s.as_ref().to_string()).collect()
}

impl Action {
    pub fn create_folder(action_id: ActionId) -> Self {
        Action::CreateFolder { action_id }
    }

    pub fn remove_folder(action_id: ActionId) -> Self {
        Action::RemoveFolder { action_id }
    }

    pub fn rename_folder(action_id: ActionId) -> Self {
        Action::RenameFolder { action_id }
    }

    pub fn modify_file<S: AsRef<str>>(
        action_id: ActionId,
        path: &[S],
        hash: impl Into<ContentHash>,
        prev_action_id: ActionId,
    ) -> Self {
        Action::ModifyFile {
            action_id,
            path: to_segments(path),
            hash: hash.into(),
            prev_action_id,
        }
    }

    pub fn remove_file<S: AsRef<str>>(
        action_id: ActionId,
        path: &[S],
        prev_action_id: ActionId,
    ) -> Self {
        Action::RemoveFile {
            action_id,
            path: to_segments(path),
            prev_action_id,
        }
    }

    pub fn rename_file<S: AsRef<str>, T: AsRef<str>>(
        action_id: ActionId,
        old_path: &[S],
        new_path: &[T],
        hash: impl Into<ContentHash>,
        prev_action_id: ActionId,
    ) -> Self {
        Action::RenameFile {
            action_id,
            old_path: to_segments(old_path),
            new_path: to_segments(new_path),
            hash: hash.into(),
            prev_action_id,
        }
    }

    /// Identifier shared by every variant
    pub fn action_id(&self) -> ActionId {
        match self {
            Action::CreateFolder { action_id }
            | Action::RemoveFolder { action_id }
            | Action::RenameFolder { action_id }
            | Action::ModifyFile { action_id, .. }
            | Action::RemoveFile { action_id, .. }
            | Action::RenameFile { action_id, .. } => *action_id,
        }
    }

    /// Version this action supersedes, if the variant carries one
    pub fn prev_action_id(&self) -> Option<ActionId> {
        match self {
            Action::ModifyFile { prev_action_id, .. }
            | Action::RemoveFile { prev_action_id, .. }
            | Action::RenameFile { prev_action_id, .. } => Some(*prev_action_id),
            _ => None,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::CreateFolder { .. } => ActionKind::CreateFolder,
            Action::RemoveFolder { .. } => ActionKind::RemoveFolder,
            Action::ModifyFile { .. } => ActionKind::ModifyFile,
            Action::RemoveFile { .. } => ActionKind::RemoveFile,
            Action::RenameFile { .. } => ActionKind::RenameFile,
            Action::RenameFolder { .. } => ActionKind::RenameFolder,
        }
    }
}
