/*!
 * Core scalar types shared by the action model and the versioned tree
 */

/// Caller-assigned identifier of an action; also the key of any version it creates
pub type ActionId = u64;

/// Recency stamp of the batch ("bulk") that touched a node
pub type BulkNumber = u64;

/// Opaque content fingerprint carried by a file version
pub type ContentHash = String;

/// `prev_action_id` value meaning "this action supersedes nothing"
pub const NO_PREDECESSOR: ActionId = 0;

/// Bulk number a fresh file system starts replaying with
pub const INITIAL_BULK: BulkNumber = 1;

/// Bulk number of the root folder before anything is replayed
pub const ROOT_BULK: BulkNumber = 0;

/// Returns true if `name` is classified as a file name.
///
/// The classification is purely syntactic: any segment containing a literal
/// `.` is a file name, anything else is a folder name. A folder called `v1.2`
/// is therefore reported as a file by name-based checks such as
/// [`Folder::contains`](crate::tree::Folder::contains).
pub fn is_file_name(name: &str) -> bool {
    name.contains('.')
}
