/*!
 * Tests for replay engine behavior
 */

use std::sync::Arc;

use indicatif::ProgressBar;

use crate::action::{Action, ActionKind};
use crate::action_log::{ActionLog, LogRecord};
use crate::config::Config;
use crate::driver::Replayer;
use crate::error::ReplayFsError;
use crate::report::{ReplayReport, ReportFormat, Reporter};
use crate::tree::{EntryKind, FileSystem, TreeError, TreeStats};
use crate::types::NO_PREDECESSOR;
use crate::writer::XmlWriter;

// Helper to apply an action in a given bulk, failing the test on error
fn apply(fs: &mut FileSystem, bulk: u64, action: Action) {
    fs.execute_in_bulk(bulk, &action).unwrap();
}

fn record(bulk: u64, action: Action) -> LogRecord {
    LogRecord { bulk, action }
}

// The four-step trace: create, supersede, remove, rename from nowhere
#[test]
fn test_example_trace() {
    let mut fs = FileSystem::new();

    apply(&mut fs, 1, Action::modify_file(1, &["a", "b.txt"], "H1", NO_PREDECESSOR));
    let file = fs.get_file(&["a", "b.txt"]).unwrap();
    assert_eq!(file.len(), 1);
    assert_eq!(file.version(1).map(|v| v.hash.as_str()), Some("H1"));

    apply(&mut fs, 2, Action::modify_file(2, &["a", "b.txt"], "H2", 1));
    let file = fs.get_file(&["a", "b.txt"]).unwrap();
    assert!(file.version(1).is_none());
    assert_eq!(file.version(2).map(|v| v.hash.as_str()), Some("H2"));
    assert_eq!(fs.get_folder(&["a"]).unwrap().bulk_number(), 2);

    apply(&mut fs, 3, Action::remove_file(3, &["a", "b.txt"], 2));
    assert!(!fs.contains(&["a", "b.txt"]));
    let folder = fs.get_folder(&["a"]).unwrap();
    assert_eq!(folder.files().count(), 0);
    assert_eq!(folder.bulk_number(), 3);

    apply(
        &mut fs,
        4,
        Action::rename_file(4, &["a", "c.txt"], &["a", "d.txt"], "H3", NO_PREDECESSOR),
    );
    let file = fs.get_file(&["a", "d.txt"]).unwrap();
    assert_eq!(file.version(4).map(|v| v.hash.as_str()), Some("H3"));
    assert_eq!(file.version(4).map(|v| v.bulk_number), Some(4));
    assert!(!fs.contains(&["a", "c.txt"]));
}

#[test]
fn test_modify_creates_ancestors() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::modify_file(1, &["x", "y", "z", "f.rs"], "H", 0));

    assert!(fs.contains(&["x"]));
    assert!(fs.contains(&["x", "y"]));
    assert!(fs.contains(&["x", "y", "z"]));
    assert!(fs.contains(&["x", "y", "z", "f.rs"]));
    assert_eq!(
        fs.stats(),
        TreeStats {
            folders: 4,
            files: 1,
            versions: 1
        }
    );
}

#[test]
fn test_supersession_leaves_unrelated_versions() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::modify_file(1, &["b.txt"], "H1", 0));
    apply(&mut fs, 1, Action::modify_file(2, &["b.txt"], "H2", 0));
    apply(&mut fs, 2, Action::modify_file(3, &["b.txt"], "H3", 1));

    let file = fs.get_file(&["b.txt"]).unwrap();
    let ids: Vec<_> = file.versions().map(|v| v.action_id).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn test_remove_unknown_version_is_noop() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::modify_file(1, &["a", "b.txt"], "H1", 0));

    apply(&mut fs, 2, Action::remove_file(2, &["a", "b.txt"], 99));

    let file = fs.get_file(&["a", "b.txt"]).unwrap();
    assert_eq!(file.len(), 1);
    // Nothing changed, so nothing was stamped
    assert_eq!(fs.get_folder(&["a"]).unwrap().bulk_number(), 1);
}

#[test]
fn test_remove_unknown_path_is_noop() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::remove_file(1, &["missing", "b.txt"], 0));

    assert!(!fs.contains(&["missing"]));
    assert_eq!(fs.stats().folders, 1);
    assert_eq!(fs.root_folder().bulk_number(), 0);
}

#[test]
fn test_remove_one_of_two_versions_keeps_file() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::modify_file(1, &["b.txt"], "H1", 0));
    apply(&mut fs, 1, Action::modify_file(2, &["b.txt"], "H2", 0));
    apply(&mut fs, 2, Action::remove_file(3, &["b.txt"], 1));

    assert!(fs.contains(&["b.txt"]));
    assert_eq!(fs.get_file(&["b.txt"]).unwrap().len(), 1);
    assert_eq!(fs.root_folder().bulk_number(), 2);
}

#[test]
fn test_replaying_twice_converges() {
    let actions = [
        Action::modify_file(1, &["a", "b.txt"], "H1", 0),
        Action::modify_file(2, &["a", "b.txt"], "H2", 1),
        Action::rename_file(3, &["a", "b.txt"], &["c", "b.txt"], "H2", 2),
    ];

    let mut once = FileSystem::new();
    let mut twice = FileSystem::new();
    for action in &actions {
        once.execute(action).unwrap();
        twice.execute(action).unwrap();
        twice.execute(action).unwrap();
    }

    assert_eq!(once.stats(), twice.stats());
    assert_eq!(once.changed_since(0), twice.changed_since(0));
    assert!(!twice.contains(&["a", "b.txt"]));
    assert!(twice.contains(&["c", "b.txt"]));
}

#[test]
fn test_folder_actions_do_not_change_tree() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::create_folder(1));
    apply(&mut fs, 1, Action::rename_folder(2));
    apply(&mut fs, 1, Action::remove_folder(3));

    assert_eq!(fs.stats().folders, 1);
    assert_eq!(fs.root_folder().bulk_number(), 0);
}

#[test]
fn test_recency_propagates_to_root() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::modify_file(1, &["a", "b", "c", "d.txt"], "H", 0));
    apply(&mut fs, 1, Action::modify_file(2, &["e", "f.txt"], "H", 0));
    apply(&mut fs, 5, Action::modify_file(3, &["a", "b", "c", "d.txt"], "H'", 1));

    assert_eq!(fs.get_folder(&["a", "b", "c"]).unwrap().bulk_number(), 5);
    assert_eq!(fs.get_folder(&["a", "b"]).unwrap().bulk_number(), 5);
    assert_eq!(fs.get_folder(&["a"]).unwrap().bulk_number(), 5);
    assert_eq!(fs.root_folder().bulk_number(), 5);
    assert_eq!(fs.get_folder(&["e"]).unwrap().bulk_number(), 1);
}

#[test]
fn test_name_classification_is_syntactic() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::modify_file(1, &["v1.2", "notes"], "H", 0));

    // "notes" is stored as a file but looks like a folder name
    assert!(!fs.contains(&["v1.2", "notes"]));
    assert!(fs.get_file(&["v1.2", "notes"]).is_ok());
    // "v1.2" is stored as a folder but looks like a file name
    assert!(!fs.contains(&["v1.2"]));
    assert!(fs.get_folder(&["v1.2"]).is_ok());

    // A second write under the same dotted folder reuses it
    apply(&mut fs, 2, Action::modify_file(2, &["v1.2", "other"], "H", 0));
    assert_eq!(fs.get_folder(&["v1.2"]).unwrap().files().count(), 2);
}

#[test]
fn test_accessors_report_missing_paths() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::modify_file(1, &["a", "b.txt"], "H", 0));

    assert!(fs.contains::<&str>(&[]));
    assert!(fs.get_folder::<&str>(&[]).unwrap().is_root());
    assert_eq!(
        fs.get_file(&["a", "x.txt"]).unwrap_err(),
        TreeError::NoSuchPath("/a/x.txt".to_string())
    );
    assert!(matches!(
        fs.get_folder(&["a", "b"]),
        Err(TreeError::NoSuchPath(_))
    ));
    assert!(fs.get_file::<&str>(&[]).is_err());
    assert!(!fs.contains(&["q", "r", "s.txt"]));
}

#[test]
fn test_remove_non_empty_file_is_rejected() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::modify_file(1, &["a", "b.txt"], "H", 0));
    let folder = fs.resolve_folder(&["a"]).unwrap();

    let err = fs.remove_file(folder, "b.txt").unwrap_err();
    assert_eq!(err, TreeError::NotEmptyFileRemove("/a/b.txt".to_string()));
    assert!(fs.contains(&["a", "b.txt"]));

    assert!(matches!(
        fs.remove_file(folder, "nope.txt"),
        Err(TreeError::NoSuchPath(_))
    ));
}

#[test]
fn test_upserts_are_idempotent() {
    let mut fs = FileSystem::new();
    let root = fs.root();

    let a = fs.add_folder_if_not_exists(root, "a");
    assert_eq!(fs.add_folder_if_not_exists(root, "a"), a);

    let file = fs.add_file_if_not_exists(a, "b.txt");
    assert_eq!(fs.add_file_if_not_exists(a, "b.txt"), file);
    assert_eq!(fs.file(file).map(|f| f.parent()), Some(a));
    assert_eq!(fs.folder_path(a), "/a");
    assert_eq!(fs.file_path(file), "/a/b.txt");
    assert_eq!(fs.folder_path(root), "/");
}

#[test]
fn test_begin_bulk_rejects_going_back() {
    let mut fs = FileSystem::new();
    fs.begin_bulk(4).unwrap();
    fs.begin_bulk(4).unwrap();

    assert_eq!(
        fs.begin_bulk(3),
        Err(TreeError::BulkOutOfOrder {
            current: 4,
            requested: 3
        })
    );
    assert_eq!(fs.current_bulk(), 4);
}

#[test]
fn test_changed_since_skips_untouched_subtrees() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::modify_file(1, &["old", "a.txt"], "H", 0));
    apply(&mut fs, 2, Action::modify_file(2, &["new", "b.txt"], "H", 0));
    apply(&mut fs, 3, Action::remove_file(3, &["old", "a.txt"], 1));

    let changed = fs.changed_since(1);
    let paths: Vec<_> = changed.iter().map(|e| (e.kind, e.path.as_str())).collect();
    assert_eq!(
        paths,
        vec![
            (EntryKind::Folder, "/"),
            (EntryKind::Folder, "/new"),
            (EntryKind::File, "/new/b.txt"),
            (EntryKind::Folder, "/old"),
        ]
    );

    let changed = fs.changed_since(2);
    let paths: Vec<_> = changed.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["/", "/old"]);

    assert!(fs.changed_since(3).is_empty());
}

#[test]
fn test_replayer_batches_and_statistics() {
    let log = ActionLog::new(vec![
        record(1, Action::modify_file(1, &["a", "b.txt"], "H1", 0)),
        record(1, Action::create_folder(2)),
        record(2, Action::modify_file(3, &["a", "b.txt"], "H2", 1)),
        record(3, Action::remove_file(4, &["a", "b.txt"], 3)),
    ]);

    let mut fs = FileSystem::new();
    let mut replayer = Replayer::new(Arc::new(ProgressBar::hidden()));
    replayer.replay(&mut fs, &log).unwrap();

    let stats = replayer.get_statistics();
    assert_eq!(stats.batches, 3);
    assert_eq!(stats.actions_applied, 4);
    assert_eq!(stats.per_kind.get(&ActionKind::ModifyFile), Some(&2));
    assert_eq!(stats.per_kind.get(&ActionKind::CreateFolder), Some(&1));
    assert_eq!(stats.last_bulk, Some(3));
    assert_eq!(fs.current_bulk(), 3);
    assert!(!fs.contains(&["a", "b.txt"]));
    assert_eq!(fs.get_folder(&["a"]).unwrap().bulk_number(), 3);
}

#[test]
fn test_replayer_rejects_out_of_order_records() {
    let log = ActionLog::new(vec![
        record(2, Action::modify_file(1, &["a.txt"], "H1", 0)),
        record(1, Action::modify_file(2, &["b.txt"], "H2", 0)),
    ]);
    let mut fs = FileSystem::new();
    let mut replayer = Replayer::new(Arc::new(ProgressBar::hidden()));
    let err = replayer.replay(&mut fs, &log).unwrap_err();
    assert!(matches!(err, ReplayFsError::OutOfOrder(_)));
    assert!(!fs.contains(&["b.txt"]));

    let log = ActionLog::new(vec![
        record(1, Action::modify_file(5, &["a.txt"], "H1", 0)),
        record(1, Action::modify_file(5, &["b.txt"], "H2", 0)),
    ]);
    let mut fs = FileSystem::new();
    let mut replayer = Replayer::new(Arc::new(ProgressBar::hidden()));
    let err = replayer.replay(&mut fs, &log).unwrap_err();
    assert!(matches!(err, ReplayFsError::OutOfOrder(_)));
    assert!(fs.contains(&["a.txt"]));
    assert!(!fs.contains(&["b.txt"]));
}

#[test]
fn test_xml_manifest() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::modify_file(1, &["a", "b.txt"], "H1", 0));
    apply(&mut fs, 2, Action::modify_file(2, &["a", "c.txt"], "H<2>", 0));

    let writer = XmlWriter::new(Config::default());
    let mut buf = Vec::new();
    writer.write_to(&fs, &mut buf).unwrap();
    let xml = String::from_utf8(buf).unwrap();

    assert!(xml.contains("<manifest"));
    assert!(xml.contains("bulk=\"2\""));
    assert!(xml.contains("<system_info>"));
    assert!(xml.contains("<folder name=\"a\" path=\"/a\" bulk_number=\"2\">"));
    assert!(xml.contains("<file name=\"b.txt\" path=\"/a/b.txt\">"));
    assert!(xml.contains("<version action_id=\"1\" bulk_number=\"1\" hash=\"H1\"/>"));
    // Attribute values are escaped
    assert!(xml.contains("hash=\"H&lt;2&gt;\""));
}

#[test]
fn test_console_report() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::modify_file(1, &["a", "b.txt"], "H1", 0));
    apply(&mut fs, 2, Action::modify_file(2, &["a", "c.md"], "H2", 0));

    let mut report = ReplayReport {
        log_file: "actions.jsonl".to_string(),
        output_file: "out.xml".to_string(),
        duration: std::time::Duration::from_millis(3),
        batches: 2,
        actions_applied: 2,
        per_kind: [(ActionKind::ModifyFile, 2)].into_iter().collect(),
        tree: fs.stats(),
        final_bulk: fs.current_bulk(),
        changed: Some((1, fs.changed_since(1))),
    };
    report.filter_changed(&["*.md".to_string()]);

    let text = Reporter::new(ReportFormat::ConsoleTable).generate_report(&report);
    assert!(text.contains("modify_file"));
    assert!(text.contains("rename_folder"));
    assert!(text.contains("actions.jsonl"));
    assert!(text.contains("CHANGED SINCE BULK 1"));
    assert!(text.contains("/a/c.md"));
    assert!(!text.contains("/a/b.txt"));
}

#[test]
fn test_replayer_rejects_bulk_below_initial() {
    let log = ActionLog::new(vec![record(0, Action::modify_file(1, &["a.txt"], "H", 0))]);
    let mut fs = FileSystem::new();
    let mut replayer = Replayer::new(Arc::new(ProgressBar::hidden()));

    let err = replayer.replay(&mut fs, &log).unwrap_err();
    assert!(matches!(err, ReplayFsError::OutOfOrder(_)));
    assert_eq!(err.to_string(), "Out of order: bulk 0 precedes current bulk 1");
    assert!(!fs.contains(&["a.txt"]));
    assert_eq!(replayer.get_statistics().batches, 0);
}

#[test]
fn test_replayer_rejects_bulk_older_than_tree() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 3, Action::modify_file(1, &["a.txt"], "H1", 0));

    let log = ActionLog::new(vec![record(2, Action::modify_file(2, &["b.txt"], "H2", 0))]);
    let mut replayer = Replayer::new(Arc::new(ProgressBar::hidden()));
    let err = replayer.replay(&mut fs, &log).unwrap_err();
    assert!(matches!(err, ReplayFsError::OutOfOrder(_)));
    assert!(!fs.contains(&["b.txt"]));
}

#[test]
fn test_changed_since_reports_file_that_lost_a_version() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::modify_file(1, &["d", "x.txt"], "H1", 0));
    apply(&mut fs, 1, Action::modify_file(2, &["d", "x.txt"], "H2", 0));
    apply(&mut fs, 2, Action::remove_file(3, &["d", "x.txt"], 2));

    let file = fs.get_file(&["d", "x.txt"]).unwrap();
    assert_eq!(file.bulk_number(), 2);
    assert_eq!(file.latest().map(|v| v.bulk_number), Some(1));

    let changed = fs.changed_since(1);
    let paths: Vec<_> = changed.iter().map(|e| (e.kind, e.path.as_str())).collect();
    assert_eq!(
        paths,
        vec![
            (EntryKind::Folder, "/"),
            (EntryKind::Folder, "/d"),
            (EntryKind::File, "/d/x.txt"),
        ]
    );
}

#[test]
fn test_ids_of_removed_files_go_stale() {
    let mut fs = FileSystem::new();
    let root = fs.root();
    let old = fs.add_file_if_not_exists(root, "a.txt");
    fs.remove_file(root, "a.txt").unwrap();

    let new = fs.add_file_if_not_exists(root, "b.txt");
    assert_eq!(new.index(), old.index());
    assert!(fs.file(old).is_none());
    assert_eq!(fs.file(new).map(|f| f.name()), Some("b.txt"));
    assert_eq!(fs.file_path(old), "");
}

#[test]
fn test_deep_paths_are_walked_without_recursion() {
    const DEPTH: usize = 2_000;
    let mut path = vec!["d".to_string(); DEPTH];
    path.push("leaf.txt".to_string());

    let mut fs = FileSystem::new();
    fs.begin_bulk(1).unwrap();
    fs.execute(&Action::ModifyFile {
        action_id: 1,
        path,
        hash: "H".to_string(),
        prev_action_id: NO_PREDECESSOR,
    })
    .unwrap();

    let changed = fs.changed_since(0);
    assert_eq!(changed.len(), DEPTH + 2);
    assert_eq!(changed.last().map(|e| e.kind), Some(EntryKind::File));

    let writer = XmlWriter::new(Config::default());
    let mut buf = Vec::new();
    writer.write_to(&fs, &mut buf).unwrap();
    let xml = String::from_utf8(buf).unwrap();
    assert_eq!(xml.matches("<folder ").count(), DEPTH + 1);
    assert_eq!(xml.matches("</folder>").count(), DEPTH + 1);
    assert!(xml.trim_end().ends_with("</manifest>"));
}

#[test]
fn test_xml_manifest_nests_subfolders_before_files() {
    let mut fs = FileSystem::new();
    apply(&mut fs, 1, Action::modify_file(1, &["a", "z.txt"], "H1", 0));
    apply(&mut fs, 1, Action::modify_file(2, &["a", "b", "c.txt"], "H2", 0));
    apply(&mut fs, 1, Action::modify_file(3, &["e", "f.txt"], "H3", 0));

    let writer = XmlWriter::new(Config::default());
    let mut buf = Vec::new();
    writer.write_to(&fs, &mut buf).unwrap();
    let xml = String::from_utf8(buf).unwrap();

    let needles = [
        "path=\"/a\"",
        "path=\"/a/b\"",
        "/a/b/c.txt",
        "/a/z.txt",
        "path=\"/e\"",
        "/e/f.txt",
    ];
    let order: Vec<_> = needles
        .iter()
        .map(|needle| xml.find(needle).unwrap())
        .collect();
    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_eq!(order, sorted);

    let close_b = xml.find("</folder>").unwrap();
    assert!(xml.find("/a/b/c.txt").unwrap() < close_b);
    assert!(close_b < xml.find("/a/z.txt").unwrap());
}
