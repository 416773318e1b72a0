/*!
 * Reporting functionality for replayfs
 *
 * Renders replay results as console tables using the tabled library.
 */

use std::collections::BTreeMap;
use std::time::Duration;

use glob_match::glob_match;
use strum::IntoEnumIterator;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::action::ActionKind;
use crate::tree::{ChangedEntry, EntryKind, TreeStats};
use crate::types::BulkNumber;
use crate::utils::{file_name, format_number};

/// Number of changed entries listed before the rest is summarized
const MAX_CHANGED_ROWS: usize = 15;

/// Results of one replay run
#[derive(Debug, Clone)]
pub struct ReplayReport {
    /// Action log path
    pub log_file: String,
    /// Output manifest path
    pub output_file: String,
    /// Time taken to replay and write
    pub duration: Duration,
    /// Number of bulks replayed
    pub batches: usize,
    /// Number of actions executed
    pub actions_applied: usize,
    /// Executed actions per kind
    pub per_kind: BTreeMap<ActionKind, usize>,
    /// Node counts of the final tree
    pub tree: TreeStats,
    /// Bulk the tree ended at
    pub final_bulk: BulkNumber,
    /// Bulk the changed list starts after, with the entries found
    pub changed: Option<(BulkNumber, Vec<ChangedEntry>)>,
}

impl ReplayReport {
    /// Keep only changed entries whose final name matches one of `patterns`
    ///
    /// An empty pattern list keeps everything.
    pub fn filter_changed(&mut self, patterns: &[String]) {
        if patterns.is_empty() {
            return;
        }
        if let Some((_, entries)) = &mut self.changed {
            entries.retain(|entry| {
                let name = file_name(&entry.path);
                patterns.iter().any(|pattern| glob_match(pattern, name))
            });
        }
    }
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for replay results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Generate a report string
    pub fn generate_report(&self, report: &ReplayReport) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(report),
        }
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &ReplayReport) {
        println!("\n{}", self.generate_report(report));
    }

    fn style(table: &mut Table) -> String {
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));
        table.to_string()
    }

    fn create_actions_table(&self, report: &ReplayReport) -> String {
        #[derive(Tabled)]
        struct ActionRow {
            #[tabled(rename = "Action")]
            kind: String,

            #[tabled(rename = "Count")]
            count: String,
        }

        // Every kind gets a row, zero counts included
        let rows: Vec<ActionRow> = ActionKind::iter()
            .map(|kind| ActionRow {
                kind: kind.to_string(),
                count: format_number(report.per_kind.get(&kind).copied().unwrap_or(0)),
            })
            .collect();

        Self::style(&mut Table::new(rows))
    }

    fn create_summary_table(&self, report: &ReplayReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let row = |key: &str, value: String| SummaryRow {
            key: key.to_string(),
            value,
        };

        let rows = vec![
            row("📜 Action Log", report.log_file.clone()),
            row("📂 Output File", report.output_file.clone()),
            row("⏱️ Process Time", format!("{:.4?}", report.duration)),
            row("📦 Batches", format_number(report.batches)),
            row("⚙️ Actions Applied", format_number(report.actions_applied)),
            row("📁 Folders", format_number(report.tree.folders)),
            row("📄 Files", format_number(report.tree.files)),
            row("🧾 Versions", format_number(report.tree.versions)),
            row("🔢 Final Bulk", report.final_bulk.to_string()),
        ];

        Self::style(&mut Table::new(rows))
    }

    fn create_changed_table(&self, entries: &[ChangedEntry]) -> String {
        #[derive(Tabled)]
        struct ChangedRow {
            #[tabled(rename = "Kind")]
            kind: String,

            #[tabled(rename = "Path")]
            path: String,

            #[tabled(rename = "Bulk")]
            bulk: String,
        }

        let rows: Vec<ChangedRow> = entries
            .iter()
            .take(MAX_CHANGED_ROWS)
            .map(|entry| ChangedRow {
                kind: match entry.kind {
                    EntryKind::Folder => "folder".to_string(),
                    EntryKind::File => "file".to_string(),
                },
                path: entry.path.clone(),
                bulk: entry.bulk_number.to_string(),
            })
            .collect();

        let mut out = Self::style(&mut Table::new(rows));
        if entries.len() > MAX_CHANGED_ROWS {
            out.push_str(&format!(
                "\n... and {} more",
                entries.len() - MAX_CHANGED_ROWS
            ));
        }
        out
    }

    fn generate_console_report(&self, report: &ReplayReport) -> String {
        let mut out = format!(
            "{}\n{}\n\n{}\n{}",
            "📋  ACTIONS REPLAYED",
            self.create_actions_table(report),
            "✅  REPLAY COMPLETE",
            self.create_summary_table(report)
        );

        if let Some((since, entries)) = &report.changed {
            let title = format!("🔍  CHANGED SINCE BULK {}", since);
            if entries.is_empty() {
                out.push_str(&format!("\n\n{}\nNothing changed", title));
            } else {
                out.push_str(&format!(
                    "\n\n{}\n{}",
                    title,
                    self.create_changed_table(entries)
                ));
            }
        }

        out
    }
}
