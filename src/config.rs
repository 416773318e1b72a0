/*!
 * Configuration handling for replayfs
 */

use std::path::PathBuf;

use clap::Parser;

use crate::ensure;
use crate::error::Result;
use crate::types::BulkNumber;

/// Command-line arguments for replayfs
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "replayfs",
    version = env!("CARGO_PKG_VERSION"),
    about = "Materialize a versioned folder/file tree from an ordered action log",
    long_about = "Replays a JSON-lines log of file actions into a versioned tree, writes the resulting tree as an XML manifest and reports what changed since a given bulk."
)]
pub struct Args {
    /// JSON-lines action log to replay
    pub log_file: String,

    /// Output XML manifest file name
    #[clap(default_value = ".replayfs.manifest.xml")]
    pub output_file: String,

    /// Report entries changed after this bulk number
    #[clap(long, value_name = "BULK")]
    pub since: Option<BulkNumber>,

    /// Comma-separated glob patterns restricting the changed-entries report by name
    #[clap(long, value_delimiter = ',')]
    pub include_patterns: Vec<String>,

    /// Log filter used when RUST_LOG is not set
    #[clap(long, default_value = "warn")]
    pub log_level: String,

    /// Hide the progress bar
    #[clap(long)]
    pub no_progress: bool,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Action log to replay
    pub log_file: PathBuf,

    /// Output XML manifest path
    pub output_file: PathBuf,

    /// Bulk number the changed-entries report starts after
    pub since: Option<BulkNumber>,

    /// Patterns to include in the changed-entries report (if empty, include all)
    pub include_patterns: Vec<String>,

    /// Default tracing filter
    pub log_level: String,

    /// Whether to draw a progress bar
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::new(),
            output_file: PathBuf::from(".replayfs.manifest.xml"),
            since: None,
            include_patterns: Vec::new(),
            log_level: "warn".to_string(),
            show_progress: true,
        }
    }
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Self {
        Self {
            log_file: PathBuf::from(args.log_file),
            output_file: PathBuf::from(args.output_file),
            since: args.since,
            include_patterns: args.include_patterns,
            log_level: args.log_level,
            show_progress: !args.no_progress,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.log_file.is_file(),
            Config,
            "Action log not found: {}",
            self.log_file.display()
        );

        // Check if output file directory exists
        if let Some(parent) = self.output_file.parent() {
            ensure!(
                parent.as_os_str().is_empty() || parent.exists(),
                Config,
                "Output directory not found: {}",
                parent.display()
            );
        }

        Ok(())
    }
}
