/*!
 * Command-line interface for replayfs
 */

use std::io;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use replayfs::action_log::ActionLog;
use replayfs::config::{Args, Config};
use replayfs::driver::Replayer;
use replayfs::report::{ReplayReport, ReportFormat, Reporter};
use replayfs::tree::FileSystem;
use replayfs::writer::XmlWriter;

fn main() -> io::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Create configuration
    let config = Config::from_args(args);

    // Logs go to stderr, RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    // Validate configuration
    config.validate()?;

    let log = ActionLog::load(&config.log_file)?;

    let progress = if config.show_progress {
        let progress = ProgressBar::new(log.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%) ⏱️  Elapsed: {elapsed_precise}")
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        progress.set_style(style);
        progress.enable_steady_tick(std::time::Duration::from_millis(100));
        progress.set_prefix("🔁 Replaying");
        progress
    } else {
        ProgressBar::hidden()
    };

    let start_time = Instant::now();

    // Replay the log into a fresh tree
    let mut fs = FileSystem::new();
    let mut replayer = Replayer::new(Arc::new(progress.clone()));
    replayer.replay(&mut fs, &log)?;

    // Write XML manifest
    let writer = XmlWriter::new(config.clone());
    writer.write(&fs)?;

    let duration = start_time.elapsed();
    progress.finish_and_clear();

    let stats = replayer.get_statistics();
    let mut report = ReplayReport {
        log_file: config.log_file.display().to_string(),
        output_file: config.output_file.display().to_string(),
        duration,
        batches: stats.batches,
        actions_applied: stats.actions_applied,
        per_kind: stats.per_kind,
        tree: fs.stats(),
        final_bulk: fs.current_bulk(),
        changed: config.since.map(|since| (since, fs.changed_since(since))),
    };
    report.filter_changed(&config.include_patterns);

    let reporter = Reporter::new(ReportFormat::ConsoleTable);
    reporter.print_report(&report);

    Ok(())
}
