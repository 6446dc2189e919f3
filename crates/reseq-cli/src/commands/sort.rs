//! Sort command: restores timestamp order in a JSON Lines sensor log.
//!
//! Events are read one line at a time and pushed through the resequencer;
//! whatever it releases is written and flushed before the next line is read,
//! so bounded mode works on unbounded input such as a live `tail -f`.

use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use reseq_core::{
    AnyResequencer, Mode, Resequencer, ResequencerStats, TailPolicy, TiePolicy,
    TimestampExtractor, TimestampUnit,
};

use super::util::{JsonLines, Record, open_input};
use crate::Config;

#[derive(Debug, Args)]
pub struct SortArgs {
    /// Input file in JSON Lines format. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,

    /// Resequencing mode: `bounded` (streaming) or `full` (sort whole input).
    #[arg(long)]
    pub mode: Option<Mode>,

    /// Lateness tolerance in timestamp units (milliseconds by default).
    #[arg(short, long, allow_negative_numbers = true)]
    pub tolerance: Option<i64>,

    /// Timestamp field: a name, dotted path, or JSON pointer.
    #[arg(long)]
    pub field: Option<String>,

    /// Timestamp format: auto, millis, seconds, or rfc3339.
    #[arg(long)]
    pub unit: Option<TimestampUnit>,

    /// In bounded mode, emit the buffered tail at end of input instead of dropping it.
    #[arg(long)]
    pub flush_tail: bool,

    /// Keep only the last of several events sharing a timestamp (legacy behaviour).
    #[arg(long)]
    pub collapse_ties: bool,

    /// Print a summary of what the resequencer did to stderr.
    #[arg(long)]
    pub stats: bool,
}

impl SortArgs {
    /// Applies command-line overrides on top of loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(mode) = self.mode {
            config.resequencer.mode = mode;
        }
        if let Some(tolerance) = self.tolerance {
            config.resequencer.tolerance_ms = tolerance;
        }
        if let Some(field) = &self.field {
            config.timestamp.field.clone_from(field);
        }
        if let Some(unit) = self.unit {
            config.timestamp.unit = unit;
        }
        if self.flush_tail {
            config.resequencer.tail = TailPolicy::Flush;
        }
        if self.collapse_ties {
            config.resequencer.ties = TiePolicy::CollapseEqual;
        }
    }
}

/// Runs the sort command against the configured input and stdout.
pub fn run(args: &SortArgs, config: &Config) -> Result<ResequencerStats> {
    let mut config = config.clone();
    args.apply(&mut config);

    let reader = open_input(args.input.as_deref())?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    let stats = sort(reader, &mut writer, &config)?;
    writer.flush().context("failed to flush output")?;

    if args.stats {
        eprintln!("{}", render_stats(&stats));
    }
    Ok(stats)
}

/// Resequences every event from `reader` into `writer`.
///
/// Events are written exactly as they were read, one per line. The writer is
/// flushed after every line that released at least one event.
pub fn sort<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    config: &Config,
) -> Result<ResequencerStats> {
    let json = config.timestamp.extractor();
    let extractor = move |record: &Record| json.extract(&record.event);
    let mut resequencer: AnyResequencer<Record, _> =
        AnyResequencer::from_config(extractor, &config.resequencer)
            .context("invalid resequencer configuration")?;
    tracing::debug!(
        mode = %config.resequencer.mode,
        tolerance_ms = config.resequencer.tolerance_ms,
        field = %config.timestamp.field,
        unit = %config.timestamp.unit,
        "starting resequencer"
    );

    let mut ready: Vec<Record> = Vec::new();
    for record in JsonLines::new(reader) {
        let record = record?;
        let line = record.line;
        resequencer
            .on_event(record, |r| ready.push(r))
            .with_context(|| format!("invalid event on line {line}"))?;
        write_records(writer, ready.drain(..))?;
    }

    resequencer.on_end_of_input(|r| ready.push(r));
    write_records(writer, ready.drain(..))?;

    Ok(resequencer.stats())
}

fn write_records<W: Write>(writer: &mut W, records: impl Iterator<Item = Record>) -> Result<()> {
    let mut written = 0_usize;
    for record in records {
        writeln!(writer, "{}", record.raw).context("failed to write event")?;
        written += 1;
    }
    if written > 0 {
        writer.flush().context("failed to flush output")?;
    }
    Ok(())
}

/// Formats stats as a single human-readable line.
pub fn render_stats(stats: &ResequencerStats) -> String {
    format!(
        "received {} | emitted {} | dropped {} | replaced {} | late {} | peak buffered {}",
        stats.received,
        stats.emitted,
        stats.dropped,
        stats.replaced,
        stats.late,
        stats.peak_buffered
    )
}
