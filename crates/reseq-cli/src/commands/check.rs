//! Check command: measures how disordered a sensor log is.
//!
//! The report tells an operator which tolerance to configure for bounded
//! resequencing. An event's lateness is how far its timestamp sits behind the
//! highest timestamp seen before it; a tolerance of at least the maximum
//! lateness releases every event in order.

use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use reseq_core::{JsonTimestamp, TimestampExtractor, TimestampUnit};
use serde::Serialize;

use super::util::{JsonLines, open_input};
use crate::Config;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Input file in JSON Lines format. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,

    /// Timestamp field: a name, dotted path, or JSON pointer.
    #[arg(long)]
    pub field: Option<String>,

    /// Timestamp format: auto, millis, seconds, or rfc3339.
    #[arg(long)]
    pub unit: Option<TimestampUnit>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Disorder statistics for one log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisorderReport {
    /// Events read.
    pub events: u64,
    /// Events that arrived behind the running high-water mark.
    pub out_of_order: u64,
    /// Largest distance behind the high-water mark at arrival.
    pub max_lateness: i64,
    /// Line number of the event with the largest lateness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lateness_line: Option<usize>,
    /// Events whose timestamp repeats an earlier one.
    pub duplicate_timestamps: u64,
    /// Smallest timestamp seen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest: Option<i64>,
    /// Largest timestamp seen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<i64>,
}

impl DisorderReport {
    /// Smallest tolerance that would have emitted this log in order.
    pub const fn suggested_tolerance(&self) -> i64 {
        self.max_lateness
    }

    fn observe(&mut self, timestamp: i64, line: usize, seen: &mut HashSet<i64>) {
        self.events += 1;
        if !seen.insert(timestamp) {
            self.duplicate_timestamps += 1;
        }
        if let Some(high_water) = self.latest {
            let lateness = high_water.saturating_sub(timestamp);
            if lateness > 0 {
                self.out_of_order += 1;
                if lateness > self.max_lateness {
                    self.max_lateness = lateness;
                    self.max_lateness_line = Some(line);
                }
            }
        }
        self.earliest = Some(self.earliest.map_or(timestamp, |t| t.min(timestamp)));
        self.latest = Some(self.latest.map_or(timestamp, |t| t.max(timestamp)));
    }
}

/// Runs the check command against the configured input, writing to stdout.
pub fn run(args: &CheckArgs, config: &Config) -> Result<()> {
    let mut timestamp = config.timestamp.clone();
    if let Some(field) = &args.field {
        timestamp.field.clone_from(field);
    }
    if let Some(unit) = args.unit {
        timestamp.unit = unit;
    }

    let reader = open_input(args.input.as_deref())?;
    let report = analyze(reader, &timestamp.extractor())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
        writeln!(out, "{json}")?;
    } else {
        write_report(&mut out, &report)?;
    }
    Ok(())
}

/// Scans every event in `reader` and computes its disorder statistics.
pub fn analyze<R: BufRead>(reader: R, extractor: &JsonTimestamp) -> Result<DisorderReport> {
    let mut report = DisorderReport::default();
    let mut seen = HashSet::new();

    for record in JsonLines::new(reader) {
        let record = record?;
        let timestamp = extractor
            .extract(&record.event)
            .with_context(|| format!("invalid event on line {}", record.line))?;
        report.observe(timestamp, record.line, &mut seen);
    }

    tracing::debug!(
        events = report.events,
        out_of_order = report.out_of_order,
        max_lateness = report.max_lateness,
        "analyzed log"
    );
    Ok(report)
}

/// Writes the report in human-readable form.
pub fn write_report<W: Write>(writer: &mut W, report: &DisorderReport) -> Result<()> {
    let (Some(earliest), Some(latest)) = (report.earliest, report.latest) else {
        writeln!(writer, "No events.")?;
        return Ok(());
    };

    writeln!(writer, "Events:               {}", report.events)?;
    writeln!(writer, "Time span:            {earliest} .. {latest}")?;
    writeln!(writer, "Out of order:         {}", report.out_of_order)?;
    match report.max_lateness_line {
        Some(line) => writeln!(
            writer,
            "Max lateness:         {} (line {line})",
            report.max_lateness
        )?,
        None => writeln!(writer, "Max lateness:         0")?,
    }
    writeln!(writer, "Duplicate timestamps: {}", report.duplicate_timestamps)?;
    writeln!(
        writer,
        "Suggested tolerance:  {}",
        report.suggested_tolerance()
    )?;
    Ok(())
}
