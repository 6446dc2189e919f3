//! Shared utilities for CLI commands.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Opens `path` for buffered reading, or stdin when no path (or `-`) is given.
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

/// A JSON Lines record: the original text, its parsed form, and its 1-based
/// line number.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: usize,
    pub raw: String,
    pub event: Value,
}

/// Lazily parses JSON Lines input, skipping blank lines.
///
/// Each item is either a parsed record or an error naming the offending line.
pub struct JsonLines<R> {
    lines: std::iter::Enumerate<io::Lines<R>>,
}

impl<R: BufRead> JsonLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines().enumerate(),
        }
    }
}

impl<R: BufRead> Iterator for JsonLines<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, line) in self.lines.by_ref() {
            let line_no = idx + 1;
            let line = match line.with_context(|| format!("failed to read line {line_no}")) {
                Ok(line) => line,
                Err(err) => return Some(Err(err)),
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let parsed = serde_json::from_str(trimmed)
                .with_context(|| format!("invalid JSON on line {line_no}"))
                .map(|event| Record {
                    line: line_no,
                    raw: trimmed.to_string(),
                    event,
                });
            return Some(parsed);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    #[test]
    fn skips_blank_lines_and_keeps_line_numbers() {
        let input = "{\"timestamp\":1}\n\n   \n{\"timestamp\":2}\n";
        let records: Vec<Record> = JsonLines::new(Cursor::new(input))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 1);
        assert_eq!(records[1].line, 4);
        assert_eq!(records[1].event["timestamp"], 2);
        assert_eq!(records[1].raw, "{\"timestamp\":2}");
    }

    #[test]
    fn reports_line_of_invalid_json() {
        let input = "{\"timestamp\":1}\nnot json\n";
        let mut lines = JsonLines::new(Cursor::new(input));
        assert!(lines.next().unwrap().is_ok());

        let err = lines.next().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "invalid JSON on line 2");
    }

    #[test]
    fn open_input_reports_missing_file() {
        let Err(err) = open_input(Some(Path::new("/nonexistent/reseq/log.jsonl"))) else {
            panic!("expected an error for a missing file");
        };
        assert!(err.to_string().contains("failed to open"));
    }
}
