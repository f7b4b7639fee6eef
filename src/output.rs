//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Info
//!
//! ```text
//! 200x150 RGBA
//! ```
//!
//! or, with `--json`, the metadata map itself (`{}` when there is no image):
//!
//! ```text
//! {"width":200,"height":150,"mode":"RGBA"}
//! ```
//!
//! ## History
//!
//! ```text
//! 001 2026-10-14 09:12:01 load path=photo.png
//! 002 2026-10-14 09:12:03 resize h=50 w=50
//! 003 2026-10-14 09:12:09 save format=JPEG path=out.jpg
//! ```
//!
//! Indices are positions in the whole log, so a limited view still lines up
//! with the full one.
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::codec::ImageInfo;
use crate::command::Outcome;
use crate::history::{HistoryRecord, Params};
use std::path::Path;

fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn format_params(params: &Params) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn state_line(info: &ImageInfo) -> String {
    format!("{}x{} {}", info.width, info.height, info.mode)
}

// ============================================================================
// Info
// ============================================================================

pub fn format_info(info: Option<&ImageInfo>) -> Vec<String> {
    match info {
        Some(info) => vec![state_line(info)],
        None => vec!["No image".to_string()],
    }
}

/// Metadata as a single JSON object. Empty object when there is no image.
pub fn info_json(info: Option<&ImageInfo>) -> Result<String, serde_json::Error> {
    match info {
        Some(info) => serde_json::to_string(info),
        None => Ok("{}".to_string()),
    }
}

pub fn print_info(info: Option<&ImageInfo>) {
    for line in format_info(info) {
        println!("{}", line);
    }
}

// ============================================================================
// History
// ============================================================================

/// One line per record, keeping only the last `limit` records if given.
pub fn format_history(records: &[HistoryRecord], limit: Option<usize>) -> Vec<String> {
    if records.is_empty() {
        return vec!["History is empty".to_string()];
    }
    let skip = limit.map_or(0, |n| records.len().saturating_sub(n));
    records
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, record)| {
            let mut line = format!(
                "{} {} {}",
                format_index(i + 1),
                record.date,
                record.operation
            );
            if !record.params.is_empty() {
                line.push(' ');
                line.push_str(&format_params(&record.params));
            }
            line
        })
        .collect()
}

pub fn print_history(records: &[HistoryRecord], limit: Option<usize>) {
    for line in format_history(records, limit) {
        println!("{}", line);
    }
}

// ============================================================================
// Command outcomes
// ============================================================================

pub fn format_outcome(outcome: &Outcome) -> Vec<String> {
    match outcome {
        Outcome::Updated(state) | Outcome::Info(state) => format_info(state.as_ref()),
        Outcome::Saved(path) => vec![format!("Saved {}", display_path(path))],
        Outcome::Undo {
            restored: true,
            state,
        } => {
            let mut lines = vec!["Undone".to_string()];
            lines.extend(format_info(state.as_ref()));
            lines
        }
        Outcome::Undo {
            restored: false, ..
        } => vec!["Nothing to undo".to_string()],
        Outcome::History { records, limit } => format_history(records, *limit),
        Outcome::Quit => Vec::new(),
    }
}

pub fn print_outcome(outcome: &Outcome) {
    for line in format_outcome(outcome) {
        println!("{}", line);
    }
}

/// Error line for the interactive shell, which keeps running after a failure.
pub fn format_error(err: &dyn std::error::Error) -> String {
    format!("Error: {err}")
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
