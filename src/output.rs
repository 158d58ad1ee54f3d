//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Tracks are listed by their position in the poster (chronological order)
//! and their date, name and distance. The source file or database row id is
//! secondary context on an indented `Source:` line.
//!
//! # Output Format
//!
//! ## Load (`check`, and the first half of `draw`)
//!
//! ```text
//! Tracks
//! 001 2023-01-01 Morning Run 5.0 km
//!     Source: 2023/morning.gpx
//! 002 2023-06-15 City Half 21.1 km (special)
//!     Source: 2023/half.gpx
//!
//! Skipped
//!     broken.gpx: invalid GPX: unexpected end of file
//!
//! Loaded 2 tracks (1 special), 1 skipped, 0 duplicates, 3 filtered
//! ```
//!
//! ## Draw
//!
//! ```text
//! grid poster → poster.svg (2 tracks)
//! ```
//!
//! or, for per-year circular posters:
//!
//! ```text
//! 2021 → posters/year_2021.svg
//! 2022 failed: cannot lay out 2022: drawable region is ...
//!
//! Generated 1 poster, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::config::Units;
use crate::layout::LayoutKind;
use crate::loader::{FilterReason, LoadOutcome};
use crate::poster::YearOutput;
use crate::track::Track;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// `001 2023-01-01 Morning Run 5.0 km (special)`
fn track_line(index: usize, track: &Track, units: Units) -> String {
    let mut line = format!(
        "{} {} {} {}",
        format_index(index),
        track.date(),
        track.name,
        units.format(track.length_m)
    );
    if track.is_special {
        line.push_str(" (special)");
    }
    line
}

fn filter_reason(reason: FilterReason) -> &'static str {
    match reason {
        FilterReason::TooShort => "shorter than the minimum distance",
        FilterReason::OutsideYearRange => "outside the year range",
    }
}

// ============================================================================
// Load
// ============================================================================

pub fn format_load_summary(outcome: &LoadOutcome) -> String {
    format!(
        "Loaded {} ({} special), {} skipped, {}, {} filtered",
        plural(outcome.tracks.len(), "track"),
        outcome.special_count(),
        outcome.skipped.len(),
        plural(outcome.duplicates.len(), "duplicate"),
        outcome.filtered.len()
    )
}

/// Format the loaded track list plus diagnostics. `verbose` adds the
/// filtered and duplicate sections.
pub fn format_load_output(outcome: &LoadOutcome, units: Units, verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Tracks".to_string());
    for (i, track) in outcome.tracks.iter().enumerate() {
        lines.push(track_line(i + 1, track, units));
        lines.push(format!("{}Source: {}", indent(1), track.source_id));
    }

    if !outcome.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skipped in &outcome.skipped {
            lines.push(format!("{}{}: {}", indent(1), skipped.source_id, skipped.reason));
        }
    }

    if verbose && !outcome.duplicates.is_empty() {
        lines.push(String::new());
        lines.push("Duplicates".to_string());
        for id in &outcome.duplicates {
            lines.push(format!("{}{}", indent(1), id));
        }
    }

    if verbose && !outcome.filtered.is_empty() {
        lines.push(String::new());
        lines.push("Filtered".to_string());
        for filtered in &outcome.filtered {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                filtered.source_id,
                filter_reason(filtered.reason)
            ));
        }
    }

    lines.push(String::new());
    lines.push(format_load_summary(outcome));
    lines
}

pub fn print_load_output(outcome: &LoadOutcome, units: Units, verbose: bool) {
    for line in format_load_output(outcome, units, verbose) {
        println!("{}", line);
    }
}

// ============================================================================
// Draw
// ============================================================================

pub fn format_single_output(kind: LayoutKind, path: &Path, track_count: usize) -> Vec<String> {
    let kind = match kind {
        LayoutKind::Grid => "grid",
        LayoutKind::Circular => "circular",
        LayoutKind::Github => "github",
    };
    vec![format!(
        "{} poster → {} ({})",
        kind,
        path.display(),
        plural(track_count, "track")
    )]
}

pub fn print_single_output(kind: LayoutKind, path: &Path, track_count: usize) {
    for line in format_single_output(kind, path, track_count) {
        println!("{}", line);
    }
}

pub fn format_yearly_output(outputs: &[YearOutput]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut written = 0;
    for output in outputs {
        match &output.result {
            Ok(path) => {
                written += 1;
                lines.push(format!("{} → {}", output.year, path.display()));
            }
            Err(e) => lines.push(format!("{} failed: {}", output.year, e)),
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {} failed",
        plural(written, "poster"),
        outputs.len() - written
    ));
    lines
}

pub fn print_yearly_output(outputs: &[YearOutput]) {
    for line in format_yearly_output(outputs) {
        println!("{}", line);
    }
}
