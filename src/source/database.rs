//! Activity database source.
//!
//! Reads the `activities` table written by the sync scripts:
//!
//! ```sql
//! CREATE TABLE activities (
//!     run_id INTEGER PRIMARY KEY,
//!     name TEXT,
//!     distance REAL,             -- meters
//!     moving_time TEXT,          -- "H:MM:SS" or "N days, H:MM:SS"
//!     start_date TEXT,           -- UTC, "YYYY-MM-DD HH:MM:SS"
//!     start_date_local TEXT,     -- local wall-clock, same format
//!     summary_polyline TEXT      -- encoded polyline, may be empty
//! );
//! ```
//!
//! With [`Geometry::SummaryOnly`] the polyline column is never decoded and
//! rows without map data still produce a track. With [`Geometry::Full`] the
//! polyline is decoded and point times are spread evenly between the start
//! and `start + moving_time`, since the summary line carries no timestamps.

use super::polyline;
use super::{
    Geometry, LoadError, ReadOptions, SkipReason, Skipped, SourceItem, SourceTrack, TimeZoneMode,
    TrackSource,
};
use crate::track::{Track, TrackPoint};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;

const QUERY: &str = "SELECT run_id, name, distance, moving_time, start_date, start_date_local, \
                     summary_polyline FROM activities";

#[derive(Debug, Clone)]
pub struct ActivityDatabase {
    path: PathBuf,
}

/// One `activities` row, before validation.
#[derive(Debug)]
struct ActivityRow {
    run_id: i64,
    name: Option<String>,
    distance: Option<f64>,
    moving_time: Option<String>,
    start_date: String,
    start_date_local: Option<String>,
    summary_polyline: Option<String>,
}

impl ActivityDatabase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn connect(&self) -> Result<Connection, LoadError> {
        if !self.path.is_file() {
            return Err(LoadError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("database not found: {}", self.path.display()),
            )));
        }
        Ok(Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?)
    }
}

impl TrackSource for ActivityDatabase {
    fn describe(&self) -> String {
        format!("activity database {}", self.path.display())
    }

    fn read(&self, options: &ReadOptions) -> Result<Vec<SourceItem>, LoadError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(QUERY)?;
        let rows = stmt.query_map([], |row| {
            Ok(ActivityRow {
                run_id: row.get(0)?,
                name: row.get(1)?,
                distance: row.get(2)?,
                moving_time: row.get(3)?,
                start_date: row.get(4)?,
                start_date_local: row.get(5)?,
                summary_polyline: row.get(6)?,
            })
        })?;

        let mut items = Vec::new();
        for (idx, row) in rows.enumerate() {
            let item = match row {
                Ok(row) => row_to_track(row, options),
                Err(e) => Err(Skipped {
                    source_id: format!("row {}", idx + 1),
                    reason: SkipReason::Row(e.to_string()),
                }),
            };
            items.push(item);
        }
        tracing::info!(count = items.len(), path = %self.path.display(), "read activity rows");
        Ok(items)
    }
}

fn row_to_track(row: ActivityRow, options: &ReadOptions) -> SourceItem {
    let source_id = row.run_id.to_string();
    let skipped = |reason: SkipReason| Skipped {
        source_id: source_id.clone(),
        reason,
    };

    let start = start_time(&row, options.time_zone).map_err(skipped)?;
    let moving = row
        .moving_time
        .as_deref()
        .map(parse_moving_time)
        .transpose()
        .map_err(skipped)?
        .unwrap_or_else(Duration::zero);
    let end = start.checked_add_signed(moving).ok_or_else(|| {
        skipped(SkipReason::Row(format!(
            "bad moving_time {:?}: end out of range",
            row.moving_time.as_deref().unwrap_or_default()
        )))
    })?;
    let name = row.name.clone().unwrap_or_else(|| source_id.clone());
    let distance = row.distance.unwrap_or(0.0);

    let track = match options.geometry {
        Geometry::SummaryOnly => Track::summary(source_id.clone(), name, start, end, distance)
            .map_err(|e| skipped(e.into()))?,
        Geometry::Full => {
            let encoded = row
                .summary_polyline
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| skipped(SkipReason::MissingGeometry))?;
            let coords = polyline::decode(encoded)
                .map_err(|e| skipped(SkipReason::Row(format!("polyline: {e}"))))?;
            let points = spread_times(&coords, start, end);
            let mut track = Track::from_points(source_id.clone(), name, points)
                .map_err(|e| skipped(e.into()))?;
            if let Some(recorded) = row.distance.filter(|d| *d > 0.0) {
                track.length_m = recorded;
            }
            track
        }
    };

    Ok(SourceTrack {
        track,
        content_digest: None,
    })
}

fn start_time(row: &ActivityRow, zone: TimeZoneMode) -> Result<NaiveDateTime, SkipReason> {
    match (zone, row.start_date_local.as_deref()) {
        (TimeZoneMode::Local, Some(local)) if !local.is_empty() => parse_timestamp(local),
        _ => {
            let utc = parse_timestamp(&row.start_date)?.and_utc();
            Ok(zone.wall_clock(utc))
        }
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS` (optionally with fraction or offset) and RFC 3339.
fn parse_timestamp(s: &str) -> Result<NaiveDateTime, SkipReason> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"] {
        if let Ok(t) = DateTime::parse_from_str(s, fmt) {
            return Ok(t.with_timezone(&Utc).naive_utc());
        }
    }
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc).naive_utc())
        .map_err(|_| SkipReason::Row(format!("bad timestamp {s:?}")))
}

/// `H:MM:SS[.fff]`, optionally prefixed by `N day, ` / `N days, `.
fn parse_moving_time(s: &str) -> Result<Duration, SkipReason> {
    let bad = || SkipReason::Row(format!("bad moving_time {s:?}"));
    let (days, clock) = match s.split_once(',') {
        Some((days, clock)) => {
            let days: i64 = days
                .trim()
                .trim_end_matches("days")
                .trim_end_matches("day")
                .trim()
                .parse()
                .map_err(|_| bad())?;
            (days, clock.trim())
        }
        None => (0, s.trim()),
    };
    let mut parts = clock.split(':');
    let (Some(h), Some(m), Some(sec), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(bad());
    };
    let hours: i64 = h.parse().map_err(|_| bad())?;
    let minutes: i64 = m.parse().map_err(|_| bad())?;
    let seconds: f64 = sec.parse().map_err(|_| bad())?;
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return Err(bad());
    }
    [
        Duration::try_days(days),
        Duration::try_hours(hours),
        Duration::try_minutes(minutes),
        Duration::try_milliseconds(millis as i64),
    ]
    .into_iter()
    .try_fold(Duration::zero(), |total, part| total.checked_add(&part?))
    .ok_or_else(bad)
}

/// Assign evenly spaced times from `start` to `end` to decoded coordinates.
fn spread_times(
    coords: &[(f64, f64)],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<TrackPoint> {
    let span_ms = (end - start).num_milliseconds().max(0);
    let steps = coords.len().saturating_sub(1).max(1) as i64;
    coords
        .iter()
        .enumerate()
        .map(|(i, &(lat, lon))| {
            let offset = Duration::milliseconds(span_ms * i as i64 / steps);
            TrackPoint::new(lat, lon, start + offset)
        })
        .collect()
}
