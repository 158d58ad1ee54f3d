//! Shared test utilities for the track-poster test suite.
//!
//! Builders for tracks and points, GPX and SQLite fixture writers, and an
//! in-memory [`TrackSource`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let track = geometry_track("a.gpx", at(2023, 1, 1, 8), 5_000.0);
//! let xml = gpx_document(&track.points);
//! let easy = summary_track("42", at(2023, 1, 2, 7), 8_000.0);
//! let race = special(summary_track("43", at(2023, 1, 3, 9), 21_097.0));
//! ```

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::{Connection, params};

use crate::geo::METERS_PER_DEGREE;
use crate::source::{LoadError, ReadOptions, SourceItem, TrackSource, polyline};
use crate::track::{Track, TrackPoint};

const ORIGIN_LAT: f64 = 48.0;
const ORIGIN_LON: f64 = 11.0;

// =========================================================================
// Times and points
// =========================================================================

/// `y-m-d h:00:00`.
pub fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

/// `n` points heading due north, `length_m` in total, one minute apart.
pub fn straight_points(start: NaiveDateTime, length_m: f64, n: usize) -> Vec<TrackPoint> {
    let step = if n > 1 {
        length_m / (n - 1) as f64 / METERS_PER_DEGREE
    } else {
        0.0
    };
    (0..n)
        .map(|i| TrackPoint {
            lat: ORIGIN_LAT + step * i as f64,
            lon: ORIGIN_LON,
            elevation: Some(500.0),
            time: start + Duration::minutes(i as i64),
        })
        .collect()
}

// =========================================================================
// Tracks
// =========================================================================

/// Five-point straight track of `length_m`.
pub fn geometry_track(id: &str, start: NaiveDateTime, length_m: f64) -> Track {
    Track::from_points(id, stem(id), straight_points(start, length_m, 5)).unwrap()
}

/// Straight track spanning `dlat` x `dlon` degrees from the origin.
pub fn track_with_shape(id: &str, start: NaiveDateTime, dlat: f64, dlon: f64) -> Track {
    let points = (0..5)
        .map(|i| {
            let f = i as f64 / 4.0;
            TrackPoint::new(
                ORIGIN_LAT + dlat * f,
                ORIGIN_LON + dlon * f,
                start + Duration::minutes(i),
            )
        })
        .collect();
    Track::from_points(id, stem(id), points).unwrap()
}

/// Geometry-less track, half an hour long.
pub fn summary_track(id: &str, start: NaiveDateTime, length_m: f64) -> Track {
    Track::summary(id, stem(id), start, start + Duration::minutes(30), length_m).unwrap()
}

pub fn special(mut track: Track) -> Track {
    track.is_special = true;
    track
}

fn stem(id: &str) -> String {
    Path::new(id)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| id.to_string())
}

// =========================================================================
// GPX
// =========================================================================

/// A GPX 1.1 document with one track and one segment.
pub fn gpx_document(points: &[TrackPoint]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="track-poster tests" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>test</name>
    <trkseg>
"#,
    );
    for p in points {
        xml.push_str(&format!(
            "      <trkpt lat=\"{}\" lon=\"{}\">",
            p.lat, p.lon
        ));
        if let Some(ele) = p.elevation {
            xml.push_str(&format!("<ele>{ele:.1}</ele>"));
        }
        xml.push_str(&format!(
            "<time>{}</time></trkpt>\n",
            p.time.format("%Y-%m-%dT%H:%M:%SZ")
        ));
    }
    xml.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
    xml
}

// =========================================================================
// Sources
// =========================================================================

/// A [`TrackSource`] that hands back fixed items.
pub struct StaticSource {
    items: Vec<SourceItem>,
}

impl StaticSource {
    pub fn new(items: Vec<SourceItem>) -> Self {
        Self { items }
    }
}

impl TrackSource for StaticSource {
    fn describe(&self) -> String {
        "static test source".to_string()
    }

    fn read(&self, _options: &ReadOptions) -> Result<Vec<SourceItem>, LoadError> {
        Ok(self.items.clone())
    }
}

/// One `activities` row.
pub struct ActivityFixture {
    pub run_id: i64,
    pub start_date: String,
    pub start_date_local: Option<String>,
    pub distance: f64,
    pub moving_time: String,
    pub summary_polyline: Option<String>,
}

impl ActivityFixture {
    /// Thirty minutes, no local time, no polyline.
    pub fn new(run_id: i64, start_date: &str, distance: f64) -> Self {
        Self {
            run_id,
            start_date: start_date.to_string(),
            start_date_local: None,
            distance,
            moving_time: "0:30:00".to_string(),
            summary_polyline: None,
        }
    }

    /// Attach a short northbound polyline.
    pub fn with_polyline(mut self) -> Self {
        let coords: Vec<(f64, f64)> = straight_points(at(2023, 1, 1, 0), 2_000.0, 5)
            .iter()
            .map(|p| (p.lat, p.lon))
            .collect();
        self.summary_polyline = Some(polyline::encode(&coords));
        self
    }

    pub fn with_local(mut self, local: &str) -> Self {
        self.start_date_local = Some(local.to_string());
        self
    }
}

/// Create `data.db` in `dir` holding `rows`.
pub fn create_activity_db(dir: &Path, rows: &[ActivityFixture]) -> PathBuf {
    let path = dir.join("data.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE activities (
            run_id INTEGER PRIMARY KEY,
            name TEXT,
            distance REAL,
            moving_time TEXT,
            type TEXT,
            start_date TEXT,
            start_date_local TEXT,
            summary_polyline TEXT
        );",
    )
    .unwrap();
    for row in rows {
        conn.execute(
            "INSERT INTO activities (run_id, name, distance, moving_time, type, start_date, \
             start_date_local, summary_polyline) VALUES (?1, ?2, ?3, ?4, 'Run', ?5, ?6, ?7)",
            params![
                row.run_id,
                format!("Run {}", row.run_id),
                row.distance,
                row.moving_time,
                row.start_date,
                row.start_date_local,
                row.summary_polyline,
            ],
        )
        .unwrap();
    }
    path
}
