//! The `Track` entity: one recorded activity.
//!
//! Tracks are built once by a [`TrackSource`](crate::source::TrackSource) and
//! never mutated after the [`TrackLoader`](crate::loader::TrackLoader) hands
//! them out. Times are wall-clock values in whichever zone the batch was
//! normalized to (see [`TimeZoneMode`](crate::source::TimeZoneMode)).

use crate::geo::haversine_m;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    #[error("track has {0} timed points, at least 2 are required")]
    TooFewPoints(usize),
    #[error("timestamps go backwards at point {0}")]
    NonMonotonicTime(usize),
    #[error("negative distance {0}")]
    NegativeLength(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    pub time: NaiveDateTime,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64, time: NaiveDateTime) -> Self {
        Self {
            lat,
            lon,
            elevation: None,
            time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Track {
    /// Relative file path or database row id. Unique within a load.
    pub source_id: String,
    /// Human-readable name (file stem or activity name).
    pub name: String,
    /// Empty for summary-only tracks.
    #[serde(skip)]
    pub points: Vec<TrackPoint>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub length_m: f64,
    pub is_special: bool,
}

impl Track {
    /// Build a track from its point sequence, deriving times and length.
    pub fn from_points(
        source_id: impl Into<String>,
        name: impl Into<String>,
        points: Vec<TrackPoint>,
    ) -> Result<Self, TrackError> {
        if points.len() < 2 {
            return Err(TrackError::TooFewPoints(points.len()));
        }
        if let Some(idx) = points
            .windows(2)
            .position(|pair| pair[1].time < pair[0].time)
        {
            return Err(TrackError::NonMonotonicTime(idx + 1));
        }
        let length_m = points
            .windows(2)
            .map(|pair| haversine_m(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon))
            .sum();
        Ok(Self {
            source_id: source_id.into(),
            name: name.into(),
            start_time: points[0].time,
            end_time: points[points.len() - 1].time,
            points,
            length_m,
            is_special: false,
        })
    }

    /// Build a geometry-less track from database summary fields.
    pub fn summary(
        source_id: impl Into<String>,
        name: impl Into<String>,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        length_m: f64,
    ) -> Result<Self, TrackError> {
        if length_m < 0.0 || length_m.is_nan() {
            return Err(TrackError::NegativeLength(length_m));
        }
        Ok(Self {
            source_id: source_id.into(),
            name: name.into(),
            points: Vec::new(),
            start_time,
            end_time: end_time.max(start_time),
            length_m,
            is_special: false,
        })
    }

    pub fn has_geometry(&self) -> bool {
        self.points.len() >= 2
    }

    pub fn year(&self) -> i32 {
        self.start_time.year()
    }

    pub fn date(&self) -> NaiveDate {
        self.start_time.date()
    }

    /// Distance from the first point to each point, in meters.
    pub fn cumulative_distances(&self) -> Vec<f64> {
        let mut total = 0.0;
        let mut out = Vec::with_capacity(self.points.len());
        for (idx, point) in self.points.iter().enumerate() {
            if idx > 0 {
                let prev = &self.points[idx - 1];
                total += haversine_m(prev.lat, prev.lon, point.lat, point.lon);
            }
            out.push(total);
        }
        out
    }

    /// Seconds between the first and last point.
    pub fn duration_s(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{at, straight_points};

    #[test]
    fn length_is_sum_of_segments() {
        let points = straight_points(at(2023, 1, 1, 8), 3_000.0, 4);
        let track = Track::from_points("a.gpx", "a", points).unwrap();
        assert!((track.length_m - 3_000.0).abs() < 0.01);
    }

    #[test]
    fn times_derive_from_first_and_last_point() {
        let points = straight_points(at(2023, 1, 1, 8), 1_000.0, 3);
        let track = Track::from_points("a.gpx", "a", points).unwrap();
        assert_eq!(track.start_time, at(2023, 1, 1, 8));
        assert_eq!(track.end_time, at(2023, 1, 1, 8) + chrono::Duration::minutes(2));
        assert_eq!(track.year(), 2023);
    }

    #[test]
    fn single_point_is_invalid() {
        let points = straight_points(at(2023, 1, 1, 8), 0.0, 1);
        let err = Track::from_points("a.gpx", "a", points).unwrap_err();
        assert_eq!(err, TrackError::TooFewPoints(1));
    }

    #[test]
    fn backwards_time_is_invalid() {
        let mut points = straight_points(at(2023, 1, 1, 8), 1_000.0, 3);
        points[2].time = at(2023, 1, 1, 7);
        let err = Track::from_points("a.gpx", "a", points).unwrap_err();
        assert_eq!(err, TrackError::NonMonotonicTime(2));
    }

    #[test]
    fn equal_timestamps_are_allowed() {
        let mut points = straight_points(at(2023, 1, 1, 8), 1_000.0, 3);
        points[1].time = points[0].time;
        assert!(Track::from_points("a.gpx", "a", points).is_ok());
    }

    #[test]
    fn cumulative_distances_end_at_length() {
        let points = straight_points(at(2023, 1, 1, 8), 2_000.0, 5);
        let track = Track::from_points("a.gpx", "a", points).unwrap();
        let cumulative = track.cumulative_distances();
        assert_eq!(cumulative.len(), 5);
        assert_eq!(cumulative[0], 0.0);
        assert!((cumulative[4] - track.length_m).abs() < 1e-9);
        assert!(cumulative.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn summary_track_has_no_geometry() {
        let track =
            Track::summary("42", "Morning Run", at(2023, 5, 1, 7), at(2023, 5, 1, 8), 8_000.0)
                .unwrap();
        assert!(!track.has_geometry());
        assert_eq!(track.length_m, 8_000.0);
    }

    #[test]
    fn summary_rejects_negative_length() {
        let result = Track::summary("42", "x", at(2023, 5, 1, 7), at(2023, 5, 1, 8), -1.0);
        assert!(matches!(result, Err(TrackError::NegativeLength(_))));
    }
}
