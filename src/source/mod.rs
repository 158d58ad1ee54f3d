//! Track sources: where raw activities come from.
//!
//! | Source | Backing store | Geometry |
//! |---|---|---|
//! | [`GpxDirectory`] | directory tree of `.gpx` files | always |
//! | [`ActivityDatabase`] | SQLite `activities` table | decoded polyline, or summary-only |
//!
//! Both implement [`TrackSource`], so the [`TrackLoader`](crate::loader::TrackLoader)
//! applies the same dedup, filtering and ordering regardless of origin.
//!
//! A source reports two kinds of failure. Anything that prevents reading the
//! source at all (missing directory, unopenable database) is a [`LoadError`].
//! A single unreadable file or row becomes a [`Skipped`] item and the rest of
//! the batch carries on.

pub mod database;
pub mod gpx_files;
pub mod polyline;

pub use database::ActivityDatabase;
pub use gpx_files::GpxDirectory;

use crate::track::{Track, TrackError};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Why a single file or row was left out.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("read failed: {0}")]
    Io(String),
    #[error("invalid GPX: {0}")]
    Gpx(String),
    #[error("bad row: {0}")]
    Row(String),
    #[error("no map data")]
    MissingGeometry,
    #[error(transparent)]
    Track(#[from] TrackError),
}

/// A file or row that could not be turned into a track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skipped {
    pub source_id: String,
    #[serde(serialize_with = "serialize_display")]
    pub reason: SkipReason,
}

fn serialize_display<S: serde::Serializer>(reason: &SkipReason, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(reason)
}

/// A successfully parsed track plus what the loader needs to dedup it.
#[derive(Debug, Clone)]
pub struct SourceTrack {
    pub track: Track,
    /// SHA-256 of the raw file, for sources backed by files.
    pub content_digest: Option<String>,
}

pub type SourceItem = Result<SourceTrack, Skipped>;

/// Which zone track timestamps are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    #[default]
    Utc,
    Local,
}

impl TimeZoneMode {
    /// Wall-clock time of an instant in this zone.
    pub fn wall_clock(self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::Utc => instant.naive_utc(),
            Self::Local => instant.with_timezone(&Local).naive_local(),
        }
    }
}

/// Whether the consumer needs point geometry or only summary fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    Full,
    SummaryOnly,
}

#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub geometry: Geometry,
    pub time_zone: TimeZoneMode,
}

/// Something that can produce tracks.
pub trait TrackSource: Sync {
    /// Short human-readable description for diagnostics.
    fn describe(&self) -> String;

    /// Read every item in the source. Order is unspecified; the loader sorts.
    fn read(&self, options: &ReadOptions) -> Result<Vec<SourceItem>, LoadError>;
}
