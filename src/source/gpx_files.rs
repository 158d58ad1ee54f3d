//! GPX directory source.
//!
//! Walks a directory tree for `*.gpx` files (hidden entries skipped) and
//! parses them in parallel on the rayon pool. Each file yields at most one
//! track: every `<trk>` and `<trkseg>` in the file is concatenated in
//! document order, and points without a `<time>` are ignored.

use super::{LoadError, ReadOptions, SkipReason, Skipped, SourceItem, SourceTrack, TrackSource};
use crate::track::{Track, TrackPoint};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct GpxDirectory {
    root: PathBuf,
}

impl GpxDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `*.gpx` files below the root, sorted by path.
    fn collect_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_gpx(e.path()))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }

    fn read_file(&self, path: &Path, options: &ReadOptions) -> SourceItem {
        let source_id = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let skipped = |reason: SkipReason| Skipped {
            source_id: source_id.clone(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| skipped(SkipReason::Io(e.to_string())))?;
        let points = parse_gpx_points(&bytes, options).map_err(skipped)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let track = Track::from_points(source_id.clone(), name, points)
            .map_err(|e| skipped(e.into()))?;

        Ok(SourceTrack {
            track,
            content_digest: Some(format!("{:x}", Sha256::digest(&bytes))),
        })
    }
}

impl TrackSource for GpxDirectory {
    fn describe(&self) -> String {
        format!("GPX directory {}", self.root.display())
    }

    fn read(&self, options: &ReadOptions) -> Result<Vec<SourceItem>, LoadError> {
        if !self.root.is_dir() {
            return Err(LoadError::NotADirectory(self.root.clone()));
        }
        let files = self.collect_files();
        tracing::info!(count = files.len(), root = %self.root.display(), "parsing GPX files");
        Ok(files
            .par_iter()
            .map(|path| self.read_file(path, options))
            .collect())
    }
}

fn is_gpx(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("gpx"))
        .unwrap_or(false)
}

/// Parse the timed points of a GPX document, converting to the batch zone.
pub fn parse_gpx_points(
    bytes: &[u8],
    options: &ReadOptions,
) -> Result<Vec<TrackPoint>, SkipReason> {
    let mut cursor = Cursor::new(bytes);
    let gpx = gpx::read(&mut cursor).map_err(|e| SkipReason::Gpx(e.to_string()))?;

    let mut out = Vec::new();
    for track in gpx.tracks {
        for segment in track.segments {
            for point in segment.points {
                let Some(time) = point.time else {
                    continue;
                };
                let iso = time.format().map_err(|e| SkipReason::Gpx(e.to_string()))?;
                let utc = DateTime::parse_from_rfc3339(&iso)
                    .map_err(|e| SkipReason::Gpx(e.to_string()))?
                    .with_timezone(&Utc);
                let geo = point.point();
                out.push(TrackPoint {
                    lat: geo.y(),
                    lon: geo.x(),
                    elevation: point.elevation,
                    time: options.time_zone.wall_clock(utc),
                });
            }
        }
    }
    Ok(out)
}
