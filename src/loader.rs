//! Track loading: turns the raw items of a [`TrackSource`] into the ordered,
//! deduplicated, filtered track set every layout consumes.
//!
//! Steps, in order:
//!
//! 1. read every item from the source (parse failures become [`Skipped`]);
//! 2. drop duplicates, first by `source_id`, then by content digest;
//! 3. drop tracks shorter than `min_length_m` or outside the year range;
//! 4. mark special tracks;
//! 5. sort by `start_time`, ties broken by `source_id`.
//!
//! The time zone is applied by the source while parsing, so the year filter
//! and everything downstream see the same wall-clock times.

use crate::config::{ConfigError, LoadConfig};
use crate::source::{Geometry, LoadError, ReadOptions, Skipped, TimeZoneMode, TrackSource};
use crate::track::Track;
use crate::year_range::YearRange;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct TrackLoader {
    pub year_range: YearRange,
    pub min_length_m: f64,
    /// File names, relative paths or run ids of tracks to highlight.
    pub special_names: HashSet<String>,
    pub time_zone: TimeZoneMode,
}

/// Why a parsed track was left out of the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    TooShort,
    OutsideYearRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct Filtered {
    pub source_id: String,
    pub reason: FilterReason,
}

/// Result of a load. An empty `tracks` means there is nothing to draw.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadOutcome {
    pub tracks: Vec<Track>,
    pub skipped: Vec<Skipped>,
    /// `source_id`s dropped as duplicates of an earlier item.
    pub duplicates: Vec<String>,
    pub filtered: Vec<Filtered>,
}

impl LoadOutcome {
    pub fn special_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_special).count()
    }
}

impl TrackLoader {
    pub fn from_config(config: &LoadConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            year_range: config.year_range()?,
            min_length_m: config.min_distance,
            special_names: config.special.iter().cloned().collect(),
            time_zone: config.time_zone,
        })
    }

    pub fn load(
        &self,
        source: &dyn TrackSource,
        geometry: Geometry,
    ) -> Result<LoadOutcome, LoadError> {
        let options = ReadOptions {
            geometry,
            time_zone: self.time_zone,
        };
        let items = source.read(&options)?;
        tracing::info!(items = items.len(), source = %source.describe(), "source read");

        let mut outcome = LoadOutcome::default();
        let mut seen_ids = HashSet::new();
        let mut seen_digests = HashSet::new();

        // Sources may hand items back in any order; dedup "first occurrence"
        // must not depend on that.
        let mut parsed = Vec::new();
        for item in items {
            match item {
                Ok(item) => parsed.push(item),
                Err(skipped) => {
                    tracing::warn!(
                        source_id = %skipped.source_id,
                        reason = %skipped.reason,
                        "skipping"
                    );
                    outcome.skipped.push(skipped);
                }
            }
        }
        parsed.sort_by(|a, b| a.track.source_id.cmp(&b.track.source_id));
        outcome.skipped.sort_by(|a, b| a.source_id.cmp(&b.source_id));

        for item in parsed {
            let mut track = item.track;
            if !seen_ids.insert(track.source_id.clone()) {
                tracing::debug!(source_id = %track.source_id, "duplicate id");
                outcome.duplicates.push(track.source_id);
                continue;
            }
            if let Some(digest) = item.content_digest
                && !seen_digests.insert(digest)
            {
                tracing::debug!(source_id = %track.source_id, "duplicate content");
                outcome.duplicates.push(track.source_id);
                continue;
            }

            if track.length_m < self.min_length_m {
                outcome.filtered.push(Filtered {
                    source_id: track.source_id,
                    reason: FilterReason::TooShort,
                });
                continue;
            }
            if !self.year_range.contains(track.year()) {
                outcome.filtered.push(Filtered {
                    source_id: track.source_id,
                    reason: FilterReason::OutsideYearRange,
                });
                continue;
            }

            track.is_special = self.is_special(&track.source_id);
            outcome.tracks.push(track);
        }

        outcome.tracks.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.source_id.cmp(&b.source_id))
        });

        tracing::info!(
            tracks = outcome.tracks.len(),
            skipped = outcome.skipped.len(),
            duplicates = outcome.duplicates.len(),
            filtered = outcome.filtered.len(),
            "tracks loaded"
        );
        Ok(outcome)
    }

    /// Special names match the full source id or just its file name.
    fn is_special(&self, source_id: &str) -> bool {
        if self.special_names.contains(source_id) {
            return true;
        }
        Path::new(source_id)
            .file_name()
            .map(|name| self.special_names.contains(name.to_string_lossy().as_ref()))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SkipReason, SourceItem, SourceTrack};
    use crate::test_helpers::{StaticSource, at, summary_track};

    fn loader() -> TrackLoader {
        TrackLoader {
            year_range: YearRange::All,
            min_length_m: 1_000.0,
            special_names: HashSet::new(),
            time_zone: TimeZoneMode::Utc,
        }
    }

    fn item(track: Track) -> SourceItem {
        Ok(SourceTrack {
            track,
            content_digest: None,
        })
    }

    fn ids(outcome: &LoadOutcome) -> Vec<&str> {
        outcome.tracks.iter().map(|t| t.source_id.as_str()).collect()
    }

    #[test]
    fn output_sorted_by_start_time() {
        let source = StaticSource::new(vec![
            item(summary_track("c", at(2023, 3, 1, 8), 5_000.0)),
            item(summary_track("a", at(2023, 1, 1, 8), 5_000.0)),
            item(summary_track("b", at(2023, 2, 1, 8), 5_000.0)),
        ]);
        let outcome = loader().load(&source, Geometry::SummaryOnly).unwrap();
        assert_eq!(ids(&outcome), vec!["a", "b", "c"]);
    }

    #[test]
    fn equal_start_times_ordered_by_id() {
        let source = StaticSource::new(vec![
            item(summary_track("z", at(2023, 1, 1, 8), 5_000.0)),
            item(summary_track("m", at(2023, 1, 1, 8), 5_000.0)),
        ]);
        let outcome = loader().load(&source, Geometry::SummaryOnly).unwrap();
        assert_eq!(ids(&outcome), vec!["m", "z"]);
    }

    #[test]
    fn duplicate_ids_load_once() {
        let source = StaticSource::new(vec![
            item(summary_track("a", at(2023, 1, 1, 8), 5_000.0)),
            item(summary_track("a", at(2023, 1, 2, 8), 6_000.0)),
        ]);
        let outcome = loader().load(&source, Geometry::SummaryOnly).unwrap();
        assert_eq!(outcome.tracks.len(), 1);
        assert_eq!(outcome.duplicates, vec!["a"]);
    }

    #[test]
    fn duplicate_content_loads_once() {
        let with_digest = |id: &str| {
            Ok(SourceTrack {
                track: summary_track(id, at(2023, 1, 1, 8), 5_000.0),
                content_digest: Some("abc".into()),
            })
        };
        let source = StaticSource::new(vec![with_digest("b.gpx"), with_digest("a.gpx")]);
        let outcome = loader().load(&source, Geometry::SummaryOnly).unwrap();
        assert_eq!(ids(&outcome), vec!["a.gpx"]);
        assert_eq!(outcome.duplicates, vec!["b.gpx"]);
    }

    #[test]
    fn short_tracks_filtered() {
        let source = StaticSource::new(vec![
            item(summary_track("short", at(2023, 1, 1, 8), 999.0)),
            item(summary_track("exact", at(2023, 1, 2, 8), 1_000.0)),
        ]);
        let outcome = loader().load(&source, Geometry::SummaryOnly).unwrap();
        assert_eq!(ids(&outcome), vec!["exact"]);
        assert_eq!(outcome.filtered[0].reason, FilterReason::TooShort);
    }

    #[test]
    fn year_filter_applied() {
        let source = StaticSource::new(vec![
            item(summary_track("a", at(2022, 12, 31, 23), 5_000.0)),
            item(summary_track("b", at(2023, 1, 1, 0), 5_000.0)),
        ]);
        let loader = TrackLoader {
            year_range: YearRange::parse("2023").unwrap(),
            ..loader()
        };
        let outcome = loader.load(&source, Geometry::SummaryOnly).unwrap();
        assert_eq!(ids(&outcome), vec!["b"]);
        assert_eq!(outcome.filtered[0].reason, FilterReason::OutsideYearRange);
    }

    #[test]
    fn special_matches_id_or_file_name() {
        let source = StaticSource::new(vec![
            item(summary_track("2023/race.gpx", at(2023, 1, 1, 8), 5_000.0)),
            item(summary_track("easy.gpx", at(2023, 1, 2, 8), 5_000.0)),
            item(summary_track("12345", at(2023, 1, 3, 8), 5_000.0)),
        ]);
        let loader = TrackLoader {
            special_names: ["race.gpx".to_string(), "12345".to_string()].into(),
            ..loader()
        };
        let outcome = loader.load(&source, Geometry::SummaryOnly).unwrap();
        let special: Vec<bool> = outcome.tracks.iter().map(|t| t.is_special).collect();
        assert_eq!(special, vec![true, false, true]);
        assert_eq!(outcome.special_count(), 2);
    }

    #[test]
    fn skipped_items_are_reported_not_fatal() {
        let source = StaticSource::new(vec![
            Err(Skipped {
                source_id: "bad.gpx".into(),
                reason: SkipReason::Gpx("unexpected eof".into()),
            }),
            item(summary_track("good.gpx", at(2023, 1, 1, 8), 5_000.0)),
        ]);
        let outcome = loader().load(&source, Geometry::SummaryOnly).unwrap();
        assert_eq!(ids(&outcome), vec!["good.gpx"]);
        assert_eq!(outcome.skipped.len(), 1);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let source = StaticSource::new(vec![item(summary_track(
            "a",
            at(2023, 1, 1, 8),
            10.0,
        ))]);
        let outcome = loader().load(&source, Geometry::SummaryOnly).unwrap();
        assert!(outcome.tracks.is_empty());
    }

    #[test]
    fn from_config_rejects_bad_year() {
        let config = LoadConfig {
            year: "2024-2020".into(),
            ..LoadConfig::default()
        };
        assert!(matches!(
            TrackLoader::from_config(&config),
            Err(ConfigError::YearRange(_))
        ));
    }
}
