//! Track tiers and their colors.
//!
//! A tier is computed per poster and never stored on the [`Track`]: the same
//! track set can be drawn with different special thresholds.

use crate::color::interpolate;
use crate::config::{ColorConfig, PosterConfig};
use crate::track::Track;

/// Color classification of a track. Ordered: `Normal < Special < Special2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Normal,
    Special,
    Special2,
}

/// Only tracks flagged special by the loader can be promoted.
pub fn classify(track: &Track, config: &PosterConfig) -> Tier {
    if !track.is_special {
        Tier::Normal
    } else if track.length_m >= config.special_distance2 {
        Tier::Special2
    } else if track.length_m >= config.special_distance {
        Tier::Special
    } else {
        Tier::Normal
    }
}

/// Shortest and longest track of a set, for the normal-tier gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthRange {
    pub min: f64,
    pub max: f64,
}

impl LengthRange {
    pub fn of(tracks: &[Track]) -> Self {
        let min = tracks.iter().map(|t| t.length_m).fold(f64::INFINITY, f64::min);
        let max = tracks.iter().map(|t| t.length_m).fold(0.0, f64::max);
        Self {
            min: if min.is_finite() { min } else { 0.0 },
            max,
        }
    }

    /// Position of `length` in the range, 0 for a degenerate range.
    pub fn fraction(&self, length: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            0.0
        } else {
            ((length - self.min) / span).clamp(0.0, 1.0)
        }
    }
}

impl Tier {
    pub fn color(self, length_m: f64, range: &LengthRange, colors: &ColorConfig) -> String {
        match self {
            Self::Normal => interpolate(&colors.track, colors.track2(), range.fraction(length_m)),
            Self::Special => colors.special.clone(),
            Self::Special2 => colors.special2().to_string(),
        }
    }
}

/// A track with its tier and resolved color.
#[derive(Debug, Clone)]
pub struct Styled<'a> {
    pub track: &'a Track,
    pub tier: Tier,
    pub color: String,
}

/// Classify a set in its given order.
pub fn style_all<'a>(tracks: &'a [Track], config: &PosterConfig) -> Vec<Styled<'a>> {
    let range = LengthRange::of(tracks);
    tracks
        .iter()
        .map(|track| {
            let tier = classify(track, config);
            Styled {
                track,
                tier,
                color: tier.color(track.length_m, &range, &config.colors),
            }
        })
        .collect()
}

/// Indices of `styled` in drawing order: normal first, special tiers last.
/// Stable, so chronological order is kept within a tier.
pub fn paint_order(styled: &[Styled<'_>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..styled.len()).collect();
    order.sort_by_key(|&i| styled[i].tier);
    order
}
