//! Calendar heatmap ("github") layout.
//!
//! One band per calendar year from the first to the last track, stacked
//! top to bottom. Inside a band, days are laid out in week columns
//! (Monday-first, week 0 holds January 1st) and weekday rows. Every day from
//! the first to the last track date gets a cell, active or not.
//!
//! The canvas height depends on the number of years and is fixed by
//! [`Layout::canvas`] before any cell is placed:
//! `base_height + years * row_height`.

use super::{Anchor, Canvas, Drawing, Layout, LayoutError, Shape, TextRole};
use crate::classify::{LengthRange, Tier, classify};
use crate::color::interpolate;
use crate::config::{DrawerType, PosterConfig};
use crate::geo::Xy;
use crate::track::Track;
use crate::year_range::calendar_span;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Columns a year can need: 366 days starting on a Sunday touch 54 weeks.
const WEEK_COLUMNS: f64 = 54.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct GithubLayout;

/// Daily distance bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Intensity {
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Intensity {
    pub fn of(distance_m: f64, thresholds: &[f64; 3]) -> Self {
        let [low, medium, high] = *thresholds;
        if distance_m <= 0.0 {
            Self::None
        } else if distance_m < low {
            Self::Low
        } else if distance_m < medium {
            Self::Medium
        } else if distance_m < high {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    /// Position on the track → track2 gradient.
    fn level(self) -> f64 {
        match self {
            Self::None | Self::Low => 0.0,
            Self::Medium => 1.0 / 3.0,
            Self::High => 2.0 / 3.0,
            Self::VeryHigh => 1.0,
        }
    }
}

/// Activity on one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Day {
    pub distance_m: f64,
    pub tier: Tier,
}

/// Sum track lengths by start date, keeping the highest tier of the day.
pub fn daily_totals(tracks: &[Track], config: &PosterConfig) -> BTreeMap<NaiveDate, Day> {
    let mut days: BTreeMap<NaiveDate, Day> = BTreeMap::new();
    for track in tracks {
        let tier = classify(track, config);
        let day = days.entry(track.date()).or_insert(Day {
            distance_m: 0.0,
            tier: Tier::Normal,
        });
        day.distance_m += track.length_m;
        day.tier = day.tier.max(tier);
    }
    days
}

/// `(column, row)` of `date` within its year band.
pub fn cell_position(date: NaiveDate) -> (u32, u32) {
    let jan1 = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date);
    let offset = jan1.weekday().num_days_from_monday();
    let index = date.ordinal0() + offset;
    (index / 7, index % 7)
}

/// Fill color of a day.
fn day_color(day: Option<&Day>, range: &LengthRange, config: &PosterConfig) -> String {
    let github = &config.github;
    let Some(day) = day else {
        return github.empty_color.clone();
    };
    if day.tier > Tier::Normal {
        return day.tier.color(day.distance_m, range, &config.colors);
    }
    match Intensity::of(day.distance_m, &github.thresholds) {
        Intensity::None => github.empty_color.clone(),
        level => interpolate(&config.colors.track, config.colors.track2(), level.level()),
    }
}

impl Layout for GithubLayout {
    fn canvas(&self, tracks: &[Track], config: &PosterConfig) -> Canvas {
        let github = &config.github;
        let years = calendar_span(tracks).len() as f64;
        Canvas {
            width: config.canvas.width,
            height: github.base_height + years * github.row_height,
        }
    }

    fn draw(
        &self,
        tracks: &[Track],
        config: &PosterConfig,
        canvas: Canvas,
    ) -> Result<Drawing, LayoutError> {
        let (Some(first), Some(last)) = (
            tracks.iter().map(Track::date).min(),
            tracks.iter().map(Track::date).max(),
        ) else {
            return Err(LayoutError::Empty);
        };
        let github = &config.github;
        let text = &config.colors.text;
        let label_height = config.text.year_label.size;
        let width = canvas.width - 2.0 * github.margin;
        let cell = (width / WEEK_COLUMNS).min((github.row_height - label_height - 2.0) / 7.0);
        if !(cell > 0.0) {
            return Err(LayoutError::EmptyRegion {
                width,
                height: github.row_height - label_height - 2.0,
            });
        }
        let side = cell * (1.0 - github.cell_gap);

        let days = daily_totals(tracks, config);
        let range = LengthRange::of(tracks);
        let mut drawing = Drawing::new(canvas, &config.colors.background);

        if config.drawer_type() == DrawerType::Title {
            drawing.push(Shape::text(
                Xy::new(canvas.width / 2.0, github.title_y),
                config.title(),
                TextRole::Title,
                Anchor::Middle,
                text,
            ));
        }

        for (band, year) in calendar_span(tracks).into_iter().enumerate() {
            let band_top = github.top_offset + band as f64 * github.row_height;
            let baseline = band_top + label_height;
            let cells_top = baseline + 2.0;

            let year_total: f64 = days
                .range(
                    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(first)
                        ..=NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(last),
                )
                .map(|(_, day)| day.distance_m)
                .sum();
            drawing.push(Shape::text(
                Xy::new(github.margin, baseline),
                year.to_string(),
                TextRole::YearLabel,
                Anchor::Start,
                text,
            ));
            drawing.push(Shape::text(
                Xy::new(canvas.width - github.margin, baseline),
                config.units.format(year_total),
                TextRole::DistanceLabel,
                Anchor::End,
                text,
            ));

            let Some(start) = NaiveDate::from_ymd_opt(year, 1, 1).map(|d| d.max(first)) else {
                continue;
            };
            let Some(end) = NaiveDate::from_ymd_opt(year, 12, 31).map(|d| d.min(last)) else {
                continue;
            };
            for date in start.iter_days().take_while(|d| *d <= end) {
                let (col, row) = cell_position(date);
                drawing.push(Shape::Rect {
                    origin: Xy::new(
                        github.margin + col as f64 * cell,
                        cells_top + row as f64 * cell,
                    ),
                    width: side,
                    height: side,
                    color: day_color(days.get(&date), &range, config),
                });
            }
        }
        tracing::debug!(days = days.len(), "heatmap laid out");
        Ok(drawing)
    }
}
