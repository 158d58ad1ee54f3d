//! Footer legend: athlete name and set statistics.

use super::{Anchor, Drawing, Shape, TextRole};
use crate::config::PosterConfig;
use crate::geo::Xy;
use crate::locale::Label;
use crate::track::Track;
use chrono::Datelike;
use std::collections::HashSet;

/// Aggregate numbers shown in the legend. Distances in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackStats {
    pub count: usize,
    pub total_m: f64,
    pub min_m: f64,
    pub max_m: f64,
    /// Distinct ISO weeks with at least one track.
    pub active_weeks: usize,
}

impl TrackStats {
    pub fn of(tracks: &[Track]) -> Self {
        let weeks: HashSet<(i32, u32)> = tracks
            .iter()
            .map(|t| {
                let week = t.date().iso_week();
                (week.year(), week.week())
            })
            .collect();
        Self {
            count: tracks.len(),
            total_m: tracks.iter().map(|t| t.length_m).sum(),
            min_m: tracks
                .iter()
                .map(|t| t.length_m)
                .reduce(f64::min)
                .unwrap_or(0.0),
            max_m: tracks
                .iter()
                .map(|t| t.length_m)
                .reduce(f64::max)
                .unwrap_or(0.0),
            active_weeks: weeks.len(),
        }
    }

    pub fn avg_m(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_m / self.count as f64
        }
    }

    /// Tracks per active week.
    pub fn weekly(&self) -> f64 {
        if self.active_weeks == 0 {
            0.0
        } else {
            self.count as f64 / self.active_weeks as f64
        }
    }
}

/// Draw the athlete and statistics columns into the band
/// `[top, top + height)`.
pub fn draw_footer(
    drawing: &mut Drawing,
    tracks: &[Track],
    config: &PosterConfig,
    top: f64,
    height: f64,
) {
    let lang = config.language;
    let units = config.units;
    let color = config.colors.text.as_str();
    let stats = TrackStats::of(tracks);
    let width = drawing.canvas.width;
    let margin = config.grid.margin;
    let row = |k: f64| top + height * k;

    drawing.push(Shape::text(
        Xy::new(margin, row(0.33)),
        lang.translate(Label::Athlete),
        TextRole::LegendLabel,
        Anchor::Start,
        color,
    ));
    drawing.push(Shape::text(
        Xy::new(margin, row(0.67)),
        config.athlete.as_str(),
        TextRole::LegendValue,
        Anchor::Start,
        color,
    ));

    let left = width * 0.55;
    let right = width * 0.78;
    drawing.push(Shape::text(
        Xy::new(left, row(0.33)),
        lang.translate(Label::Statistics),
        TextRole::LegendLabel,
        Anchor::Start,
        color,
    ));

    let lines = [
        (left, 0.5, Label::Number, stats.count.to_string()),
        (left, 0.67, Label::Weekly, format!("{:.1}", stats.weekly())),
        (left, 0.83, Label::Total, units.format(stats.total_m)),
        (right, 0.5, Label::Avg, units.format(stats.avg_m())),
        (right, 0.67, Label::Min, units.format(stats.min_m)),
        (right, 0.83, Label::Max, units.format(stats.max_m)),
    ];
    for (x, k, label, value) in lines {
        drawing.push(Shape::text(
            Xy::new(x, row(k)),
            format!("{}: {}", lang.translate(label), value),
            TextRole::LegendLabel,
            Anchor::Start,
            color,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Canvas;
    use crate::test_helpers::{at, summary_track};

    fn tracks() -> Vec<Track> {
        vec![
            summary_track("a", at(2023, 1, 2, 8), 5_000.0),
            summary_track("b", at(2023, 1, 4, 8), 10_000.0),
            summary_track("c", at(2023, 1, 16, 8), 15_000.0),
        ]
    }

    #[test]
    fn stats_of_set() {
        let stats = TrackStats::of(&tracks());
        assert_eq!(stats.count, 3);
        assert_eq!(stats.total_m, 30_000.0);
        assert_eq!(stats.min_m, 5_000.0);
        assert_eq!(stats.max_m, 15_000.0);
        assert_eq!(stats.avg_m(), 10_000.0);
        // 2023-01-02 and 01-04 share an ISO week, 01-16 is two weeks later.
        assert_eq!(stats.active_weeks, 2);
        assert_eq!(stats.weekly(), 1.5);
    }

    #[test]
    fn stats_of_empty_set() {
        let stats = TrackStats::of(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.avg_m(), 0.0);
        assert_eq!(stats.weekly(), 0.0);
    }

    #[test]
    fn footer_lists_athlete_and_stats() {
        let config = PosterConfig {
            athlete: "Jane Roe".into(),
            ..PosterConfig::default()
        };
        let mut drawing = Drawing::new(
            Canvas {
                width: 200.0,
                height: 300.0,
            },
            "#222222",
        );
        draw_footer(&mut drawing, &tracks(), &config, 270.0, 30.0);
        let texts: Vec<&str> = drawing.texts().map(|(t, _)| t).collect();
        assert!(texts.contains(&"Jane Roe"));
        assert!(texts.contains(&"ATHLETE"));
        assert!(texts.contains(&"Number: 3"));
        assert!(texts.contains(&"Total: 30.0 km"));
        assert!(texts.contains(&"Max: 15.0 km"));
    }
}
