//! Circular layout: every track as a curve in polar coordinates.
//!
//! A point's radius is its cumulative distance along the track, scaled so
//! the normalizer (the longest track, or `circular.max_distance`) reaches
//! the outer radius. Its angle is the elapsed-time fraction of the track,
//! clockwise from 12 o'clock, so every curve starts at the top and ends a
//! full turn later. Overlaid, the set forms a rose.
//!
//! With the title drawer the rose sits below the same header band the grid
//! layout uses.

use super::{Anchor, Canvas, Drawing, Layout, LayoutError, Shape, TextRole, header_height};
use crate::classify::{paint_order, style_all};
use crate::config::{DrawerType, PosterConfig};
use crate::geo::Xy;
use crate::track::Track;
use crate::year_range::all_years_present;
use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, Default)]
pub struct CircularLayout;

/// Center and outer radius of the rose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polar {
    pub center: Xy,
    pub max_radius: f64,
}

impl Polar {
    pub fn fit(config: &PosterConfig, canvas: Canvas) -> Result<Self, LayoutError> {
        let margin = config.circular.margin;
        let top = header_height(config).max(margin);
        let width = canvas.width - 2.0 * margin;
        let height = canvas.height - top - margin;
        if !(width > 0.0 && height > 0.0) {
            return Err(LayoutError::EmptyRegion { width, height });
        }
        Ok(Self {
            center: Xy::new(margin + width / 2.0, top + height / 2.0),
            max_radius: width.min(height) / 2.0,
        })
    }

    /// `angle` in radians, clockwise from 12 o'clock.
    pub fn point(&self, radius: f64, angle: f64) -> Xy {
        Xy::new(
            self.center.x + radius * angle.sin(),
            self.center.y - radius * angle.cos(),
        )
    }
}

/// `(radius, angle)` of every point of `track`, or `None` for a degenerate
/// track that should be drawn as a center dot.
pub fn polar_points(track: &Track, normalizer: f64, max_radius: f64) -> Option<Vec<(f64, f64)>> {
    let cumulative = track.cumulative_distances();
    let total = cumulative.last().copied().unwrap_or(0.0);
    if track.points.len() < 2 || total <= 0.0 || normalizer <= 0.0 {
        return None;
    }
    let duration = track.duration_s();
    let last = (track.points.len() - 1) as f64;
    Some(
        track
            .points
            .iter()
            .zip(&cumulative)
            .enumerate()
            .map(|(i, (point, distance))| {
                let fraction = if duration > 0.0 {
                    (point.time - track.start_time).num_milliseconds() as f64 / 1000.0 / duration
                } else {
                    i as f64 / last
                };
                let radius = (distance / normalizer).min(1.0) * max_radius;
                (radius, fraction * TAU)
            })
            .collect(),
    )
}

/// Longest geometric length in the set, or the configured fixed maximum.
fn normalizer(tracks: &[Track], config: &PosterConfig) -> f64 {
    config.circular.max_distance.unwrap_or_else(|| {
        tracks
            .iter()
            .filter_map(|t| t.cumulative_distances().last().copied())
            .fold(0.0, f64::max)
    })
}

/// `2023`, or `2021-2023` for a multi-year set.
fn year_label(tracks: &[Track]) -> String {
    let years = all_years_present(tracks);
    match (years.first(), years.last()) {
        (Some(first), Some(last)) if first == last => first.to_string(),
        (Some(first), Some(last)) => format!("{first}-{last}"),
        _ => String::new(),
    }
}

impl Layout for CircularLayout {
    fn draw(
        &self,
        tracks: &[Track],
        config: &PosterConfig,
        canvas: Canvas,
    ) -> Result<Drawing, LayoutError> {
        if tracks.is_empty() {
            return Err(LayoutError::Empty);
        }
        let circular = &config.circular;
        let polar = Polar::fit(config, canvas)?;
        let normalizer = normalizer(tracks, config);
        let styled = style_all(tracks, config);
        let mut drawing = Drawing::new(canvas, &config.colors.background);

        if config.drawer_type() == DrawerType::Title {
            drawing.push(Shape::text(
                Xy::new(canvas.width / 2.0, config.grid.title_y),
                config.title(),
                TextRole::Title,
                Anchor::Middle,
                &config.colors.text,
            ));
        }

        for k in 1..=circular.rings {
            drawing.push(Shape::Ring {
                center: polar.center,
                radius: polar.max_radius * k as f64 / circular.rings as f64,
                color: circular.ring_color.clone(),
                width: circular.stroke_width / 2.0,
            });
        }

        for idx in paint_order(&styled) {
            let item = &styled[idx];
            match polar_points(item.track, normalizer, polar.max_radius) {
                Some(points) => drawing.push(Shape::Polyline {
                    points: points
                        .into_iter()
                        .map(|(r, angle)| polar.point(r, angle))
                        .collect(),
                    color: item.color.clone(),
                    width: circular.stroke_width,
                }),
                None => drawing.push(Shape::Dot {
                    center: polar.center,
                    radius: circular.stroke_width,
                    color: item.color.clone(),
                }),
            }
        }

        let total: f64 = tracks.iter().map(|t| t.length_m).sum();
        let year_size = config.text.year_label.size;
        drawing.push(Shape::text(
            Xy::new(polar.center.x, polar.center.y - 1.0),
            year_label(tracks),
            TextRole::YearLabel,
            Anchor::Middle,
            &config.colors.text,
        ));
        drawing.push(Shape::text(
            Xy::new(polar.center.x, polar.center.y + year_size),
            config.units.format(total),
            TextRole::DistanceLabel,
            Anchor::Middle,
            &config.colors.text,
        ));
        Ok(drawing)
    }
}
