//! Grid layout: one mini-map per track, row-major in chronological order.
//!
//! Each track is normalized independently: its own bounding box is projected
//! onto a local plane and scaled uniformly to fit its cell, so a 3 km loop
//! and a marathon fill their cells alike.

use super::legend::draw_footer;
use super::{Anchor, Canvas, Drawing, Layout, LayoutError, Shape, TextRole, header_height};
use crate::classify::{paint_order, style_all};
use crate::config::{DrawerType, PosterConfig};
use crate::geo::{BoundingBox, Xy};
use crate::track::Track;

/// Degrees; keeps a perfectly straight north-south or east-west track from
/// collapsing its box to zero width.
const BBOX_EPSILON_DEG: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Default)]
pub struct GridLayout;

/// An axis-aligned rectangle on the poster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Cell {
    pub fn contains(&self, p: Xy) -> bool {
        const TOLERANCE: f64 = 1e-9;
        p.x >= self.x - TOLERANCE
            && p.x <= self.x + self.width + TOLERANCE
            && p.y >= self.y - TOLERANCE
            && p.y <= self.y + self.height + TOLERANCE
    }

    fn center(&self) -> Xy {
        Xy::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    fn inset(&self, by: f64) -> Self {
        Self {
            x: self.x + by,
            y: self.y + by,
            width: self.width - 2.0 * by,
            height: self.height - 2.0 * by,
        }
    }
}

/// `(cols, rows)` for `n` tracks.
pub fn dimensions(n: usize) -> (usize, usize) {
    if n == 0 {
        return (0, 0);
    }
    let cols = (n as f64).sqrt().ceil() as usize;
    (cols, n.div_ceil(cols))
}

/// The region tracks are laid out in, after the title and legend bands.
fn region(config: &PosterConfig, canvas: Canvas) -> Cell {
    let margin = config.grid.margin;
    let (top, bottom) = match config.drawer_type() {
        DrawerType::Title => (header_height(config), config.grid.footer_height),
        DrawerType::Plain => (margin, margin),
    };
    Cell {
        x: margin,
        y: top,
        width: canvas.width - 2.0 * margin,
        height: canvas.height - top - bottom,
    }
}

/// One cell per track, row-major.
pub fn cells(n: usize, config: &PosterConfig, canvas: Canvas) -> Result<Vec<Cell>, LayoutError> {
    let area = region(config, canvas);
    if !(area.width > 0.0 && area.height > 0.0) {
        return Err(LayoutError::EmptyRegion {
            width: area.width,
            height: area.height,
        });
    }
    let (cols, rows) = dimensions(n);
    if cols == 0 {
        return Ok(Vec::new());
    }
    let width = area.width / cols as f64;
    let height = area.height / rows as f64;
    Ok((0..n)
        .map(|i| Cell {
            x: area.x + (i % cols) as f64 * width,
            y: area.y + (i / cols) as f64 * height,
            width,
            height,
        })
        .collect())
}

/// Project `track` into `inner`, scaled uniformly and centered. `None` when
/// the track is too small to draw as a line.
fn project_track(track: &Track, inner: &Cell, dot_threshold_m: f64) -> Option<Vec<Xy>> {
    let bbox = BoundingBox::from_points(track.points.iter().map(|p| (p.lat, p.lon)))?;
    let (raw_w, raw_h) = bbox.extent_m();
    if raw_w.max(raw_h) < dot_threshold_m {
        return None;
    }
    let bbox = bbox.expanded(BBOX_EPSILON_DEG);
    let (w_m, h_m) = bbox.extent_m();
    let scale = (inner.width / w_m).min(inner.height / h_m);
    let offset_x = inner.x + (inner.width - w_m * scale) / 2.0;
    let offset_y = inner.y + (inner.height - h_m * scale) / 2.0;
    Some(
        track
            .points
            .iter()
            .map(|p| {
                let local = bbox.project(p.lat, p.lon);
                Xy::new(offset_x + local.x * scale, offset_y + local.y * scale)
            })
            .collect(),
    )
}

impl Layout for GridLayout {
    fn draw(
        &self,
        tracks: &[Track],
        config: &PosterConfig,
        canvas: Canvas,
    ) -> Result<Drawing, LayoutError> {
        if tracks.is_empty() {
            return Err(LayoutError::Empty);
        }
        let grid = &config.grid;
        let cells = cells(tracks.len(), config, canvas)?;
        let styled = style_all(tracks, config);
        let mut drawing = Drawing::new(canvas, &config.colors.background);

        if config.drawer_type() == DrawerType::Title {
            drawing.push(Shape::text(
                Xy::new(canvas.width / 2.0, grid.title_y),
                config.title(),
                TextRole::Title,
                Anchor::Middle,
                &config.colors.text,
            ));
        }

        for idx in paint_order(&styled) {
            let item = &styled[idx];
            let cell = &cells[idx];
            let inner = cell.inset(grid.padding * cell.width.min(cell.height));
            match project_track(item.track, &inner, grid.dot_threshold_m) {
                Some(points) => drawing.push(Shape::Polyline {
                    points,
                    color: item.color.clone(),
                    width: grid.stroke_width,
                }),
                None => {
                    tracing::debug!(source_id = %item.track.source_id, "drawing track as dot");
                    drawing.push(Shape::Dot {
                        center: cell.center(),
                        radius: grid.stroke_width.min(inner.width / 2.0).min(inner.height / 2.0),
                        color: item.color.clone(),
                    });
                }
            }
        }

        if config.drawer_type() == DrawerType::Title {
            let footer_top = canvas.height - grid.footer_height;
            draw_footer(&mut drawing, tracks, config, footer_top, grid.footer_height);
        }
        Ok(drawing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{at, geometry_track, special, track_with_shape};

    fn config() -> PosterConfig {
        PosterConfig::default()
    }

    fn canvas() -> Canvas {
        Canvas {
            width: 200.0,
            height: 300.0,
        }
    }

    fn tracks(n: usize) -> Vec<Track> {
        (0..n)
            .map(|i| geometry_track(&format!("{i}.gpx"), at(2023, 1, 1 + i as u32, 8), 3_000.0))
            .collect()
    }

    fn drawn_tracks(drawing: &Drawing) -> Vec<&Shape> {
        drawing
            .shapes
            .iter()
            .filter(|s| matches!(s, Shape::Polyline { .. } | Shape::Dot { .. }))
            .collect()
    }

    // =========================================================================
    // Grid dimensions
    // =========================================================================

    #[test]
    fn dimensions_follow_square_root() {
        assert_eq!(dimensions(1), (1, 1));
        assert_eq!(dimensions(2), (2, 1));
        assert_eq!(dimensions(4), (2, 2));
        assert_eq!(dimensions(5), (3, 2));
        assert_eq!(dimensions(10), (4, 3));
        assert_eq!(dimensions(16), (4, 4));
        assert_eq!(dimensions(17), (5, 4));
    }

    #[test]
    fn cell_count_and_columns() {
        for n in 1..=30 {
            let cells = cells(n, &config(), canvas()).unwrap();
            assert_eq!(cells.len(), n);
            let cols = cells.iter().filter(|c| c.y == cells[0].y).count();
            assert_eq!(cols, (n as f64).sqrt().ceil() as usize, "n = {n}");
        }
    }

    #[test]
    fn cells_do_not_overlap() {
        let cells = cells(7, &config(), canvas()).unwrap();
        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                let disjoint = a.x + a.width <= b.x + 1e-9
                    || b.x + b.width <= a.x + 1e-9
                    || a.y + a.height <= b.y + 1e-9
                    || b.y + b.height <= a.y + 1e-9;
                assert!(disjoint, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn title_drawer_reserves_bands() {
        let cells = cells(1, &config(), canvas()).unwrap();
        assert_eq!(cells[0].y, 30.0);
        assert_eq!(cells[0].height, 240.0);

        let mut plain = config();
        plain.drawer_type = Some(DrawerType::Plain);
        let cells = super::cells(1, &plain, canvas()).unwrap();
        assert_eq!(cells[0].y, 10.0);
        assert_eq!(cells[0].height, 280.0);
    }

    #[test]
    fn non_positive_region_is_error() {
        let tiny = Canvas {
            width: 200.0,
            height: 50.0,
        };
        assert!(matches!(
            cells(3, &config(), tiny),
            Err(LayoutError::EmptyRegion { .. })
        ));
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    #[test]
    fn one_shape_per_track() {
        let drawing = GridLayout.draw(&tracks(5), &config(), canvas()).unwrap();
        assert_eq!(drawn_tracks(&drawing).len(), 5);
    }

    #[test]
    fn every_track_stays_in_its_cell() {
        let mut set = tracks(6);
        set.push(track_with_shape("wide.gpx", at(2023, 2, 1, 8), 0.0, 0.05));
        set.push(track_with_shape("tall.gpx", at(2023, 2, 2, 8), 0.05, 0.0));
        let cfg = config();
        let cells = cells(set.len(), &cfg, canvas()).unwrap();
        let drawing = GridLayout.draw(&set, &cfg, canvas()).unwrap();

        // Tracks are all normal tier, so shapes come out in cell order.
        for (cell, shape) in cells.iter().zip(drawn_tracks(&drawing)) {
            match shape {
                Shape::Polyline { points, .. } => {
                    assert!(points.iter().all(|p| cell.contains(*p)), "{cell:?}");
                }
                Shape::Dot { center, .. } => assert!(cell.contains(*center)),
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn track_fills_cell_on_long_axis() {
        let set = vec![track_with_shape("tall.gpx", at(2023, 2, 2, 8), 0.05, 0.0)];
        let mut cfg = config();
        cfg.grid.padding = 0.0;
        let cell = cells(1, &cfg, canvas()).unwrap()[0];
        let drawing = GridLayout.draw(&set, &cfg, canvas()).unwrap();
        let Shape::Polyline { points, .. } = drawn_tracks(&drawing)[0] else {
            panic!("expected a polyline");
        };
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        assert!((min_y - cell.y).abs() < 1e-6);
        assert!((max_y - (cell.y + cell.height)).abs() < 1e-6);
        // A north-south line is centered horizontally.
        assert!((points[0].x - (cell.x + cell.width / 2.0)).abs() < 1e-6);
    }

    #[test]
    fn tiny_track_is_a_dot() {
        let set = vec![track_with_shape("still.gpx", at(2023, 2, 2, 8), 0.00001, 0.0)];
        let drawing = GridLayout.draw(&set, &config(), canvas()).unwrap();
        assert!(matches!(drawn_tracks(&drawing)[0], Shape::Dot { .. }));
    }

    #[test]
    fn specials_drawn_after_normals() {
        let mut set = tracks(3);
        set[0] = special(geometry_track("0.gpx", at(2023, 1, 1, 8), 12_000.0));
        let drawing = GridLayout.draw(&set, &config(), canvas()).unwrap();
        let colors: Vec<&str> = drawn_tracks(&drawing)
            .iter()
            .map(|s| match s {
                Shape::Polyline { color, .. } | Shape::Dot { color, .. } => color.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(colors.last(), Some(&"#FFFF00"));
        assert_eq!(colors[0], "#4DD2FF");
    }

    #[test]
    fn title_and_footer_only_with_title_drawer() {
        let drawing = GridLayout.draw(&tracks(2), &config(), canvas()).unwrap();
        assert!(drawing.texts().any(|(t, r)| t == "MY TRACKS" && r == TextRole::Title));
        assert!(drawing.texts().any(|(t, _)| t == "John Doe"));

        let mut plain = config();
        plain.drawer_type = Some(DrawerType::Plain);
        let drawing = GridLayout.draw(&tracks(2), &plain, canvas()).unwrap();
        assert_eq!(drawing.texts().count(), 0);
    }

    #[test]
    fn empty_set_is_error() {
        assert_eq!(
            GridLayout.draw(&[], &config(), canvas()),
            Err(LayoutError::Empty)
        );
    }
}
