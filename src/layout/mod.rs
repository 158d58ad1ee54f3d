//! Layout engines: track set + poster config → [`Drawing`].
//!
//! A [`Drawing`] is a flat, ordered list of shapes in poster coordinates
//! (SVG user units, origin top-left, `y` down). Engines decide every
//! position and size, including text; the [renderer](crate::render) only
//! serializes what it is given.
//!
//! | Engine | [`LayoutKind`] | Needs geometry |
//! |---|---|---|
//! | [`GridLayout`] | `grid` | yes |
//! | [`CircularLayout`] | `circular` | yes |
//! | [`GithubLayout`] | `github` | no |
//!
//! Sizing happens in two steps: [`Layout::canvas`] computes the canvas from
//! the track set before any shape is placed, then [`Layout::draw`] lays out
//! into that canvas. Only the heatmap derives its height from the data.

pub mod circular;
pub mod github;
pub mod grid;
pub mod legend;

pub use circular::CircularLayout;
pub use github::GithubLayout;
pub use grid::GridLayout;

use crate::config::PosterConfig;
use crate::geo::Xy;
use crate::track::Track;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("no tracks to lay out")]
    Empty,
    #[error("drawable region is {width:.2} x {height:.2}, nothing fits")]
    EmptyRegion { width: f64, height: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

/// Text roles, each styled by its own [`TextStyle`](crate::config::TextStyle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    YearLabel,
    DistanceLabel,
    LegendLabel,
    LegendValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// An open stroked path through `points`.
    Polyline {
        points: Vec<Xy>,
        color: String,
        width: f64,
    },
    /// A filled circle.
    Dot {
        center: Xy,
        radius: f64,
        color: String,
    },
    /// A filled axis-aligned rectangle.
    Rect {
        origin: Xy,
        width: f64,
        height: f64,
        color: String,
    },
    /// A stroked, unfilled circle.
    Ring {
        center: Xy,
        radius: f64,
        color: String,
        width: f64,
    },
    Text {
        position: Xy,
        content: String,
        role: TextRole,
        anchor: Anchor,
        color: String,
    },
}

impl Shape {
    pub fn text(
        position: Xy,
        content: impl Into<String>,
        role: TextRole,
        anchor: Anchor,
        color: &str,
    ) -> Self {
        Self::Text {
            position,
            content: content.into(),
            role,
            anchor,
            color: color.to_string(),
        }
    }
}

/// Geometry description of one poster.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    pub canvas: Canvas,
    pub background: String,
    pub shapes: Vec<Shape>,
}

impl Drawing {
    pub fn new(canvas: Canvas, background: &str) -> Self {
        Self {
            canvas,
            background: background.to_string(),
            shapes: Vec::new(),
        }
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn texts(&self) -> impl Iterator<Item = (&str, TextRole)> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Text { content, role, .. } => Some((content.as_str(), *role)),
            _ => None,
        })
    }
}

pub trait Layout: Sync {
    /// Canvas size for `tracks`. Computed before [`Layout::draw`].
    fn canvas(&self, _tracks: &[Track], config: &PosterConfig) -> Canvas {
        Canvas {
            width: config.canvas.width,
            height: config.canvas.height,
        }
    }

    /// Lay `tracks` (chronological) out on `canvas`.
    fn draw(
        &self,
        tracks: &[Track],
        config: &PosterConfig,
        canvas: Canvas,
    ) -> Result<Drawing, LayoutError>;
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Grid,
    Circular,
    Github,
}

static GRID: GridLayout = GridLayout;
static CIRCULAR: CircularLayout = CircularLayout;
static GITHUB: GithubLayout = GithubLayout;

impl LayoutKind {
    /// Whether tracks must carry points. The heatmap only reads summaries.
    pub fn needs_geometry(self) -> bool {
        !matches!(self, Self::Github)
    }

    pub fn engine(self) -> &'static dyn Layout {
        match self {
            Self::Grid => &GRID,
            Self::Circular => &CIRCULAR,
            Self::Github => &GITHUB,
        }
    }
}

/// Header band height when the title drawer is on. Shared by the grid and
/// circular engines.
pub(crate) fn header_height(config: &PosterConfig) -> f64 {
    match config.drawer_type() {
        crate::config::DrawerType::Title => config.grid.header_height,
        crate::config::DrawerType::Plain => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heatmap_is_the_only_summary_layout() {
        assert!(LayoutKind::Grid.needs_geometry());
        assert!(LayoutKind::Circular.needs_geometry());
        assert!(!LayoutKind::Github.needs_geometry());
    }

    #[test]
    fn layout_kind_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            layout: LayoutKind,
        }
        let w: Wrapper = toml::from_str("layout = \"github\"").unwrap();
        assert_eq!(w.layout, LayoutKind::Github);
        assert!(toml::from_str::<Wrapper>("layout = \"hex\"").is_err());
    }

    #[test]
    fn default_canvas_comes_from_config() {
        let config = PosterConfig::default();
        let canvas = LayoutKind::Grid.engine().canvas(&[], &config);
        assert_eq!(canvas, Canvas { width: 200.0, height: 300.0 });
    }
}
