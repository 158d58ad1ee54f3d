//! Poster orchestration: pick the layout engine, size the canvas, lay out,
//! render and write.
//!
//! A [`Poster`] borrows one immutable [`PosterConfig`] for its whole life;
//! nothing about it changes between outputs. Per-year circular posters come
//! from [`Poster::yearly`], a lazy iterator over the years present in the
//! track set. A year that fails to lay out yields its error and the
//! iteration carries on with the next year.

use crate::config::PosterConfig;
use crate::layout::{Drawing, Layout, LayoutError, LayoutKind};
use crate::render::render;
use crate::track::Track;
use crate::year_range::all_years_present;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PosterError {
    #[error("no tracks left to draw")]
    NoTracks,
    #[error("cannot lay out {unit}: {reason}")]
    Layout { unit: String, reason: LayoutError },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// File name of a per-year poster.
pub fn year_file_name(year: i32) -> String {
    format!("year_{year}.svg")
}

#[derive(Clone, Copy)]
pub struct Poster<'c> {
    config: &'c PosterConfig,
    engine: &'static dyn Layout,
}

/// Outcome of one per-year output.
#[derive(Debug)]
pub struct YearOutput {
    pub year: i32,
    pub result: Result<PathBuf, PosterError>,
}

impl<'c> Poster<'c> {
    pub fn new(config: &'c PosterConfig) -> Self {
        Self {
            config,
            engine: config.layout.engine(),
        }
    }

    pub fn kind(&self) -> LayoutKind {
        self.config.layout
    }

    /// Whether this poster fans out into one output per year.
    pub fn is_per_year(&self) -> bool {
        self.config.layout == LayoutKind::Circular && self.config.circular.per_year
    }

    /// Lay out `tracks` (chronological) as one poster.
    pub fn draw(&self, tracks: &[Track]) -> Result<Drawing, PosterError> {
        self.draw_unit(tracks, "poster")
    }

    fn draw_unit(&self, tracks: &[Track], unit: &str) -> Result<Drawing, PosterError> {
        if tracks.is_empty() {
            return Err(PosterError::NoTracks);
        }
        let canvas = self.engine.canvas(tracks, self.config);
        self.engine
            .draw(tracks, self.config, canvas)
            .map_err(|reason| PosterError::Layout {
                unit: unit.to_string(),
                reason,
            })
    }

    pub fn render(&self, drawing: &Drawing) -> String {
        render(drawing, &self.config.text).into_string()
    }

    /// One drawing per year present in `tracks`, ascending. Lazy: each
    /// year is laid out only when the iterator reaches it.
    ///
    /// `tracks` must be sorted by start time, as the loader returns them.
    pub fn yearly<'t>(&self, tracks: &'t [Track]) -> YearlyPosters<'c, 't> {
        YearlyPosters {
            poster: *self,
            tracks,
            years: all_years_present(tracks).into_iter().collect::<Vec<_>>().into_iter(),
        }
    }

    /// Draw, render and write a single poster to `path`.
    pub fn write(&self, tracks: &[Track], path: &Path) -> Result<PathBuf, PosterError> {
        let drawing = self.draw(tracks)?;
        write_svg(path, &self.render(&drawing))?;
        tracing::info!(path = %path.display(), shapes = drawing.shapes.len(), "poster written");
        Ok(path.to_path_buf())
    }

    /// Write `year_YYYY.svg` into `dir` for every year, rendering years in
    /// parallel. Results are sorted by year.
    pub fn write_yearly(
        &self,
        tracks: &[Track],
        dir: &Path,
    ) -> Result<Vec<YearOutput>, PosterError> {
        if tracks.is_empty() {
            return Err(PosterError::NoTracks);
        }
        fs::create_dir_all(dir)?;
        let mut outputs: Vec<YearOutput> = self
            .yearly(tracks)
            .par_bridge()
            .map(|(year, drawing)| {
                let result = drawing.and_then(|drawing| {
                    let path = dir.join(year_file_name(year));
                    write_svg(&path, &self.render(&drawing))?;
                    Ok(path)
                });
                if let Err(e) = &result {
                    tracing::warn!(year, error = %e, "year poster failed");
                }
                YearOutput { year, result }
            })
            .collect();
        outputs.sort_by_key(|o| o.year);
        Ok(outputs)
    }
}

/// Iterator returned by [`Poster::yearly`]. Clone it to start over.
#[derive(Clone)]
pub struct YearlyPosters<'c, 't> {
    poster: Poster<'c>,
    tracks: &'t [Track],
    years: std::vec::IntoIter<i32>,
}

impl Iterator for YearlyPosters<'_, '_> {
    type Item = (i32, Result<Drawing, PosterError>);

    fn next(&mut self) -> Option<Self::Item> {
        let year = self.years.next()?;
        let start = self.tracks.partition_point(|t| t.year() < year);
        let end = self.tracks.partition_point(|t| t.year() <= year);
        let drawing = self
            .poster
            .draw_unit(&self.tracks[start..end], &year.to_string());
        Some((year, drawing))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.years.size_hint()
    }
}

fn write_svg(path: &Path, svg: &str) -> Result<(), PosterError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, svg)?;
    Ok(())
}
