//! # Track Poster
//!
//! Turns a collection of recorded GPS activities into an SVG poster. Tracks
//! come from a directory of GPX files or from an activity database, and are
//! drawn in one of three layouts: a grid of mini-maps, a circular "rose" of
//! distance-over-time curves, or a calendar heatmap.
//!
//! # Architecture: Load → Lay Out → Render
//!
//! ```text
//! 1. Load     TrackSource  →  Vec<Track>   (parse, dedup, filter, sort)
//! 2. Lay out  Vec<Track>   →  Drawing      (one engine per layout)
//! 3. Render   Drawing      →  SVG          (Maud)
//! ```
//!
//! The track set and the [`config::PosterConfig`] are immutable once built;
//! every stage after loading is a pure function of the two. Layout engines
//! decide every coordinate and font role, and the renderer only serializes,
//! so a drawing can be inspected in tests without parsing SVG.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`source`] | Track sources: GPX directory, activity database, polyline codec |
//! | [`loader`] | Dedup, year and distance filtering, special marking, ordering |
//! | [`track`] | `Track` and `TrackPoint` |
//! | [`geo`] | Haversine distance, bounding boxes, local planar projection |
//! | [`year_range`] | `"all"` / `"2023"` / `"2020-2023"` filters and year sets |
//! | [`classify`] | Normal / special / special2 tiers and their colors |
//! | [`layout`] | `Drawing` shapes, the `Layout` trait, grid / circular / github engines |
//! | [`render`] | SVG emission with per-role text styles |
//! | [`poster`] | Engine selection, per-year fan-out, file output |
//! | [`config`] | Layered `poster.toml` loading and validation |
//! | [`color`] | Hex colors and gradients |
//! | [`locale`] | Poster label translations |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Config Value
//!
//! Configuration is resolved once (stock defaults, then `poster.toml`, then
//! command-line flags) into a [`config::Config`] and passed by reference.
//! Engines never mutate it, so per-year posters can render in parallel off
//! the same value.
//!
//! ## Text Is Placed When It Is Drawn
//!
//! Every text element carries a role (title, year label, distance label,
//! legend label, legend value). Size, family and weight come from the
//! role's style in the config at emission time.
//!
//! ## Sources Are Interchangeable
//!
//! GPX files and database rows both implement [`source::TrackSource`]. The
//! loader does not know which one it is reading, and a broken file or row is
//! reported and skipped without stopping the batch.

pub mod classify;
pub mod color;
pub mod config;
pub mod geo;
pub mod layout;
pub mod loader;
pub mod locale;
pub mod output;
pub mod poster;
pub mod render;
pub mod source;
pub mod track;
pub mod year_range;

#[cfg(test)]
pub(crate) mod test_helpers;
