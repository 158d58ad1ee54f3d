//! Poster configuration module.
//!
//! Handles loading, validating, and layering `poster.toml`. Configuration is
//! resolved once, in three layers, and is read-only afterward:
//!
//! ```text
//! stock defaults  →  poster.toml (optional, --config)  →  command-line flags
//! ```
//!
//! Each layer only needs the keys it wants to override; the layers are merged
//! as TOML tables by [`merge_toml`] before deserializing into [`Config`].
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [loading]
//! year = "all"              # "all", "2023" or "2020-2023"
//! min_distance = 1000.0     # meters; shorter tracks are dropped
//! special = []              # file names / activity ids to highlight
//! time_zone = "utc"         # "utc" or "local"
//! # max_processes = 4       # parallel GPX parsers (omit for auto = CPU cores)
//!
//! [poster]
//! layout = "grid"           # "grid", "circular" or "github"
//! athlete = "John Doe"
//! language = "en"           # "en" or "zh_CN"
//! units = "metric"          # "metric" or "imperial"
//! special_distance = 10000.0
//! special_distance2 = 20000.0
//! # title = "MY TRACKS"     # defaults to the translated "MY TRACKS"
//! # drawer_type = "title"   # "title" or "plain"; default depends on layout
//!
//! [poster.canvas]
//! width = 200.0
//! height = 300.0
//!
//! [poster.colors]
//! background = "#222222"
//! track = "#4DD2FF"
//! special = "#FFFF00"
//! text = "#FFFFFF"
//! # track2 / special2 enable length gradients when set
//!
//! [poster.text.title]
//! size = 8.0
//! family = "JetBrainsMono, -apple-system, sans-serif"
//! weight = 700
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::color::{ColorError, Rgb};
use crate::layout::LayoutKind;
use crate::locale::{Label, Language};
use crate::source::TimeZoneMode;
use crate::year_range::{YearRange, YearRangeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("{0}")]
    YearRange(#[from] YearRangeError),
    #[error("{0}")]
    Color(#[from] ColorError),
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Track selection: which tracks make it onto the poster.
    pub loading: LoadConfig,
    /// Everything the layout engines and the renderer read.
    pub poster: PosterConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.loading.validate()?;
        self.poster.validate()
    }
}

// =============================================================================
// Loading
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Year filter expression, see [`YearRange::parse`].
    pub year: String,
    /// Minimum track length in meters.
    pub min_distance: f64,
    /// File names (or database run ids) of tracks to highlight.
    pub special: Vec<String>,
    pub time_zone: TimeZoneMode,
    /// Maximum number of parallel GPX parsers. `None` means all cores.
    pub max_processes: Option<usize>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            year: "all".to_string(),
            min_distance: 1000.0,
            special: Vec::new(),
            time_zone: TimeZoneMode::Utc,
            max_processes: None,
        }
    }
}

impl LoadConfig {
    pub fn year_range(&self) -> Result<YearRange, ConfigError> {
        Ok(YearRange::parse(&self.year)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.year_range()?;
        if !(self.min_distance >= 0.0) {
            return Err(ConfigError::Validation(
                "loading.min_distance must be >= 0".into(),
            ));
        }
        if self.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "loading.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &LoadConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Poster
// =============================================================================

/// Whether a title/legend band is reserved on the poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawerType {
    Title,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

const METERS_PER_MILE: f64 = 1609.344;

impl Units {
    /// Convert meters to the display unit (km or mi).
    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            Self::Metric => meters / 1000.0,
            Self::Imperial => meters / METERS_PER_MILE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Metric => "km",
            Self::Imperial => "mi",
        }
    }

    /// `12.3 km`, `7.6 mi`.
    pub fn format(self, meters: f64) -> String {
        format!("{:.1} {}", self.from_meters(meters), self.label())
    }
}

/// Rendering parameters shared by every layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PosterConfig {
    pub layout: LayoutKind,
    /// Poster title; `None` uses the translated "MY TRACKS".
    pub title: Option<String>,
    pub athlete: String,
    pub language: Language,
    pub units: Units,
    /// `None` picks per layout: plain for circular, title otherwise.
    pub drawer_type: Option<DrawerType>,
    /// Special tracks at least this long (meters) use the `special` color.
    pub special_distance: f64,
    /// Special tracks at least this long (meters) use the `special2` color.
    pub special_distance2: f64,
    pub canvas: CanvasConfig,
    pub colors: ColorConfig,
    pub text: TextStyles,
    pub grid: GridConfig,
    pub circular: CircularConfig,
    pub github: GithubConfig,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            layout: LayoutKind::Grid,
            title: None,
            athlete: "John Doe".to_string(),
            language: Language::English,
            units: Units::Metric,
            drawer_type: None,
            special_distance: 10_000.0,
            special_distance2: 20_000.0,
            canvas: CanvasConfig::default(),
            colors: ColorConfig::default(),
            text: TextStyles::default(),
            grid: GridConfig::default(),
            circular: CircularConfig::default(),
            github: GithubConfig::default(),
        }
    }
}

impl PosterConfig {
    pub fn drawer_type(&self) -> DrawerType {
        self.drawer_type.unwrap_or(match self.layout {
            LayoutKind::Circular => DrawerType::Plain,
            LayoutKind::Grid | LayoutKind::Github => DrawerType::Title,
        })
    }

    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .unwrap_or_else(|| self.language.translate(Label::MyTracks))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.special_distance >= 0.0) {
            return Err(ConfigError::Validation(
                "poster.special_distance must be >= 0".into(),
            ));
        }
        if !(self.special_distance2 > self.special_distance) {
            return Err(ConfigError::Validation(format!(
                "poster.special_distance2 ({}) must be greater than poster.special_distance ({})",
                self.special_distance2, self.special_distance
            )));
        }
        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            return Err(ConfigError::Validation(
                "poster.canvas width and height must be positive".into(),
            ));
        }
        self.colors.validate()?;
        self.text.validate()?;
        self.grid.validate()?;
        self.circular.validate()?;
        self.github.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 300.0,
        }
    }
}

/// Color roles. `track2` and `special2` are optional gradient endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub background: String,
    pub track: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track2: Option<String>,
    pub special: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special2: Option<String>,
    pub text: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            background: "#222222".to_string(),
            track: "#4DD2FF".to_string(),
            track2: None,
            special: "#FFFF00".to_string(),
            special2: None,
            text: "#FFFFFF".to_string(),
        }
    }
}

impl ColorConfig {
    /// Secondary track color, or `track` when the gradient is disabled.
    pub fn track2(&self) -> &str {
        self.track2.as_deref().unwrap_or(&self.track)
    }

    /// Secondary special color, or `special` when unset.
    pub fn special2(&self) -> &str {
        self.special2.as_deref().unwrap_or(&self.special)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for color in [
            Some(&self.background),
            Some(&self.track),
            self.track2.as_ref(),
            Some(&self.special),
            self.special2.as_ref(),
            Some(&self.text),
        ]
        .into_iter()
        .flatten()
        {
            Rgb::parse(color)?;
        }
        Ok(())
    }
}

/// Font settings for one text role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextStyle {
    pub size: f64,
    pub family: String,
    pub weight: u16,
}

const DEFAULT_FONT_FAMILY: &str = "JetBrainsMono, -apple-system, sans-serif";

impl TextStyle {
    fn sized(size: f64, weight: u16) -> Self {
        Self {
            size,
            family: DEFAULT_FONT_FAMILY.to_string(),
            weight,
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::sized(4.0, 400)
    }
}

/// Text styles per role, applied by the renderer at emission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextStyles {
    pub title: TextStyle,
    pub year_label: TextStyle,
    pub distance_label: TextStyle,
    pub legend_label: TextStyle,
    pub legend_value: TextStyle,
}

impl Default for TextStyles {
    fn default() -> Self {
        Self {
            title: TextStyle::sized(8.0, 700),
            year_label: TextStyle::sized(5.0, 400),
            distance_label: TextStyle::sized(4.0, 400),
            legend_label: TextStyle::sized(3.0, 400),
            legend_value: TextStyle::sized(5.0, 700),
        }
    }
}

impl TextStyles {
    fn validate(&self) -> Result<(), ConfigError> {
        let roles = [
            ("title", &self.title),
            ("year_label", &self.year_label),
            ("distance_label", &self.distance_label),
            ("legend_label", &self.legend_label),
            ("legend_value", &self.legend_value),
        ];
        for (name, style) in roles {
            if !(style.size > 0.0) {
                return Err(ConfigError::Validation(format!(
                    "poster.text.{name}.size must be positive"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Height of the title band at the top (title drawer only).
    pub header_height: f64,
    /// Baseline of the title inside the header band.
    pub title_y: f64,
    /// Height of the athlete/statistics band at the bottom (title drawer only).
    pub footer_height: f64,
    /// Horizontal margin left and right of the grid.
    pub margin: f64,
    /// Inset of each track inside its cell, as a fraction of the smaller side.
    pub padding: f64,
    pub stroke_width: f64,
    /// Tracks spanning less than this (meters) are drawn as a dot.
    pub dot_threshold_m: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            header_height: 30.0,
            title_y: 20.0,
            footer_height: 30.0,
            margin: 10.0,
            padding: 0.1,
            stroke_width: 0.5,
            dot_threshold_m: 5.0,
        }
    }
}

impl GridConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..0.5).contains(&self.padding) {
            return Err(ConfigError::Validation(
                "poster.grid.padding must be in [0, 0.5)".into(),
            ));
        }
        if self.header_height < 0.0 || self.footer_height < 0.0 || self.margin < 0.0 {
            return Err(ConfigError::Validation(
                "poster.grid header_height, footer_height and margin must be >= 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CircularConfig {
    /// One poster per year instead of one poster for the whole set.
    pub per_year: bool,
    /// Fixed radius normalizer in meters; `None` uses the longest track.
    pub max_distance: Option<f64>,
    pub margin: f64,
    pub stroke_width: f64,
    /// Number of concentric guide rings (0 disables them).
    pub rings: u32,
    pub ring_color: String,
}

impl Default for CircularConfig {
    fn default() -> Self {
        Self {
            per_year: true,
            max_distance: None,
            margin: 10.0,
            stroke_width: 0.3,
            rings: 4,
            ring_color: "#444444".to_string(),
        }
    }
}

impl CircularConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(max) = self.max_distance
            && !(max > 0.0)
        {
            return Err(ConfigError::Validation(
                "poster.circular.max_distance must be positive".into(),
            ));
        }
        Rgb::parse(&self.ring_color)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubConfig {
    /// Canvas height without any year rows.
    pub base_height: f64,
    /// Height added per year.
    pub row_height: f64,
    /// Top of the first year band.
    pub top_offset: f64,
    pub title_y: f64,
    pub margin: f64,
    /// Fraction of a cell left empty between neighbours.
    pub cell_gap: f64,
    /// Ascending daily-distance thresholds (meters) for the low, medium,
    /// high and very-high buckets; any positive distance is at least low.
    pub thresholds: [f64; 3],
    /// Fill for days without activity.
    pub empty_color: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_height: 35.0,
            row_height: 32.0,
            top_offset: 22.0,
            title_y: 12.0,
            margin: 10.0,
            cell_gap: 0.15,
            thresholds: [5_000.0, 10_000.0, 20_000.0],
            empty_color: "#444444".to_string(),
        }
    }
}

impl GithubConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.row_height > 0.0) {
            return Err(ConfigError::Validation(
                "poster.github.row_height must be positive".into(),
            ));
        }
        if !(self.base_height >= self.top_offset && self.top_offset >= 0.0) {
            return Err(ConfigError::Validation(
                "poster.github.base_height must be >= top_offset >= 0".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.cell_gap) {
            return Err(ConfigError::Validation(
                "poster.github.cell_gap must be in [0, 1)".into(),
            ));
        }
        let [a, b, c] = self.thresholds;
        if !(0.0 < a && a < b && b < c) {
            return Err(ConfigError::Validation(
                "poster.github.thresholds must be positive and strictly ascending".into(),
            ));
        }
        Rgb::parse(&self.empty_color)?;
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from an optional file plus an already-built CLI overlay.
pub fn load_config(path: Option<&Path>, cli: toml::Value) -> Result<Config, ConfigError> {
    let mut overlays = Vec::with_capacity(2);
    if let Some(path) = path {
        overlays.push(load_raw_config(path)?);
    }
    overlays.push(cli);
    resolve_config(stock_defaults_value(), overlays)
}

/// Returns a fully-commented stock `poster.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Track Poster Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Track selection
# ---------------------------------------------------------------------------
[loading]
# "all", a single year ("2023") or an inclusive range ("2020-2023").
year = "all"

# Tracks shorter than this many meters are dropped.
min_distance = 1000.0

# GPX file names (or database run ids) drawn in the special colors.
special = []

# Interpret timestamps as "utc" or "local" wall-clock time. Year filtering
# and calendar placement use the chosen zone.
time_zone = "utc"

# Maximum parallel GPX parsers. Omit to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Poster
# ---------------------------------------------------------------------------
[poster]
# "grid", "circular" or "github".
layout = "grid"

# Title text. Defaults to "MY TRACKS" in the poster language.
# title = "MY TRACKS"

athlete = "John Doe"

# "en" or "zh_CN".
language = "en"

# "metric" or "imperial". Only affects labels.
units = "metric"

# "title" reserves a title band (and a statistics footer on grid posters),
# "plain" draws tracks only. Defaults to plain for circular, title otherwise.
# drawer_type = "title"

# Special tracks at least this long (meters) use colors.special ...
special_distance = 10000.0
# ... and at least this long use colors.special2. Must be larger.
special_distance2 = 20000.0

[poster.canvas]
width = 200.0
height = 300.0

[poster.colors]
background = "#222222"
track = "#4DD2FF"
# track2 = "#FF00AA"      # enables a short-to-long gradient
special = "#FFFF00"
# special2 = "#FF0000"
text = "#FFFFFF"

# ---------------------------------------------------------------------------
# Text roles: size, family and weight are applied when the SVG is written.
# ---------------------------------------------------------------------------
[poster.text.title]
size = 8.0
family = "JetBrainsMono, -apple-system, sans-serif"
weight = 700

[poster.text.year_label]
size = 5.0
family = "JetBrainsMono, -apple-system, sans-serif"
weight = 400

[poster.text.distance_label]
size = 4.0
family = "JetBrainsMono, -apple-system, sans-serif"
weight = 400

[poster.text.legend_label]
size = 3.0
family = "JetBrainsMono, -apple-system, sans-serif"
weight = 400

[poster.text.legend_value]
size = 5.0
family = "JetBrainsMono, -apple-system, sans-serif"
weight = 700

# ---------------------------------------------------------------------------
# Grid layout
# ---------------------------------------------------------------------------
[poster.grid]
header_height = 30.0
title_y = 20.0
footer_height = 30.0
margin = 10.0
padding = 0.1             # fraction of a cell kept empty around each track
stroke_width = 0.5
dot_threshold_m = 5.0     # tracks smaller than this are drawn as a dot

# ---------------------------------------------------------------------------
# Circular layout
# ---------------------------------------------------------------------------
[poster.circular]
per_year = true           # one poster per year
# max_distance = 42195.0  # fixed radius scale; default = longest track
margin = 10.0
stroke_width = 0.3
rings = 4
ring_color = "#444444"

# ---------------------------------------------------------------------------
# Calendar heatmap (github) layout
# ---------------------------------------------------------------------------
[poster.github]
base_height = 35.0        # canvas height = base_height + years * row_height
row_height = 32.0
top_offset = 22.0
title_y = 12.0
margin = 10.0
cell_gap = 0.15
thresholds = [5000.0, 10000.0, 20000.0]
empty_color = "#444444"
"##
}
