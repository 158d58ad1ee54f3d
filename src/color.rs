//! Hex color parsing and interpolation for gradients and heatmap buckets.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color \"{0}\": expected #RGB or #RRGGBB")]
pub struct ColorError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse `#RGB` or `#RRGGBB` (case-insensitive).
    pub fn parse(input: &str) -> Result<Self, ColorError> {
        let err = || ColorError(input.to_string());
        let hex = input.strip_prefix('#').ok_or_else(err)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| err());
        match hex.len() {
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
                Ok(Self {
                    r: expand(0)?,
                    g: expand(1)?,
                    b: expand(2)?,
                })
            }
            6 => Ok(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            _ => Err(err()),
        }
    }

    /// Linear blend in RGB space; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Blend two hex colors, falling back to `from` verbatim if either fails
/// to parse (config validation rejects bad colors before layouts run).
pub fn interpolate(from: &str, to: &str, t: f64) -> String {
    if from == to {
        return from.to_string();
    }
    match (Rgb::parse(from), Rgb::parse(to)) {
        (Ok(a), Ok(b)) => a.lerp(b, t).to_string(),
        _ => from.to_string(),
    }
}
