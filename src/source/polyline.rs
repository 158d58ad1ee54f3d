//! Encoded polyline format (precision 5), as stored in `summary_polyline`.
//!
//! Each coordinate is a zig-zag encoded delta from the previous one, split
//! into 5-bit chunks, each chunk offset by 63 into printable ASCII with bit
//! `0x20` marking continuation.

use thiserror::Error;

const PRECISION: f64 = 1e5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolylineError {
    #[error("invalid character {0:?} at byte {1}")]
    InvalidChar(char, usize),
    #[error("polyline ends in the middle of a value")]
    Truncated,
    #[error("coordinate out of range at byte {0}")]
    Overflow(usize),
}

/// Seven 5-bit chunks cover any precision-5 coordinate delta.
const MAX_SHIFT: u32 = 35;

/// Decode to `(lat, lon)` pairs.
pub fn decode(encoded: &str) -> Result<Vec<(f64, f64)>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut idx = 0;
    let (mut lat, mut lon) = (0i64, 0i64);
    let mut out = Vec::new();

    while idx < bytes.len() {
        let at = idx;
        lat = lat
            .checked_add(next_value(bytes, &mut idx)?)
            .ok_or(PolylineError::Overflow(at))?;
        if idx >= bytes.len() {
            return Err(PolylineError::Truncated);
        }
        let at = idx;
        lon = lon
            .checked_add(next_value(bytes, &mut idx)?)
            .ok_or(PolylineError::Overflow(at))?;
        out.push((lat as f64 / PRECISION, lon as f64 / PRECISION));
    }
    Ok(out)
}

fn next_value(bytes: &[u8], idx: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0;
    loop {
        let Some(&byte) = bytes.get(*idx) else {
            return Err(PolylineError::Truncated);
        };
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidChar(byte as char, *idx));
        }
        if shift >= MAX_SHIFT {
            return Err(PolylineError::Overflow(*idx));
        }
        *idx += 1;
        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }
    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

/// Encode `(lat, lon)` pairs.
pub fn encode(points: &[(f64, f64)]) -> String {
    let mut out = String::new();
    let (mut prev_lat, mut prev_lon) = (0i64, 0i64);
    for &(lat, lon) in points {
        let lat = (lat * PRECISION).round() as i64;
        let lon = (lon * PRECISION).round() as i64;
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lon - prev_lon);
        prev_lat = lat;
        prev_lon = lon;
    }
    out
}

fn push_value(out: &mut String, value: i64) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= 0x20 {
        out.push((((v & 0x1f) | 0x20) as u8 + 63) as char);
        v >>= 5;
    }
    out.push((v as u8 + 63) as char);
}
