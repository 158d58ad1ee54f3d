//! Year filter expressions: `all`, `2023`, `2020-2023`.

use crate::track::Track;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum YearRangeError {
    #[error("bad year range \"{0}\": expected \"all\", \"YYYY\" or \"YYYY-YYYY\"")]
    Malformed(String),
    #[error("bad year range \"{0}\": {1} is after {2}")]
    Reversed(String, i32, i32),
}

/// An inclusive year filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearRange {
    #[default]
    All,
    Span {
        from: i32,
        to: i32,
    },
}

impl YearRange {
    pub fn parse(input: &str) -> Result<Self, YearRangeError> {
        let input = input.trim();
        if input == "all" {
            return Ok(Self::All);
        }
        let malformed = || YearRangeError::Malformed(input.to_string());
        match input.split_once('-') {
            None => {
                let year = parse_year(input).ok_or_else(malformed)?;
                Ok(Self::Span {
                    from: year,
                    to: year,
                })
            }
            Some((from, to)) => {
                let from = parse_year(from).ok_or_else(malformed)?;
                let to = parse_year(to).ok_or_else(malformed)?;
                if from > to {
                    return Err(YearRangeError::Reversed(input.to_string(), from, to));
                }
                Ok(Self::Span { from, to })
            }
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        match *self {
            Self::All => true,
            Self::Span { from, to } => (from..=to).contains(&year),
        }
    }
}

/// Four ASCII digits, nothing else.
fn parse_year(s: &str) -> Option<i32> {
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

impl FromStr for YearRange {
    type Err = YearRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::All => write!(f, "all"),
            Self::Span { from, to } if from == to => write!(f, "{from}"),
            Self::Span { from, to } => write!(f, "{from}-{to}"),
        }
    }
}

/// Every distinct start year among `tracks`, ascending.
pub fn all_years_present(tracks: &[Track]) -> BTreeSet<i32> {
    tracks.iter().map(Track::year).collect()
}

/// Every year from the first track's year to the last track's year,
/// including years without activity. Empty when `tracks` is empty.
pub fn calendar_span(tracks: &[Track]) -> Vec<i32> {
    let years = all_years_present(tracks);
    match (years.first(), years.last()) {
        (Some(&first), Some(&last)) => (first..=last).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{at, summary_track};

    #[test]
    fn all_contains_everything() {
        let range = YearRange::parse("all").unwrap();
        assert!(range.contains(1900));
        assert!(range.contains(2999));
    }

    #[test]
    fn single_year() {
        let range = YearRange::parse("2023").unwrap();
        assert_eq!(range, YearRange::Span { from: 2023, to: 2023 });
        assert!(range.contains(2023));
        assert!(!range.contains(2022));
        assert!(!range.contains(2024));
    }

    #[test]
    fn inclusive_span() {
        let range = YearRange::parse("2020-2022").unwrap();
        assert!(range.contains(2020));
        assert!(range.contains(2021));
        assert!(range.contains(2022));
        assert!(!range.contains(2019));
        assert!(!range.contains(2023));
    }

    #[test]
    fn reversed_span_fails() {
        assert_eq!(
            YearRange::parse("2020-2019"),
            Err(YearRangeError::Reversed("2020-2019".into(), 2020, 2019))
        );
    }

    #[test]
    fn malformed_specs_fail() {
        for input in [
            "",
            "20",
            "twenty",
            "2020-",
            "-2020",
            "2020-2021-2022",
            "All",
            "2020 - 2021",
        ] {
            assert!(
                matches!(YearRange::parse(input), Err(YearRangeError::Malformed(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        for input in ["all", "2021", "2019-2021"] {
            assert_eq!(YearRange::parse(input).unwrap().to_string(), input);
        }
    }

    #[test]
    fn years_present_are_distinct_and_sorted() {
        let tracks = vec![
            summary_track("c", at(2024, 3, 1, 8), 1_000.0),
            summary_track("a", at(2021, 3, 1, 8), 1_000.0),
            summary_track("b", at(2024, 7, 1, 8), 1_000.0),
        ];
        let years: Vec<i32> = all_years_present(&tracks).into_iter().collect();
        assert_eq!(years, vec![2021, 2024]);
    }

    #[test]
    fn calendar_span_fills_gaps() {
        let tracks = vec![
            summary_track("a", at(2021, 3, 1, 8), 1_000.0),
            summary_track("b", at(2023, 7, 1, 8), 1_000.0),
        ];
        assert_eq!(calendar_span(&tracks), vec![2021, 2022, 2023]);
        assert!(calendar_span(&[]).is_empty());
    }
}
