//! Rating records and their string form.
//!
//! A record is stored and transported as either `"<score> - <count>"` or the
//! literal `"N/A"`. Scores keep one fractional digit and are held in tenths
//! so the string form round-trips exactly.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const UNAVAILABLE: &str = "N/A";
const SEPARATOR: &str = " - ";

/// A resolved quality score with its review count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rating {
    tenths: u32,
    review_count: u32,
}

impl Rating {
    /// Round `score` to one decimal place. Negative or non-finite scores clamp to zero.
    ///
    /// Rounding works on the exact decimal value of the double, halves going
    /// up, so `1.45` (stored as `1.4499…`) gives `1.4` and `2.25` gives `2.3`.
    pub fn new(score: f64, review_count: u32) -> Self {
        let tenths = if score.is_finite() && score > 0.0 {
            round_tenths(score)
        } else {
            0
        };
        Self {
            tenths,
            review_count,
        }
    }

    pub fn score(&self) -> f64 {
        f64::from(self.tenths) / 10.0
    }

    pub fn review_count(&self) -> u32 {
        self.review_count
    }

    /// The score as shown to users, e.g. `"4.2"`.
    pub fn score_text(&self) -> String {
        format!("{}.{}", self.tenths / 10, self.tenths % 10)
    }
}

/// Tenths of a positive finite `score`, read off its exact decimal expansion.
fn round_tenths(score: f64) -> u32 {
    // Twenty fractional digits are enough for the hundredths digit to be exact.
    let exact = format!("{:.20}", score);
    let (whole, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut digits = fraction.bytes().map(|b| u32::from(b - b'0'));
    let tenth = digits.next().unwrap_or(0);
    let round_up = digits.next().unwrap_or(0) >= 5;
    whole
        .parse::<u32>()
        .unwrap_or(u32::MAX / 10)
        .saturating_mul(10)
        .saturating_add(tenth + u32::from(round_up))
}

/// What the cache holds for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingRecord {
    Resolved(Rating),
    Unavailable,
}

impl fmt::Display for RatingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingRecord::Resolved(rating) => {
                write!(f, "{}{}{}", rating.score_text(), SEPARATOR, rating.review_count)
            }
            RatingRecord::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingParseError {
    Empty,
    MissingSeparator(String),
    InvalidScore(String),
    InvalidCount(String),
}

impl fmt::Display for RatingParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingParseError::Empty => write!(f, "Rating string is empty"),
            RatingParseError::MissingSeparator(s) => {
                write!(f, "Rating '{}' is not of the form '<score> - <count>'", s)
            }
            RatingParseError::InvalidScore(s) => write!(f, "Invalid score: '{}'", s),
            RatingParseError::InvalidCount(s) => write!(f, "Invalid review count: '{}'", s),
        }
    }
}

impl std::error::Error for RatingParseError {}

impl FromStr for RatingRecord {
    type Err = RatingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(RatingParseError::Empty);
        }
        if trimmed == UNAVAILABLE {
            return Ok(RatingRecord::Unavailable);
        }

        let (score, count) = trimmed
            .split_once(SEPARATOR)
            .ok_or_else(|| RatingParseError::MissingSeparator(trimmed.to_string()))?;
        let score: f64 = score
            .trim()
            .parse()
            .map_err(|_| RatingParseError::InvalidScore(score.to_string()))?;
        if !score.is_finite() || score < 0.0 {
            return Err(RatingParseError::InvalidScore(score.to_string()));
        }
        let count: u32 = count
            .trim()
            .parse()
            .map_err(|_| RatingParseError::InvalidCount(count.to_string()))?;

        Ok(RatingRecord::Resolved(Rating::new(score, count)))
    }
}

impl Serialize for RatingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RatingRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Outcome of asking the resolver about one name.
///
/// `Deferred` means no answer could be obtained right now; unlike
/// `Unavailable` it must not be cached or rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Rating),
    Unavailable,
    Deferred,
}

impl Resolution {
    /// Interpret a transport response. Empty, absent or unparsable answers are deferred.
    pub fn from_response(response: Option<&str>) -> Self {
        let Some(body) = response.map(str::trim).filter(|s| !s.is_empty()) else {
            return Resolution::Deferred;
        };
        match body.parse::<RatingRecord>() {
            Ok(record) => record.into(),
            Err(e) => {
                log::warn!("Discarding unparsable rating response: {}", e);
                Resolution::Deferred
            }
        }
    }

    /// The record to cache and render, if this outcome is final.
    pub fn record(&self) -> Option<RatingRecord> {
        match self {
            Resolution::Resolved(rating) => Some(RatingRecord::Resolved(*rating)),
            Resolution::Unavailable => Some(RatingRecord::Unavailable),
            Resolution::Deferred => None,
        }
    }
}

impl From<RatingRecord> for Resolution {
    fn from(record: RatingRecord) -> Self {
        match record {
            RatingRecord::Resolved(rating) => Resolution::Resolved(rating),
            RatingRecord::Unavailable => Resolution::Unavailable,
        }
    }
}
