//! Size tokens as printed by the download tool ("512 Bytes", "1.5 GB").
//!
//! All sizes are normalized to kilobytes.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::borrow::Cow;
use thiserror::Error;

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap());

/// Size units the tool prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Bytes,
    Kb,
    Mb,
    Gb,
}

impl SizeUnit {
    /// Parses a unit token ("Bytes", "KB", "MB", "GB"); exact match only.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Bytes" => Some(SizeUnit::Bytes),
            "KB" => Some(SizeUnit::Kb),
            "MB" => Some(SizeUnit::Mb),
            "GB" => Some(SizeUnit::Gb),
            _ => None,
        }
    }

    /// Number of kilobytes in one of this unit.
    pub fn kilobytes(self) -> f64 {
        match self {
            SizeUnit::Bytes => 1.0 / 1024.0,
            SizeUnit::Kb => 1.0,
            SizeUnit::Mb => 1024.0,
            SizeUnit::Gb => 1024.0 * 1024.0,
        }
    }
}

/// Errors from parsing a size token pair.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizeParseError {
    #[error("missing size amount")]
    MissingAmount,

    #[error("missing size unit after {0:?}")]
    MissingUnit(String),

    #[error("invalid size amount: {0:?}")]
    InvalidAmount(String),

    #[error("unknown size unit: {0:?}")]
    UnknownUnit(String),
}

/// Removes ANSI escape sequences (colors, cursor movement) from `text`.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    if text.contains('\x1b') {
        ANSI_ESCAPE.replace_all(text, "")
    } else {
        Cow::Borrowed(text)
    }
}

/// Converts an amount and unit token to kilobytes.
///
/// Fractions of a kilobyte are truncated.
pub fn parse_size(amount: &str, unit: &str) -> Result<u64, SizeParseError> {
    let unit =
        SizeUnit::from_token(unit).ok_or_else(|| SizeParseError::UnknownUnit(unit.to_string()))?;

    let value: f64 = amount
        .parse()
        .map_err(|_| SizeParseError::InvalidAmount(amount.to_string()))?;

    if !value.is_finite() || value < 0.0 {
        return Err(SizeParseError::InvalidAmount(amount.to_string()));
    }

    Ok((value * unit.kilobytes()) as u64)
}

/// Parses an "amount unit" segment, ignoring color codes and anything after
/// the unit.
pub fn parse_size_segment(segment: &str) -> Result<u64, SizeParseError> {
    let clean = strip_ansi(segment);
    let mut tokens = clean.split_whitespace();
    let amount = tokens.next().ok_or(SizeParseError::MissingAmount)?;
    let unit = tokens
        .next()
        .ok_or_else(|| SizeParseError::MissingUnit(amount.to_string()))?;
    parse_size(amount, unit)
}
