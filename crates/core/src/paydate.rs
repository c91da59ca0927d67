//! Fixed-width ledger dates.
//!
//! The external ledger reports every date as an 8-digit `YYYYMMDD` string.
//! Because the format is zero-padded, lexicographic and numeric ordering
//! agree, so comparisons on the packed numeric form are valid.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::Date;

/// A calendar date in the ledger's fixed 8-digit `YYYYMMDD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PayDate(u32);

impl PayDate {
    /// Parse an 8-digit `YYYYMMDD` string.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidPayDate(s.to_string()));
        }
        let packed: u32 = s
            .parse()
            .map_err(|_| Error::InvalidPayDate(s.to_string()))?;
        let month = (packed / 100) % 100;
        let day = packed % 100;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(Error::InvalidPayDate(s.to_string()));
        }
        Ok(Self(packed))
    }

    /// Convert from a calendar date.
    pub fn from_date(date: Date) -> Self {
        let year = date.year() as u32;
        let month = u8::from(date.month()) as u32;
        let day = date.day() as u32;
        Self(year * 10_000 + month * 100 + day)
    }

    /// Year component.
    pub fn year(&self) -> u32 {
        self.0 / 10_000
    }

    /// Month component (1-12).
    pub fn month(&self) -> u32 {
        (self.0 / 100) % 100
    }

    /// Day component (1-31).
    pub fn day(&self) -> u32 {
        self.0 % 100
    }
}

impl fmt::Display for PayDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

impl TryFrom<String> for PayDate {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PayDate> for String {
    fn from(value: PayDate) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parse_valid_date() {
        let d = PayDate::parse("20251011").unwrap();
        assert_eq!(d.year(), 2025);
        assert_eq!(d.month(), 10);
        assert_eq!(d.day(), 11);
        assert_eq!(d.to_string(), "20251011");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(PayDate::parse("2025101").is_err());
        assert!(PayDate::parse("20251301").is_err());
        assert!(PayDate::parse("20251032").is_err());
        assert!(PayDate::parse("2025101a").is_err());
        assert!(PayDate::parse("").is_err());
    }

    #[test]
    fn ordering_matches_calendar() {
        let earlier = PayDate::parse("20250930").unwrap();
        let later = PayDate::parse("20251001").unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn from_date_round_trips() {
        let d = PayDate::from_date(date!(2025 - 01 - 05));
        assert_eq!(d.to_string(), "20250105");
    }

    #[test]
    fn serde_uses_fixed_width_string() {
        let d = PayDate::parse("20250105").unwrap();
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"20250105\"");
        let back: PayDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
