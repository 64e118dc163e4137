use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A report day, parsed from the strict `YYYY-MM-DD` form only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReportDate(NaiveDate);

impl ReportDate {
    /// Parses `YYYY-MM-DD` with exactly 4-2-2 ASCII digits and a real calendar day.
    pub fn parse(raw: &str) -> Option<Self> {
        let bytes = raw.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return None;
        }
        let digits_ok = bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !digits_ok {
            return None;
        }

        // chrono rejects days the month doesn't have
        NaiveDate::parse_from_str(raw, DATE_FORMAT).ok().map(Self)
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for ReportDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for ReportDate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| anyhow::anyhow!("Invalid report date '{}', expected YYYY-MM-DD", s))
    }
}

impl fmt::Display for ReportDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl Serialize for ReportDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
