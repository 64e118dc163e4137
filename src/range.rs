use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::DateCatalog;
use crate::date::ReportDate;

/// Inclusive date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: ReportDate,
    end: ReportDate,
}

impl DateRange {
    /// Builds a range, swapping the endpoints if they arrive inverted.
    pub fn new(start: ReportDate, end: ReportDate) -> Self {
        if start > end {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    pub fn start(&self) -> ReportDate {
        self.start
    }

    pub fn end(&self) -> ReportDate {
        self.end
    }

    pub fn contains(&self, date: ReportDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn validate_raw(raw: Option<&str>, field: &'static str) -> Option<ReportDate> {
    let raw = raw?;
    let parsed = ReportDate::parse(raw);
    if parsed.is_none() && !raw.is_empty() {
        debug!(action = "validate", component = "range_resolver", field, raw, "Ignoring invalid date input");
    }
    parsed
}

/// Picks the effective range from optional raw input, falling back to the
/// catalog bounds. `None` means there is nothing to aggregate.
///
/// Raw dates need not exist in the catalog; they only have to be real days.
pub fn resolve(
    raw_start: Option<&str>,
    raw_end: Option<&str>,
    catalog: &DateCatalog,
) -> Option<DateRange> {
    let start = validate_raw(raw_start, "start_date").or_else(|| catalog.first());
    let end = validate_raw(raw_end, "end_date").or_else(|| catalog.last());

    match (start, end) {
        (Some(start), Some(end)) => {
            let range = DateRange::new(start, end);
            info!(
                action = "resolve",
                component = "range_resolver",
                start_date = %range.start,
                end_date = %range.end,
                swapped = start > end,
                "Date range resolved"
            );
            Some(range)
        }
        _ => {
            info!(action = "resolve", component = "range_resolver", "No date range available");
            None
        }
    }
}
