use serde::Serialize;
use std::time::Instant;
use tracing::info;

use crate::aggregate::{self, AggregateOptions, AggregationResult};
use crate::catalog::{ArtifactStore, DateCatalog};
use crate::date::ReportDate;
use crate::range;

/// Everything a front end needs to draw one request.
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub dates: Vec<ReportDate>,
    pub start_date: Option<ReportDate>,
    pub end_date: Option<ReportDate>,
    /// `None` when no range could be resolved, as opposed to a range with no data.
    pub results: Option<AggregationResult>,
}

/// One full pass: catalog, range resolution, aggregation.
pub fn build_view<S: ArtifactStore + ?Sized>(
    store: &S,
    raw_start: Option<&str>,
    raw_end: Option<&str>,
    options: &AggregateOptions,
) -> ReportView {
    let start_time = Instant::now();

    let catalog = DateCatalog::build(store);
    let range = range::resolve(raw_start, raw_end, &catalog);
    let results = range.map(|range| aggregate::aggregate(store, &catalog, &range, options));

    info!(
        action = "complete",
        component = "report_view",
        has_results = results.is_some(),
        duration_ms = start_time.elapsed().as_millis(),
        "Report view built"
    );

    ReportView {
        dates: catalog.dates().to_vec(),
        start_date: range.map(|r| r.start()),
        end_date: range.map(|r| r.end()),
        results,
    }
}
