use rayon::prelude::*;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

use crate::catalog::{ArtifactStore, DateCatalog};
use crate::date::ReportDate;
use crate::loader::{self, DayReport, IpRecord};
use crate::range::DateRange;

/// Merged totals for one IP under one prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedEntry {
    pub ip: String,
    pub count: u64,
    pub country: String,
    pub netname: String,
    pub description: String,
}

impl From<IpRecord> for AggregatedEntry {
    fn from(record: IpRecord) -> Self {
        Self {
            ip: record.ip,
            count: record.count,
            country: record.country,
            netname: record.netname,
            description: record.description,
        }
    }
}

/// IPs of one prefix in first-seen order.
#[derive(Debug, Default)]
struct PrefixAccumulator {
    entries: Vec<AggregatedEntry>,
    positions: HashMap<String, usize>,
}

impl PrefixAccumulator {
    fn add(&mut self, prefix: &str, record: IpRecord) {
        match self.positions.get(&record.ip) {
            Some(&position) => {
                let entry = &mut self.entries[position];
                entry.count = match entry.count.checked_add(record.count) {
                    Some(total) => total,
                    None => {
                        warn!(action = "accumulate", component = "aggregator", prefix, ip = %entry.ip, "Count saturated at u64::MAX");
                        u64::MAX
                    }
                };
            }
            None => {
                self.positions.insert(record.ip.clone(), self.entries.len());
                self.entries.push(record.into());
            }
        }
    }

    fn into_ranked(self) -> Vec<AggregatedEntry> {
        let mut entries = self.entries;
        // sort_by is stable, so equal counts keep first-seen order
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries
    }
}

/// Two-level fold state: prefixes in first-seen order, each holding its IPs.
///
/// Days must be folded in ascending date order; the first record seen for an
/// IP fixes its country, netname and description.
#[derive(Debug, Default)]
pub struct Accumulator {
    prefixes: Vec<(String, PrefixAccumulator)>,
    positions: HashMap<String, usize>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold_day(&mut self, report: DayReport) {
        for (prefix, records) in report.prefixes {
            if records.is_empty() {
                continue;
            }

            let position = match self.positions.get(&prefix) {
                Some(&position) => position,
                None => {
                    self.positions.insert(prefix.clone(), self.prefixes.len());
                    self.prefixes.push((prefix, PrefixAccumulator::default()));
                    self.prefixes.len() - 1
                }
            };

            let (prefix, accumulator) = &mut self.prefixes[position];
            for record in records {
                accumulator.add(prefix, record);
            }
        }
    }

    pub fn finish(self) -> AggregationResult {
        AggregationResult {
            groups: self
                .prefixes
                .into_iter()
                .map(|(prefix, accumulator)| (prefix, accumulator.into_ranked()))
                .collect(),
        }
    }
}

/// Prefix to ranked entries. Prefixes keep first-seen order; entries are
/// sorted by descending count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationResult {
    groups: Vec<(String, Vec<AggregatedEntry>)>,
}

impl AggregationResult {
    pub fn get(&self, prefix: &str) -> Option<&[AggregatedEntry]> {
        self.groups
            .iter()
            .find(|(name, _)| name == prefix)
            .map(|(_, entries)| entries.as_slice())
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(prefix, _)| prefix.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AggregatedEntry])> {
        self.groups
            .iter()
            .map(|(prefix, entries)| (prefix.as_str(), entries.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Serialize for AggregationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (prefix, entries) in &self.groups {
            map.serialize_entry(prefix, entries)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Loader threads; defaults to the CPU count capped at 8.
    pub workers: Option<usize>,
}

impl AggregateOptions {
    fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| std::cmp::min(num_cpus::get(), 8))
            .max(1)
    }
}

fn load_sequential<S: ArtifactStore + ?Sized>(store: &S, dates: &[ReportDate]) -> Vec<DayReport> {
    dates.iter().map(|date| loader::load_report(store, *date)).collect()
}

/// Loads every date, in parallel when it pays off. The returned reports are
/// always in the same order as `dates`.
fn load_all<S: ArtifactStore + ?Sized>(
    store: &S,
    dates: &[ReportDate],
    workers: usize,
) -> Vec<DayReport> {
    if workers <= 1 || dates.len() <= 1 {
        return load_sequential(store, dates);
    }

    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(|| {
            dates
                .par_iter()
                .map(|date| loader::load_report(store, *date))
                .collect::<Vec<_>>()
        }),
        Err(e) => {
            warn!(action = "configure", component = "aggregator", error = %e, "Thread pool unavailable, loading sequentially");
            load_sequential(store, dates)
        }
    }
}

/// Merges every catalog date inside `range` into ranked per-prefix entries.
pub fn aggregate<S: ArtifactStore + ?Sized>(
    store: &S,
    catalog: &DateCatalog,
    range: &DateRange,
    options: &AggregateOptions,
) -> AggregationResult {
    let start_time = Instant::now();
    let dates = catalog.within(range);
    let workers = options.worker_count();

    info!(
        action = "start",
        component = "aggregator",
        start_date = %range.start(),
        end_date = %range.end(),
        date_count = dates.len(),
        worker_count = workers,
        "Aggregating reports"
    );

    let reports = load_all(store, &dates, workers);
    let load_time = start_time.elapsed();

    let mut accumulator = Accumulator::new();
    for report in reports {
        accumulator.fold_day(report);
    }
    let result = accumulator.finish();

    info!(
        action = "complete",
        component = "aggregator",
        prefix_count = result.len(),
        entry_count = result.iter().map(|(_, entries)| entries.len()).sum::<usize>(),
        load_time_ms = load_time.as_millis(),
        total_time_ms = start_time.elapsed().as_millis(),
        "Aggregation completed"
    );
    result
}
