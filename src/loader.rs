use anyhow::{Context, Result};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

use crate::catalog::ArtifactStore;
use crate::date::ReportDate;

/// One IP row as stored in a day's artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRecord {
    pub ip: String,
    pub count: u64,
    pub country: String,
    pub netname: String,
    pub description: String,
}

/// A parsed artifact: prefix groups in the order the file lists them.
///
/// A prefix repeated within one file keeps its first position and takes the
/// records of its last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayReport {
    pub prefixes: Vec<(String, Vec<IpRecord>)>,
}

impl DayReport {
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.prefixes.iter().map(|(_, records)| records.len()).sum()
    }
}

impl<'de> Deserialize<'de> for DayReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DayReportVisitor;

        impl<'de> Visitor<'de> for DayReportVisitor {
            type Value = DayReport;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of prefix to a list of IP records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<DayReport, A::Error> {
                let mut prefixes: Vec<(String, Vec<IpRecord>)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((prefix, records)) = map.next_entry::<String, Vec<IpRecord>>()? {
                    match prefixes.iter_mut().find(|(seen, _)| *seen == prefix) {
                        Some((_, existing)) => *existing = records,
                        None => prefixes.push((prefix, records)),
                    }
                }
                Ok(DayReport { prefixes })
            }
        }

        deserializer.deserialize_map(DayReportVisitor)
    }
}

/// Strict parse of artifact bytes. Any shape deviation is an error.
pub fn parse_report(bytes: &[u8]) -> Result<DayReport> {
    serde_json::from_slice(bytes).context("Artifact is not a prefix -> IP record map")
}

/// Loads one day. Missing, unreadable or malformed artifacts yield an empty
/// report so the rest of the range still counts.
pub fn load_report<S: ArtifactStore + ?Sized>(store: &S, date: ReportDate) -> DayReport {
    let start_time = Instant::now();

    let bytes = match store.read(date) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            debug!(action = "load", component = "report_loader", date = %date, "No artifact for date");
            return DayReport::default();
        }
        Err(e) => {
            warn!(action = "load", component = "report_loader", date = %date, error = %format!("{:#}", e), "Artifact unreadable, skipping date");
            return DayReport::default();
        }
    };

    match parse_report(&bytes) {
        Ok(report) => {
            debug!(
                action = "loaded",
                component = "report_loader",
                date = %date,
                prefix_count = report.prefixes.len(),
                record_count = report.record_count(),
                duration_ms = start_time.elapsed().as_millis(),
                "Artifact loaded"
            );
            report
        }
        Err(e) => {
            warn!(action = "parse", component = "report_loader", date = %date, error = %format!("{:#}", e), "Malformed artifact, skipping date");
            DayReport::default()
        }
    }
}
