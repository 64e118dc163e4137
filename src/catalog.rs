use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::date::ReportDate;
use crate::range::DateRange;

const ARTIFACT_EXTENSION: &str = "json";

fn artifact_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9]{4}-[0-9]{2}-[0-9]{2})\.json$").expect("artifact name pattern compiles")
    })
}

/// Where per-day report artifacts live.
///
/// `list` yields raw artifact names; `read` yields the bytes stored for one
/// date, or `None` when that date has no artifact.
pub trait ArtifactStore: Sync {
    fn list(&self) -> Result<Vec<String>>;

    fn read(&self, date: ReportDate) -> Result<Option<Vec<u8>>>;
}

pub fn artifact_name(date: ReportDate) -> String {
    format!("{}.{}", date, ARTIFACT_EXTENSION)
}

/// Artifacts stored as `<dir>/YYYY-MM-DD.json`.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactStore for DirStore {
    fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("Failed to list data directory {:?}", self.root))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to read entry in {:?}", self.root))?;
            // Non UTF-8 names can never match the artifact pattern
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn read(&self, date: ReportDate) -> Result<Option<Vec<u8>>> {
        let path = self.root.join(artifact_name(date));
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read artifact {:?}", path)),
        }
    }
}

/// In-memory artifacts keyed by name, for fixtures.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    artifacts: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.artifacts.insert(name.into(), bytes.into());
    }

    /// Stores `bytes` under the artifact name for `date` (`YYYY-MM-DD.json`).
    pub fn with_report(mut self, date: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(format!("{}.{}", date, ARTIFACT_EXTENSION), bytes);
        self
    }
}

impl ArtifactStore for MemoryStore {
    fn list(&self) -> Result<Vec<String>> {
        Ok(self.artifacts.keys().cloned().collect())
    }

    fn read(&self, date: ReportDate) -> Result<Option<Vec<u8>>> {
        Ok(self.artifacts.get(&artifact_name(date)).cloned())
    }
}

/// Ascending, distinct dates that have an artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateCatalog {
    dates: Vec<ReportDate>,
}

impl DateCatalog {
    /// Scans the store. An unreadable store gives an empty catalog.
    pub fn build<S: ArtifactStore + ?Sized>(store: &S) -> Self {
        let start_time = Instant::now();
        info!(action = "start", component = "date_catalog", "Scanning artifact store");

        let names = match store.list() {
            Ok(names) => names,
            Err(e) => {
                warn!(action = "list", component = "date_catalog", error = %format!("{:#}", e), "Artifact store unavailable, no dates");
                return Self::default();
            }
        };

        let catalog = Self::from_names(names.iter().map(String::as_str));

        info!(
            action = "complete",
            component = "date_catalog",
            artifact_count = names.len(),
            date_count = catalog.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Date catalog built"
        );
        catalog
    }

    /// Keeps names of the form `YYYY-MM-DD.json` that carry a real calendar date.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let pattern = artifact_name_pattern();
        let mut dates: Vec<ReportDate> = names
            .into_iter()
            .filter_map(|name| {
                let captures = pattern.captures(name)?;
                let date = ReportDate::parse(captures.get(1)?.as_str());
                if date.is_none() {
                    debug!(action = "filter", component = "date_catalog", artifact = name, "Skipping artifact with impossible date");
                }
                date
            })
            .collect();

        dates.sort();
        dates.dedup();
        Self { dates }
    }

    pub fn dates(&self) -> &[ReportDate] {
        &self.dates
    }

    pub fn first(&self) -> Option<ReportDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<ReportDate> {
        self.dates.last().copied()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Catalog dates inside `range`, both ends inclusive, ascending.
    pub fn within(&self, range: &DateRange) -> Vec<ReportDate> {
        self.dates
            .iter()
            .copied()
            .filter(|date| range.contains(*date))
            .collect()
    }
}
