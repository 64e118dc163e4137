pub mod aggregate;
pub mod args;
pub mod catalog;
pub mod date;
pub mod loader;
pub mod range;
pub mod render;
pub mod report;
pub mod utils;

pub use aggregate::{aggregate, AggregateOptions, AggregatedEntry, AggregationResult};
pub use args::Args;
pub use catalog::{ArtifactStore, DateCatalog, DirStore, MemoryStore};
pub use date::ReportDate;
pub use loader::{load_report, parse_report, DayReport, IpRecord};
pub use range::{resolve, DateRange};
pub use report::{build_view, ReportView};
