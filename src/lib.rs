//! edulens – filter-and-aggregate query core for the GenAI higher-education
//! adoption dashboard.
//!
//! The crate owns the validated in-memory survey panel and answers the
//! queries a presentation shell needs: apply a declarative filter, compute
//! KPI cards, break a metric down by category, correlate metrics, or build
//! per-quarter trend lines. It renders nothing and exposes no HTTP or CLI
//! surface; consumers load once and query per interaction.
//!
//! ```no_run
//! use std::collections::BTreeSet;
//! use std::path::Path;
//!
//! use edulens::{apply_filter, compute_kpis, load_file, FilterSpec, Region};
//!
//! # fn main() -> Result<(), edulens::DataLoadError> {
//! let dataset = load_file(Path::new("data/dataset.csv"))?;
//! let spec = FilterSpec {
//!     regions: BTreeSet::from([Region::Europe]),
//!     ..Default::default()
//! };
//! let view = apply_filter(&dataset, &spec);
//! let kpis = compute_kpis(&view);
//! println!("{} institutions", kpis.total_institutions);
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod export;
pub mod query;

pub use data::filter::{apply_filter, matching_indices, FilterSpec, FilteredView};
pub use data::loader::{load_file, DataLoadError, DatasetCache};
pub use data::model::{
    CategoryColumn, Dataset, FundingType, InstitutionRecord, InstitutionType, MetricColumn,
    PolicyStance, Region, SizeBucket,
};
pub use export::{format_number, write_kpis_csv, write_view_csv, NumberFormat};
pub use query::cache::QueryCache;
pub use query::corr::{correlation_matrix, CorrelationMatrix};
pub use query::group::{group_aggregate, Aggregator, GroupRow, GroupSort};
pub use query::kpi::{compute_kpis, KpiSet, HIGH_ADOPTION_THRESHOLD};
pub use query::trend::{trend_series, TrendPoint, TrendSeries};
