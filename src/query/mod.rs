/// Query engine: deterministic, side-effect-free aggregation over a
/// [`FilteredView`](crate::data::filter::FilteredView).
///
/// Every function here is a pure function of (dataset, filter spec): one
/// user interaction triggers one `apply_filter` pass plus whichever
/// aggregates the consumer renders. Mathematically undefined results
/// (empty view, missing year, zero variance) surface as `None`, never as
/// zero, NaN, or a panic.
pub mod cache;
pub mod corr;
pub mod group;
pub mod kpi;
pub mod trend;
