use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::filter::FilteredView;
use crate::data::model::{CategoryColumn, GroupKey, MetricColumn};

// ---------------------------------------------------------------------------
// Aggregators and ordering
// ---------------------------------------------------------------------------

/// Per-group reduction applied by [`group_aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Aggregator {
    /// Arithmetic mean of the metric over the group's rows.
    Mean,
    /// Row count; the metric argument is ignored.
    Count,
    /// Sample standard deviation (n−1 denominator); `None` below 2 rows.
    Stddev,
}

/// Row ordering for ranked displays. Value sorts are stable over the
/// canonical ordering, so equal values keep their domain order — repeated
/// calls and reimplementations produce identical chart orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupSort {
    /// Canonical domain order (declaration order for closed domains,
    /// lexical for open ones).
    Canonical,
    ValueAscending,
    ValueDescending,
}

/// One group's aggregate: display label, reduced value, row count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub label: String,
    pub value: Option<f64>,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// group_aggregate
// ---------------------------------------------------------------------------

/// Group the view's rows by a categorical column and reduce a metric per
/// group. Only observed groups appear; an empty view yields no rows.
pub fn group_aggregate(
    view: &FilteredView,
    column: CategoryColumn,
    metric: MetricColumn,
    aggregator: Aggregator,
    sort: GroupSort,
) -> Vec<GroupRow> {
    // BTreeMap keyed by GroupKey materializes groups in canonical order.
    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    for rec in view.records() {
        groups
            .entry(column.group_key(rec))
            .or_default()
            .push(metric.value(rec));
    }

    let mut rows: Vec<GroupRow> = groups
        .into_iter()
        .map(|(key, values)| GroupRow {
            label: key.label,
            value: reduce(aggregator, &values),
            count: values.len(),
        })
        .collect();

    match sort {
        GroupSort::Canonical => {}
        GroupSort::ValueAscending => rows.sort_by(|a, b| cmp_values(a.value, b.value, false)),
        GroupSort::ValueDescending => rows.sort_by(|a, b| cmp_values(a.value, b.value, true)),
    }
    rows
}

fn reduce(aggregator: Aggregator, values: &[f64]) -> Option<f64> {
    let n = values.len();
    match aggregator {
        Aggregator::Count => Some(n as f64),
        Aggregator::Mean => {
            if n == 0 {
                None
            } else {
                Some(values.iter().sum::<f64>() / n as f64)
            }
        }
        Aggregator::Stddev => {
            if n < 2 {
                return None;
            }
            let mean = values.iter().sum::<f64>() / n as f64;
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            Some((ss / (n - 1) as f64).sqrt())
        }
    }
}

/// Defined values order by `total_cmp`; undefined values sink to the end
/// regardless of direction; equal values compare Equal so the stable sort
/// keeps canonical order.
fn cmp_values(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            if descending {
                b.total_cmp(&a)
            } else {
                a.total_cmp(&b)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
