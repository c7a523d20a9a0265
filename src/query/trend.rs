use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::filter::FilteredView;
use crate::data::model::{CategoryColumn, GroupKey, MetricColumn};

// ---------------------------------------------------------------------------
// Trend series: metric means per quarter, one series per category
// ---------------------------------------------------------------------------

/// One quarter's aggregate within a series. Points exist only where the
/// group has rows, so the mean is always defined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub quarter: String,
    pub mean: f64,
    pub count: usize,
}

/// One category's chronological line in a trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub label: String,
    pub points: Vec<TrendPoint>,
}

/// Two-key group-by backing the adoption-trend chart: for each value of
/// `column`, the metric's mean per survey quarter in chronological order.
/// Series come back in the category's canonical domain order.
pub fn trend_series(
    view: &FilteredView,
    column: CategoryColumn,
    metric: MetricColumn,
) -> Vec<TrendSeries> {
    // Quarter labels sort lexically as chronologically, so a BTreeMap per
    // series yields the timeline directly.
    let mut groups: BTreeMap<GroupKey, BTreeMap<String, (f64, usize)>> = BTreeMap::new();
    for rec in view.records() {
        let (sum, n) = groups
            .entry(column.group_key(rec))
            .or_default()
            .entry(rec.survey_quarter.clone())
            .or_insert((0.0, 0));
        *sum += metric.value(rec);
        *n += 1;
    }

    groups
        .into_iter()
        .map(|(key, quarters)| TrendSeries {
            label: key.label,
            points: quarters
                .into_iter()
                .map(|(quarter, (sum, n))| TrendPoint {
                    quarter,
                    mean: sum / n as f64,
                    count: n,
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply_filter, FilterSpec};
    use crate::data::model::{Dataset, Region};
    use crate::data::testutil::record;

    #[test]
    fn series_per_region_in_canonical_order_with_chronological_points() {
        let mut q2 = record("U1", Region::Europe, 2023, 44.0);
        q2.survey_quarter = "2023-Q2".to_string();
        let ds = Dataset::from_records(vec![
            record("U1", Region::Europe, 2023, 40.0),
            q2,
            record("U2", Region::Europe, 2023, 50.0),
            record("U3", Region::AsiaPacific, 2023, 60.0),
        ]);
        let view = apply_filter(&ds, &FilterSpec::default());
        let series = trend_series(&view, CategoryColumn::Region, MetricColumn::AiAdoptionRate);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "Europe");
        assert_eq!(series[1].label, "Asia Pacific");

        let europe = &series[0];
        assert_eq!(europe.points.len(), 2);
        assert_eq!(europe.points[0].quarter, "2023-Q1");
        assert_eq!(europe.points[0].mean, 45.0);
        assert_eq!(europe.points[0].count, 2);
        assert_eq!(europe.points[1].quarter, "2023-Q2");
        assert_eq!(europe.points[1].mean, 44.0);
    }

    #[test]
    fn empty_view_yields_no_series() {
        let ds = Dataset::from_records(vec![record("U1", Region::Europe, 2023, 40.0)]);
        let spec = FilterSpec {
            regions: [Region::Africa].into(),
            ..Default::default()
        };
        let view = apply_filter(&ds, &spec);
        assert!(trend_series(&view, CategoryColumn::Region, MetricColumn::AiAdoptionRate)
            .is_empty());
    }
}
