use std::collections::BTreeSet;

use serde::Serialize;

use crate::data::filter::FilteredView;
use crate::data::model::{MetricColumn, PolicyStance};

/// Adoption rate at or above this counts as "high adoption".
pub const HIGH_ADOPTION_THRESHOLD: f64 = 45.0;

// ---------------------------------------------------------------------------
// KpiSet
// ---------------------------------------------------------------------------

/// The scalar summaries shown as metric cards, computed over one filtered
/// view. Counts are always defined; every mean, percentage, and delta is
/// `None` when its underlying set is empty. `None` is the no-data
/// sentinel: a computed 0.0 (e.g. a flat year-over-year delta) stays
/// `Some(0.0)` and the two are never conflated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSet {
    /// Distinct `institution_id` count.
    pub total_institutions: usize,
    /// Distinct `country` count.
    pub total_countries: usize,
    pub avg_adoption_rate: Option<f64>,
    pub avg_literacy_index: Option<f64>,
    pub avg_incident_rate: Option<f64>,
    pub avg_outcome_delta: Option<f64>,
    pub avg_satisfaction: Option<f64>,
    pub avg_training_hours: Option<f64>,
    pub avg_policy_maturity: Option<f64>,
    pub avg_infrastructure_readiness: Option<f64>,
    /// Percent of rows with an Integrated policy stance.
    pub integrated_policy_pct: Option<f64>,
    /// Percent of rows at or above [`HIGH_ADOPTION_THRESHOLD`].
    pub high_adoption_pct: Option<f64>,
    pub adoption_yoy_delta: Option<f64>,
    pub literacy_yoy_delta: Option<f64>,
    pub incident_yoy_delta: Option<f64>,
}

impl KpiSet {
    /// Flat (name, value) rows for tabular export. Counts surface as
    /// defined floats so one row shape covers the whole set.
    pub fn rows(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("total_institutions", Some(self.total_institutions as f64)),
            ("total_countries", Some(self.total_countries as f64)),
            ("avg_adoption_rate", self.avg_adoption_rate),
            ("avg_literacy_index", self.avg_literacy_index),
            ("avg_incident_rate", self.avg_incident_rate),
            ("avg_outcome_delta", self.avg_outcome_delta),
            ("avg_satisfaction", self.avg_satisfaction),
            ("avg_training_hours", self.avg_training_hours),
            ("avg_policy_maturity", self.avg_policy_maturity),
            (
                "avg_infrastructure_readiness",
                self.avg_infrastructure_readiness,
            ),
            ("integrated_policy_pct", self.integrated_policy_pct),
            ("high_adoption_pct", self.high_adoption_pct),
            ("adoption_yoy_delta", self.adoption_yoy_delta),
            ("literacy_yoy_delta", self.literacy_yoy_delta),
            ("incident_yoy_delta", self.incident_yoy_delta),
        ]
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute the full KPI set over a view. Rows weight equally: means are
/// over institution-quarter observations, not de-duplicated institutions.
pub fn compute_kpis(view: &FilteredView) -> KpiSet {
    let mut institutions = BTreeSet::new();
    let mut countries = BTreeSet::new();
    for rec in view.records() {
        institutions.insert(rec.institution_id.as_str());
        countries.insert(rec.country.as_str());
    }

    KpiSet {
        total_institutions: institutions.len(),
        total_countries: countries.len(),
        avg_adoption_rate: metric_mean(view, MetricColumn::AiAdoptionRate),
        avg_literacy_index: metric_mean(view, MetricColumn::StudentAiLiteracyIndex),
        avg_incident_rate: metric_mean(view, MetricColumn::IntegrityIncidentRate),
        avg_outcome_delta: metric_mean(view, MetricColumn::LearningOutcomeDelta),
        avg_satisfaction: metric_mean(view, MetricColumn::StudentSatisfactionScore),
        avg_training_hours: metric_mean(view, MetricColumn::FacultyTrainingHours),
        avg_policy_maturity: metric_mean(view, MetricColumn::PolicyMaturityScore),
        avg_infrastructure_readiness: metric_mean(view, MetricColumn::InfrastructureReadiness),
        integrated_policy_pct: predicate_pct(view, |rec| {
            rec.policy_stance == PolicyStance::Integrated
        }),
        high_adoption_pct: predicate_pct(view, |rec| {
            rec.ai_adoption_rate >= HIGH_ADOPTION_THRESHOLD
        }),
        adoption_yoy_delta: yoy_delta(view, MetricColumn::AiAdoptionRate),
        literacy_yoy_delta: yoy_delta(view, MetricColumn::StudentAiLiteracyIndex),
        incident_yoy_delta: yoy_delta(view, MetricColumn::IntegrityIncidentRate),
    }
}

/// Mean of a metric over the view, `None` on zero rows.
pub fn metric_mean(view: &FilteredView, metric: MetricColumn) -> Option<f64> {
    mean(view.records().map(|rec| metric.value(rec)))
}

/// Fraction of rows satisfying `pred`, ×100. `None` on zero rows.
fn predicate_pct(
    view: &FilteredView,
    pred: impl Fn(&crate::data::model::InstitutionRecord) -> bool,
) -> Option<f64> {
    let total = view.len();
    if total == 0 {
        return None;
    }
    let hits = view.records().filter(|&rec| pred(rec)).count();
    Some(hits as f64 / total as f64 * 100.0)
}

/// Year-over-year delta: the metric's mean in the latest observed year
/// minus its mean in the previous observed year, `None` unless the view
/// contains rows for at least two years. On a two-year panel this is
/// exactly latest-minus-prior; with more years it tracks the frontier.
pub fn yoy_delta(view: &FilteredView, metric: MetricColumn) -> Option<f64> {
    let years: BTreeSet<i32> = view.records().map(|rec| rec.year).collect();
    let mut years = years.into_iter().rev();
    let latest = years.next()?;
    let previous = years.next()?;

    let year_mean = |year: i32| {
        mean(
            view.records()
                .filter(|rec| rec.year == year)
                .map(|rec| metric.value(rec)),
        )
    };
    // Both subsets are non-empty by construction (years were observed).
    Some(year_mean(latest)? - year_mean(previous)?)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        sum += v;
        n += 1;
    }
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}
