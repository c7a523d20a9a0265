use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{
    Dataset, FundingType, InstitutionRecord, InstitutionType, PolicyStance, Region, SizeBucket,
};

// ---------------------------------------------------------------------------
// Filter specification: per-dimension inclusion sets
// ---------------------------------------------------------------------------

/// Declarative per-dimension inclusion constraints.
///
/// An empty set means *no restriction on that dimension*, never "match
/// nothing". Dimensions compose by intersection: a record must satisfy every
/// non-empty set independently (so regions and countries never override one
/// another). Values that exist in no record simply match nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub regions: BTreeSet<Region>,
    pub countries: BTreeSet<String>,
    pub institution_types: BTreeSet<InstitutionType>,
    pub institution_sizes: BTreeSet<SizeBucket>,
    pub funding_types: BTreeSet<FundingType>,
    pub policy_stances: BTreeSet<PolicyStance>,
    pub quarters: BTreeSet<String>,
    pub disciplines: BTreeSet<String>,
}

impl FilterSpec {
    /// Whether every dimension is unrestricted.
    pub fn is_unrestricted(&self) -> bool {
        self.regions.is_empty()
            && self.countries.is_empty()
            && self.institution_types.is_empty()
            && self.institution_sizes.is_empty()
            && self.funding_types.is_empty()
            && self.policy_stances.is_empty()
            && self.quarters.is_empty()
            && self.disciplines.is_empty()
    }

    /// Canonical serialization, used as the query-cache key. The `BTreeSet`
    /// fields make the output independent of insertion order.
    pub fn canonical_key(&self) -> String {
        // Serializing a plain struct of sets and strings cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    fn matches(&self, rec: &InstitutionRecord) -> bool {
        fn pass<T: Ord>(selected: &BTreeSet<T>, value: &T) -> bool {
            selected.is_empty() || selected.contains(value)
        }
        pass(&self.regions, &rec.region)
            && pass(&self.countries, &rec.country)
            && pass(&self.institution_types, &rec.institution_type)
            && pass(&self.institution_sizes, &rec.institution_size)
            && pass(&self.funding_types, &rec.funding_type)
            && pass(&self.policy_stances, &rec.policy_stance)
            && pass(&self.quarters, &rec.survey_quarter)
            && pass(&self.disciplines, &rec.primary_discipline_focus)
    }
}

// ---------------------------------------------------------------------------
// FilteredView: the ordered matching subset
// ---------------------------------------------------------------------------

/// The subset of records satisfying a [`FilterSpec`], in load order.
/// An empty view is a normal value, not an error; callers decide how to
/// present "no data".
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub(crate) fn from_indices(dataset: &'a Dataset, indices: Vec<usize>) -> Self {
        FilteredView { dataset, indices }
    }

    /// Number of rows in the view.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Row positions into the underlying dataset, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Records in the view, in load order.
    pub fn records(&self) -> impl Iterator<Item = &'a InstitutionRecord> + '_ {
        let all = self.dataset.records();
        self.indices.iter().map(move |&i| &all[i])
    }
}

/// Return the indices of records passing every non-empty dimension of
/// `spec`, in load order.
pub fn matching_indices(dataset: &Dataset, spec: &FilterSpec) -> Vec<usize> {
    dataset
        .records()
        .iter()
        .enumerate()
        .filter(|&(_, rec)| spec.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

/// Apply a filter specification, yielding the matching view.
pub fn apply_filter<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> FilteredView<'a> {
    FilteredView::from_indices(dataset, matching_indices(dataset, spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Region;
    use crate::data::testutil::record;

    fn three_row_dataset() -> Dataset {
        Dataset::from_records(vec![
            record("U1", Region::Europe, 2023, 40.0),
            record("U1", Region::Europe, 2024, 60.0),
            record("U2", Region::AsiaPacific, 2024, 50.0),
        ])
    }

    #[test]
    fn empty_spec_is_identity() {
        let ds = three_row_dataset();
        let view = apply_filter(&ds, &FilterSpec::default());
        assert_eq!(view.len(), ds.record_count());
        assert_eq!(view.indices(), &[0, 1, 2]);
    }

    #[test]
    fn region_filter_selects_matching_rows_in_load_order() {
        let ds = three_row_dataset();
        let spec = FilterSpec {
            regions: [Region::Europe].into(),
            ..Default::default()
        };
        let view = apply_filter(&ds, &spec);
        assert_eq!(view.indices(), &[0, 1]);
        assert!(view.records().all(|r| r.region == Region::Europe));
    }

    #[test]
    fn result_is_subset_of_dataset() {
        let ds = three_row_dataset();
        for spec in [
            FilterSpec::default(),
            FilterSpec {
                regions: [Region::Africa].into(),
                ..Default::default()
            },
            FilterSpec {
                quarters: ["2024-Q1".to_string()].into(),
                ..Default::default()
            },
        ] {
            let view = apply_filter(&ds, &spec);
            assert!(view.len() <= ds.record_count());
            assert!(view.indices().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn regions_and_countries_intersect() {
        let ds = three_row_dataset();
        // Europe rows carry country "Germany"; asking for Europe ∩ Japan
        // must yield nothing, not "countries override regions".
        let spec = FilterSpec {
            regions: [Region::Europe].into(),
            countries: ["Japan".to_string()].into(),
            ..Default::default()
        };
        assert!(apply_filter(&ds, &spec).is_empty());
    }

    #[test]
    fn region_filter_equals_region_plus_all_its_countries() {
        let ds = three_row_dataset();
        let by_region = FilterSpec {
            regions: [Region::Europe].into(),
            ..Default::default()
        };
        let by_both = FilterSpec {
            regions: [Region::Europe].into(),
            countries: ["Germany".to_string()].into(),
            ..Default::default()
        };
        assert_eq!(
            apply_filter(&ds, &by_region).indices(),
            apply_filter(&ds, &by_both).indices()
        );
    }

    #[test]
    fn unknown_values_match_nothing() {
        let ds = three_row_dataset();
        let spec = FilterSpec {
            countries: ["Freedonia".to_string()].into(),
            ..Default::default()
        };
        let view = apply_filter(&ds, &spec);
        assert!(view.is_empty());
    }

    #[test]
    fn no_match_is_an_empty_view_not_an_error() {
        let ds = three_row_dataset();
        let spec = FilterSpec {
            regions: [Region::Africa].into(),
            ..Default::default()
        };
        let view = apply_filter(&ds, &spec);
        assert!(view.is_empty());
        assert_eq!(view.records().count(), 0);
    }

    #[test]
    fn canonical_key_ignores_insertion_order() {
        let mut a = FilterSpec::default();
        a.countries.insert("Spain".to_string());
        a.countries.insert("Germany".to_string());

        let mut b = FilterSpec::default();
        b.countries.insert("Germany".to_string());
        b.countries.insert("Spain".to_string());

        assert_eq!(a.canonical_key(), b.canonical_key());
        assert_ne!(a.canonical_key(), FilterSpec::default().canonical_key());
    }
}
