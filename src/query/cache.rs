use std::collections::HashMap;

use crate::data::filter::{matching_indices, FilterSpec, FilteredView};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Query cache: FilterSpec -> matching row indices
// ---------------------------------------------------------------------------

/// Memoizes filter evaluation keyed by the spec's canonical serialization.
///
/// Entries are valid for one store generation (see
/// [`DatasetCache::generation`](crate::data::loader::DatasetCache::generation));
/// passing a newer generation clears the map. Purely an optimization —
/// results are identical with or without it.
#[derive(Debug, Default)]
pub struct QueryCache {
    generation: u64,
    entries: HashMap<String, Vec<usize>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized filter results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Filter through the cache. `generation` identifies the dataset the
    /// caller is querying; a mismatch with the cached generation drops all
    /// entries before the lookup.
    pub fn get_or_filter<'a>(
        &mut self,
        dataset: &'a Dataset,
        generation: u64,
        spec: &FilterSpec,
    ) -> FilteredView<'a> {
        if generation != self.generation {
            self.entries.clear();
            self.generation = generation;
        }
        let indices = self
            .entries
            .entry(spec.canonical_key())
            .or_insert_with(|| matching_indices(dataset, spec))
            .clone();
        FilteredView::from_indices(dataset, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::apply_filter;
    use crate::data::model::Region;
    use crate::data::testutil::record;

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            record("U1", Region::Europe, 2023, 40.0),
            record("U2", Region::AsiaPacific, 2024, 50.0),
        ])
    }

    #[test]
    fn cached_result_matches_direct_filtering() {
        let ds = dataset();
        let mut cache = QueryCache::new();
        let spec = FilterSpec {
            regions: [Region::Europe].into(),
            ..Default::default()
        };

        let cached = cache.get_or_filter(&ds, 1, &spec);
        let direct = apply_filter(&ds, &spec);
        assert_eq!(cached.indices(), direct.indices());

        // Second hit comes from the memo.
        cache.get_or_filter(&ds, 1, &spec);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn generation_bump_invalidates_entries() {
        let ds = dataset();
        let mut cache = QueryCache::new();
        cache.get_or_filter(&ds, 1, &FilterSpec::default());
        cache.get_or_filter(&ds, 1, &FilterSpec {
            regions: [Region::Europe].into(),
            ..Default::default()
        });
        assert_eq!(cache.len(), 2);

        cache.get_or_filter(&ds, 2, &FilterSpec::default());
        assert_eq!(cache.len(), 1);
    }
}
