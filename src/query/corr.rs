use serde::Serialize;

use crate::data::filter::FilteredView;
use crate::data::model::MetricColumn;

// ---------------------------------------------------------------------------
// CorrelationMatrix
// ---------------------------------------------------------------------------

/// Symmetric pairwise Pearson correlation over chosen metric columns.
///
/// Cells are `None` when the correlation is undefined: fewer than 2 rows in
/// the view, or either column constant (zero variance). The sentinel is
/// deliberately distinct from a true near-zero correlation; a heatmap
/// renders it as a gap, not as 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    columns: Vec<MetricColumn>,
    /// Row-major n×n cells.
    cells: Vec<Option<f64>>,
}

impl CorrelationMatrix {
    pub fn columns(&self) -> &[MetricColumn] {
        &self.columns
    }

    pub fn size(&self) -> usize {
        self.columns.len()
    }

    /// Cell (i, j); panics only on out-of-bounds indices, like slice
    /// indexing.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.cells[i * self.columns.len() + j]
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute the correlation matrix of `columns` over the view.
pub fn correlation_matrix(view: &FilteredView, columns: &[MetricColumn]) -> CorrelationMatrix {
    let n_rows = view.len();
    let n_cols = columns.len();

    if n_rows < 2 {
        return CorrelationMatrix {
            columns: columns.to_vec(),
            cells: vec![None; n_cols * n_cols],
        };
    }

    // Center each column once; correlation is then a dot-product ratio.
    let centered: Vec<Vec<f64>> = columns
        .iter()
        .map(|metric| {
            let values: Vec<f64> = view.records().map(|rec| metric.value(rec)).collect();
            let mean = values.iter().sum::<f64>() / n_rows as f64;
            values.into_iter().map(|v| v - mean).collect()
        })
        .collect();
    let sum_sq: Vec<f64> = centered
        .iter()
        .map(|col| col.iter().map(|v| v * v).sum())
        .collect();

    let mut cells = vec![None; n_cols * n_cols];
    for i in 0..n_cols {
        for j in i..n_cols {
            let cell = if sum_sq[i] == 0.0 || sum_sq[j] == 0.0 {
                None
            } else if i == j {
                Some(1.0)
            } else {
                let cov: f64 = centered[i]
                    .iter()
                    .zip(centered[j].iter())
                    .map(|(a, b)| a * b)
                    .sum();
                // Rounding can push |r| a hair past 1 for collinear columns.
                Some((cov / (sum_sq[i] * sum_sq[j]).sqrt()).clamp(-1.0, 1.0))
            };
            cells[i * n_cols + j] = cell;
            cells[j * n_cols + i] = cell;
        }
    }

    CorrelationMatrix {
        columns: columns.to_vec(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply_filter, FilterSpec};
    use crate::data::model::{Dataset, Region};
    use crate::data::testutil::record;

    const COLS: &[MetricColumn] = &[
        MetricColumn::AiAdoptionRate,
        MetricColumn::StudentAiLiteracyIndex,
        MetricColumn::FacultyTrainingHours,
    ];

    fn dataset_with(literacy: &[f64], adoption: &[f64]) -> Dataset {
        let records = adoption
            .iter()
            .zip(literacy.iter())
            .enumerate()
            .map(|(i, (&a, &l))| {
                let mut rec = record(&format!("U{i}"), Region::Europe, 2023, a);
                rec.student_ai_literacy_index = l;
                rec
            })
            .collect();
        Dataset::from_records(records)
    }

    #[test]
    fn diagonal_is_exactly_one() {
        let ds = dataset_with(&[10.0, 20.0, 35.0], &[40.0, 55.0, 70.0]);
        let view = apply_filter(&ds, &FilterSpec::default());
        let m = correlation_matrix(&view, &COLS[..2]);
        assert_eq!(m.get(0, 0), Some(1.0));
        assert_eq!(m.get(1, 1), Some(1.0));
    }

    #[test]
    fn perfectly_linear_columns_correlate_to_one() {
        // literacy = adoption + 5, exactly collinear.
        let ds = dataset_with(&[45.0, 55.0, 65.0], &[40.0, 50.0, 60.0]);
        let view = apply_filter(&ds, &FilterSpec::default());
        let m = correlation_matrix(&view, &COLS[..2]);
        let r = m.get(0, 1).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        assert_eq!(m.get(0, 1), m.get(1, 0));
    }

    #[test]
    fn anticorrelated_columns_approach_minus_one() {
        let ds = dataset_with(&[60.0, 50.0, 40.0], &[40.0, 50.0, 60.0]);
        let view = apply_filter(&ds, &FilterSpec::default());
        let m = correlation_matrix(&view, &COLS[..2]);
        let r = m.get(0, 1).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_is_undefined_including_diagonal() {
        // Every record has faculty_training_hours = 20 (testutil default).
        let ds = dataset_with(&[10.0, 20.0, 30.0], &[40.0, 50.0, 60.0]);
        let view = apply_filter(&ds, &FilterSpec::default());
        let m = correlation_matrix(&view, COLS);

        assert_eq!(m.get(2, 2), None);
        assert_eq!(m.get(0, 2), None);
        assert_eq!(m.get(2, 1), None);
        // Non-constant pairs stay defined.
        assert!(m.get(0, 1).is_some());
    }

    #[test]
    fn fewer_than_two_rows_is_all_sentinels() {
        let ds = dataset_with(&[50.0], &[40.0]);
        let view = apply_filter(&ds, &FilterSpec::default());
        let m = correlation_matrix(&view, COLS);
        for i in 0..m.size() {
            for j in 0..m.size() {
                assert_eq!(m.get(i, j), None);
            }
        }
    }
}
