use std::io::Write;

use anyhow::Context;

use crate::data::filter::FilteredView;
use crate::data::model::InstitutionRecord;
use crate::query::kpi::KpiSet;

// ---------------------------------------------------------------------------
// Canonical column order
// ---------------------------------------------------------------------------

/// The canonical column order for exported (and generated) CSV files.
/// Loading an exported view yields row-for-row equal records.
pub const CSV_COLUMNS: &[&str] = &[
    "institution_id",
    "institution_name",
    "country",
    "region",
    "institution_type",
    "institution_size",
    "funding_type",
    "primary_discipline_focus",
    "survey_quarter",
    "year",
    "policy_stance",
    "ai_adoption_rate",
    "student_ai_literacy_index",
    "integrity_incident_rate",
    "learning_outcome_delta",
    "faculty_training_hours",
    "infrastructure_readiness",
    "policy_maturity_score",
    "student_satisfaction_score",
    "research_output_ai_pct",
];

/// One record's cells in [`CSV_COLUMNS`] order. `{}` on `f64` prints the
/// shortest representation that parses back to the same value, which is
/// what makes the export round-trip exact.
pub fn record_cells(rec: &InstitutionRecord) -> Vec<String> {
    vec![
        rec.institution_id.clone(),
        rec.institution_name.clone(),
        rec.country.clone(),
        rec.region.to_string(),
        rec.institution_type.to_string(),
        rec.institution_size.to_string(),
        rec.funding_type.to_string(),
        rec.primary_discipline_focus.clone(),
        rec.survey_quarter.clone(),
        rec.year.to_string(),
        rec.policy_stance.to_string(),
        rec.ai_adoption_rate.to_string(),
        rec.student_ai_literacy_index.to_string(),
        rec.integrity_incident_rate.to_string(),
        rec.learning_outcome_delta.to_string(),
        rec.faculty_training_hours.to_string(),
        rec.infrastructure_readiness.to_string(),
        rec.policy_maturity_score.to_string(),
        rec.student_satisfaction_score.to_string(),
        rec.research_output_ai_pct.to_string(),
    ]
}

// ---------------------------------------------------------------------------
// CSV writers
// ---------------------------------------------------------------------------

/// Write a view's rows as CSV in canonical column order.
pub fn write_view_csv<W: Write>(view: &FilteredView, writer: W) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_COLUMNS).context("writing CSV header")?;
    for rec in view.records() {
        csv.write_record(record_cells(rec))
            .with_context(|| format!("writing record for {}", rec.institution_id))?;
    }
    csv.flush().context("flushing CSV output")?;
    Ok(())
}

/// Write a KPI set as (kpi, value) rows. Sentinels export as empty cells.
pub fn write_kpis_csv<W: Write>(kpis: &KpiSet, writer: W) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["kpi", "value"]).context("writing CSV header")?;
    for (name, value) in kpis.rows() {
        let cell = value.map(|v| v.to_string()).unwrap_or_default();
        csv.write_record([name, cell.as_str()])
            .with_context(|| format!("writing KPI row {name}"))?;
    }
    csv.flush().context("flushing CSV output")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Display formatting
// ---------------------------------------------------------------------------

/// Number style for metric cards and table cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    /// Thousands-separated integer.
    Integer,
    /// Fixed-precision float.
    Float,
    /// Fixed-precision float with a trailing percent sign.
    Percent,
}

/// Format a KPI value for display; the no-data sentinel renders as "N/A".
pub fn format_number(value: Option<f64>, format: NumberFormat, precision: usize) -> String {
    let Some(v) = value else {
        return "N/A".to_string();
    };
    match format {
        NumberFormat::Integer => group_thousands(v.round() as i64),
        NumberFormat::Float => format!("{v:.precision$}"),
        NumberFormat::Percent => format!("{v:.precision$}%"),
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply_filter, FilterSpec};
    use crate::data::model::{Dataset, Region};
    use crate::data::testutil::record;
    use crate::query::kpi::compute_kpis;

    #[test]
    fn view_export_has_header_and_all_rows() {
        let ds = Dataset::from_records(vec![
            record("U1", Region::Europe, 2023, 40.0),
            record("U2", Region::AsiaPacific, 2024, 50.0),
        ]);
        let view = apply_filter(&ds, &FilterSpec::default());

        let mut out = Vec::new();
        write_view_csv(&view, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("institution_id,institution_name,"));
        assert!(lines[1].contains("Europe"));
        assert!(lines[2].contains("Asia Pacific"));
    }

    #[test]
    fn kpi_export_writes_sentinels_as_empty_cells() {
        let ds = Dataset::from_records(vec![record("U1", Region::Europe, 2023, 40.0)]);
        let view = apply_filter(&ds, &FilterSpec::default());
        let kpis = compute_kpis(&view);

        let mut out = Vec::new();
        write_kpis_csv(&kpis, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("avg_adoption_rate,40"));
        // Single year: the YoY delta is undefined.
        assert!(text.contains("adoption_yoy_delta,\n") || text.ends_with("adoption_yoy_delta,"));
    }

    #[test]
    fn format_number_styles() {
        assert_eq!(format_number(Some(1234567.0), NumberFormat::Integer, 0), "1,234,567");
        assert_eq!(format_number(Some(42.375), NumberFormat::Float, 1), "42.4");
        assert_eq!(format_number(Some(61.26), NumberFormat::Percent, 1), "61.3%");
        assert_eq!(format_number(None, NumberFormat::Percent, 1), "N/A");
        assert_eq!(format_number(Some(-1234.0), NumberFormat::Integer, 0), "-1,234");
    }
}
