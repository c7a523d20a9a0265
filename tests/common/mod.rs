//! Shared fixture helpers for integration tests.

use std::io::Write;

use edulens::{load_file, Dataset};

pub const HEADER: &str = "institution_id,institution_name,country,region,institution_type,\
institution_size,funding_type,primary_discipline_focus,survey_quarter,year,policy_stance,\
ai_adoption_rate,student_ai_literacy_index,integrity_incident_rate,learning_outcome_delta,\
faculty_training_hours,infrastructure_readiness,policy_maturity_score,\
student_satisfaction_score,research_output_ai_pct";

pub struct Row {
    pub id: &'static str,
    pub country: &'static str,
    pub region: &'static str,
    pub quarter: &'static str,
    pub year: i32,
    pub stance: &'static str,
    pub adoption: f64,
    pub literacy: f64,
    pub incidents: f64,
}

impl Row {
    fn to_csv(&self) -> String {
        format!(
            "{id},{id} University,{country},{region},Research University,Medium (5K-15K),\
Public,STEM,{quarter},{year},{stance},{adoption},{literacy},{incidents},2,20,5,3,3.5,30",
            id = self.id,
            country = self.country,
            region = self.region,
            quarter = self.quarter,
            year = self.year,
            stance = self.stance,
            adoption = self.adoption,
            literacy = self.literacy,
            incidents = self.incidents,
        )
    }
}

/// A small two-year panel across three regions: enough structure for
/// filters, YoY deltas, group-bys, and correlations to exercise every path.
pub fn panel_rows() -> Vec<Row> {
    vec![
        Row { id: "U1", country: "Germany", region: "Europe", quarter: "2023-Q1", year: 2023, stance: "Cautious", adoption: 40.0, literacy: 42.0, incidents: 6.0 },
        Row { id: "U1", country: "Germany", region: "Europe", quarter: "2024-Q1", year: 2024, stance: "Permissive", adoption: 60.0, literacy: 58.0, incidents: 4.0 },
        Row { id: "U2", country: "Spain", region: "Europe", quarter: "2023-Q1", year: 2023, stance: "Restrictive", adoption: 30.0, literacy: 35.0, incidents: 8.0 },
        Row { id: "U2", country: "Spain", region: "Europe", quarter: "2024-Q1", year: 2024, stance: "Cautious", adoption: 44.0, literacy: 47.0, incidents: 7.0 },
        Row { id: "U3", country: "Japan", region: "Asia Pacific", quarter: "2023-Q1", year: 2023, stance: "Permissive", adoption: 52.0, literacy: 50.0, incidents: 5.0 },
        Row { id: "U3", country: "Japan", region: "Asia Pacific", quarter: "2024-Q1", year: 2024, stance: "Integrated", adoption: 68.0, literacy: 66.0, incidents: 3.0 },
        Row { id: "U4", country: "Kenya", region: "Africa", quarter: "2023-Q1", year: 2023, stance: "Cautious", adoption: 25.0, literacy: 28.0, incidents: 9.0 },
        Row { id: "U4", country: "Kenya", region: "Africa", quarter: "2024-Q1", year: 2024, stance: "Cautious", adoption: 33.0, literacy: 39.0, incidents: 8.0 },
    ]
}

/// Write rows to a temp CSV and load it through the store.
pub fn load_panel(rows: &[Row]) -> (tempfile::NamedTempFile, Dataset) {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{}", row.to_csv()).unwrap();
    }
    file.flush().unwrap();

    let dataset = load_file(file.path()).expect("fixture should load");
    (file, dataset)
}
