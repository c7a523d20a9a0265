use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Closed categorical domains
// ---------------------------------------------------------------------------

/// Declares a closed categorical column: the full domain in canonical order
/// plus label round-tripping. Canonical order drives default display order
/// and tie-breaking in ranked aggregates.
macro_rules! closed_domain {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)+
        }

        impl $name {
            /// Full domain in canonical order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Display label as it appears in the source data.
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Parse a source-data label. `None` for values outside the
            /// declared domain.
            pub fn from_label(s: &str) -> Option<$name> {
                match s {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

closed_domain!(Region {
    NorthAmerica => "North America",
    Europe => "Europe",
    AsiaPacific => "Asia Pacific",
    LatinAmerica => "Latin America",
    MiddleEast => "Middle East",
    Africa => "Africa",
});

closed_domain!(InstitutionType {
    ResearchUniversity => "Research University",
    TeachingUniversity => "Teaching University",
    LiberalArtsCollege => "Liberal Arts College",
    TechnicalInstitute => "Technical Institute",
    CommunityCollege => "Community College",
});

// Ordered enrollment buckets, smallest first.
closed_domain!(SizeBucket {
    Small => "Small (<5K)",
    Medium => "Medium (5K-15K)",
    Large => "Large (15K-30K)",
    VeryLarge => "Very Large (>30K)",
});

closed_domain!(FundingType {
    Public => "Public",
    Private => "Private",
    Mixed => "Mixed",
});

// Governance maturity, least mature first.
closed_domain!(PolicyStance {
    Restrictive => "Restrictive",
    Cautious => "Cautious",
    Permissive => "Permissive",
    Integrated => "Integrated",
});

// ---------------------------------------------------------------------------
// Numeric metric columns
// ---------------------------------------------------------------------------

/// The nine numeric survey metrics. Every aggregate (mean, stddev,
/// correlation, trend) is parameterized by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricColumn {
    AiAdoptionRate,
    StudentAiLiteracyIndex,
    IntegrityIncidentRate,
    LearningOutcomeDelta,
    FacultyTrainingHours,
    InfrastructureReadiness,
    PolicyMaturityScore,
    StudentSatisfactionScore,
    ResearchOutputAiPct,
}

impl MetricColumn {
    pub const ALL: &'static [MetricColumn] = &[
        MetricColumn::AiAdoptionRate,
        MetricColumn::StudentAiLiteracyIndex,
        MetricColumn::IntegrityIncidentRate,
        MetricColumn::LearningOutcomeDelta,
        MetricColumn::FacultyTrainingHours,
        MetricColumn::InfrastructureReadiness,
        MetricColumn::PolicyMaturityScore,
        MetricColumn::StudentSatisfactionScore,
        MetricColumn::ResearchOutputAiPct,
    ];

    /// Column name as it appears in the source file header.
    pub fn column_name(&self) -> &'static str {
        match self {
            MetricColumn::AiAdoptionRate => "ai_adoption_rate",
            MetricColumn::StudentAiLiteracyIndex => "student_ai_literacy_index",
            MetricColumn::IntegrityIncidentRate => "integrity_incident_rate",
            MetricColumn::LearningOutcomeDelta => "learning_outcome_delta",
            MetricColumn::FacultyTrainingHours => "faculty_training_hours",
            MetricColumn::InfrastructureReadiness => "infrastructure_readiness",
            MetricColumn::PolicyMaturityScore => "policy_maturity_score",
            MetricColumn::StudentSatisfactionScore => "student_satisfaction_score",
            MetricColumn::ResearchOutputAiPct => "research_output_ai_pct",
        }
    }

    /// Documented valid range, inclusive. Values outside it are rejected at
    /// load time.
    pub fn valid_range(&self) -> (f64, f64) {
        match self {
            MetricColumn::AiAdoptionRate => (0.0, 100.0),
            MetricColumn::StudentAiLiteracyIndex => (0.0, 100.0),
            MetricColumn::IntegrityIncidentRate => (0.0, f64::INFINITY),
            MetricColumn::LearningOutcomeDelta => (f64::NEG_INFINITY, f64::INFINITY),
            MetricColumn::FacultyTrainingHours => (0.0, f64::INFINITY),
            MetricColumn::InfrastructureReadiness => (1.0, 10.0),
            MetricColumn::PolicyMaturityScore => (1.0, 5.0),
            MetricColumn::StudentSatisfactionScore => (1.0, 5.0),
            MetricColumn::ResearchOutputAiPct => (0.0, 100.0),
        }
    }

    /// Read this metric's value out of a record.
    pub fn value(&self, rec: &InstitutionRecord) -> f64 {
        match self {
            MetricColumn::AiAdoptionRate => rec.ai_adoption_rate,
            MetricColumn::StudentAiLiteracyIndex => rec.student_ai_literacy_index,
            MetricColumn::IntegrityIncidentRate => rec.integrity_incident_rate,
            MetricColumn::LearningOutcomeDelta => rec.learning_outcome_delta,
            MetricColumn::FacultyTrainingHours => rec.faculty_training_hours,
            MetricColumn::InfrastructureReadiness => rec.infrastructure_readiness,
            MetricColumn::PolicyMaturityScore => rec.policy_maturity_score,
            MetricColumn::StudentSatisfactionScore => rec.student_satisfaction_score,
            MetricColumn::ResearchOutputAiPct => rec.research_output_ai_pct,
        }
    }
}

impl fmt::Display for MetricColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

// ---------------------------------------------------------------------------
// Categorical columns usable for filter controls and group-by
// ---------------------------------------------------------------------------

/// A categorical (or temporal) column a consumer may group by or build a
/// filter control from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryColumn {
    Region,
    Country,
    InstitutionType,
    InstitutionSize,
    FundingType,
    PolicyStance,
    SurveyQuarter,
    Discipline,
    Year,
}

impl CategoryColumn {
    pub fn column_name(&self) -> &'static str {
        match self {
            CategoryColumn::Region => "region",
            CategoryColumn::Country => "country",
            CategoryColumn::InstitutionType => "institution_type",
            CategoryColumn::InstitutionSize => "institution_size",
            CategoryColumn::FundingType => "funding_type",
            CategoryColumn::PolicyStance => "policy_stance",
            CategoryColumn::SurveyQuarter => "survey_quarter",
            CategoryColumn::Discipline => "primary_discipline_focus",
            CategoryColumn::Year => "year",
        }
    }

    /// Group key for a record under this column. Closed domains rank by
    /// declaration order; open columns rank lexically (rank 0, label order
    /// decides).
    pub fn group_key(&self, rec: &InstitutionRecord) -> GroupKey {
        fn closed<T: PartialEq + Copy>(all: &[T], v: T, label: &str) -> GroupKey {
            let rank = all.iter().position(|c| *c == v).unwrap_or(all.len());
            GroupKey {
                rank,
                label: label.to_string(),
            }
        }
        match self {
            CategoryColumn::Region => closed(Region::ALL, rec.region, rec.region.label()),
            CategoryColumn::InstitutionType => closed(
                InstitutionType::ALL,
                rec.institution_type,
                rec.institution_type.label(),
            ),
            CategoryColumn::InstitutionSize => closed(
                SizeBucket::ALL,
                rec.institution_size,
                rec.institution_size.label(),
            ),
            CategoryColumn::FundingType => {
                closed(FundingType::ALL, rec.funding_type, rec.funding_type.label())
            }
            CategoryColumn::PolicyStance => {
                closed(PolicyStance::ALL, rec.policy_stance, rec.policy_stance.label())
            }
            CategoryColumn::Country => GroupKey::open(&rec.country),
            CategoryColumn::SurveyQuarter => GroupKey::open(&rec.survey_quarter),
            CategoryColumn::Discipline => GroupKey::open(&rec.primary_discipline_focus),
            CategoryColumn::Year => GroupKey::open(&rec.year.to_string()),
        }
    }
}

/// Sort key for a group: `(canonical rank, label)`. The derived `Ord` is the
/// canonical domain order used for default ordering and tie-breaking.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub rank: usize,
    pub label: String,
}

impl GroupKey {
    fn open(label: &str) -> GroupKey {
        GroupKey {
            rank: 0,
            label: label.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// InstitutionRecord – one row of the survey panel
// ---------------------------------------------------------------------------

/// One (institution, survey quarter) observation. Institutions recur across
/// quarters, forming a longitudinal panel keyed by `institution_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionRecord {
    pub institution_id: String,
    pub institution_name: String,
    pub country: String,
    pub region: Region,
    pub institution_type: InstitutionType,
    pub institution_size: SizeBucket,
    pub funding_type: FundingType,
    pub primary_discipline_focus: String,
    /// Quarter label, e.g. "2023-Q1". Lexical order is chronological.
    pub survey_quarter: String,
    pub year: i32,
    pub policy_stance: PolicyStance,
    pub ai_adoption_rate: f64,
    pub student_ai_literacy_index: f64,
    pub integrity_incident_rate: f64,
    pub learning_outcome_delta: f64,
    pub faculty_training_hours: f64,
    pub infrastructure_readiness: f64,
    pub policy_maturity_score: f64,
    pub student_satisfaction_score: f64,
    pub research_output_ai_pct: f64,
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded panel
// ---------------------------------------------------------------------------

/// The full validated dataset with pre-computed distinct-value indexes.
/// Immutable after construction: all "editing" downstream is filtering into
/// derived views.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<InstitutionRecord>,
    countries: BTreeSet<String>,
    disciplines: BTreeSet<String>,
    quarters: BTreeSet<String>,
    years: BTreeSet<i32>,
    institutions: BTreeSet<String>,
}

impl Dataset {
    /// Build the distinct-value indexes from validated records.
    pub fn from_records(records: Vec<InstitutionRecord>) -> Self {
        let mut countries = BTreeSet::new();
        let mut disciplines = BTreeSet::new();
        let mut quarters = BTreeSet::new();
        let mut years = BTreeSet::new();
        let mut institutions = BTreeSet::new();

        for rec in &records {
            countries.insert(rec.country.clone());
            disciplines.insert(rec.primary_discipline_focus.clone());
            quarters.insert(rec.survey_quarter.clone());
            years.insert(rec.year);
            institutions.insert(rec.institution_id.clone());
        }

        Dataset {
            records,
            countries,
            disciplines,
            quarters,
            years,
            institutions,
        }
    }

    /// All records in load order.
    pub fn records(&self) -> &[InstitutionRecord] {
        &self.records
    }

    /// Number of rows (institution-quarter observations).
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn distinct_country_count(&self) -> usize {
        self.countries.len()
    }

    pub fn distinct_institution_count(&self) -> usize {
        self.institutions.len()
    }

    /// Distinct years observed, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.iter().copied()
    }

    /// Values for a filter control, in canonical order.
    ///
    /// Closed domains return the full domain whether or not every value is
    /// observed, so a control renders all four policy stances even when the
    /// current file has zero "Restrictive" rows. Open columns return the
    /// sorted observed values.
    pub fn distinct_values(&self, column: CategoryColumn) -> Vec<String> {
        fn domain_labels<T: fmt::Display>(all: &[T]) -> Vec<String> {
            all.iter().map(|v| v.to_string()).collect()
        }
        match column {
            CategoryColumn::Region => domain_labels(Region::ALL),
            CategoryColumn::InstitutionType => domain_labels(InstitutionType::ALL),
            CategoryColumn::InstitutionSize => domain_labels(SizeBucket::ALL),
            CategoryColumn::FundingType => domain_labels(FundingType::ALL),
            CategoryColumn::PolicyStance => domain_labels(PolicyStance::ALL),
            CategoryColumn::Country => self.countries.iter().cloned().collect(),
            CategoryColumn::Discipline => self.disciplines.iter().cloned().collect(),
            CategoryColumn::SurveyQuarter => self.quarters.iter().cloned().collect(),
            CategoryColumn::Year => self.years.iter().map(|y| y.to_string()).collect(),
        }
    }
}
