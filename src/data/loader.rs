use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{bail, Context};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use thiserror::Error;

use super::model::{
    Dataset, FundingType, InstitutionRecord, InstitutionType, MetricColumn, PolicyStance, Region,
    SizeBucket,
};

// ---------------------------------------------------------------------------
// Public error type
// ---------------------------------------------------------------------------

/// Loading failures. Fatal to startup: the consumer halts or shows an error
/// state, it does not retry.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// The source file does not exist.
    #[error("dataset not found at {}", path.display())]
    NotFound { path: PathBuf },
    /// The source exists but required columns are missing or a value falls
    /// outside its declared domain.
    #[error("malformed dataset: {reason}")]
    Malformed { reason: String },
}

/// Columns that must be present in every source file, beyond the nine
/// metric columns in [`MetricColumn::ALL`].
const IDENTITY_COLUMNS: &[&str] = &[
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
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the survey panel from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – one header row, one record per line (the canonical form)
/// * `.json`    – records-oriented array of objects
/// * `.parquet` – flat scalar columns matching the CSV header set
pub fn load_file(path: &Path) -> Result<Dataset, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let result = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(anyhow::anyhow!("unsupported file extension: .{other}")),
    };

    match result {
        Ok(dataset) => {
            log::info!(
                "loaded {} records, {} institutions, {} countries from {}",
                dataset.record_count(),
                dataset.distinct_institution_count(),
                dataset.distinct_country_count(),
                path.display()
            );
            Ok(dataset)
        }
        Err(e) => Err(DataLoadError::Malformed {
            reason: format!("{e:#}"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Memoized loading
// ---------------------------------------------------------------------------

/// Memoizes [`load_file`] by `(path, modification time)`.  Repeated loads of
/// an unchanged source return the cached dataset without re-reading; a
/// changed source reloads and bumps the generation counter that query-side
/// caches key their invalidation on.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, CacheEntry>,
    generation: u64,
}

struct CacheEntry {
    modified: SystemTime,
    dataset: Arc<Dataset>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation; incremented every time a source is (re)read.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn load(&mut self, path: &Path) -> Result<Arc<Dataset>, DataLoadError> {
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|_| DataLoadError::NotFound {
                path: path.to_path_buf(),
            })?;

        if let Some(entry) = self.entries.get(path) {
            if entry.modified == modified {
                return Ok(entry.dataset.clone());
            }
            log::info!("source changed, reloading {}", path.display());
        }

        let dataset = Arc::new(load_file(path)?);
        self.generation += 1;
        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                modified,
                dataset: dataset.clone(),
            },
        );
        Ok(dataset)
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> anyhow::Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let index = column_index(&headers)?;
    warn_ignored_columns(&headers);

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let mut cells: HashMap<&'static str, String> = HashMap::new();
        for name in required_columns() {
            // column_index guarantees presence of every required column
            cells.insert(name, record.get(index[name]).unwrap_or("").to_string());
        }
        let rec = parse_record(&cells).with_context(|| format!("CSV row {row_no}"))?;
        records.push(rec);
    }

    Ok(Dataset::from_records(records))
}

/// Map every required column name to its position, failing on absences.
fn column_index(headers: &[String]) -> anyhow::Result<HashMap<String, usize>> {
    let mut index = HashMap::new();
    for name in required_columns() {
        let pos = headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("missing required column '{name}'"))?;
        index.insert(name.to_string(), pos);
    }
    Ok(index)
}

fn required_columns() -> impl Iterator<Item = &'static str> {
    IDENTITY_COLUMNS
        .iter()
        .copied()
        .chain(MetricColumn::ALL.iter().map(|m| m.column_name()))
}

fn warn_ignored_columns(headers: &[String]) {
    let ignored: Vec<&str> = headers
        .iter()
        .map(|h| h.as_str())
        .filter(|h| !required_columns().any(|r| r == *h))
        .collect();
    if !ignored.is_empty() {
        log::warn!("ignoring unrecognized columns: {ignored:?}");
    }
}

// ---------------------------------------------------------------------------
// Cell parsing shared by the CSV and Parquet paths
// ---------------------------------------------------------------------------

/// Assemble and validate one record from its stringified cells.
fn parse_record(cells: &HashMap<&'static str, String>) -> anyhow::Result<InstitutionRecord> {
    let cell = |name: &str| -> &str { cells.get(name).map(String::as_str).unwrap_or("") };

    let region = parse_domain(cell("region"), "region", Region::from_label)?;
    let institution_type = parse_domain(
        cell("institution_type"),
        "institution_type",
        InstitutionType::from_label,
    )?;
    let institution_size = parse_domain(
        cell("institution_size"),
        "institution_size",
        SizeBucket::from_label,
    )?;
    let funding_type =
        parse_domain(cell("funding_type"), "funding_type", FundingType::from_label)?;
    let policy_stance =
        parse_domain(cell("policy_stance"), "policy_stance", PolicyStance::from_label)?;

    let survey_quarter = cell("survey_quarter").to_string();
    let year: i32 = cell("year")
        .trim()
        .parse()
        .with_context(|| format!("year '{}' is not an integer", cell("year")))?;
    check_quarter(&survey_quarter, year)?;

    let mut rec = InstitutionRecord {
        institution_id: cell("institution_id").to_string(),
        institution_name: cell("institution_name").to_string(),
        country: cell("country").to_string(),
        region,
        institution_type,
        institution_size,
        funding_type,
        primary_discipline_focus: cell("primary_discipline_focus").to_string(),
        survey_quarter,
        year,
        policy_stance,
        ai_adoption_rate: 0.0,
        student_ai_literacy_index: 0.0,
        integrity_incident_rate: 0.0,
        learning_outcome_delta: 0.0,
        faculty_training_hours: 0.0,
        infrastructure_readiness: 1.0,
        policy_maturity_score: 1.0,
        student_satisfaction_score: 1.0,
        research_output_ai_pct: 0.0,
    };

    for metric in MetricColumn::ALL {
        let raw = cell(metric.column_name());
        let value: f64 = raw
            .trim()
            .parse()
            .with_context(|| format!("{} '{raw}' is not a number", metric.column_name()))?;
        check_metric_range(*metric, value)?;
        set_metric(&mut rec, *metric, value);
    }

    Ok(rec)
}

fn parse_domain<T>(
    raw: &str,
    column: &str,
    from_label: impl Fn(&str) -> Option<T>,
) -> anyhow::Result<T> {
    from_label(raw.trim())
        .with_context(|| format!("'{raw}' is outside the {column} domain"))
}

/// Quarter labels are "YYYY-Qn" and must agree with the year column.
fn check_quarter(quarter: &str, year: i32) -> anyhow::Result<()> {
    let (y, q) = quarter
        .split_once("-Q")
        .with_context(|| format!("survey_quarter '{quarter}' is not of the form YYYY-Qn"))?;
    let label_year: i32 = y
        .parse()
        .with_context(|| format!("survey_quarter '{quarter}' has a non-numeric year"))?;
    let quarter_no: u8 = q
        .parse()
        .with_context(|| format!("survey_quarter '{quarter}' has a non-numeric quarter"))?;
    if !(1..=4).contains(&quarter_no) {
        bail!("survey_quarter '{quarter}' is outside Q1..Q4");
    }
    if label_year != year {
        bail!("survey_quarter '{quarter}' disagrees with year {year}");
    }
    Ok(())
}

fn check_metric_range(metric: MetricColumn, value: f64) -> anyhow::Result<()> {
    let (lo, hi) = metric.valid_range();
    if !value.is_finite() || value < lo || value > hi {
        bail!(
            "{} value {value} outside valid range [{lo}, {hi}]",
            metric.column_name()
        );
    }
    Ok(())
}

fn set_metric(rec: &mut InstitutionRecord, metric: MetricColumn, value: f64) {
    match metric {
        MetricColumn::AiAdoptionRate => rec.ai_adoption_rate = value,
        MetricColumn::StudentAiLiteracyIndex => rec.student_ai_literacy_index = value,
        MetricColumn::IntegrityIncidentRate => rec.integrity_incident_rate = value,
        MetricColumn::LearningOutcomeDelta => rec.learning_outcome_delta = value,
        MetricColumn::FacultyTrainingHours => rec.faculty_training_hours = value,
        MetricColumn::InfrastructureReadiness => rec.infrastructure_readiness = value,
        MetricColumn::PolicyMaturityScore => rec.policy_maturity_score = value,
        MetricColumn::StudentSatisfactionScore => rec.student_satisfaction_score = value,
        MetricColumn::ResearchOutputAiPct => rec.research_output_ai_pct = value,
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "institution_id": "INST-0001",
///     "region": "Europe",
///     "survey_quarter": "2023-Q1",
///     "year": 2023,
///     "ai_adoption_rate": 41.5,
///     ...
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> anyhow::Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let records: Vec<InstitutionRecord> =
        serde_json::from_str(&text).context("parsing JSON records")?;

    // serde enforces the categorical domains; ranges and quarter/year
    // consistency still need checking.
    for (i, rec) in records.iter().enumerate() {
        check_quarter(&rec.survey_quarter, rec.year).with_context(|| format!("JSON row {i}"))?;
        for metric in MetricColumn::ALL {
            check_metric_range(*metric, metric.value(rec))
                .with_context(|| format!("JSON row {i}"))?;
        }
    }

    Ok(Dataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns matching the CSV header
/// set.  Works with files written by both **Pandas** (`df.to_parquet()`)
/// and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> anyhow::Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let mut columns: HashMap<&'static str, &Arc<dyn Array>> = HashMap::new();
        for name in required_columns() {
            let idx = schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("missing required column '{name}'"))?;
            columns.insert(name, batch.column(idx));
        }

        for row in 0..batch.num_rows() {
            // Stringify every cell and reuse the CSV cell parser; the panel
            // is small enough that uniformity beats a per-type fast path.
            let mut cells: HashMap<&'static str, String> = HashMap::new();
            for name in required_columns() {
                let value = scalar_to_string(columns[name], row)
                    .with_context(|| format!("parquet row {row}, column '{name}'"))?;
                cells.insert(name, value);
            }
            let rec = parse_record(&cells).with_context(|| format!("parquet row {row}"))?;
            records.push(rec);
        }
    }

    Ok(Dataset::from_records(records))
}

/// Extract a scalar cell from an Arrow column as text.
fn scalar_to_string(col: &Arc<dyn Array>, row: usize) -> anyhow::Result<String> {
    if col.is_null(row) {
        bail!("null value");
    }
    let text = match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            arr.value(row).to_string()
        }
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            arr.value(row).to_string()
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            arr.value(row).to_string()
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            arr.value(row).to_string()
        }
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            arr.value(row).to_string()
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(text)
}
