use anyhow::Context;

use edulens::export::{record_cells, CSV_COLUMNS};
use edulens::{
    FundingType, InstitutionRecord, InstitutionType, PolicyStance, Region, SizeBucket,
};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// Per-region country pool and adoption baseline.
const REGIONS: &[(Region, &[&str], f64)] = &[
    (Region::NorthAmerica, &["United States", "Canada"], 48.0),
    (Region::Europe, &["Germany", "United Kingdom", "Spain"], 44.0),
    (Region::AsiaPacific, &["Japan", "Australia", "Singapore"], 46.0),
    (Region::LatinAmerica, &["Brazil", "Mexico"], 38.0),
    (Region::MiddleEast, &["United Arab Emirates", "Israel"], 42.0),
    (Region::Africa, &["Kenya", "South Africa"], 32.0),
];

const DISCIPLINES: &[&str] = &["STEM", "Business", "Medicine", "Liberal Arts", "Mixed"];

const QUARTERS: &[(&str, i32)] = &[
    ("2023-Q1", 2023),
    ("2023-Q2", 2023),
    ("2023-Q3", 2023),
    ("2023-Q4", 2023),
    ("2024-Q1", 2024),
    ("2024-Q2", 2024),
    ("2024-Q3", 2024),
    ("2024-Q4", 2024),
];

/// An institution's fixed identity; metrics evolve per quarter around it.
struct InstitutionProfile {
    id: String,
    name: String,
    country: String,
    region: Region,
    institution_type: InstitutionType,
    size: SizeBucket,
    funding: FundingType,
    discipline: String,
    stance: PolicyStance,
    base_adoption: f64,
}

fn build_profiles(per_region: usize, rng: &mut SimpleRng) -> Vec<InstitutionProfile> {
    let mut profiles = Vec::new();
    let mut serial = 0usize;

    for &(region, countries, base) in REGIONS {
        for _ in 0..per_region {
            serial += 1;
            let id = format!("INST-{serial:04}");
            let stance_roll = rng.next_f64();
            // Integrated stances stay rarer than cautious middles.
            let stance = if stance_roll < 0.15 {
                PolicyStance::Restrictive
            } else if stance_roll < 0.55 {
                PolicyStance::Cautious
            } else if stance_roll < 0.85 {
                PolicyStance::Permissive
            } else {
                PolicyStance::Integrated
            };
            profiles.push(InstitutionProfile {
                name: format!("{id} {}", *rng.pick(&["University", "College", "Institute"])),
                country: rng.pick(countries).to_string(),
                region,
                institution_type: *rng.pick(InstitutionType::ALL),
                size: *rng.pick(SizeBucket::ALL),
                funding: *rng.pick(FundingType::ALL),
                discipline: rng.pick(DISCIPLINES).to_string(),
                stance,
                base_adoption: rng.gauss(base, 8.0),
                id,
            });
        }
    }
    profiles
}

fn quarter_record(
    profile: &InstitutionProfile,
    quarter: &str,
    year: i32,
    quarter_index: usize,
    rng: &mut SimpleRng,
) -> InstitutionRecord {
    // Adoption climbs quarter over quarter; governed institutions climb
    // faster and report fewer incidents.
    let stance_boost = match profile.stance {
        PolicyStance::Restrictive => -4.0,
        PolicyStance::Cautious => 0.0,
        PolicyStance::Permissive => 3.0,
        PolicyStance::Integrated => 6.0,
    };
    let drift = 1.8 * quarter_index as f64;
    let adoption = clamp(
        profile.base_adoption + stance_boost + drift + rng.gauss(0.0, 2.5),
        0.0,
        100.0,
    );
    let literacy = clamp(adoption * 0.8 + rng.gauss(10.0, 6.0), 0.0, 100.0);
    let maturity = clamp(
        2.0 + stance_boost / 4.0 + 0.1 * quarter_index as f64 + rng.gauss(0.0, 0.4),
        1.0,
        5.0,
    );
    let incidents = clamp(
        9.0 - maturity * 1.2 + rng.gauss(0.0, 1.0),
        0.0,
        f64::INFINITY,
    );

    InstitutionRecord {
        institution_id: profile.id.clone(),
        institution_name: profile.name.clone(),
        country: profile.country.clone(),
        region: profile.region,
        institution_type: profile.institution_type,
        institution_size: profile.size,
        funding_type: profile.funding,
        primary_discipline_focus: profile.discipline.clone(),
        survey_quarter: quarter.to_string(),
        year,
        policy_stance: profile.stance,
        ai_adoption_rate: adoption,
        student_ai_literacy_index: literacy,
        integrity_incident_rate: incidents,
        learning_outcome_delta: clamp(adoption / 20.0 - 1.5 + rng.gauss(0.0, 1.2), -15.0, 15.0),
        faculty_training_hours: clamp(rng.gauss(18.0 + drift, 6.0), 0.0, f64::INFINITY),
        infrastructure_readiness: clamp(rng.gauss(4.0 + adoption / 25.0, 1.0), 1.0, 10.0),
        policy_maturity_score: maturity,
        student_satisfaction_score: clamp(rng.gauss(3.2 + adoption / 200.0, 0.5), 1.0, 5.0),
        research_output_ai_pct: clamp(rng.gauss(adoption * 0.5, 8.0), 0.0, 100.0),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dataset.csv".to_string());

    let mut rng = SimpleRng::new(42);
    let profiles = build_profiles(7, &mut rng);

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record(CSV_COLUMNS).context("writing header")?;

    let mut rows = 0usize;
    for profile in &profiles {
        for (qi, &(quarter, year)) in QUARTERS.iter().enumerate() {
            let rec = quarter_record(profile, quarter, year, qi, &mut rng);
            writer
                .write_record(record_cells(&rec))
                .with_context(|| format!("writing {} {quarter}", profile.id))?;
            rows += 1;
        }
    }
    writer.flush().context("flushing output")?;

    println!(
        "Wrote {rows} records ({} institutions x {} quarters) to {output_path}",
        profiles.len(),
        QUARTERS.len()
    );
    Ok(())
}
