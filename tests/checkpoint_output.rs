use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use micropop::config::Tables;
use micropop::forecast::DriftForecaster;
use micropop::model::{HouseholdKind, MarriageRecord, Sex, SimState};
use micropop::observer::ScoringObserver;
use micropop::setup::{PopulationInput, init_state};
use micropop::sim::{SimConfig, default_systems, run};
use micropop::snapshot::{HouseholdRow, PersonRow, SummaryRow};
use micropop::testutil::{adult, child, married_adult};

fn run_with_checkpoints(dir: &Path, seed: u64, num_years: u32, interval: u32) -> SimState {
    let mut persons = Vec::new();
    for i in 0..30u32 {
        let sex = if i % 2 == 0 { Sex::Male } else { Sex::Female };
        persons.push(adult(22 + i % 35, sex));
    }
    for i in 0..20u32 {
        let sex = if i % 2 == 0 { Sex::Male } else { Sex::Female };
        persons.push(married_adult(25 + i % 25, sex));
    }
    for i in 0..10u32 {
        persons.push(child(i % 3));
    }
    let input = PopulationInput {
        persons,
        households: vec![
            (HouseholdKind::MarriedCouple, 12),
            (HouseholdKind::MaleHouseholder, 6),
            (HouseholdKind::FemaleHouseholder, 6),
            (HouseholdKind::Nonfamily, 8),
        ],
    };

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut state = init_state(
        Tables::default(),
        Vec::new(),
        &input,
        &DriftForecaster,
        2024,
        num_years,
        &mut rng,
    )
    .expect("town setup");

    let mut config = SimConfig::new(2024, num_years, seed);
    config.flush_interval = Some(interval);
    config.output_dir = Some(dir.to_path_buf());
    run(
        &mut state,
        &mut default_systems(),
        &mut ScoringObserver::new(),
        config,
    )
    .expect("checkpointed run");
    state
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("reading {}: {e}", path.display()))
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn checkpoints_land_on_the_flush_years() {
    let dir = tempfile::tempdir().expect("temp dir");
    run_with_checkpoints(dir.path(), 21, 6, 2);

    for year in [2025, 2027, 2029] {
        let checkpoint = dir.path().join(format!("year_{year:06}"));
        assert!(checkpoint.is_dir(), "missing checkpoint for {year}");
        for file in [
            "persons.jsonl",
            "households.jsonl",
            "marriages.jsonl",
            "summary.jsonl",
        ] {
            assert!(
                checkpoint.join(file).is_file(),
                "checkpoint {year} missing {file}"
            );
        }
    }
    for year in [2024, 2026, 2028] {
        let checkpoint = dir.path().join(format!("year_{year:06}"));
        assert!(!checkpoint.exists(), "unexpected checkpoint for {year}");
    }
}

#[test]
fn final_checkpoint_mirrors_the_state() {
    let dir = tempfile::tempdir().expect("temp dir");
    let state = run_with_checkpoints(dir.path(), 9, 6, 2);
    let last = dir.path().join("year_002029");

    let person_lines = read_lines(&last.join("persons.jsonl"));
    assert_eq!(person_lines.len(), state.population.len());
    for line in &person_lines {
        let row: PersonRow = serde_json::from_str(line).expect("person row parses");
        assert_eq!(row.year, 2029);
        assert!(
            state.population.contains_key(&row.id),
            "checkpoint lists unknown person {}",
            row.id
        );
    }

    let occupied = state
        .households
        .values()
        .filter(|h| !h.members.is_empty())
        .count();
    let household_lines = read_lines(&last.join("households.jsonl"));
    assert_eq!(
        household_lines.len(),
        occupied,
        "only occupied households belong in the checkpoint"
    );
    for line in &household_lines {
        let row: HouseholdRow = serde_json::from_str(line).expect("household row parses");
        assert!(row.members > 0, "household {} written while empty", row.id);
    }

    let marriage_lines = read_lines(&last.join("marriages.jsonl"));
    assert_eq!(marriage_lines.len(), state.marriages.len());
    for (line, record) in marriage_lines.iter().zip(&state.marriages) {
        let row: MarriageRecord = serde_json::from_str(line).expect("marriage row parses");
        assert_eq!(row.year, record.year);
        assert_eq!(row.husband, record.husband);
        assert_eq!(row.wife, record.wife);
    }
}

#[test]
fn summaries_accumulate_across_checkpoints() {
    let dir = tempfile::tempdir().expect("temp dir");
    let state = run_with_checkpoints(dir.path(), 33, 6, 2);

    for (year, expected_rows) in [(2025, 2usize), (2027, 4), (2029, 6)] {
        let path = dir.path().join(format!("year_{year:06}")).join("summary.jsonl");
        let lines = read_lines(&path);
        assert_eq!(
            lines.len(),
            expected_rows,
            "summary at {year} should cover every year so far"
        );
        for (offset, line) in lines.iter().enumerate() {
            let row: SummaryRow = serde_json::from_str(line).expect("summary row parses");
            assert_eq!(row.year, 2024 + offset as u32, "summary years out of order");
        }
    }

    let final_summary = read_lines(&dir.path().join("year_002029").join("summary.jsonl"));
    let last: SummaryRow =
        serde_json::from_str(final_summary.last().expect("final row")).expect("summary row parses");
    assert_eq!(last.year, 2029);
    assert_eq!(last.population as usize, state.population.len());
    assert_eq!(last.households as usize, state.households.len());
}
