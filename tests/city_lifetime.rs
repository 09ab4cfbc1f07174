use rand::SeedableRng;
use rand::rngs::SmallRng;

use micropop::config::Tables;
use micropop::forecast::DriftForecaster;
use micropop::model::{EmploymentStatus, HouseholdKind, Sex, SimState};
use micropop::observer::NoopObserver;
use micropop::setup::{PopulationInput, init_state};
use micropop::sim::{SimConfig, default_systems, run};
use micropop::testutil::{adult, child, married_adult};

const FOUNDING_PERSONS: u64 = 240;

/// Seed a mid-sized town and let it run for `num_years`. Founding persons
/// hold ids 1 through [`FOUNDING_PERSONS`]; anyone above that was born or
/// moved in during the run.
fn settle_and_run(seed: u64, num_years: u32) -> SimState {
    let mut persons = Vec::new();
    for i in 0..80u32 {
        let sex = if i % 2 == 0 { Sex::Male } else { Sex::Female };
        persons.push(adult(22 + i % 40, sex));
    }
    for i in 0..60u32 {
        let sex = if i % 2 == 0 { Sex::Male } else { Sex::Female };
        persons.push(married_adult(25 + i % 30, sex));
    }
    for i in 0..40u32 {
        let sex = if i % 2 == 0 { Sex::Female } else { Sex::Male };
        let mut seed = adult(30 + i % 25, sex);
        seed.employment = EmploymentStatus::Employed;
        persons.push(seed);
    }
    for i in 0..60u32 {
        persons.push(child(i % 3));
    }
    assert_eq!(persons.len() as u64, FOUNDING_PERSONS);

    let input = PopulationInput {
        persons,
        households: vec![
            (HouseholdKind::MarriedCouple, 40),
            (HouseholdKind::MaleHouseholder, 20),
            (HouseholdKind::FemaleHouseholder, 20),
            (HouseholdKind::Nonfamily, 30),
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
    run(
        &mut state,
        &mut default_systems(),
        &mut NoopObserver,
        SimConfig::new(2024, num_years, seed),
    )
    .expect("long run");
    state
}

#[test]
fn generations_turn_over() {
    let state = settle_and_run(42, 30);

    assert!(!state.population.is_empty(), "the town should outlive its founders");

    let newcomers = state
        .population
        .keys()
        .filter(|id| id.0 > FOUNDING_PERSONS)
        .count();
    assert!(newcomers > 0, "expected births or arrivals over 30 years");

    let founders_left = state
        .population
        .keys()
        .filter(|id| id.0 <= FOUNDING_PERSONS)
        .count();
    assert!(
        (founders_left as u64) < FOUNDING_PERSONS,
        "expected at least one founder death over 30 years"
    );
}

#[test]
fn weddings_fill_the_registry() {
    let state = settle_and_run(42, 30);

    assert!(
        !state.marriages.is_empty(),
        "expected weddings among 80 singles over 30 years"
    );
    for record in &state.marriages {
        assert_ne!(record.husband, record.wife, "self-marriage recorded");
        assert!(
            record.husband_age >= 22,
            "groom below marrying age in {}",
            record.year
        );
        assert!(
            record.husband_age.abs_diff(record.wife_age) <= 5,
            "couple outside the courting age gap in {}",
            record.year
        );
        assert_ne!(
            record.husband_former_household, record.household,
            "groom never moved out"
        );
        assert_ne!(
            record.wife_former_household, record.household,
            "bride never moved out"
        );
        let home = state
            .households
            .get(&record.household)
            .unwrap_or_else(|| panic!("marriage household {} vanished", record.household));
        assert_eq!(home.kind, HouseholdKind::MarriedCouple);
    }
}

#[test]
fn classrooms_fill_with_the_towns_children() {
    let state = settle_and_run(42, 30);

    let enrolled = state.population.values().filter(|p| p.in_school).count();
    assert!(enrolled > 0, "expected students after 30 years of births");

    for (id, person) in &state.population {
        if !person.in_school {
            continue;
        }
        assert!(
            person.education.is_enrolled(),
            "person {id} attends school at stage {:?}",
            person.education
        );
        let seated = state
            .schools
            .get(&person.education)
            .is_some_and(|pool| pool.holds(*id));
        assert!(seated, "student {id} has no seat at {:?}", person.education);
    }
}

#[test]
fn work_and_wheels_emerge() {
    let state = settle_and_run(42, 30);

    let employed = state
        .population
        .values()
        .filter(|p| p.employment == EmploymentStatus::Employed)
        .count();
    assert!(employed > 0, "expected a standing workforce");

    let vehicles: usize = state.population.values().map(|p| p.vehicles.len()).sum();
    assert!(vehicles > 0, "expected households to buy cars over 30 years");

    let taxes: f64 = state
        .households
        .values()
        .map(|h| h.ledger.taxes_total)
        .sum();
    assert!(taxes > 0.0, "expected lifetime tax collections");
}
