use rand::SeedableRng;
use rand::rngs::SmallRng;

use micropop::config::Tables;
use micropop::forecast::DriftForecaster;
use micropop::model::{
    EducationStage, EmploymentStatus, HouseholdKind, MaritalStatus, PersonSeed, Sex, SimState,
};
use micropop::observer::{NoopObserver, ScoringObserver};
use micropop::pools::Pool;
use micropop::setup::{PopulationInput, init_state};
use micropop::sim::{SimConfig, default_systems, run};
use micropop::testutil::{adult, assert_approx, assert_deterministic, child, married_adult};

/// A small mixed town: singles looking for work, married couples, a
/// salaried cohort, and young children spread across household kinds.
fn founding_population() -> PopulationInput {
    let mut persons = Vec::new();
    for i in 0..40u32 {
        let sex = if i % 2 == 0 { Sex::Male } else { Sex::Female };
        persons.push(adult(22 + i % 40, sex));
    }
    for i in 0..30u32 {
        let sex = if i % 2 == 0 { Sex::Male } else { Sex::Female };
        persons.push(married_adult(25 + i % 30, sex));
    }
    for i in 0..20u32 {
        let sex = if i % 2 == 0 { Sex::Female } else { Sex::Male };
        persons.push(PersonSeed {
            age: 30 + i % 25,
            sex,
            education: if i % 3 == 0 {
                EducationStage::UniversityCompleted
            } else {
                EducationStage::HighSchoolCompleted
            },
            marital_status: MaritalStatus::NeverMarried,
            employment: EmploymentStatus::Employed,
        });
    }
    for i in 0..20u32 {
        persons.push(child(i % 3));
    }
    PopulationInput {
        persons,
        households: vec![
            (HouseholdKind::MarriedCouple, 18),
            (HouseholdKind::MaleHouseholder, 8),
            (HouseholdKind::FemaleHouseholder, 8),
            (HouseholdKind::Nonfamily, 12),
        ],
    }
}

fn seeded_city(seed: u64) -> SimState {
    let mut rng = SmallRng::seed_from_u64(seed);
    init_state(
        Tables::default(),
        Vec::new(),
        &founding_population(),
        &DriftForecaster,
        2024,
        60,
        &mut rng,
    )
    .expect("city setup from default tables")
}

#[test]
fn same_seed_runs_are_identical() {
    let mut first = seeded_city(7);
    let mut second = seeded_city(7);

    run(
        &mut first,
        &mut default_systems(),
        &mut NoopObserver,
        SimConfig::new(2024, 8, 7),
    )
    .expect("first run");
    run(
        &mut second,
        &mut default_systems(),
        &mut NoopObserver,
        SimConfig::new(2024, 8, 7),
    )
    .expect("second run");

    assert_deterministic(&first, &second);
}

#[test]
fn different_seeds_tell_different_stories() {
    let mut first = seeded_city(7);
    let mut second = seeded_city(8);

    let mut scores_a = ScoringObserver::new();
    let mut scores_b = ScoringObserver::new();
    run(
        &mut first,
        &mut default_systems(),
        &mut scores_a,
        SimConfig::new(2024, 8, 7),
    )
    .expect("first run");
    run(
        &mut second,
        &mut default_systems(),
        &mut scores_b,
        SimConfig::new(2024, 8, 8),
    )
    .expect("second run");

    let economic_a: Vec<f64> = scores_a.scores.iter().map(|s| s.economic_index).collect();
    let economic_b: Vec<f64> = scores_b.scores.iter().map(|s| s.economic_index).collect();
    assert_ne!(
        economic_a, economic_b,
        "independent seeds should not produce identical score histories"
    );
}

#[test]
fn scoring_observer_records_every_year() {
    let mut state = seeded_city(11);
    let mut observer = ScoringObserver::new();

    run(
        &mut state,
        &mut default_systems(),
        &mut observer,
        SimConfig::new(2024, 10, 11),
    )
    .expect("scored run");

    assert_eq!(observer.scores.len(), 10, "one score row per year");
    for (offset, score) in observer.scores.iter().enumerate() {
        assert_eq!(score.year, 2024 + offset as u32);
        assert!(
            (0.0..=100.0).contains(&score.economic_index),
            "economic index out of range in {}: {}",
            score.year,
            score.economic_index
        );
        assert!(
            (0.0..=100.0).contains(&score.transport_index),
            "transport index out of range in {}: {}",
            score.year,
            score.transport_index
        );
    }

    let last = observer.scores.last().expect("at least one score");
    assert_approx(
        state.economic_index,
        last.economic_index,
        1e-9,
        "final economic score feeds back into the state",
    );
}

#[test]
fn the_clock_lands_on_the_final_year() {
    let mut state = seeded_city(3);

    run(
        &mut state,
        &mut default_systems(),
        &mut NoopObserver,
        SimConfig::new(2024, 5, 3),
    )
    .expect("five year run");

    assert_eq!(state.year, 2028);
    assert_eq!(state.tick, 5);
    assert!(!state.population.is_empty(), "the town should survive five years");
}

#[test]
fn rosters_stay_consistent_after_a_decade() {
    let mut state = seeded_city(19);

    run(
        &mut state,
        &mut default_systems(),
        &mut NoopObserver,
        SimConfig::new(2024, 10, 19),
    )
    .expect("ten year run");

    // Person -> household and household -> person always agree.
    for (id, person) in &state.population {
        let home = state
            .households
            .get(&person.household)
            .unwrap_or_else(|| panic!("person {id} points at a missing household"));
        assert!(
            home.members.contains(id),
            "person {id} missing from the roster of household {}",
            person.household
        );
    }
    for (hid, household) in &state.households {
        for member in &household.members {
            let person = state
                .population
                .get(member)
                .unwrap_or_else(|| panic!("household {hid} lists departed member {member}"));
            assert_eq!(
                person.household, *hid,
                "member {member} thinks they live elsewhere"
            );
        }
    }

    // Every job slot claimed matches exactly one employed person.
    let claimed: u32 = state.employers.values().map(|pool| pool.claimed()).sum();
    let employed = state
        .population
        .values()
        .filter(|p| p.employment == EmploymentStatus::Employed)
        .count() as u32;
    assert_eq!(claimed, employed, "employer slots out of sync with payrolls");
    for (id, person) in &state.population {
        match person.employment {
            EmploymentStatus::Employed => assert!(
                person.employer.is_some(),
                "employed person {id} has no employer"
            ),
            _ => assert!(
                person.employer.is_none(),
                "person {id} kept an employer after leaving work"
            ),
        }
    }

    // No vehicle is registered to two owners.
    let mut seen = std::collections::BTreeSet::new();
    let mut total = 0usize;
    for person in state.population.values() {
        for vehicle in &person.vehicles {
            seen.insert(vehicle.id);
            total += 1;
        }
    }
    assert_eq!(seen.len(), total, "duplicate vehicle registrations");
}

#[test]
fn annual_budgets_reset_between_years() {
    let mut state = seeded_city(5);

    run(
        &mut state,
        &mut default_systems(),
        &mut NoopObserver,
        SimConfig::new(2024, 4, 5),
    )
    .expect("four year run");

    // The runner closes out the last tick, so the annual windows are fresh.
    assert_eq!(state.caps.savings.accepted(), 0.0);
    assert_eq!(state.caps.loans.accepted(), 0.0);
    assert_eq!(state.caps.support.accepted(), 0.0);
    assert!(state.metrics.trips.is_empty(), "trip counters should be cleared");
    assert_eq!(state.metrics.traffic.accidents, 0);
    assert_eq!(state.metrics.marriage_mark, state.marriages.len());
    for (id, household) in &state.households {
        assert_eq!(household.births, 0, "household {id} kept a birth counter");
        assert_eq!(household.deaths, 0, "household {id} kept a death counter");
        assert_eq!(household.marriages, 0, "household {id} kept a marriage counter");
    }
}
