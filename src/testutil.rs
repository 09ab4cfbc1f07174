use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::Tables;
use crate::forecast::DriftForecaster;
use crate::id::{HouseholdId, PersonId};
use crate::model::{
    EducationStage, EmploymentStatus, HouseholdKind, MaritalStatus, PersonSeed, Sex, SimState,
};
use crate::scenario::ScenarioEvent;
use crate::sim::{SimSystem, TickContext};

// ---------------------------------------------------------------------------
// Tick execution helpers
// ---------------------------------------------------------------------------

/// Run a single system tick against `state` in the given year, with a fresh
/// seeded RNG so the test controls its own randomness.
pub fn tick_system(state: &mut SimState, system: &mut dyn SimSystem, year: u32, seed: u64) {
    state.year = year;
    state.tick += 1;
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut ctx = TickContext {
        state,
        rng: &mut rng,
    };
    system.tick(&mut ctx);
}

// ---------------------------------------------------------------------------
// State construction
// ---------------------------------------------------------------------------

/// Builds a small city piece by piece on top of the default tables.
/// Construction draws come from a fixed seed, so two builders issuing the
/// same calls produce identical states.
pub struct StateBuilder {
    state: SimState,
    rng: SmallRng,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self::with_tables(Tables::default())
    }

    pub fn with_tables(tables: Tables) -> Self {
        let mut rng = SmallRng::seed_from_u64(0xBEEF);
        let state = SimState::new(tables, Vec::new(), &DriftForecaster, 2024, 40, &mut rng)
            .expect("state construction from test tables");
        Self { state, rng }
    }

    pub fn events(mut self, events: Vec<ScenarioEvent>) -> Self {
        self.state.events = events;
        self
    }

    pub fn household(&mut self, kind: HouseholdKind) -> HouseholdId {
        self.state.add_household(kind)
    }

    pub fn person(&mut self, seed: &PersonSeed, household: HouseholdId) -> PersonId {
        self.state.add_person(seed, household, &mut self.rng)
    }

    pub fn build(self) -> SimState {
        self.state
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Person seeds
// ---------------------------------------------------------------------------

/// A never-married high-school graduate looking for work.
pub fn adult(age: u32, sex: Sex) -> PersonSeed {
    PersonSeed {
        age,
        sex,
        education: EducationStage::HighSchoolCompleted,
        marital_status: MaritalStatus::NeverMarried,
        employment: EmploymentStatus::Unemployed,
    }
}

/// Like [`adult`] but already married.
pub fn married_adult(age: u32, sex: Sex) -> PersonSeed {
    PersonSeed {
        age,
        sex,
        education: EducationStage::HighSchoolCompleted,
        marital_status: MaritalStatus::Married,
        employment: EmploymentStatus::Unemployed,
    }
}

/// A child below school age and working age.
pub fn child(age: u32) -> PersonSeed {
    PersonSeed {
        age,
        sex: Sex::Male,
        education: EducationStage::TooYoung,
        marital_status: MaritalStatus::NeverMarried,
        employment: EmploymentStatus::TooYoung,
    }
}

// ---------------------------------------------------------------------------
// Assertion helpers
// ---------------------------------------------------------------------------

/// Assert a float is approximately equal, with a named context message.
pub fn assert_approx(actual: f64, expected: f64, tolerance: f64, msg: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{msg}: expected ~{expected} (+-{tolerance}), got {actual}"
    );
}

/// Assert two states produced from the same seed are structurally identical.
pub fn assert_deterministic(state1: &SimState, state2: &SimState) {
    assert_eq!(
        state1.population.len(),
        state2.population.len(),
        "population count mismatch: {} vs {}",
        state1.population.len(),
        state2.population.len()
    );
    assert_eq!(
        state1.households.len(),
        state2.households.len(),
        "household count mismatch: {} vs {}",
        state1.households.len(),
        state2.households.len()
    );
    assert_eq!(
        state1.marriages.len(),
        state2.marriages.len(),
        "marriage count mismatch: {} vs {}",
        state1.marriages.len(),
        state2.marriages.len()
    );

    // Compare person-level detail for a stronger determinism check.
    for (id, p1) in &state1.population {
        let p2 = state2
            .population
            .get(id)
            .unwrap_or_else(|| panic!("person {id} missing from second run"));
        assert_eq!(p1.age, p2.age, "age mismatch for person {id}");
        assert_eq!(p1.education, p2.education, "education mismatch for person {id}");
        assert_eq!(
            p1.employment, p2.employment,
            "employment mismatch for person {id}"
        );
        assert_eq!(
            p1.marital_status, p2.marital_status,
            "marital status mismatch for person {id}"
        );
        assert_eq!(
            p1.vehicles.len(),
            p2.vehicles.len(),
            "vehicle count mismatch for person {id}"
        );
        assert_eq!(
            p1.household, p2.household,
            "household mismatch for person {id}"
        );
    }
}
