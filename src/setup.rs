//! Start-of-run population loading.
//!
//! A collaborator supplies the seed tuples and the household mix; this
//! module turns them into a ready [`SimState`]: households first, persons
//! scattered uniformly across them, and the seeded workforce claiming
//! employer positions by the calibrated weights.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::config::Tables;
use crate::error::{SimError, SimResult};
use crate::forecast::Forecaster;
use crate::id::PersonId;
use crate::model::household::HouseholdKind;
use crate::model::person::{EmploymentStatus, PersonSeed};
use crate::model::state::SimState;
use crate::pools::Pool;
use crate::scenario::ScenarioEvent;
use crate::sim::weighted_pick;

/// Seed population: one tuple per person plus household counts by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopulationInput {
    pub persons: Vec<PersonSeed>,
    pub households: Vec<(HouseholdKind, u32)>,
}

/// Build the initial state from tables, scenario events, and a seed
/// population. `horizon_years` is the number of ticks the run will take;
/// the forecasts are fitted once here to cover it.
pub fn init_state(
    tables: Tables,
    events: Vec<ScenarioEvent>,
    input: &PopulationInput,
    forecaster: &dyn Forecaster,
    start_year: u32,
    horizon_years: u32,
    rng: &mut dyn RngCore,
) -> SimResult<SimState> {
    let mut state = SimState::new(tables, events, forecaster, start_year, horizon_years, rng)?;

    let mut household_ids = Vec::new();
    for &(kind, count) in &input.households {
        for _ in 0..count {
            household_ids.push(state.add_household(kind));
        }
    }
    if !input.persons.is_empty() && household_ids.is_empty() {
        return Err(SimError::Config(
            "population seeds provided without any households".into(),
        ));
    }

    for seed in &input.persons {
        let household = household_ids[rng.random_range(0..household_ids.len())];
        state.add_person(seed, household, rng);
    }

    assign_seed_workforce(&mut state, rng);
    Ok(state)
}

/// Hand every seeded worker a position at an employer with spare capacity,
/// weighted by the calibrated seed weights. Workers left over once every
/// employer is full fall back to unemployed.
fn assign_seed_workforce(state: &mut SimState, rng: &mut dyn RngCore) {
    let employed: Vec<PersonId> = state
        .population
        .iter()
        .filter(|(_, p)| p.employment == EmploymentStatus::Employed)
        .map(|(&id, _)| id)
        .collect();

    for id in employed {
        let open: Vec<usize> = state
            .tables
            .employers
            .iter()
            .enumerate()
            .filter(|(_, spec)| {
                state
                    .employers
                    .get(&spec.id)
                    .is_some_and(|pool| pool.available() > 0)
            })
            .map(|(i, _)| i)
            .collect();
        let weights: Vec<f64> = open
            .iter()
            .map(|&i| state.tables.employers[i].seed_weight)
            .collect();

        let Some(pick) = weighted_pick(&weights, rng) else {
            if let Some(person) = state.population.get_mut(&id) {
                person.employment = EmploymentStatus::Unemployed;
            }
            continue;
        };
        let spec = &state.tables.employers[open[pick]];
        if let Some(pool) = state.employers.get_mut(&spec.id) {
            pool.try_claim(id);
        }
        if let Some(person) = state.population.get_mut(&id) {
            person.employer = Some(spec.id);
            person.assign_employment_income(&spec.income_bands, 1.0, rng);
        }
    }
}
