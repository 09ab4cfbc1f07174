//! The single mutable aggregate every pass works against.

use std::collections::BTreeMap;

use rand::RngCore;

use crate::config::Tables;
use crate::error::SimResult;
use crate::forecast::{Forecaster, Forecasts};
use crate::id::{EmployerId, HouseholdId, IdGenerator, PersonId, VehicleId};
use crate::model::household::{Household, HouseholdKind};
use crate::model::marriage::MarriageRecord;
use crate::model::metrics::TickMetrics;
use crate::model::modifiers::Modifiers;
use crate::model::person::{EducationStage, Person, PersonSeed};
use crate::pools::{CappedFlow, SeatPool, SlotPool};
use crate::scenario::ScenarioEvent;

/// The three annual monetary budgets.
#[derive(Debug, Clone)]
pub struct Caps {
    pub savings: CappedFlow,
    pub loans: CappedFlow,
    pub support: CappedFlow,
}

impl Caps {
    fn reset_year(&mut self) {
        self.savings.reset_year();
        self.loans.reset_year();
        self.support.reset_year();
    }
}

/// Full simulation state. Collections are ordered maps so every pass visits
/// entities in a stable order and runs reproduce bit for bit from a seed.
pub struct SimState {
    /// Calendar year currently being simulated.
    pub year: u32,
    /// Tick counter, 1-based during a tick and 0 before the first.
    pub tick: u32,
    pub tables: Tables,
    pub events: Vec<ScenarioEvent>,
    pub population: BTreeMap<PersonId, Person>,
    pub households: BTreeMap<HouseholdId, Household>,
    pub employers: BTreeMap<EmployerId, SlotPool>,
    pub schools: BTreeMap<EducationStage, SeatPool>,
    pub caps: Caps,
    pub modifiers: Modifiers,
    pub forecasts: Forecasts,
    pub marriages: Vec<MarriageRecord>,
    pub metrics: TickMetrics,
    /// Previous tick's economic score, fed back into immigration. Starts at
    /// the neutral 100.
    pub economic_index: f64,
    person_ids: IdGenerator,
    household_ids: IdGenerator,
    vehicle_ids: IdGenerator,
}

impl SimState {
    /// Validate the tables, fit the forecasts over `horizon_years` ticks,
    /// and set up empty pools and budgets. `rng` primes the economy rates
    /// from the first forecast step so finance has rates even before the
    /// first tick's draws.
    pub fn new(
        tables: Tables,
        events: Vec<ScenarioEvent>,
        forecaster: &dyn Forecaster,
        start_year: u32,
        horizon_years: u32,
        rng: &mut dyn RngCore,
    ) -> SimResult<SimState> {
        tables.validate()?;
        let mut forecasts =
            Forecasts::build(&tables.history, forecaster, horizon_years as usize + 1)?;

        let employers = tables
            .employers
            .iter()
            .map(|e| (e.id, SlotPool::new(e.capacity)))
            .collect();
        let schools = tables
            .education_seats
            .iter()
            .map(|(&stage, &seats)| (stage, SeatPool::new(seats)))
            .collect();
        let caps = Caps {
            savings: CappedFlow::new(tables.bank.savings_annual_cap),
            loans: CappedFlow::new(tables.bank.loans_annual_cap),
            support: CappedFlow::new(tables.government.annual_support_cap),
        };

        let mut modifiers = Modifiers::default();
        modifiers.econ.tax_rate = forecasts.tax.sample(0, rng);
        modifiers.econ.salary_inflation = forecasts.salary.sample(0, rng);
        modifiers.econ.cpi_inflation = forecasts.cpi.sample(0, rng);

        Ok(SimState {
            year: start_year,
            tick: 0,
            tables,
            events,
            population: BTreeMap::new(),
            households: BTreeMap::new(),
            employers,
            schools,
            caps,
            modifiers,
            forecasts,
            marriages: Vec::new(),
            metrics: TickMetrics::default(),
            economic_index: 100.0,
            person_ids: IdGenerator::new(),
            household_ids: IdGenerator::new(),
            vehicle_ids: IdGenerator::new(),
        })
    }

    pub fn next_person_id(&mut self) -> PersonId {
        PersonId(self.person_ids.next_id())
    }

    pub fn next_household_id(&mut self) -> HouseholdId {
        HouseholdId(self.household_ids.next_id())
    }

    pub fn next_vehicle_id(&mut self) -> VehicleId {
        VehicleId(self.vehicle_ids.next_id())
    }

    /// Create an empty household.
    pub fn add_household(&mut self, kind: HouseholdKind) -> HouseholdId {
        let id = self.next_household_id();
        self.households.insert(id, Household::new(id, kind));
        id
    }

    /// Create a person from a seed and register them as a member of
    /// `household`. A stale household reference leaves the person registered
    /// but unattached.
    pub fn add_person(
        &mut self,
        seed: &PersonSeed,
        household: HouseholdId,
        rng: &mut dyn RngCore,
    ) -> PersonId {
        let id = self.next_person_id();
        let person = Person::from_seed(id, seed, household, rng);
        if let Some(hh) = self.households.get_mut(&household) {
            hh.members.insert(id);
        }
        self.population.insert(id, person);
        id
    }

    /// Move a person between households, detaching the old membership first
    /// so nobody is ever listed in two households.
    pub fn move_to_household(&mut self, person: PersonId, to: HouseholdId) {
        let Some(p) = self.population.get_mut(&person) else {
            return;
        };
        let from = p.household;
        p.household = to;
        if let Some(old) = self.households.get_mut(&from) {
            old.members.remove(&person);
        }
        if let Some(new) = self.households.get_mut(&to) {
            new.members.insert(person);
        }
    }

    pub fn household_of(&self, person: PersonId) -> Option<&Household> {
        let p = self.population.get(&person)?;
        self.households.get(&p.household)
    }

    /// Close out a tick: clear per-year counters and metrics, restart the
    /// annual budgets.
    pub fn end_tick_reset(&mut self) {
        self.metrics.reset(self.marriages.len());
        for household in self.households.values_mut() {
            household.reset_tick_counters();
        }
        self.caps.reset_year();
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::forecast::DriftForecaster;
    use crate::model::person::{EmploymentStatus, MaritalStatus, Sex};
    use crate::pools::Pool;

    fn fresh_state() -> SimState {
        let mut rng = SmallRng::seed_from_u64(1);
        SimState::new(
            Tables::default(),
            Vec::new(),
            &DriftForecaster,
            2024,
            10,
            &mut rng,
        )
        .unwrap()
    }

    fn adult_seed() -> PersonSeed {
        PersonSeed {
            age: 30,
            sex: Sex::Female,
            education: EducationStage::HighSchoolCompleted,
            marital_status: MaritalStatus::NeverMarried,
            employment: EmploymentStatus::Unemployed,
        }
    }

    #[test]
    fn pools_match_table_capacities() {
        let state = fresh_state();
        assert_eq!(state.employers.len(), 6);
        assert_eq!(state.schools.len(), 7);
        assert_eq!(
            state.schools[&EducationStage::University].capacity(),
            14_700
        );
        assert_eq!(state.caps.support.cap(), 200_000_000.0);
    }

    #[test]
    fn economy_rates_primed_before_first_tick() {
        let state = fresh_state();
        // Tax forecast extends a series around 37 percent.
        assert!(state.modifiers.econ.tax_rate > 0.2);
        assert!(state.modifiers.econ.tax_rate < 0.6);
        assert_eq!(state.tick, 0);
        assert_eq!(state.year, 2024);
    }

    #[test]
    fn add_person_registers_household_membership() {
        let mut state = fresh_state();
        let mut rng = SmallRng::seed_from_u64(2);
        let hh = state.add_household(HouseholdKind::Nonfamily);
        let id = state.add_person(&adult_seed(), hh, &mut rng);
        assert!(state.households[&hh].members.contains(&id));
        assert_eq!(state.population[&id].household, hh);
    }

    #[test]
    fn move_detaches_old_membership() {
        let mut state = fresh_state();
        let mut rng = SmallRng::seed_from_u64(3);
        let a = state.add_household(HouseholdKind::Nonfamily);
        let b = state.add_household(HouseholdKind::MarriedCouple);
        let id = state.add_person(&adult_seed(), a, &mut rng);

        state.move_to_household(id, b);
        assert!(!state.households[&a].members.contains(&id));
        assert!(state.households[&b].members.contains(&id));
        assert_eq!(state.population[&id].household, b);
    }

    #[test]
    fn tick_reset_restores_budgets_and_counters() {
        let mut state = fresh_state();
        let mut rng = SmallRng::seed_from_u64(4);
        let hh = state.add_household(HouseholdKind::Nonfamily);
        state.add_person(&adult_seed(), hh, &mut rng);
        state.households.get_mut(&hh).unwrap().births = 2;
        assert!(state.caps.support.try_accept(5_000.0));
        state
            .metrics
            .record_trip(crate::model::person::CommutePurpose::Work);

        state.end_tick_reset();
        assert_eq!(state.households[&hh].births, 0);
        assert_eq!(state.caps.support.accepted(), 0.0);
        assert!(state.metrics.trips.is_empty());
    }
}
