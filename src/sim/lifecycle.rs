//! The per-person annual step: mortality, aging, education transitions,
//! employment churn, childbirth, income indexation, vehicle turnover, and
//! commute choice, in that order for every resident.

use rand::{Rng, RngCore};

use crate::id::EmployerId;
use crate::model::metrics::{VehicleEvent, VehicleEventKind};
use crate::model::person::{
    CommutePurpose, EducationStage, EmploymentStatus, MaritalStatus, Person, Sex, Vehicle,
    age_bracket, commute_bracket,
};
use crate::model::state::SimState;
use crate::pools::Pool;
use crate::sim::context::TickContext;
use crate::sim::system::SimSystem;
use crate::sim::weighted_pick;

/// Share of the employed laid off each year.
const LAYOFF_RATE: f64 = 0.05;

pub struct LifecycleSystem;

impl SimSystem for LifecycleSystem {
    fn name(&self) -> &str {
        "lifecycle"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        // Snapshot the ids first: people born this tick take their first
        // step next year.
        let ids: Vec<_> = ctx.state.population.keys().copied().collect();
        for id in ids {
            let Some(mut person) = ctx.state.population.remove(&id) else {
                continue;
            };
            if step_person(&mut person, ctx.state, ctx.rng) {
                ctx.state.population.insert(id, person);
            } else {
                handle_death(person, ctx.state);
            }
        }
    }
}

/// Advance one person a year. Returns false when they die; a dead person is
/// not reinserted and [`handle_death`] settles what they leave behind.
fn step_person(person: &mut Person, state: &mut SimState, rng: &mut dyn RngCore) -> bool {
    let death_table = match person.sex {
        Sex::Male => &state.tables.demographics.death_male,
        Sex::Female => &state.tables.demographics.death_female,
    };
    let death_prob = death_table[age_bracket(person.age)]
        * state.modifiers.forecast.death
        * state.modifiers.event.death;
    if rng.random_range(0.0..1.0) < death_prob {
        return false;
    }

    person.age += 1;
    if let Some(years) = person.years_married.as_mut() {
        *years += 1;
    }

    advance_education(person, state.modifiers.event.dropout_prob, rng);
    update_employment(person, state, rng);
    maybe_give_birth(person, state, rng);

    if person.annual_income > 0.0 {
        person.annual_income *= 1.0 + state.modifiers.econ.salary_inflation;
    }

    age_vehicles(person, state);
    maybe_buy_vehicle(person, state, rng);
    update_commute(person, state, rng);
    true
}

/// One education transition per year. Scenario-driven dropouts preempt the
/// ladder; otherwise enrolled students accrue a year first and the ladder
/// moves whoever crossed a threshold.
fn advance_education(person: &mut Person, dropout_prob: f64, rng: &mut dyn RngCore) {
    use EducationStage::*;

    if matches!(person.education, HighSchool | University)
        && rng.random_range(0.0..1.0) < dropout_prob
    {
        person.education = if person.education == HighSchool {
            HighSchoolDropout
        } else {
            UniversityDropout
        };
        person.year_in_level = 0;
        return;
    }

    let current = person.education;
    if current.is_enrolled() {
        person.year_in_level += 1;
    }

    let start = person.school_start;
    let year = person.year_in_level;
    match current {
        TooYoung if person.age == start.nursery => {
            person.education = Nursery;
            person.year_in_level = 1;
        }
        Nursery if year > 2 => {
            person.education = Elementary;
            person.year_in_level = 1;
        }
        Elementary if year > 5 => {
            person.education = Middle;
            person.year_in_level = 1;
        }
        Middle if year > 3 => {
            person.education = HighSchool;
            person.year_in_level = 1;
        }
        HighSchool if year > 4 => {
            person.education = if rng.random_range(0.0..1.0) < 0.95 {
                HighSchoolCompleted
            } else {
                HighSchoolDropout
            };
            person.year_in_level = 0;
        }
        HighSchoolCompleted if person.age >= start.university() => {
            if rng.random_range(0.0..1.0) < 0.60 {
                person.education = University;
                person.year_in_level = 1;
            }
        }
        University if year > 4 => {
            person.education = if rng.random_range(0.0..1.0) < 0.75 {
                UniversityCompleted
            } else {
                UniversityDropout
            };
            person.year_in_level = 0;
        }
        UniversityCompleted if person.age >= start.masters() => {
            if rng.random_range(0.0..1.0) < 0.10 {
                person.education = Masters;
                person.year_in_level = 1;
            }
        }
        Masters if year > 2 => {
            person.education = if rng.random_range(0.0..1.0) < 0.90 {
                MastersCompleted
            } else {
                MastersDropout
            };
            person.year_in_level = 0;
        }
        MastersCompleted if person.age >= start.phd() => {
            if rng.random_range(0.0..1.0) < 0.05 {
                person.education = Phd;
                person.year_in_level = 1;
            }
        }
        Phd if year > 4 => {
            person.education = PhdCompleted;
            person.year_in_level = 0;
        }
        _ => {}
    }
}

/// Layoffs first, then the job hunt. The two are sequential, so someone laid
/// off this year can land a new position in the same tick.
fn update_employment(person: &mut Person, state: &mut SimState, rng: &mut dyn RngCore) {
    if person.employment == EmploymentStatus::Employed && rng.random_range(0.0..1.0) < LAYOFF_RATE
    {
        person.laid_off_before = true;
        person.employment = EmploymentStatus::Unemployed;
        if let Some(employer) = person.employer.take() {
            if let Some(pool) = state.employers.get_mut(&employer) {
                pool.release(person.id);
            }
        }
        person.clear_employment_income();
    }

    let seeking = matches!(
        person.employment,
        EmploymentStatus::NotInLaborForce | EmploymentStatus::Unemployed
    );
    if seeking && (18..65).contains(&person.age) {
        let chance = state.tables.demographics.job_finding[age_bracket(person.age)]
            * state.modifiers.event.employment;
        if rng.random_range(0.0..1.0) < chance {
            let open: Vec<EmployerId> = state
                .tables
                .employers
                .iter()
                .filter(|spec| {
                    state
                        .employers
                        .get(&spec.id)
                        .is_some_and(|pool| pool.available() > 0)
                })
                .map(|spec| spec.id)
                .collect();
            if open.is_empty() {
                state.metrics.refusals.jobs += 1;
                return;
            }
            let employer = open[rng.random_range(0..open.len())];
            if let Some(pool) = state.employers.get_mut(&employer) {
                pool.try_claim(person.id);
            }
            person.employment = EmploymentStatus::Employed;
            person.employer = Some(employer);
            if let Some(spec) = state.tables.employer(employer) {
                person.assign_employment_income(
                    &spec.income_bands,
                    state.modifiers.event.income,
                    rng,
                );
            }
        }
    }
}

fn maybe_give_birth(mother: &mut Person, state: &mut SimState, rng: &mut dyn RngCore) {
    if mother.sex != Sex::Female || !(15..50).contains(&mother.age) {
        return;
    }
    let table = if mother.marital_status == MaritalStatus::Married {
        &state.tables.demographics.fertility_married
    } else {
        &state.tables.demographics.fertility_unmarried
    };
    let mut prob = table[age_bracket(mother.age)]
        * state.modifiers.forecast.birth
        * state.modifiers.event.birth;
    if matches!(mother.years_married, Some(years) if years <= 10) {
        prob *= 1.5;
    }
    if rng.random_range(0.0..1.0) < prob {
        let sex = if rng.random_bool(0.5) {
            Sex::Male
        } else {
            Sex::Female
        };
        let household = mother.household;
        state.add_person(&Person::newborn_seed(sex), household, rng);
        if let Some(hh) = state.households.get_mut(&household) {
            hh.births += 1;
        }
    }
}

fn age_vehicles(person: &mut Person, state: &mut SimState) {
    if person.vehicles.is_empty() {
        return;
    }
    let year = state.year;
    let owner = person.id;
    let retirement_age = state.tables.vehicles.retirement_age;
    let events = &mut state.metrics.vehicle_events;
    person.vehicles.retain_mut(|car| {
        car.age += 1;
        if car.age > retirement_age {
            events.push(VehicleEvent {
                year,
                kind: VehicleEventKind::Retirement,
                vehicle: car.id,
                owner,
                heir: None,
            });
            false
        } else {
            true
        }
    });
}

/// Carless adults in a household that cleared last year's budget may buy.
/// The ledger income is the previous settlement's figure, so a fresh run
/// sees no purchases in its first tick.
fn maybe_buy_vehicle(person: &mut Person, state: &mut SimState, rng: &mut dyn RngCore) {
    if person.age < 18 || person.owns_vehicle() {
        return;
    }
    let Some(household) = state.households.get(&person.household) else {
        return;
    };
    if household.ledger.income <= state.tables.vehicles.purchase_income_threshold {
        return;
    }
    let prob = if person.employment == EmploymentStatus::Employed {
        state.tables.vehicles.purchase_prob_employed
    } else {
        state.tables.vehicles.purchase_prob_unemployed
    };
    if rng.random_range(0.0..1.0) < prob {
        let id = state.next_vehicle_id();
        person.vehicles.push(Vehicle { id, age: 0 });
        state.metrics.vehicle_events.push(VehicleEvent {
            year: state.year,
            kind: VehicleEventKind::Purchase,
            vehicle: id,
            owner: person.id,
            heir: None,
        });
    }
}

fn update_commute(person: &mut Person, state: &mut SimState, rng: &mut dyn RngCore) {
    let weights = &state.tables.commute.weights[commute_bracket(person.age)];
    if let Some(i) = weighted_pick(weights, rng) {
        person.commute_purpose = CommutePurpose::ALL[i];
    }
    state.metrics.record_trip(person.commute_purpose);
    if person.owns_vehicle() {
        person.use_bus = false;
    }
}

/// Settle what a death leaves behind: the school seat frees up, vehicles go
/// to the oldest adult left in the household (or the scrapyard if there is
/// none), the employer position opens, and the household books the loss.
fn handle_death(person: Person, state: &mut SimState) {
    if person.in_school {
        if let Some(pool) = state.schools.get_mut(&person.education) {
            pool.release(person.id);
        }
    }

    if !person.vehicles.is_empty() {
        let heir = state.households.get(&person.household).and_then(|hh| {
            let mut oldest: Option<(u32, _)> = None;
            for &member in &hh.members {
                if member == person.id {
                    continue;
                }
                if let Some(candidate) = state.population.get(&member) {
                    let beats = oldest.is_none_or(|(age, _)| candidate.age > age);
                    if candidate.is_adult() && beats {
                        oldest = Some((candidate.age, member));
                    }
                }
            }
            oldest.map(|(_, id)| id)
        });
        match heir {
            Some(heir_id) => {
                for car in &person.vehicles {
                    state.metrics.vehicle_events.push(VehicleEvent {
                        year: state.year,
                        kind: VehicleEventKind::Inheritance,
                        vehicle: car.id,
                        owner: person.id,
                        heir: Some(heir_id),
                    });
                }
                if let Some(heir_person) = state.population.get_mut(&heir_id) {
                    heir_person.vehicles.extend(person.vehicles.iter().copied());
                }
            }
            None => {
                for car in &person.vehicles {
                    state.metrics.vehicle_events.push(VehicleEvent {
                        year: state.year,
                        kind: VehicleEventKind::Retirement,
                        vehicle: car.id,
                        owner: person.id,
                        heir: None,
                    });
                }
            }
        }
    }

    if let Some(employer) = person.employer {
        if let Some(pool) = state.employers.get_mut(&employer) {
            pool.release(person.id);
        }
    }

    if let Some(hh) = state.households.get_mut(&person.household) {
        if hh.members.remove(&person.id) {
            hh.deaths += 1;
        }
    }
}
