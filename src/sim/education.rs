//! Annual school seat reallocation. Seats are not tenure: every tick wipes
//! the pools and the whole student body re-applies, stage by stage, in a
//! shuffled order so scarce seats rotate fairly.

use rand::seq::SliceRandom;

use crate::id::PersonId;
use crate::model::metrics::SeatStats;
use crate::model::person::EducationStage;
use crate::sim::context::TickContext;
use crate::sim::system::SimSystem;

pub struct EducationSystem;

impl SimSystem for EducationSystem {
    fn name(&self) -> &str {
        "education"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let state = &mut *ctx.state;

        for pool in state.schools.values_mut() {
            pool.reset();
        }
        for person in state.population.values_mut() {
            person.in_school = false;
        }

        let stages: Vec<EducationStage> = state.schools.keys().copied().collect();
        for stage in stages {
            let mut eligible: Vec<PersonId> = state
                .population
                .values()
                .filter(|p| p.education == stage)
                .map(|p| p.id)
                .collect();
            eligible.shuffle(ctx.rng);

            let mut seated = 0u32;
            for &id in &eligible {
                let granted = state
                    .schools
                    .get_mut(&stage)
                    .is_some_and(|pool| pool.try_grant(id));
                if granted {
                    if let Some(person) = state.population.get_mut(&id) {
                        person.in_school = true;
                    }
                    seated += 1;
                }
            }

            let eligible_count = eligible.len() as u32;
            state.metrics.education.insert(
                stage,
                SeatStats {
                    eligible: eligible_count,
                    seated,
                    turned_away: eligible_count - seated,
                },
            );
        }
    }
}
