use rand::Rng;

use super::context::TickContext;
use super::system::SimSystem;
use super::weighted_pick;
use crate::model::{EmploymentStatus, HouseholdKind, MaritalStatus, PersonSeed, Sex};

/// Economic index at which immigration runs at exactly the base rate.
const NEUTRAL_INDEX: f64 = 50.0;

/// Adds working-age arrivals in proportion to population, scaled by how
/// the city scored economically last year. Each arrival starts jobless in
/// a fresh one-person household.
pub struct ImmigrationSystem;

impl SimSystem for ImmigrationSystem {
    fn name(&self) -> &str {
        "immigration"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let tables = ctx.state.tables.immigration.clone();
        let base = (ctx.state.population.len() as f64 * tables.base_annual_rate) as u32;
        let multiplier = (ctx.state.economic_index / NEUTRAL_INDEX).max(0.0);
        let arrivals = (f64::from(base) * multiplier) as u32;
        if arrivals > 0 {
            tracing::debug!(
                year = ctx.state.year,
                arrivals,
                "immigration intake this year"
            );
        }

        let weights: Vec<f64> = tables.education_mix.iter().map(|(_, w)| *w).collect();
        for _ in 0..arrivals {
            let age = ctx.rng.random_range(tables.min_age..=tables.max_age);
            let education = match weighted_pick(&weights, ctx.rng) {
                Some(i) => tables.education_mix[i].0,
                None => continue,
            };
            let sex = if ctx.rng.random_bool(0.5) {
                Sex::Male
            } else {
                Sex::Female
            };
            let seed = PersonSeed {
                age,
                sex,
                education,
                marital_status: MaritalStatus::NeverMarried,
                employment: EmploymentStatus::Unemployed,
            };
            let household = ctx.state.add_household(HouseholdKind::Nonfamily);
            ctx.state.add_person(&seed, household, ctx.rng);
        }
    }
}
