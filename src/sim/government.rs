use std::collections::BTreeMap;

use super::context::TickContext;
use super::system::SimSystem;
use crate::id::PersonId;
use crate::model::{Caps, Person, SimState, TickMetrics};

/// Disburses welfare to qualifying households out of the annual support
/// budget: a flat grant to single parents, and per-child food assistance
/// split across the adults of low-income families. Runs after the finance
/// pass so eligibility reads this year's settled ledgers.
pub struct GovernmentSystem;

impl SimSystem for GovernmentSystem {
    fn name(&self) -> &str {
        "government"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        disburse_support(ctx.state);
    }
}

fn disburse_support(state: &mut SimState) {
    let support_modifier = state.modifiers.event.support;
    let tables = state.tables.government;

    let SimState {
        households,
        population,
        caps,
        metrics,
        ..
    } = state;

    for household in households.values() {
        let mut adults = Vec::new();
        let mut children = 0u32;
        for id in &household.members {
            match population.get(id) {
                Some(p) if p.is_adult() => adults.push(*id),
                Some(_) => children += 1,
                None => {}
            }
        }
        if children == 0 {
            continue;
        }

        if adults.len() == 1 {
            let amount = tables.single_parent_support * support_modifier;
            grant(population, caps, metrics, adults[0], amount);
        }

        let ledger = &household.ledger;
        let low_income = ledger.income > 0.0
            && ledger.income < ledger.required_cost * tables.low_income_threshold_factor;
        if low_income && !adults.is_empty() {
            let per_adult = f64::from(children) * tables.food_stamp_per_child * support_modifier
                / adults.len() as f64;
            for adult in &adults {
                grant(population, caps, metrics, *adult, per_adult);
            }
        }
    }
}

fn grant(
    population: &mut BTreeMap<PersonId, Person>,
    caps: &mut Caps,
    metrics: &mut TickMetrics,
    person: PersonId,
    amount: f64,
) {
    if caps.support.try_accept(amount) {
        if let Some(p) = population.get_mut(&person) {
            p.support_received += amount;
        }
    } else {
        metrics.refusals.support += 1;
    }
}
