use rand::Rng;
use rand::seq::SliceRandom;

use super::context::TickContext;
use super::system::SimSystem;
use crate::id::PersonId;
use crate::model::{HouseholdKind, MaritalStatus, MarriageRecord, Sex, SimState};

/// Pairs never-married men of marrying age with never-married women within
/// the allowed age gap. Each match founds a married-couple household and
/// both spouses leave their former households.
pub struct MarriageSystem;

impl SimSystem for MarriageSystem {
    fn name(&self) -> &str {
        "marriage"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let year = ctx.state.year;
        let tables = ctx.state.tables.marriage;
        let chance = tables.base_rate * ctx.state.modifiers.forecast.marriage;

        let mut grooms: Vec<PersonId> = ctx
            .state
            .population
            .values()
            .filter(|p| {
                p.sex == Sex::Male
                    && p.age >= tables.groom_min_age
                    && p.marital_status == MaritalStatus::NeverMarried
            })
            .map(|p| p.id)
            .collect();
        grooms.shuffle(ctx.rng);

        // Matched brides leave this list, so nobody marries twice in a year.
        let mut brides: Vec<(PersonId, u32)> = ctx
            .state
            .population
            .values()
            .filter(|p| p.sex == Sex::Female && p.marital_status == MaritalStatus::NeverMarried)
            .map(|p| (p.id, p.age))
            .collect();

        for groom in grooms {
            if ctx.rng.random_range(0.0..1.0) >= chance {
                continue;
            }
            let Some(groom_age) = ctx.state.population.get(&groom).map(|p| p.age) else {
                continue;
            };
            let candidates: Vec<usize> = brides
                .iter()
                .enumerate()
                .filter(|(_, (_, age))| groom_age.abs_diff(*age) <= tables.max_age_gap)
                .map(|(i, _)| i)
                .collect();
            if candidates.is_empty() {
                continue;
            }
            let pick = candidates[ctx.rng.random_range(0..candidates.len())];
            let (bride, _) = brides.swap_remove(pick);
            wed(ctx.state, year, groom, bride);
        }
    }
}

fn wed(state: &mut SimState, year: u32, groom: PersonId, bride: PersonId) {
    let Some((husband_former_household, husband_age)) =
        state.population.get(&groom).map(|p| (p.household, p.age))
    else {
        return;
    };
    let Some((wife_former_household, wife_age)) =
        state.population.get(&bride).map(|p| (p.household, p.age))
    else {
        return;
    };

    let household = state.add_household(HouseholdKind::MarriedCouple);
    if let Some(hh) = state.households.get_mut(&household) {
        hh.marriages = 1;
    }
    state.move_to_household(groom, household);
    state.move_to_household(bride, household);

    for spouse in [groom, bride] {
        if let Some(p) = state.population.get_mut(&spouse) {
            p.marital_status = MaritalStatus::Married;
            p.years_married = Some(0);
        }
    }

    state.marriages.push(MarriageRecord {
        year,
        husband: groom,
        husband_former_household,
        husband_age,
        wife: bride,
        wife_former_household,
        wife_age,
        household,
    });
}
