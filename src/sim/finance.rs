use super::context::TickContext;
use super::system::SimSystem;
use crate::config::{CostBucket, CostGrid};
use crate::model::{EmploymentStatus, Person, SimState};

/// Settles every household ledger once per year: taxes, living costs,
/// loan repayment, then a surplus deposit or a deficit loan against the
/// bank's annual capacity.
pub struct FinanceSystem;

impl SimSystem for FinanceSystem {
    fn name(&self) -> &str {
        "finance"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        settle_households(ctx.state);
    }
}

fn settle_households(state: &mut SimState) {
    let cpi_multiplier = state.modifiers.cpi_multiplier();
    let tax_rate = state.modifiers.econ.tax_rate;

    let SimState {
        households,
        population,
        caps,
        metrics,
        tables,
        ..
    } = state;

    for household in households.values_mut() {
        if household.is_empty() {
            continue;
        }
        let members: Vec<&Person> = household
            .members
            .iter()
            .filter_map(|id| population.get(id))
            .collect();

        let income: f64 = members.iter().map(|p| p.annual_income).sum();
        let cost = household_cost(&tables.cost_grid, &members, cpi_multiplier);
        let taxes = income * tax_rate;
        let mut net = (income - taxes) - cost;

        let ledger = &mut household.ledger;
        if net > 0.0 {
            let repayment = net.min(ledger.loans);
            if repayment > 0.0 {
                ledger.loans -= repayment;
                ledger.loan_repaid_total += repayment;
                net -= repayment;
            }
            if caps.savings.try_accept(net) {
                ledger.savings += net;
            } else {
                metrics.refusals.savings += 1;
            }
        } else {
            let deficit = -net;
            if caps.loans.try_accept(deficit) {
                ledger.loans += deficit;
            } else {
                metrics.refusals.loans += 1;
            }
        }

        ledger.income = income;
        ledger.required_cost = cost;
        ledger.taxes = taxes;
        ledger.taxes_total += taxes;
    }
}

/// Annual cost of living for one household, from the composition cost
/// grid. Adults are members aged 18 and over; the grid's child columns
/// top out at three, with extra children billed at the marginal cost of
/// the third.
pub fn household_cost(grid: &CostGrid, members: &[&Person], cpi_multiplier: f64) -> f64 {
    if members.is_empty() {
        return 0.0;
    }

    let adults = members.iter().filter(|p| p.is_adult()).count();
    let children = members.len() - adults;
    let working = members
        .iter()
        .filter(|p| p.is_adult() && p.employment == EmploymentStatus::Employed)
        .count();

    let bucket = if adults <= 1 {
        CostBucket::SingleAdult
    } else if working >= 2 {
        CostBucket::TwoAdultsTwoWorking
    } else {
        CostBucket::TwoAdultsOneWorking
    };

    let child_idx = children.min(3);
    let mut total = grid.total(bucket, child_idx);

    if children > 3 {
        let marginal_child = grid.total(bucket, 3) - grid.total(bucket, 2);
        total += (children - 3) as f64 * marginal_child;
    }
    if adults > 2 {
        let marginal_adult =
            grid.total(CostBucket::TwoAdultsTwoWorking, 0) - grid.total(CostBucket::SingleAdult, 0);
        total += (adults - 2) as f64 * marginal_adult;
    }

    total * cpi_multiplier
}
