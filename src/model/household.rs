//! Households: shared budgets, membership, and per-year event counters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::id::{HouseholdId, PersonId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum HouseholdKind {
    MarriedCouple,
    MaleHouseholder,
    FemaleHouseholder,
    Nonfamily,
}

string_enum!(HouseholdKind {
    MarriedCouple => "married_couple",
    MaleHouseholder => "male_householder",
    FemaleHouseholder => "female_householder",
    Nonfamily => "nonfamily",
});

/// Rolling financial position of one household. Income, cost, and taxes hold
/// the figures from the most recent settlement pass; savings and loans carry
/// across years.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub income: f64,
    pub required_cost: f64,
    pub taxes: f64,
    pub taxes_total: f64,
    pub savings: f64,
    pub loans: f64,
    pub loan_repaid_total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub kind: HouseholdKind,
    pub members: BTreeSet<PersonId>,
    pub ledger: Ledger,
    /// Events observed in this household during the current year.
    pub births: u32,
    pub deaths: u32,
    pub marriages: u32,
}

impl Household {
    pub fn new(id: HouseholdId, kind: HouseholdKind) -> Self {
        Household {
            id,
            kind,
            members: BTreeSet::new(),
            ledger: Ledger::default(),
            births: 0,
            deaths: 0,
            marriages: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Clear the per-year event counters at the end of a tick.
    pub fn reset_tick_counters(&mut self) {
        self.births = 0;
        self.deaths = 0;
        self.marriages = 0;
    }
}
