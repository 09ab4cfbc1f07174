//! Marriage records kept for the run's output log.

use serde::{Deserialize, Serialize};

use crate::id::{HouseholdId, PersonId};

/// One wedding: who married whom, which households they left, and the new
/// household they formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarriageRecord {
    pub year: u32,
    pub husband: PersonId,
    pub husband_former_household: HouseholdId,
    pub husband_age: u32,
    pub wife: PersonId,
    pub wife_former_household: HouseholdId,
    pub wife_age: u32,
    pub household: HouseholdId,
}
