//! Capacity primitives.
//!
//! Two claim pools cover every finite resource in the simulation: a
//! persistent pool whose claims survive across years (employer positions)
//! and an ephemeral pool that is wiped and refilled every tick (school
//! seats). [`CappedFlow`] handles annual monetary budgets where a request is
//! taken whole or refused whole.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::id::PersonId;

/// Common read-only surface of the two claim pools.
pub trait Pool {
    fn capacity(&self) -> u32;
    fn claimed(&self) -> u32;

    fn available(&self) -> u32 {
        self.capacity().saturating_sub(self.claimed())
    }

    fn is_full(&self) -> bool {
        self.available() == 0
    }
}

/// Pool whose claims persist until explicitly released. A zero-capacity pool
/// refuses every claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotPool {
    capacity: u32,
    holders: BTreeSet<PersonId>,
}

impl SlotPool {
    pub fn new(capacity: u32) -> Self {
        SlotPool {
            capacity,
            holders: BTreeSet::new(),
        }
    }

    /// Claim a slot for `person`. Refuses when full; claiming twice for the
    /// same holder is a no-op that still succeeds.
    pub fn try_claim(&mut self, person: PersonId) -> bool {
        if self.holders.contains(&person) {
            return true;
        }
        if self.is_full() {
            return false;
        }
        self.holders.insert(person);
        true
    }

    /// Release `person`'s slot. Releasing a non-holder is a no-op.
    pub fn release(&mut self, person: PersonId) {
        self.holders.remove(&person);
    }

    pub fn holds(&self, person: PersonId) -> bool {
        self.holders.contains(&person)
    }
}

impl Pool for SlotPool {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn claimed(&self) -> u32 {
        self.holders.len() as u32
    }
}

/// Pool that is emptied at the start of every tick and refilled by that
/// tick's grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatPool {
    capacity: u32,
    holders: BTreeSet<PersonId>,
}

impl SeatPool {
    pub fn new(capacity: u32) -> Self {
        SeatPool {
            capacity,
            holders: BTreeSet::new(),
        }
    }

    /// Drop all current holders.
    pub fn reset(&mut self) {
        self.holders.clear();
    }

    /// Grant a seat for this tick. Refuses when full; a repeat grant for the
    /// same holder succeeds without consuming a second seat.
    pub fn try_grant(&mut self, person: PersonId) -> bool {
        if self.holders.contains(&person) {
            return true;
        }
        if self.is_full() {
            return false;
        }
        self.holders.insert(person);
        true
    }

    /// Release `person`'s seat mid-tick, e.g. on death.
    pub fn release(&mut self, person: PersonId) {
        self.holders.remove(&person);
    }

    pub fn holds(&self, person: PersonId) -> bool {
        self.holders.contains(&person)
    }
}

impl Pool for SeatPool {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn claimed(&self) -> u32 {
        self.holders.len() as u32
    }
}

/// Annual monetary budget. Requests are accepted whole when they fit under
/// the remaining cap and refused whole otherwise; no partial fills.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CappedFlow {
    cap: f64,
    accepted: f64,
}

impl CappedFlow {
    pub fn new(cap: f64) -> Self {
        CappedFlow { cap, accepted: 0.0 }
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }

    pub fn accepted(&self) -> f64 {
        self.accepted
    }

    /// Accept `amount` if it fits under the remaining budget.
    pub fn try_accept(&mut self, amount: f64) -> bool {
        if amount <= 0.0 {
            return true;
        }
        if self.accepted + amount > self.cap {
            return false;
        }
        self.accepted += amount;
        true
    }

    /// Replace the cap, keeping the amount already accepted this year.
    pub fn set_cap(&mut self, cap: f64) {
        self.cap = cap;
    }

    /// Start a new budget year.
    pub fn reset_year(&mut self) {
        self.accepted = 0.0;
    }
}
