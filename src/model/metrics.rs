//! Per-tick observations: trip counts, vehicle events, seat allocation
//! stats, transit and traffic reports, and refusal counters. Everything here
//! is recomputed or cleared every year.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::{PersonId, VehicleId};
use crate::model::person::{CommutePurpose, EducationStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum VehicleEventKind {
    Purchase,
    Retirement,
    Inheritance,
}

string_enum!(VehicleEventKind {
    Purchase => "purchase",
    Retirement => "retirement",
    Inheritance => "inheritance",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleEvent {
    pub year: u32,
    pub kind: VehicleEventKind,
    pub vehicle: VehicleId,
    pub owner: PersonId,
    /// Receiving owner for an inheritance.
    pub heir: Option<PersonId>,
}

/// Outcome of one stage's seat reallocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatStats {
    pub eligible: u32,
    pub seated: u32,
    pub turned_away: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitReport {
    pub fleet: u32,
    pub daily_capacity: u64,
    pub demand: u32,
    pub served: u32,
    pub refused: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RoadKind {
    Interstate,
    Highway,
    Arterial,
}

string_enum!(RoadKind {
    Interstate => "interstate",
    Highway => "highway",
    Arterial => "arterial",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RoadStatus {
    Normal,
    Congested,
    Gridlock,
}

string_enum!(RoadStatus {
    Normal => "normal",
    Congested => "congested",
    Gridlock => "gridlock",
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficReport {
    pub roads: Vec<(RoadKind, RoadStatus)>,
    pub avg_wait_minutes: f64,
    pub accidents: u32,
}

/// Counts of requests bounced off a full pool or an exhausted cap. A refusal
/// is an outcome, not an error; these counters are the only trace it leaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefusalCounters {
    pub savings: u32,
    pub loans: u32,
    pub support: u32,
    pub jobs: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickMetrics {
    pub trips: BTreeMap<CommutePurpose, u32>,
    pub vehicle_events: Vec<VehicleEvent>,
    pub education: BTreeMap<EducationStage, SeatStats>,
    pub transit: TransitReport,
    pub traffic: TrafficReport,
    pub refusals: RefusalCounters,
    /// Index into the run-wide marriage log where this tick's records begin.
    #[serde(skip)]
    pub marriage_mark: usize,
}

impl TickMetrics {
    pub fn record_trip(&mut self, purpose: CommutePurpose) {
        *self.trips.entry(purpose).or_insert(0) += 1;
    }

    /// Clear everything for the next tick, keeping the marriage mark caught
    /// up to the given log length.
    pub fn reset(&mut self, marriage_log_len: usize) {
        self.trips.clear();
        self.vehicle_events.clear();
        self.education.clear();
        self.transit = TransitReport::default();
        self.traffic = TrafficReport::default();
        self.refusals = RefusalCounters::default();
        self.marriage_mark = marriage_log_len;
    }
}
