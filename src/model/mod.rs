#[macro_use]
mod macros;

pub mod household;
pub mod marriage;
pub mod metrics;
pub mod modifiers;
pub mod person;
pub mod state;

pub use household::{Household, HouseholdKind, Ledger};
pub use marriage::MarriageRecord;
pub use metrics::{
    RefusalCounters, RoadKind, RoadStatus, SeatStats, TickMetrics, TrafficReport, TransitReport,
    VehicleEvent, VehicleEventKind,
};
pub use modifiers::{EconRates, EventModifiers, ForecastModifiers, Modifiers};
pub use person::{
    CommutePurpose, EducationStage, EmploymentStatus, MaritalStatus, Person, PersonSeed,
    SchoolStart, Sex, SkillLevel, Vehicle,
};
pub use state::{Caps, SimState};
