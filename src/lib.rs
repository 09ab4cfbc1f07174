pub mod config;
pub mod error;
pub mod forecast;
pub mod id;
#[macro_use]
pub mod model;
pub mod observer;
pub mod pools;
pub mod scenario;
pub mod setup;
pub mod sim;
pub mod snapshot;
pub mod testutil;

pub use config::Tables;
pub use error::{SimError, SimResult};
pub use forecast::{DriftForecaster, Forecaster};
pub use id::{EmployerId, HouseholdId, IdGenerator, PersonId, VehicleId};
pub use model::{
    EducationStage, EmploymentStatus, Household, HouseholdKind, MaritalStatus, Modifiers, Person,
    PersonSeed, Sex, SimState,
};
pub use observer::{NoopObserver, Observer, ScoringObserver, TickScores};
pub use scenario::{ScenarioEvent, ScenarioKind};
pub use setup::{PopulationInput, init_state};
pub use sim::{SimConfig, SimSystem, TickContext, default_systems, run};
pub use snapshot::{SummaryRow, TickSnapshot};
