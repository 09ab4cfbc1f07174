use rand::Rng;

use super::context::TickContext;
use super::system::SimSystem;
use crate::model::{CommutePurpose, TransitReport};

/// Sizes the bus fleet against the current population and assigns bus
/// ridership among carless work and school commuters. The fleet grows
/// in proportion to population at the founding buses-per-capita ratio.
pub struct TransitSystem;

impl SimSystem for TransitSystem {
    fn name(&self) -> &str {
        "transit"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let tables = &ctx.state.tables.transit;
        let ratio = f64::from(tables.initial_buses) / f64::from(tables.initial_population);
        let fleet = (ctx.state.population.len() as f64 * ratio).ceil() as u32;
        let daily_capacity =
            u64::from(fleet) * u64::from(tables.bus_capacity) * u64::from(tables.trips_per_bus_per_day);

        let demand = ctx
            .state
            .population
            .values()
            .filter(|p| rides_the_bus(p.owns_vehicle(), p.commute_purpose))
            .count() as u32;

        let service_ratio = if demand > 0 {
            (daily_capacity as f64 / f64::from(demand)).min(1.0)
        } else {
            1.0
        };
        let served = (f64::from(demand) * service_ratio) as u32;

        for person in ctx.state.population.values_mut() {
            person.use_bus = rides_the_bus(person.owns_vehicle(), person.commute_purpose)
                && ctx.rng.random_range(0.0..1.0) < service_ratio;
        }

        ctx.state.metrics.transit = TransitReport {
            fleet,
            daily_capacity,
            demand,
            served,
            refused: demand - served,
        };
    }
}

fn rides_the_bus(owns_vehicle: bool, purpose: CommutePurpose) -> bool {
    !owns_vehicle && matches!(purpose, CommutePurpose::Work | CommutePurpose::School)
}
