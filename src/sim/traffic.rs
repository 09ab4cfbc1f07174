use rand::Rng;

use super::context::TickContext;
use super::system::SimSystem;
use crate::model::{RoadKind, RoadStatus, TrafficReport};

/// Daily one-way capacity of each road class, in vehicles.
pub const ROAD_CAPACITIES: [(RoadKind, u32); 3] = [
    (RoadKind::Interstate, 62_000),
    (RoadKind::Highway, 38_750),
    (RoadKind::Arterial, 31_000),
];

const BASE_ACCIDENT_PROB: f64 = 0.005;
const GRIDLOCK_ACCIDENT_PROB: f64 = 0.015;

/// Grades each road class by the citywide vehicle count and rolls annual
/// accident involvement for every vehicle owner. Gridlock on either of
/// the two major road classes triples the accident rate.
pub struct TrafficSystem;

impl SimSystem for TrafficSystem {
    fn name(&self) -> &str {
        "traffic"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let total_vehicles: usize = ctx
            .state
            .population
            .values()
            .map(|p| p.vehicles.len())
            .sum();

        let mut roads = Vec::with_capacity(ROAD_CAPACITIES.len());
        let mut total_wait = 0.0;
        for (kind, capacity) in ROAD_CAPACITIES {
            let load = if capacity > 0 {
                total_vehicles as f64 / f64::from(capacity)
            } else {
                0.0
            };
            let (status, wait) = classify_load(load);
            total_wait += wait;
            roads.push((kind, status));
        }
        let avg_wait_minutes = total_wait / ROAD_CAPACITIES.len() as f64;

        let accident_prob = accident_probability(&roads);
        let mut accidents = 0;
        for person in ctx.state.population.values_mut() {
            person.accident_involvement = !person.vehicles.is_empty()
                && ctx.rng.random_range(0.0..1.0) < accident_prob;
            if person.accident_involvement {
                accidents += 1;
            }
        }

        ctx.state.metrics.traffic = TrafficReport {
            roads,
            avg_wait_minutes,
            accidents,
        };
    }
}

/// Congestion sets in at 70% load; past 100% the queue grows much faster
/// than the backlog clears.
fn classify_load(load: f64) -> (RoadStatus, f64) {
    if load < 0.7 {
        (RoadStatus::Normal, 0.0)
    } else if load < 1.0 {
        (RoadStatus::Congested, (load - 0.7) * 30.0)
    } else {
        (RoadStatus::Gridlock, 9.0 + (load - 1.0) * 60.0)
    }
}

fn accident_probability(roads: &[(RoadKind, RoadStatus)]) -> f64 {
    let major_gridlock = roads.iter().any(|(kind, status)| {
        matches!(kind, RoadKind::Interstate | RoadKind::Highway) && *status == RoadStatus::Gridlock
    });
    if major_gridlock {
        GRIDLOCK_ACCIDENT_PROB
    } else {
        BASE_ACCIDENT_PROB
    }
}
