//! End-of-tick hooks and the composite city indices.

use serde::{Deserialize, Serialize};

use crate::model::EmploymentStatus;
use crate::sim::traffic::ROAD_CAPACITIES;
use crate::snapshot::TickSnapshot;

/// Vehicles this old or older count against the transport score.
const OLD_VEHICLE_AGE: u32 = 8;
const RISKY_DRIVER_MIN_AGE: u32 = 16;
const RISKY_DRIVER_MAX_AGE: u32 = 21;

/// Called after every simulated year with a read-only snapshot. Returning
/// a score feeds it back as the economic index the next year reacts to.
pub trait Observer {
    fn on_tick_end(&mut self, _snapshot: &TickSnapshot) -> Option<f64> {
        None
    }
}

/// Observer that watches nothing and feeds nothing back.
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Composite indices for one year, on a 0 to 100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickScores {
    pub year: u32,
    pub economic_index: f64,
    pub transport_index: f64,
}

/// Scores every year and keeps the history. The economic index is returned
/// to the runner, so immigration sees how the city is doing.
#[derive(Debug, Default)]
pub struct ScoringObserver {
    pub scores: Vec<TickScores>,
}

impl ScoringObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Observer for ScoringObserver {
    fn on_tick_end(&mut self, snapshot: &TickSnapshot) -> Option<f64> {
        let economic_index = economic_score(snapshot);
        let transport_index = transport_score(snapshot);
        self.scores.push(TickScores {
            year: snapshot.year,
            economic_index,
            transport_index,
        });
        Some(economic_index)
    }
}

/// Map `value` onto [0, 1] within [min, max]. A degenerate range scores a
/// neutral 0.5 rather than dividing by zero.
fn normalize(value: f64, min: f64, max: f64, lower_is_better: bool) -> f64 {
    let (value, min, max) = if lower_is_better {
        (-value, -max, -min)
    } else {
        (value, min, max)
    };
    if max - min == 0.0 {
        return 0.5;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

/// Weighted blend of inflation, welfare spending, employment, and median
/// household position, scaled to 0..100.
pub fn economic_score(snapshot: &TickSnapshot) -> f64 {
    let cost_inflation = snapshot.modifiers.cpi_multiplier() - 1.0;

    let employed = snapshot
        .population
        .values()
        .filter(|p| p.employment == EmploymentStatus::Employed)
        .count();
    let labor_force = snapshot
        .population
        .values()
        .filter(|p| p.in_labor_force())
        .count();
    let employment_rate = if labor_force > 0 {
        employed as f64 / labor_force as f64
    } else {
        0.0
    };

    let net_incomes: Vec<f64> = snapshot
        .households
        .values()
        .map(|h| h.ledger.income - h.ledger.taxes - h.ledger.required_cost)
        .collect();
    let savings: Vec<f64> = snapshot
        .households
        .values()
        .map(|h| h.ledger.savings)
        .collect();
    let loans: Vec<f64> = snapshot
        .households
        .values()
        .map(|h| h.ledger.loans)
        .collect();

    let norm_inflation = normalize(cost_inflation, 0.0, 0.15, true);
    let norm_gov_spend = normalize(
        snapshot.caps.support.accepted(),
        0.0,
        snapshot.caps.support.cap(),
        false,
    );
    let norm_employment = normalize(employment_rate, 0.85, 1.0, false);
    let norm_net_income = normalize(median(net_incomes), -50_000.0, 20_000.0, false);
    let norm_savings = normalize(median(savings), 0.0, 50_000.0, false);
    let norm_loans = normalize(median(loans), 0.0, 200_000.0, true);

    (norm_inflation * 0.2
        + norm_gov_spend * 0.1
        + norm_employment * 0.3
        + norm_net_income * 0.2
        + norm_savings * 0.1
        + norm_loans * 0.1)
        * 100.0
}

/// Weighted blend of road utilization, accidents, fleet age, and young
/// drivers, scaled to 0..100. Lower raw values are better across the board.
pub fn transport_score(snapshot: &TickSnapshot) -> f64 {
    let total_vehicles: usize = snapshot
        .population
        .values()
        .map(|p| p.vehicles.len())
        .sum();
    let old_vehicles = snapshot
        .population
        .values()
        .flat_map(|p| p.vehicles.iter())
        .filter(|v| v.age >= OLD_VEHICLE_AGE)
        .count();
    let risky_drivers = snapshot
        .population
        .values()
        .filter(|p| {
            (RISKY_DRIVER_MIN_AGE..=RISKY_DRIVER_MAX_AGE).contains(&p.age) && p.owns_vehicle()
        })
        .count();

    let network_capacity: u32 = ROAD_CAPACITIES.iter().map(|(_, cap)| *cap).sum();
    let road_util = if network_capacity > 0 {
        total_vehicles as f64 / f64::from(network_capacity)
    } else {
        0.0
    };
    let share_of = |count: usize| {
        if total_vehicles > 0 {
            count as f64 / total_vehicles as f64
        } else {
            0.0
        }
    };

    let norm_congestion = normalize(road_util, 0.2, 1.0, true);
    let norm_accidents = normalize(
        f64::from(snapshot.metrics.traffic.accidents),
        50.0,
        500.0,
        true,
    );
    let norm_old_vehicles = normalize(share_of(old_vehicles), 0.1, 0.75, true);
    let norm_risky_drivers = normalize(share_of(risky_drivers), 0.05, 0.4, true);

    (norm_congestion * 0.4
        + norm_accidents * 0.3
        + norm_old_vehicles * 0.15
        + norm_risky_drivers * 0.15)
        * 100.0
}
