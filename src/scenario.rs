//! Scenario events: externally scripted shocks that adjust the tick's rate
//! modifiers while their year window is open.
//!
//! Modifiers are rebuilt from neutral at the start of every tick, so an
//! event's influence ends the moment its window closes. Events apply in list
//! order; later events see (and may overwrite) what earlier ones set.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::model::modifiers::EventModifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ScenarioKind {
    /// Better healthcare: more births, fewer deaths, a small jobs boost.
    PublicHealth,
    /// Stable governance: calmer prices, better pay, a fixed welfare budget.
    PoliticalStability,
    /// A city-wide panic: deaths and dropouts up, jobs and incomes down,
    /// welfare spending uncapped.
    Panic,
}

string_enum!(ScenarioKind {
    PublicHealth => "public_health",
    PoliticalStability => "political_stability",
    Panic => "panic",
});

fn enabled_default() -> bool {
    true
}

/// One scripted shock. Active from `start_year` up to but not including
/// `end_year`. `level` scales the effect; calibrations use 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEvent {
    pub kind: ScenarioKind,
    pub level: u32,
    pub start_year: u32,
    pub end_year: u32,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

impl ScenarioEvent {
    pub fn active_in(&self, year: u32) -> bool {
        self.enabled && self.start_year <= year && year < self.end_year
    }

    /// Fold this event's adjustments into the tick's modifiers.
    fn apply(&self, m: &mut EventModifiers) {
        let level = self.level as f64;
        match self.kind {
            ScenarioKind::PublicHealth => {
                m.birth *= 1.0 + 0.1 * level;
                m.death *= 1.0 - 0.1 * level;
                m.employment *= 1.0 + 0.05 * level;
            }
            ScenarioKind::PoliticalStability => {
                m.inflation *= 1.0 - 0.05 * level;
                m.employment *= 1.0 + 0.05 * level;
                m.support_cap = 1.5;
                m.income *= 1.0 + 0.05 * level;
                m.support *= 1.0 + 0.1 * level;
            }
            ScenarioKind::Panic => {
                m.death *= 1.0 + 0.5 * level;
                m.employment *= 1.0 - 0.1 * level;
                m.income *= 1.0 - 0.1 * level;
                m.dropout_prob = 0.05 * level;
                m.inflation *= 1.0 + 0.1 * level;
                m.support_cap = f64::INFINITY;
                m.support *= 1.0 + 0.2 * level;
            }
        }
    }
}

/// Build the event modifiers for `year` from scratch.
pub fn apply_events(events: &[ScenarioEvent], year: u32) -> EventModifiers {
    let mut modifiers = EventModifiers::default();
    for event in events.iter().filter(|e| e.active_in(year)) {
        event.apply(&mut modifiers);
    }
    modifiers
}

/// Load a scenario event list from a JSON file.
pub fn from_file(path: &Path) -> SimResult<Vec<ScenarioEvent>> {
    let file = File::open(path)?;
    let events = serde_json::from_reader(BufReader::new(file))?;
    Ok(events)
}
