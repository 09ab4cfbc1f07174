//! The two passes that set the tick's rates before anything else runs:
//! scenario modifiers are rebuilt from the event list, then the forecast
//! tracks are drawn for the year.

use crate::scenario;
use crate::sim::context::TickContext;
use crate::sim::system::SimSystem;

/// Rebuilds the event modifiers from scratch and applies the year's support
/// budget. Runs first so every later pass sees this tick's modifiers only.
pub struct ScenarioSystem;

impl SimSystem for ScenarioSystem {
    fn name(&self) -> &str {
        "scenario"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let state = &mut *ctx.state;
        state.modifiers.event = scenario::apply_events(&state.events, state.year);
        let cap = state.tables.government.annual_support_cap * state.modifiers.event.support_cap;
        state.caps.support.set_cap(cap);
    }
}

/// Draws every forecast track at this tick's offset. The employment track
/// doubles as the marriage-propensity signal: marriage rates move with the
/// forecast labor market.
pub struct ForecastSystem;

impl SimSystem for ForecastSystem {
    fn name(&self) -> &str {
        "forecast"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let offset = ctx.state.tick as usize;
        let state = &mut *ctx.state;
        let modifiers = &mut state.modifiers;
        let forecasts = &mut state.forecasts;

        modifiers.forecast.death = forecasts.mortality.sample(offset, ctx.rng);
        modifiers.forecast.birth = forecasts.birth.sample(offset, ctx.rng);
        modifiers.forecast.marriage = forecasts.employment.sample(offset, ctx.rng);
        modifiers.econ.tax_rate = forecasts.tax.sample(offset, ctx.rng);
        modifiers.econ.salary_inflation = forecasts.salary.sample(offset, ctx.rng);
        modifiers.econ.cpi_inflation = forecasts.cpi.sample(offset, ctx.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::modifiers::EventModifiers;
    use crate::scenario::{ScenarioEvent, ScenarioKind};
    use crate::testutil::{StateBuilder, tick_system};

    #[test]
    fn scenario_pass_rebuilds_from_neutral() {
        let mut state = StateBuilder::new().build();
        state.modifiers.event.birth = 9.0;
        state.modifiers.event.dropout_prob = 0.5;

        tick_system(&mut state, &mut ScenarioSystem, 2024, 1);
        assert_eq!(state.modifiers.event, EventModifiers::default());
        assert_eq!(state.caps.support.cap(), 200_000_000.0);
    }

    #[test]
    fn scenario_pass_scales_support_budget() {
        let mut state = StateBuilder::new()
            .events(vec![ScenarioEvent {
                kind: ScenarioKind::PoliticalStability,
                level: 1,
                start_year: 2024,
                end_year: 2030,
                enabled: true,
            }])
            .build();

        tick_system(&mut state, &mut ScenarioSystem, 2024, 1);
        assert_eq!(state.caps.support.cap(), 300_000_000.0);

        // Outside the window the budget falls back to the table value.
        tick_system(&mut state, &mut ScenarioSystem, 2031, 1);
        assert_eq!(state.caps.support.cap(), 200_000_000.0);
    }

    #[test]
    fn panic_event_uncaps_support_budget() {
        let mut state = StateBuilder::new()
            .events(vec![ScenarioEvent {
                kind: ScenarioKind::Panic,
                level: 3,
                start_year: 2025,
                end_year: 2026,
                enabled: true,
            }])
            .build();

        tick_system(&mut state, &mut ScenarioSystem, 2025, 1);
        assert!(state.caps.support.cap().is_infinite());
        assert!(state.caps.support.try_accept(1e12));
    }

    #[test]
    fn forecast_pass_fills_all_modifiers() {
        let mut state = StateBuilder::new().build();
        state.modifiers.forecast.death = 0.0;
        state.modifiers.econ.tax_rate = 0.0;

        tick_system(&mut state, &mut ForecastSystem, 2024, 9);
        let m = &state.modifiers;
        assert!(m.forecast.death > 0.5 && m.forecast.death < 2.0);
        assert!(m.forecast.birth > 0.5 && m.forecast.birth < 2.0);
        assert!(m.forecast.marriage > 0.5 && m.forecast.marriage < 2.0);
        assert!(m.econ.tax_rate > 0.2 && m.econ.tax_rate < 0.6);
        assert!(m.econ.cpi_inflation.abs() < 0.5);
    }

    #[test]
    fn forecast_draws_are_seed_deterministic() {
        let mut a = StateBuilder::new().build();
        let mut b = StateBuilder::new().build();
        tick_system(&mut a, &mut ForecastSystem, 2024, 42);
        tick_system(&mut b, &mut ForecastSystem, 2024, 42);
        assert_eq!(a.modifiers, b.modifiers);
    }
}
