//! Per-tick rate modifiers: scenario events, forecast draws, and economy
//! rates all land here before the lifecycle passes read them.

use serde::{Deserialize, Serialize};

/// Multipliers (and two absolute overrides) contributed by active scenario
/// events. Reset to neutral at the start of every tick, then each active
/// event folds its adjustments in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventModifiers {
    pub birth: f64,
    pub death: f64,
    pub employment: f64,
    pub inflation: f64,
    pub income: f64,
    pub support: f64,
    /// Multiplier on the annual support budget, except events that override
    /// it outright replace the value instead of scaling it.
    pub support_cap: f64,
    /// Absolute probability of an event-induced dropout, not a multiplier.
    pub dropout_prob: f64,
}

impl Default for EventModifiers {
    fn default() -> Self {
        EventModifiers {
            birth: 1.0,
            death: 1.0,
            employment: 1.0,
            inflation: 1.0,
            income: 1.0,
            support: 1.0,
            support_cap: 1.0,
            dropout_prob: 0.0,
        }
    }
}

/// Multipliers derived from this tick's macro forecast draws, each relative
/// to the last historical value of its series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastModifiers {
    pub death: f64,
    pub birth: f64,
    /// Driven by the employment-rate forecast.
    pub marriage: f64,
}

impl Default for ForecastModifiers {
    fn default() -> Self {
        ForecastModifiers {
            death: 1.0,
            birth: 1.0,
            marriage: 1.0,
        }
    }
}

/// Economy-wide rates sampled from the percent-series forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EconRates {
    pub tax_rate: f64,
    pub salary_inflation: f64,
    pub cpi_inflation: f64,
}

/// All modifiers in effect for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub event: EventModifiers,
    pub forecast: ForecastModifiers,
    pub econ: EconRates,
}

impl Modifiers {
    /// Cost-of-living multiplier for the year: CPI inflation scaled by any
    /// event inflation adjustment, over a base of one.
    pub fn cpi_multiplier(&self) -> f64 {
        1.0 + self.econ.cpi_inflation * self.event.inflation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_defaults() {
        let m = EventModifiers::default();
        assert_eq!(m.birth, 1.0);
        assert_eq!(m.death, 1.0);
        assert_eq!(m.employment, 1.0);
        assert_eq!(m.support_cap, 1.0);
        assert_eq!(m.dropout_prob, 0.0);

        let f = ForecastModifiers::default();
        assert_eq!(f.death, 1.0);
        assert_eq!(f.birth, 1.0);
        assert_eq!(f.marriage, 1.0);
    }

    #[test]
    fn cpi_multiplier_combines_rates() {
        let mut m = Modifiers::default();
        m.econ.cpi_inflation = 0.05;
        assert!((m.cpi_multiplier() - 1.05).abs() < 1e-12);

        m.event.inflation = 2.0;
        assert!((m.cpi_multiplier() - 1.10).abs() < 1e-12);
    }
}
