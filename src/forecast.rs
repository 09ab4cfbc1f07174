//! Macro forecasting: fit a model to a historical series once at startup,
//! then draw one value per tick from the forecast distribution.
//!
//! Each series gets a [`ForecastTrack`] holding the full forecast horizon.
//! Offset 0 primes the economy before the first tick; tick `k` draws at
//! offset `k`. A track past its horizon freezes at its last draw rather than
//! extrapolating further.

use rand::{Rng, RngCore};

use crate::config::HistoryTables;
use crate::error::{SimError, SimResult};

/// One forecast step: the point estimate and its standard error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub mean: f64,
    pub std_err: f64,
}

/// Fits a historical series and produces `horizon` forecast points, where
/// point `i` is the estimate `i + 1` steps past the end of the history.
pub trait Forecaster {
    fn forecast(&self, history: &[f64], horizon: usize) -> SimResult<Vec<ForecastPoint>>;
}

/// Random walk with drift. The point estimate grows linearly at the mean
/// historical step; the standard error widens with the square root of the
/// step count, scaled by the sample deviation of the steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftForecaster;

impl Forecaster for DriftForecaster {
    fn forecast(&self, history: &[f64], horizon: usize) -> SimResult<Vec<ForecastPoint>> {
        if history.len() < 2 {
            return Err(SimError::Forecast(format!(
                "drift fit needs at least two observations, got {}",
                history.len()
            )));
        }
        let diffs: Vec<f64> = history.windows(2).map(|w| w[1] - w[0]).collect();
        let n = diffs.len() as f64;
        let drift = diffs.iter().sum::<f64>() / n;
        let step_sd = if diffs.len() < 2 {
            0.0
        } else {
            let var = diffs.iter().map(|d| (d - drift).powi(2)).sum::<f64>() / (n - 1.0);
            var.sqrt()
        };
        let last = history[history.len() - 1];
        Ok((1..=horizon)
            .map(|h| ForecastPoint {
                mean: last + h as f64 * drift,
                std_err: step_sd * (h as f64).sqrt(),
            })
            .collect())
    }
}

/// How a raw draw is turned into the number the simulation consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TrackKind {
    /// Draw divided by the last historical value, giving a multiplier
    /// around 1.
    RelativeToBase { base: f64 },
    /// Percent series; draw divided by 100.
    Percent,
}

/// One series' forecast plus the draw state for the run.
#[derive(Debug, Clone)]
pub struct ForecastTrack {
    name: &'static str,
    kind: TrackKind,
    points: Vec<ForecastPoint>,
    last_draw: f64,
    frozen: bool,
}

impl ForecastTrack {
    fn new(name: &'static str, kind: TrackKind, points: Vec<ForecastPoint>, fallback: f64) -> Self {
        ForecastTrack {
            name,
            kind,
            points,
            last_draw: fallback,
            frozen: false,
        }
    }

    /// Draw at `offset` steps into the forecast. Past the horizon the track
    /// freezes: it warns once and repeats its last draw from then on.
    pub fn sample(&mut self, offset: usize, rng: &mut dyn RngCore) -> f64 {
        if let Some(point) = self.points.get(offset) {
            self.last_draw = sample_normal(rng, point.mean, point.std_err);
        } else if !self.frozen {
            tracing::warn!(
                "forecast track {} exhausted at offset {}, holding last draw",
                self.name,
                offset
            );
            self.frozen = true;
        }
        match self.kind {
            TrackKind::RelativeToBase { base } if base != 0.0 => self.last_draw / base,
            TrackKind::RelativeToBase { .. } => 1.0,
            TrackKind::Percent => self.last_draw / 100.0,
        }
    }
}

/// All six fitted tracks for a run.
#[derive(Debug, Clone)]
pub struct Forecasts {
    pub mortality: ForecastTrack,
    pub birth: ForecastTrack,
    pub employment: ForecastTrack,
    pub tax: ForecastTrack,
    pub salary: ForecastTrack,
    pub cpi: ForecastTrack,
}

impl Forecasts {
    /// Fit every series over `horizon` points. The macro series produce
    /// multipliers relative to their last observation; the economic series
    /// produce rates.
    pub fn build(
        history: &HistoryTables,
        forecaster: &dyn Forecaster,
        horizon: usize,
    ) -> SimResult<Forecasts> {
        let relative = |name, series: &[f64]| -> SimResult<ForecastTrack> {
            let base = series[series.len() - 1];
            let points = forecaster.forecast(series, horizon)?;
            Ok(ForecastTrack::new(
                name,
                TrackKind::RelativeToBase { base },
                points,
                base,
            ))
        };
        let percent = |name, series: &[f64]| -> SimResult<ForecastTrack> {
            let last = series[series.len() - 1];
            let points = forecaster.forecast(series, horizon)?;
            Ok(ForecastTrack::new(name, TrackKind::Percent, points, last))
        };

        Ok(Forecasts {
            mortality: relative("mortality", &history.mortality)?,
            birth: relative("birth", &history.birth)?,
            employment: relative("employment", &history.employment)?,
            tax: percent("tax", &history.tax)?,
            salary: percent("salary", &history.salary)?,
            cpi: percent("cpi", &history.cpi)?,
        })
    }
}

/// Box-Muller draw from a normal distribution. A non-positive deviation
/// returns the mean unchanged, keeping zero-error forecasts exact.
fn sample_normal(rng: &mut dyn RngCore, mean: f64, sd: f64) -> f64 {
    if sd <= 0.0 {
        return mean;
    }
    let u1 = rng.random_range(0.0..1.0f64).max(f64::EPSILON);
    let u2 = rng.random_range(0.0..1.0f64);
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    mean + sd * z
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn drift_extends_linear_series_exactly() {
        let history = vec![1.0, 2.0, 3.0, 4.0];
        let points = DriftForecaster.forecast(&history, 3).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].mean, 5.0);
        assert_eq!(points[1].mean, 6.0);
        assert_eq!(points[2].mean, 7.0);
        // Constant steps carry no spread.
        assert_eq!(points[0].std_err, 0.0);
        assert_eq!(points[2].std_err, 0.0);
    }

    #[test]
    fn drift_error_widens_with_horizon() {
        let history = vec![10.0, 12.0, 10.0, 12.0, 10.0];
        let points = DriftForecaster.forecast(&history, 4).unwrap();
        assert!(points[0].std_err > 0.0);
        let ratio = points[3].std_err / points[0].std_err;
        assert!((ratio - 2.0).abs() < 1e-12);
    }

    #[test]
    fn drift_needs_two_observations() {
        assert!(DriftForecaster.forecast(&[5.0], 2).is_err());
        assert!(DriftForecaster.forecast(&[], 2).is_err());
    }

    #[test]
    fn relative_track_yields_multiplier() {
        let mut rng = SmallRng::seed_from_u64(3);
        let points = vec![ForecastPoint {
            mean: 11.0,
            std_err: 0.0,
        }];
        let mut track =
            ForecastTrack::new("test", TrackKind::RelativeToBase { base: 10.0 }, points, 10.0);
        let value = track.sample(0, &mut rng);
        assert!((value - 1.1).abs() < 1e-12);
    }

    #[test]
    fn percent_track_yields_rate() {
        let mut rng = SmallRng::seed_from_u64(3);
        let points = vec![ForecastPoint {
            mean: 37.0,
            std_err: 0.0,
        }];
        let mut track = ForecastTrack::new("test", TrackKind::Percent, points, 37.0);
        let value = track.sample(0, &mut rng);
        assert!((value - 0.37).abs() < 1e-12);
    }

    #[test]
    fn exhausted_track_freezes_at_last_draw() {
        let mut rng = SmallRng::seed_from_u64(9);
        let points = vec![ForecastPoint {
            mean: 50.0,
            std_err: 0.0,
        }];
        let mut track = ForecastTrack::new("test", TrackKind::Percent, points, 50.0);
        let first = track.sample(0, &mut rng);
        let beyond_a = track.sample(1, &mut rng);
        let beyond_b = track.sample(5, &mut rng);
        assert_eq!(first, beyond_a);
        assert_eq!(beyond_a, beyond_b);
        assert!(track.frozen);
    }

    #[test]
    fn zero_deviation_draw_is_the_mean() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(sample_normal(&mut rng, 4.2, 0.0), 4.2);
    }

    #[test]
    fn builds_all_tracks_from_default_history() {
        let history = crate::config::Tables::default().history;
        let mut forecasts = Forecasts::build(&history, &DriftForecaster, 11).unwrap();
        let mut rng = SmallRng::seed_from_u64(77);
        // Multiplier tracks should land near 1, rate tracks near their
        // historical percent level.
        let birth = forecasts.birth.sample(0, &mut rng);
        assert!(birth > 0.5 && birth < 1.5);
        let tax = forecasts.tax.sample(0, &mut rng);
        assert!(tax > 0.2 && tax < 0.6);
    }
}
