use std::path::PathBuf;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use super::context::TickContext;
use super::education::EducationSystem;
use super::finance::FinanceSystem;
use super::government::GovernmentSystem;
use super::immigration::ImmigrationSystem;
use super::lifecycle::LifecycleSystem;
use super::marriage::MarriageSystem;
use super::modifiers::{ForecastSystem, ScenarioSystem};
use super::system::SimSystem;
use super::traffic::TrafficSystem;
use super::transit::TransitSystem;
use crate::error::SimResult;
use crate::model::SimState;
use crate::observer::Observer;
use crate::snapshot::{SummaryRow, TickSnapshot, summary_row, write_checkpoint};

/// Configuration for a simulation run.
pub struct SimConfig {
    pub start_year: u32,
    pub num_years: u32,
    pub seed: u64,
    /// If set, write a checkpoint every N years.
    pub flush_interval: Option<u32>,
    /// Directory to write checkpoints into.
    pub output_dir: Option<PathBuf>,
}

impl SimConfig {
    pub fn new(start_year: u32, num_years: u32, seed: u64) -> Self {
        Self {
            start_year,
            num_years,
            seed,
            flush_interval: None,
            output_dir: None,
        }
    }
}

/// The standard annual pass order. Modifier resets come first so every
/// later pass sees this year's scenario and forecast draws; immigration
/// runs last so arrivals first participate in the following year.
pub fn default_systems() -> Vec<Box<dyn SimSystem>> {
    vec![
        Box::new(ScenarioSystem),
        Box::new(ForecastSystem),
        Box::new(LifecycleSystem),
        Box::new(EducationSystem),
        Box::new(FinanceSystem),
        Box::new(TransitSystem),
        Box::new(TrafficSystem),
        Box::new(MarriageSystem),
        Box::new(GovernmentSystem),
        Box::new(ImmigrationSystem),
    ]
}

/// Call each system once, in registration order.
pub fn dispatch_systems(
    state: &mut SimState,
    systems: &mut [Box<dyn SimSystem>],
    rng: &mut dyn RngCore,
) {
    for system in systems.iter_mut() {
        let mut ctx = TickContext { state, rng };
        system.tick(&mut ctx);
    }
}

/// Returns true if a checkpoint is due after this year. The final year
/// always checkpoints so a run never ends without one.
pub fn should_flush(year_offset: u32, num_years: u32, interval: u32) -> bool {
    let is_last_year = year_offset == num_years - 1;
    is_last_year || (interval > 0 && year_offset > 0 && (year_offset + 1) % interval == 0)
}

/// Run the simulation for the configured number of years.
///
/// Creates a deterministic RNG from `config.seed`, so the same seed always
/// produces the same simulation. After each year the observer sees a
/// snapshot; if it returns a score, that becomes the economic index the
/// next year's immigration responds to.
pub fn run(
    state: &mut SimState,
    systems: &mut [Box<dyn SimSystem>],
    observer: &mut dyn Observer,
    config: SimConfig,
) -> SimResult<()> {
    if systems.is_empty() || config.num_years == 0 {
        return Ok(());
    }

    tracing::info!(
        start_year = config.start_year,
        num_years = config.num_years,
        seed = config.seed,
        population = state.population.len(),
        "simulation starting"
    );

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut summaries: Vec<SummaryRow> = Vec::with_capacity(config.num_years as usize);
    let mut prev_population = state.population.len();

    for year_offset in 0..config.num_years {
        state.tick = year_offset + 1;
        state.year = config.start_year + year_offset;

        dispatch_systems(state, systems, &mut rng);

        let score = {
            let snapshot = TickSnapshot::capture(state);
            observer.on_tick_end(&snapshot)
        };
        if let Some(index) = score {
            state.economic_index = index;
        }

        summaries.push(summary_row(state, prev_population));
        prev_population = state.population.len();

        if let (Some(interval), Some(dir)) = (config.flush_interval, &config.output_dir) {
            if should_flush(year_offset, config.num_years, interval) {
                let checkpoint_dir = dir.join(format!("year_{:06}", state.year));
                write_checkpoint(state, &summaries, &checkpoint_dir)?;
            }
        }

        state.end_tick_reset();
    }

    tracing::info!(
        final_year = state.year,
        population = state.population.len(),
        households = state.households.len(),
        "simulation finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::observer::NoopObserver;
    use crate::testutil::StateBuilder;

    // -- Test helpers --

    struct CountingSystem {
        sys_name: String,
        count: Rc<Cell<u32>>,
    }

    impl CountingSystem {
        fn new(name: &str, count: Rc<Cell<u32>>) -> Self {
            Self {
                sys_name: name.to_string(),
                count,
            }
        }
    }

    impl SimSystem for CountingSystem {
        fn name(&self) -> &str {
            &self.sys_name
        }
        fn tick(&mut self, _ctx: &mut TickContext) {
            self.count.set(self.count.get() + 1);
        }
    }

    // -- should_flush tests --

    #[test]
    fn flush_cadence_hits_interval_and_final_year() {
        let due: Vec<u32> = (0..12).filter(|&o| should_flush(o, 12, 5)).collect();
        assert_eq!(due, vec![4, 9, 11]);
    }

    #[test]
    fn first_year_only_flushes_when_it_is_last() {
        assert!(should_flush(0, 1, 1));
        assert!(!should_flush(0, 3, 1));
    }

    #[test]
    fn zero_interval_still_checkpoints_the_end() {
        assert!(!should_flush(1, 4, 0));
        assert!(should_flush(3, 4, 0));
    }

    // -- run() tests --

    #[test]
    fn empty_systems_noop() {
        let mut state = StateBuilder::new().build();
        let year_before = state.year;
        let mut systems: Vec<Box<dyn SimSystem>> = vec![];
        run(
            &mut state,
            &mut systems,
            &mut NoopObserver,
            SimConfig::new(2024, 10, 0),
        )
        .unwrap();
        assert_eq!(state.year, year_before);
        assert_eq!(state.tick, 0);
    }

    #[test]
    fn zero_years_noop() {
        let count = Rc::new(Cell::new(0));
        let mut systems: Vec<Box<dyn SimSystem>> =
            vec![Box::new(CountingSystem::new("test", count.clone()))];
        let mut state = StateBuilder::new().build();
        run(
            &mut state,
            &mut systems,
            &mut NoopObserver,
            SimConfig::new(2024, 0, 0),
        )
        .unwrap();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn each_system_ticks_once_per_year() {
        let count = Rc::new(Cell::new(0));
        let mut systems: Vec<Box<dyn SimSystem>> =
            vec![Box::new(CountingSystem::new("counter", count.clone()))];
        let mut state = StateBuilder::new().build();
        run(
            &mut state,
            &mut systems,
            &mut NoopObserver,
            SimConfig::new(2024, 10, 0),
        )
        .unwrap();
        assert_eq!(count.get(), 10);
    }

    #[test]
    fn clock_lands_on_the_final_year() {
        let count = Rc::new(Cell::new(0));
        let mut systems: Vec<Box<dyn SimSystem>> =
            vec![Box::new(CountingSystem::new("counter", count.clone()))];
        let mut state = StateBuilder::new().build();
        run(
            &mut state,
            &mut systems,
            &mut NoopObserver,
            SimConfig::new(2024, 3, 0),
        )
        .unwrap();
        assert_eq!(state.year, 2026);
        assert_eq!(state.tick, 3);
    }

    #[test]
    fn systems_called_in_registration_order() {
        struct LoggingSystem {
            sys_name: String,
            log: Rc<RefCell<Vec<String>>>,
        }

        impl SimSystem for LoggingSystem {
            fn name(&self) -> &str {
                &self.sys_name
            }
            fn tick(&mut self, _ctx: &mut TickContext) {
                self.log.borrow_mut().push(self.sys_name.clone());
            }
        }

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut systems: Vec<Box<dyn SimSystem>> = vec![
            Box::new(LoggingSystem {
                sys_name: "A".to_string(),
                log: log.clone(),
            }),
            Box::new(LoggingSystem {
                sys_name: "B".to_string(),
                log: log.clone(),
            }),
        ];
        let mut state = StateBuilder::new().build();
        run(
            &mut state,
            &mut systems,
            &mut NoopObserver,
            SimConfig::new(2024, 2, 0),
        )
        .unwrap();
        assert_eq!(*log.borrow(), vec!["A", "B", "A", "B"]);
    }

    #[test]
    fn observer_score_becomes_next_years_index() {
        struct FixedScore(f64);

        impl Observer for FixedScore {
            fn on_tick_end(&mut self, _snapshot: &TickSnapshot) -> Option<f64> {
                Some(self.0)
            }
        }

        let count = Rc::new(Cell::new(0));
        let mut systems: Vec<Box<dyn SimSystem>> =
            vec![Box::new(CountingSystem::new("counter", count.clone()))];
        let mut state = StateBuilder::new().build();
        run(
            &mut state,
            &mut systems,
            &mut FixedScore(42.0),
            SimConfig::new(2024, 2, 0),
        )
        .unwrap();
        assert_eq!(state.economic_index, 42.0);
    }

    #[test]
    fn default_stack_runs_and_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let mut systems = default_systems();
        let mut state = StateBuilder::new().build();

        let mut config = SimConfig::new(2024, 3, 99);
        config.flush_interval = Some(1);
        config.output_dir = Some(dir.path().to_path_buf());

        run(&mut state, &mut systems, &mut NoopObserver, config).unwrap();

        let last = dir.path().join("year_002026");
        assert!(last.join("summary.jsonl").is_file());
        assert!(last.join("persons.jsonl").is_file());
    }
}
