use rand::RngCore;

use crate::model::SimState;

/// Context passed to each system on every tick.
///
/// Bundled so we can add fields later (config, logger) without changing
/// the `SimSystem` trait signature.
pub struct TickContext<'a> {
    pub state: &'a mut SimState,
    pub rng: &'a mut dyn RngCore,
}
