mod context;
mod runner;
mod system;

pub mod education;
pub mod finance;
pub mod government;
pub mod immigration;
pub mod lifecycle;
pub mod marriage;
pub mod modifiers;
pub mod traffic;
pub mod transit;

pub use context::TickContext;
pub use runner::{SimConfig, default_systems, dispatch_systems, run, should_flush};
pub use system::SimSystem;

use rand::{Rng, RngCore};

/// Pick an index by relative weight with a cumulative scan. Returns `None`
/// when the weights are empty or sum to nothing.
pub(crate) fn weighted_pick(weights: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }
    let mut draw = rng.random_range(0.0..total);
    for (i, &w) in weights.iter().enumerate() {
        if !(w.is_finite() && w > 0.0) {
            continue;
        }
        if draw < w {
            return Some(i);
        }
        draw -= w;
    }
    weights
        .iter()
        .rposition(|w| w.is_finite() && *w > 0.0)
}
