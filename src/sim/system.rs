use super::context::TickContext;

/// A pluggable simulation pass that runs once per annual tick.
///
/// Object-safe so passes can be stored as `Box<dyn SimSystem>`. Passes run
/// in registration order; later passes see everything earlier ones wrote to
/// the shared state.
pub trait SimSystem {
    fn name(&self) -> &str;
    fn tick(&mut self, ctx: &mut TickContext);
}
