//! Core environment context trait for spreading simulations.

use rand::RngCore;

/// The central interface for environment interaction.
///
/// This trait abstracts the source of randomness so that propagation
/// models can run both in production and in deterministic simulation.
///
/// # Implementations
///
/// - **Production**: `EntropyContext` - OS-seeded `StdRng`
/// - **Simulation**: `SimContext` (in `spread_sim`) - `ChaCha8Rng(seed)`
///
/// # Determinism
///
/// Callers must thread the stream returned by [`SpreadContext::rng`] through
/// every stochastic call of a run. Nothing in the engines touches
/// process-global randomness.
pub trait SpreadContext {
    /// Returns the shared random stream of this run.
    fn rng(&mut self) -> &mut dyn RngCore;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    /// In simulation, returns the master seed.
    fn seed(&self) -> u64;
}
