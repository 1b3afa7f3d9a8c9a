//! Spread Environment Abstraction Layer
//!
//! This crate provides the seam between the spreading engines and the
//! outside world, so that the same models can run both in **Production**
//! (OS entropy) and in **Simulation** (a single seeded stream).
//!
//! # Core Concept: One Random Stream
//!
//! Every stochastic decision of a run (Bernoulli trials against transition
//! weights, neighbour coin flips, seed rankings, actor shuffles) is drawn
//! from the stream exposed by a [`SpreadContext`]. Given the same seed, a
//! whole simulation is reproducible end-to-end.
//!
//! # Example
//!
//! ```ignore
//! use spread_env::SpreadContext;
//!
//! fn epoch<Ctx: SpreadContext>(ctx: &mut Ctx, model: &Model, net: &MultilayerNetwork) {
//!     let updates = model.network_evaluation_step(net, ctx.rng())?;
//!     net.update(&updates)?;
//! }
//! ```

mod context;
mod entropy_impl;
mod types;

pub use context::SpreadContext;
pub use entropy_impl::EntropyContext;
pub use types::ActorId;
