//! Spread Sim - deterministic simulation harness for spreading models
//!
//! Runs a [`spread_core::PropagationModel`] over a multilayer network epoch
//! by epoch and records what happened.
//!
//! # Core Principle: One Stream
//!
//! Every stochastic draw of a run (seed selection, Bernoulli trials, actor
//! shuffles) comes from the single ChaCha8 stream owned by [`SimContext`].
//! Topology generation uses streams derived from the same seed, so a whole
//! scenario is reproduced from one `u64`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  Simulator                   │
//! │  ┌───────────┐  proposals  ┌──────────────┐  │
//! │  │   Model   │────────────►│   Network    │  │
//! │  └─────▲─────┘   (batch)   └──────┬───────┘  │
//! │        │ rng                      │ counts   │
//! │  ┌─────┴─────┐             ┌──────▼───────┐  │
//! │  │SimContext │             │    Logger    │  │
//! │  └───────────┘             └──────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use spread_sim::{ScenarioId, ScenarioRunner};
//!
//! let result = ScenarioRunner::new(42).with_epochs(20).run(ScenarioId::Cascade)?;
//! assert!(result.passed);
//! ```

mod context;
mod error;
mod exporter;
mod logger;
mod runner;
pub mod scenarios;
mod simulator;
pub mod topology;

pub use context::SimContext;
pub use error::SimError;
pub use exporter::{EpochCounts, RunExport};
pub use logger::{Logger, PropagationTable};
pub use runner::{dsaa_compartments, dsaa_network, ScenarioResult, ScenarioRunner, ScenarioSetup};
pub use scenarios::ScenarioId;
pub use simulator::{SimConfig, SimState, Simulator, StopReason};
