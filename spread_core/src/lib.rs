//! Spread Core - compartmental propagation over multilayer networks
//!
//! The crate is organised around three engines:
//! - **Structure**: [`MultilayerNetwork`] of [`LayerGraph`]s sharing one actor
//!   namespace, each node carrying a mutable `status`
//! - **Transitions**: [`CompartmentalGraph`], the compiled joint-state
//!   transition structure with one weighted digraph per process
//! - **Dynamics**: the [`PropagationModel`] contract and the concrete models
//!   dispatched through the [`Model`] enum
//!
//! Models never mutate the network. They emit [`NetworkUpdateBuffer`]s that
//! the caller applies in one batch with [`MultilayerNetwork::update`], which
//! keeps epochs synchronous.

pub mod actor;
pub mod compartments;
pub mod error;
pub mod models;
pub mod network;
pub mod seeding;

pub use actor::Actor;
pub use compartments::{CompartmentalGraph, JointState, SeedingBudget};
pub use error::{Result, SpreadError};
pub use models::{DsaaModel, MicModel, MltModel, Model, PropagationModel, Protocol};
pub use network::{LayerGraph, MultilayerNetwork, NetworkUpdateBuffer, StatesCount};
pub use seeding::{DegreeCentralitySelector, MockingSelector, RandomSelector, SeedSelector};

pub use spread_env::ActorId;

/// Heavy separator used in plain-text descriptions.
pub const BOLD_UNDERLINE: &str = "============================================";

/// Light separator used in plain-text descriptions.
pub const THIN_UNDERLINE: &str = "--------------------------------------------";
