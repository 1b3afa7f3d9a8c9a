//! Error types for the spreading core.
//!
//! Every variant here is a configuration error: it is raised at the call
//! that introduced the inconsistency and never deferred into an epoch.

use thiserror::Error;

/// Errors raised while building networks, compartments and models.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpreadError {
    /// Transition weight outside [0, 1]
    #[error("Weight value {0} not in [0, 1] range")]
    InvalidWeight(f64),

    /// State names of a process must be unique
    #[error("State names of process '{0}' must be unique")]
    DuplicateState(String),

    /// Process registered twice
    #[error("Process '{0}' is already registered")]
    DuplicateProcess(String),

    /// Processes cannot be added once transitions are compiled
    #[error("Cannot add process '{0}' after the graph was compiled")]
    AlreadyCompiled(String),

    /// Transition graph queried before compile()
    #[error("Compartmental graph is not compiled, call compile() first")]
    NotCompiled,

    #[error("Unknown process: {0}")]
    UnknownProcess(String),

    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    #[error("Actor {0} doesn't exist in the network")]
    UnknownActor(String),

    #[error("Node {node} doesn't exist in layer '{layer}'")]
    UnknownNode { layer: String, node: String },

    /// Label not in the `process.state` form
    #[error("Malformed label '{0}', expected 'process.state'")]
    MalformedLabel(String),

    /// Transition endpoints belong to different processes
    #[error("Transition endpoints must belong to one process: '{0}' vs '{1}'")]
    ProcessMismatch(String, String),

    /// Joint state that was never compiled into the transition graph
    #[error("Joint state {state:?} does not exist in process '{process}'")]
    UnknownJointState { process: String, state: Vec<String> },

    /// Edge requested between joint states that are not adjacent
    #[error("No transition from {from:?} to {to:?} in process '{process}'")]
    UnknownTransition {
        process: String,
        from: Vec<String>,
        to: Vec<String>,
    },

    /// Actor state read before initialisation
    #[error("Actor {actor} has no state in layer '{layer}'")]
    UnsetState { actor: String, layer: String },

    /// Seeding budget does not match processes or states
    #[error("Invalid seeding budget: {0}")]
    InvalidBudget(String),

    /// Seed ranking lists the same actor more than once
    #[error("Actor {0} appears more than once in the seed ranking")]
    DuplicateActor(String),

    /// Initial states don't cover every node exactly once
    #[error("Node {node} in layer '{layer}' got {assigned} initial states, expected 1")]
    IncompleteSeeding {
        layer: String,
        node: String,
        assigned: usize,
    },

    /// Seed ranking is shorter than the population to initialise
    #[error("Seed ranking exhausted: needed {needed}, got {available}")]
    RankingExhausted { needed: usize, available: usize },

    #[error("Unknown protocol: {0} (only AND & OR are allowed)")]
    UnknownProtocol(String),

    /// More random edges requested than a process graph holds
    #[error("Cannot pick {requested} distinct edges from {available} in process '{process}'")]
    NotEnoughEdges {
        process: String,
        requested: usize,
        available: usize,
    },

    /// Shape of a per-process argument list doesn't match the processes
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
}

impl SpreadError {
    /// Creates a budget error.
    pub fn budget(msg: impl Into<String>) -> Self {
        Self::InvalidBudget(msg.into())
    }

    /// Creates an unknown-actor error.
    pub fn unknown_actor(actor: impl std::fmt::Display) -> Self {
        Self::UnknownActor(actor.to_string())
    }
}

/// Result alias used across the core.
pub type Result<T> = std::result::Result<T, SpreadError>;
