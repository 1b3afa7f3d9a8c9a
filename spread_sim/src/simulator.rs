//! Simulator - drives a propagation model over a network epoch by epoch.
//!
//! ```text
//! INITIALISED ──perform_propagation──► RUNNING(epoch 0..n) ──► STOPPED
//! ```
//!
//! A run that fails part way is stopped too, with the epoch it failed in.
//!
//! Each epoch evaluates the whole network against the snapshot left by the
//! previous one and applies the resulting batch at once.

use crate::context::SimContext;
use crate::error::SimError;
use crate::logger::Logger;
use serde::{Deserialize, Serialize};
use spread_core::{MultilayerNetwork, PropagationModel, StatesCount};
use spread_env::SpreadContext;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, trace, warn};

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Maximum number of epochs after the initial one
    pub n_epochs: usize,

    /// Stop after this many consecutive epochs without change
    pub patience: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_epochs: 50,
            patience: None,
        }
    }
}

/// Why a simulation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// All requested epochs were performed
    EpochBudget,

    /// Aggregated counts didn't change for `patience` epochs
    Patience { epoch: usize },

    /// The model or the network update returned an error
    Failed { epoch: usize },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EpochBudget => write!(f, "epoch budget exhausted"),
            StopReason::Patience { epoch } => write!(f, "no progress, stopped at epoch {epoch}"),
            StopReason::Failed { epoch } => write!(f, "failed at epoch {epoch}"),
        }
    }
}

/// Lifecycle of a simulator.
///
/// `Running` holds the epoch being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Initialised,
    Running { epoch: usize },
    Stopped(StopReason),
}

impl fmt::Display for SimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimState::Initialised => write!(f, "INITIALISED"),
            SimState::Running { epoch } => write!(f, "RUNNING({epoch})"),
            SimState::Stopped(reason) => write!(f, "STOPPED ({reason})"),
        }
    }
}

/// Runs one propagation of `M` over a network with randomness from `C`.
#[derive(Debug)]
pub struct Simulator<M, C = SimContext> {
    model: M,
    network: MultilayerNetwork,
    context: C,
    n_epochs: usize,
    patience: Option<usize>,
    state: SimState,
}

impl<M: PropagationModel> Simulator<M, SimContext> {
    /// Creates a simulator with a seeded context built from `config`.
    pub fn from_config(model: M, network: MultilayerNetwork, config: &SimConfig) -> Self {
        Self::new(model, network, SimContext::new(config.seed))
            .with_epochs(config.n_epochs)
            .with_patience(config.patience)
    }
}

impl<M: PropagationModel, C: SpreadContext> Simulator<M, C> {
    pub fn new(model: M, network: MultilayerNetwork, context: C) -> Self {
        let defaults = SimConfig::default();
        Self {
            model,
            network,
            context,
            n_epochs: defaults.n_epochs,
            patience: defaults.patience,
            state: SimState::Initialised,
        }
    }

    /// Sets the number of epochs for [`Self::run`].
    pub fn with_epochs(mut self, n_epochs: usize) -> Self {
        self.n_epochs = n_epochs;
        self
    }

    /// Sets the patience for [`Self::run`].
    pub fn with_patience(mut self, patience: Option<usize>) -> Self {
        self.patience = patience;
        self
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn network(&self) -> &MultilayerNetwork {
        &self.network
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn seed(&self) -> u64 {
        self.context.seed()
    }

    /// Performs the propagation with the configured epochs and patience.
    pub fn run(&mut self) -> Result<Logger, SimError> {
        self.perform_propagation(self.n_epochs, self.patience)
    }

    /// Performs the propagation and returns its logs.
    ///
    /// Stops after `n_epochs`, or earlier once the aggregated counts stay
    /// unchanged for `patience` consecutive epochs.
    pub fn perform_propagation(
        &mut self,
        n_epochs: usize,
        patience: Option<usize>,
    ) -> Result<Logger, SimError> {
        if patience == Some(0) {
            return Err(SimError::InvalidPatience);
        }
        if self.state != SimState::Initialised {
            return Err(SimError::AlreadyRun(self.state.to_string()));
        }

        info!(
            seed = self.context.seed(),
            n_epochs,
            ?patience,
            actors = self.network.actors_num(),
            "Starting propagation"
        );
        let mut logger = Logger::new(self.model.describe(), self.network.describe());
        let reason = match self.propagate(n_epochs, patience, &mut logger) {
            Ok(reason) => reason,
            Err(e) => {
                let epoch = match self.state {
                    SimState::Running { epoch } => epoch,
                    _ => 0,
                };
                self.state = SimState::Stopped(StopReason::Failed { epoch });
                warn!(epoch, error = %e, "Propagation failed");
                return Err(e);
            }
        };

        logger.convert_logs(&self.model.get_allowed_states(&self.network));
        self.state = SimState::Stopped(reason);
        info!(epochs = logger.epochs(), %reason, "Propagation finished");
        Ok(logger)
    }

    /// Seeds the network and runs the epochs, recording into `logger`.
    fn propagate(
        &mut self,
        n_epochs: usize,
        patience: Option<usize>,
        logger: &mut Logger,
    ) -> Result<StopReason, SimError> {
        self.state = SimState::Running { epoch: 0 };
        let initial = self
            .model
            .determine_initial_states(&self.network, self.context.rng())?;
        self.network.update(&initial)?;
        let mut previous = self.model.get_states_num(&self.network);
        debug!(counts = ?previous, "Initial states set");
        logger.add_global_stat(previous.clone());
        logger.add_local_stat(0, initial);

        let mut stagnant = 0usize;
        for epoch in 1..=n_epochs {
            self.state = SimState::Running { epoch };
            let changes = self
                .model
                .network_evaluation_step(&self.network, self.context.rng())?;
            self.network.update(&changes)?;
            let counts = self.model.get_states_num(&self.network);
            trace!(epoch, changes = changes.len(), ?counts, "Epoch finished");

            logger.add_global_stat(counts.clone());
            logger.add_local_stat(epoch, changes);

            if let Some(patience) = patience {
                if same_counts(&counts, &previous) {
                    stagnant += 1;
                } else {
                    stagnant = 0;
                }
                if stagnant >= patience {
                    info!(epoch, patience, "No progress, stopping propagation");
                    return Ok(StopReason::Patience { epoch });
                }
            }
            previous = counts;
        }
        Ok(StopReason::EpochBudget)
    }
}

/// Compares two snapshots regardless of the order states appear in.
fn same_counts(a: &StatesCount, b: &StatesCount) -> bool {
    let normalise = |counts: &StatesCount| -> BTreeMap<String, BTreeMap<String, usize>> {
        counts
            .iter()
            .map(|(layer, pairs)| (layer.clone(), pairs.iter().cloned().collect()))
            .collect()
    };
    normalise(a) == normalise(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::ring_lattice;
    use indexmap::IndexMap;
    use rand::RngCore;
    use spread_core::{
        Actor, CompartmentalGraph, MltModel, MockingSelector, NetworkUpdateBuffer, Protocol,
        SeedingBudget, SpreadError,
    };

    fn threshold_sim(seed: u64) -> Simulator<MltModel> {
        let model = MltModel::new(
            SeedingBudget::Percent(vec![80.0, 20.0]),
            spread_core::RandomSelector,
            Protocol::Or,
            0.4,
        )
        .unwrap();
        let net = MultilayerNetwork::replicated(&ring_lattice(30, 4), ["a", "b"]);
        Simulator::new(model, net, SimContext::new(seed))
    }

    fn counts(pairs: &[(&str, &[(&str, usize)])]) -> StatesCount {
        pairs
            .iter()
            .map(|(layer, states)| {
                (
                    layer.to_string(),
                    states.iter().map(|(s, n)| (s.to_string(), *n)).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_same_counts_ignores_order() {
        let a = counts(&[("l", &[("S", 2), ("I", 1)])]);
        let b = counts(&[("l", &[("I", 1), ("S", 2)])]);
        let c = counts(&[("l", &[("I", 2), ("S", 1)])]);
        assert!(same_counts(&a, &b));
        assert!(!same_counts(&a, &c));
    }

    #[test]
    fn test_lifecycle() {
        let mut sim = threshold_sim(1);
        assert_eq!(sim.state(), SimState::Initialised);
        let logger = sim.perform_propagation(5, None).unwrap();
        assert_eq!(sim.state(), SimState::Stopped(StopReason::EpochBudget));
        assert_eq!(logger.epochs(), 5);
        assert!(matches!(sim.perform_propagation(5, None), Err(SimError::AlreadyRun(_))));
    }

    #[test]
    fn test_zero_patience_rejected() {
        let mut sim = threshold_sim(1);
        assert!(matches!(sim.perform_propagation(5, Some(0)), Err(SimError::InvalidPatience)));
        assert_eq!(sim.state(), SimState::Initialised);
    }

    #[test]
    fn test_patience_stops_on_repeat() {
        // threshold 1.0 can never be exceeded: nothing moves after seeding
        let ranking = (0..10u64).map(spread_core::ActorId::from).collect();
        let model = MltModel::new(
            SeedingBudget::Percent(vec![90.0, 10.0]),
            MockingSelector::new(ranking).unwrap(),
            Protocol::Or,
            1.0,
        )
        .unwrap();
        let net = MultilayerNetwork::replicated(&ring_lattice(10, 2), ["a"]);
        let mut sim = Simulator::new(model, net, SimContext::new(3));
        let logger = sim.perform_propagation(20, Some(1)).unwrap();
        assert_eq!(logger.epochs(), 1);
        assert_eq!(sim.state(), SimState::Stopped(StopReason::Patience { epoch: 1 }));
    }

    #[test]
    fn test_builder_runs_configured_epochs() {
        let config = SimConfig {
            seed: 9,
            n_epochs: 3,
            patience: None,
        };
        let model = MltModel::new(
            SeedingBudget::Percent(vec![80.0, 20.0]),
            spread_core::RandomSelector,
            Protocol::And,
            0.5,
        )
        .unwrap();
        let net = MultilayerNetwork::replicated(&ring_lattice(20, 2), ["a"]);
        let mut sim = Simulator::from_config(model, net, &config);
        assert_eq!(sim.seed(), 9);
        let logger = sim.run().unwrap();
        assert_eq!(logger.epochs(), 3);
        assert_eq!(logger.converted()["a"].epochs(), 4);
    }

    #[test]
    fn test_same_seed_same_run() {
        let a = threshold_sim(17).perform_propagation(10, None).unwrap();
        let b = threshold_sim(17).perform_propagation(10, None).unwrap();
        assert_eq!(a.converted(), b.converted());
        assert_eq!(a.get_detailed_logs(), b.get_detailed_logs());
    }

    /// Threshold model whose epochs fail from `fail_at` on.
    struct FailingModel {
        inner: MltModel,
        fail_at: usize,
        epochs: std::cell::Cell<usize>,
    }

    impl fmt::Display for FailingModel {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Display::fmt(&self.inner, f)
        }
    }

    impl PropagationModel for FailingModel {
        fn compartments(&self) -> &CompartmentalGraph {
            self.inner.compartments()
        }

        fn determine_initial_states(
            &self,
            net: &MultilayerNetwork,
            rng: &mut dyn RngCore,
        ) -> spread_core::Result<Vec<NetworkUpdateBuffer>> {
            self.inner.determine_initial_states(net, rng)
        }

        fn agent_evaluation_step(
            &self,
            actor: &Actor,
            layer: &str,
            net: &MultilayerNetwork,
            rng: &mut dyn RngCore,
        ) -> spread_core::Result<String> {
            self.inner.agent_evaluation_step(actor, layer, net, rng)
        }

        fn network_evaluation_step(
            &self,
            net: &MultilayerNetwork,
            rng: &mut dyn RngCore,
        ) -> spread_core::Result<Vec<NetworkUpdateBuffer>> {
            let epoch = self.epochs.get() + 1;
            self.epochs.set(epoch);
            if epoch >= self.fail_at {
                return Err(SpreadError::UnknownLayer("gone".into()));
            }
            self.inner.network_evaluation_step(net, rng)
        }

        fn get_allowed_states(&self, net: &MultilayerNetwork) -> IndexMap<String, Vec<String>> {
            self.inner.get_allowed_states(net)
        }
    }

    #[test]
    fn test_failed_epoch_stops_simulator() {
        let model = FailingModel {
            inner: MltModel::new(
                SeedingBudget::Percent(vec![80.0, 20.0]),
                spread_core::RandomSelector,
                Protocol::Or,
                0.4,
            )
            .unwrap(),
            fail_at: 3,
            epochs: std::cell::Cell::new(0),
        };
        let net = MultilayerNetwork::replicated(&ring_lattice(30, 4), ["a"]);
        let mut sim = Simulator::new(model, net, SimContext::new(5));

        let err = sim.perform_propagation(10, None).unwrap_err();
        assert!(matches!(err, SimError::Spread(SpreadError::UnknownLayer(_))));
        assert_eq!(sim.state(), SimState::Stopped(StopReason::Failed { epoch: 3 }));
        assert_eq!(sim.state().to_string(), "STOPPED (failed at epoch 3)");

        // a failed simulator can't be restarted
        assert!(matches!(sim.perform_propagation(10, None), Err(SimError::AlreadyRun(_))));
    }
}
