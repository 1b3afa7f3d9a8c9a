//! Scenario runner - builds and executes the built-in scenarios.

use crate::context::SimContext;
use crate::error::SimError;
use crate::logger::Logger;
use crate::scenarios::ScenarioId;
use crate::simulator::{SimConfig, SimState, Simulator, StopReason};
use crate::topology::{les_miserables, small_world};

use indexmap::IndexMap;
use spread_core::{
    CompartmentalGraph, DegreeCentralitySelector, MicModel, MltModel, Model, MultilayerNetwork,
    PropagationModel, Protocol, RandomSelector, SeedingBudget, StatesCount,
};
use tracing::{debug, info, warn};

/// Expected counts per layer, layer -> state -> count.
type Expected = IndexMap<String, IndexMap<String, usize>>;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Name of the model variant
    pub model: &'static str,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Epochs performed after the initial one
    pub epochs_run: usize,

    pub stop_reason: Option<StopReason>,

    /// Aggregated counts after the last epoch
    pub final_counts: StatesCount,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Full logs of the run
    pub logger: Logger,
}

/// A scenario ready to run: model, network and what must hold afterwards.
#[derive(Debug)]
pub struct ScenarioSetup {
    pub model: Model,
    pub network: MultilayerNetwork,

    /// Counts every layer must show at epoch 0
    pub expected_initial: Expected,

    /// `(layer, state)` pairs whose count may never decrease
    pub absorbing: Vec<(String, String)>,
}

/// Runs propagation scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Maximum number of epochs
    n_epochs: usize,

    /// Early stop after this many stagnant epochs
    patience: Option<usize>,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        let defaults = SimConfig::default();
        Self {
            seed,
            n_epochs: defaults.n_epochs,
            patience: defaults.patience,
        }
    }

    /// Sets the number of epochs.
    pub fn with_epochs(mut self, n_epochs: usize) -> Self {
        self.n_epochs = n_epochs;
        self
    }

    /// Sets the patience.
    pub fn with_patience(mut self, patience: Option<usize>) -> Self {
        self.patience = patience;
        self
    }

    /// Builds the model and network of a scenario.
    pub fn setup(&self, scenario: ScenarioId) -> Result<ScenarioSetup, SimError> {
        let ctx = SimContext::new(self.seed);
        match scenario {
            ScenarioId::Dsaa => dsaa_setup(),
            ScenarioId::Cascade => cascade_setup(&ctx),
            ScenarioId::Threshold => threshold_setup(&ctx),
        }
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> Result<ScenarioResult, SimError> {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let setup = self.setup(scenario)?;
        let model = setup.model.name();
        let nodes = setup.network.nodes_num();
        let mut simulator = Simulator::new(setup.model, setup.network, SimContext::new(self.seed))
            .with_epochs(self.n_epochs)
            .with_patience(self.patience);
        let logger = simulator.run()?;
        let stop_reason = match simulator.state() {
            SimState::Stopped(reason) => Some(reason),
            _ => None,
        };

        let failure_reason = check_conservation(&logger, &nodes)
            .or_else(|| check_initial(&logger, &setup.expected_initial))
            .or_else(|| check_absorbing(&logger, &setup.absorbing));
        let passed = failure_reason.is_none();
        if let Some(reason) = &failure_reason {
            warn!(scenario = scenario.name(), "{reason}");
        }

        let final_counts = logger
            .get_aggregated_logs()
            .last()
            .cloned()
            .unwrap_or_default();
        debug!(?final_counts, "Scenario finished");

        Ok(ScenarioResult {
            scenario,
            model,
            seed: self.seed,
            passed,
            epochs_run: logger.epochs(),
            stop_reason,
            final_counts,
            failure_reason,
            logger,
        })
    }
}

/// The three coupled processes: `ill:[S,I,R]`, `aware:[UA,A]`, `vacc:[UV,V]`.
///
/// Compiled with background weight 0 and eleven explicit transitions.
pub fn dsaa_compartments() -> Result<CompartmentalGraph, SimError> {
    let mut graph = CompartmentalGraph::new();
    graph.add("ill", &["S", "I", "R"])?;
    graph.add("aware", &["UA", "A"])?;
    graph.add("vacc", &["UV", "V"])?;
    graph.compile(0.0)?;

    graph.set_transition_fast("ill.S", "ill.I", &["vacc.UV", "aware.UA"], 0.9)?;
    graph.set_transition_fast("ill.S", "ill.I", &["vacc.V", "aware.A"], 0.05)?;
    graph.set_transition_fast("ill.S", "ill.I", &["vacc.UV", "aware.A"], 0.2)?;
    graph.set_transition_fast("ill.I", "ill.R", &["vacc.UV", "aware.UA"], 0.1)?;
    graph.set_transition_fast("ill.I", "ill.R", &["vacc.V", "aware.A"], 0.7)?;
    graph.set_transition_fast("ill.I", "ill.R", &["vacc.UV", "aware.A"], 0.3)?;
    graph.set_transition_fast("vacc.UV", "vacc.V", &["aware.A", "ill.S"], 0.03)?;
    graph.set_transition_fast("vacc.UV", "vacc.V", &["aware.A", "ill.I"], 0.01)?;
    graph.set_transition_fast("aware.UA", "aware.A", &["vacc.UV", "ill.S"], 0.05)?;
    graph.set_transition_fast("aware.UA", "aware.A", &["vacc.V", "ill.S"], 1.0)?;
    graph.set_transition_fast("aware.UA", "aware.A", &["vacc.UV", "ill.I"], 0.2)?;

    graph.set_seeding_budget([
        ("ill", SeedingBudget::Percent(vec![84.0, 13.0, 3.0])),
        ("aware", SeedingBudget::Percent(vec![77.0, 23.0])),
        ("vacc", SeedingBudget::Percent(vec![90.0, 10.0])),
    ])?;
    Ok(graph)
}

/// The Les Miserables graph copied into the `ill`, `aware` and `vacc` layers.
pub fn dsaa_network() -> MultilayerNetwork {
    MultilayerNetwork::replicated(&les_miserables(), ["ill", "aware", "vacc"])
}

fn dsaa_setup() -> Result<ScenarioSetup, SimError> {
    let compartments = dsaa_compartments()?;
    let network = dsaa_network();
    let expected_initial = compartments.get_seeding_budget_for_network(&network, false)?;
    let model = spread_core::DsaaModel::new(compartments)?;
    Ok(ScenarioSetup {
        model: model.into(),
        network,
        expected_initial,
        absorbing: vec![("ill".into(), "R".into())],
    })
}

/// Independent layers over the same actors `0..n`, each from its own derived stream.
fn small_world_layers(
    ctx: &SimContext,
    names: &[&str],
    n: usize,
    k: usize,
    p: f64,
) -> Result<MultilayerNetwork, SimError> {
    let graphs = (0..names.len())
        .map(|i| {
            let mut rng = ctx.derive_rng(i as u64 + 1);
            small_world(n, k, p, &mut rng)
        })
        .collect();
    let names = names.iter().map(|s| s.to_string()).collect();
    Ok(MultilayerNetwork::from_layers(graphs, Some(names))?)
}

/// Budget of a single-process model replicated on every layer.
fn actorwise_expected(
    model: &dyn PropagationModel,
    network: &MultilayerNetwork,
) -> Result<Expected, SimError> {
    let budget = model
        .compartments()
        .get_seeding_budget_for_network(network, true)?;
    let counts = budget.into_iter().next().map(|(_, c)| c).unwrap_or_default();
    Ok(network
        .layer_names()
        .into_iter()
        .map(|layer| (layer, counts.clone()))
        .collect())
}

fn cascade_setup(ctx: &SimContext) -> Result<ScenarioSetup, SimError> {
    let network = small_world_layers(ctx, &["contact", "online"], 100, 4, 0.3)?;
    let model = MicModel::new(
        SeedingBudget::Percent(vec![90.0, 10.0, 0.0]),
        RandomSelector,
        Protocol::Or,
        0.3,
    )?;
    let expected_initial = actorwise_expected(&model, &network)?;
    let absorbing = network
        .layer_names()
        .into_iter()
        .map(|layer| (layer, MicModel::ACTIVATED.to_string()))
        .collect();
    Ok(ScenarioSetup {
        model: model.into(),
        network,
        expected_initial,
        absorbing,
    })
}

fn threshold_setup(ctx: &SimContext) -> Result<ScenarioSetup, SimError> {
    let network = small_world_layers(ctx, &["family", "work", "online"], 60, 6, 0.2)?;
    let model = MltModel::new(
        SeedingBudget::Percent(vec![80.0, 20.0]),
        DegreeCentralitySelector,
        Protocol::And,
        0.2,
    )?;
    let expected_initial = actorwise_expected(&model, &network)?;
    let absorbing = network
        .layer_names()
        .into_iter()
        .map(|layer| (layer, MltModel::ACTIVE.to_string()))
        .collect();
    Ok(ScenarioSetup {
        model: model.into(),
        network,
        expected_initial,
        absorbing,
    })
}

fn count(log: &StatesCount, layer: &str, state: &str) -> usize {
    log.get(layer)
        .and_then(|pairs| pairs.iter().find(|(s, _)| s == state))
        .map_or(0, |(_, n)| *n)
}

/// Every epoch, every layer accounts for all of its nodes.
fn check_conservation(logger: &Logger, nodes: &IndexMap<String, usize>) -> Option<String> {
    for (epoch, log) in logger.get_aggregated_logs().iter().enumerate() {
        for (layer, expected) in nodes {
            let total: usize = log.get(layer).map_or(0, |pairs| pairs.iter().map(|(_, n)| n).sum());
            if total != *expected {
                return Some(format!(
                    "epoch {epoch}: layer '{layer}' counts {total} nodes, expected {expected}"
                ));
            }
        }
    }
    None
}

fn check_initial(logger: &Logger, expected: &Expected) -> Option<String> {
    let Some(initial) = logger.get_aggregated_logs().first() else {
        return Some("no epoch was logged".to_string());
    };
    for (layer, states) in expected {
        for (state, n) in states {
            let got = count(initial, layer, state);
            if got != *n {
                return Some(format!(
                    "epoch 0: {layer}.{state} = {got}, seeding budget gives {n}"
                ));
            }
        }
    }
    None
}

fn check_absorbing(logger: &Logger, absorbing: &[(String, String)]) -> Option<String> {
    for (layer, state) in absorbing {
        let series: Vec<usize> = logger
            .get_aggregated_logs()
            .iter()
            .map(|log| count(log, layer, state))
            .collect();
        if let Some(epoch) = series.windows(2).position(|w| w[1] < w[0]) {
            return Some(format!("{layer}.{state} decreased after epoch {epoch}"));
        }
    }
    None
}
