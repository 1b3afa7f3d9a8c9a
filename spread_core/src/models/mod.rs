//! Propagation models.
//!
//! A model reads a snapshot of the network and proposes the next one. It
//! never writes to the network: every step returns [`NetworkUpdateBuffer`]s
//! and the caller applies them with [`MultilayerNetwork::update`].
//!
//! Concrete models:
//! - [`DsaaModel`]: general compartmental model, one process per layer
//! - [`MicModel`]: Multilayer Independent Cascade
//! - [`MltModel`]: Multilayer Linear Threshold

mod dsaa;
mod mic;
mod mlt;
mod protocol;

pub use dsaa::DsaaModel;
pub use mic::MicModel;
pub use mlt::MltModel;
pub use protocol::Protocol;

use crate::actor::Actor;
use crate::compartments::CompartmentalGraph;
use crate::error::{Result, SpreadError};
use crate::network::{MultilayerNetwork, NetworkUpdateBuffer, StatesCount};
use indexmap::IndexMap;
use rand::RngCore;
use spread_env::ActorId;
use std::collections::HashMap;
use std::fmt;

/// Contract every propagation model satisfies.
///
/// All stochastic draws come from the `rng` argument; the same stream in the
/// same state yields the same proposals.
pub trait PropagationModel: fmt::Display {
    /// Compartmental graph holding the model's states and transitions.
    fn compartments(&self) -> &CompartmentalGraph;

    /// Proposes the initial state of every node from the seed ranking and
    /// the seeding budget.
    fn determine_initial_states(
        &self,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<NetworkUpdateBuffer>>;

    /// Returns the state `actor` should take in `layer` after this epoch.
    fn agent_evaluation_step(
        &self,
        actor: &Actor,
        layer: &str,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<String>;

    /// Evaluates every actor once and returns the changes for this epoch.
    ///
    /// Only nodes whose state changes are listed.
    fn network_evaluation_step(
        &self,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<NetworkUpdateBuffer>>;

    /// States each layer may take under this model.
    fn get_allowed_states(&self, net: &MultilayerNetwork) -> IndexMap<String, Vec<String>>;

    /// Aggregated state counts used by the logger.
    fn get_states_num(&self, net: &MultilayerNetwork) -> StatesCount {
        net.states_num()
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

/// Closed set of models the simulator can drive.
#[derive(Debug)]
pub enum Model {
    Dsaa(DsaaModel),
    Mic(MicModel),
    Mlt(MltModel),
}

impl Model {
    fn inner(&self) -> &dyn PropagationModel {
        match self {
            Model::Dsaa(m) => m,
            Model::Mic(m) => m,
            Model::Mlt(m) => m,
        }
    }

    /// Short name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            Model::Dsaa(_) => "dsaa",
            Model::Mic(_) => "mic",
            Model::Mlt(_) => "mlt",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.inner(), f)
    }
}

impl PropagationModel for Model {
    fn compartments(&self) -> &CompartmentalGraph {
        self.inner().compartments()
    }

    fn determine_initial_states(
        &self,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<NetworkUpdateBuffer>> {
        self.inner().determine_initial_states(net, rng)
    }

    fn agent_evaluation_step(
        &self,
        actor: &Actor,
        layer: &str,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<String> {
        self.inner().agent_evaluation_step(actor, layer, net, rng)
    }

    fn network_evaluation_step(
        &self,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<NetworkUpdateBuffer>> {
        self.inner().network_evaluation_step(net, rng)
    }

    fn get_allowed_states(&self, net: &MultilayerNetwork) -> IndexMap<String, Vec<String>> {
        self.inner().get_allowed_states(net)
    }

    fn get_states_num(&self, net: &MultilayerNetwork) -> StatesCount {
        self.inner().get_states_num(net)
    }
}

impl From<DsaaModel> for Model {
    fn from(model: DsaaModel) -> Self {
        Model::Dsaa(model)
    }
}

impl From<MicModel> for Model {
    fn from(model: MicModel) -> Self {
        Model::Mic(model)
    }
}

impl From<MltModel> for Model {
    fn from(model: MltModel) -> Self {
        Model::Mlt(model)
    }
}

/// Emits one buffer per layer of `actor` whose state differs from `new_state`.
pub(crate) fn actor_changes(actor: &Actor, new_state: &str) -> Vec<NetworkUpdateBuffer> {
    actor
        .states()
        .iter()
        .filter(|(_, state)| state.as_deref() != Some(new_state))
        .map(|(layer, _)| NetworkUpdateBuffer::new(actor.id().clone(), layer.clone(), new_state))
        .collect()
}

/// Per-layer allowed states when one process spans every layer.
pub(crate) fn single_process_states(
    compartments: &CompartmentalGraph,
    process: &str,
    net: &MultilayerNetwork,
) -> IndexMap<String, Vec<String>> {
    let states = compartments
        .compartments()
        .get(process)
        .cloned()
        .unwrap_or_default();
    net.layer_names()
        .into_iter()
        .map(|layer| (layer, states.clone()))
        .collect()
}

/// Checks that the initial buffers give every node of `net` exactly one state.
pub(crate) fn check_initial_states(
    net: &MultilayerNetwork,
    initial: &[NetworkUpdateBuffer],
) -> Result<()> {
    let mut assigned: HashMap<(&str, &ActorId), usize> = HashMap::with_capacity(initial.len());
    for buffer in initial {
        *assigned.entry((buffer.layer.as_str(), &buffer.actor)).or_insert(0) += 1;
    }
    for (layer, graph) in net.layers() {
        for node in graph.nodes() {
            let count = assigned.get(&(layer, node)).copied().unwrap_or(0);
            if count != 1 {
                return Err(SpreadError::IncompleteSeeding {
                    layer: layer.to_string(),
                    node: node.to_string(),
                    assigned: count,
                });
            }
        }
    }
    Ok(())
}
