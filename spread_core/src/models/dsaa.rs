//! DSAA model - one process per layer, transitions driven by neighbours.
//!
//! A node may move to state `X` of its layer only if the compartmental
//! graph allows the move from the actor's current joint state, and only
//! through a neighbour already in `X`: each such neighbour gets one
//! Bernoulli trial with the transition weight.

use super::{check_initial_states, PropagationModel};
use crate::actor::Actor;
use crate::compartments::CompartmentalGraph;
use crate::error::{Result, SpreadError};
use crate::network::{MultilayerNetwork, NetworkUpdateBuffer};
use crate::seeding::{RandomSelector, SeedSelector};
use crate::{BOLD_UNDERLINE, THIN_UNDERLINE};
use indexmap::IndexMap;
use rand::{Rng, RngCore};
use spread_env::ActorId;
use std::fmt;
use tracing::trace;

/// Compartmental model where every layer hosts the process of the same name.
#[derive(Debug)]
pub struct DsaaModel {
    compartments: CompartmentalGraph,
    selector: Box<dyn SeedSelector>,
}

impl DsaaModel {
    /// Creates the model with a random seed selector.
    ///
    /// The graph must be compiled and carry a seeding budget.
    pub fn new(compartments: CompartmentalGraph) -> Result<Self> {
        if !compartments.is_compiled() {
            return Err(SpreadError::NotCompiled);
        }
        if compartments.seeding_budget().is_empty() {
            return Err(SpreadError::budget("seeding budget is not set"));
        }
        Ok(Self {
            compartments,
            selector: Box::new(RandomSelector),
        })
    }

    /// Replaces the seed selector.
    pub fn with_selector(mut self, selector: impl SeedSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }
}

impl fmt::Display for DsaaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{BOLD_UNDERLINE}\nDSAA Model\n{THIN_UNDERLINE}")?;
        writeln!(f, "{}", self.compartments.describe(false))?;
        write!(f, "{}{BOLD_UNDERLINE}", self.selector)
    }
}

impl PropagationModel for DsaaModel {
    fn compartments(&self) -> &CompartmentalGraph {
        &self.compartments
    }

    /// Splits each layer's ranking into consecutive blocks, one per state,
    /// sized by the nodewise seeding budget.
    fn determine_initial_states(
        &self,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<NetworkUpdateBuffer>> {
        let budget = self.compartments.get_seeding_budget_for_network(net, false)?;
        let mut initial = Vec::with_capacity(net.nodes_num().values().sum());

        for (layer, ranking) in self.selector.nodewise(net, rng)? {
            let layer_budget = budget
                .get(&layer)
                .ok_or_else(|| SpreadError::UnknownProcess(layer.clone()))?;
            let needed: usize = layer_budget.values().sum();
            if ranking.len() < needed {
                return Err(SpreadError::RankingExhausted {
                    needed,
                    available: ranking.len(),
                });
            }

            let mut ranked = ranking.into_iter();
            for (state, count) in layer_budget {
                for node in ranked.by_ref().take(*count) {
                    initial.push(NetworkUpdateBuffer::new(node, layer.clone(), state.clone()));
                }
            }
        }
        check_initial_states(net, &initial)?;
        Ok(initial)
    }

    fn agent_evaluation_step(
        &self,
        actor: &Actor,
        layer: &str,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<String> {
        let current = actor.state(layer).ok_or_else(|| SpreadError::UnsetState {
            actor: actor.id().to_string(),
            layer: layer.to_string(),
        })?;

        let available = match self
            .compartments
            .get_possible_transitions(&actor.joint_state()?[..], layer)
        {
            Ok(available) => available,
            Err(SpreadError::UnknownJointState { state, .. }) => {
                trace!(actor = %actor.id(), ?state, "No transitions for joint state");
                return Ok(current.to_string());
            }
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return Ok(current.to_string());
        }

        let graph = net.layer(layer)?;
        for neighbour in graph.neighbours(actor.id())? {
            let Some(candidate) = graph.status(neighbour)? else {
                continue;
            };
            if let Some(&weight) = available.get(candidate) {
                if rng.gen_bool(weight) {
                    return Ok(candidate.to_string());
                }
            }
        }
        Ok(current.to_string())
    }

    fn network_evaluation_step(
        &self,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<NetworkUpdateBuffer>> {
        let actors: IndexMap<ActorId, Actor> = net
            .get_actors()
            .into_iter()
            .map(|a| (a.id().clone(), a))
            .collect();

        let mut changes = Vec::new();
        for (layer, graph) in net.layers() {
            for node in graph.nodes() {
                let actor = actors
                    .get(node)
                    .ok_or_else(|| SpreadError::unknown_actor(node))?;
                let new_state = self.agent_evaluation_step(actor, layer, net, rng)?;
                if actor.state(layer) != Some(new_state.as_str()) {
                    changes.push(NetworkUpdateBuffer::new(node.clone(), layer, new_state));
                }
            }
        }
        Ok(changes)
    }

    /// Each layer is bound to the process of the same name.
    fn get_allowed_states(&self, _net: &MultilayerNetwork) -> IndexMap<String, Vec<String>> {
        self.compartments.compartments().clone()
    }
}
