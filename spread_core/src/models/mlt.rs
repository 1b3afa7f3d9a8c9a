//! Multilayer Linear Threshold.
//!
//! A node receives a positive input in its layer when the fraction of its
//! active neighbours exceeds the threshold `mi`. The protocol combines the
//! inputs of all layers; once active, an actor stays active.

use super::{actor_changes, check_initial_states, single_process_states, PropagationModel, Protocol};
use crate::actor::Actor;
use crate::compartments::{CompartmentalGraph, SeedingBudget};
use crate::error::{Result, SpreadError};
use crate::network::{MultilayerNetwork, NetworkUpdateBuffer};
use crate::seeding::SeedSelector;
use crate::{BOLD_UNDERLINE, THIN_UNDERLINE};
use indexmap::IndexMap;
use rand::RngCore;
use std::fmt;

#[derive(Debug)]
pub struct MltModel {
    compartments: CompartmentalGraph,
    selector: Box<dyn SeedSelector>,
    protocol: Protocol,
}

impl MltModel {
    pub const PROCESS_NAME: &'static str = "MLTM";
    pub const INACTIVE: &'static str = "0";
    pub const ACTIVE: &'static str = "1";

    /// Creates the model.
    ///
    /// `seeding_budget` lists the inactive and active shares; `mi` is the
    /// activation threshold in [0, 1].
    pub fn new(
        seeding_budget: SeedingBudget,
        selector: impl SeedSelector + 'static,
        protocol: Protocol,
        mi: f64,
    ) -> Result<Self> {
        let mut compartments = CompartmentalGraph::new();
        compartments.add(Self::PROCESS_NAME, &[Self::INACTIVE, Self::ACTIVE])?;
        compartments.set_seeding_budget([(Self::PROCESS_NAME, seeding_budget)])?;
        compartments.compile(0.0)?;
        compartments.set_transition_fast(
            &format!("{}.{}", Self::PROCESS_NAME, Self::INACTIVE),
            &format!("{}.{}", Self::PROCESS_NAME, Self::ACTIVE),
            &[],
            mi,
        )?;

        Ok(Self {
            compartments,
            selector: Box::new(selector),
            protocol,
        })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Compiled activation threshold.
    pub fn threshold(&self) -> Result<f64> {
        let inactive = [format!("{}.{}", Self::PROCESS_NAME, Self::INACTIVE)];
        let available = self
            .compartments
            .get_possible_transitions(&inactive, Self::PROCESS_NAME)?;
        // a zero threshold is not listed as a possible transition
        Ok(available.get(Self::ACTIVE).copied().unwrap_or(0.0))
    }
}

impl fmt::Display for MltModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{BOLD_UNDERLINE}\nMultilayer Linear Threshold Model\n{THIN_UNDERLINE}")?;
        writeln!(f, "{}", self.compartments.describe(false))?;
        write!(f, "{}", self.selector)?;
        writeln!(f, "{BOLD_UNDERLINE}\nauxiliary parameters\n{THIN_UNDERLINE}")?;
        writeln!(f, "\tprotocol: {}", self.protocol)?;
        writeln!(f, "\tactive state abbreviation: {}", Self::ACTIVE)?;
        writeln!(f, "\tinactive state abbreviation: {}", Self::INACTIVE)?;
        write!(f, "{BOLD_UNDERLINE}")
    }
}

impl PropagationModel for MltModel {
    fn compartments(&self) -> &CompartmentalGraph {
        &self.compartments
    }

    fn determine_initial_states(
        &self,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<NetworkUpdateBuffer>> {
        let budget = self.compartments.get_seeding_budget_for_network(net, true)?;
        let active = budget
            .get(Self::PROCESS_NAME)
            .and_then(|counts| counts.get(Self::ACTIVE))
            .copied()
            .unwrap_or(0);

        let ranking = self.selector.actorwise(net, rng)?;
        if ranking.len() < net.actors_num() {
            return Err(SpreadError::RankingExhausted {
                needed: net.actors_num(),
                available: ranking.len(),
            });
        }

        let mut initial = Vec::new();
        for (idx, id) in ranking.iter().enumerate() {
            let state = if idx < active { Self::ACTIVE } else { Self::INACTIVE };
            let actor = net.get_actor(id)?;
            initial.extend(
                actor
                    .layers()
                    .map(|layer| NetworkUpdateBuffer::new(id.clone(), layer, state)),
            );
        }
        check_initial_states(net, &initial)?;
        Ok(initial)
    }

    fn agent_evaluation_step(
        &self,
        actor: &Actor,
        layer: &str,
        net: &MultilayerNetwork,
        _rng: &mut dyn RngCore,
    ) -> Result<String> {
        let current = actor.state(layer).ok_or_else(|| SpreadError::UnsetState {
            actor: actor.id().to_string(),
            layer: layer.to_string(),
        })?;
        if current == Self::ACTIVE {
            return Ok(current.to_string());
        }

        let graph = net.layer(layer)?;
        let degree = graph.degree(actor.id())?;
        if degree == 0 {
            return Ok(current.to_string());
        }
        let mut active = 0usize;
        for neighbour in graph.neighbours(actor.id())? {
            if graph.status(neighbour)? == Some(Self::ACTIVE) {
                active += 1;
            }
        }

        let impulse = active as f64 / degree as f64;
        if impulse > self.threshold()? {
            Ok(Self::ACTIVE.to_string())
        } else {
            Ok(current.to_string())
        }
    }

    fn network_evaluation_step(
        &self,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<NetworkUpdateBuffer>> {
        let mut changes = Vec::new();
        for actor in net.get_actors_shuffled(rng) {
            if actor.is_uniformly(Self::ACTIVE) {
                continue;
            }
            let inputs = actor
                .layers()
                .map(|layer| self.agent_evaluation_step(&actor, layer, net, rng))
                .collect::<Result<Vec<_>>>()?;

            let new_state = if self.protocol.evaluate(inputs.iter().map(|s| s == Self::ACTIVE)) {
                Self::ACTIVE
            } else {
                Self::INACTIVE
            };
            changes.extend(actor_changes(&actor, new_state));
        }
        Ok(changes)
    }

    fn get_allowed_states(&self, net: &MultilayerNetwork) -> IndexMap<String, Vec<String>> {
        single_process_states(&self.compartments, Self::PROCESS_NAME, net)
    }
}
