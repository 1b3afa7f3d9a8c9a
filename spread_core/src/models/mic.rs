//! Multilayer Independent Cascade.
//!
//! States: `0` inactive, `1` active, `-1` activated. An active actor gets
//! one epoch to activate its inactive neighbours (one trial per active
//! neighbour and layer), then becomes activated and never changes again.

use super::{actor_changes, check_initial_states, single_process_states, PropagationModel, Protocol};
use crate::actor::Actor;
use crate::compartments::{CompartmentalGraph, SeedingBudget};
use crate::error::{Result, SpreadError};
use crate::network::{MultilayerNetwork, NetworkUpdateBuffer};
use crate::seeding::SeedSelector;
use crate::{BOLD_UNDERLINE, THIN_UNDERLINE};
use indexmap::IndexMap;
use rand::{Rng, RngCore};
use std::fmt;

#[derive(Debug)]
pub struct MicModel {
    compartments: CompartmentalGraph,
    selector: Box<dyn SeedSelector>,
    protocol: Protocol,
}

impl MicModel {
    pub const PROCESS_NAME: &'static str = "MICM";
    pub const INACTIVE: &'static str = "0";
    pub const ACTIVE: &'static str = "1";
    pub const ACTIVATED: &'static str = "-1";

    /// Creates the model.
    ///
    /// `seeding_budget` lists the inactive, active and activated shares.
    /// `probability` is the chance that one active neighbour activates an
    /// inactive node within a layer.
    pub fn new(
        seeding_budget: SeedingBudget,
        selector: impl SeedSelector + 'static,
        protocol: Protocol,
        probability: f64,
    ) -> Result<Self> {
        let mut compartments = CompartmentalGraph::new();
        compartments.add(
            Self::PROCESS_NAME,
            &[Self::INACTIVE, Self::ACTIVE, Self::ACTIVATED],
        )?;
        compartments.set_seeding_budget([(Self::PROCESS_NAME, seeding_budget)])?;
        compartments.compile(0.0)?;
        compartments.set_transition_fast(&Self::label(Self::INACTIVE), &Self::label(Self::ACTIVE), &[], probability)?;
        compartments.set_transition_fast(&Self::label(Self::ACTIVE), &Self::label(Self::ACTIVATED), &[], 1.0)?;

        Ok(Self {
            compartments,
            selector: Box::new(selector),
            protocol,
        })
    }

    fn label(state: &str) -> String {
        format!("{}.{state}", Self::PROCESS_NAME)
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Compiled activation probability.
    pub fn probability(&self) -> Result<f64> {
        let available = self
            .compartments
            .get_possible_transitions(&[Self::label(Self::INACTIVE)], Self::PROCESS_NAME)?;
        Ok(available.get(Self::ACTIVE).copied().unwrap_or(0.0))
    }
}

impl fmt::Display for MicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{BOLD_UNDERLINE}\nMultilayer Independent Cascade Model\n{THIN_UNDERLINE}")?;
        writeln!(f, "{}", self.compartments.describe(false))?;
        write!(f, "{}", self.selector)?;
        writeln!(f, "{BOLD_UNDERLINE}\nauxiliary parameters\n{THIN_UNDERLINE}")?;
        writeln!(f, "\tprotocol: {}", self.protocol)?;
        writeln!(f, "\tinactive state abbreviation: {}", Self::INACTIVE)?;
        writeln!(f, "\tactive state abbreviation: {}", Self::ACTIVE)?;
        writeln!(f, "\tactivated state abbreviation: {}", Self::ACTIVATED)?;
        write!(f, "{BOLD_UNDERLINE}")
    }
}

impl PropagationModel for MicModel {
    fn compartments(&self) -> &CompartmentalGraph {
        &self.compartments
    }

    /// Top-ranked actors start active, the next ones activated and the
    /// rest inactive, in the amounts given by the actorwise budget.
    fn determine_initial_states(
        &self,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<NetworkUpdateBuffer>> {
        let budget = self.compartments.get_seeding_budget_for_network(net, true)?;
        let counts = budget
            .get(Self::PROCESS_NAME)
            .ok_or_else(|| SpreadError::UnknownProcess(Self::PROCESS_NAME.to_string()))?;
        let active = counts.get(Self::ACTIVE).copied().unwrap_or(0);
        let activated = counts.get(Self::ACTIVATED).copied().unwrap_or(0);

        let ranking = self.selector.actorwise(net, rng)?;
        if ranking.len() < net.actors_num() {
            return Err(SpreadError::RankingExhausted {
                needed: net.actors_num(),
                available: ranking.len(),
            });
        }

        let mut initial = Vec::new();
        for (idx, id) in ranking.iter().enumerate() {
            let state = if idx < active {
                Self::ACTIVE
            } else if idx < active + activated {
                Self::ACTIVATED
            } else {
                Self::INACTIVE
            };
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
        rng: &mut dyn RngCore,
    ) -> Result<String> {
        let current = actor.state(layer).ok_or_else(|| SpreadError::UnsetState {
            actor: actor.id().to_string(),
            layer: layer.to_string(),
        })?;
        // active nodes lose their potential after one epoch
        if current == Self::ACTIVE || current == Self::ACTIVATED {
            return Ok(Self::ACTIVATED.to_string());
        }

        let probability = self.probability()?;
        let graph = net.layer(layer)?;
        for neighbour in graph.neighbours(actor.id())? {
            if graph.status(neighbour)? == Some(Self::ACTIVE) && rng.gen::<f64>() < probability {
                return Ok(Self::ACTIVE.to_string());
            }
        }
        Ok(current.to_string())
    }

    fn network_evaluation_step(
        &self,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<NetworkUpdateBuffer>> {
        let mut changes = Vec::new();
        for actor in net.get_actors() {
            if actor.is_uniformly(Self::ACTIVATED) {
                continue;
            }
            let inputs = actor
                .layers()
                .map(|layer| self.agent_evaluation_step(&actor, layer, net, rng))
                .collect::<Result<Vec<_>>>()?;

            let new_state = if inputs.iter().all(|s| s == Self::ACTIVATED) {
                Self::ACTIVATED
            } else if self.protocol.evaluate(inputs.iter().map(|s| s == Self::ACTIVE)) {
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
