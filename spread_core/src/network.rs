//! Multilayer network - layers of graphs over one actor namespace.
//!
//! Every node of every layer carries a `status` attribute. It starts unset
//! (`None`) when the network is built and is only ever changed through
//! [`MultilayerNetwork::update`], which applies one epoch's batch of
//! [`NetworkUpdateBuffer`]s at once.

use crate::actor::Actor;
use crate::error::{Result, SpreadError};
use crate::{BOLD_UNDERLINE, THIN_UNDERLINE};
use indexmap::{IndexMap, IndexSet};
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use spread_env::ActorId;

/// Per-layer `(state, count)` pairs, in order of first appearance.
pub type StatesCount = IndexMap<String, Vec<(String, usize)>>;

/// Label used when counting nodes whose status was never set.
pub const UNSET_STATE: &str = "unset";

/// A single intended mutation of the network.
///
/// Produced in bulk by a model's evaluation step and consumed exactly once
/// by [`MultilayerNetwork::update`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkUpdateBuffer {
    /// Actor (node) whose state changes
    pub actor: ActorId,

    /// Layer where the change applies
    pub layer: String,

    /// State the node takes after the epoch
    pub new_state: String,
}

impl NetworkUpdateBuffer {
    pub fn new(actor: ActorId, layer: impl Into<String>, new_state: impl Into<String>) -> Self {
        Self {
            actor,
            layer: layer.into(),
            new_state: new_state.into(),
        }
    }
}

impl std::fmt::Display for NetworkUpdateBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.layer, self.actor, self.new_state)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct NodeEntry {
    status: Option<String>,
    neighbours: IndexSet<ActorId>,
}

/// One layer of the network: an undirected simple graph with node statuses.
///
/// Nodes and neighbours keep insertion order, so iteration (and therefore
/// random stream consumption) is stable across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerGraph {
    nodes: IndexMap<ActorId, NodeEntry>,
}

impl LayerGraph {
    /// Creates an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a layer from an edge list.
    pub fn from_edges<I, A>(edges: I) -> Self
    where
        I: IntoIterator<Item = (A, A)>,
        A: Into<ActorId>,
    {
        let mut graph = Self::new();
        for (a, b) in edges {
            graph.add_edge(a, b);
        }
        graph
    }

    /// Adds a node (no-op if it already exists).
    pub fn add_node(&mut self, node: impl Into<ActorId>) {
        self.nodes.entry(node.into()).or_default();
    }

    /// Adds an undirected edge, creating missing endpoints.
    ///
    /// Self loops are ignored.
    pub fn add_edge(&mut self, a: impl Into<ActorId>, b: impl Into<ActorId>) {
        let (a, b) = (a.into(), b.into());
        self.add_node(a.clone());
        self.add_node(b.clone());
        if a == b {
            return;
        }
        if let Some(entry) = self.nodes.get_mut(&a) {
            entry.neighbours.insert(b.clone());
        }
        if let Some(entry) = self.nodes.get_mut(&b) {
            entry.neighbours.insert(a);
        }
    }

    pub fn contains(&self, node: &ActorId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ActorId> {
        self.nodes.keys()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|e| e.neighbours.len()).sum::<usize>() / 2
    }

    /// Returns every edge once, oriented by node insertion order.
    pub fn edges(&self) -> Vec<(ActorId, ActorId)> {
        let mut edges = Vec::with_capacity(self.edge_count());
        for (idx, (node, entry)) in self.nodes.iter().enumerate() {
            for neighbour in &entry.neighbours {
                if self.nodes.get_index_of(neighbour).is_some_and(|n| n > idx) {
                    edges.push((node.clone(), neighbour.clone()));
                }
            }
        }
        edges
    }

    fn entry(&self, node: &ActorId) -> Result<&NodeEntry> {
        self.nodes.get(node).ok_or_else(|| SpreadError::UnknownNode {
            layer: String::new(),
            node: node.to_string(),
        })
    }

    pub fn neighbours(&self, node: &ActorId) -> Result<impl Iterator<Item = &ActorId>> {
        Ok(self.entry(node)?.neighbours.iter())
    }

    pub fn degree(&self, node: &ActorId) -> Result<usize> {
        Ok(self.entry(node)?.neighbours.len())
    }

    /// Current status of a node (`None` while unset).
    pub fn status(&self, node: &ActorId) -> Result<Option<&str>> {
        Ok(self.entry(node)?.status.as_deref())
    }

    pub fn set_status(&mut self, node: &ActorId, state: impl Into<String>) -> Result<()> {
        let entry = self.nodes.get_mut(node).ok_or_else(|| SpreadError::UnknownNode {
            layer: String::new(),
            node: node.to_string(),
        })?;
        entry.status = Some(state.into());
        Ok(())
    }

    fn reset_statuses(&mut self) {
        for entry in self.nodes.values_mut() {
            entry.status = None;
        }
    }

    pub fn average_degree(&self) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        (2 * self.edge_count()) as f64 / self.nodes.len() as f64
    }
}

/// A mapping from layer name to graph, all layers sharing the actor namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultilayerNetwork {
    layers: IndexMap<String, LayerGraph>,
}

impl MultilayerNetwork {
    /// Creates a network; every node status is reset to unset.
    pub fn new(layers: IndexMap<String, LayerGraph>) -> Self {
        let mut layers = layers;
        for graph in layers.values_mut() {
            graph.reset_statuses();
        }
        Self { layers }
    }

    /// Creates a network from a list of graphs and optional layer names.
    ///
    /// Without names, layers are labelled `layer_0`, `layer_1`, ...
    pub fn from_layers(graphs: Vec<LayerGraph>, names: Option<Vec<String>>) -> Result<Self> {
        let names = match names {
            Some(names) => {
                if names.len() != graphs.len() {
                    return Err(SpreadError::ShapeMismatch(format!(
                        "{} graphs but {} layer names",
                        graphs.len(),
                        names.len()
                    )));
                }
                names
            }
            None => (0..graphs.len()).map(|i| format!("layer_{i}")).collect(),
        };
        Ok(Self::new(names.into_iter().zip(graphs).collect()))
    }

    /// Creates a multiplex network by copying one graph into every layer.
    pub fn replicated<S: Into<String>>(graph: &LayerGraph, names: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            names
                .into_iter()
                .map(|name| (name.into(), graph.clone()))
                .collect(),
        )
    }

    pub fn layer(&self, name: &str) -> Result<&LayerGraph> {
        self.layers
            .get(name)
            .ok_or_else(|| SpreadError::UnknownLayer(name.to_string()))
    }

    pub fn layers(&self) -> impl Iterator<Item = (&str, &LayerGraph)> {
        self.layers.iter().map(|(name, graph)| (name.as_str(), graph))
    }

    pub fn layer_names(&self) -> Vec<String> {
        self.layers.keys().cloned().collect()
    }

    /// Returns all actors with their current states.
    ///
    /// Actors come in order of first appearance while scanning the layers.
    pub fn get_actors(&self) -> Vec<Actor> {
        let mut actors: IndexMap<ActorId, IndexMap<String, Option<String>>> = IndexMap::new();
        for (layer_name, graph) in &self.layers {
            for (node, entry) in &graph.nodes {
                actors
                    .entry(node.clone())
                    .or_default()
                    .insert(layer_name.clone(), entry.status.clone());
            }
        }
        actors
            .into_iter()
            .map(|(id, states)| Actor::new(id, states))
            .collect()
    }

    /// Returns all actors in an order drawn from the given stream.
    pub fn get_actors_shuffled(&self, rng: &mut dyn RngCore) -> Vec<Actor> {
        let mut actors = self.get_actors();
        actors.shuffle(rng);
        actors
    }

    pub fn get_actor(&self, id: &ActorId) -> Result<Actor> {
        let states: IndexMap<String, Option<String>> = self
            .layers
            .iter()
            .filter_map(|(name, graph)| {
                graph
                    .nodes
                    .get(id)
                    .map(|entry| (name.clone(), entry.status.clone()))
            })
            .collect();
        if states.is_empty() {
            return Err(SpreadError::unknown_actor(id));
        }
        Ok(Actor::new(id.clone(), states))
    }

    /// Number of distinct actors across all layers.
    pub fn actors_num(&self) -> usize {
        let mut ids: IndexSet<&ActorId> = IndexSet::new();
        for graph in self.layers.values() {
            ids.extend(graph.nodes.keys());
        }
        ids.len()
    }

    /// Number of nodes in each layer.
    pub fn nodes_num(&self) -> IndexMap<String, usize> {
        self.layers
            .iter()
            .map(|(name, graph)| (name.clone(), graph.node_count()))
            .collect()
    }

    /// True when every actor is present in every layer.
    pub fn is_multiplex(&self) -> bool {
        let actors = self.actors_num();
        self.layers.values().all(|graph| graph.node_count() == actors)
    }

    /// Returns a multiplex copy of the network and the nodes added per layer.
    ///
    /// Missing actors are added as isolated nodes. Statuses are reset.
    pub fn to_multiplex(&self) -> (Self, IndexMap<String, Vec<ActorId>>) {
        let all: Vec<ActorId> = self.get_actors().into_iter().map(|a| a.id().clone()).collect();
        let mut layers = self.layers.clone();
        let mut added = IndexMap::new();
        for (name, graph) in layers.iter_mut() {
            let missing: Vec<ActorId> = all.iter().filter(|id| !graph.contains(id)).cloned().collect();
            for id in &missing {
                graph.add_node(id.clone());
            }
            if !missing.is_empty() {
                added.insert(name.clone(), missing);
            }
        }
        (Self::new(layers), added)
    }

    /// Counts nodes per state in each layer.
    pub fn states_num(&self) -> StatesCount {
        self.layers
            .iter()
            .map(|(name, graph)| {
                let mut counts: IndexMap<String, usize> = IndexMap::new();
                for entry in graph.nodes.values() {
                    let state = entry.status.as_deref().unwrap_or(UNSET_STATE);
                    *counts.entry(state.to_string()).or_insert(0) += 1;
                }
                (name.clone(), counts.into_iter().collect())
            })
            .collect()
    }

    /// Applies a batch of updates.
    ///
    /// The whole batch is validated before any status changes, so a bad
    /// entry leaves the network untouched.
    pub fn update(&mut self, buffers: &[NetworkUpdateBuffer]) -> Result<()> {
        for buffer in buffers {
            let graph = self.layer(&buffer.layer)?;
            if !graph.contains(&buffer.actor) {
                return Err(SpreadError::UnknownNode {
                    layer: buffer.layer.clone(),
                    node: buffer.actor.to_string(),
                });
            }
        }
        for buffer in buffers {
            if let Some(graph) = self.layers.get_mut(&buffer.layer) {
                graph.set_status(&buffer.actor, buffer.new_state.clone())?;
            }
        }
        Ok(())
    }

    /// Returns a plain-text description of the network.
    pub fn describe(&self) -> String {
        let mut out = format!("{BOLD_UNDERLINE}\nnetwork parameters\n{THIN_UNDERLINE}\n");
        out.push_str("general parameters:\n");
        out.push_str(&format!("\tnumber of layers - {}\n", self.layers.len()));
        out.push_str(&format!("\tnumber of actors - {}\n", self.actors_num()));
        let nodes: usize = self.layers.values().map(LayerGraph::node_count).sum();
        let edges: usize = self.layers.values().map(LayerGraph::edge_count).sum();
        out.push_str(&format!("\tnumber of nodes - {nodes}\n"));
        out.push_str(&format!("\tnumber of edges - {edges}\n"));
        for (name, graph) in &self.layers {
            out.push_str(&format!("\nlayer '{name}' parameters:\n"));
            out.push_str(&format!("\tnumber of nodes - {}\n", graph.node_count()));
            out.push_str(&format!("\tnumber of edges - {}\n", graph.edge_count()));
            out.push_str(&format!("\taverage degree - {:.4}\n", graph.average_degree()));
        }
        out.push_str(BOLD_UNDERLINE);
        out
    }
}

impl std::fmt::Display for MultilayerNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}
