//! The compartmental graph - joint-state transition model of all processes.
//!
//! Each process (e.g. `ill: [S, I, R]`) owns one directed, weighted graph
//! whose nodes are **joint states**: sorted tuples of `"process.state"`
//! labels, one per registered process. An edge exists iff the two joint
//! states agree on every other process and differ only in the owning
//! process; its weight is the probability of that transition.
//!
//! # Representation
//!
//! Joint states are interned into an arena per process; edges are kept as
//! adjacency lists of `(target index, weight)`. For `k` processes with
//! `n_1..n_k` states, process `p` holds `prod(n_i)` joint states and
//! `prod(n_i) * (n_p - 1)` edges.

use crate::actor::Actor;
use crate::error::{Result, SpreadError};
use crate::network::MultilayerNetwork;
use crate::{BOLD_UNDERLINE, THIN_UNDERLINE};
use indexmap::IndexMap;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Sorted `"process.state"` labels, one per process.
pub type JointState = Vec<String>;

/// Initial distribution of a process' population across its states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SeedingBudget {
    /// Percentages in [0, 100], one per state, summing to 100
    Percent(Vec<f64>),

    /// Absolute counts, one per state, summing to the population
    Counts(Vec<usize>),
}

impl SeedingBudget {
    fn len(&self) -> usize {
        match self {
            SeedingBudget::Percent(p) => p.len(),
            SeedingBudget::Counts(c) => c.len(),
        }
    }

    fn validate(&self, process: &str) -> Result<()> {
        if let SeedingBudget::Percent(pcts) = self {
            if let Some(bad) = pcts.iter().find(|p| !(0.0..=100.0).contains(*p)) {
                return Err(SpreadError::budget(format!(
                    "percentage {bad} of process '{process}' not in [0, 100]"
                )));
            }
            let sum: f64 = pcts.iter().sum();
            if (sum - 100.0).abs() > 1e-9 {
                return Err(SpreadError::budget(format!(
                    "percentages of process '{process}' sum to {sum}, expected 100"
                )));
            }
        }
        Ok(())
    }

    /// Converts the budget into absolute counts for a population.
    fn to_counts(&self, process: &str, population: usize) -> Result<Vec<usize>> {
        match self {
            SeedingBudget::Percent(pcts) => Ok(percent_to_bins(pcts, population)),
            SeedingBudget::Counts(counts) => {
                let sum: usize = counts.iter().sum();
                if sum != population {
                    return Err(SpreadError::budget(format!(
                        "counts of process '{process}' sum to {sum}, population is {population}"
                    )));
                }
                Ok(counts.clone())
            }
        }
    }
}

/// Splits `population` into bins proportional to `percentages`.
///
/// Every bin is floored; the last bin absorbs the remainder, so the bins
/// always sum to `population` exactly. Floored bins stay within one node of
/// their exact share. The last bin does not: with three or more bins the
/// floors add up, and `[19.9, 19.9, 19.9, 19.9, 20.4]` of 10 gives
/// `[1, 1, 1, 1, 6]`. Use [`SeedingBudget::Counts`] when exact sizes matter.
pub fn percent_to_bins(percentages: &[f64], population: usize) -> Vec<usize> {
    let mut bins: Vec<usize> = Vec::with_capacity(percentages.len());
    let mut taken = 0usize;
    for (idx, pct) in percentages.iter().enumerate() {
        // Tolerate representation error, e.g. 29.999999 for 30
        let raw = (pct * population as f64 / 100.0 + 1e-9).floor().max(0.0) as usize;
        let mut size = raw.min(population - taken);
        if idx + 1 == percentages.len() {
            size = population - taken;
        }
        taken += size;
        bins.push(size);
    }
    bins
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    target: usize,
    weight: f64,
}

/// Transition graph of one process over the joint state space.
#[derive(Debug, Clone, Default)]
struct TransitionGraph {
    /// Arena of joint states
    states: Vec<JointState>,

    /// Joint state -> arena index
    index: HashMap<JointState, usize>,

    /// Outgoing transitions per arena index
    edges: Vec<Vec<Transition>>,
}

impl TransitionGraph {
    fn intern(&mut self, state: JointState) -> usize {
        if let Some(&idx) = self.index.get(&state) {
            return idx;
        }
        let idx = self.states.len();
        self.index.insert(state.clone(), idx);
        self.states.push(state);
        self.edges.push(Vec::new());
        idx
    }

    fn edge_mut(&mut self, from: usize, to: usize) -> Option<&mut Transition> {
        self.edges[from].iter_mut().find(|t| t.target == to)
    }

    fn edge_list(&self) -> Vec<(usize, usize)> {
        self.edges
            .iter()
            .enumerate()
            .flat_map(|(from, out)| out.iter().map(move |t| (from, t.target)))
            .collect()
    }

    fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }
}

fn check_weight(weight: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&weight) {
        return Err(SpreadError::InvalidWeight(weight));
    }
    Ok(())
}

/// Splits a `"process.state"` label at the first dot.
fn split_label(label: &str) -> Result<(&str, &str)> {
    label
        .split_once('.')
        .ok_or_else(|| SpreadError::MalformedLabel(label.to_string()))
}

fn canonical<S: AsRef<str>>(labels: &[S]) -> JointState {
    let mut state: JointState = labels.iter().map(|l| l.as_ref().to_string()).collect();
    state.sort();
    state
}

fn cartesian_product(lists: &[Vec<String>]) -> Vec<Vec<String>> {
    lists.iter().fold(vec![Vec::new()], |acc, list| {
        acc.iter()
            .flat_map(|prefix| {
                list.iter().map(move |item| {
                    let mut next = prefix.clone();
                    next.push(item.clone());
                    next
                })
            })
            .collect()
    })
}

/// Model of the processes spreading in a network.
#[derive(Debug, Clone)]
pub struct CompartmentalGraph {
    /// Process name -> ordered state labels
    processes: IndexMap<String, Vec<String>>,

    /// Process name -> compiled transition graph (empty until compiled)
    graphs: IndexMap<String, TransitionGraph>,

    /// Weight given to every edge at compile time
    background_weight: f64,

    seeding_budget: IndexMap<String, SeedingBudget>,
}

impl Default for CompartmentalGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl CompartmentalGraph {
    /// Creates an empty, uncompiled model.
    pub fn new() -> Self {
        Self {
            processes: IndexMap::new(),
            graphs: IndexMap::new(),
            background_weight: f64::INFINITY,
            seeding_budget: IndexMap::new(),
        }
    }

    /// Registers a process with its ordered states, e.g. `("ill", ["S", "I", "R"])`.
    ///
    /// The first state is the process' initial (baseline) state.
    pub fn add<S: AsRef<str>>(&mut self, process: &str, states: &[S]) -> Result<()> {
        if self.is_compiled() {
            return Err(SpreadError::AlreadyCompiled(process.to_string()));
        }
        if process.is_empty() || process.contains('.') {
            return Err(SpreadError::MalformedLabel(process.to_string()));
        }
        if self.processes.contains_key(process) {
            return Err(SpreadError::DuplicateProcess(process.to_string()));
        }
        let states: Vec<String> = states.iter().map(|s| s.as_ref().to_string()).collect();
        let unique: HashSet<&String> = states.iter().collect();
        if unique.len() != states.len() || states.is_empty() {
            return Err(SpreadError::DuplicateState(process.to_string()));
        }
        self.processes.insert(process.to_string(), states);
        Ok(())
    }

    /// Ordered `process -> states` registry.
    pub fn compartments(&self) -> &IndexMap<String, Vec<String>> {
        &self.processes
    }

    pub fn process_states(&self, process: &str) -> Result<&[String]> {
        self.processes
            .get(process)
            .map(Vec::as_slice)
            .ok_or_else(|| SpreadError::UnknownProcess(process.to_string()))
    }

    pub fn is_compiled(&self) -> bool {
        !self.graphs.is_empty()
    }

    pub fn background_weight(&self) -> f64 {
        self.background_weight
    }

    /// Builds the transition graph of every process.
    ///
    /// For a process `P`, every combination of the other processes' states
    /// is fixed in turn and a directed clique is created over `P`'s states
    /// under that combination, all edges weighted `background_weight`.
    /// Re-compiling discards previously set weights.
    pub fn compile(&mut self, background_weight: f64) -> Result<()> {
        check_weight(background_weight)?;

        let mut graphs = IndexMap::new();
        for (process, states) in &self.processes {
            let own: Vec<String> = states.iter().map(|s| format!("{process}.{s}")).collect();
            let others: Vec<Vec<String>> = self
                .processes
                .iter()
                .filter(|(name, _)| *name != process)
                .map(|(name, states)| states.iter().map(|s| format!("{name}.{s}")).collect())
                .collect();

            let mut graph = TransitionGraph::default();
            for context in cartesian_product(&others) {
                let members: Vec<usize> = own
                    .iter()
                    .map(|label| {
                        let mut joint = context.clone();
                        joint.push(label.clone());
                        joint.sort();
                        graph.intern(joint)
                    })
                    .collect();
                for &from in &members {
                    for &to in &members {
                        if from != to {
                            graph.edges[from].push(Transition {
                                target: to,
                                weight: background_weight,
                            });
                        }
                    }
                }
            }
            debug!(
                process = %process,
                joint_states = graph.states.len(),
                transitions = graph.edge_count(),
                "Compiled transition graph"
            );
            graphs.insert(process.clone(), graph);
        }

        self.graphs = graphs;
        self.background_weight = background_weight;
        Ok(())
    }

    fn graph(&self, process: &str) -> Result<&TransitionGraph> {
        if !self.is_compiled() {
            return Err(SpreadError::NotCompiled);
        }
        self.graphs
            .get(process)
            .ok_or_else(|| SpreadError::UnknownProcess(process.to_string()))
    }

    fn graph_mut(&mut self, process: &str) -> Result<&mut TransitionGraph> {
        if !self.is_compiled() {
            return Err(SpreadError::NotCompiled);
        }
        self.graphs
            .get_mut(process)
            .ok_or_else(|| SpreadError::UnknownProcess(process.to_string()))
    }

    /// Sets the weight of one transition given by joint states.
    ///
    /// `from` and `to` need not be sorted; they are canonicalised first.
    pub fn set_transition_canonical<S: AsRef<str>>(
        &mut self,
        process: &str,
        transition: (&[S], &[S]),
        weight: f64,
    ) -> Result<()> {
        check_weight(weight)?;
        let (from, to) = (canonical(transition.0), canonical(transition.1));
        let graph = self.graph_mut(process)?;

        let from_idx = *graph.index.get(&from).ok_or_else(|| SpreadError::UnknownJointState {
            process: process.to_string(),
            state: from.clone(),
        })?;
        let to_idx = graph.index.get(&to).copied();
        match to_idx.and_then(|to_idx| graph.edge_mut(from_idx, to_idx)) {
            Some(edge) => {
                edge.weight = weight;
                Ok(())
            }
            None => Err(SpreadError::UnknownTransition {
                process: process.to_string(),
                from,
                to,
            }),
        }
    }

    /// Sets the weight of one transition given by labels.
    ///
    /// e.g. `set_transition_fast("ill.S", "ill.I", &["vacc.UV", "aware.UA"], 0.9)`
    /// sets the `S -> I` probability for actors unvaccinated and unaware.
    pub fn set_transition_fast(
        &mut self,
        from: &str,
        to: &str,
        constraints: &[&str],
        weight: f64,
    ) -> Result<()> {
        check_weight(weight)?;
        let (process, _) = split_label(from)?;
        let (to_process, _) = split_label(to)?;
        if process != to_process {
            return Err(SpreadError::ProcessMismatch(from.to_string(), to.to_string()));
        }

        let mut from_state = vec![from];
        from_state.extend_from_slice(constraints);
        let mut to_state = vec![to];
        to_state.extend_from_slice(constraints);

        self.set_transition_canonical(process, (&from_state[..], &to_state[..]), weight)
    }

    /// Lists every compiled transition of a process as `(from, to, weight)`.
    pub fn transitions(&self, process: &str) -> Result<Vec<(JointState, JointState, f64)>> {
        let graph = self.graph(process)?;
        Ok(graph
            .edges
            .iter()
            .enumerate()
            .flat_map(|(from, out)| {
                out.iter().map(move |t| {
                    (graph.states[from].clone(), graph.states[t.target].clone(), t.weight)
                })
            })
            .collect())
    }

    /// Returns states reachable with weight > 0 in `process` from `state`.
    ///
    /// `state` is the actor's full joint state. A joint state that was never
    /// compiled (e.g. the actor doesn't take part in some process) is an
    /// error, not an empty result.
    pub fn get_possible_transitions<S: AsRef<str>>(
        &self,
        state: &[S],
        process: &str,
    ) -> Result<IndexMap<String, f64>> {
        let graph = self.graph(process)?;
        let state = canonical(state);
        let idx = *graph.index.get(&state).ok_or_else(|| SpreadError::UnknownJointState {
            process: process.to_string(),
            state: state.clone(),
        })?;

        let mut reachable = IndexMap::new();
        for transition in graph.edges[idx].iter().filter(|t| t.weight > 0.0) {
            for label in &graph.states[transition.target] {
                if let Some((owner, value)) = label.split_once('.') {
                    if owner == process {
                        reachable.insert(value.to_string(), transition.weight);
                    }
                }
            }
        }
        Ok(reachable)
    }

    /// Like [`Self::get_possible_transitions`] but for an actor.
    ///
    /// Processes the actor doesn't take part in are assumed to be in their
    /// initial (first) state. Layers that aren't processes are ignored.
    pub fn get_possible_transitions_actor(
        &self,
        actor: &Actor,
        process: &str,
    ) -> Result<IndexMap<String, f64>> {
        let mut labels = Vec::with_capacity(self.processes.len());
        for (name, states) in &self.processes {
            match actor.states().get(name) {
                Some(Some(state)) => labels.push(format!("{name}.{state}")),
                Some(None) => {
                    return Err(SpreadError::UnsetState {
                        actor: actor.id().to_string(),
                        layer: name.clone(),
                    })
                }
                None => labels.push(format!("{name}.{}", states[0])),
            }
        }
        self.get_possible_transitions(&labels[..], process)
    }

    /// Assigns the given weights to distinct random edges of each process.
    ///
    /// `weights[i]` lists the weights for the i-th process; e.g. for three
    /// processes `[[0.1, 0.2], [0.03, 0.45], [0.55]]` changes two edges in
    /// the first and second process and one in the third.
    pub fn set_transitions_in_random_edges(
        &mut self,
        weights: &[Vec<f64>],
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        if !self.is_compiled() {
            return Err(SpreadError::NotCompiled);
        }
        if weights.len() != self.graphs.len() {
            return Err(SpreadError::ShapeMismatch(format!(
                "{} weight lists for {} processes",
                weights.len(),
                self.graphs.len()
            )));
        }
        for ((process, graph), process_weights) in self.graphs.iter().zip(weights) {
            let requested = process_weights.len();
            if requested > graph.edge_count() {
                return Err(SpreadError::NotEnoughEdges {
                    process: process.clone(),
                    requested,
                    available: graph.edge_count(),
                });
            }
        }
        for &weight in weights.iter().flatten() {
            check_weight(weight)?;
        }

        for (graph, process_weights) in self.graphs.values_mut().zip(weights) {
            let edges = graph.edge_list();
            let mut used: HashSet<usize> = HashSet::new();
            for &weight in process_weights {
                let mut pick = rng.gen_range(0..edges.len());
                while used.contains(&pick) {
                    pick = rng.gen_range(0..edges.len());
                }
                used.insert(pick);
                let (from, to) = edges[pick];
                if let Some(edge) = graph.edge_mut(from, to) {
                    edge.weight = weight;
                }
            }
        }
        Ok(())
    }

    /// Current seeding budget, keyed by process.
    pub fn seeding_budget(&self) -> &IndexMap<String, SeedingBudget> {
        &self.seeding_budget
    }

    /// Sets the seeding budget of every process.
    ///
    /// Budget keys must match the registered processes exactly and each
    /// budget must have one entry per state.
    pub fn set_seeding_budget<I, K>(&mut self, budget: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, SeedingBudget)>,
        K: Into<String>,
    {
        let mut proposed: IndexMap<String, SeedingBudget> =
            budget.into_iter().map(|(k, v)| (k.into(), v)).collect();

        let keys_match = proposed.len() == self.processes.len()
            && self.processes.keys().all(|p| proposed.contains_key(p));
        if !keys_match {
            return Err(SpreadError::budget(
                "process names in the budget differ from the processes of the model",
            ));
        }

        let mut ordered = IndexMap::new();
        for (process, states) in &self.processes {
            let Some(entry) = proposed.shift_remove(process) else {
                continue;
            };
            if entry.len() != states.len() {
                return Err(SpreadError::budget(format!(
                    "process '{process}' has {} states but budget has {} entries",
                    states.len(),
                    entry.len()
                )));
            }
            entry.validate(process)?;
            ordered.insert(process.clone(), entry);
        }
        self.seeding_budget = ordered;
        Ok(())
    }

    /// Converts the seeding budget into absolute counts for a network.
    ///
    /// With `actorwise` the population of every process is the number of
    /// actors; otherwise it's the number of nodes in the layer named after
    /// the process. Returns e.g. `{"ill": {"S": 45, "I": 4, "R": 1}}`.
    pub fn get_seeding_budget_for_network(
        &self,
        net: &MultilayerNetwork,
        actorwise: bool,
    ) -> Result<IndexMap<String, IndexMap<String, usize>>> {
        if self.seeding_budget.is_empty() {
            return Err(SpreadError::budget("seeding budget is not set"));
        }
        let mut converted = IndexMap::new();
        for (process, budget) in &self.seeding_budget {
            let population = if actorwise {
                net.actors_num()
            } else {
                net.layer(process)?.node_count()
            };
            let counts = budget.to_counts(process, population)?;
            let states = self.process_states(process)?;
            converted.insert(
                process.clone(),
                states.iter().cloned().zip(counts).collect(),
            );
        }
        Ok(converted)
    }

    /// Returns a plain-text description of processes and transitions.
    ///
    /// With `full_graph` every transition is listed, zero weights included.
    pub fn describe(&self, full_graph: bool) -> String {
        let mut out = format!("{BOLD_UNDERLINE}\nmodel of propagation\n{THIN_UNDERLINE}\n");
        out.push_str("phenomenas and their states:");
        for (process, states) in &self.processes {
            out.push_str(&format!("\n\t{process}: {states:?}"));
        }
        if !self.seeding_budget.is_empty() {
            out.push_str("\nseeding budget:");
            for (process, budget) in &self.seeding_budget {
                out.push_str(&format!("\n\t{process}: {budget:?}"));
            }
        }
        if !self.is_compiled() {
            out.push_str("\n\ttransitions: not initialised\n");
        }
        out.push('\n');

        for (process, graph) in &self.graphs {
            if full_graph {
                out.push_str(&format!("\n{process} transitions:\n"));
            } else {
                out.push_str(&format!("\nlayer '{process}' transitions with nonzero probability:\n"));
            }
            for (from, out_edges) in graph.edges.iter().enumerate() {
                for t in out_edges {
                    if !full_graph && t.weight == 0.0 {
                        continue;
                    }
                    let prefix = format!("{process}.");
                    let own = |state: &JointState| {
                        state
                            .iter()
                            .find(|l| l.starts_with(&prefix))
                            .map(|l| l[prefix.len()..].to_string())
                            .unwrap_or_default()
                    };
                    let constraints: Vec<&String> = graph.states[from]
                        .iter()
                        .filter(|l| !l.starts_with(&prefix))
                        .collect();
                    out.push_str(&format!(
                        "\tfrom {} to {} with probability {} and constrains {:?}\n",
                        own(&graph.states[from]),
                        own(&graph.states[t.target]),
                        t.weight,
                        constraints
                    ));
                }
            }
        }
        out.push_str(BOLD_UNDERLINE);
        out
    }
}

impl std::fmt::Display for CompartmentalGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::LayerGraph;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use spread_env::ActorId;

    fn three_processes() -> CompartmentalGraph {
        let mut graph = CompartmentalGraph::new();
        graph.add("ill", &["S", "I", "R"]).unwrap();
        graph.add("aware", &["UA", "A"]).unwrap();
        graph.add("vacc", &["UV", "V"]).unwrap();
        graph
    }

    #[test]
    fn test_add_validation() {
        let mut graph = CompartmentalGraph::new();
        assert!(matches!(graph.add("ill", &["S", "S"]), Err(SpreadError::DuplicateState(_))));
        assert!(matches!(graph.add("a.b", &["S"]), Err(SpreadError::MalformedLabel(_))));
        graph.add("ill", &["S", "I"]).unwrap();
        assert!(matches!(graph.add("ill", &["X"]), Err(SpreadError::DuplicateProcess(_))));

        graph.compile(0.0).unwrap();
        assert!(matches!(graph.add("aware", &["UA", "A"]), Err(SpreadError::AlreadyCompiled(_))));
    }

    #[test]
    fn test_compile_sizes() {
        let mut graph = three_processes();
        assert!(!graph.is_compiled());
        assert!(graph.background_weight().is_infinite());
        graph.compile(0.0).unwrap();

        // ill: 3 own states x (2 * 2) contexts, each a 3-clique of 6 edges
        assert_eq!(graph.transitions("ill").unwrap().len(), 4 * 6);
        // aware: 2 own states x (3 * 2) contexts, each a 2-clique of 2 edges
        assert_eq!(graph.transitions("aware").unwrap().len(), 6 * 2);
        assert_eq!(graph.transitions("vacc").unwrap().len(), 6 * 2);
    }

    #[test]
    fn test_compile_rejects_bad_weight() {
        let mut graph = three_processes();
        assert!(matches!(graph.compile(1.5), Err(SpreadError::InvalidWeight(_))));
        assert!(matches!(graph.compile(f64::INFINITY), Err(SpreadError::InvalidWeight(_))));
    }

    #[test]
    fn test_edges_change_only_own_process() {
        let mut graph = three_processes();
        graph.compile(0.0).unwrap();
        for (from, to, _) in graph.transitions("ill").unwrap() {
            let differing: Vec<_> = from.iter().zip(&to).filter(|(a, b)| a != b).collect();
            assert_eq!(differing.len(), 1);
            assert!(differing[0].0.starts_with("ill."));
            assert!(differing[0].1.starts_with("ill."));
        }
    }

    #[test]
    fn test_set_transition_fast_is_directed() {
        let mut graph = three_processes();
        graph.compile(0.0).unwrap();
        graph.set_transition_fast("ill.S", "ill.I", &["vacc.UV", "aware.UA"], 0.9).unwrap();

        let from_s = graph
            .get_possible_transitions(&["aware.UA", "ill.S", "vacc.UV"], "ill")
            .unwrap();
        assert_eq!(from_s.len(), 1);
        assert_relative_eq!(from_s["I"], 0.9);

        // setting S -> I doesn't imply I -> S
        let from_i = graph
            .get_possible_transitions(&["aware.UA", "ill.I", "vacc.UV"], "ill")
            .unwrap();
        assert!(from_i.is_empty());

        // other contexts are untouched
        let other = graph
            .get_possible_transitions(&["aware.A", "ill.S", "vacc.UV"], "ill")
            .unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn test_set_transition_rejects_bad_input() {
        let mut graph = three_processes();
        assert!(matches!(
            graph.set_transition_fast("ill.S", "ill.I", &["vacc.UV", "aware.UA"], 0.5),
            Err(SpreadError::NotCompiled)
        ));
        graph.compile(0.0).unwrap();
        assert!(matches!(
            graph.set_transition_fast("ill.S", "ill.I", &["vacc.UV", "aware.UA"], 1.1),
            Err(SpreadError::InvalidWeight(_))
        ));
        assert!(matches!(
            graph.set_transition_fast("ill.S", "vacc.V", &["aware.UA"], 0.5),
            Err(SpreadError::ProcessMismatch(_, _))
        ));
        assert!(matches!(
            graph.set_transition_fast("ill.S", "ill.I", &["vacc.UV"], 0.5),
            Err(SpreadError::UnknownJointState { .. })
        ));
        assert!(matches!(
            graph.set_transition_fast("ill.S", "ill.I", &["vacc.UV", "aware.X"], 0.5),
            Err(SpreadError::UnknownJointState { .. })
        ));
    }

    #[test]
    fn test_set_transition_canonical() {
        let mut graph = three_processes();
        graph.compile(0.0).unwrap();
        let from = ["aware.A", "ill.I", "vacc.V"];
        let to = ["aware.A", "ill.R", "vacc.V"];
        graph.set_transition_canonical("ill", (&from[..], &to[..]), 0.7).unwrap();
        let reachable = graph.get_possible_transitions(&from, "ill").unwrap();
        assert_relative_eq!(reachable["R"], 0.7);

        // non-adjacent joint states have no edge
        let far = ["aware.UA", "ill.R", "vacc.V"];
        assert!(matches!(
            graph.set_transition_canonical("ill", (&from[..], &far[..]), 0.7),
            Err(SpreadError::UnknownTransition { .. })
        ));
    }

    #[test]
    fn test_recompile_discards_weights() {
        let mut graph = three_processes();
        graph.compile(0.0).unwrap();
        graph.set_transition_fast("vacc.UV", "vacc.V", &["aware.A", "ill.S"], 0.03).unwrap();
        graph.compile(0.0).unwrap();
        let reachable = graph
            .get_possible_transitions(&["aware.A", "ill.S", "vacc.UV"], "vacc")
            .unwrap();
        assert!(reachable.is_empty());
    }

    #[test]
    fn test_background_weight_applies_everywhere() {
        let mut graph = CompartmentalGraph::new();
        graph.add("p", &["a", "b", "c"]).unwrap();
        graph.compile(0.25).unwrap();
        let reachable = graph.get_possible_transitions(&["p.a"], "p").unwrap();
        assert_eq!(reachable.keys().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_relative_eq!(reachable["c"], 0.25);
    }

    #[test]
    fn test_possible_transitions_errors() {
        let graph = three_processes();
        assert!(matches!(
            graph.get_possible_transitions(&["ill.S"], "ill"),
            Err(SpreadError::NotCompiled)
        ));

        let mut graph = three_processes();
        graph.compile(0.0).unwrap();
        // actor absent from "vacc": partial joint state is not in the graph
        assert!(matches!(
            graph.get_possible_transitions(&["aware.UA", "ill.S"], "ill"),
            Err(SpreadError::UnknownJointState { .. })
        ));
        assert!(matches!(
            graph.get_possible_transitions(&["aware.UA", "ill.S", "vacc.UV"], "nope"),
            Err(SpreadError::UnknownProcess(_))
        ));
    }

    #[test]
    fn test_possible_transitions_actor_fills_initial_states() {
        let mut graph = three_processes();
        graph.compile(0.0).unwrap();
        graph.set_transition_fast("ill.S", "ill.I", &["vacc.UV", "aware.A"], 0.2).unwrap();

        let actor = Actor::new(
            ActorId::from("x"),
            [
                ("ill".to_string(), Some("S".to_string())),
                ("aware".to_string(), Some("A".to_string())),
            ]
            .into_iter()
            .collect(),
        );
        let reachable = graph.get_possible_transitions_actor(&actor, "ill").unwrap();
        assert_relative_eq!(reachable["I"], 0.2);
    }

    #[test]
    fn test_random_edges() {
        let mut graph = three_processes();
        graph.compile(0.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        graph
            .set_transitions_in_random_edges(&[vec![0.1, 0.2], vec![0.3], vec![]], &mut rng)
            .unwrap();

        let nonzero = |p: &str| {
            graph
                .transitions(p)
                .unwrap()
                .into_iter()
                .filter(|(_, _, w)| *w > 0.0)
                .count()
        };
        assert_eq!(nonzero("ill"), 2);
        assert_eq!(nonzero("aware"), 1);
        assert_eq!(nonzero("vacc"), 0);
    }

    #[test]
    fn test_random_edges_validation() {
        let mut graph = three_processes();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(matches!(
            graph.set_transitions_in_random_edges(&[vec![], vec![], vec![]], &mut rng),
            Err(SpreadError::NotCompiled)
        ));
        graph.compile(0.0).unwrap();
        assert!(matches!(
            graph.set_transitions_in_random_edges(&[vec![0.1]], &mut rng),
            Err(SpreadError::ShapeMismatch(_))
        ));
        assert!(matches!(
            graph.set_transitions_in_random_edges(&[vec![], vec![0.1; 13], vec![]], &mut rng),
            Err(SpreadError::NotEnoughEdges { available: 12, .. })
        ));
    }

    #[test]
    fn test_percent_to_bins_known_values() {
        assert_eq!(percent_to_bins(&[84.0, 13.0, 3.0], 77), vec![64, 10, 3]);
        assert_eq!(percent_to_bins(&[77.0, 23.0], 77), vec![59, 18]);
        assert_eq!(percent_to_bins(&[90.0, 10.0], 77), vec![69, 8]);
        assert_eq!(percent_to_bins(&[90.0, 8.0, 2.0], 50), vec![45, 4, 1]);
        assert_eq!(percent_to_bins(&[100.0, 0.0], 0), vec![0, 0]);
    }

    #[test]
    fn test_percent_to_bins_remainder_piles_on_last_bin() {
        // exact shares are 1.99 x4 and 2.04; floors leave 6 for the last bin
        let bins = percent_to_bins(&[19.9, 19.9, 19.9, 19.9, 20.4], 10);
        assert_eq!(bins, vec![1, 1, 1, 1, 6]);
        assert_eq!(bins.iter().sum::<usize>(), 10);
    }

    #[test]
    fn test_seeding_budget_validation() {
        let mut graph = three_processes();
        let good = || {
            vec![
                ("ill", SeedingBudget::Percent(vec![84.0, 13.0, 3.0])),
                ("aware", SeedingBudget::Percent(vec![77.0, 23.0])),
                ("vacc", SeedingBudget::Percent(vec![90.0, 10.0])),
            ]
        };
        graph.set_seeding_budget(good()).unwrap();
        assert_eq!(graph.seeding_budget().len(), 3);

        let mut missing = good();
        missing.pop();
        assert!(matches!(graph.set_seeding_budget(missing), Err(SpreadError::InvalidBudget(_))));

        let mut bad_shape = good();
        bad_shape[1].1 = SeedingBudget::Percent(vec![100.0]);
        assert!(matches!(graph.set_seeding_budget(bad_shape), Err(SpreadError::InvalidBudget(_))));

        let mut bad_sum = good();
        bad_sum[2].1 = SeedingBudget::Percent(vec![90.0, 20.0]);
        assert!(matches!(graph.set_seeding_budget(bad_sum), Err(SpreadError::InvalidBudget(_))));

        let mut out_of_range = good();
        out_of_range[2].1 = SeedingBudget::Percent(vec![110.0, -10.0]);
        assert!(matches!(
            graph.set_seeding_budget(out_of_range),
            Err(SpreadError::InvalidBudget(_))
        ));
    }

    #[test]
    fn test_seeding_budget_for_network() {
        let mut graph = CompartmentalGraph::new();
        graph.add("ill", &["S", "I", "R"]).unwrap();
        graph.add("vacc", &["UV", "V"]).unwrap();
        graph
            .set_seeding_budget([
                ("ill", SeedingBudget::Percent(vec![90.0, 8.0, 2.0])),
                ("vacc", SeedingBudget::Counts(vec![35, 15])),
            ])
            .unwrap();

        let layer = LayerGraph::from_edges((0..50u64).map(|i| (i, (i + 1) % 50)));
        let net = MultilayerNetwork::replicated(&layer, ["ill", "vacc"]);
        let budget = graph.get_seeding_budget_for_network(&net, false).unwrap();
        assert_eq!(budget["ill"]["S"], 45);
        assert_eq!(budget["ill"]["I"], 4);
        assert_eq!(budget["ill"]["R"], 1);
        assert_eq!(budget["vacc"]["V"], 15);

        let small = MultilayerNetwork::replicated(&LayerGraph::from_edges([(0u64, 1u64)]), ["ill", "vacc"]);
        assert!(matches!(
            graph.get_seeding_budget_for_network(&small, false),
            Err(SpreadError::InvalidBudget(_))
        ));
    }

    #[test]
    fn test_describe_lists_nonzero_transitions() {
        let mut graph = three_processes();
        graph.compile(0.0).unwrap();
        graph.set_transition_fast("aware.UA", "aware.A", &["vacc.V", "ill.S"], 1.0).unwrap();
        let text = graph.describe(false);
        assert!(text.contains("from UA to A with probability 1"));
        assert_eq!(text.matches("with probability").count(), 1);
        assert_eq!(graph.describe(true).matches("with probability").count(), 24 + 12 + 12);
    }

    proptest! {
        #[test]
        fn prop_bins_sum_to_population(
            raw in proptest::collection::vec(0u32..1000, 1..6),
            population in 0usize..5000,
        ) {
            let total: u32 = raw.iter().sum::<u32>().max(1);
            let pcts: Vec<f64> = raw.iter().map(|r| *r as f64 * 100.0 / total as f64).collect();
            let bins = percent_to_bins(&pcts, population);
            prop_assert_eq!(bins.len(), pcts.len());
            prop_assert_eq!(bins.iter().sum::<usize>(), population);
        }
    }
}
