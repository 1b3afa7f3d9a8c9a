//! Seed selection - orderings of nodes and actors used to place the
//! initial states of a propagation.
//!
//! A selector only ranks; the model decides how many of the ranked items
//! receive each state from the seeding budget.

use crate::error::{Result, SpreadError};
use crate::network::{LayerGraph, MultilayerNetwork};
use crate::{BOLD_UNDERLINE, THIN_UNDERLINE};
use indexmap::{IndexMap, IndexSet};
use rand::seq::SliceRandom;
use rand::RngCore;
use spread_env::ActorId;
use std::fmt;

/// Ranking strategy for initial seeds.
///
/// Every stochastic choice is drawn from the `rng` argument so a run is
/// reproducible from its seed.
pub trait SeedSelector: fmt::Display + fmt::Debug {
    /// Ranks the nodes of a single layer, best first.
    fn rank_layer(&self, graph: &LayerGraph, rng: &mut dyn RngCore) -> Result<Vec<ActorId>>;

    /// Ranks the nodes of every layer independently.
    fn nodewise(
        &self,
        net: &MultilayerNetwork,
        rng: &mut dyn RngCore,
    ) -> Result<IndexMap<String, Vec<ActorId>>> {
        net.layers()
            .map(|(name, graph)| Ok((name.to_string(), self.rank_layer(graph, rng)?)))
            .collect()
    }

    /// Ranks the actors of the network, best first.
    fn actorwise(&self, net: &MultilayerNetwork, rng: &mut dyn RngCore) -> Result<Vec<ActorId>>;
}

fn header(f: &mut fmt::Formatter<'_>, method: &str) -> fmt::Result {
    writeln!(
        f,
        "{BOLD_UNDERLINE}\nseed selection method\n{THIN_UNDERLINE}\n\t{method}\n{BOLD_UNDERLINE}"
    )
}

/// Uniformly random ranking.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelector;

impl fmt::Display for RandomSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        header(f, "random choice")
    }
}

impl SeedSelector for RandomSelector {
    fn rank_layer(&self, graph: &LayerGraph, rng: &mut dyn RngCore) -> Result<Vec<ActorId>> {
        let mut nodes: Vec<ActorId> = graph.nodes().cloned().collect();
        nodes.shuffle(rng);
        Ok(nodes)
    }

    fn actorwise(&self, net: &MultilayerNetwork, rng: &mut dyn RngCore) -> Result<Vec<ActorId>> {
        Ok(net
            .get_actors_shuffled(rng)
            .into_iter()
            .map(|a| a.id().clone())
            .collect())
    }
}

/// Ranking by degree, highest first.
///
/// For actors the degree is summed over all layers. Ties are broken by id,
/// so the ranking doesn't consume randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct DegreeCentralitySelector;

impl DegreeCentralitySelector {
    fn sorted(mut scored: Vec<(ActorId, usize)>) -> Vec<ActorId> {
        scored.sort_by(|(a_id, a_deg), (b_id, b_deg)| b_deg.cmp(a_deg).then_with(|| a_id.cmp(b_id)));
        scored.into_iter().map(|(id, _)| id).collect()
    }
}

impl fmt::Display for DegreeCentralitySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        header(f, "degree centrality choice")
    }
}

impl SeedSelector for DegreeCentralitySelector {
    fn rank_layer(&self, graph: &LayerGraph, _rng: &mut dyn RngCore) -> Result<Vec<ActorId>> {
        let scored = graph
            .nodes()
            .map(|id| Ok((id.clone(), graph.degree(id)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::sorted(scored))
    }

    fn actorwise(&self, net: &MultilayerNetwork, _rng: &mut dyn RngCore) -> Result<Vec<ActorId>> {
        let mut degrees: IndexMap<ActorId, usize> = IndexMap::new();
        for (_, graph) in net.layers() {
            for id in graph.nodes() {
                *degrees.entry(id.clone()).or_insert(0) += graph.degree(id)?;
            }
        }
        Ok(Self::sorted(degrees.into_iter().collect()))
    }
}

/// Ranking provided up front, e.g. computed by an external heuristic.
#[derive(Debug, Clone, Default)]
pub struct MockingSelector {
    ranking: Vec<ActorId>,
}

impl MockingSelector {
    /// Fails with [`SpreadError::DuplicateActor`] when an actor is ranked twice.
    pub fn new(ranking: Vec<ActorId>) -> Result<Self> {
        let mut seen = IndexSet::with_capacity(ranking.len());
        for id in &ranking {
            if !seen.insert(id) {
                return Err(SpreadError::DuplicateActor(id.to_string()));
            }
        }
        Ok(Self { ranking })
    }
}

impl fmt::Display for MockingSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        header(f, "mocked choice - seeds provided a priori")
    }
}

impl SeedSelector for MockingSelector {
    /// Keeps the given order, restricted to the nodes of the layer.
    fn rank_layer(&self, graph: &LayerGraph, _rng: &mut dyn RngCore) -> Result<Vec<ActorId>> {
        let ranked: Vec<ActorId> = self
            .ranking
            .iter()
            .filter(|id| graph.contains(id))
            .cloned()
            .collect();
        if ranked.len() != graph.node_count() {
            return Err(SpreadError::RankingExhausted {
                needed: graph.node_count(),
                available: ranked.len(),
            });
        }
        Ok(ranked)
    }

    fn actorwise(&self, net: &MultilayerNetwork, _rng: &mut dyn RngCore) -> Result<Vec<ActorId>> {
        if self.ranking.len() != net.actors_num() {
            return Err(SpreadError::RankingExhausted {
                needed: net.actors_num(),
                available: self.ranking.len(),
            });
        }
        if let Some(missing) = self.ranking.iter().find(|id| net.get_actor(id).is_err()) {
            return Err(SpreadError::unknown_actor(missing));
        }
        Ok(self.ranking.clone())
    }
}
