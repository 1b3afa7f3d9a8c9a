//! Topologies for scenarios and tests.
//!
//! Generators are driven by an explicit stream so a generated graph is
//! fully determined by its seed. [`les_miserables`] is a fixed dataset.

use rand::{Rng, RngCore};
use spread_core::LayerGraph;

/// Co-appearance network of the characters of *Les Miserables*
/// (Knuth, 1993): 77 characters, 254 undirected edges.
const LES_MISERABLES: &[(&str, &str)] = &[
    ("Napoleon", "Myriel"), ("Myriel", "MlleBaptistine"), ("Myriel", "MmeMagloire"),
    ("Myriel", "CountessDeLo"), ("Myriel", "Geborand"), ("Myriel", "Champtercier"),
    ("Myriel", "Cravatte"), ("Myriel", "Count"), ("Myriel", "OldMan"),
    ("Myriel", "Valjean"), ("MlleBaptistine", "MmeMagloire"), ("MlleBaptistine", "Valjean"),
    ("MmeMagloire", "Valjean"), ("Valjean", "Labarre"), ("Valjean", "Marguerite"),
    ("Valjean", "MmeDeR"), ("Valjean", "Isabeau"), ("Valjean", "Gervais"),
    ("Valjean", "Fantine"), ("Valjean", "MmeThenardier"), ("Valjean", "Thenardier"),
    ("Valjean", "Cosette"), ("Valjean", "Javert"), ("Valjean", "Fauchelevent"),
    ("Valjean", "Bamatabois"), ("Valjean", "Simplice"), ("Valjean", "Scaufflaire"),
    ("Valjean", "Woman1"), ("Valjean", "Judge"), ("Valjean", "Champmathieu"),
    ("Valjean", "Brevet"), ("Valjean", "Chenildieu"), ("Valjean", "Cochepaille"),
    ("Valjean", "Woman2"), ("Valjean", "MotherInnocent"), ("Valjean", "Gavroche"),
    ("Valjean", "Gillenormand"), ("Valjean", "MlleGillenormand"), ("Valjean", "Marius"),
    ("Valjean", "Enjolras"), ("Valjean", "Bossuet"), ("Valjean", "Gueulemer"),
    ("Valjean", "Babet"), ("Valjean", "Claquesous"), ("Valjean", "Montparnasse"),
    ("Valjean", "Toussaint"), ("Marguerite", "Fantine"), ("Listolier", "Tholomyes"),
    ("Listolier", "Fameuil"), ("Listolier", "Blacheville"), ("Listolier", "Favourite"),
    ("Listolier", "Dahlia"), ("Listolier", "Zephine"), ("Listolier", "Fantine"),
    ("Tholomyes", "Fameuil"), ("Tholomyes", "Blacheville"), ("Tholomyes", "Favourite"),
    ("Tholomyes", "Dahlia"), ("Tholomyes", "Zephine"), ("Tholomyes", "Fantine"),
    ("Tholomyes", "Cosette"), ("Tholomyes", "Marius"), ("Fameuil", "Blacheville"),
    ("Fameuil", "Favourite"), ("Fameuil", "Dahlia"), ("Fameuil", "Zephine"),
    ("Fameuil", "Fantine"), ("Blacheville", "Favourite"), ("Blacheville", "Dahlia"),
    ("Blacheville", "Zephine"), ("Blacheville", "Fantine"), ("Favourite", "Dahlia"),
    ("Favourite", "Zephine"), ("Favourite", "Fantine"), ("Dahlia", "Zephine"),
    ("Dahlia", "Fantine"), ("Zephine", "Fantine"), ("Fantine", "MmeThenardier"),
    ("Fantine", "Thenardier"), ("Fantine", "Javert"), ("Fantine", "Bamatabois"),
    ("Fantine", "Perpetue"), ("Fantine", "Simplice"), ("MmeThenardier", "Thenardier"),
    ("MmeThenardier", "Cosette"), ("MmeThenardier", "Javert"), ("MmeThenardier", "Eponine"),
    ("MmeThenardier", "Anzelma"), ("MmeThenardier", "Magnon"), ("MmeThenardier", "Gueulemer"),
    ("MmeThenardier", "Babet"), ("MmeThenardier", "Claquesous"), ("Thenardier", "Cosette"),
    ("Thenardier", "Javert"), ("Thenardier", "Pontmercy"), ("Thenardier", "Boulatruelle"),
    ("Thenardier", "Eponine"), ("Thenardier", "Anzelma"), ("Thenardier", "Gavroche"),
    ("Thenardier", "Marius"), ("Thenardier", "Gueulemer"), ("Thenardier", "Babet"),
    ("Thenardier", "Claquesous"), ("Thenardier", "Montparnasse"), ("Thenardier", "Brujon"),
    ("Cosette", "Javert"), ("Cosette", "Woman2"), ("Cosette", "Gillenormand"),
    ("Cosette", "MlleGillenormand"), ("Cosette", "LtGillenormand"), ("Cosette", "Marius"),
    ("Cosette", "Toussaint"), ("Javert", "Fauchelevent"), ("Javert", "Bamatabois"),
    ("Javert", "Simplice"), ("Javert", "Woman1"), ("Javert", "Woman2"),
    ("Javert", "Gavroche"), ("Javert", "Enjolras"), ("Javert", "Gueulemer"),
    ("Javert", "Babet"), ("Javert", "Claquesous"), ("Javert", "Montparnasse"),
    ("Javert", "Toussaint"), ("Fauchelevent", "MotherInnocent"), ("Fauchelevent", "Gribier"),
    ("Bamatabois", "Judge"), ("Bamatabois", "Champmathieu"), ("Bamatabois", "Brevet"),
    ("Bamatabois", "Chenildieu"), ("Bamatabois", "Cochepaille"), ("Perpetue", "Simplice"),
    ("Judge", "Champmathieu"), ("Judge", "Brevet"), ("Judge", "Chenildieu"),
    ("Judge", "Cochepaille"), ("Champmathieu", "Brevet"), ("Champmathieu", "Chenildieu"),
    ("Champmathieu", "Cochepaille"), ("Brevet", "Chenildieu"), ("Brevet", "Cochepaille"),
    ("Chenildieu", "Cochepaille"), ("Pontmercy", "MmePontmercy"), ("Pontmercy", "Marius"),
    ("Eponine", "Anzelma"), ("Eponine", "Marius"), ("Eponine", "Mabeuf"),
    ("Eponine", "Courfeyrac"), ("Eponine", "Gueulemer"), ("Eponine", "Babet"),
    ("Eponine", "Claquesous"), ("Eponine", "Montparnasse"), ("Eponine", "Brujon"),
    ("MmeBurgon", "Jondrette"), ("MmeBurgon", "Gavroche"), ("Gavroche", "Marius"),
    ("Gavroche", "Mabeuf"), ("Gavroche", "Enjolras"), ("Gavroche", "Combeferre"),
    ("Gavroche", "Prouvaire"), ("Gavroche", "Feuilly"), ("Gavroche", "Courfeyrac"),
    ("Gavroche", "Bahorel"), ("Gavroche", "Bossuet"), ("Gavroche", "Joly"),
    ("Gavroche", "Grantaire"), ("Gavroche", "Gueulemer"), ("Gavroche", "Babet"),
    ("Gavroche", "Montparnasse"), ("Gavroche", "Child1"), ("Gavroche", "Child2"),
    ("Gavroche", "Brujon"), ("Gavroche", "MmeHucheloup"), ("Gillenormand", "Magnon"),
    ("Gillenormand", "MlleGillenormand"), ("Gillenormand", "LtGillenormand"), ("Gillenormand", "Marius"),
    ("Gillenormand", "BaronessT"), ("MlleGillenormand", "MmePontmercy"), ("MlleGillenormand", "MlleVaubois"),
    ("MlleGillenormand", "LtGillenormand"), ("MlleGillenormand", "Marius"), ("LtGillenormand", "Marius"),
    ("Marius", "BaronessT"), ("Marius", "Mabeuf"), ("Marius", "Enjolras"),
    ("Marius", "Combeferre"), ("Marius", "Feuilly"), ("Marius", "Courfeyrac"),
    ("Marius", "Bahorel"), ("Marius", "Bossuet"), ("Marius", "Joly"),
    ("Mabeuf", "Enjolras"), ("Mabeuf", "Combeferre"), ("Mabeuf", "Feuilly"),
    ("Mabeuf", "Courfeyrac"), ("Mabeuf", "Bahorel"), ("Mabeuf", "Bossuet"),
    ("Mabeuf", "Joly"), ("Mabeuf", "MotherPlutarch"), ("Enjolras", "Combeferre"),
    ("Enjolras", "Prouvaire"), ("Enjolras", "Feuilly"), ("Enjolras", "Courfeyrac"),
    ("Enjolras", "Bahorel"), ("Enjolras", "Bossuet"), ("Enjolras", "Joly"),
    ("Enjolras", "Grantaire"), ("Enjolras", "Claquesous"), ("Enjolras", "MmeHucheloup"),
    ("Combeferre", "Prouvaire"), ("Combeferre", "Feuilly"), ("Combeferre", "Courfeyrac"),
    ("Combeferre", "Bahorel"), ("Combeferre", "Bossuet"), ("Combeferre", "Joly"),
    ("Combeferre", "Grantaire"), ("Prouvaire", "Feuilly"), ("Prouvaire", "Courfeyrac"),
    ("Prouvaire", "Bahorel"), ("Prouvaire", "Bossuet"), ("Prouvaire", "Joly"),
    ("Prouvaire", "Grantaire"), ("Feuilly", "Courfeyrac"), ("Feuilly", "Bahorel"),
    ("Feuilly", "Bossuet"), ("Feuilly", "Joly"), ("Feuilly", "Grantaire"),
    ("Courfeyrac", "Bahorel"), ("Courfeyrac", "Bossuet"), ("Courfeyrac", "Joly"),
    ("Courfeyrac", "Grantaire"), ("Courfeyrac", "MmeHucheloup"), ("Bahorel", "Bossuet"),
    ("Bahorel", "Joly"), ("Bahorel", "Grantaire"), ("Bahorel", "MmeHucheloup"),
    ("Bossuet", "Joly"), ("Bossuet", "Grantaire"), ("Bossuet", "MmeHucheloup"),
    ("Joly", "Grantaire"), ("Joly", "MmeHucheloup"), ("Grantaire", "MmeHucheloup"),
    ("Gueulemer", "Babet"), ("Gueulemer", "Claquesous"), ("Gueulemer", "Montparnasse"),
    ("Gueulemer", "Brujon"), ("Babet", "Claquesous"), ("Babet", "Montparnasse"),
    ("Babet", "Brujon"), ("Claquesous", "Montparnasse"), ("Claquesous", "Brujon"),
    ("Montparnasse", "Brujon"), ("Child1", "Child2"),
];

/// Ring of `n` nodes, each linked to its `k / 2` nearest neighbours on
/// either side. Node ids are `0..n`.
pub fn ring_lattice(n: usize, k: usize) -> LayerGraph {
    let mut graph = LayerGraph::new();
    for node in 0..n {
        graph.add_node(node);
    }
    if n < 2 {
        return graph;
    }
    for node in 0..n {
        for offset in 1..=(k / 2) {
            graph.add_edge(node, (node + offset) % n);
        }
    }
    graph
}

/// Newman-Watts small world graph.
///
/// Starts from a ring lattice and, for every lattice edge `(u, v)`, adds a
/// shortcut from `u` to a uniformly drawn node with probability `p`. No
/// lattice edge is removed, so the graph stays connected.
pub fn small_world(n: usize, k: usize, p: f64, rng: &mut dyn RngCore) -> LayerGraph {
    let mut graph = ring_lattice(n, k);
    if n < 2 {
        return graph;
    }
    for (u, _) in graph.edges() {
        if rng.gen_bool(p.clamp(0.0, 1.0)) {
            let w = rng.gen_range(0..n);
            graph.add_edge(u, w);
        }
    }
    graph
}

/// The 77-node Les Miserables co-appearance graph.
pub fn les_miserables() -> LayerGraph {
    LayerGraph::from_edges(LES_MISERABLES.iter().copied())
}
