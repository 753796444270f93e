//! Community & layout engine for projected graphs.
//!
//! [`LayoutEngine::apply`] prunes weak edges, clusters what remains with
//! Louvain, places community centres on a ring and lays out each community
//! with its own spring layout. The input graph is never modified; a new
//! annotated graph is returned together with a [`LayoutSummary`].

pub mod community;
pub mod force;

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::graph::{attr, AttrValue, Edge, Graph, GraphResult, Node, ProjectionKind};

use self::force::{Point, SpringParams};

/// Cluster id given to isolated and demoted nodes.
pub const UNCLUSTERED: i64 = -1;

/// Tuning for one layout run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Edges with weight below this are pruned.
    pub min_weight: u32,
    pub seed: u64,
    /// Spring layout iterations per community.
    pub iterations: usize,
    /// Keep nodes left without edges after pruning (as unclustered).
    pub keep_isolated: bool,
    /// Communities smaller than this are demoted to unclustered.
    pub min_community_size: usize,
    /// Minimum radius of the community ring.
    pub ring_radius: f64,
    /// Spread of a one-node community; grows with `sqrt(size)`.
    pub base_spread: f64,
    pub node_size_base: f64,
    pub node_size_scale: f64,
    pub edge_size_base: f64,
    pub edge_size_scale: f64,
    /// Louvain resolution; 1.0 is classic modularity.
    pub resolution: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_weight: 1,
            seed: 42,
            iterations: 50,
            keep_isolated: true,
            min_community_size: 3,
            ring_radius: 10.0,
            base_spread: 1.0,
            node_size_base: 5.0,
            node_size_scale: 3.0,
            edge_size_base: 0.5,
            edge_size_scale: 1.0,
            resolution: 1.0,
        }
    }
}

impl LayoutConfig {
    /// Defaults with the pruning threshold of `kind`.
    pub fn for_kind(kind: ProjectionKind) -> Self {
        Self {
            min_weight: kind.default_min_weight(),
            ..Self::default()
        }
    }
}

/// What a layout run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSummary {
    /// Communities kept after demotion.
    pub communities: usize,
    pub clustered_nodes: usize,
    pub unclustered_nodes: usize,
    /// Edges removed for falling below `min_weight`.
    pub pruned_edges: usize,
    /// Nodes removed because pruning isolated them (`keep_isolated = false`).
    pub dropped_nodes: usize,
    pub modularity: f64,
}

/// Clusters and positions a projected graph.
pub struct LayoutEngine;

impl LayoutEngine {
    /// Prune, cluster, lay out and size `graph`, returning a new graph.
    pub fn apply(graph: &Graph, config: &LayoutConfig) -> GraphResult<(Graph, LayoutSummary)> {
        let mut summary = LayoutSummary::default();
        if graph.is_empty() {
            tracing::debug!("layout skipped on empty graph");
            return Ok((Graph::new(), summary));
        }

        let pruned = prune(graph, config.min_weight);
        summary.pruned_edges = graph.edge_count() - pruned.edges.len();

        // Local index space: nodes kept after pruning, in insertion order.
        let kept: Vec<NodeIndex> = graph
            .inner()
            .node_indices()
            .filter(|idx| config.keep_isolated || pruned.degree[idx.index()] > 0)
            .collect();
        summary.dropped_nodes = graph.node_count() - kept.len();
        let mut local = vec![usize::MAX; graph.node_count()];
        for (i, idx) in kept.iter().enumerate() {
            local[idx.index()] = i;
        }
        let local_edges: Vec<(usize, usize, f64)> = pruned
            .edges
            .iter()
            .map(|&(s, t, w)| (local[s.index()], local[t.index()], w as f64))
            .collect();

        let clusters = cluster(kept.len(), &local_edges, config, &mut summary);
        let positions = place(kept.len(), &local_edges, &clusters, config);

        let mut out = Graph::with_capacity(kept.len(), local_edges.len());
        for (i, &idx) in kept.iter().enumerate() {
            let node = &graph.inner()[idx];
            let weight = pruned.weighted_degree[idx.index()];
            out.insert_node(annotate_node(node, weight, clusters[i], positions[i], config))?;
        }
        for &(s, t, w) in &pruned.edges {
            let edge = &graph.inner()[pruned.ids[&(s, t)]];
            out.upsert_edge(
                NodeIndex::new(local[s.index()]),
                NodeIndex::new(local[t.index()]),
                annotate_edge(edge, w, config),
            );
        }

        tracing::info!(
            nodes = out.node_count(),
            edges = out.edge_count(),
            communities = summary.communities,
            unclustered = summary.unclustered_nodes,
            pruned_edges = summary.pruned_edges,
            modularity = summary.modularity,
            "layout applied"
        );
        Ok((out, summary))
    }
}

struct Pruned {
    /// Surviving edges as `(source, target, weight)`.
    edges: Vec<(NodeIndex, NodeIndex, i64)>,
    ids: HashMap<(NodeIndex, NodeIndex), petgraph::graph::EdgeIndex>,
    /// Sum of surviving edge weights per node.
    weighted_degree: Vec<i64>,
    /// Number of surviving edges per node. Zero-weight edges count.
    degree: Vec<usize>,
}

fn prune(graph: &Graph, min_weight: u32) -> Pruned {
    let inner = graph.inner();
    let mut edges = Vec::with_capacity(inner.edge_count());
    let mut ids = HashMap::with_capacity(inner.edge_count());
    let mut weighted_degree = vec![0_i64; inner.node_count()];
    let mut degree = vec![0_usize; inner.node_count()];
    for e in inner.edge_references() {
        let w = e.weight().weight();
        if w < i64::from(min_weight) {
            continue;
        }
        edges.push((e.source(), e.target(), w));
        ids.insert((e.source(), e.target()), e.id());
        weighted_degree[e.source().index()] += w;
        degree[e.source().index()] += 1;
        if e.source() != e.target() {
            weighted_degree[e.target().index()] += w;
            degree[e.target().index()] += 1;
        }
    }
    tracing::debug!(
        kept = edges.len(),
        pruned = inner.edge_count() - edges.len(),
        min_weight,
        "pruned weak edges"
    );
    Pruned {
        edges,
        ids,
        weighted_degree,
        degree,
    }
}

/// Community id per local node, `UNCLUSTERED` for isolated or demoted ones.
fn cluster(
    n: usize,
    edges: &[(usize, usize, f64)],
    config: &LayoutConfig,
    summary: &mut LayoutSummary,
) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let partition = community::louvain(n, edges, config.resolution, &mut rng);
    summary.modularity = partition.modularity;

    let mut has_edge = vec![false; n];
    for &(u, v, _) in edges {
        has_edge[u] = true;
        has_edge[v] = true;
    }

    // Ids are already ordered by size, so surviving ones stay contiguous.
    let sizes = partition.sizes();
    let keep_below = sizes
        .iter()
        .position(|&s| s < config.min_community_size)
        .unwrap_or(sizes.len());
    summary.communities = keep_below;

    let clusters: Vec<i64> = partition
        .membership
        .iter()
        .zip(&has_edge)
        .map(|(&c, &connected)| {
            if connected && c < keep_below {
                c as i64
            } else {
                UNCLUSTERED
            }
        })
        .collect();
    summary.clustered_nodes = clusters.iter().filter(|&&c| c != UNCLUSTERED).count();
    summary.unclustered_nodes = n - summary.clustered_nodes;
    tracing::debug!(
        raw_communities = partition.community_count,
        kept = keep_below,
        modularity = partition.modularity,
        "clustered graph"
    );
    clusters
}

/// Two-level placement: community centres on a ring, springs inside each.
fn place(n: usize, edges: &[(usize, usize, f64)], clusters: &[i64], config: &LayoutConfig) -> Vec<Point> {
    let mut members: Vec<Vec<usize>> = Vec::new();
    let mut unclustered = Vec::new();
    for (i, &c) in clusters.iter().enumerate() {
        if c == UNCLUSTERED {
            unclustered.push(i);
            continue;
        }
        let c = c as usize;
        if members.len() <= c {
            members.resize_with(c + 1, Vec::new);
        }
        members[c].push(i);
    }

    let spreads: Vec<f64> = members
        .iter()
        .map(|m| config.base_spread * (m.len() as f64).sqrt())
        .collect();
    let total_spread: f64 = spreads.iter().sum();
    let max_spread = spreads.iter().copied().fold(0.0_f64, f64::max);
    let ring_radius = config
        .ring_radius
        .max(1.1 * total_spread / std::f64::consts::PI);
    let centers = force::ring(members.len(), ring_radius, Point::default());

    let mut positions = vec![Point::default(); n];
    let local_layouts: Vec<Vec<Point>> = members
        .par_iter()
        .enumerate()
        .map(|(c, nodes)| {
            let sub_edges = induced_edges(nodes, edges, clusters, c as i64);
            let mut rng = StdRng::seed_from_u64(community_seed(config.seed, c));
            let params = SpringParams {
                k: None,
                iterations: config.iterations,
                scale: spreads[c],
                center: centers[c],
            };
            force::spring_layout(nodes.len(), &sub_edges, params, &mut rng)
        })
        .collect();
    for (nodes, layout) in members.iter().zip(local_layouts) {
        for (&i, p) in nodes.iter().zip(layout) {
            positions[i] = p;
        }
    }

    let outer = if members.is_empty() {
        config.ring_radius
    } else {
        ring_radius + max_spread + config.base_spread
    };
    let outer_ring = if unclustered.len() == 1 && !members.is_empty() {
        vec![Point::new(outer, 0.0)]
    } else {
        force::ring(unclustered.len(), outer, Point::default())
    };
    for (&i, p) in unclustered.iter().zip(outer_ring) {
        positions[i] = p;
    }
    positions
}

/// Edges of community `c` re-indexed into its member list.
fn induced_edges(
    nodes: &[usize],
    edges: &[(usize, usize, f64)],
    clusters: &[i64],
    c: i64,
) -> Vec<(usize, usize, f64)> {
    let pos: HashMap<usize, usize> = nodes.iter().enumerate().map(|(li, &gi)| (gi, li)).collect();
    edges
        .iter()
        .filter(|&&(u, v, _)| clusters[u] == c && clusters[v] == c)
        .map(|&(u, v, w)| (pos[&u], pos[&v], w))
        .collect()
}

fn community_seed(seed: u64, community: usize) -> u64 {
    seed ^ (community as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn annotate_node(node: &Node, weight: i64, cluster: i64, p: Point, config: &LayoutConfig) -> Node {
    let mut node = node.clone();
    let size = config.node_size_base + config.node_size_scale * (1.0 + weight as f64).ln();
    node.label = format!("{} ({weight})", node.label);
    node.attributes.insert(attr::WEIGHT.into(), AttrValue::Int(weight));
    node.attributes.insert(attr::CLUSTER.into(), AttrValue::Int(cluster));
    node.attributes.insert(attr::X.into(), AttrValue::Float(p.x));
    node.attributes.insert(attr::Y.into(), AttrValue::Float(p.y));
    node.attributes.insert(attr::SIZE.into(), AttrValue::Float(size));
    node
}

fn annotate_edge(edge: &Edge, weight: i64, config: &LayoutConfig) -> Edge {
    let mut edge = edge.clone();
    let size = config.edge_size_base + config.edge_size_scale * (1.0 + weight as f64).ln();
    edge.attributes.insert(attr::SIZE.into(), AttrValue::Float(size));
    edge.attributes.insert(attr::LABEL.into(), AttrValue::Str(weight.to_string()));
    edge
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Entity, Game};
    use crate::graph::builder::GraphBuilder;
    use crate::graph::projection::GraphProjector;
    use crate::graph::{Attributes, EdgeType, NodeType};

    fn cluster_of(g: &Graph, id: &str) -> i64 {
        g.node(id).unwrap().attr(attr::CLUSTER).unwrap().as_i64().unwrap()
    }

    /// Two 4-cliques of games joined by one light edge, plus a loner.
    fn two_groups() -> Graph {
        let mut g = Graph::new();
        for i in 1..=9 {
            g.add_node(format!("game-{i}"), NodeType::Game, format!("G{i}"), Attributes::new())
                .unwrap();
        }
        let mut link = |a: u32, b: u32, w: i64| {
            let mut attrs = Attributes::new();
            attrs.insert(attr::COUNT.into(), AttrValue::Int(w));
            attrs.insert(attr::WEIGHT.into(), AttrValue::Int(w));
            g.add_edge(&format!("game-{a}"), &format!("game-{b}"), EdgeType::HasMechanic, attrs)
                .unwrap();
        };
        for group in [[1, 2, 3, 4], [5, 6, 7, 8]] {
            for i in 0..4 {
                for j in (i + 1)..4 {
                    link(group[i], group[j], 3);
                }
            }
        }
        link(4, 5, 1);
        g
    }

    fn config(min_weight: u32) -> LayoutConfig {
        LayoutConfig {
            min_weight,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn empty_graph_returns_immediately() {
        let (g, summary) = LayoutEngine::apply(&Graph::new(), &LayoutConfig::default()).unwrap();
        assert!(g.is_empty());
        assert_eq!(summary.communities, 0);
    }

    #[test]
    fn finds_two_communities_and_isolates_loner() {
        let (g, summary) = LayoutEngine::apply(&two_groups(), &config(2)).unwrap();
        assert_eq!(summary.pruned_edges, 1);
        assert_eq!(summary.communities, 2);
        assert_eq!(summary.clustered_nodes, 8);
        assert_eq!(summary.unclustered_nodes, 1);
        assert_eq!(cluster_of(&g, "game-9"), UNCLUSTERED);
        assert_eq!(cluster_of(&g, "game-1"), cluster_of(&g, "game-4"));
        assert_ne!(cluster_of(&g, "game-1"), cluster_of(&g, "game-5"));
        assert_eq!(g.edge_count(), 12);
    }

    #[test]
    fn every_node_gets_position_size_and_label() {
        let (g, _) = LayoutEngine::apply(&two_groups(), &config(2)).unwrap();
        for node in g.nodes() {
            for key in [attr::X, attr::Y, attr::SIZE, attr::CLUSTER, attr::WEIGHT] {
                assert!(node.attr(key).is_some(), "{} lacks {key}", node.id);
            }
        }
        assert_eq!(g.node("game-1").unwrap().label, "G1 (9)");
        assert_eq!(g.node("game-9").unwrap().label, "G9 (0)");
        let e = g.edge_between("game-1", "game-2").unwrap();
        assert_eq!(e.attributes.get(attr::LABEL), Some(&AttrValue::Str("3".into())));
    }

    #[test]
    fn sizes_grow_with_weight() {
        let (g, _) = LayoutEngine::apply(&two_groups(), &config(1)).unwrap();
        let size = |id: &str| g.node(id).unwrap().attr(attr::SIZE).unwrap().as_f64().unwrap();
        assert!(size("game-4") > size("game-1"));
        assert!(size("game-1") > size("game-9"));
        assert_eq!(size("game-9"), LayoutConfig::default().node_size_base);
    }

    #[test]
    fn small_communities_are_demoted() {
        let mut g = two_groups();
        g.add_node("game-10", NodeType::Game, "G10", Attributes::new()).unwrap();
        let mut attrs = Attributes::new();
        attrs.insert(attr::WEIGHT.into(), AttrValue::Int(5));
        g.add_edge("game-9", "game-10", EdgeType::HasMechanic, attrs).unwrap();
        let (out, summary) = LayoutEngine::apply(&g, &config(2)).unwrap();
        assert_eq!(cluster_of(&out, "game-9"), UNCLUSTERED);
        assert_eq!(cluster_of(&out, "game-10"), UNCLUSTERED);
        assert_eq!(summary.communities, 2);
    }

    #[test]
    fn no_edges_after_pruning_means_all_unclustered() {
        let (g, summary) = LayoutEngine::apply(&two_groups(), &config(100)).unwrap();
        assert_eq!(g.edge_count(), 0);
        assert_eq!(summary.communities, 0);
        assert_eq!(summary.unclustered_nodes, 9);
        assert!(g.nodes().all(|n| cluster_of(&g, &n.id) == UNCLUSTERED));
    }

    #[test]
    fn isolated_nodes_can_be_dropped() {
        let cfg = LayoutConfig {
            keep_isolated: false,
            ..config(2)
        };
        let (g, summary) = LayoutEngine::apply(&two_groups(), &cfg).unwrap();
        assert!(!g.contains("game-9"));
        assert_eq!(summary.dropped_nodes, 1);
        assert_eq!(g.node_count(), 8);
    }

    #[test]
    fn zero_weight_edges_keep_their_endpoints() {
        let mut g = Graph::new();
        for id in ["game-1", "game-2", "game-3"] {
            g.add_node(id, NodeType::Game, id, Attributes::new()).unwrap();
        }
        let mut attrs = Attributes::new();
        attrs.insert(attr::WEIGHT.into(), AttrValue::Int(0));
        g.add_edge("game-1", "game-2", EdgeType::HasMechanic, attrs).unwrap();

        let cfg = LayoutConfig {
            keep_isolated: false,
            ..config(0)
        };
        let (out, summary) = LayoutEngine::apply(&g, &cfg).unwrap();
        assert_eq!(out.node_count(), 2);
        assert_eq!(out.edge_count(), 1);
        assert!(!out.contains("game-3"));
        assert_eq!(summary.dropped_nodes, 1);
        assert_eq!(cluster_of(&out, "game-1"), UNCLUSTERED);
    }

    #[test]
    fn same_seed_same_layout() {
        let a = LayoutEngine::apply(&two_groups(), &config(2)).unwrap().0;
        let b = LayoutEngine::apply(&two_groups(), &config(2)).unwrap().0;
        assert_eq!(a.to_document(), b.to_document());
    }

    #[test]
    fn input_graph_is_untouched() {
        let g = two_groups();
        let before = g.to_document();
        let _ = LayoutEngine::apply(&g, &config(2)).unwrap();
        assert_eq!(g.to_document(), before);
    }

    #[test]
    fn scenario_three_games_one_shared_mechanic() {
        let m = Entity::new(1, 1, "M");
        let n = Entity::new(2, 2, "N");
        let catalog = Catalog::from_games(vec![
            Game::new(1, "game1").with_mechanic(m.clone()),
            Game::new(2, "game2").with_mechanic(m),
            Game::new(3, "game3").with_mechanic(n),
        ]);
        let het = GraphBuilder::build(&catalog).unwrap();
        let projected = GraphProjector::project(&het, ProjectionKind::GameMechanic).unwrap();
        let (g, _) = LayoutEngine::apply(&projected, &config(1)).unwrap();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge_between("game-1", "game-2").unwrap().weight(), 1);
        assert_eq!(cluster_of(&g, "game-3"), UNCLUSTERED);
        // A pair is a community of two, which is demoted as well.
        assert_eq!(cluster_of(&g, "game-1"), UNCLUSTERED);
    }
}
