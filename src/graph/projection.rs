//! Projections: heterogeneous graph → single-node-type graph.
//!
//! Two symmetric algorithms share one pair accumulator:
//!
//! - **game-to-game**: for every connector node, every unordered pair of
//!   games pointing at it gains one unit of weight
//! - **connector-to-connector**: for every game, every unordered pair of its
//!   connectors of the requested type gains one unit of weight
//!
//! Pairs are generated in node insertion order and keyed `(lower, higher)`,
//! so a pair never receives two independent edges.

use std::collections::HashMap;

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::Direction;

use super::kind::{ConnectorType, ProjectionKind, ProjectionMode};
use super::{attr, AttrValue, Attributes, Edge, Graph, GraphResult, NodeType};

/// Derives single-type graphs from a heterogeneous graph.
pub struct GraphProjector;

impl GraphProjector {
    /// Build the projection identified by `kind`.
    pub fn project(graph: &Graph, kind: ProjectionKind) -> GraphResult<Graph> {
        match kind.mode() {
            ProjectionMode::GameToGame => Self::project_game_to_game(graph, kind.connector()),
            ProjectionMode::ConnectorToConnector => {
                Self::project_connectors(graph, kind.connector())
            }
        }
    }

    /// Game-to-game projection with the connector given by name
    /// (`mechanic`, `category`, `designer` or `family`).
    pub fn project_game_to_game_by_name(graph: &Graph, connection: &str) -> GraphResult<Graph> {
        Self::project_game_to_game(graph, connection.parse()?)
    }

    /// Games linked by the number of `connector` entities they share.
    pub fn project_game_to_game(graph: &Graph, connector: ConnectorType) -> GraphResult<Graph> {
        let (mut projected, mapping) = copy_nodes(graph, NodeType::Game)?;
        let mut pairs = PairAccumulator::new(connector);

        let source = graph.inner();
        for conn_idx in source.node_indices() {
            if source[conn_idx].node_type != connector.node_type() {
                continue;
            }
            let games: Vec<NodeIndex> = graph
                .neighbor_indices(conn_idx, Direction::Incoming)
                .into_iter()
                .filter_map(|g| mapping.get(&g).copied())
                .collect();
            pairs.add_all_pairs(&mut projected, &games);
        }

        tracing::debug!(
            connector = %connector,
            nodes = projected.node_count(),
            edges = projected.edge_count(),
            "projected game-to-game graph"
        );
        Ok(projected)
    }

    /// Connectors linked by the number of games they co-occur on.
    pub fn project_connectors(graph: &Graph, connector: ConnectorType) -> GraphResult<Graph> {
        let (mut projected, mapping) = copy_nodes(graph, connector.node_type())?;
        let mut pairs = PairAccumulator::new(connector);

        let source = graph.inner();
        for game_idx in source.node_indices() {
            if source[game_idx].node_type != NodeType::Game {
                continue;
            }
            let connectors: Vec<NodeIndex> = graph
                .neighbor_indices(game_idx, Direction::Outgoing)
                .into_iter()
                .filter_map(|c| mapping.get(&c).copied())
                .collect();
            pairs.add_all_pairs(&mut projected, &connectors);
        }

        tracing::debug!(
            connector = %connector,
            nodes = projected.node_count(),
            edges = projected.edge_count(),
            "projected connector-to-connector graph"
        );
        Ok(projected)
    }
}

/// Copy every node of `node_type` into a new graph, returning the index mapping.
fn copy_nodes(
    graph: &Graph,
    node_type: NodeType,
) -> GraphResult<(Graph, HashMap<NodeIndex, NodeIndex>)> {
    let source = graph.inner();
    let count = source
        .node_weights()
        .filter(|n| n.node_type == node_type)
        .count();
    let mut projected = Graph::with_capacity(count, count);
    let mut mapping = HashMap::with_capacity(count);
    for idx in source.node_indices() {
        let node = &source[idx];
        if node.node_type == node_type {
            let new_idx = projected.insert_node(node.clone())?;
            mapping.insert(idx, new_idx);
        }
    }
    Ok((projected, mapping))
}

/// Find-or-create index for projected edges, keyed by unordered pair.
struct PairAccumulator {
    connector: ConnectorType,
    index: HashMap<(NodeIndex, NodeIndex), EdgeIndex>,
}

impl PairAccumulator {
    fn new(connector: ConnectorType) -> Self {
        Self {
            connector,
            index: HashMap::new(),
        }
    }

    /// Add one unit of weight to every unordered pair in `members`.
    fn add_all_pairs(&mut self, graph: &mut Graph, members: &[NodeIndex]) {
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                if a != b {
                    self.increment(graph, a, b);
                }
            }
        }
    }

    fn increment(&mut self, graph: &mut Graph, a: NodeIndex, b: NodeIndex) {
        let key = if a < b { (a, b) } else { (b, a) };
        match self.index.get(&key) {
            Some(&ei) => {
                let edge = graph.edge_at_mut(ei);
                let count = edge.weight() + 1;
                set_weight(&mut edge.attributes, count);
            }
            None => {
                let mut attributes = Attributes::new();
                attributes.insert(
                    attr::CONNECTION.into(),
                    AttrValue::from(self.connector.as_str()),
                );
                set_weight(&mut attributes, 1);
                let ei = graph.upsert_edge(
                    key.0,
                    key.1,
                    Edge {
                        edge_type: self.connector.edge_type(),
                        attributes,
                    },
                );
                self.index.insert(key, ei);
            }
        }
    }
}

fn set_weight(attributes: &mut Attributes, count: i64) {
    attributes.insert(attr::COUNT.into(), AttrValue::Int(count));
    attributes.insert(attr::WEIGHT.into(), AttrValue::Int(count));
    attributes.insert(attr::LABEL.into(), AttrValue::Str(count.to_string()));
}
