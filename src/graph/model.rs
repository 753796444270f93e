//! Typed graph container backed by petgraph.
//!
//! Uses a `DiGraph` for structure and a `HashMap` from node id to
//! `NodeIndex` for O(1) lookups. The graph is append-only: nodes and edges
//! are added during construction and derived views (by type, neighbors,
//! in/out edges) are computed on demand.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::GraphError;

use super::{
    Attributes, Edge, EdgeRecord, EdgeType, GraphDocument, GraphStatistics, Node, NodeType,
};

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Borrowed view of one edge with its endpoint ids resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeEntry<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub edge_type: EdgeType,
    pub attributes: &'a Attributes,
}

impl EdgeEntry<'_> {
    /// Integer weight (`weight`, falling back to `count`, else 1).
    pub fn weight(&self) -> i64 {
        Edge::weight_of(self.attributes)
    }
}

/// Which side of a node to collect neighbors from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborDirection {
    Outgoing,
    Incoming,
    Both,
}

/// Neighbors of a node. A side that was not requested is left empty.
#[derive(Debug, Clone, Default)]
pub struct Neighbors<'a> {
    pub outgoing: Vec<&'a Node>,
    pub incoming: Vec<&'a Node>,
}

/// Typed directed graph of catalogue entities.
#[derive(Clone, Default)]
pub struct Graph {
    graph: DiGraph<Node, Edge>,
    index: HashMap<String, NodeIndex>,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph with pre-allocated capacity.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(nodes, edges),
            index: HashMap::with_capacity(nodes),
        }
    }

    /// Insert a node. Fails if the id is already present.
    pub fn add_node(
        &mut self,
        id: impl Into<String>,
        node_type: NodeType,
        label: impl Into<String>,
        attributes: Attributes,
    ) -> GraphResult<()> {
        self.insert_node(Node {
            id: id.into(),
            node_type,
            label: label.into(),
            attributes,
        })
        .map(|_| ())
    }

    pub(crate) fn insert_node(&mut self, node: Node) -> GraphResult<NodeIndex> {
        if self.index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode { node_id: node.id });
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        Ok(idx)
    }

    /// Insert a directed edge. Both endpoints must already exist.
    ///
    /// A second edge between the same ordered pair replaces the first one's
    /// type and attributes.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        edge_type: EdgeType,
        attributes: Attributes,
    ) -> GraphResult<()> {
        let src = self.require(source, target, source, "source")?;
        let dst = self.require(source, target, target, "target")?;
        self.upsert_edge(src, dst, Edge { edge_type, attributes });
        Ok(())
    }

    fn require(
        &self,
        source: &str,
        target: &str,
        id: &str,
        role: &'static str,
    ) -> GraphResult<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::MissingNode {
                source_id: source.to_string(),
                target_id: target.to_string(),
                role,
                missing: id.to_string(),
            })
    }

    pub(crate) fn upsert_edge(&mut self, src: NodeIndex, dst: NodeIndex, edge: Edge) -> EdgeIndex {
        match self.graph.find_edge(src, dst) {
            Some(ei) => {
                self.graph[ei] = edge;
                ei
            }
            None => self.graph.add_edge(src, dst, edge),
        }
    }

    /// Get a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Check if a node exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeEntry<'_>> {
        self.graph
            .raw_edges()
            .iter()
            .map(move |e| self.entry(e.source(), e.target(), &e.weight))
    }

    /// Linear scan for nodes of one type, in insertion order.
    pub fn nodes_by_type(&self, node_type: NodeType) -> Vec<&Node> {
        self.nodes().filter(|n| n.node_type == node_type).collect()
    }

    /// Linear scan for edges of one type, in insertion order.
    pub fn edges_by_type(&self, edge_type: EdgeType) -> Vec<EdgeEntry<'_>> {
        self.edges().filter(|e| e.edge_type == edge_type).collect()
    }

    /// Edges leaving `id`, in insertion order.
    pub fn out_edges(&self, id: &str) -> GraphResult<Vec<EdgeEntry<'_>>> {
        Ok(self.directed_edges(self.index_or_err(id)?, Direction::Outgoing))
    }

    /// Edges entering `id`, in insertion order.
    pub fn in_edges(&self, id: &str) -> GraphResult<Vec<EdgeEntry<'_>>> {
        Ok(self.directed_edges(self.index_or_err(id)?, Direction::Incoming))
    }

    /// Neighboring nodes of `id` on the requested side(s).
    pub fn neighbors(&self, id: &str, direction: NeighborDirection) -> GraphResult<Neighbors<'_>> {
        let idx = self.index_or_err(id)?;
        let mut result = Neighbors::default();
        if matches!(direction, NeighborDirection::Outgoing | NeighborDirection::Both) {
            result.outgoing = self
                .neighbor_indices(idx, Direction::Outgoing)
                .into_iter()
                .map(|n| &self.graph[n])
                .collect();
        }
        if matches!(direction, NeighborDirection::Incoming | NeighborDirection::Both) {
            result.incoming = self
                .neighbor_indices(idx, Direction::Incoming)
                .into_iter()
                .map(|n| &self.graph[n])
                .collect();
        }
        Ok(result)
    }

    /// The edge joining `a` and `b` in either direction, if any.
    pub fn edge_between(&self, a: &str, b: &str) -> Option<EdgeEntry<'_>> {
        let ia = *self.index.get(a)?;
        let ib = *self.index.get(b)?;
        let (ei, src, dst) = match self.graph.find_edge(ia, ib) {
            Some(ei) => (ei, ia, ib),
            None => (self.graph.find_edge(ib, ia)?, ib, ia),
        };
        Some(self.entry(src, dst, &self.graph[ei]))
    }

    /// Total (in + out) degree of a node.
    pub fn degree(&self, id: &str) -> GraphResult<usize> {
        let idx = self.index_or_err(id)?;
        Ok(self.graph.edges_directed(idx, Direction::Outgoing).count()
            + self.graph.edges_directed(idx, Direction::Incoming).count())
    }

    /// Total counts plus per-type breakdowns. Types with no members are omitted.
    pub fn statistics(&self) -> GraphStatistics {
        let mut stats = GraphStatistics {
            total_nodes: self.node_count(),
            total_edges: self.edge_count(),
            ..Default::default()
        };
        for node in self.nodes() {
            *stats
                .nodes_by_type
                .entry(node.node_type.as_str().to_string())
                .or_default() += 1;
        }
        for edge in self.graph.edge_weights() {
            *stats
                .edges_by_type
                .entry(edge.edge_type.as_str().to_string())
                .or_default() += 1;
        }
        stats
    }

    // -----------------------------------------------------------------------
    // Wire form
    // -----------------------------------------------------------------------

    /// Convert to the JSON-shaped document, preserving every attribute.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self.nodes().cloned().collect(),
            edges: self
                .edges()
                .map(|e| EdgeRecord {
                    source: e.source.to_string(),
                    target: e.target.to_string(),
                    edge_type: e.edge_type,
                    attributes: e.attributes.clone(),
                })
                .collect(),
        }
    }

    /// Rebuild a graph from its document, re-checking every invariant.
    pub fn from_document(doc: GraphDocument) -> GraphResult<Self> {
        let mut graph = Self::with_capacity(doc.nodes.len(), doc.edges.len());
        for node in doc.nodes {
            graph.insert_node(node)?;
        }
        for edge in doc.edges {
            graph.add_edge(&edge.source, &edge.target, edge.edge_type, edge.attributes)?;
        }
        Ok(graph)
    }

    pub fn to_json(&self) -> GraphResult<String> {
        serde_json::to_string(&self.to_document()).map_err(|e| GraphError::MalformedDocument {
            message: e.to_string(),
        })
    }

    pub fn to_json_pretty(&self) -> GraphResult<String> {
        serde_json::to_string_pretty(&self.to_document()).map_err(|e| {
            GraphError::MalformedDocument {
                message: e.to_string(),
            }
        })
    }

    pub fn from_json(json: &str) -> GraphResult<Self> {
        let doc: GraphDocument =
            serde_json::from_str(json).map_err(|e| GraphError::MalformedDocument {
                message: e.to_string(),
            })?;
        Self::from_document(doc)
    }

    // -----------------------------------------------------------------------
    // Crate-internal index access for the projector and layout engine
    // -----------------------------------------------------------------------

    pub(crate) fn inner(&self) -> &DiGraph<Node, Edge> {
        &self.graph
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub(crate) fn node_at_mut(&mut self, idx: NodeIndex) -> &mut Node {
        &mut self.graph[idx]
    }

    pub(crate) fn edge_at_mut(&mut self, ei: EdgeIndex) -> &mut Edge {
        &mut self.graph[ei]
    }

    /// Neighbor indices on one side, sorted by insertion order.
    pub(crate) fn neighbor_indices(&self, idx: NodeIndex, dir: Direction) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| match dir {
                Direction::Outgoing => e.target(),
                Direction::Incoming => e.source(),
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn directed_edges(&self, idx: NodeIndex, dir: Direction) -> Vec<EdgeEntry<'_>> {
        // petgraph yields adjacency lists newest-first.
        let mut refs: Vec<_> = self.graph.edges_directed(idx, dir).collect();
        refs.sort_unstable_by_key(|e| e.id());
        refs.into_iter()
            .map(|e| self.entry(e.source(), e.target(), e.weight()))
            .collect()
    }

    fn index_or_err(&self, id: &str) -> GraphResult<NodeIndex> {
        self.index_of(id).ok_or_else(|| GraphError::NodeNotFound {
            node_id: id.to_string(),
        })
    }

    fn entry<'a>(&'a self, src: NodeIndex, dst: NodeIndex, edge: &'a Edge) -> EdgeEntry<'a> {
        EdgeEntry {
            source: &self.graph[src].id,
            target: &self.graph[dst].id,
            edge_type: edge.edge_type,
            attributes: &edge.attributes,
        }
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{attr, AttrValue};

    fn catan_graph() -> Graph {
        let mut g = Graph::new();
        g.add_node("game-1", NodeType::Game, "Catan", Attributes::new())
            .unwrap();
        g.add_node("game-2", NodeType::Game, "Ticket to Ride", Attributes::new())
            .unwrap();
        g.add_node("mechanic-3", NodeType::Mechanic, "Trading", Attributes::new())
            .unwrap();
        g.add_node("category-4", NodeType::Category, "Economic", Attributes::new())
            .unwrap();
        g.add_edge("game-1", "mechanic-3", EdgeType::HasMechanic, Attributes::new())
            .unwrap();
        g.add_edge("game-2", "mechanic-3", EdgeType::HasMechanic, Attributes::new())
            .unwrap();
        g.add_edge("game-1", "category-4", EdgeType::HasCategory, Attributes::new())
            .unwrap();
        g
    }

    #[test]
    fn add_node_and_lookup() {
        let g = catan_graph();
        assert_eq!(g.node_count(), 4);
        let node = g.node("game-1").unwrap();
        assert_eq!(node.label, "Catan");
        assert_eq!(node.node_type, NodeType::Game);
        assert!(g.node("game-99").is_none());
    }

    #[test]
    fn duplicate_node_rejected() {
        let mut g = catan_graph();
        let err = g
            .add_node("game-1", NodeType::Game, "Again", Attributes::new())
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNode { .. }));
        assert_eq!(g.node("game-1").unwrap().label, "Catan");
    }

    #[test]
    fn edge_to_missing_node_is_an_error() {
        let mut g = catan_graph();
        let err = g
            .add_edge("game-1", "mechanic-999", EdgeType::HasMechanic, Attributes::new())
            .unwrap_err();
        match err {
            GraphError::MissingNode { role, missing, .. } => {
                assert_eq!(role, "target");
                assert_eq!(missing, "mechanic-999");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn repeated_edge_replaces_attributes() {
        let mut g = catan_graph();
        let mut attrs = Attributes::new();
        attrs.insert(attr::COUNT.into(), AttrValue::Int(5));
        g.add_edge("game-1", "mechanic-3", EdgeType::HasMechanic, attrs)
            .unwrap();
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.edge_between("mechanic-3", "game-1").unwrap().weight(), 5);
    }

    #[test]
    fn by_type_views() {
        let g = catan_graph();
        assert_eq!(g.nodes_by_type(NodeType::Game).len(), 2);
        assert_eq!(g.nodes_by_type(NodeType::Designer).len(), 0);
        assert_eq!(g.edges_by_type(EdgeType::HasMechanic).len(), 2);
        assert_eq!(g.edges_by_type(EdgeType::HasCategory).len(), 1);
    }

    #[test]
    fn in_and_out_edges_follow_insertion_order() {
        let g = catan_graph();
        let out = g.out_edges("game-1").unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].target, "mechanic-3");
        assert_eq!(out[1].target, "category-4");

        let incoming = g.in_edges("mechanic-3").unwrap();
        let sources: Vec<&str> = incoming.iter().map(|e| e.source).collect();
        assert_eq!(sources, vec!["game-1", "game-2"]);

        assert!(matches!(
            g.out_edges("nope"),
            Err(GraphError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn neighbors_by_direction() {
        let g = catan_graph();
        let n = g.neighbors("game-1", NeighborDirection::Outgoing).unwrap();
        assert_eq!(n.outgoing.len(), 2);
        assert!(n.incoming.is_empty());

        let n = g.neighbors("mechanic-3", NeighborDirection::Both).unwrap();
        assert!(n.outgoing.is_empty());
        assert_eq!(n.incoming.len(), 2);
        assert_eq!(g.degree("mechanic-3").unwrap(), 2);
    }

    #[test]
    fn statistics_break_down_by_type() {
        let stats = catan_graph().statistics();
        assert_eq!(stats.total_nodes, 4);
        assert_eq!(stats.total_edges, 3);
        assert_eq!(stats.nodes_by_type["game"], 2);
        assert_eq!(stats.nodes_by_type["mechanic"], 1);
        assert_eq!(stats.edges_by_type["has_mechanic"], 2);
        assert_eq!(stats.edges_by_type["has_category"], 1);
        assert!(!stats.nodes_by_type.contains_key("family"));
    }

    #[test]
    fn document_round_trip_keeps_attributes() {
        let mut g = catan_graph();
        let idx = g.index_of("game-1").unwrap();
        let node = g.node_at_mut(idx);
        node.attributes.insert(attr::CLUSTER.into(), AttrValue::Int(-1));
        node.attributes.insert(attr::X.into(), AttrValue::Float(0.25));

        let json = g.to_json().unwrap();
        let back = Graph::from_json(&json).unwrap();
        assert_eq!(back.node_count(), g.node_count());
        assert_eq!(back.edge_count(), g.edge_count());
        assert_eq!(back.to_document(), g.to_document());
        assert_eq!(
            back.node("game-1").unwrap().attr(attr::CLUSTER),
            Some(&AttrValue::Int(-1))
        );
    }

    #[test]
    fn from_json_rejects_dangling_edge() {
        let json = r#"{
            "nodes": [{"id": "game-1", "type": "game", "label": "Catan"}],
            "edges": [{"source": "game-1", "target": "mechanic-2", "type": "has_mechanic"}]
        }"#;
        assert!(matches!(
            Graph::from_json(json),
            Err(GraphError::MissingNode { .. })
        ));
    }

    #[test]
    fn from_json_rejects_unknown_type() {
        let json = r#"{"nodes": [{"id": "w-1", "type": "widget", "label": "W"}], "edges": []}"#;
        assert!(matches!(
            Graph::from_json(json),
            Err(GraphError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn empty_graph() {
        let g = Graph::new();
        assert!(g.is_empty());
        assert_eq!(g.statistics(), GraphStatistics::default());
        assert_eq!(g.to_document(), GraphDocument::default());
    }
}
