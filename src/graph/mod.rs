//! Typed relationship graphs over the game catalogue.
//!
//! - **Model** ([`Graph`]): `petgraph`-backed typed node/edge container
//! - **Builder** ([`builder::GraphBuilder`]): catalogue → heterogeneous graph
//! - **Projection** ([`projection::GraphProjector`]): heterogeneous → single-type graph
//! - **Kinds** ([`kind::GraphKind`]): the stored graph identifiers
//!
//! All components share the [`Node`] / [`Edge`] data model and the JSON wire
//! form in [`GraphDocument`].

pub mod builder;
pub mod kind;
pub mod model;
pub mod projection;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

pub use kind::{ConnectorType, GraphKind, ProjectionKind, ProjectionMode};
pub use model::{EdgeEntry, Graph, GraphResult, NeighborDirection, Neighbors};

// ---------------------------------------------------------------------------
// Node and edge types
// ---------------------------------------------------------------------------

/// Semantic type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Game,
    Mechanic,
    Category,
    Designer,
    Family,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Game,
        NodeType::Mechanic,
        NodeType::Category,
        NodeType::Designer,
        NodeType::Family,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Game => "game",
            NodeType::Mechanic => "mechanic",
            NodeType::Category => "category",
            NodeType::Designer => "designer",
            NodeType::Family => "family",
        }
    }

    /// Namespace prefix for node ids of this type.
    pub fn id_prefix(self) -> &'static str {
        self.as_str()
    }

    /// Node id for the source entity with the given key, e.g. `game-42`.
    pub fn node_id(self, key: u64) -> String {
        format!("{}-{key}", self.id_prefix())
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| GraphError::UnknownNodeType { name: s.to_string() })
    }
}

/// Semantic type of a (directed) edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    HasMechanic,
    HasCategory,
    HasDesigner,
    HasFamily,
}

impl EdgeType {
    pub const ALL: [EdgeType; 4] = [
        EdgeType::HasMechanic,
        EdgeType::HasCategory,
        EdgeType::HasDesigner,
        EdgeType::HasFamily,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeType::HasMechanic => "has_mechanic",
            EdgeType::HasCategory => "has_category",
            EdgeType::HasDesigner => "has_designer",
            EdgeType::HasFamily => "has_family",
        }
    }

    /// The attribute node type this edge points at from a game.
    pub fn target_type(self) -> NodeType {
        match self {
            EdgeType::HasMechanic => NodeType::Mechanic,
            EdgeType::HasCategory => NodeType::Category,
            EdgeType::HasDesigner => NodeType::Designer,
            EdgeType::HasFamily => NodeType::Family,
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| GraphError::UnknownEdgeType { name: s.to_string() })
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl AttrValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v.into())
    }
}

impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        AttrValue::Int(v.into())
    }
}

impl From<u64> for AttrValue {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => AttrValue::Int(v),
            Err(_) => AttrValue::Float(v as f64),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(AttrValue::Null, Into::into)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => f.write_str("null"),
            AttrValue::Bool(v) => write!(f, "{v}"),
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Str(v) => f.write_str(v),
        }
    }
}

/// Attribute map with stable key order.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Well-known attribute keys written by the projector and the layout engine.
pub mod attr {
    pub const COUNT: &str = "count";
    pub const WEIGHT: &str = "weight";
    pub const LABEL: &str = "label";
    pub const CONNECTION: &str = "connection";
    pub const CLUSTER: &str = "cluster";
    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const SIZE: &str = "size";
}

// ---------------------------------------------------------------------------
// Nodes, edges and the wire form
// ---------------------------------------------------------------------------

/// A typed node. Also the node record of the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Node {
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }
}

/// Edge data stored on petgraph edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub edge_type: EdgeType,
    pub attributes: Attributes,
}

impl Edge {
    /// Integer weight of a projected edge (`weight`, falling back to `count`).
    pub fn weight(&self) -> i64 {
        Self::weight_of(&self.attributes)
    }

    pub(crate) fn weight_of(attributes: &Attributes) -> i64 {
        attributes
            .get(attr::WEIGHT)
            .or_else(|| attributes.get(attr::COUNT))
            .and_then(AttrValue::as_i64)
            .unwrap_or(1)
    }
}

/// Edge record of the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    #[serde(default)]
    pub attributes: Attributes,
}

/// JSON-shaped graph used for persistence and API responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

/// Total and per-type counts for a graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
    pub edges_by_type: BTreeMap<String, usize>,
}
