//! Graph identifiers: connector types, projection kinds and stored graph kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

use super::{EdgeType, NodeType};

fn joined<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Connector type
// ---------------------------------------------------------------------------

/// Shared-attribute node type used to derive a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorType {
    Mechanic,
    Category,
    Designer,
    Family,
}

impl ConnectorType {
    pub const ALL: [ConnectorType; 4] = [
        ConnectorType::Mechanic,
        ConnectorType::Category,
        ConnectorType::Designer,
        ConnectorType::Family,
    ];

    pub fn as_str(self) -> &'static str {
        self.node_type().as_str()
    }

    pub fn node_type(self) -> NodeType {
        match self {
            ConnectorType::Mechanic => NodeType::Mechanic,
            ConnectorType::Category => NodeType::Category,
            ConnectorType::Designer => NodeType::Designer,
            ConnectorType::Family => NodeType::Family,
        }
    }

    /// Edge type linking a game to this connector; also the type of projected edges.
    pub fn edge_type(self) -> EdgeType {
        match self {
            ConnectorType::Mechanic => EdgeType::HasMechanic,
            ConnectorType::Category => EdgeType::HasCategory,
            ConnectorType::Designer => EdgeType::HasDesigner,
            ConnectorType::Family => EdgeType::HasFamily,
        }
    }
}

impl fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ConnectorType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConnectorType::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| GraphError::UnknownConnector {
                name: s.to_string(),
                valid: joined(&ConnectorType::ALL),
            })
    }
}

// ---------------------------------------------------------------------------
// Projection kind
// ---------------------------------------------------------------------------

/// The six stored single-type projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProjectionKind {
    GameMechanic,
    GameCategory,
    GameDesigner,
    MechanicMechanic,
    CategoryCategory,
    DesignerDesigner,
}

/// How a projection relates nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    /// Games linked by shared connectors.
    GameToGame,
    /// Connectors linked by shared games.
    ConnectorToConnector,
}

impl ProjectionKind {
    pub const ALL: [ProjectionKind; 6] = [
        ProjectionKind::GameMechanic,
        ProjectionKind::GameCategory,
        ProjectionKind::GameDesigner,
        ProjectionKind::MechanicMechanic,
        ProjectionKind::CategoryCategory,
        ProjectionKind::DesignerDesigner,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectionKind::GameMechanic => "game-mechanic",
            ProjectionKind::GameCategory => "game-category",
            ProjectionKind::GameDesigner => "game-designer",
            ProjectionKind::MechanicMechanic => "mechanic-mechanic",
            ProjectionKind::CategoryCategory => "category-category",
            ProjectionKind::DesignerDesigner => "designer-designer",
        }
    }

    pub fn connector(self) -> ConnectorType {
        match self {
            ProjectionKind::GameMechanic | ProjectionKind::MechanicMechanic => {
                ConnectorType::Mechanic
            }
            ProjectionKind::GameCategory | ProjectionKind::CategoryCategory => {
                ConnectorType::Category
            }
            ProjectionKind::GameDesigner | ProjectionKind::DesignerDesigner => {
                ConnectorType::Designer
            }
        }
    }

    pub fn mode(self) -> ProjectionMode {
        match self {
            ProjectionKind::GameMechanic
            | ProjectionKind::GameCategory
            | ProjectionKind::GameDesigner => ProjectionMode::GameToGame,
            ProjectionKind::MechanicMechanic
            | ProjectionKind::CategoryCategory
            | ProjectionKind::DesignerDesigner => ProjectionMode::ConnectorToConnector,
        }
    }

    /// Edges lighter than this are pruned before clustering.
    pub fn default_min_weight(self) -> u32 {
        match self {
            ProjectionKind::GameMechanic => 4,
            ProjectionKind::GameCategory => 3,
            ProjectionKind::GameDesigner => 2,
            ProjectionKind::MechanicMechanic => 10,
            ProjectionKind::CategoryCategory => 10,
            ProjectionKind::DesignerDesigner => 2,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ProjectionKind::GameMechanic => "Game-to-game connections through shared mechanics",
            ProjectionKind::GameCategory => "Game-to-game connections through shared categories",
            ProjectionKind::GameDesigner => "Game-to-game connections through shared designers",
            ProjectionKind::MechanicMechanic => {
                "Mechanic-to-mechanic connections through shared games"
            }
            ProjectionKind::CategoryCategory => {
                "Category-to-category connections through shared games"
            }
            ProjectionKind::DesignerDesigner => {
                "Designer-to-designer collaborations through shared games"
            }
        }
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ProjectionKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| GraphError::UnknownKind {
                name: s.to_string(),
                valid: joined(&ProjectionKind::ALL),
            })
    }
}

// ---------------------------------------------------------------------------
// Graph kind
// ---------------------------------------------------------------------------

/// Identifier of a stored graph record. Serialized as its string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GraphKind {
    Heterogeneous,
    Projected(ProjectionKind),
}

impl GraphKind {
    pub const HETEROGENEOUS: &'static str = "heterogeneous";

    /// Every stored kind, heterogeneous first.
    pub fn all() -> impl Iterator<Item = GraphKind> {
        std::iter::once(GraphKind::Heterogeneous)
            .chain(ProjectionKind::ALL.into_iter().map(GraphKind::Projected))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GraphKind::Heterogeneous => Self::HETEROGENEOUS,
            GraphKind::Projected(p) => p.as_str(),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GraphKind::Heterogeneous => {
                "Complete heterogeneous graph with all node and edge types"
            }
            GraphKind::Projected(p) => p.description(),
        }
    }

    pub fn projection(self) -> Option<ProjectionKind> {
        match self {
            GraphKind::Heterogeneous => None,
            GraphKind::Projected(p) => Some(p),
        }
    }
}

impl From<ProjectionKind> for GraphKind {
    fn from(p: ProjectionKind) -> Self {
        GraphKind::Projected(p)
    }
}

impl From<GraphKind> for String {
    fn from(kind: GraphKind) -> Self {
        kind.as_str().to_string()
    }
}

impl TryFrom<String> for GraphKind {
    type Error = GraphError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for GraphKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GraphKind::all()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| GraphError::UnknownKind {
                name: s.to_string(),
                valid: joined(&GraphKind::all().collect::<Vec<_>>()),
            })
    }
}
