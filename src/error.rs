//! Rich diagnostic error types for boardgraph.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so callers can tell a
//! broken build apart from a failing store or a bad request.

use miette::Diagnostic;
use thiserror::Error;

use crate::graph::Graph;

/// Top-level error type for boardgraph.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum BoardgraphError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Service(#[from] ServiceError),
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node not found: {node_id}")]
    #[diagnostic(
        code(boardgraph::graph::node_not_found),
        help("The id has no corresponding node in this graph. Check the type prefix (e.g. `game-42`).")
    )]
    NodeNotFound { node_id: String },

    #[error("cannot add edge {source_id} -> {target_id}: {role} node {missing} does not exist")]
    #[diagnostic(
        code(boardgraph::graph::missing_node),
        help(
            "Both endpoints must be added with `add_node` before the edge. \
             The build was aborted; no partial graph was returned."
        )
    )]
    MissingNode {
        source_id: String,
        target_id: String,
        role: &'static str,
        missing: String,
    },

    #[error("duplicate node id: {node_id}")]
    #[diagnostic(
        code(boardgraph::graph::duplicate_node),
        help("Node ids are unique within a graph. Ids are namespaced by type, so this is a repeated source entity.")
    )]
    DuplicateNode { node_id: String },

    #[error("unknown node type: {name}")]
    #[diagnostic(
        code(boardgraph::graph::unknown_node_type),
        help("Valid node types are: game, mechanic, category, designer, family.")
    )]
    UnknownNodeType { name: String },

    #[error("unknown edge type: {name}")]
    #[diagnostic(
        code(boardgraph::graph::unknown_edge_type),
        help("Valid edge types are: has_mechanic, has_category, has_designer, has_family.")
    )]
    UnknownEdgeType { name: String },

    #[error("unknown connection type: {name}")]
    #[diagnostic(
        code(boardgraph::graph::unknown_connector),
        help("Valid connection types are: {valid}.")
    )]
    UnknownConnector { name: String, valid: String },

    #[error("unknown graph kind: {name}")]
    #[diagnostic(
        code(boardgraph::graph::unknown_kind),
        help("Valid graph kinds are: {valid}.")
    )]
    UnknownKind { name: String, valid: String },

    #[error("graph document is malformed: {message}")]
    #[diagnostic(
        code(boardgraph::graph::malformed_document),
        help("The JSON must have the shape {{\"nodes\": [...], \"edges\": [...]}}.")
    )]
    MalformedDocument { message: String },
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(boardgraph::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(boardgraph::store::redb),
        help(
            "The embedded database encountered a transaction error. \
             The previous record for this kind is still intact; retry the save."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(boardgraph::store::serde),
        help(
            "Failed to serialize or deserialize a stored graph record. \
             The stored format may predate this version; rebuild the graph."
        )
    )]
    Serialization { message: String },
}

// ---------------------------------------------------------------------------
// Catalog errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("failed to read catalogue: {path}")]
    #[diagnostic(
        code(boardgraph::catalog::read),
        help("Ensure the catalogue file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalogue {path}: {message}")]
    #[diagnostic(
        code(boardgraph::catalog::parse),
        help("The catalogue must be a JSON object with a `games` array; see `Catalog` for the field list.")
    )]
    Parse { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(boardgraph::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(boardgraph::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(boardgraph::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(boardgraph::config::invalid), help("{message}"))]
    Invalid { message: String },
}

// ---------------------------------------------------------------------------
// Service errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ServiceError {
    #[error("graph `{kind}` was built but could not be saved")]
    #[diagnostic(
        code(boardgraph::service::persist),
        help(
            "The store rejected the write. The built graph is attached to this \
             error; retry `save` with it instead of rebuilding."
        )
    )]
    Persist {
        kind: String,
        #[source]
        source: StoreError,
        graph: Box<Graph>,
    },

    #[error("failed to start the build worker pool: {message}")]
    #[diagnostic(
        code(boardgraph::service::pool),
        help("Lower `worker_threads` in the config or leave it at 0 for the default.")
    )]
    Pool { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl ServiceError {
    /// Recover the built-but-unsaved graph from a persistence failure.
    pub fn into_unsaved_graph(self) -> Option<Graph> {
        match self {
            ServiceError::Persist { graph, .. } => Some(*graph),
            _ => None,
        }
    }
}

/// Convenience alias for functions returning boardgraph results.
pub type BoardgraphResult<T> = std::result::Result<T, BoardgraphError>;
