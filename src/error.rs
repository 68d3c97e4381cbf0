use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Fatal startup and lifecycle errors. Everything that happens after the
/// listener is up is recoverable at request granularity and never surfaces
/// through this type.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("listener error: {0}")]
    Listener(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Malformed request input. Caught at first parse; terminates that
/// request's journey immediately with a user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid format, expected: vertices edges edge1 edge2 ...")]
    MissingCounts,

    #[error("invalid vertices or edges count")]
    InvalidCounts,

    #[error("missing edges, expected {expected} but found {found}")]
    MissingEdges { expected: usize, found: usize },

    #[error("invalid edge '{token}', use u-v (e.g. 0-1)")]
    BadEdge { token: String },

    #[error("invalid vertex {vertex}, must be 0-{max}")]
    VertexOutOfRange { vertex: usize, max: usize },
}

/// Expected per-algorithm failures. These are ordinary outcomes reported
/// alongside sibling results, never faults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlgorithmError {
    #[error("{algorithm} works only on undirected graphs")]
    DirectedUnsupported { algorithm: &'static str },

    #[error("graph too large for brute force {algorithm} (max {max} vertices)")]
    TooLarge { algorithm: &'static str, max: usize },

    #[error("graph is not connected")]
    NotConnected,

    #[error("internal fault: {0}")]
    Fault(String),
}

/// Graph construction and mutation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("number of vertices must be positive")]
    NoVertices,

    #[error("invalid vertex index {vertex} for graph with {vertices} vertices")]
    InvalidVertex { vertex: usize, vertices: usize },

    #[error("{requested} edges requested but at most {max} fit")]
    TooManyEdges { requested: usize, max: usize },

    #[error("{shape} graph needs at least {min} vertices")]
    TooFewVertices { shape: &'static str, min: usize },

    #[error("{edges} edges cannot connect {vertices} vertices")]
    NotEnoughEdges { vertices: usize, edges: usize },
}
