/// Convenience result type used across framemix.
pub type MixResult<T> = Result<T, MixError>;

/// Error taxonomy for frame buffers, filter graphs and the mixer controller.
///
/// Every kind is returned as a value from the call that detected it. None of them leave a graph
/// or controller half-mutated: the caller may fix the input and retry.
#[derive(thiserror::Error, Debug)]
pub enum MixError {
    /// Unsupported pixel format, zero dimension, bad buffer length or bad configuration value.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Rejected edge: unknown node, bad port, occupied destination port or a cycle.
    #[error("invalid connection: {0}")]
    InvalidConnection(String),

    /// Topological sort left nodes with non-zero in-degree.
    #[error("cyclic graph: {remaining} node(s) remain after topological sort")]
    CyclicGraph {
        /// Nodes that were never released by Kahn's algorithm.
        remaining: usize,
    },

    /// A declared port has no edge, or the graph lacks a source or a single sink.
    #[error("unconnected graph: {0}")]
    Unconnected(String),

    /// Topology mutation attempted after `finalize`.
    #[error("graph is frozen: topology cannot change after finalize")]
    GraphFrozen,

    /// `execute` called before a successful `finalize`.
    #[error("graph is not finalized")]
    NotFinalized,

    /// A frame batch lacks a buffer for a declared input.
    #[error("missing input frame for input {index}")]
    MissingInput {
        /// Declared input index with no buffer.
        index: usize,
    },

    /// No common format exists, or a buffer disagrees with the negotiated format.
    #[error("format mismatch: {0}")]
    FormatMismatch(String),

    /// Backing storage for a buffer could not be allocated.
    #[error("out of memory allocating {bytes} bytes")]
    OutOfMemory {
        /// Requested allocation size.
        bytes: usize,
    },

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MixError {
    /// Build a [`MixError::InvalidFormat`] value.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Build a [`MixError::InvalidConnection`] value.
    pub fn invalid_connection(msg: impl Into<String>) -> Self {
        Self::InvalidConnection(msg.into())
    }

    /// Build a [`MixError::Unconnected`] value.
    pub fn unconnected(msg: impl Into<String>) -> Self {
        Self::Unconnected(msg.into())
    }

    /// Build a [`MixError::FormatMismatch`] value.
    pub fn format_mismatch(msg: impl Into<String>) -> Self {
        Self::FormatMismatch(msg.into())
    }

    /// Build a [`MixError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
