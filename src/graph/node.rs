use crate::foundation::error::{MixError, MixResult};
use crate::foundation::ids::NodeId;
use crate::frame::buffer::FrameBuffer;
use crate::frame::format::{PixelFormat, VideoFormat};

/// Capability class of a graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NodeKind {
    /// No input ports; fed externally, one output.
    Source,
    /// One or more input ports and one output.
    Transform,
    /// Input ports only; terminal.
    Sink,
}

/// A processing unit inside a [`crate::FilterGraph`].
///
/// Nodes are immutable once added: all per-frame state flows through `process` arguments, which
/// keeps repeated executions deterministic and lets sibling nodes run concurrently.
pub trait GraphNode: Send + Sync + std::fmt::Debug {
    /// Human-readable name used in errors and logs.
    fn name(&self) -> &str;

    /// Capability class.
    fn kind(&self) -> NodeKind;

    /// Number of input ports. Each port takes exactly one incoming edge.
    fn input_ports(&self) -> usize;

    /// Return `true` when the node has an output port.
    fn has_output(&self) -> bool {
        self.kind() != NodeKind::Sink
    }

    /// Pixel formats this node can consume and produce, in the node's own preference order.
    fn accepted_formats(&self) -> &[PixelFormat];

    /// Output size pinned by this node, if any.
    fn fixed_size(&self) -> Option<(u32, u32)> {
        None
    }

    /// Return `true` when every input must already have the node's output size.
    fn preserves_size(&self) -> bool {
        true
    }

    /// Pick the first of `candidates` this node accepts.
    fn negotiate_format(&self, candidates: &[PixelFormat]) -> MixResult<PixelFormat> {
        candidates
            .iter()
            .copied()
            .find(|f| self.accepted_formats().contains(f))
            .ok_or_else(|| {
                MixError::format_mismatch(format!(
                    "node '{}' accepts {:?}, none of {:?}",
                    self.name(),
                    self.accepted_formats(),
                    candidates
                ))
            })
    }

    /// Produce this node's output from its inputs (ordered by port) under `format`.
    ///
    /// Source nodes receive the externally supplied frame as their single input. Sinks return
    /// the frame that leaves the graph.
    fn process(&self, inputs: &[FrameBuffer], format: &VideoFormat) -> MixResult<FrameBuffer>;
}

/// One connection point of the graph and its negotiated format.
///
/// `format` stays `None` until the owning graph has been finalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Node that owns the endpoint.
    pub node: NodeId,
    /// Declared input index for sources, input port `0` for the sink.
    pub index: usize,
    pub(crate) format: Option<VideoFormat>,
}

impl Endpoint {
    pub(crate) fn new(node: NodeId, index: usize) -> Self {
        Self {
            node,
            index,
            format: None,
        }
    }

    /// Negotiated format, `None` before finalize.
    pub fn format(&self) -> Option<VideoFormat> {
        self.format
    }

    /// Return `true` once negotiation has fixed the format.
    pub fn is_negotiated(&self) -> bool {
        self.format.is_some()
    }
}

pub(crate) fn expect_inputs(node: &dyn GraphNode, inputs: &[FrameBuffer]) -> MixResult<()> {
    let want = match node.kind() {
        NodeKind::Source => 1,
        _ => node.input_ports(),
    };
    if inputs.len() != want {
        return Err(MixError::invalid_connection(format!(
            "node '{}' expects {want} input frame(s), got {}",
            node.name(),
            inputs.len()
        )));
    }
    Ok(())
}
