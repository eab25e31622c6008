//! framemix is a deterministic video frame-mixing filter graph.
//!
//! A mixing session owns one [`FilterGraph`]: N [`InputNode`]s feed a [`MixNode`] that composites
//! them onto a canvas, and a single [`OutputNode`] hands the result out. The
//! [`MixerController`] builds that graph from a [`MixerConfig`], buffers frames per input and
//! emits one mixed [`FrameBuffer`] per complete round.
//!
//! # Pipeline overview
//!
//! 1. **Build**: `add_node` / `connect` while the graph is `Building`
//! 2. **Finalize**: port checks, Kahn topological sort, pixel format and size negotiation
//! 3. **Execute**: each node runs once per round in topological order
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: identical inputs produce bit-identical output, sequential or parallel.
//! - **No process-wide state**: every graph is constructed per session and owns everything.
//! - **Premultiplied alpha** for the packed RGBA/BGRA formats.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod effects;
mod foundation;
mod frame;
mod graph;
mod mixer;

pub use crate::effects::policy::{
    AlphaOver, CompositePolicy, InputLayout, Layer, PolicyKind, WeightedAverage,
};
pub use crate::foundation::error::{MixError, MixResult};
pub use crate::foundation::ids::NodeId;
pub use crate::frame::buffer::FrameBuffer;
pub use crate::frame::format::{PixelFormat, PlaneLayout, VideoFormat};
pub use crate::graph::filter_graph::{ExecOpts, FilterGraph, GraphState};
pub use crate::graph::node::{Endpoint, GraphNode, NodeKind};
pub use crate::graph::nodes::{InputNode, MixNode, OutputNode};
pub use crate::graph::topology::Edge;
pub use crate::mixer::config::MixerConfig;
pub use crate::mixer::controller::{MixStats, MixerController};
pub use crate::mixer::sync::SyncPolicy;
