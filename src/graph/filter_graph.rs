use crate::foundation::error::{MixError, MixResult};
use crate::foundation::ids::NodeId;
use crate::frame::buffer::FrameBuffer;
use crate::frame::format::{PixelFormat, VideoFormat};
use crate::graph::negotiate::negotiate;
use crate::graph::node::{Endpoint, GraphNode, NodeKind};
use crate::graph::topology::{Edge, ranks, reaches, topological_order};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Lifecycle of a [`FilterGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphState {
    /// Nodes and edges may be added.
    Building,
    /// Topology is frozen and formats are negotiated; `execute` is allowed.
    Finalized,
}

/// Options for a single [`FilterGraph::execute_with`] call.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExecOpts {
    /// Run nodes of equal rank on the rayon pool. Output is identical either way.
    pub parallel: bool,
}

#[derive(Debug)]
struct ExecPlan {
    order: Vec<NodeId>,
    levels: Vec<Vec<NodeId>>,
    formats: Vec<VideoFormat>,
    incoming: Vec<SmallVec<[NodeId; 4]>>,
    sink: NodeId,
}

/// Per-session graph of frame-processing nodes.
///
/// The graph is the single owner of its nodes, edges and endpoints. Nodes are addressed by
/// arena [`NodeId`]s. The lifecycle is `Building -> Finalized`; executing does not change state.
#[derive(Debug)]
pub struct FilterGraph {
    nodes: Vec<Box<dyn GraphNode>>,
    edges: Vec<Edge>,
    inputs: Vec<Endpoint>,
    source_index: Vec<Option<usize>>,
    output: Option<Endpoint>,
    preference: SmallVec<[PixelFormat; 4]>,
    state: GraphState,
    plan: Option<ExecPlan>,
}

impl Default for FilterGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterGraph {
    /// Empty graph using the default pixel format preference order.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            inputs: Vec::new(),
            source_index: Vec::new(),
            output: None,
            preference: PixelFormat::PREFERENCE.into_iter().collect(),
            state: GraphState::Building,
            plan: None,
        }
    }

    /// Empty graph that tries `hint` before the default preference order.
    pub fn with_format_hint(hint: PixelFormat) -> Self {
        let mut g = Self::new();
        g.preference.retain(|f| *f != hint);
        g.preference.insert(0, hint);
        g
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GraphState {
        self.state
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Borrow a node by id.
    pub fn node(&self, id: NodeId) -> Option<&dyn GraphNode> {
        self.nodes.get(id.index()).map(|n| n.as_ref())
    }

    /// Pixel format preference used by negotiation.
    pub fn preference(&self) -> &[PixelFormat] {
        &self.preference
    }

    /// One endpoint per source node, in the order the sources were added.
    pub fn input_endpoints(&self) -> &[Endpoint] {
        &self.inputs
    }

    /// The sink endpoint, known once the graph is finalized.
    pub fn output_endpoint(&self) -> Option<&Endpoint> {
        self.output.as_ref()
    }

    /// Cached topological order, known once the graph is finalized.
    pub fn topological_order(&self) -> Option<&[NodeId]> {
        self.plan.as_ref().map(|p| p.order.as_slice())
    }

    /// Register a node. Source nodes become declared inputs in insertion order.
    pub fn add_node(&mut self, node: Box<dyn GraphNode>) -> MixResult<NodeId> {
        if self.state == GraphState::Finalized {
            return Err(MixError::GraphFrozen);
        }
        let raw = u32::try_from(self.nodes.len())
            .map_err(|_| MixError::invalid_connection("node arena is full"))?;
        let id = NodeId(raw);

        if node.kind() == NodeKind::Source {
            self.source_index.push(Some(self.inputs.len()));
            self.inputs.push(Endpoint::new(id, self.inputs.len()));
        } else {
            self.source_index.push(None);
        }
        tracing::trace!(%id, name = node.name(), kind = ?node.kind(), "add_node");
        self.nodes.push(node);
        Ok(id)
    }

    /// Add an edge from `src`'s output to `dst`'s input port `dst_port`.
    ///
    /// The edge set is unchanged when this returns an error.
    pub fn connect(
        &mut self,
        src: NodeId,
        src_port: usize,
        dst: NodeId,
        dst_port: usize,
    ) -> MixResult<()> {
        if self.state == GraphState::Finalized {
            return Err(MixError::GraphFrozen);
        }
        let src_node = self
            .node(src)
            .ok_or_else(|| MixError::invalid_connection(format!("unknown source node {src}")))?;
        let dst_node = self.node(dst).ok_or_else(|| {
            MixError::invalid_connection(format!("unknown destination node {dst}"))
        })?;

        if !src_node.has_output() || src_port != 0 {
            return Err(MixError::invalid_connection(format!(
                "node '{}' has no output port {src_port}",
                src_node.name()
            )));
        }
        if dst_port >= dst_node.input_ports() {
            return Err(MixError::invalid_connection(format!(
                "node '{}' has no input port {dst_port}",
                dst_node.name()
            )));
        }
        if self
            .edges
            .iter()
            .any(|e| e.dst == dst && e.dst_port == dst_port)
        {
            return Err(MixError::invalid_connection(format!(
                "input port {dst_port} of '{}' is already connected",
                dst_node.name()
            )));
        }
        if reaches(dst, src, &self.edges) {
            return Err(MixError::invalid_connection(format!(
                "edge '{}' -> '{}' would create a cycle",
                src_node.name(),
                dst_node.name()
            )));
        }

        self.edges.push(Edge { src, dst, dst_port });
        Ok(())
    }

    /// Validate connectivity, sort topologically and negotiate formats.
    ///
    /// On failure the graph stays in `Building`. Once finalized, further calls return the cached
    /// order.
    #[tracing::instrument(skip_all, fields(nodes = self.nodes.len(), edges = self.edges.len()))]
    pub fn finalize(&mut self) -> MixResult<&[NodeId]> {
        if self.state == GraphState::Building {
            let (plan, inputs, output) = self.build_plan()?;
            tracing::debug!(order = ?plan.order, sink = %plan.sink, "graph finalized");
            self.inputs = inputs;
            self.output = Some(output);
            self.plan = Some(plan);
            self.state = GraphState::Finalized;
        }
        self.topological_order()
            .ok_or_else(|| MixError::Other(anyhow::anyhow!("finalized graph has no plan")))
    }

    fn build_plan(&self) -> MixResult<(ExecPlan, Vec<Endpoint>, Endpoint)> {
        if self.nodes.is_empty() {
            return Err(MixError::unconnected("graph has no nodes"));
        }
        if self.inputs.is_empty() {
            return Err(MixError::unconnected("graph has no source node"));
        }
        let sinks: SmallVec<[NodeId; 2]> = (0..self.nodes.len())
            .filter(|&i| !self.nodes[i].has_output())
            .map(|i| NodeId(i as u32))
            .collect();
        let [sink] = sinks.as_slice() else {
            return Err(MixError::unconnected(format!(
                "graph needs exactly one sink, found {}",
                sinks.len()
            )));
        };
        let sink = *sink;

        let mut incoming = vec![SmallVec::<[NodeId; 4]>::new(); self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            for port in 0..node.input_ports() {
                let Some(e) = self
                    .edges
                    .iter()
                    .find(|e| e.dst == id && e.dst_port == port)
                else {
                    return Err(MixError::unconnected(format!(
                        "input port {port} of '{}' has no edge",
                        node.name()
                    )));
                };
                incoming[i].push(e.src);
            }
            if node.has_output() && !self.edges.iter().any(|e| e.src == id) {
                return Err(MixError::unconnected(format!(
                    "output of '{}' has no consumer",
                    node.name()
                )));
            }
        }

        let order = topological_order(self.nodes.len(), &self.edges)?;
        let formats = negotiate(&self.nodes, &self.edges, &order, &self.preference)?;

        let rank = ranks(self.nodes.len(), &order, &self.edges);
        let mut levels: Vec<Vec<NodeId>> = Vec::new();
        for &id in &order {
            let r = rank[id.index()] as usize;
            if levels.len() <= r {
                levels.resize_with(r + 1, Vec::new);
            }
            levels[r].push(id);
        }

        let mut inputs = self.inputs.clone();
        for ep in &mut inputs {
            ep.format = Some(formats[ep.node.index()]);
        }
        let mut output = Endpoint::new(sink, 0);
        output.format = Some(formats[sink.index()]);

        Ok((
            ExecPlan {
                order,
                levels,
                formats,
                incoming,
                sink,
            },
            inputs,
            output,
        ))
    }

    /// Run every node once in topological order and return the sink's frame.
    pub fn execute(&self, batch: &HashMap<usize, FrameBuffer>) -> MixResult<FrameBuffer> {
        self.execute_with(batch, ExecOpts::default())
    }

    /// [`FilterGraph::execute`] with explicit options.
    ///
    /// `batch` maps declared input index to frame. Every declared input must be present and match
    /// its negotiated format. The graph is not modified, so a failed call can be retried.
    #[tracing::instrument(skip_all, fields(parallel = opts.parallel))]
    pub fn execute_with(
        &self,
        batch: &HashMap<usize, FrameBuffer>,
        opts: ExecOpts,
    ) -> MixResult<FrameBuffer> {
        let plan = self.plan.as_ref().ok_or(MixError::NotFinalized)?;

        for ep in &self.inputs {
            let frame = batch
                .get(&ep.index)
                .ok_or(MixError::MissingInput { index: ep.index })?;
            let want = plan.formats[ep.node.index()];
            if frame.video_format() != want {
                return Err(MixError::format_mismatch(format!(
                    "input {} negotiated {want}, got {}",
                    ep.index,
                    frame.video_format()
                )));
            }
        }

        let mut results: Vec<Option<FrameBuffer>> = vec![None; self.nodes.len()];
        for level in &plan.levels {
            if opts.parallel && level.len() > 1 {
                let done = level
                    .par_iter()
                    .map(|&id| self.run_node(plan, id, &results, batch))
                    .collect::<MixResult<Vec<_>>>()?;
                for (&id, frame) in level.iter().zip(done) {
                    results[id.index()] = Some(frame);
                }
            } else {
                for &id in level {
                    let frame = self.run_node(plan, id, &results, batch)?;
                    results[id.index()] = Some(frame);
                }
            }
        }

        let out = results[plan.sink.index()]
            .take()
            .ok_or_else(|| MixError::Other(anyhow::anyhow!("sink produced no frame")))?;
        let pts = self
            .inputs
            .iter()
            .find_map(|ep| batch.get(&ep.index).and_then(FrameBuffer::pts));
        Ok(match pts {
            Some(pts) => out.with_pts(pts),
            None => out,
        })
    }

    fn run_node(
        &self,
        plan: &ExecPlan,
        id: NodeId,
        results: &[Option<FrameBuffer>],
        batch: &HashMap<usize, FrameBuffer>,
    ) -> MixResult<FrameBuffer> {
        let node = self.nodes[id.index()].as_ref();
        let format = &plan.formats[id.index()];

        let inputs: SmallVec<[FrameBuffer; 4]> = match self.source_index[id.index()] {
            Some(index) => {
                let frame = batch.get(&index).ok_or(MixError::MissingInput { index })?;
                SmallVec::from_iter([frame.retain()])
            }
            None => plan.incoming[id.index()]
                .iter()
                .map(|src| {
                    results[src.index()].as_ref().map(FrameBuffer::retain).ok_or_else(|| {
                        MixError::Other(anyhow::anyhow!("{id} ran before its producer {src}"))
                    })
                })
                .collect::<MixResult<_>>()?,
        };

        tracing::trace!(%id, name = node.name(), inputs = inputs.len(), "process");
        let out = node.process(&inputs, format)?;
        if out.video_format() != *format {
            return Err(MixError::format_mismatch(format!(
                "node '{}' produced {}, negotiated {format}",
                node.name(),
                out.video_format()
            )));
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/filter_graph.rs"]
mod tests;
