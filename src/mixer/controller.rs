use crate::foundation::error::{MixError, MixResult};
use crate::frame::buffer::FrameBuffer;
use crate::frame::format::VideoFormat;
use crate::graph::filter_graph::{ExecOpts, FilterGraph};
use crate::graph::nodes::{InputNode, MixNode, OutputNode};
use crate::mixer::config::MixerConfig;
use crate::mixer::sync::FrameSynchronizer;
use std::collections::HashMap;

/// Counters for one mixing session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MixStats {
    /// Frames accepted by `push_frame`.
    pub frames_pushed: u64,
    /// Mixed frames returned by `pull_mixed_frame`.
    pub frames_mixed: u64,
    /// Frames discarded by timestamp matching.
    pub frames_dropped: u64,
}

/// Top-level mixing session: N inputs, one composited output.
///
/// Frames are buffered per input until a complete round is available (see
/// [`crate::SyncPolicy`]). [`MixerController::pull_mixed_frame`] never blocks: it returns
/// `Ok(None)` while a round is incomplete. Dropping the controller releases every queued frame.
#[derive(Debug)]
pub struct MixerController {
    config: MixerConfig,
    graph: FilterGraph,
    sync: FrameSynchronizer,
    stats: MixStats,
}

impl MixerController {
    /// Mixer with `input_count` full-canvas inputs and default settings.
    pub fn create(input_count: usize, output_format_hint: VideoFormat) -> MixResult<Self> {
        Self::new(MixerConfig::new(input_count, output_format_hint))
    }

    /// Build and finalize the `inputs -> mix -> output` graph described by `config`.
    ///
    /// Graph errors from `finalize` are returned unchanged.
    pub fn new(config: MixerConfig) -> MixResult<Self> {
        config.validate()?;
        let hint = config.output_format_hint;
        let layouts = config.resolved_layouts();

        let mut graph = FilterGraph::with_format_hint(hint.pixel_format);
        let mut inputs = Vec::with_capacity(config.input_count);
        for (i, layout) in layouts.iter().enumerate() {
            let mut node = InputNode::new(format!("input{i}"));
            if let Some((w, h)) = layout.size {
                node = node.with_size(w, h);
            }
            inputs.push(graph.add_node(Box::new(node))?);
        }
        let mix = graph.add_node(Box::new(
            MixNode::with_layouts(
                "mix",
                layouts,
                hint.width,
                hint.height,
                config.policy.build(),
            )
            .with_background(config.background),
        ))?;
        let out = graph.add_node(Box::new(
            OutputNode::new("output").with_size(hint.width, hint.height),
        ))?;

        for (port, &id) in inputs.iter().enumerate() {
            graph.connect(id, 0, mix, port)?;
        }
        graph.connect(mix, 0, out, 0)?;
        graph.finalize()?;

        if let Some(ep) = graph.output_endpoint()
            && let Some(f) = ep.format()
            && f.pixel_format != hint.pixel_format
        {
            tracing::warn!(
                hint = ?hint.pixel_format,
                negotiated = ?f.pixel_format,
                "output format hint not supported, fell back"
            );
        }

        let sync = FrameSynchronizer::new(config.sync, config.input_count);
        Ok(Self {
            config,
            graph,
            sync,
            stats: MixStats::default(),
        })
    }

    /// Configuration the controller was built from.
    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    /// The finalized graph.
    pub fn graph(&self) -> &FilterGraph {
        &self.graph
    }

    /// Number of inputs.
    pub fn input_count(&self) -> usize {
        self.config.input_count
    }

    /// Negotiated format of input `index`.
    pub fn input_format(&self, index: usize) -> Option<VideoFormat> {
        self.graph
            .input_endpoints()
            .get(index)
            .and_then(|ep| ep.format())
    }

    /// Negotiated output format.
    pub fn output_format(&self) -> Option<VideoFormat> {
        self.graph.output_endpoint().and_then(|ep| ep.format())
    }

    /// Frames waiting on input `index`.
    pub fn queued(&self, index: usize) -> usize {
        self.sync.queued(index)
    }

    /// Session counters.
    pub fn stats(&self) -> MixStats {
        MixStats {
            frames_dropped: self.sync.dropped(),
            ..self.stats
        }
    }

    /// Queue `frame` on input `index`.
    ///
    /// The frame must match the input's negotiated format; a rejected frame never enters the
    /// queue.
    pub fn push_frame(&mut self, index: usize, frame: FrameBuffer) -> MixResult<()> {
        let want = self.input_format(index).ok_or_else(|| {
            MixError::invalid_connection(format!(
                "input {index} out of range (mixer has {})",
                self.config.input_count
            ))
        })?;
        if frame.video_format() != want {
            return Err(MixError::format_mismatch(format!(
                "input {index} negotiated {want}, got {}",
                frame.video_format()
            )));
        }
        self.sync.push(index, frame)?;
        self.stats.frames_pushed += 1;
        Ok(())
    }

    /// Mix the next complete round, or `Ok(None)` when some input has no matching frame yet.
    ///
    /// Queued frames are only consumed when mixing succeeds. That includes stale frames skipped
    /// by timestamp matching: a failed mix leaves every queue as it was.
    #[tracing::instrument(skip(self))]
    pub fn pull_mixed_frame(&mut self) -> MixResult<Option<FrameBuffer>> {
        let Some(round) = self.sync.ready_round() else {
            return Ok(None);
        };
        let batch: HashMap<usize, FrameBuffer> = round.into_iter().enumerate().collect();
        let out = self.graph.execute_with(
            &batch,
            ExecOpts {
                parallel: self.config.parallel,
            },
        )?;
        self.sync.commit_round();
        self.stats.frames_mixed += 1;
        Ok(Some(out))
    }

    /// Drop every queued frame. Counters are kept.
    pub fn reset(&mut self) {
        self.sync.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/controller.rs"]
mod tests;
