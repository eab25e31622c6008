use crate::effects::policy::{AlphaOver, CompositePolicy, InputLayout, Layer};
use crate::foundation::error::{MixError, MixResult};
use crate::frame::buffer::FrameBuffer;
use crate::frame::format::{PixelFormat, VideoFormat};
use crate::graph::node::{GraphNode, NodeKind, expect_inputs};
use smallvec::SmallVec;
use std::sync::Arc;

/// Source node fed by an external producer. Forwards the supplied frame without copying.
#[derive(Clone, Debug)]
pub struct InputNode {
    name: String,
    formats: SmallVec<[PixelFormat; 4]>,
    size: Option<(u32, u32)>,
}

impl InputNode {
    /// Input accepting every pixel format, sized by its consumer.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formats: PixelFormat::PREFERENCE.into_iter().collect(),
            size: None,
        }
    }

    /// Restrict the formats the producer can deliver.
    pub fn with_formats(mut self, formats: &[PixelFormat]) -> Self {
        self.formats = formats.iter().copied().collect();
        self
    }

    /// Pin the frame size this input delivers.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }
}

impl GraphNode for InputNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Source
    }

    fn input_ports(&self) -> usize {
        0
    }

    fn accepted_formats(&self) -> &[PixelFormat] {
        &self.formats
    }

    fn fixed_size(&self) -> Option<(u32, u32)> {
        self.size
    }

    fn process(&self, inputs: &[FrameBuffer], format: &VideoFormat) -> MixResult<FrameBuffer> {
        expect_inputs(self, inputs)?;
        let frame = &inputs[0];
        if frame.video_format() != *format {
            return Err(MixError::format_mismatch(format!(
                "input '{}' negotiated {format}, got {}",
                self.name,
                frame.video_format()
            )));
        }
        Ok(frame.retain())
    }
}

/// Composites N inputs into one frame through a [`CompositePolicy`].
#[derive(Clone, Debug)]
pub struct MixNode {
    name: String,
    layouts: Vec<InputLayout>,
    policy: Arc<dyn CompositePolicy>,
    formats: SmallVec<[PixelFormat; 4]>,
    size: (u32, u32),
    background: [u8; 4],
}

impl MixNode {
    /// Mix node with `inputs` full-canvas layouts and the default [`AlphaOver`] policy.
    pub fn new(name: impl Into<String>, inputs: usize, width: u32, height: u32) -> Self {
        Self::with_layouts(
            name,
            vec![InputLayout::default(); inputs],
            width,
            height,
            Arc::new(AlphaOver),
        )
    }

    /// Mix node with one explicit layout per input port.
    pub fn with_layouts(
        name: impl Into<String>,
        layouts: Vec<InputLayout>,
        width: u32,
        height: u32,
        policy: Arc<dyn CompositePolicy>,
    ) -> Self {
        let formats = PixelFormat::PREFERENCE
            .into_iter()
            .filter(|f| policy.accepts(*f))
            .collect();
        Self {
            name: name.into(),
            layouts,
            policy,
            formats,
            size: (width, height),
            background: [0, 0, 0, 0],
        }
    }

    /// Premultiplied RGBA colour behind all inputs. Defaults to transparent black.
    pub fn with_background(mut self, rgba: [u8; 4]) -> Self {
        self.background = rgba;
        self
    }

    /// Compositing policy in use.
    pub fn policy(&self) -> &dyn CompositePolicy {
        self.policy.as_ref()
    }
}

impl GraphNode for MixNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Transform
    }

    fn input_ports(&self) -> usize {
        self.layouts.len()
    }

    fn accepted_formats(&self) -> &[PixelFormat] {
        &self.formats
    }

    fn fixed_size(&self) -> Option<(u32, u32)> {
        Some(self.size)
    }

    fn preserves_size(&self) -> bool {
        false
    }

    fn process(&self, inputs: &[FrameBuffer], format: &VideoFormat) -> MixResult<FrameBuffer> {
        expect_inputs(self, inputs)?;
        let layers: SmallVec<[Layer<'_>; 4]> = inputs
            .iter()
            .zip(&self.layouts)
            .map(|(frame, layout)| Layer {
                frame,
                layout: *layout,
            })
            .collect();

        let mut out = FrameBuffer::alloc(*format)?;
        let dst = out
            .data_mut()
            .ok_or_else(|| MixError::Other(anyhow::anyhow!("mix output buffer is shared")))?;
        self.policy
            .composite(dst, format, self.background, &layers)?;
        Ok(out)
    }
}

/// Terminal sink. Hands the frame on its single port out of the graph.
#[derive(Clone, Debug)]
pub struct OutputNode {
    name: String,
    formats: SmallVec<[PixelFormat; 4]>,
    size: Option<(u32, u32)>,
}

impl OutputNode {
    /// Sink accepting every pixel format and size.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formats: PixelFormat::PREFERENCE.into_iter().collect(),
            size: None,
        }
    }

    /// Restrict the formats the consumer can take.
    pub fn with_formats(mut self, formats: &[PixelFormat]) -> Self {
        self.formats = formats.iter().copied().collect();
        self
    }

    /// Require frames of exactly this size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }
}

impl GraphNode for OutputNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Sink
    }

    fn input_ports(&self) -> usize {
        1
    }

    fn accepted_formats(&self) -> &[PixelFormat] {
        &self.formats
    }

    fn fixed_size(&self) -> Option<(u32, u32)> {
        self.size
    }

    fn process(&self, inputs: &[FrameBuffer], _format: &VideoFormat) -> MixResult<FrameBuffer> {
        expect_inputs(self, inputs)?;
        Ok(inputs[0].retain())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/nodes.rs"]
mod tests;
