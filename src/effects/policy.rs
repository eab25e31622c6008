use crate::effects::composite::{blit_over, clear, overlap};
use crate::foundation::error::{MixError, MixResult};
use crate::foundation::math::opacity_to_u8;
use crate::frame::buffer::{FrameBuffer, zeroed};
use crate::frame::format::{PixelFormat, VideoFormat};
use std::sync::Arc;

/// Placement of one mixer input on the output canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InputLayout {
    /// Horizontal offset of the input's top-left corner, in output pixels.
    pub x: i32,
    /// Vertical offset of the input's top-left corner, in output pixels.
    pub y: i32,
    /// Opacity multiplier in `[0, 1]`.
    pub opacity: f32,
    /// Input size when it differs from the output canvas. `None` uses the canvas size.
    pub size: Option<(u32, u32)>,
}

impl Default for InputLayout {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            opacity: 1.0,
            size: None,
        }
    }
}

/// One input frame together with its placement.
#[derive(Clone, Copy, Debug)]
pub struct Layer<'a> {
    /// Input pixels, already in the destination pixel format.
    pub frame: &'a FrameBuffer,
    /// Placement on the canvas.
    pub layout: InputLayout,
}

/// Strategy used by the mix node to combine its inputs into one frame.
///
/// Implementations must be deterministic: identical layers produce identical bytes.
pub trait CompositePolicy: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Return `true` when the policy can composite buffers of `format`.
    fn accepts(&self, format: PixelFormat) -> bool;

    /// Write the composite of `layers` (bottom to top) into `dst`.
    fn composite(
        &self,
        dst: &mut [u8],
        format: &VideoFormat,
        background: [u8; 4],
        layers: &[Layer<'_>],
    ) -> MixResult<()>;
}

/// Built-in policies, selectable from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// [`AlphaOver`].
    #[default]
    AlphaOver,
    /// [`WeightedAverage`].
    WeightedAverage,
}

impl PolicyKind {
    /// Instantiate the policy.
    pub fn build(self) -> Arc<dyn CompositePolicy> {
        match self {
            PolicyKind::AlphaOver => Arc::new(AlphaOver),
            PolicyKind::WeightedAverage => Arc::new(WeightedAverage),
        }
    }
}

fn packed_or_gray(format: PixelFormat) -> bool {
    matches!(
        format,
        PixelFormat::Rgba8Premul | PixelFormat::Bgra8Premul | PixelFormat::Gray8
    )
}

/// Default policy: clear to background, then premultiplied source-over in input order.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlphaOver;

impl CompositePolicy for AlphaOver {
    fn name(&self) -> &'static str {
        "alpha_over"
    }

    fn accepts(&self, format: PixelFormat) -> bool {
        packed_or_gray(format)
    }

    fn composite(
        &self,
        dst: &mut [u8],
        format: &VideoFormat,
        background: [u8; 4],
        layers: &[Layer<'_>],
    ) -> MixResult<()> {
        clear(dst, format, background)?;
        for layer in layers {
            check_layer(format, layer)?;
            blit_over(
                dst,
                format,
                layer.frame.data(),
                layer.frame.width(),
                layer.frame.height(),
                (layer.layout.x, layer.layout.y),
                opacity_to_u8(layer.layout.opacity),
            )?;
        }
        Ok(())
    }
}

/// Every output pixel is the opacity-weighted mean of the inputs covering it.
///
/// Pixels no input covers keep the background colour.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedAverage;

impl CompositePolicy for WeightedAverage {
    fn name(&self) -> &'static str {
        "weighted_average"
    }

    fn accepts(&self, format: PixelFormat) -> bool {
        packed_or_gray(format)
    }

    fn composite(
        &self,
        dst: &mut [u8],
        format: &VideoFormat,
        background: [u8; 4],
        layers: &[Layer<'_>],
    ) -> MixResult<()> {
        clear(dst, format, background)?;

        let bpp = format.pixel_format.bytes_per_pixel();
        let px_count = format.width as usize * format.height as usize;
        let mut sums = zeroed::<u32>(px_count.saturating_mul(bpp))?;
        let mut weights = zeroed::<u32>(px_count)?;

        for layer in layers {
            check_layer(format, layer)?;
            let w = u32::from(opacity_to_u8(layer.layout.opacity));
            if w == 0 {
                continue;
            }
            let (sw, sh) = (layer.frame.width(), layer.frame.height());
            let (Some((sx, dx, cw)), Some((sy, dy, ch))) = (
                overlap(layer.layout.x, sw, format.width),
                overlap(layer.layout.y, sh, format.height),
            ) else {
                continue;
            };
            let src = layer.frame.data();
            for row in 0..ch {
                for col in 0..cw {
                    let di = (dy + row) * format.width as usize + dx + col;
                    let si = (sy + row) * sw as usize + sx + col;
                    weights[di] += w;
                    for c in 0..bpp {
                        sums[di * bpp + c] += u32::from(src[si * bpp + c]) * w;
                    }
                }
            }
        }

        for (i, &wsum) in weights.iter().enumerate() {
            if wsum == 0 {
                continue;
            }
            for c in 0..bpp {
                let v = (sums[i * bpp + c] + wsum / 2) / wsum;
                dst[i * bpp + c] = v.min(255) as u8;
            }
        }
        Ok(())
    }
}

fn check_layer(format: &VideoFormat, layer: &Layer<'_>) -> MixResult<()> {
    if layer.frame.pixel_format() != format.pixel_format {
        return Err(MixError::format_mismatch(format!(
            "layer is {:?}, canvas is {:?}",
            layer.frame.pixel_format(),
            format.pixel_format
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/effects/policy.rs"]
mod tests;
