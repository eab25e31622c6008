use crate::foundation::error::{MixError, MixResult};
use smallvec::SmallVec;

/// Pixel formats understood by frame buffers and graph nodes.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Premultiplied RGBA8, one packed plane.
    Rgba8Premul,
    /// Premultiplied BGRA8, one packed plane.
    Bgra8Premul,
    /// 8-bit luma, one plane.
    Gray8,
    /// Planar 4:2:0 YUV: full-size Y, quarter-size U and V.
    Yuv420p,
}

impl PixelFormat {
    /// Negotiation preference order. Earlier formats win ties.
    pub const PREFERENCE: [PixelFormat; 4] = [
        PixelFormat::Rgba8Premul,
        PixelFormat::Bgra8Premul,
        PixelFormat::Gray8,
        PixelFormat::Yuv420p,
    ];

    /// Number of planes in a buffer of this format.
    pub fn plane_count(self) -> usize {
        match self {
            PixelFormat::Rgba8Premul | PixelFormat::Bgra8Premul | PixelFormat::Gray8 => 1,
            PixelFormat::Yuv420p => 3,
        }
    }

    /// Bytes per pixel of the first plane.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8Premul | PixelFormat::Bgra8Premul => 4,
            PixelFormat::Gray8 | PixelFormat::Yuv420p => 1,
        }
    }

    /// Plane layouts for a `width x height` buffer, in storage order.
    pub fn plane_layouts(self, width: u32, height: u32) -> MixResult<SmallVec<[PlaneLayout; 3]>> {
        if width == 0 || height == 0 {
            return Err(MixError::invalid_format(format!(
                "frame dimensions must be positive, got {width}x{height}"
            )));
        }
        let overflow = || MixError::invalid_format(format!("{width}x{height} {self:?} overflows"));

        let mut out = SmallVec::new();
        let luma_stride = (width as usize)
            .checked_mul(self.bytes_per_pixel())
            .ok_or_else(overflow)?;
        let luma_len = luma_stride
            .checked_mul(height as usize)
            .ok_or_else(overflow)?;
        out.push(PlaneLayout {
            offset: 0,
            stride: luma_stride,
            width,
            height,
        });

        if self == PixelFormat::Yuv420p {
            let cw = width.div_ceil(2);
            let ch = height.div_ceil(2);
            let chroma_len = (cw as usize) * (ch as usize);
            let u_off = luma_len;
            let v_off = u_off.checked_add(chroma_len).ok_or_else(overflow)?;
            v_off.checked_add(chroma_len).ok_or_else(overflow)?;
            out.push(PlaneLayout {
                offset: u_off,
                stride: cw as usize,
                width: cw,
                height: ch,
            });
            out.push(PlaneLayout {
                offset: v_off,
                stride: cw as usize,
                width: cw,
                height: ch,
            });
        }
        Ok(out)
    }

    /// Total buffer size in bytes for a `width x height` frame.
    pub fn buffer_len(self, width: u32, height: u32) -> MixResult<usize> {
        let planes = self.plane_layouts(width, height)?;
        planes
            .last()
            .and_then(|p| p.offset.checked_add(p.len()))
            .ok_or_else(|| MixError::invalid_format("buffer size overflows"))
    }
}

/// Location of one plane inside a frame's contiguous storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Byte offset of the plane's first row.
    pub offset: usize,
    /// Bytes per row.
    pub stride: usize,
    /// Plane width in samples.
    pub width: u32,
    /// Plane height in rows.
    pub height: u32,
}

impl PlaneLayout {
    /// Plane size in bytes.
    pub fn len(&self) -> usize {
        self.stride * self.height as usize
    }

    /// Return `true` for a zero-sized plane.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A negotiated or requested frame format: pixel format plus dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct VideoFormat {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub pixel_format: PixelFormat,
}

impl VideoFormat {
    /// Create a validated format.
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> MixResult<Self> {
        pixel_format.buffer_len(width, height)?;
        Ok(Self {
            width,
            height,
            pixel_format,
        })
    }

    /// Shorthand for a premultiplied RGBA8 format.
    pub fn rgba(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixel_format: PixelFormat::Rgba8Premul,
        }
    }

    /// Buffer size in bytes for this format.
    pub fn buffer_len(&self) -> MixResult<usize> {
        self.pixel_format.buffer_len(self.width, self.height)
    }
}

impl std::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} {:?}", self.width, self.height, self.pixel_format)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/format.rs"]
mod tests;
