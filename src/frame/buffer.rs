use crate::foundation::error::{MixError, MixResult};
use crate::frame::format::{PixelFormat, PlaneLayout, VideoFormat};
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Debug)]
struct FrameStorage {
    format: VideoFormat,
    planes: SmallVec<[PlaneLayout; 3]>,
    data: Vec<u8>,
}

/// Reference-counted image buffer with an immutable shape.
///
/// Width, height and pixel format are fixed at creation and the storage size is derived from
/// them. Handles share storage through an atomic reference count: [`FrameBuffer::retain`] adds a
/// handle, [`FrameBuffer::release`] (or drop) removes one, and storage is freed with the last
/// handle. Pixel data can only be written while a handle is the sole owner.
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    storage: Arc<FrameStorage>,
    pts: Option<i64>,
}

impl FrameBuffer {
    /// Allocate a zero-filled buffer.
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> MixResult<Self> {
        let format = VideoFormat::new(width, height, pixel_format)?;
        Self::alloc(format)
    }

    /// Allocate a zero-filled buffer for an already validated [`VideoFormat`].
    pub fn alloc(format: VideoFormat) -> MixResult<Self> {
        let planes = format
            .pixel_format
            .plane_layouts(format.width, format.height)?;
        let len = format.buffer_len()?;
        let data = zeroed::<u8>(len)?;
        Ok(Self {
            storage: Arc::new(FrameStorage {
                format,
                planes,
                data,
            }),
            pts: None,
        })
    }

    /// Adopt existing bytes. `data.len()` must match the size implied by the format.
    pub fn from_data(
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        data: Vec<u8>,
    ) -> MixResult<Self> {
        let format = VideoFormat::new(width, height, pixel_format)?;
        let planes = pixel_format.plane_layouts(width, height)?;
        let expected = format.buffer_len()?;
        if data.len() != expected {
            return Err(MixError::invalid_format(format!(
                "{format} expects {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            storage: Arc::new(FrameStorage {
                format,
                planes,
                data,
            }),
            pts: None,
        })
    }

    /// Allocate a buffer with every pixel set to `pixel`.
    ///
    /// Packed formats repeat all four bytes, `Gray8` uses `pixel[0]`, and `Yuv420p` fills the
    /// Y, U and V planes with `pixel[0..3]`.
    pub fn filled(
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        pixel: [u8; 4],
    ) -> MixResult<Self> {
        let mut frame = Self::new(width, height, pixel_format)?;
        let planes = frame.storage.planes.clone();
        let Some(data) = frame.data_mut() else {
            return Err(MixError::Other(anyhow::anyhow!(
                "freshly allocated frame is shared"
            )));
        };
        match pixel_format {
            PixelFormat::Rgba8Premul | PixelFormat::Bgra8Premul => {
                for px in data.chunks_exact_mut(4) {
                    px.copy_from_slice(&pixel);
                }
            }
            PixelFormat::Gray8 => data.fill(pixel[0]),
            PixelFormat::Yuv420p => {
                for (plane, value) in planes.iter().zip(pixel) {
                    data[plane.offset..plane.offset + plane.len()].fill(value);
                }
            }
        }
        Ok(frame)
    }

    /// Attach a presentation timestamp to this handle.
    pub fn with_pts(mut self, pts: i64) -> Self {
        self.pts = Some(pts);
        self
    }

    /// Presentation timestamp, if the producer supplied one.
    pub fn pts(&self) -> Option<i64> {
        self.pts
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.storage.format.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.storage.format.height
    }

    /// Pixel layout.
    pub fn pixel_format(&self) -> PixelFormat {
        self.storage.format.pixel_format
    }

    /// Dimensions and pixel layout together.
    pub fn video_format(&self) -> VideoFormat {
        self.storage.format
    }

    /// All planes, contiguous in storage order.
    pub fn data(&self) -> &[u8] {
        &self.storage.data
    }

    /// Number of planes.
    pub fn plane_count(&self) -> usize {
        self.storage.planes.len()
    }

    /// Layout of plane `index`.
    pub fn plane_layout(&self, index: usize) -> Option<PlaneLayout> {
        self.storage.planes.get(index).copied()
    }

    /// Bytes of plane `index`.
    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        let p = self.storage.planes.get(index)?;
        self.storage.data.get(p.offset..p.offset + p.len())
    }

    /// Mutable pixel data, available only while this handle is the sole owner.
    pub fn data_mut(&mut self) -> Option<&mut [u8]> {
        Arc::get_mut(&mut self.storage).map(|s| s.data.as_mut_slice())
    }

    /// Take another handle to the same storage.
    pub fn retain(&self) -> Self {
        self.clone()
    }

    /// Give up this handle. Storage is freed once no handle remains.
    pub fn release(self) {
        drop(self);
    }

    /// Current number of handles sharing the storage.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.storage)
    }

    /// Return `true` when both handles share one allocation.
    pub fn shares_storage(&self, other: &FrameBuffer) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Stable content hash over shape and pixel data. The timestamp is not included.
    pub fn fingerprint(&self) -> u64 {
        let f = self.storage.format;
        let mut header = [0u8; 9];
        header[0..4].copy_from_slice(&f.width.to_le_bytes());
        header[4..8].copy_from_slice(&f.height.to_le_bytes());
        header[8] = f.pixel_format as u8;
        let seed = xxhash_rust::xxh3::xxh3_64(&header);
        xxhash_rust::xxh3::xxh3_64_with_seed(&self.storage.data, seed)
    }
}

/// Zero-filled `Vec` of `len` elements, or [`MixError::OutOfMemory`] when it cannot be allocated.
pub(crate) fn zeroed<T: Copy + Default>(len: usize) -> MixResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| MixError::OutOfMemory {
        bytes: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    v.resize(len, T::default());
    Ok(v)
}

#[cfg(test)]
#[path = "../../tests/unit/frame/buffer.rs"]
mod tests;
