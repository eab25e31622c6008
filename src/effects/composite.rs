use crate::foundation::error::{MixError, MixResult};
use crate::foundation::math::mul_div255_u8;
use crate::frame::format::{PixelFormat, VideoFormat};

pub(crate) type Premul4 = [u8; 4];

/// Premultiplied source-over with a fixed-point opacity in `0..=255`.
///
/// Channel order does not matter as long as alpha sits in byte 3.
pub(crate) fn over(dst: Premul4, src: Premul4, op: u16) -> Premul4 {
    if op == 0 || src[3] == 0 {
        return dst;
    }

    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Opaque single-channel mix: `dst * (1 - op) + src * op`.
pub(crate) fn lerp_u8(dst: u8, src: u8, op: u16) -> u8 {
    let it = 255u16 - op.min(255);
    mul_div255(u16::from(src), op.min(255)).saturating_add(mul_div255(u16::from(dst), it))
}

/// Background bytes for one pixel of `format`, given a premultiplied RGBA colour.
pub(crate) fn background_pixel(format: PixelFormat, rgba: Premul4) -> MixResult<Premul4> {
    match format {
        PixelFormat::Rgba8Premul => Ok(rgba),
        PixelFormat::Bgra8Premul => Ok([rgba[2], rgba[1], rgba[0], rgba[3]]),
        PixelFormat::Gray8 => Ok([luma(rgba), 0, 0, 0]),
        PixelFormat::Yuv420p => Err(MixError::format_mismatch(
            "compositing does not support planar yuv420p",
        )),
    }
}

/// Fill `dst` with the background colour.
pub(crate) fn clear(dst: &mut [u8], format: &VideoFormat, rgba: Premul4) -> MixResult<()> {
    check_len(dst, format)?;
    let px = background_pixel(format.pixel_format, rgba)?;
    match format.pixel_format.bytes_per_pixel() {
        4 => {
            for d in dst.chunks_exact_mut(4) {
                d.copy_from_slice(&px);
            }
        }
        _ => dst.fill(px[0]),
    }
    Ok(())
}

/// Clipped overlap of a span placed at `offset` on a destination axis of length `dst_len`.
///
/// Returns `(src_start, dst_start, len)` or `None` when the span lies fully outside.
pub(crate) fn overlap(offset: i32, src_len: u32, dst_len: u32) -> Option<(usize, usize, usize)> {
    let offset = i64::from(offset);
    let start = offset.max(0);
    let end = (offset + i64::from(src_len)).min(i64::from(dst_len));
    if end <= start {
        return None;
    }
    Some((
        (start - offset) as usize,
        start as usize,
        (end - start) as usize,
    ))
}

/// Draw `src` over `dst` at `(x, y)` with opacity `op`, clipped to the destination.
pub(crate) fn blit_over(
    dst: &mut [u8],
    format: &VideoFormat,
    src: &[u8],
    src_w: u32,
    src_h: u32,
    pos: (i32, i32),
    op: u16,
) -> MixResult<()> {
    check_len(dst, format)?;
    let bpp = format.pixel_format.bytes_per_pixel();
    if src.len() != (src_w as usize) * (src_h as usize) * bpp {
        return Err(MixError::format_mismatch(
            "blit_over source length does not match its dimensions",
        ));
    }
    if op == 0 {
        return Ok(());
    }
    let (Some((sx, dx, w)), Some((sy, dy, h))) = (
        overlap(pos.0, src_w, format.width),
        overlap(pos.1, src_h, format.height),
    ) else {
        return Ok(());
    };

    let dst_stride = format.width as usize * bpp;
    let src_stride = src_w as usize * bpp;
    for row in 0..h {
        let d0 = (dy + row) * dst_stride + dx * bpp;
        let s0 = (sy + row) * src_stride + sx * bpp;
        let drow = &mut dst[d0..d0 + w * bpp];
        let srow = &src[s0..s0 + w * bpp];
        if bpp == 4 {
            for (d, s) in drow.chunks_exact_mut(4).zip(srow.chunks_exact(4)) {
                let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], op);
                d.copy_from_slice(&out);
            }
        } else {
            for (d, &s) in drow.iter_mut().zip(srow) {
                *d = lerp_u8(*d, s, op);
            }
        }
    }
    Ok(())
}

fn check_len(dst: &[u8], format: &VideoFormat) -> MixResult<()> {
    let expected = format.buffer_len()?;
    if dst.len() != expected {
        return Err(MixError::format_mismatch(format!(
            "destination holds {} bytes, {format} needs {expected}",
            dst.len()
        )));
    }
    Ok(())
}

// BT.601 integer weights.
fn luma(rgba: Premul4) -> u8 {
    let y = 77 * u32::from(rgba[0]) + 150 * u32::from(rgba[1]) + 29 * u32::from(rgba[2]);
    ((y + 128) >> 8) as u8
}

fn mul_div255(x: u16, y: u16) -> u8 {
    mul_div255_u8(x, y)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
