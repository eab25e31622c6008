use super::*;

#[test]
fn over_opaque_source_replaces_destination() {
    assert_eq!(over([10, 20, 30, 255], [200, 100, 50, 255], 255), [200, 100, 50, 255]);
}

#[test]
fn over_zero_opacity_or_transparent_source_is_identity() {
    let dst = [1, 2, 3, 4];
    assert_eq!(over(dst, [200, 100, 50, 255], 0), dst);
    assert_eq!(over(dst, [0, 0, 0, 0], 255), dst);
}

#[test]
fn over_half_opacity_blends_premultiplied() {
    let out = over([0, 0, 0, 255], [255, 255, 255, 255], 128);
    assert_eq!(out, [128, 128, 128, 255]);
}

#[test]
fn lerp_u8_endpoints() {
    assert_eq!(lerp_u8(10, 200, 0), 10);
    assert_eq!(lerp_u8(10, 200, 255), 200);
}

#[test]
fn background_swizzles_for_bgra_and_rejects_yuv() {
    assert_eq!(
        background_pixel(PixelFormat::Bgra8Premul, [1, 2, 3, 4]).unwrap(),
        [3, 2, 1, 4]
    );
    assert_eq!(
        background_pixel(PixelFormat::Gray8, [255, 255, 255, 255]).unwrap()[0],
        255
    );
    assert!(matches!(
        background_pixel(PixelFormat::Yuv420p, [0, 0, 0, 0]),
        Err(MixError::FormatMismatch(_))
    ));
}

#[test]
fn overlap_clips_both_edges() {
    assert_eq!(overlap(0, 4, 8), Some((0, 0, 4)));
    assert_eq!(overlap(-2, 4, 8), Some((2, 0, 2)));
    assert_eq!(overlap(6, 4, 8), Some((0, 6, 2)));
    assert_eq!(overlap(8, 4, 8), None);
    assert_eq!(overlap(-4, 4, 8), None);
}

#[test]
fn blit_over_writes_only_the_clipped_rect() {
    let fmt = VideoFormat::new(3, 2, PixelFormat::Gray8).unwrap();
    let mut dst = vec![0u8; 6];
    blit_over(&mut dst, &fmt, &[9, 9, 9, 9], 2, 2, (2, 1), 255).unwrap();
    assert_eq!(dst, vec![0, 0, 0, 0, 0, 9]);
}

#[test]
fn blit_over_rejects_wrong_destination_length() {
    let fmt = VideoFormat::rgba(2, 2);
    let mut dst = vec![0u8; 4];
    assert!(blit_over(&mut dst, &fmt, &[0; 4], 1, 1, (0, 0), 255).is_err());
}
