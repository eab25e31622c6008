use super::*;

#[test]
fn packed_formats_have_one_plane() {
    for f in [PixelFormat::Rgba8Premul, PixelFormat::Bgra8Premul] {
        let planes = f.plane_layouts(3, 2).unwrap();
        assert_eq!(planes.len(), 1);
        assert_eq!(planes[0].stride, 12);
        assert_eq!(f.buffer_len(3, 2).unwrap(), 24);
    }
    assert_eq!(PixelFormat::Gray8.buffer_len(3, 2).unwrap(), 6);
}

#[test]
fn yuv420p_rounds_chroma_up() {
    let planes = PixelFormat::Yuv420p.plane_layouts(5, 3).unwrap();
    assert_eq!(planes.len(), 3);
    assert_eq!(planes[0].len(), 15);
    assert_eq!(planes[1].offset, 15);
    assert_eq!((planes[1].width, planes[1].height), (3, 2));
    assert_eq!(planes[2].offset, 21);
    assert_eq!(PixelFormat::Yuv420p.buffer_len(5, 3).unwrap(), 27);
}

#[test]
fn zero_dimension_is_invalid_format() {
    assert!(matches!(
        PixelFormat::Rgba8Premul.buffer_len(0, 4),
        Err(MixError::InvalidFormat(_))
    ));
    assert!(matches!(
        VideoFormat::new(4, 0, PixelFormat::Gray8),
        Err(MixError::InvalidFormat(_))
    ));
}

#[test]
fn preference_order_is_fixed() {
    assert_eq!(PixelFormat::PREFERENCE[0], PixelFormat::Rgba8Premul);
    assert_eq!(PixelFormat::PREFERENCE.len(), 4);
}

#[test]
fn video_format_serde_uses_snake_case() {
    let f = VideoFormat::rgba(16, 9);
    let s = serde_json::to_string(&f).unwrap();
    assert!(s.contains("\"rgba8_premul\""));
    let back: VideoFormat = serde_json::from_str(&s).unwrap();
    assert_eq!(back, f);
}
