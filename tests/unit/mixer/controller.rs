use super::*;
use crate::effects::policy::InputLayout;
use crate::frame::format::PixelFormat;
use crate::mixer::sync::SyncPolicy;

fn rgba(w: u32, h: u32, px: [u8; 4]) -> FrameBuffer {
    FrameBuffer::filled(w, h, PixelFormat::Rgba8Premul, px).unwrap()
}

#[test]
fn create_negotiates_hint() {
    let m = MixerController::create(3, VideoFormat::rgba(8, 4)).unwrap();
    assert_eq!(m.input_count(), 3);
    assert_eq!(m.output_format(), Some(VideoFormat::rgba(8, 4)));
    for i in 0..3 {
        assert_eq!(m.input_format(i), Some(VideoFormat::rgba(8, 4)));
    }
    assert_eq!(m.input_format(3), None);
    assert_eq!(m.graph().node_count(), 5);
    assert_eq!(m.graph().edge_count(), 4);
}

#[test]
fn zero_inputs_is_invalid() {
    assert!(matches!(
        MixerController::create(0, VideoFormat::rgba(8, 4)),
        Err(MixError::InvalidFormat(_))
    ));
}

#[test]
fn unsupported_hint_format_falls_back_to_preference() {
    let hint = VideoFormat {
        width: 4,
        height: 4,
        pixel_format: PixelFormat::Yuv420p,
    };
    let m = MixerController::create(1, hint).unwrap();
    assert_eq!(m.output_format(), Some(VideoFormat::rgba(4, 4)));
}

#[test]
fn gray_hint_is_honoured() {
    let hint = VideoFormat::new(4, 2, PixelFormat::Gray8).unwrap();
    let m = MixerController::create(2, hint).unwrap();
    assert_eq!(m.input_format(0), Some(hint));
}

#[test]
fn push_rejects_bad_index_and_format() {
    let mut m = MixerController::create(2, VideoFormat::rgba(2, 2)).unwrap();
    assert!(matches!(
        m.push_frame(2, rgba(2, 2, [0; 4])),
        Err(MixError::InvalidConnection(_))
    ));
    assert!(matches!(
        m.push_frame(0, rgba(4, 2, [0; 4])),
        Err(MixError::FormatMismatch(_))
    ));
    assert_eq!(m.queued(0), 0);
    assert_eq!(m.stats().frames_pushed, 0);
}

#[test]
fn incomplete_round_reports_not_ready() {
    let mut m = MixerController::create(2, VideoFormat::rgba(2, 2)).unwrap();
    m.push_frame(0, rgba(2, 2, [255, 0, 0, 255])).unwrap();
    assert!(m.pull_mixed_frame().unwrap().is_none());
    assert_eq!(m.queued(0), 1);
}

#[test]
fn rounds_consume_one_frame_per_input() {
    let mut m = MixerController::create(2, VideoFormat::rgba(1, 1)).unwrap();
    m.push_frame(0, rgba(1, 1, [10, 0, 0, 255])).unwrap();
    m.push_frame(0, rgba(1, 1, [20, 0, 0, 255])).unwrap();
    m.push_frame(1, rgba(1, 1, [0, 0, 0, 0])).unwrap();

    let first = m.pull_mixed_frame().unwrap().unwrap();
    assert_eq!(first.data(), &[10, 0, 0, 255]);
    assert!(m.pull_mixed_frame().unwrap().is_none());

    m.push_frame(1, rgba(1, 1, [0, 0, 0, 0])).unwrap();
    let second = m.pull_mixed_frame().unwrap().unwrap();
    assert_eq!(second.data(), &[20, 0, 0, 255]);

    let stats = m.stats();
    assert_eq!(stats.frames_pushed, 4);
    assert_eq!(stats.frames_mixed, 2);
}

#[test]
fn reset_drops_queued_frames() {
    let mut m = MixerController::create(2, VideoFormat::rgba(1, 1)).unwrap();
    m.push_frame(0, rgba(1, 1, [0; 4])).unwrap();
    m.reset();
    assert_eq!(m.queued(0), 0);
    m.push_frame(1, rgba(1, 1, [0; 4])).unwrap();
    assert!(m.pull_mixed_frame().unwrap().is_none());
}

#[test]
fn layouts_place_inputs() {
    let mut cfg = MixerConfig::new(2, VideoFormat::rgba(2, 1));
    cfg.layouts = vec![
        InputLayout {
            size: Some((1, 1)),
            ..InputLayout::default()
        },
        InputLayout {
            x: 1,
            size: Some((1, 1)),
            ..InputLayout::default()
        },
    ];
    cfg.background = [0, 0, 0, 255];
    let mut m = MixerController::new(cfg).unwrap();
    assert_eq!(
        m.input_format(1),
        Some(VideoFormat::rgba(1, 1))
    );
    m.push_frame(0, rgba(1, 1, [255, 0, 0, 255])).unwrap();
    m.push_frame(1, rgba(1, 1, [0, 0, 255, 255])).unwrap();
    let out = m.pull_mixed_frame().unwrap().unwrap();
    assert_eq!(out.data(), &[255, 0, 0, 255, 0, 0, 255, 255]);
}

#[test]
fn timestamp_sync_counts_drops() {
    let mut cfg = MixerConfig::new(2, VideoFormat::rgba(1, 1));
    cfg.sync = SyncPolicy::Timestamp;
    let mut m = MixerController::new(cfg).unwrap();
    m.push_frame(0, rgba(1, 1, [0; 4]).with_pts(0)).unwrap();
    m.push_frame(0, rgba(1, 1, [0; 4]).with_pts(1)).unwrap();
    m.push_frame(1, rgba(1, 1, [0; 4]).with_pts(1)).unwrap();
    let out = m.pull_mixed_frame().unwrap().unwrap();
    assert_eq!(out.pts(), Some(1));
    assert_eq!(m.stats().frames_dropped, 1);
}
