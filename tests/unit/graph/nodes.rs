use super::*;
use crate::effects::policy::WeightedAverage;

#[test]
fn negotiation_picks_first_accepted_candidate() {
    let node = InputNode::new("cam").with_formats(&[PixelFormat::Gray8, PixelFormat::Bgra8Premul]);
    assert_eq!(
        node.negotiate_format(&PixelFormat::PREFERENCE).unwrap(),
        PixelFormat::Bgra8Premul
    );
    assert!(matches!(
        node.negotiate_format(&[PixelFormat::Yuv420p]),
        Err(MixError::FormatMismatch(_))
    ));
}

#[test]
fn mix_node_formats_follow_policy() {
    let mix = MixNode::new("mix", 2, 4, 4);
    assert_eq!(mix.input_ports(), 2);
    assert_eq!(mix.fixed_size(), Some((4, 4)));
    assert!(!mix.accepted_formats().contains(&PixelFormat::Yuv420p));
    assert_eq!(mix.policy().name(), "alpha_over");
}

#[test]
fn input_node_forwards_without_copy() {
    let node = InputNode::new("in");
    let frame = FrameBuffer::new(2, 2, PixelFormat::Rgba8Premul).unwrap();
    let out = node
        .process(std::slice::from_ref(&frame), &frame.video_format())
        .unwrap();
    assert!(out.shares_storage(&frame));
}

#[test]
fn input_node_rejects_other_format() {
    let node = InputNode::new("in");
    let frame = FrameBuffer::new(2, 2, PixelFormat::Gray8).unwrap();
    assert!(matches!(
        node.process(&[frame], &VideoFormat::rgba(2, 2)),
        Err(MixError::FormatMismatch(_))
    ));
}

#[test]
fn mix_node_checks_port_count() {
    let mix = MixNode::new("mix", 2, 1, 1);
    let frame = FrameBuffer::new(1, 1, PixelFormat::Rgba8Premul).unwrap();
    assert!(matches!(
        mix.process(&[frame], &VideoFormat::rgba(1, 1)),
        Err(MixError::InvalidConnection(_))
    ));
}

#[test]
fn mix_node_applies_background_and_policy() {
    let mix = MixNode::with_layouts(
        "avg",
        vec![InputLayout::default()],
        2,
        1,
        Arc::new(WeightedAverage),
    )
    .with_background([0, 0, 0, 255]);
    let small = FrameBuffer::filled(1, 1, PixelFormat::Rgba8Premul, [50, 60, 70, 255]).unwrap();
    let out = mix.process(&[small], &VideoFormat::rgba(2, 1)).unwrap();
    assert_eq!(out.data(), &[50, 60, 70, 255, 0, 0, 0, 255]);
}

#[test]
fn output_node_is_a_sink() {
    let out = OutputNode::new("out");
    assert_eq!(out.kind(), NodeKind::Sink);
    assert!(!out.has_output());
    assert_eq!(out.input_ports(), 1);
}
