use super::*;
use crate::frame::format::PixelFormat;

fn frame(tag: u8) -> FrameBuffer {
    FrameBuffer::filled(1, 1, PixelFormat::Gray8, [tag, 0, 0, 0]).unwrap()
}

fn tags(round: &[FrameBuffer]) -> Vec<u8> {
    round.iter().map(|f| f.data()[0]).collect()
}

#[test]
fn fifo_waits_for_every_input() {
    let mut s = FrameSynchronizer::new(SyncPolicy::Fifo, 2);
    s.push(0, frame(1)).unwrap();
    assert!(s.ready_round().is_none());
    s.push(1, frame(2)).unwrap();
    assert_eq!(tags(&s.ready_round().unwrap()), vec![1, 2]);
}

#[test]
fn fifo_pairs_in_arrival_order() {
    let mut s = FrameSynchronizer::new(SyncPolicy::Fifo, 2);
    s.push(0, frame(1)).unwrap();
    s.push(0, frame(3)).unwrap();
    s.push(1, frame(2)).unwrap();
    s.push(1, frame(4)).unwrap();

    assert_eq!(tags(&s.ready_round().unwrap()), vec![1, 2]);
    s.commit_round();
    assert_eq!(tags(&s.ready_round().unwrap()), vec![3, 4]);
    s.commit_round();
    assert!(s.ready_round().is_none());
}

#[test]
fn ready_round_does_not_dequeue() {
    let mut s = FrameSynchronizer::new(SyncPolicy::Fifo, 1);
    s.push(0, frame(1)).unwrap();
    assert!(s.ready_round().is_some());
    assert_eq!(s.queued(0), 1);
    s.commit_round();
    assert_eq!(s.queued(0), 0);
}

#[test]
fn timestamp_requires_pts() {
    let mut s = FrameSynchronizer::new(SyncPolicy::Timestamp, 1);
    assert!(matches!(s.push(0, frame(1)), Err(MixError::InvalidFormat(_))));
}

#[test]
fn timestamp_drops_stale_frames() {
    let mut s = FrameSynchronizer::new(SyncPolicy::Timestamp, 2);
    s.push(0, frame(1).with_pts(0)).unwrap();
    s.push(0, frame(2).with_pts(40)).unwrap();
    s.push(1, frame(3).with_pts(40)).unwrap();

    let round = s.ready_round().unwrap();
    assert_eq!(tags(&round), vec![2, 3]);
    assert_eq!(s.dropped(), 0);
    assert_eq!(s.queued(0), 2);

    s.commit_round();
    assert_eq!(s.dropped(), 1);
    assert_eq!(s.queued(0), 0);
    assert_eq!(s.queued(1), 0);
}

#[test]
fn uncommitted_round_keeps_its_stale_frames() {
    let mut s = FrameSynchronizer::new(SyncPolicy::Timestamp, 2);
    s.push(0, frame(1).with_pts(0)).unwrap();
    s.push(0, frame(2).with_pts(20)).unwrap();
    s.push(1, frame(3).with_pts(20)).unwrap();

    assert_eq!(tags(&s.ready_round().unwrap()), vec![2, 3]);
    // Retry after a failed mix sees the same round and nothing was lost.
    assert_eq!(tags(&s.ready_round().unwrap()), vec![2, 3]);
    assert_eq!(s.queued(0), 2);
    assert_eq!(s.dropped(), 0);

    s.commit_round();
    assert_eq!(s.dropped(), 1);
    assert!(s.ready_round().is_none());
}

#[test]
fn timestamp_waits_when_one_side_is_behind() {
    let mut s = FrameSynchronizer::new(SyncPolicy::Timestamp, 2);
    s.push(0, frame(1).with_pts(80)).unwrap();
    s.push(1, frame(2).with_pts(40)).unwrap();
    assert!(s.ready_round().is_none());
    assert_eq!(s.queued(1), 0);
    assert_eq!(s.queued(0), 1);

    s.push(1, frame(3).with_pts(80)).unwrap();
    assert_eq!(tags(&s.ready_round().unwrap()), vec![1, 3]);
}

#[test]
fn unknown_input_is_rejected_and_clear_empties() {
    let mut s = FrameSynchronizer::new(SyncPolicy::Fifo, 1);
    assert!(matches!(
        s.push(3, frame(0)),
        Err(MixError::InvalidConnection(_))
    ));
    s.push(0, frame(0)).unwrap();
    s.clear();
    assert_eq!(s.queued(0), 0);
}
