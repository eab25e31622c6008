use crate::foundation::error::{MixError, MixResult};
use crate::frame::buffer::FrameBuffer;
use std::collections::VecDeque;

/// How frames from different inputs are grouped into one mix round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Round `k` uses the `k`-th frame pushed on every input. Timestamps are ignored.
    #[default]
    Fifo,
    /// A round fires when every input's oldest frame carries the same pts. Frames older than
    /// the newest queue head can never be matched and are dropped.
    Timestamp,
}

/// Per-input FIFO queues plus the round-matching rule.
///
/// Queues never reorder: frames leave each queue in arrival order, either as part of a round
/// or as a dropped stale frame.
#[derive(Debug)]
pub(crate) struct FrameSynchronizer {
    policy: SyncPolicy,
    queues: Vec<VecDeque<FrameBuffer>>,
    // Stale frames ahead of the round handed out by `ready_round`, dropped on commit.
    pending_stale: Vec<usize>,
    dropped: u64,
}

impl FrameSynchronizer {
    pub(crate) fn new(policy: SyncPolicy, inputs: usize) -> Self {
        Self {
            policy,
            queues: (0..inputs).map(|_| VecDeque::new()).collect(),
            pending_stale: Vec::new(),
            dropped: 0,
        }
    }

    pub(crate) fn push(&mut self, index: usize, frame: FrameBuffer) -> MixResult<()> {
        if self.policy == SyncPolicy::Timestamp && frame.pts().is_none() {
            return Err(MixError::invalid_format(format!(
                "timestamp sync requires a pts on every frame (input {index})"
            )));
        }
        let q = self.queues.get_mut(index).ok_or_else(|| {
            MixError::invalid_connection(format!("input {index} does not exist"))
        })?;
        q.push_back(frame);
        Ok(())
    }

    /// Frames of the next complete round, one per input. Does not dequeue anything.
    ///
    /// Under [`SyncPolicy::Timestamp`] frames older than the round are skipped. They leave the
    /// queues on [`FrameSynchronizer::commit_round`], or right away when no round is ready.
    pub(crate) fn ready_round(&mut self) -> Option<Vec<FrameBuffer>> {
        self.pending_stale.clear();
        if self.policy == SyncPolicy::Fifo {
            return self.queues.iter().map(|q| q.front().cloned()).collect();
        }

        let (stale, ready) = self.scan_timestamps();
        if !ready {
            self.drop_stale(&stale);
            return None;
        }
        let round: Option<Vec<FrameBuffer>> = self
            .queues
            .iter()
            .zip(&stale)
            .map(|(q, &skip)| q.get(skip).cloned())
            .collect();
        self.pending_stale = stale;
        round
    }

    /// Dequeue the round returned by the last [`FrameSynchronizer::ready_round`], together with
    /// the stale frames queued ahead of it.
    pub(crate) fn commit_round(&mut self) {
        let stale = std::mem::take(&mut self.pending_stale);
        self.drop_stale(&stale);
        for q in &mut self.queues {
            q.pop_front();
        }
    }

    /// Per-queue count of frames older than the first pts every queue can match, and whether
    /// such a pts exists among the queued frames.
    fn scan_timestamps(&self) -> (Vec<usize>, bool) {
        let pts_at = |i: usize, k: usize| self.queues[i].get(k).and_then(FrameBuffer::pts);
        let mut skip = vec![0usize; self.queues.len()];
        loop {
            let mut target = i64::MIN;
            for (i, &k) in skip.iter().enumerate() {
                match pts_at(i, k) {
                    Some(pts) => target = target.max(pts),
                    None => return (skip, false),
                }
            }
            let mut aligned = true;
            for (i, k) in skip.iter_mut().enumerate() {
                while let Some(pts) = pts_at(i, *k)
                    && pts < target
                {
                    *k += 1;
                }
                match pts_at(i, *k) {
                    None => return (skip, false),
                    Some(pts) if pts != target => aligned = false,
                    Some(_) => {}
                }
            }
            if aligned {
                return (skip, true);
            }
        }
    }

    fn drop_stale(&mut self, stale: &[usize]) {
        for (i, (q, &count)) in self.queues.iter_mut().zip(stale).enumerate() {
            for _ in 0..count {
                if let Some(frame) = q.pop_front() {
                    self.dropped += 1;
                    tracing::debug!(input = i, pts = ?frame.pts(), "dropped stale frame");
                }
            }
        }
    }

    pub(crate) fn queued(&self, index: usize) -> usize {
        self.queues.get(index).map_or(0, VecDeque::len)
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }

    pub(crate) fn clear(&mut self) {
        self.pending_stale.clear();
        for q in &mut self.queues {
            q.clear();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/sync.rs"]
mod tests;
