//! Cross-stream epoch alignment by GPS time (spec §4.G "Message matcher").
//!
//! A fixed-size FIFO of per-timestamp buckets, one per distinct epoch time
//! seen across the three streams the VRS pipeline needs: a base station's
//! raw observations, the service's correction stream at the base, and the
//! service's correction stream at the virtual reference station.

use crate::epoch::Epoch;
use std::collections::VecDeque;

/// Default bucket count (spec §4.G: "a fixed-size FIFO of per-timestamp
/// buckets (default 16)").
pub const DEFAULT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamKind {
    BaseObservation,
    BaseCorrection,
    VrsCorrection,
}

#[derive(Debug, Clone)]
struct Bucket {
    tow_ms: u32,
    base_obs: Option<Epoch>,
    base_corr: Option<Epoch>,
    vrs_corr: Option<Epoch>,
}

impl Bucket {
    fn new(tow_ms: u32) -> Self {
        Bucket { tow_ms, base_obs: None, base_corr: None, vrs_corr: None }
    }

    fn slot(&mut self, kind: StreamKind) -> &mut Option<Epoch> {
        match kind {
            StreamKind::BaseObservation => &mut self.base_obs,
            StreamKind::BaseCorrection => &mut self.base_corr,
            StreamKind::VrsCorrection => &mut self.vrs_corr,
        }
    }

    fn is_complete(&self) -> bool {
        self.base_obs.is_some() && self.base_corr.is_some() && self.vrs_corr.is_some()
    }
}

/// The three epochs of a completed bucket, ready for [`crate::adjuster`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchedEpoch {
    pub tow_ms: u32,
    pub base_obs: Epoch,
    pub base_corr: Epoch,
    pub vrs_corr: Epoch,
}

/// Aligns epochs arriving from three independent streams by timestamp.
/// Buckets that never complete are garbage-collected the moment an older
/// bucket would otherwise block [`find_match`] from returning a newer,
/// completed one (spec §4.G: "deleting that bucket and every older
/// bucket").
#[derive(Debug)]
pub struct MessageMatcher {
    capacity: usize,
    buckets: VecDeque<Bucket>,
}

impl Default for MessageMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageMatcher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        MessageMatcher { capacity: capacity.max(1), buckets: VecDeque::new() }
    }

    /// Stores `epoch` under `kind` in the bucket for its timestamp,
    /// creating the bucket if needed. A duplicate `(time, stream)` is
    /// dropped with a warning rather than overwriting the earlier one
    /// (spec §4.G: "duplicate `(time, stream)` are dropped with a
    /// warning").
    pub fn add(&mut self, kind: StreamKind, epoch: Epoch) {
        let tow_ms = epoch.tow_ms;
        let index = match self.buckets.iter().position(|b| b.tow_ms == tow_ms) {
            Some(i) => i,
            None => {
                if self.buckets.len() >= self.capacity {
                    if let Some(evicted) = self.buckets.pop_front() {
                        log::warn!(
                            "message matcher: evicting stale incomplete bucket at tow_ms={}",
                            evicted.tow_ms
                        );
                    }
                }
                self.buckets.push_back(Bucket::new(tow_ms));
                self.buckets.len() - 1
            }
        };

        let slot = self.buckets[index].slot(kind);
        if slot.is_some() {
            log::warn!("message matcher: dropping duplicate {kind:?} epoch at tow_ms={tow_ms}");
            return;
        }
        *slot = Some(epoch);
    }

    /// Scans oldest-to-newest for the first bucket holding all three
    /// streams, removing it and every older (necessarily incomplete)
    /// bucket. Returns `None` if no bucket is complete yet.
    pub fn find_match(&mut self) -> Option<MatchedEpoch> {
        let index = self.buckets.iter().position(Bucket::is_complete)?;
        let mut drained = self.buckets.drain(..=index);
        let completed = drained.next_back().expect("index came from this deque");
        drop(drained);
        Some(MatchedEpoch {
            tow_ms: completed.tow_ms,
            base_obs: completed.base_obs.expect("checked by is_complete"),
            base_corr: completed.base_corr.expect("checked by is_complete"),
            vrs_corr: completed.vrs_corr.expect("checked by is_complete"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch(tow_ms: u32) -> Epoch {
        Epoch { tow_ms, week_number: 2200, observations: vec![] }
    }

    #[test]
    fn incomplete_older_bucket_is_discarded_by_a_newer_complete_one() {
        let mut matcher = MessageMatcher::new();
        matcher.add(StreamKind::BaseObservation, epoch(100_000));

        matcher.add(StreamKind::BaseObservation, epoch(100_500));
        matcher.add(StreamKind::BaseCorrection, epoch(100_500));
        matcher.add(StreamKind::VrsCorrection, epoch(100_500));

        let matched = matcher.find_match().expect("t=100.5 bucket is complete");
        assert_eq!(matched.tow_ms, 100_500);
        assert!(matcher.find_match().is_none(), "the incomplete t=100 bucket must not resurface");
    }

    #[test]
    fn duplicate_stream_for_same_time_is_dropped() {
        let mut matcher = MessageMatcher::new();
        matcher.add(StreamKind::BaseObservation, epoch(100_000));
        matcher.add(StreamKind::BaseObservation, Epoch { tow_ms: 100_000, week_number: 99, observations: vec![] });
        matcher.add(StreamKind::BaseCorrection, epoch(100_000));
        matcher.add(StreamKind::VrsCorrection, epoch(100_000));
        let matched = matcher.find_match().unwrap();
        assert_eq!(matched.base_obs.week_number, 2200, "the first BaseObservation epoch wins");
    }

    #[test]
    fn capacity_overflow_evicts_oldest_incomplete_bucket() {
        let mut matcher = MessageMatcher::with_capacity(2);
        matcher.add(StreamKind::BaseObservation, epoch(1));
        matcher.add(StreamKind::BaseObservation, epoch(2));
        matcher.add(StreamKind::BaseObservation, epoch(3));
        assert_eq!(matcher.buckets.len(), 2);
        assert_eq!(matcher.buckets[0].tow_ms, 2);
    }
}
