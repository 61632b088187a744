//! Per-stream observation epoch reassembly from SBP observation fragments
//! (spec §4.F). Unlike [`sbp::messages::observation::reassemble`], which
//! collects fragments the caller has already gathered, this is the live,
//! one-fragment-at-a-time state machine a streaming pipeline actually needs.

use crate::codes::{canonicalize, from_sbp_code};
use crate::epoch::{CanonicalObservation, Epoch};
use sbp::messages::observation::{ObsFlags, ObservationFragment};

/// Receives a finalised epoch from [`ObservationUnpacker`].
pub trait EpochSink {
    fn emit(&mut self, epoch: Epoch);
}

impl<F: FnMut(Epoch)> EpochSink for F {
    fn emit(&mut self, epoch: Epoch) {
        self(epoch)
    }
}

#[derive(Debug, Clone)]
struct PartialEpoch {
    tow_ms: u32,
    week_number: i16,
    seq_size: u8,
    seq_index: u8,
    observations: Vec<CanonicalObservation>,
}

/// One per physical stream: the fragment sequencing state (`seq_index`,
/// `seq_size`) is only meaningful within a single source of frames.
#[derive(Debug, Default)]
pub struct ObservationUnpacker {
    current: Option<PartialEpoch>,
    last_emitted_tow_ms: Option<u32>,
}

fn canonical_observations(frag: &ObservationFragment) -> Vec<CanonicalObservation> {
    frag.observations
        .iter()
        .filter(|obs| {
            obs.flags.contains(ObsFlags::PSEUDORANGE_VALID) && !obs.flags.contains(ObsFlags::RAIM_EXCLUSION)
        })
        .filter_map(|obs| {
            from_sbp_code(obs.sid.code).map(|code| CanonicalObservation {
                satellite: obs.sid.satellite,
                code: canonicalize(code),
                pseudorange_m: obs.pseudorange_m,
                carrier_phase_cycles: obs.carrier_phase_cycles,
                doppler_hz: obs.doppler_hz,
                cn0_db_hz: obs.cn0_db_hz,
                lock_time_s: obs.lock_time_s,
                flags: obs.flags,
            })
        })
        .collect()
}

fn finalize(partial: PartialEpoch) -> Epoch {
    Epoch {
        tow_ms: partial.tow_ms,
        week_number: partial.week_number,
        observations: partial.observations,
    }
}

impl ObservationUnpacker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one wire fragment. Calls `sink.emit` zero or one times: once
    /// whenever a prior epoch closes out (because a newer one started) or
    /// this fragment itself completes its epoch, never more than that.
    pub fn push(&mut self, frag: &ObservationFragment, sink: &mut impl EpochSink) {
        match self.current.take() {
            None => {
                if self.last_emitted_tow_ms.is_some_and(|last| frag.tow_ms <= last) {
                    log::debug!(
                        "observation unpacker: dropping stale fragment at tow_ms={} (last emitted tow_ms={})",
                        frag.tow_ms,
                        self.last_emitted_tow_ms.unwrap()
                    );
                    return;
                }
                self.start(frag, sink)
            }
            Some(partial) => {
                if frag.tow_ms > partial.tow_ms
                    || (frag.tow_ms == partial.tow_ms && frag.week_number != partial.week_number)
                {
                    self.last_emitted_tow_ms = Some(partial.tow_ms);
                    sink.emit(finalize(partial));
                    self.start(frag, sink);
                } else if frag.tow_ms < partial.tow_ms {
                    log::debug!(
                        "observation unpacker: dropping stale fragment at tow_ms={} (current epoch tow_ms={})",
                        frag.tow_ms,
                        partial.tow_ms
                    );
                    self.current = Some(partial);
                } else if frag.sequence == partial.seq_index + 1 {
                    self.append(partial, frag, sink);
                } else if frag.sequence > partial.seq_index + 1 {
                    log::warn!(
                        "observation unpacker: sequence gap at tow_ms={} (expected {}, got {})",
                        frag.tow_ms,
                        partial.seq_index + 1,
                        frag.sequence
                    );
                    self.append(partial, frag, sink);
                } else {
                    sink.emit(finalize(partial));
                    self.start(frag, sink);
                }
            }
        }
    }

    fn start(&mut self, frag: &ObservationFragment, sink: &mut impl EpochSink) {
        let partial = PartialEpoch {
            tow_ms: frag.tow_ms,
            week_number: frag.week_number,
            seq_size: frag.total_frames,
            seq_index: frag.sequence,
            observations: canonical_observations(frag),
        };
        if partial.seq_index + 1 == partial.seq_size {
            sink.emit(finalize(partial));
            self.current = None;
        } else {
            self.current = Some(partial);
        }
    }

    fn append(&mut self, mut partial: PartialEpoch, frag: &ObservationFragment, sink: &mut impl EpochSink) {
        partial.seq_index = frag.sequence;
        partial.seq_size = frag.total_frames;
        partial.observations.extend(canonical_observations(frag));
        if frag.sequence + 1 == frag.total_frames {
            sink.emit(finalize(partial));
            self.current = None;
        } else {
            self.current = Some(partial);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbp::messages::observation::{PackedObservation, SignalIdentifier};

    fn frag(tow_ms: u32, total_frames: u8, sequence: u8) -> ObservationFragment {
        ObservationFragment {
            tow_ms,
            ns_residual: 0,
            week_number: 2200,
            total_frames,
            sequence,
            observations: vec![PackedObservation {
                sid: SignalIdentifier { satellite: sequence + 1, code: 0 },
                pseudorange_m: 20_000_000.0,
                carrier_phase_cycles: 1.0,
                doppler_hz: 0.0,
                cn0_db_hz: 40.0,
                lock_time_s: 10.0,
                flags: ObsFlags::PSEUDORANGE_VALID,
            }],
        }
    }

    #[test]
    fn three_fragment_sequence_emits_once_on_last() {
        let mut unpacker = ObservationUnpacker::new();
        let mut emitted = Vec::new();
        unpacker.push(&frag(100_000, 3, 0), &mut |e: Epoch| emitted.push(e));
        assert!(emitted.is_empty());
        unpacker.push(&frag(100_000, 3, 1), &mut |e: Epoch| emitted.push(e));
        assert!(emitted.is_empty());
        unpacker.push(&frag(100_000, 3, 2), &mut |e: Epoch| emitted.push(e));
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].observations.len(), 3);
    }

    #[test]
    fn newer_epoch_flushes_incomplete_previous_one() {
        let mut unpacker = ObservationUnpacker::new();
        let mut emitted = Vec::new();
        unpacker.push(&frag(100_000, 2, 0), &mut |e: Epoch| emitted.push(e));
        unpacker.push(&frag(101_000, 1, 0), &mut |e: Epoch| emitted.push(e));
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].tow_ms, 100_000);
        assert_eq!(emitted[1].tow_ms, 101_000);
    }

    #[test]
    fn stale_fragment_is_dropped() {
        let mut unpacker = ObservationUnpacker::new();
        let mut emitted = Vec::new();
        unpacker.push(&frag(100_000, 1, 0), &mut |e: Epoch| emitted.push(e));
        assert_eq!(emitted.len(), 1);
        unpacker.push(&frag(99_000, 1, 0), &mut |e: Epoch| emitted.push(e));
        assert_eq!(emitted.len(), 1, "a stale fragment must not produce a second emission");
    }

    #[test]
    fn pr_invalid_observation_is_dropped() {
        let mut f = frag(100_000, 1, 0);
        f.observations[0].flags = ObsFlags::empty();
        let mut unpacker = ObservationUnpacker::new();
        let mut emitted = Vec::new();
        unpacker.push(&f, &mut |e: Epoch| emitted.push(e));
        assert_eq!(emitted[0].observations.len(), 0);
    }
}
