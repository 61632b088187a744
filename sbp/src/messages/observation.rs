//! MSG_OBS (0x004A): a GNSS observation epoch, fragmented across multiple
//! SBP frames when it holds more satellites/signals than fit in one (spec
//! §3 "observation epoch", §4.I "epoch fragmentation": 14 observations per
//! frame, up to 15 frames, 210 observations per epoch).

use crate::constants::{MAX_FRAMES_PER_EPOCH, MAX_OBS_PER_EPOCH, MAX_OBS_PER_FRAME};
use crate::error::Error;
use bitflags::bitflags;
use bitstream::{BitReader, BitWriter};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ObsFlags: u8 {
        const PSEUDORANGE_VALID = 0b0000_0001;
        const CARRIER_PHASE_VALID = 0b0000_0010;
        const HALF_CYCLE_AMBIGUITY = 0b0000_0100;
        const DOPPLER_VALID = 0b0000_1000;
        const RAIM_EXCLUSION = 0b0001_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalIdentifier {
    pub satellite: u8,
    pub code: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PackedObservation {
    pub sid: SignalIdentifier,
    pub pseudorange_m: f64,
    pub carrier_phase_cycles: f64,
    pub doppler_hz: f64,
    pub cn0_db_hz: f64,
    pub lock_time_s: f64,
    pub flags: ObsFlags,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObservationSet {
    pub tow_ms: u32,
    pub ns_residual: i32,
    pub week_number: i16,
    pub observations: Vec<PackedObservation>,
}

/// One wire-sized fragment of an [`ObservationSet`]: at most
/// [`MAX_OBS_PER_FRAME`] observations, tagged with its position in the
/// epoch (spec §4.I "n_obs packs total frame count and this frame's
/// sequence number into one byte").
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObservationFragment {
    pub tow_ms: u32,
    pub ns_residual: i32,
    pub week_number: i16,
    pub total_frames: u8,
    pub sequence: u8,
    pub observations: Vec<PackedObservation>,
}

const PR_SCALE: f64 = 0.02;
const CP_WHOLE_SCALE: f64 = 1.0;
const CP_FRAC_SCALE: f64 = 1.0 / 256.0;
const DOPPLER_FRAC_SCALE: f64 = 1.0 / 256.0;
const CN0_SCALE: f64 = 0.25;
const LOCK_TIME_MIN_S: f64 = 0.0;

/// SBP's own coarse lock-time ladder (distinct from RTCM's, see
/// `rtcm3::time`): index `i` means "locked for at least `2^i / 100`
/// seconds", saturating at index 15.
fn lock_time_indicator(seconds: f64) -> u8 {
    if seconds <= LOCK_TIME_MIN_S {
        return 0;
    }
    let mut indicator = 0u8;
    while indicator < 15 && (1u64 << indicator) as f64 / 100.0 <= seconds {
        indicator += 1;
    }
    indicator
}

fn lock_time_seconds(indicator: u8) -> f64 {
    if indicator == 0 {
        0.0
    } else {
        (1u64 << indicator.min(15)) as f64 / 100.0
    }
}

fn decode_fragment(payload: &[u8]) -> Result<ObservationFragment, Error> {
    let mut r = BitReader::new(payload);
    let tow_ms = r.u(32)? as u32;
    let ns_residual = r.s(32)? as i32;
    let week_number = r.s(16)? as i16;
    let n_obs = r.u(8)? as u8;
    let total_frames = n_obs >> 4;
    let sequence = n_obs & 0x0F;

    const OBS_WIDTH_BITS: usize = 32 + 32 + 8 + 16 + 8 + 8 + 8 + 8 + 8 + 8;
    let mut observations = Vec::new();
    while r.remaining_bits() >= OBS_WIDTH_BITS {
        let pr_raw = r.u(32)? as u64;
        let cp_whole = r.s(32)? as i32;
        let cp_frac = r.u(8)? as u8;
        let doppler_whole = r.s(16)? as i16;
        let doppler_frac = r.u(8)? as u8;
        let cn0_raw = r.u(8)? as u32;
        let lock_raw = r.u(8)? as u8;
        let flags = ObsFlags::from_bits_truncate(r.u(8)? as u8);
        let satellite = r.u(8)? as u8;
        let code = r.u(8)? as u8;

        observations.push(PackedObservation {
            sid: SignalIdentifier { satellite, code },
            pseudorange_m: pr_raw as f64 * PR_SCALE,
            carrier_phase_cycles: cp_whole as f64 * CP_WHOLE_SCALE + cp_frac as f64 * CP_FRAC_SCALE,
            doppler_hz: doppler_whole as f64 + doppler_frac as f64 * DOPPLER_FRAC_SCALE,
            cn0_db_hz: cn0_raw as f64 * CN0_SCALE,
            lock_time_s: lock_time_seconds(lock_raw),
            flags,
        });
    }

    Ok(ObservationFragment {
        tow_ms,
        ns_residual,
        week_number,
        total_frames,
        sequence,
        observations,
    })
}

fn encode_fragment(frag: &ObservationFragment) -> Result<Vec<u8>, Error> {
    if frag.observations.len() > MAX_OBS_PER_FRAME {
        return Err(Error::TooManyObservations(frag.observations.len()));
    }
    let mut w = BitWriter::new();
    w.u(frag.tow_ms as u64, 32)?;
    w.s(frag.ns_residual as i64, 32)?;
    w.s(frag.week_number as i64, 16)?;
    w.u(((frag.total_frames << 4) | (frag.sequence & 0x0F)) as u64, 8)?;

    for obs in &frag.observations {
        w.u((obs.pseudorange_m / PR_SCALE).round() as u64, 32)?;
        let cp_whole = obs.carrier_phase_cycles.floor();
        let cp_frac = ((obs.carrier_phase_cycles - cp_whole) / CP_FRAC_SCALE).round() as u64;
        w.s(cp_whole as i64, 32)?;
        w.u(cp_frac.min(255), 8)?;
        let doppler_whole = obs.doppler_hz.trunc();
        let doppler_frac = ((obs.doppler_hz - doppler_whole).abs() / DOPPLER_FRAC_SCALE).round() as u64;
        w.s(doppler_whole as i64, 16)?;
        w.u(doppler_frac.min(255), 8)?;
        w.u((obs.cn0_db_hz / CN0_SCALE).round() as u64, 8)?;
        w.u(lock_time_indicator(obs.lock_time_s) as u64, 8)?;
        w.u(obs.flags.bits() as u64, 8)?;
        w.u(obs.sid.satellite as u64, 8)?;
        w.u(obs.sid.code as u64, 8)?;
    }
    Ok(w.into_bytes())
}

/// Reassembles one or more fragments (all sharing the same `tow_ms`) into a
/// complete [`ObservationSet`]. The caller is responsible for collecting
/// fragments by epoch before calling this (spec §4.H "epoch adjuster").
pub fn reassemble(fragments: &[ObservationFragment]) -> Result<ObservationSet, Error> {
    if fragments.is_empty() {
        return Err(Error::InvalidMessage("no fragments to reassemble"));
    }
    let first = &fragments[0];
    let mut observations = Vec::new();
    for frag in fragments {
        if frag.tow_ms != first.tow_ms || frag.week_number != first.week_number {
            return Err(Error::InvalidMessage("fragment epoch mismatch during reassembly"));
        }
        observations.extend_from_slice(&frag.observations);
    }
    Ok(ObservationSet {
        tow_ms: first.tow_ms,
        ns_residual: first.ns_residual,
        week_number: first.week_number,
        observations,
    })
}

/// Splits a complete epoch into wire-sized fragments.
pub fn fragment(set: &ObservationSet) -> Result<Vec<ObservationFragment>, Error> {
    if set.observations.len() > MAX_OBS_PER_EPOCH {
        return Err(Error::TooManyObservations(set.observations.len()));
    }
    let chunks: Vec<&[PackedObservation]> = set.observations.chunks(MAX_OBS_PER_FRAME).collect();
    let total_frames = chunks.len().max(1);
    if total_frames > MAX_FRAMES_PER_EPOCH {
        return Err(Error::TooManyObservations(set.observations.len()));
    }
    if chunks.is_empty() {
        return Ok(vec![ObservationFragment {
            tow_ms: set.tow_ms,
            ns_residual: set.ns_residual,
            week_number: set.week_number,
            total_frames: 1,
            sequence: 0,
            observations: vec![],
        }]);
    }
    Ok(chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| ObservationFragment {
            tow_ms: set.tow_ms,
            ns_residual: set.ns_residual,
            week_number: set.week_number,
            total_frames: total_frames as u8,
            sequence: i as u8,
            observations: chunk.to_vec(),
        })
        .collect())
}

pub fn decode(payload: &[u8]) -> Result<ObservationSet, Error> {
    reassemble(&[decode_fragment(payload)?])
}

pub fn encode(set: &ObservationSet) -> Result<Vec<u8>, Error> {
    let fragments = fragment(set)?;
    encode_fragment(&fragments[0])
}

/// Frame-by-frame encode, for callers that must emit one SBP frame per
/// fragment directly (the common case for a live stream).
pub fn encode_fragments(set: &ObservationSet) -> Result<Vec<Vec<u8>>, Error> {
    fragment(set)?.iter().map(encode_fragment).collect()
}

pub fn decode_fragment_pub(payload: &[u8]) -> Result<ObservationFragment, Error> {
    decode_fragment(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_obs(satellite: u8) -> PackedObservation {
        PackedObservation {
            sid: SignalIdentifier { satellite, code: 0 },
            pseudorange_m: 22_500_000.0,
            carrier_phase_cycles: 118_292_145.25,
            doppler_hz: -1234.5,
            cn0_db_hz: 45.0,
            lock_time_s: 64.0,
            flags: ObsFlags::PSEUDORANGE_VALID | ObsFlags::CARRIER_PHASE_VALID,
        }
    }

    #[test]
    fn single_fragment_round_trips() {
        let set = ObservationSet {
            tow_ms: 123_456,
            ns_residual: 0,
            week_number: 2200,
            observations: vec![sample_obs(1), sample_obs(2)],
        };
        let bytes = encode(&set).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.observations.len(), 2);
        assert!((decoded.observations[0].pseudorange_m - 22_500_000.0).abs() < PR_SCALE);
    }

    #[test]
    fn large_epoch_splits_into_multiple_fragments() {
        let observations: Vec<_> = (0..30).map(|i| sample_obs(i as u8 + 1)).collect();
        let set = ObservationSet { tow_ms: 1, ns_residual: 0, week_number: 1, observations };
        let fragments = fragment(&set).unwrap();
        assert_eq!(fragments.len(), 3); // 14 + 14 + 2
        assert_eq!(fragments[0].total_frames, 3);
        assert_eq!(fragments[2].sequence, 2);

        let encoded: Vec<_> = fragments.iter().map(|f| encode_fragment(f).unwrap()).collect();
        let decoded_fragments: Vec<_> =
            encoded.iter().map(|b| decode_fragment_pub(b).unwrap()).collect();
        let reassembled = reassemble(&decoded_fragments).unwrap();
        assert_eq!(reassembled.observations.len(), 30);
    }

    #[test]
    fn epoch_over_210_observations_rejected() {
        let observations: Vec<_> = (0..211).map(|i| sample_obs((i % 32) as u8 + 1)).collect();
        let set = ObservationSet { tow_ms: 1, ns_residual: 0, week_number: 1, observations };
        assert_eq!(fragment(&set).unwrap_err(), Error::TooManyObservations(211));
    }

    #[test]
    fn mismatched_epoch_fragments_rejected() {
        let a = ObservationFragment {
            tow_ms: 1,
            ns_residual: 0,
            week_number: 1,
            total_frames: 2,
            sequence: 0,
            observations: vec![sample_obs(1)],
        };
        let mut b = a.clone();
        b.tow_ms = 2;
        b.sequence = 1;
        let err = reassemble(&[a, b]).unwrap_err();
        assert_eq!(err, Error::InvalidMessage("fragment epoch mismatch during reassembly"));
    }
}
