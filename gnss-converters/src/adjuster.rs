//! Combines a matched triple of epochs into one VRS observation epoch
//! (spec §4.H "Epoch adjuster"): `vrs = base_obs + (vrs_corr - base_corr)`.

use crate::epoch::{CanonicalObservation, Epoch};
use crate::matcher::MatchedEpoch;
use sbp::messages::observation::ObsFlags;

/// SBP's pseudorange LSB (spec §4.H: "re-quantise to 0.02 m LSB").
const PR_QUANTUM_M: f64 = 0.02;

/// Bits 0-3 (PR/CP/half-cycle/Doppler validity) are ANDed across the three
/// inputs; bit 4 (this implementation's RAIM-exclusion flag, see
/// `sbp::messages::observation::ObsFlags`) is ORed (spec §4.H "flags_out").
const AND_BITS: ObsFlags = ObsFlags::from_bits_truncate(
    ObsFlags::PSEUDORANGE_VALID.bits()
        | ObsFlags::CARRIER_PHASE_VALID.bits()
        | ObsFlags::HALF_CYCLE_AMBIGUITY.bits()
        | ObsFlags::DOPPLER_VALID.bits(),
);

fn quantize_pr(pr_m: f64) -> f64 {
    (pr_m / PR_QUANTUM_M).round() * PR_QUANTUM_M
}

/// Combines one `(sat, canonical_code)` triple per spec §4.H's per-signal
/// formulas. Signals present in only a subset of the three epochs are
/// dropped by the caller before this is reached.
fn adjust_signal(
    base_obs: &CanonicalObservation,
    base_corr: &CanonicalObservation,
    vrs_corr: &CanonicalObservation,
) -> CanonicalObservation {
    let pseudorange_m =
        quantize_pr(base_obs.pseudorange_m + (vrs_corr.pseudorange_m - base_corr.pseudorange_m));
    let carrier_phase_cycles = base_obs.carrier_phase_cycles
        + (vrs_corr.carrier_phase_cycles - base_corr.carrier_phase_cycles);
    let doppler_hz = base_obs.doppler_hz + (vrs_corr.doppler_hz - base_corr.doppler_hz);
    let lock_time_s = base_obs.lock_time_s.min(base_corr.lock_time_s).min(vrs_corr.lock_time_s);
    let cn0_db_hz = base_obs.cn0_db_hz.min(base_corr.cn0_db_hz).min(vrs_corr.cn0_db_hz);
    let and_part = base_obs.flags & base_corr.flags & vrs_corr.flags & AND_BITS;
    let or_part = (base_obs.flags | base_corr.flags | vrs_corr.flags) & ObsFlags::RAIM_EXCLUSION;
    let flags = and_part | or_part;

    CanonicalObservation {
        satellite: base_obs.satellite,
        code: base_obs.code,
        pseudorange_m,
        carrier_phase_cycles,
        doppler_hz,
        cn0_db_hz,
        lock_time_s,
        flags,
    }
}

/// Produces the adjusted VRS epoch from a [`MatchedEpoch`]. Only signals
/// present in all three inputs for the same `(satellite, code)` survive
/// (spec §4.H: "Signals present in only a subset are dropped"). The output
/// epoch carries the matched timestamp.
pub fn adjust(matched: &MatchedEpoch) -> Epoch {
    let observations = matched
        .vrs_corr
        .observations
        .iter()
        .filter_map(|vrs| {
            let base_obs = matched
                .base_obs
                .observations
                .iter()
                .find(|o| o.satellite == vrs.satellite && o.code == vrs.code)?;
            let base_corr = matched
                .base_corr
                .observations
                .iter()
                .find(|o| o.satellite == vrs.satellite && o.code == vrs.code)?;
            Some(adjust_signal(base_obs, base_corr, vrs))
        })
        .collect();

    Epoch { tow_ms: matched.tow_ms, week_number: matched.vrs_corr.week_number, observations }
}
