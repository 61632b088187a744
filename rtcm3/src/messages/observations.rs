//! Legacy (pre-MSM) GPS/GLONASS observation messages: 1001-1004, 1010, 1012
//! (spec §3 "RTCM observation record", §4.D "legacy observation messages").

use crate::error::Error;
use bitstream::{BitReader, BitWriter};

/// A single satellite's legacy observation fields. Which of `l1`/`l2` are
/// populated depends on the message number (1001/1002: L1 only; 1003/1004,
/// 1010/1012: L1+L2).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LegacyObservation {
    pub satellite: u8,
    pub l1_pseudorange_m: f64,
    pub l1_carrier_phase_cycles: Option<f64>,
    pub l1_lock_time_s: f64,
    pub l1_cnr_db_hz: Option<f64>,
    pub l1_pseudorange_ambiguity: u8,
    pub l2: Option<LegacyL2Observation>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LegacyL2Observation {
    pub code_indicator: u8,
    pub pseudorange_diff_m: f64,
    pub carrier_phase_cycles: Option<f64>,
    pub lock_time_s: f64,
    pub cnr_db_hz: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LegacyObservationMessage {
    pub msg_num: u16,
    pub station_id: u16,
    pub gps_tow_ms: u32,
    pub synchronous_gnss_flag: bool,
    pub divergence_free_smoothing: bool,
    pub smoothing_interval_code: u8,
    pub observations: Vec<LegacyObservation>,
}

const L1_WAVELENGTH_CYCLES_PER_M: f64 = 1.0; // carrier phase kept in native cycle units

fn has_l2(msg_num: u16) -> bool {
    matches!(msg_num, 1003 | 1004 | 1010 | 1012)
}

fn is_extended(msg_num: u16) -> bool {
    matches!(msg_num, 1002 | 1004 | 1012)
}

fn is_glonass(msg_num: u16) -> bool {
    matches!(msg_num, 1009 | 1010 | 1011 | 1012)
}

pub fn decode(msg_num: u16, payload: &[u8]) -> Result<LegacyObservationMessage, Error> {
    let mut r = BitReader::new(payload);
    let got = r.u(12)? as u16;
    if got != msg_num {
        return Err(Error::MessageTypeMismatch { expected: msg_num, got });
    }
    let station_id = r.u(12)? as u16;
    let gps_tow_ms = r.u(30)? as u32;
    let synchronous_gnss_flag = r.u(1)? == 1;
    let num_sats = r.u(5)? as usize;
    let divergence_free_smoothing = r.u(1)? == 1;
    let smoothing_interval_code = r.u(3)? as u8;

    let extended = is_extended(msg_num);
    let l2_present = has_l2(msg_num);
    let glonass = is_glonass(msg_num);

    let mut observations = Vec::with_capacity(num_sats);
    for _ in 0..num_sats {
        let satellite = r.u(6)? as u8;
        let code_indicator = r.u(1)? as u8;
        let _ = code_indicator;
        let pr_raw = r.u(24)? as u64;
        let l1_pseudorange_m = pr_raw as f64 * 0.02;
        let phase_diff_raw = r.s(20)?;
        let l1_carrier_phase_cycles = if phase_diff_raw == -(1 << 19) {
            None
        } else {
            Some((l1_pseudorange_m + phase_diff_raw as f64 * 0.0005) / L1_WAVELENGTH_CYCLES_PER_M)
        };
        let lock_raw = r.u(7)? as u8;
        let l1_lock_time_s = crate::time::legacy_lock_time_seconds(lock_raw);
        let l1_pseudorange_ambiguity = if extended { r.u(8)? as u8 } else { 0 };
        let l1_cnr_db_hz = if extended {
            let raw = r.u(8)? as u32;
            if raw == 0 {
                None
            } else {
                Some(raw as f64 * 0.25)
            }
        } else {
            None
        };
        let _ = glonass;

        let l2 = if l2_present {
            let l2_code_indicator = r.u(2)? as u8;
            let pr_diff_raw = r.s(14)?;
            let pseudorange_diff_m = pr_diff_raw as f64 * 0.02;
            let l2_phase_diff_raw = r.s(20)?;
            let carrier_phase_cycles = if l2_phase_diff_raw == -(1 << 19) {
                None
            } else {
                Some(l2_phase_diff_raw as f64 * 0.0005)
            };
            let l2_lock_raw = r.u(7)? as u8;
            let lock_time_s = crate::time::legacy_lock_time_seconds(l2_lock_raw);
            let cnr_db_hz = if extended {
                let raw = r.u(8)? as u32;
                if raw == 0 {
                    None
                } else {
                    Some(raw as f64 * 0.25)
                }
            } else {
                None
            };
            Some(LegacyL2Observation {
                code_indicator: l2_code_indicator,
                pseudorange_diff_m,
                carrier_phase_cycles,
                lock_time_s,
                cnr_db_hz,
            })
        } else {
            None
        };

        observations.push(LegacyObservation {
            satellite,
            l1_pseudorange_m,
            l1_carrier_phase_cycles,
            l1_lock_time_s,
            l1_cnr_db_hz,
            l1_pseudorange_ambiguity,
            l2,
        });
    }

    Ok(LegacyObservationMessage {
        msg_num,
        station_id,
        gps_tow_ms,
        synchronous_gnss_flag,
        divergence_free_smoothing,
        smoothing_interval_code,
        observations,
    })
}

pub fn encode(msg: &LegacyObservationMessage) -> Result<Vec<u8>, Error> {
    let mut w = BitWriter::new();
    w.u(msg.msg_num as u64, 12)?;
    w.u(msg.station_id as u64, 12)?;
    w.u(msg.gps_tow_ms as u64, 30)?;
    w.u(msg.synchronous_gnss_flag as u64, 1)?;
    w.u(msg.observations.len() as u64, 5)?;
    w.u(msg.divergence_free_smoothing as u64, 1)?;
    w.u(msg.smoothing_interval_code as u64, 3)?;

    let extended = is_extended(msg.msg_num);
    let l2_present = has_l2(msg.msg_num);

    for obs in &msg.observations {
        w.u(obs.satellite as u64, 6)?;
        w.u(0, 1)?; // code indicator, C/A by default
        w.u((obs.l1_pseudorange_m / 0.02).round() as u64 & 0xFF_FFFF, 24)?;
        let phase_raw = obs
            .l1_carrier_phase_cycles
            .map(|cyc| ((cyc * L1_WAVELENGTH_CYCLES_PER_M - obs.l1_pseudorange_m) / 0.0005).round() as i64)
            .unwrap_or(-(1 << 19));
        w.s(phase_raw, 20)?;
        w.u(crate::time::legacy_lock_time_indicator(obs.l1_lock_time_s) as u64, 7)?;
        if extended {
            w.u(obs.l1_pseudorange_ambiguity as u64, 8)?;
            let raw = obs.l1_cnr_db_hz.map(|v| (v / 0.25).round() as u64).unwrap_or(0);
            w.u(raw, 8)?;
        }
        if l2_present {
            let l2 = obs.l2.unwrap_or(LegacyL2Observation {
                code_indicator: 0,
                pseudorange_diff_m: 0.0,
                carrier_phase_cycles: None,
                lock_time_s: 0.0,
                cnr_db_hz: None,
            });
            w.u(l2.code_indicator as u64, 2)?;
            w.s((l2.pseudorange_diff_m / 0.02).round() as i64, 14)?;
            let l2_phase_raw = l2
                .carrier_phase_cycles
                .map(|cyc| (cyc / 0.0005).round() as i64)
                .unwrap_or(-(1 << 19));
            w.s(l2_phase_raw, 20)?;
            w.u(crate::time::legacy_lock_time_indicator(l2.lock_time_s) as u64, 7)?;
            if extended {
                let raw = l2.cnr_db_hz.map(|v| (v / 0.25).round() as u64).unwrap_or(0);
                w.u(raw, 8)?;
            }
        }
    }

    Ok(w.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(msg_num: u16) -> LegacyObservationMessage {
        LegacyObservationMessage {
            msg_num,
            station_id: 5,
            gps_tow_ms: 123_456,
            synchronous_gnss_flag: false,
            divergence_free_smoothing: false,
            smoothing_interval_code: 0,
            observations: vec![LegacyObservation {
                satellite: 12,
                l1_pseudorange_m: 22_000_000.0,
                l1_carrier_phase_cycles: Some(22_000_100.0),
                l1_lock_time_s: 100.0,
                l1_cnr_db_hz: if is_extended(msg_num) { Some(42.0) } else { None },
                l1_pseudorange_ambiguity: 0,
                l2: if has_l2(msg_num) {
                    Some(LegacyL2Observation {
                        code_indicator: 0,
                        pseudorange_diff_m: 1.0,
                        carrier_phase_cycles: Some(17_123_456.0),
                        lock_time_s: 72.0,
                        cnr_db_hz: if is_extended(msg_num) { Some(40.0) } else { None },
                    })
                } else {
                    None
                },
            }],
        }
    }

    #[test]
    fn msg_1001_round_trips() {
        let msg = sample(1001);
        let bytes = encode(&msg).unwrap();
        let decoded = decode(1001, &bytes).unwrap();
        assert_eq!(decoded.observations.len(), 1);
        assert_eq!(decoded.observations[0].satellite, 12);
        assert!(decoded.observations[0].l2.is_none());
    }

    #[test]
    fn msg_1004_round_trips_with_l2_and_cnr() {
        let msg = sample(1004);
        let bytes = encode(&msg).unwrap();
        let decoded = decode(1004, &bytes).unwrap();
        let obs = &decoded.observations[0];
        assert!(obs.l2.is_some());
        assert!(obs.l1_cnr_db_hz.is_some());
        assert!((obs.l1_pseudorange_m - 22_000_000.0).abs() < 0.02);
    }

    #[test]
    fn wrong_msg_num_rejected() {
        let msg = sample(1001);
        let bytes = encode(&msg).unwrap();
        let err = decode(1002, &bytes).unwrap_err();
        assert_eq!(err, Error::MessageTypeMismatch { expected: 1002, got: 1001 });
    }
}
