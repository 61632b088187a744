//! RTCM3 <-> SBP stateful translation (spec §4.J).
//!
//! [`RtcmToSbp`] and [`SbpToRtcm`] each own exactly the buffers their
//! direction needs: the RTCM->SBP side needs none beyond a little bookkeeping
//! (legacy/MSM lock-out, GLONASS FCN map, one-shot unsupported-code
//! warnings) because every RTCM observation message already carries a
//! complete epoch. The SBP->RTCM side reuses [`crate::unpacker`] to gather
//! fragments into a complete epoch before it can emit anything.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use num_traits::ToPrimitive;

use rtcm3::messages::common::{Constellation, ObsCode};
use rtcm3::messages::ephemeris::KeplerianEphemeris;
use rtcm3::messages::glonass_ephemeris::GlonassEphemeris as RtcmGlonassEphemeris;
use rtcm3::messages::msm::{MsmMessage, MsmSatelliteData, MsmSignalData, MsmVariant};
use rtcm3::messages::observations::{LegacyObservation, LegacyObservationMessage};
use rtcm3::messages::proprietary::{NavigationDataFrame, SwiftProprietary, TeseoV};
use rtcm3::messages::station::AntennaReferencePoint;
use rtcm3::messages::system::UnicodeTextMessage;
use rtcm3::messages::Message as RtcmMessage;
use rtcm3::time::week_rollover_adjustment;

use sbp::messages::base_station::BasePositionEcef;
use sbp::messages::ephemeris::{CommonHeader, GlonassEphemeris as SbpGlonassEphemeris, GpsEphemeris};
use sbp::messages::logging::LogLevel;
use sbp::messages::observation::{ObsFlags, ObservationFragment, ObservationSet, PackedObservation, SignalIdentifier};

use timetruth::{Constellation as TimeTruthConstellation, EstimatorHandle, EstimatorKind, TimeTruth, TimeTruthSource};

use crate::codes::{canonicalize, carrier_wavelength_m, to_sbp_code};
use crate::constants::MSM_LEGACY_LOCKOUT_MS;
use crate::unpacker::ObservationUnpacker;

use super::SbpSink;

/// TimeTruth's ephemeris estimator only models the four constellations
/// that broadcast their own Keplerian ephemeris; SBAS observations ride
/// the NDF/4075 path instead, so this never actually sees `Sbas` in
/// practice and falls back to `Qzss` if it ever did.
fn timetruth_constellation(c: Constellation) -> TimeTruthConstellation {
    match c {
        Constellation::Gps => TimeTruthConstellation::Gps,
        Constellation::Glonass => TimeTruthConstellation::Glonass,
        Constellation::Galileo => TimeTruthConstellation::Galileo,
        Constellation::BeiDou => TimeTruthConstellation::BeiDou,
        Constellation::Qzss | Constellation::Sbas => TimeTruthConstellation::Qzss,
    }
}

/// RTCM3 -> SBP direction (spec §4.J "RTCM -> SBP").
pub struct RtcmToSbp {
    time_truth: Arc<TimeTruth>,
    obs_estimator: EstimatorHandle,
    eph_estimator: EstimatorHandle,
    rtcm1013_estimator: EstimatorHandle,
    /// Station ID -> tow_ms of the last MSM message seen from it, for the
    /// legacy/MSM 5-second lock-out.
    station_msm_seen_ms: HashMap<u16, u32>,
    /// One-shot `UnsupportedCode` warning dedup (spec §7).
    unsupported_codes_logged: HashSet<u8>,
    /// GLONASS FCN, keyed by satellite slot, set by the caller for
    /// satellites whose FCN MSM5/7 doesn't carry (spec §4.J "else from the
    /// caller-supplied FCN map").
    glonass_fcn_map: HashMap<u8, i8>,
}

impl RtcmToSbp {
    pub fn new(time_truth: Arc<TimeTruth>, source: TimeTruthSource) -> Result<Self, crate::error::Error> {
        let obs_estimator = time_truth.request_estimator(source, EstimatorKind::Observation)?;
        let eph_estimator = time_truth.request_estimator(source, EstimatorKind::Ephemeris)?;
        let rtcm1013_estimator = time_truth.request_estimator(source, EstimatorKind::Rtcm1013)?;
        Ok(RtcmToSbp {
            time_truth,
            obs_estimator,
            eph_estimator,
            rtcm1013_estimator,
            station_msm_seen_ms: HashMap::new(),
            unsupported_codes_logged: HashSet::new(),
            glonass_fcn_map: HashMap::new(),
        })
    }

    pub fn set_glonass_fcn(&mut self, satellite: u8, fcn: i8) {
        self.glonass_fcn_map.insert(satellite, fcn);
    }

    pub fn translate(&mut self, message: &RtcmMessage, sink: &mut impl SbpSink) {
        match message {
            RtcmMessage::AntennaReferencePoint(arp) => self.translate_arp(arp, sink),
            RtcmMessage::SystemParameters(params) => {
                self.rtcm1013_estimator.push_rtcm_1013(
                    params.modified_julian_day as i32,
                    params.seconds_of_day as i64 * 1000,
                    params.leap_second_count,
                );
            }
            RtcmMessage::UnicodeText(text) => self.translate_unicode_text(text, sink),
            RtcmMessage::LegacyObservation(obs) => self.translate_legacy_observation(obs, sink),
            RtcmMessage::Msm(msm) => self.translate_msm(msm, sink),
            RtcmMessage::Ephemeris(eph) => self.translate_keplerian_ephemeris(eph, sink),
            RtcmMessage::GlonassEphemeris(eph) => self.translate_glonass_ephemeris(eph, sink),
            RtcmMessage::SwiftProprietary(wrapped) => self.translate_swift(wrapped, sink),
            RtcmMessage::NavigationDataFrame(ndf) => self.translate_ndf(ndf, sink),
            RtcmMessage::TeseoV(teseov) => self.translate_teseov(teseov, sink),
            RtcmMessage::AntennaDescriptor(_)
            | RtcmMessage::GlonassBiases(_)
            | RtcmMessage::Ssr(_)
            | RtcmMessage::Unknown { .. } => {
                log::debug!("rtcm->sbp: no SBP counterpart for {message:?}, dropping");
            }
        }
    }

    fn translate_arp(&mut self, arp: &AntennaReferencePoint, sink: &mut impl SbpSink) {
        let height = arp.antenna_height_m.unwrap_or(0.0);
        // Antenna height is an along-boresight offset; folding it in as a
        // flat addition to Z is the same coarse approximation the rest of
        // this translator uses for anything the distilled spec leaves
        // unspecified at the geodesy level (see DESIGN.md).
        sink.emit_base_pos(BasePositionEcef {
            x_m: arp.ecef_x_m,
            y_m: arp.ecef_y_m,
            z_m: arp.ecef_z_m + height,
        });
    }

    fn translate_unicode_text(&mut self, text: &UnicodeTextMessage, sink: &mut impl SbpSink) {
        sink.emit_log(LogLevel::Info, text.text.clone());
    }

    fn translate_legacy_observation(&mut self, msg: &LegacyObservationMessage, sink: &mut impl SbpSink) {
        let glonass = matches!(msg.msg_num, 1009..=1012);
        if let Some(&last_msm_ms) = self.station_msm_seen_ms.get(&msg.station_id) {
            if msg.gps_tow_ms.wrapping_sub(last_msm_ms) < MSM_LEGACY_LOCKOUT_MS {
                log::debug!(
                    "rtcm->sbp: suppressing legacy obs from station {} inside MSM lock-out",
                    msg.station_id
                );
                return;
            }
        }

        let l1_code = if glonass { ObsCode::GloL1Of } else { ObsCode::GpsL1Ca };
        let l2_code = if glonass { ObsCode::GloL2Of } else { ObsCode::GpsL2P };

        let mut observations = Vec::with_capacity(msg.observations.len() * 2);
        for obs in &msg.observations {
            observations.push(legacy_signal_to_packed(obs, l1_code, obs.l1_pseudorange_m, obs.l1_carrier_phase_cycles, obs.l1_lock_time_s, obs.l1_cnr_db_hz));
            if let Some(l2) = obs.l2 {
                let pseudorange_m = obs.l1_pseudorange_m + l2.pseudorange_diff_m;
                observations.push(legacy_signal_to_packed(obs, l2_code, pseudorange_m, l2.carrier_phase_cycles, l2.lock_time_s, l2.cnr_db_hz));
            }
        }

        self.obs_estimator.push_observation_tow_ms(msg.gps_tow_ms as i64);
        let estimate = self.time_truth.query(msg.gps_tow_ms as i64);
        let week_number = estimate.week.unwrap_or(0) as i16;

        sink.emit_obs(ObservationSet { tow_ms: msg.gps_tow_ms, ns_residual: 0, week_number, observations });
    }

    fn translate_msm(&mut self, msm: &MsmMessage, sink: &mut impl SbpSink) {
        if matches!(msm.variant, MsmVariant::Msm4 | MsmVariant::Msm5 | MsmVariant::Msm6 | MsmVariant::Msm7) {
            self.station_msm_seen_ms.insert(msm.station_id, msm.epoch_time_ms);
        }

        let mut observations = Vec::with_capacity(msm.signals.len());
        for signal in &msm.signals {
            let code = if msm.constellation == Constellation::Glonass {
                match self.resolve_glonass_fcn(msm, signal.satellite) {
                    Some(_) => signal.code,
                    None => {
                        log::warn!(
                            "rtcm->sbp: dropping GLONASS signal sat={} with no resolvable FCN",
                            signal.satellite
                        );
                        continue;
                    }
                }
            } else {
                signal.code
            };

            let wire_code = to_sbp_code(canonicalize(code));
            if wire_code == 0xFF {
                self.warn_unsupported_code_once(code);
                continue;
            }

            let mut flags = ObsFlags::empty();
            if signal.fine_pseudorange_m.is_some() {
                flags |= ObsFlags::PSEUDORANGE_VALID;
            }
            if signal.fine_carrier_phase_cycles.is_some() {
                flags |= ObsFlags::CARRIER_PHASE_VALID;
            }
            if signal.half_cycle_ambiguity {
                flags |= ObsFlags::HALF_CYCLE_AMBIGUITY;
            }
            if signal.fine_range_rate_m_s.is_some() {
                flags |= ObsFlags::DOPPLER_VALID;
            }

            let doppler_hz = signal
                .fine_range_rate_m_s
                .map(|rate_m_s| -rate_m_s / carrier_wavelength_m(code))
                .unwrap_or(0.0);

            observations.push(PackedObservation {
                sid: SignalIdentifier { satellite: signal.satellite, code: wire_code },
                pseudorange_m: signal.fine_pseudorange_m.unwrap_or(0.0),
                carrier_phase_cycles: signal.fine_carrier_phase_cycles.unwrap_or(0.0),
                doppler_hz,
                cn0_db_hz: signal.cn0_db_hz.unwrap_or(0.0),
                lock_time_s: signal.lock_time_s,
                flags,
            });
        }

        self.obs_estimator.push_observation_tow_ms(msm.epoch_time_ms as i64);
        let estimate = self.time_truth.query(msm.epoch_time_ms as i64);
        let week_number = estimate.week.unwrap_or(0) as i16;

        sink.emit_obs(ObservationSet { tow_ms: msm.epoch_time_ms, ns_residual: 0, week_number, observations });
    }

    fn resolve_glonass_fcn(&self, msm: &MsmMessage, satellite: u8) -> Option<i8> {
        msm.satellites
            .iter()
            .find(|s| s.satellite == satellite)
            .and_then(|s| s.glonass_fcn)
            .or_else(|| self.glonass_fcn_map.get(&satellite).copied())
    }

    fn warn_unsupported_code_once(&mut self, code: ObsCode) {
        let byte = to_sbp_code(code);
        if self.unsupported_codes_logged.insert(byte) {
            log::warn!("rtcm->sbp: UnsupportedCode for {code:?}, dropping matching signals");
        }
    }

    /// GPS/BeiDou/QZSS/Galileo Kepler ephemerides all map onto the same SBP
    /// wire struct ([`GpsEphemeris`]): it carries no constellation tag of
    /// its own beyond `sid_code`, so the signal code chosen for that
    /// constellation's L1/E1/B1 carrier stands in for it (spec §4.J "1019/
    /// 1020/1042/1044/1045/1046 -> SBP ephemeris messages"; sbp's current
    /// ephemeris message set has no separate Galileo/BeiDou/QZSS struct,
    /// see DESIGN.md).
    fn translate_keplerian_ephemeris(&mut self, eph: &KeplerianEphemeris, sink: &mut impl SbpSink) {
        let absolute_toe_ms =
            eph.week_number as i64 * crate::constants::WEEK_MS + (eph.toe_s * 1000.0).round() as i64;
        self.eph_estimator.push_ephemeris_toe(timetruth_constellation(eph.constellation), eph.satellite, absolute_toe_ms);

        let resolved_week = match eph.constellation {
            Constellation::Galileo => Some(eph.week_number as i32),
            _ => {
                let estimate = self.time_truth.query(absolute_toe_ms);
                if estimate.is_usable() {
                    estimate.week.map(|reference| {
                        week_rollover_adjustment(eph.week_number, reference, 10, 0)
                    })
                } else {
                    None
                }
            }
        };
        let Some(week_number) = resolved_week else {
            log::debug!("rtcm->sbp: suppressing {:?} ephemeris, time not yet resolved", eph.constellation);
            return;
        };

        let sid_code = to_sbp_code(canonicalize(primary_code(eph.constellation)));
        let common = CommonHeader {
            sid_satellite: eph.satellite,
            sid_code,
            toe_tow_s: eph.toe_s,
            toe_wn: week_number as u16,
            ura_m: accuracy_code_to_ura_m(eph.accuracy_code),
            fit_interval_s: if eph.fit_interval_flag { 14_400 } else { 7_200 },
            valid: eph.health == 0,
            health_bits: eph.health,
        };

        sink.emit_ephemeris_gps(GpsEphemeris {
            common,
            tgd_s: eph.tgd_s,
            crs_m: eph.crs_m,
            crc_m: eph.crc_m,
            cuc_rad: eph.cuc_rad,
            cus_rad: eph.cus_rad,
            cic_rad: eph.cic_rad,
            cis_rad: eph.cis_rad,
            dn_rad_s: eph.delta_n_semicircles_s,
            m0_rad: eph.m0_semicircles,
            ecc: eph.eccentricity,
            sqrta: eph.sqrt_a,
            omega0_rad: eph.omega0_semicircles,
            omegadot_rad_s: eph.omega_dot_semicircles_s,
            w_rad: eph.omega_semicircles,
            inc_rad: eph.i0_semicircles,
            inc_dot_rad_s: eph.idot_semicircles_s,
            af0_s: eph.af0,
            af1_s_s: eph.af1,
            af2_s_s2: eph.af2,
            toc_tow_s: eph.toc_s,
            iode: eph.iode as u8,
            iodc: eph.iodc,
        });
    }

    /// GLONASS ephemerides carry only Moscow time-of-day (`t_b`, a quarter
    /// hour index) and a 4-year day counter, not an absolute GPS
    /// time-of-week; this implementation resolves that to GPS time using
    /// `day_number mod 7` as the day-of-week within the TimeTruth-supplied
    /// reference week, which is this implementation's own approximation
    /// (see DESIGN.md) rather than a full Moscow-calendar resolution.
    fn translate_glonass_ephemeris(&mut self, eph: &RtcmGlonassEphemeris, sink: &mut impl SbpSink) {
        let estimate = self.time_truth.query(0);
        let (Some(reference_week), Some(leap_seconds)) = (estimate.week, estimate.leap_seconds) else {
            log::debug!("rtcm->sbp: suppressing GLONASS ephemeris sat={}, time not yet resolved", eph.satellite);
            return;
        };

        let moscow_seconds_of_day = eph.t_b_quarter_hours as f64 * 15.0 * 60.0;
        let gps_seconds_of_day = moscow_seconds_of_day - 3.0 * 3600.0 + leap_seconds as f64;
        let day_of_week = (eph.day_number % 7) as f64;
        let toe_tow_s = day_of_week * 86_400.0 + gps_seconds_of_day;

        self.eph_estimator.push_ephemeris_toe(
            TimeTruthConstellation::Glonass,
            eph.satellite,
            reference_week as i64 * crate::constants::WEEK_MS + (toe_tow_s * 1000.0).round() as i64,
        );

        let common = CommonHeader {
            sid_satellite: eph.satellite,
            sid_code: to_sbp_code(ObsCode::GloL1Of),
            toe_tow_s,
            toe_wn: reference_week as u16,
            ura_m: 10.0,
            fit_interval_s: 1_500,
            valid: eph.sv_health,
            health_bits: eph.sv_health as u8,
        };

        sink.emit_ephemeris_glonass(SbpGlonassEphemeris {
            common,
            gamma: eph.gamma_n,
            tau_s: eph.tau_n_s,
            d_tau_s: eph.delta_tau_n_s,
            pos_m: [eph.x_km * 1000.0, eph.y_km * 1000.0, eph.z_km * 1000.0],
            vel_m_s: [eph.x_vel_km_s * 1000.0, eph.y_vel_km_s * 1000.0, eph.z_vel_km_s * 1000.0],
            acc_m_s2: [eph.x_accel_km_s2 * 1000.0, eph.y_accel_km_s2 * 1000.0, eph.z_accel_km_s2 * 1000.0],
            fcn: eph.frequency_channel,
            iod: eph.e_n,
        });
    }

    fn translate_swift(&mut self, wrapped: &SwiftProprietary, sink: &mut impl SbpSink) {
        // sub_type 0 is "wrapped SBP" (spec §6); the body is already a
        // complete SBP frame payload the caller only needs to forward.
        if wrapped.sub_type == 0 {
            sink.emit_raw(0, 0, wrapped.body.clone());
        } else {
            log::debug!("rtcm->sbp: ignoring 4062 sub_type {}", wrapped.sub_type);
        }
    }

    fn translate_ndf(&mut self, ndf: &NavigationDataFrame, sink: &mut impl SbpSink) {
        if !crate::sbas::is_sbas_satellite(ndf.satellite) {
            log::debug!(
                "rtcm->sbp: NDF subframe for non-SBAS sat={} signal={} ({} bytes) dropped",
                ndf.satellite,
                ndf.signal_id,
                ndf.subframe.len()
            );
            return;
        }
        match crate::sbas::decode_l1ca_subframe(&ndf.subframe) {
            Ok(subframe) => {
                if !subframe.crc_ok {
                    log::debug!(
                        "rtcm->sbp: NDF subframe for SBAS sat={} failed its L1 C/A parity check",
                        ndf.satellite
                    );
                }
                sink.emit_sbas_raw(sbp::messages::sbas::SbasRawData {
                    sid_satellite: ndf.satellite,
                    sid_code: to_sbp_code(ObsCode::SbasL1Ca),
                    message_type: subframe.message_type,
                    data: subframe.data,
                });
            }
            Err(e) => log::debug!(
                "rtcm->sbp: NDF subframe for SBAS sat={} could not be decoded: {e}",
                ndf.satellite
            ),
        }
    }

    fn translate_teseov(&mut self, teseov: &TeseoV, sink: &mut impl SbpSink) {
        if crate::teseov::is_stgsv(teseov.sub_type_id) {
            match crate::teseov::decode_stgsv(&teseov.body) {
                Ok(stgsv) => self.translate_stgsv(&stgsv, sink),
                Err(e) => log::debug!("rtcm->sbp: failed to decode TeseoV STGSV: {e}"),
            }
            return;
        }
        // RESTART and AUX (and anything else) pass through unchanged,
        // matching spec §4.J's "passed through" rule for the non-STGSV
        // sub-types.
        let mut payload = Vec::with_capacity(1 + teseov.body.len());
        payload.push(teseov.sub_type_id);
        payload.extend_from_slice(&teseov.body);
        sink.emit_raw(rtcm3::messages::proprietary::MSG_NUM_TESEOV, 0, payload);
    }

    fn translate_stgsv(&mut self, stgsv: &crate::teseov::Stgsv, sink: &mut impl SbpSink) {
        let code = to_sbp_code(teseov_constellation_code(stgsv.constellation));
        let mut az_el_entries = Vec::new();
        let mut measurement_entries = Vec::new();
        for sat in &stgsv.satellites {
            let satellite = sat.sat_id + 1;
            if let (Some(az_deg), Some(el_deg)) = (sat.az_deg, sat.el_deg) {
                az_el_entries.push(sbp::messages::sv_status::SvAzElEntry {
                    sid_satellite: satellite,
                    sid_code: code,
                    az_deg,
                    el_deg,
                });
            }
            for cn0 in [sat.cn0_b1_db_hz, sat.cn0_b2_db_hz, sat.cn0_b3_db_hz]
                .into_iter()
                .flatten()
            {
                measurement_entries.push(sbp::messages::sv_status::MeasurementStateEntry {
                    mesid_satellite: satellite,
                    mesid_code: code,
                    cn0_db_hz: cn0,
                });
            }
        }
        if !az_el_entries.is_empty() {
            sink.emit_sv_az_el(sbp::messages::sv_status::SvAzEl { entries: az_el_entries });
        }
        if !measurement_entries.is_empty() {
            sink.emit_measurement_state(sbp::messages::sv_status::MeasurementState { entries: measurement_entries });
        }
    }
}

/// Maps TeseoV's 4-bit constellation id (`RTCM_TESEOV_GPS`..`RTCM_TESEOV_BDS13`
/// upstream) to the code STGSV's az/el and measurement-state entries are
/// tagged with. TeseoV doesn't distinguish signals within a constellation,
/// so this picks each constellation's primary civil code.
fn teseov_constellation_code(constellation: u8) -> ObsCode {
    match constellation {
        0 => ObsCode::GpsL1Ca,
        1 => ObsCode::GloL1Of,
        2 => ObsCode::QzssL1Ca,
        3 => ObsCode::GalE1B,
        4 => ObsCode::SbasL1Ca,
        5 | 6 => ObsCode::BdsB1I,
        _ => ObsCode::GpsL1Ca,
    }
}

fn legacy_signal_to_packed(
    obs: &LegacyObservation,
    code: ObsCode,
    pseudorange_m: f64,
    carrier_phase_cycles: Option<f64>,
    lock_time_s: f64,
    cnr_db_hz: Option<f64>,
) -> PackedObservation {
    let mut flags = ObsFlags::PSEUDORANGE_VALID;
    if carrier_phase_cycles.is_some() {
        flags |= ObsFlags::CARRIER_PHASE_VALID;
    }
    PackedObservation {
        sid: SignalIdentifier { satellite: obs.satellite, code: to_sbp_code(canonicalize(code)) },
        pseudorange_m,
        carrier_phase_cycles: carrier_phase_cycles.unwrap_or(0.0),
        doppler_hz: 0.0,
        cn0_db_hz: cnr_db_hz.unwrap_or(0.0),
        lock_time_s,
        flags,
    }
}

fn primary_code(constellation: Constellation) -> ObsCode {
    match constellation {
        Constellation::Gps => ObsCode::GpsL1Ca,
        Constellation::Glonass => ObsCode::GloL1Of,
        Constellation::Galileo => ObsCode::GalE1B,
        Constellation::BeiDou => ObsCode::BdsB1I,
        Constellation::Qzss => ObsCode::QzssL1Ca,
        Constellation::Sbas => ObsCode::SbasL1Ca,
    }
}

/// RTCM's URA/SISA is a discrete accuracy class, not a direct metre value;
/// this table is this implementation's own coarse approximation of the
/// published GPS URA class boundaries (see DESIGN.md).
fn accuracy_code_to_ura_m(accuracy_code: u8) -> f64 {
    match accuracy_code {
        0 => 2.4,
        1 => 3.4,
        2 => 4.85,
        3 => 6.85,
        4 => 9.65,
        5 => 13.65,
        6 => 24.0,
        7 => 48.0,
        8..=14 => (2f64).powi(accuracy_code as i32 - 2),
        _ => 6_144.0,
    }
}

/// Which wire message the SBP->RTCM direction should prefer for a resolved
/// observation epoch (spec §4.J "selected by a mode flag").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObservationOutputMode {
    Msm,
    Legacy,
}

/// SBP -> RTCM direction (spec §4.J "SBP -> RTCM").
pub struct SbpToRtcm {
    unpacker: ObservationUnpacker,
    station_id: u16,
    output_mode: ObservationOutputMode,
    leap_seconds: Option<u8>,
    time_truth: Option<Arc<TimeTruth>>,
    /// GLONASS FCN, keyed by satellite slot, consulted when encoding MSM5/7
    /// satellite-info fields (mirrors [`RtcmToSbp::set_glonass_fcn`] for the
    /// reverse direction).
    glonass_fcn_map: HashMap<u8, i8>,
}

impl SbpToRtcm {
    pub fn new(station_id: u16, output_mode: ObservationOutputMode) -> Self {
        SbpToRtcm {
            unpacker: ObservationUnpacker::new(),
            station_id,
            output_mode,
            leap_seconds: None,
            time_truth: None,
            glonass_fcn_map: HashMap::new(),
        }
    }

    pub fn set_glonass_fcn(&mut self, satellite: u8, fcn: i8) {
        self.glonass_fcn_map.insert(satellite, fcn);
    }

    pub fn set_leap_seconds(&mut self, leap_seconds: u8) {
        self.leap_seconds = Some(leap_seconds);
    }

    pub fn set_time_truth(&mut self, time_truth: Arc<TimeTruth>) {
        self.time_truth = Some(time_truth);
    }

    fn resolve_leap_seconds(&self) -> Option<u8> {
        self.leap_seconds.or_else(|| {
            self.time_truth.as_ref().and_then(|tt| {
                let estimate = tt.query(0);
                estimate.leap_seconds
            })
        })
    }

    /// Feeds one SBP observation fragment. Emits an RTCM frame only once a
    /// complete epoch has been assembled (spec §4.I).
    pub fn push_observation(&mut self, frag: &ObservationFragment, emit: &mut impl FnMut(RtcmMessage)) {
        let mode = self.output_mode;
        let station_id = self.station_id;
        let mut pending = None;
        self.unpacker.push(frag, &mut |epoch| pending = Some(epoch));
        if let Some(epoch) = pending {
            for message in epoch_to_rtcm(&epoch, station_id, mode, &self.glonass_fcn_map) {
                emit(message);
            }
        }
    }

    pub fn base_position(&self, pos: &BasePositionEcef) -> RtcmMessage {
        RtcmMessage::AntennaReferencePoint(AntennaReferencePoint {
            station_id: self.station_id,
            itrf_epoch: 0,
            indicators: rtcm3::messages::station::GnssIndicators::GPS,
            ecef_x_m: pos.x_m,
            single_receiver_oscillator_indicator: true,
            ecef_y_m: pos.y_m,
            quarter_cycle_indicator: 0,
            ecef_z_m: pos.z_m,
            antenna_height_m: None,
        })
    }

    /// GLONASS ephemerides require current leap seconds to place their
    /// Moscow-time epoch on the GPS time line; with none available the
    /// output is suppressed rather than emitted with a guessed value (spec
    /// §4.J "Failure suppresses the output").
    pub fn glonass_ephemeris(&self, eph: &SbpGlonassEphemeris) -> Option<RtcmMessage> {
        let leap_seconds = self.resolve_leap_seconds()?;
        let gps_seconds_of_day = eph.common.toe_tow_s % 86_400.0;
        let moscow_seconds_of_day = gps_seconds_of_day + 3.0 * 3600.0 - leap_seconds as f64;
        let t_b_quarter_hours = (moscow_seconds_of_day / (15.0 * 60.0)).round() as u8;
        let day_number = (eph.common.toe_tow_s / 86_400.0).floor() as u16;

        Some(RtcmMessage::GlonassEphemeris(RtcmGlonassEphemeris {
            satellite: eph.common.sid_satellite,
            frequency_channel: eph.fcn,
            almanac_health: true,
            almanac_health_availability: true,
            day_number,
            t_b_quarter_hours,
            sv_health: eph.common.valid,
            p1: 0,
            p2: false,
            p3: false,
            p: 0,
            ln: !eph.common.valid,
            x_km: eph.pos_m[0] / 1000.0,
            x_vel_km_s: eph.vel_m_s[0] / 1000.0,
            x_accel_km_s2: eph.acc_m_s2[0] / 1000.0,
            y_km: eph.pos_m[1] / 1000.0,
            y_vel_km_s: eph.vel_m_s[1] / 1000.0,
            y_accel_km_s2: eph.acc_m_s2[1] / 1000.0,
            z_km: eph.pos_m[2] / 1000.0,
            z_vel_km_s: eph.vel_m_s[2] / 1000.0,
            z_accel_km_s2: eph.acc_m_s2[2] / 1000.0,
            gamma_n: eph.gamma,
            tau_n_s: eph.tau_s,
            delta_tau_n_s: eph.d_tau_s,
            e_n: eph.iod,
            m: 0,
            // Leap seconds are exactly what unlocks this trailing block: it's
            // the GLONASS/GPS time offset the caller supplied, not a guess.
            additional_data_available: true,
            calendar_day_number_na: day_number,
            tau_c_s: 0.0,
            four_year_interval_n4: 0,
            tau_gps_s: -(leap_seconds as f64),
            ln_fifth_string: !eph.common.valid,
        }))
    }

    /// Any SBP message this translator has no RTCM counterpart for is
    /// wrapped in 4062 unchanged (spec §4.J "wrapped in RTCM 4062
    /// unchanged").
    pub fn wrap_unknown(&self, payload: Vec<u8>) -> RtcmMessage {
        RtcmMessage::SwiftProprietary(SwiftProprietary { sub_type: 0, body: payload })
    }
}

const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

fn epoch_to_rtcm(
    epoch: &crate::epoch::Epoch,
    station_id: u16,
    mode: ObservationOutputMode,
    glonass_fcn_map: &HashMap<u8, i8>,
) -> Vec<RtcmMessage> {
    match mode {
        ObservationOutputMode::Legacy => vec![RtcmMessage::LegacyObservation(epoch_to_legacy(epoch, station_id))],
        ObservationOutputMode::Msm => epoch_to_msm(epoch, station_id, glonass_fcn_map)
            .into_iter()
            .map(RtcmMessage::Msm)
            .collect(),
    }
}

/// Reverse of [`RtcmToSbp::translate_msm`]: groups a resolved observation
/// epoch by constellation and emits one MSM5 message per constellation
/// present (spec §4.J "SBP -> RTCM... either MSM4/5 or legacy 1004/1012 is
/// emitted, selected by a mode flag"). MSM5 is chosen over MSM4 because it
/// is the smallest variant that still carries the Doppler-derived range
/// rate and GLONASS FCN this crate's canonical observation record keeps.
fn epoch_to_msm(epoch: &crate::epoch::Epoch, station_id: u16, glonass_fcn_map: &HashMap<u8, i8>) -> Vec<MsmMessage> {
    use crate::codes::constellation_of;
    use std::collections::BTreeSet;

    let mut constellations: Vec<Constellation> = epoch
        .observations
        .iter()
        .map(|obs| constellation_of(obs.code))
        .collect::<HashSet<Constellation>>()
        .into_iter()
        .collect();
    constellations.sort_by_key(constellation_sort_key);

    constellations
        .into_iter()
        .map(|constellation| {
            let in_group: Vec<&crate::epoch::CanonicalObservation> = epoch
                .observations
                .iter()
                .filter(|obs| constellation_of(obs.code) == constellation)
                .collect();

            let satellites: BTreeSet<u8> = in_group.iter().map(|obs| obs.satellite).collect();
            let satellites: Vec<_> = satellites
                .into_iter()
                .map(|satellite| {
                    let rough_range_ms = in_group
                        .iter()
                        .find(|obs| obs.satellite == satellite)
                        .map(|obs| obs.pseudorange_m / SPEED_OF_LIGHT_M_S * 1000.0);
                    let glonass_fcn = if constellation == Constellation::Glonass {
                        glonass_fcn_map.get(&satellite).copied()
                    } else {
                        None
                    };
                    MsmSatelliteData {
                        satellite,
                        rough_range_ms,
                        glonass_fcn,
                        rough_range_rate_m_s: None,
                    }
                })
                .collect();

            let signals = in_group
                .iter()
                .map(|obs| {
                    let doppler_valid = obs.flags.contains(ObsFlags::DOPPLER_VALID);
                    MsmSignalData {
                        satellite: obs.satellite,
                        code: obs.code,
                        fine_pseudorange_m: obs.flags.contains(ObsFlags::PSEUDORANGE_VALID).then_some(obs.pseudorange_m),
                        fine_carrier_phase_cycles: obs
                            .flags
                            .contains(ObsFlags::CARRIER_PHASE_VALID)
                            .then_some(obs.carrier_phase_cycles),
                        lock_time_s: obs.lock_time_s,
                        half_cycle_ambiguity: obs.flags.contains(ObsFlags::HALF_CYCLE_AMBIGUITY),
                        cn0_db_hz: Some(obs.cn0_db_hz),
                        fine_range_rate_m_s: doppler_valid
                            .then_some(-obs.doppler_hz * carrier_wavelength_m(obs.code)),
                    }
                })
                .collect();

            MsmMessage {
                constellation,
                variant: MsmVariant::Msm5,
                station_id,
                epoch_time_ms: epoch.tow_ms,
                multiple_message_bit: false,
                iods: 0,
                clock_steering_indicator: 0,
                external_clock_indicator: 0,
                divergence_free_smoothing: false,
                smoothing_interval_s: 0.0,
                satellites,
                signals,
            }
        })
        .collect()
}

/// GPS first, then the rest in the same order the legacy message table
/// lists them (spec §4.D category table), so output is deterministic for
/// a given epoch regardless of `HashSet`/`BTreeSet` iteration order.
fn constellation_sort_key(c: &Constellation) -> u8 {
    c.to_u8().expect("Constellation::to_u8 is total")
}

fn epoch_to_legacy(epoch: &crate::epoch::Epoch, station_id: u16) -> LegacyObservationMessage {
    use crate::epoch::CanonicalObservation;
    use rtcm3::messages::observations::LegacyL2Observation;
    use std::collections::BTreeMap;

    let mut by_sat: BTreeMap<u8, (Option<CanonicalObservation>, Option<CanonicalObservation>)> = BTreeMap::new();
    for obs in &epoch.observations {
        let entry = by_sat.entry(obs.satellite).or_default();
        if matches!(obs.code, ObsCode::GpsL1Ca | ObsCode::GpsL1P | ObsCode::GloL1Of) {
            entry.0 = Some(*obs);
        } else {
            entry.1 = Some(*obs);
        }
    }

    let observations = by_sat
        .into_iter()
        .filter_map(|(satellite, (l1, l2))| {
            let l1 = l1?;
            Some(LegacyObservation {
                satellite,
                l1_pseudorange_m: l1.pseudorange_m,
                l1_carrier_phase_cycles: Some(l1.carrier_phase_cycles),
                l1_lock_time_s: l1.lock_time_s,
                l1_cnr_db_hz: Some(l1.cn0_db_hz),
                l1_pseudorange_ambiguity: 0,
                l2: l2.map(|l2| LegacyL2Observation {
                    code_indicator: 0,
                    pseudorange_diff_m: l2.pseudorange_m - l1.pseudorange_m,
                    carrier_phase_cycles: Some(l2.carrier_phase_cycles),
                    lock_time_s: l2.lock_time_s,
                    cnr_db_hz: Some(l2.cn0_db_hz),
                }),
            })
        })
        .collect();

    LegacyObservationMessage {
        msg_num: 1004,
        station_id,
        gps_tow_ms: epoch.tow_ms,
        synchronous_gnss_flag: false,
        divergence_free_smoothing: false,
        smoothing_interval_code: 0,
        observations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::RecordingSink;
    use rtcm3::messages::station::GnssIndicators;

    fn translator() -> RtcmToSbp {
        let time_truth = Arc::new(TimeTruth::new());
        RtcmToSbp::new(time_truth, TimeTruthSource::Local).unwrap()
    }

    #[test]
    fn antenna_reference_point_becomes_base_position() {
        let mut t = translator();
        let mut sink = RecordingSink::default();
        let arp = AntennaReferencePoint {
            station_id: 1,
            itrf_epoch: 0,
            indicators: GnssIndicators::GPS,
            ecef_x_m: 100.0,
            single_receiver_oscillator_indicator: false,
            ecef_y_m: 200.0,
            quarter_cycle_indicator: 0,
            ecef_z_m: 300.0,
            antenna_height_m: Some(1.5),
        };
        t.translate(&RtcmMessage::AntennaReferencePoint(arp), &mut sink);
        assert_eq!(sink.base_pos.len(), 1);
        assert!((sink.base_pos[0].z_m - 301.5).abs() < 1e-9);
    }

    #[test]
    fn system_parameters_feed_the_rtcm1013_estimator_without_emitting() {
        let mut t = translator();
        let mut sink = RecordingSink::default();
        let params = rtcm3::messages::system::SystemParameters {
            station_id: 1,
            modified_julian_day: 59_000,
            seconds_of_day: 12_345,
            leap_second_count: 18,
            entries: vec![],
        };
        t.translate(&RtcmMessage::SystemParameters(params), &mut sink);
        assert!(sink.obs.is_empty());
        assert!(sink.logs.is_empty());
    }

    #[test]
    fn unicode_text_becomes_a_log_message() {
        let mut t = translator();
        let mut sink = RecordingSink::default();
        let msg = UnicodeTextMessage {
            station_id: 1,
            modified_julian_day: 59_000,
            seconds_of_day: 0,
            text: "base station maintenance at 04:00 UTC".to_string(),
        };
        t.translate(&RtcmMessage::UnicodeText(msg), &mut sink);
        assert_eq!(sink.logs.len(), 1);
        assert_eq!(sink.logs[0].0, LogLevel::Info);
    }

    #[test]
    fn legacy_observation_inside_msm_lockout_is_suppressed() {
        let mut t = translator();
        let mut sink = RecordingSink::default();
        t.station_msm_seen_ms.insert(5, 100_000);
        let legacy = LegacyObservationMessage {
            msg_num: 1004,
            station_id: 5,
            gps_tow_ms: 101_000,
            synchronous_gnss_flag: false,
            divergence_free_smoothing: false,
            smoothing_interval_code: 0,
            observations: vec![],
        };
        t.translate(&RtcmMessage::LegacyObservation(legacy), &mut sink);
        assert!(sink.obs.is_empty());
    }

    #[test]
    fn legacy_observation_outside_msm_lockout_emits() {
        let mut t = translator();
        let mut sink = RecordingSink::default();
        t.station_msm_seen_ms.insert(5, 0);
        let legacy = LegacyObservationMessage {
            msg_num: 1004,
            station_id: 5,
            gps_tow_ms: 10_000_000,
            synchronous_gnss_flag: false,
            divergence_free_smoothing: false,
            smoothing_interval_code: 0,
            observations: vec![LegacyObservation {
                satellite: 4,
                l1_pseudorange_m: 20_000_000.0,
                l1_carrier_phase_cycles: Some(1_000.0),
                l1_lock_time_s: 30.0,
                l1_cnr_db_hz: Some(40.0),
                l1_pseudorange_ambiguity: 0,
                l2: None,
            }],
        };
        t.translate(&RtcmMessage::LegacyObservation(legacy), &mut sink);
        assert_eq!(sink.obs.len(), 1);
        assert_eq!(sink.obs[0].observations.len(), 1);
    }

    #[test]
    fn swift_proprietary_sub_type_zero_unwraps_to_raw() {
        let mut t = translator();
        let mut sink = RecordingSink::default();
        let wrapped = SwiftProprietary { sub_type: 0, body: vec![1, 2, 3] };
        t.translate(&RtcmMessage::SwiftProprietary(wrapped), &mut sink);
        assert_eq!(sink.raw.len(), 1);
        assert_eq!(sink.raw[0].2, vec![1, 2, 3]);
    }

    #[test]
    fn galileo_ephemeris_emits_without_time_truth() {
        let mut t = translator();
        let mut sink = RecordingSink::default();
        let eph = KeplerianEphemeris {
            constellation: Constellation::Galileo,
            satellite: 3,
            week_number: 1234,
            accuracy_code: 0,
            code_on_l2: 0,
            idot_semicircles_s: 0.0,
            iode: 10,
            toc_s: 300_000.0,
            af2: 0.0,
            af1: 0.0,
            af0: 0.0,
            iodc: 10,
            crs_m: 0.0,
            delta_n_semicircles_s: 0.0,
            m0_semicircles: 0.0,
            cuc_rad: 0.0,
            eccentricity: 0.01,
            cus_rad: 0.0,
            sqrt_a: 5440.6,
            toe_s: 300_000.0,
            cic_rad: 0.0,
            omega0_semicircles: 0.0,
            cis_rad: 0.0,
            i0_semicircles: 0.0,
            crc_m: 0.0,
            omega_semicircles: 0.0,
            omega_dot_semicircles_s: 0.0,
            tgd_s: 0.0,
            health: 0,
            l2p_data_flag: false,
            fit_interval_flag: false,
        };
        t.translate(&RtcmMessage::Ephemeris(eph), &mut sink);
        assert_eq!(sink.eph_gps.len(), 1);
        assert_eq!(sink.eph_gps[0].common.toe_wn, 1234);
    }

    #[test]
    fn gps_ephemeris_is_suppressed_without_timetruth_resolution() {
        let mut t = translator();
        let mut sink = RecordingSink::default();
        let eph = KeplerianEphemeris {
            constellation: Constellation::Gps,
            satellite: 3,
            week_number: 200,
            accuracy_code: 0,
            code_on_l2: 0,
            idot_semicircles_s: 0.0,
            iode: 10,
            toc_s: 300_000.0,
            af2: 0.0,
            af1: 0.0,
            af0: 0.0,
            iodc: 10,
            crs_m: 0.0,
            delta_n_semicircles_s: 0.0,
            m0_semicircles: 0.0,
            cuc_rad: 0.0,
            eccentricity: 0.01,
            cus_rad: 0.0,
            sqrt_a: 5153.7,
            toe_s: 300_000.0,
            cic_rad: 0.0,
            omega0_semicircles: 0.0,
            cis_rad: 0.0,
            i0_semicircles: 0.0,
            crc_m: 0.0,
            omega_semicircles: 0.0,
            omega_dot_semicircles_s: 0.0,
            tgd_s: 0.0,
            health: 0,
            l2p_data_flag: false,
            fit_interval_flag: false,
        };
        t.translate(&RtcmMessage::Ephemeris(eph), &mut sink);
        assert!(sink.eph_gps.is_empty());
    }

    #[test]
    fn glonass_ephemeris_round_trip_needs_leap_seconds() {
        let sbp_to_rtcm = SbpToRtcm::new(7, ObservationOutputMode::Legacy);
        let eph = SbpGlonassEphemeris {
            common: CommonHeader {
                sid_satellite: 25,
                sid_code: 3,
                toe_tow_s: 220_518.0,
                toe_wn: 2022,
                ura_m: 10.0,
                fit_interval_s: 1_500,
                valid: false,
                health_bits: 1,
            },
            gamma: 0.0,
            tau_s: 0.0,
            d_tau_s: 0.0,
            pos_m: [1.0, 2.0, 3.0],
            vel_m_s: [0.0, 0.0, 0.0],
            acc_m_s2: [0.0, 0.0, 0.0],
            fcn: 15 - 8,
            iod: 4,
        };
        assert!(sbp_to_rtcm.glonass_ephemeris(&eph).is_none());

        let mut with_leap = SbpToRtcm::new(7, ObservationOutputMode::Legacy);
        with_leap.set_leap_seconds(18);
        assert!(with_leap.glonass_ephemeris(&eph).is_some());
    }

    #[test]
    fn ndf_from_non_sbas_satellite_is_dropped() {
        let mut t = translator();
        let mut sink = RecordingSink::default();
        let ndf = NavigationDataFrame { satellite: 5, signal_id: 0, subframe: vec![0u8; 32] };
        t.translate(&RtcmMessage::NavigationDataFrame(ndf), &mut sink);
        assert!(sink.sbas_raw.is_empty());
    }

    #[test]
    fn ndf_from_sbas_satellite_decodes_to_sbas_raw() {
        let mut t = translator();
        let mut sink = RecordingSink::default();
        let mut subframe = vec![0u8; 32];
        subframe[0] = 0x53; // valid preamble
        let ndf = NavigationDataFrame { satellite: 133, signal_id: 1, subframe };
        t.translate(&RtcmMessage::NavigationDataFrame(ndf), &mut sink);
        assert_eq!(sink.sbas_raw.len(), 1);
        assert_eq!(sink.sbas_raw[0].sid_satellite, 133);
        assert_eq!(sink.sbas_raw[0].data.len(), 27);
    }

    #[test]
    fn teseov_restart_passes_through_with_subtype_prefix() {
        let mut t = translator();
        let mut sink = RecordingSink::default();
        let teseov = TeseoV {
            sub_type_id: rtcm3::messages::proprietary::TESEOV_SUBTYPE_RESTART,
            body: vec![0xAA, 0xBB, 0xCC, 0xDD],
        };
        t.translate(&RtcmMessage::TeseoV(teseov), &mut sink);
        assert_eq!(sink.raw.len(), 1);
        assert_eq!(sink.raw[0].2, vec![0, 0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn teseov_stgsv_decodes_to_az_el_and_measurement_state() {
        let mut t = translator();
        let mut sink = RecordingSink::default();

        let mut w = bitstream::BitWriter::new();
        w.u(1_000, 30).unwrap(); // tow_ms
        w.u(0, 4).unwrap(); // GPS
        w.u(1u64 << 63, 64).unwrap(); // satellite index 0 active
        w.u(0b0000_0011, 8).unwrap(); // EL + AZ fields present
        w.u(0, 1).unwrap(); // mul_msg_ind
        w.s(45, 8).unwrap(); // elevation
        w.u(180, 9).unwrap(); // azimuth
        let body = w.into_bytes();

        let teseov = TeseoV { sub_type_id: rtcm3::messages::proprietary::TESEOV_SUBTYPE_STGSV, body };
        t.translate(&RtcmMessage::TeseoV(teseov), &mut sink);

        assert_eq!(sink.sv_az_el.len(), 1);
        assert_eq!(sink.sv_az_el[0].entries.len(), 1);
        assert_eq!(sink.sv_az_el[0].entries[0].sid_satellite, 1);
        assert_eq!(sink.sv_az_el[0].entries[0].el_deg, 45);
        assert_eq!(sink.sv_az_el[0].entries[0].az_deg, 180);
        assert!(sink.measurement_state.is_empty());
    }
}
