//! Stateful bidirectional translation between RTCM3/UBX and SBP (spec §4.J
//! "RTCM<->SBP translator", §4.K "UBX->SBP translator").
//!
//! Both translators emit through one capability trait rather than a C-style
//! function-pointer callback (spec §9 "Callbacks -> typed handles"): the
//! translator owns its assembly buffers, the caller owns the [`SbpSink`]
//! implementation and decides what happens to each emitted message
//! (enqueue for framing, hand to the adjuster pipeline, etc).

pub mod rtcm_sbp;
pub mod ubx_sbp;

use sbp::messages::base_station::BasePositionEcef;
use sbp::messages::ephemeris::{BeidouEphemeris, GalileoEphemeris, GlonassEphemeris, GpsEphemeris};
use sbp::messages::imu::{ImuAux, ImuRaw, Odometry, WheelTick};
use sbp::messages::logging::LogLevel;
use sbp::messages::observation::ObservationSet;
use sbp::messages::sbas::SbasRawData;
use sbp::messages::sv_status::{MeasurementState, SvAzEl};
use sbp::messages::system::GnssTimeOffset;

/// Every kind of SBP content a translator can produce. One method per kind
/// rather than a single `emit(enum)` so a caller only needs to implement
/// the subset it cares about meaningfully (the rest can no-op), matching
/// the "one method per emitted kind" option spec §9 names.
pub trait SbpSink {
    fn emit_obs(&mut self, obs: ObservationSet);
    fn emit_base_pos(&mut self, pos: BasePositionEcef);
    fn emit_ephemeris_gps(&mut self, eph: GpsEphemeris);
    fn emit_ephemeris_glonass(&mut self, eph: GlonassEphemeris);
    /// Galileo I/NAV ephemeris decoded from RTCM 1046 or UBX RXM-SFRBX word
    /// types 1-5 (spec §4.K "word types 1-5 (Galileo)").
    fn emit_ephemeris_galileo(&mut self, eph: GalileoEphemeris);
    /// BeiDou D1/D2 ephemeris decoded from RTCM 1042/1044 or UBX RXM-SFRBX
    /// subframes 1/2/3 (spec §4.K "1/2/3 (BDS)").
    fn emit_ephemeris_beidou(&mut self, eph: BeidouEphemeris);
    fn emit_log(&mut self, level: LogLevel, text: String);
    /// ESF-RAW accelerometer+gyroscope sample (spec §4.K: "emits SBP
    /// `imu_raw` per complete 6-axis triple").
    fn emit_imu_raw(&mut self, imu: ImuRaw);
    /// ESF-RAW metadata, once per 20 `imu_raw` samples.
    fn emit_imu_aux(&mut self, aux: ImuAux);
    /// ESF-MEAS `SPEED` datum.
    fn emit_odometry(&mut self, odo: Odometry);
    /// ESF-MEAS wheel-tick datum.
    fn emit_wheeltick(&mut self, tick: WheelTick);
    /// NAV-STATUS, once fix and timing are both good (spec §4.K
    /// "NAV-STATUS -> ... emits an SBP GNSS-time-offset message").
    fn emit_gnss_time_offset(&mut self, offset: GnssTimeOffset);
    /// A decoded SBAS L1 C/A subframe (spec §4.J "4075 NDF -> SBAS L1 C/A
    /// decoder -> SBP SBAS raw-data message").
    fn emit_sbas_raw(&mut self, sbas: SbasRawData);
    /// Per-satellite sky geometry decoded from a TeseoV/999 STGSV
    /// sub-message (spec §4.J "999 STGSV -> SBP SV az/el").
    fn emit_sv_az_el(&mut self, az_el: SvAzEl);
    /// Per-signal tracking quality decoded from a TeseoV/999 STGSV
    /// sub-message (spec §4.J "999 STGSV -> SBP measurement-state").
    fn emit_measurement_state(&mut self, state: MeasurementState);
    /// Bytes that are already a complete SBP frame (payload ready to wrap),
    /// for passthrough cases: 4062 unwrap, or SBP->RTCM wrapping an
    /// unrecognised SBP message in 4062 unchanged.
    fn emit_raw(&mut self, msg_type: u16, sender_id: u16, payload: Vec<u8>);
}

/// A no-op-by-default sink for tests: records everything it's given rather
/// than doing anything with it.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub obs: Vec<ObservationSet>,
    pub base_pos: Vec<BasePositionEcef>,
    pub eph_gps: Vec<GpsEphemeris>,
    pub eph_glo: Vec<GlonassEphemeris>,
    pub eph_gal: Vec<GalileoEphemeris>,
    pub eph_bds: Vec<BeidouEphemeris>,
    pub logs: Vec<(LogLevel, String)>,
    pub imu_raw: Vec<ImuRaw>,
    pub imu_aux: Vec<ImuAux>,
    pub odometry: Vec<Odometry>,
    pub wheelticks: Vec<WheelTick>,
    pub gnss_time_offsets: Vec<GnssTimeOffset>,
    pub sbas_raw: Vec<SbasRawData>,
    pub sv_az_el: Vec<SvAzEl>,
    pub measurement_state: Vec<MeasurementState>,
    pub raw: Vec<(u16, u16, Vec<u8>)>,
}

#[cfg(test)]
impl SbpSink for RecordingSink {
    fn emit_obs(&mut self, obs: ObservationSet) {
        self.obs.push(obs);
    }
    fn emit_base_pos(&mut self, pos: BasePositionEcef) {
        self.base_pos.push(pos);
    }
    fn emit_ephemeris_gps(&mut self, eph: GpsEphemeris) {
        self.eph_gps.push(eph);
    }
    fn emit_ephemeris_glonass(&mut self, eph: GlonassEphemeris) {
        self.eph_glo.push(eph);
    }
    fn emit_ephemeris_galileo(&mut self, eph: GalileoEphemeris) {
        self.eph_gal.push(eph);
    }
    fn emit_ephemeris_beidou(&mut self, eph: BeidouEphemeris) {
        self.eph_bds.push(eph);
    }
    fn emit_log(&mut self, level: LogLevel, text: String) {
        self.logs.push((level, text));
    }
    fn emit_imu_raw(&mut self, imu: ImuRaw) {
        self.imu_raw.push(imu);
    }
    fn emit_imu_aux(&mut self, aux: ImuAux) {
        self.imu_aux.push(aux);
    }
    fn emit_odometry(&mut self, odo: Odometry) {
        self.odometry.push(odo);
    }
    fn emit_wheeltick(&mut self, tick: WheelTick) {
        self.wheelticks.push(tick);
    }
    fn emit_gnss_time_offset(&mut self, offset: GnssTimeOffset) {
        self.gnss_time_offsets.push(offset);
    }
    fn emit_sbas_raw(&mut self, sbas: SbasRawData) {
        self.sbas_raw.push(sbas);
    }
    fn emit_sv_az_el(&mut self, az_el: SvAzEl) {
        self.sv_az_el.push(az_el);
    }
    fn emit_measurement_state(&mut self, state: MeasurementState) {
        self.measurement_state.push(state);
    }
    fn emit_raw(&mut self, msg_type: u16, sender_id: u16, payload: Vec<u8>) {
        self.raw.push((msg_type, sender_id, payload));
    }
}
