//! Per-message-type SBP codecs.

pub mod base_station;
pub mod ephemeris;
pub mod imu;
pub mod logging;
pub mod observation;
pub mod sbas;
pub mod sv_status;
pub mod system;

use crate::constants::*;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Message {
    Obs(observation::ObservationSet),
    BasePosEcef(base_station::BasePositionEcef),
    EphemerisGps(ephemeris::GpsEphemeris),
    EphemerisGlonass(ephemeris::GlonassEphemeris),
    EphemerisGalileo(ephemeris::GalileoEphemeris),
    EphemerisBeidou(ephemeris::BeidouEphemeris),
    Log(logging::LogMessage),
    Heartbeat(system::Heartbeat),
    GnssTimeOffset(system::GnssTimeOffset),
    ImuRaw(imu::ImuRaw),
    ImuAux(imu::ImuAux),
    Odometry(imu::Odometry),
    WheelTick(imu::WheelTick),
    SbasRaw(sbas::SbasRawData),
    SvAzEl(sv_status::SvAzEl),
    MeasurementState(sv_status::MeasurementState),
    Unknown { msg_type: u16, sender_id: u16, payload: Vec<u8> },
}

pub fn decode(msg_type: u16, sender_id: u16, payload: &[u8]) -> Result<Message, Error> {
    match msg_type {
        MSG_OBS => Ok(Message::Obs(observation::decode(payload)?)),
        MSG_BASE_POS_ECEF => Ok(Message::BasePosEcef(base_station::decode(payload)?)),
        MSG_EPHEMERIS_GPS => Ok(Message::EphemerisGps(ephemeris::decode_gps(payload)?)),
        MSG_EPHEMERIS_GLO => Ok(Message::EphemerisGlonass(ephemeris::decode_glonass(payload)?)),
        MSG_EPHEMERIS_GAL => Ok(Message::EphemerisGalileo(ephemeris::decode_galileo(payload)?)),
        MSG_EPHEMERIS_BDS => Ok(Message::EphemerisBeidou(ephemeris::decode_beidou(payload)?)),
        MSG_LOG => Ok(Message::Log(logging::decode(payload)?)),
        MSG_HEARTBEAT => Ok(Message::Heartbeat(system::decode_heartbeat(payload)?)),
        MSG_GNSS_TIME_OFFSET => Ok(Message::GnssTimeOffset(system::decode_gnss_time_offset(payload)?)),
        MSG_IMU_RAW => Ok(Message::ImuRaw(imu::decode_imu_raw(payload)?)),
        MSG_IMU_AUX => Ok(Message::ImuAux(imu::decode_imu_aux(payload)?)),
        MSG_ODOMETRY => Ok(Message::Odometry(imu::decode_odometry(payload)?)),
        MSG_WHEELTICK => Ok(Message::WheelTick(imu::decode_wheeltick(payload)?)),
        MSG_SBAS_RAW => Ok(Message::SbasRaw(sbas::decode(payload)?)),
        MSG_SV_AZ_EL => Ok(Message::SvAzEl(sv_status::decode_sv_az_el(payload)?)),
        MSG_MEASUREMENT_STATE => Ok(Message::MeasurementState(sv_status::decode_measurement_state(payload)?)),
        _ => {
            log::debug!("SBP message {msg_type:#06x} has no decoder, passing through as Unknown");
            Ok(Message::Unknown { msg_type, sender_id, payload: payload.to_vec() })
        }
    }
}

/// Encodes a decoded [`Message`] back into its payload bytes and the
/// message type it must be framed with. `sender_id` for `Unknown` is
/// carried by the variant itself; the others take the caller's choice
/// (spec §6 "the core preserves caller-chosen sender IDs").
pub fn encode(message: &Message) -> Result<(u16, Vec<u8>), Error> {
    match message {
        Message::Obs(m) => Ok((MSG_OBS, observation::encode(m)?)),
        Message::BasePosEcef(m) => Ok((MSG_BASE_POS_ECEF, base_station::encode(m)?)),
        Message::EphemerisGps(m) => Ok((MSG_EPHEMERIS_GPS, ephemeris::encode_gps(m)?)),
        Message::EphemerisGlonass(m) => Ok((MSG_EPHEMERIS_GLO, ephemeris::encode_glonass(m)?)),
        Message::EphemerisGalileo(m) => Ok((MSG_EPHEMERIS_GAL, ephemeris::encode_galileo(m)?)),
        Message::EphemerisBeidou(m) => Ok((MSG_EPHEMERIS_BDS, ephemeris::encode_beidou(m)?)),
        Message::Log(m) => Ok((MSG_LOG, logging::encode(m)?)),
        Message::Heartbeat(m) => Ok((MSG_HEARTBEAT, system::encode_heartbeat(m)?)),
        Message::GnssTimeOffset(m) => Ok((MSG_GNSS_TIME_OFFSET, system::encode_gnss_time_offset(m)?)),
        Message::ImuRaw(m) => Ok((MSG_IMU_RAW, imu::encode_imu_raw(m)?)),
        Message::ImuAux(m) => Ok((MSG_IMU_AUX, imu::encode_imu_aux(m)?)),
        Message::Odometry(m) => Ok((MSG_ODOMETRY, imu::encode_odometry(m)?)),
        Message::WheelTick(m) => Ok((MSG_WHEELTICK, imu::encode_wheeltick(m)?)),
        Message::SbasRaw(m) => Ok((MSG_SBAS_RAW, sbas::encode(m)?)),
        Message::SvAzEl(m) => Ok((MSG_SV_AZ_EL, sv_status::encode_sv_az_el(m)?)),
        Message::MeasurementState(m) => Ok((MSG_MEASUREMENT_STATE, sv_status::encode_measurement_state(m)?)),
        Message::Unknown { msg_type, payload, .. } => Ok((*msg_type, payload.clone())),
    }
}
