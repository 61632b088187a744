//! ESF-RAW (raw IMU/odometry samples) and ESF-MEAS (single fused sensor
//! reading), the sensor-fusion messages §4.K maps to SBP `imu_raw`/
//! `imu_aux` and odometry output.

use crate::error::Error;
use crate::reader::{Reader, Writer};

/// `dataType` values ESF-RAW/ESF-MEAS use for the sensor types the
/// translator cares about (u-blox interface spec, IMU block).
pub mod data_type {
    pub const GYRO_Z: u8 = 5;
    pub const WHEEL_TICK_FRONT_LEFT: u8 = 6;
    pub const WHEEL_TICK_FRONT_RIGHT: u8 = 7;
    pub const WHEEL_TICK_REAR_LEFT: u8 = 8;
    pub const WHEEL_TICK_REAR_RIGHT: u8 = 9;
    pub const SPEED: u8 = 11;
    pub const GYRO_TEMP: u8 = 12;
    pub const GYRO_Y: u8 = 13;
    pub const GYRO_X: u8 = 14;
    pub const ACCEL_X: u8 = 16;
    pub const ACCEL_Y: u8 = 17;
    pub const ACCEL_Z: u8 = 18;
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawSample {
    pub data_type: u8,
    /// 24-bit signed sample, sign-extended.
    pub data_field: i32,
    pub sensor_time_tag: u32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EsfRaw {
    pub samples: Vec<RawSample>,
}

fn decode_data_word(raw: u32) -> (u8, i32) {
    let data_type = (raw >> 24) as u8;
    let field = raw & 0x00FF_FFFF;
    let signed = if field & 0x0080_0000 != 0 {
        (field | 0xFF00_0000) as i32
    } else {
        field as i32
    };
    (data_type, signed)
}

fn encode_data_word(data_type: u8, data_field: i32) -> u32 {
    ((data_type as u32) << 24) | (data_field as u32 & 0x00FF_FFFF)
}

pub fn decode_raw(payload: &[u8]) -> Result<EsfRaw, Error> {
    if payload.len() < 4 || (payload.len() - 4) % 8 != 0 {
        return Err(Error::InvalidMessage("ESF-RAW payload not a whole number of 8-byte blocks"));
    }
    let mut r = Reader::new(payload);
    r.skip(4)?; // reserved0

    let mut samples = Vec::new();
    while r.remaining() >= 8 {
        let raw = r.u32()?;
        let sensor_time_tag = r.u32()?;
        let (data_type, data_field) = decode_data_word(raw);
        samples.push(RawSample { data_type, data_field, sensor_time_tag });
    }
    Ok(EsfRaw { samples })
}

pub fn encode_raw(msg: &EsfRaw) -> Result<Vec<u8>, Error> {
    let mut w = Writer::new();
    w.zeros(4);
    for s in &msg.samples {
        w.u32(encode_data_word(s.data_type, s.data_field));
        w.u32(s.sensor_time_tag);
    }
    Ok(w.into_bytes())
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasDatum {
    pub data_type: u8,
    pub data_field: i32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EsfMeas {
    pub time_tag: u32,
    pub time_mark_sent: u8,
    pub time_mark_edge: u8,
    pub calib_tag_valid: bool,
    pub num_meas: u8,
    pub provider_id: u16,
    pub data: Vec<MeasDatum>,
    pub calib_ttag: Option<u32>,
}

pub fn decode_meas(payload: &[u8]) -> Result<EsfMeas, Error> {
    if payload.len() < 8 {
        return Err(Error::InvalidMessage("ESF-MEAS payload shorter than the fixed header"));
    }
    let mut r = Reader::new(payload);
    let time_tag = r.u32()?;
    let flags = r.u16()?;
    let provider_id = r.u16()?;

    let time_mark_sent = (flags & 0x3) as u8;
    let time_mark_edge = ((flags >> 2) & 0x1) as u8;
    let calib_tag_valid = (flags >> 3) & 0x1 == 1;
    let num_meas = ((flags >> 11) & 0x1F) as u8;

    let mut data = Vec::with_capacity(num_meas as usize);
    for _ in 0..num_meas {
        let raw = r.u32()?;
        let (data_type, data_field) = decode_data_word(raw);
        data.push(MeasDatum { data_type, data_field });
    }
    let calib_ttag = if calib_tag_valid { Some(r.u32()?) } else { None };

    Ok(EsfMeas { time_tag, time_mark_sent, time_mark_edge, calib_tag_valid, num_meas, provider_id, data, calib_ttag })
}

pub fn encode_meas(msg: &EsfMeas) -> Result<Vec<u8>, Error> {
    if msg.data.len() > 0x1F {
        return Err(Error::InvalidMessage("ESF-MEAS cannot carry more than 31 data words"));
    }
    let mut w = Writer::new();
    w.u32(msg.time_tag);
    let flags: u16 = (msg.time_mark_sent as u16 & 0x3)
        | ((msg.time_mark_edge as u16 & 0x1) << 2)
        | ((msg.calib_tag_valid as u16) << 3)
        | ((msg.data.len() as u16 & 0x1F) << 11);
    w.u16(flags);
    w.u16(msg.provider_id);
    for d in &msg.data {
        w.u32(encode_data_word(d.data_type, d.data_field));
    }
    if let Some(ttag) = msg.calib_ttag {
        w.u32(ttag);
    }
    Ok(w.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trips() {
        let msg = EsfRaw {
            samples: vec![
                RawSample { data_type: data_type::GYRO_Z, data_field: -1200, sensor_time_tag: 100 },
                RawSample { data_type: data_type::ACCEL_X, data_field: 4096, sensor_time_tag: 101 },
            ],
        };
        let bytes = encode_raw(&msg).unwrap();
        assert_eq!(decode_raw(&bytes).unwrap(), msg);
    }

    #[test]
    fn meas_round_trips_with_calib_tag() {
        let msg = EsfMeas {
            time_tag: 12345,
            time_mark_sent: 0,
            time_mark_edge: 0,
            calib_tag_valid: true,
            num_meas: 1,
            provider_id: 1,
            data: vec![MeasDatum { data_type: data_type::SPEED, data_field: 500 }],
            calib_ttag: Some(999),
        };
        let bytes = encode_meas(&msg).unwrap();
        let decoded = decode_meas(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }
}
