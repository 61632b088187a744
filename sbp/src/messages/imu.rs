//! MSG_IMU_RAW / MSG_IMU_AUX / MSG_ODOMETRY / MSG_WHEELTICK: the sensor-
//! fusion messages the UBX->SBP translator produces from ESF-RAW/ESF-MEAS
//! (spec §4.K: "ESF-RAW -> IMU samples ... emits SBP `imu_raw` per complete
//! 6-axis triple and `imu_aux` every 20 samples", "ESF-MEAS -> odometry
//! (speed or wheeltick); maintains a 24-bit wheeltick counter with forward/
//! reverse direction").

use crate::error::Error;

/// One accelerometer+gyroscope sample, scaled to the receiver's raw sensor
/// units (spec: "scaled to BMI160 units", this implementation does not
/// rescale to physical units, matching the wire message it mirrors).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImuRaw {
    pub tow_ms: u32,
    pub acc_x: i16,
    pub acc_y: i16,
    pub acc_z: i16,
    pub gyr_x: i16,
    pub gyr_y: i16,
    pub gyr_z: i16,
}

pub fn decode_imu_raw(payload: &[u8]) -> Result<ImuRaw, Error> {
    if payload.len() < 16 {
        return Err(Error::InvalidMessage("imu_raw payload shorter than 16 bytes"));
    }
    let tow_ms = u32::from_le_bytes(payload[0..4].try_into().unwrap());
    let acc_x = i16::from_le_bytes(payload[4..6].try_into().unwrap());
    let acc_y = i16::from_le_bytes(payload[6..8].try_into().unwrap());
    let acc_z = i16::from_le_bytes(payload[8..10].try_into().unwrap());
    let gyr_x = i16::from_le_bytes(payload[10..12].try_into().unwrap());
    let gyr_y = i16::from_le_bytes(payload[12..14].try_into().unwrap());
    let gyr_z = i16::from_le_bytes(payload[14..16].try_into().unwrap());
    Ok(ImuRaw { tow_ms, acc_x, acc_y, acc_z, gyr_x, gyr_y, gyr_z })
}

pub fn encode_imu_raw(msg: &ImuRaw) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(16);
    out.extend_from_slice(&msg.tow_ms.to_le_bytes());
    out.extend_from_slice(&msg.acc_x.to_le_bytes());
    out.extend_from_slice(&msg.acc_y.to_le_bytes());
    out.extend_from_slice(&msg.acc_z.to_le_bytes());
    out.extend_from_slice(&msg.gyr_x.to_le_bytes());
    out.extend_from_slice(&msg.gyr_y.to_le_bytes());
    out.extend_from_slice(&msg.gyr_z.to_le_bytes());
    Ok(out)
}

/// IMU metadata, emitted once per 20 `imu_raw` samples rather than on every
/// sample (spec §4.K).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImuAux {
    pub imu_type: u8,
    pub temp: i16,
    pub imu_conf: u16,
}

pub fn decode_imu_aux(payload: &[u8]) -> Result<ImuAux, Error> {
    if payload.len() < 5 {
        return Err(Error::InvalidMessage("imu_aux payload shorter than 5 bytes"));
    }
    let imu_type = payload[0];
    let temp = i16::from_le_bytes(payload[1..3].try_into().unwrap());
    let imu_conf = u16::from_le_bytes(payload[3..5].try_into().unwrap());
    Ok(ImuAux { imu_type, temp, imu_conf })
}

pub fn encode_imu_aux(msg: &ImuAux) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(5);
    out.push(msg.imu_type);
    out.extend_from_slice(&msg.temp.to_le_bytes());
    out.extend_from_slice(&msg.imu_conf.to_le_bytes());
    Ok(out)
}

/// Wheel-derived speed (ESF-MEAS `SPEED` data type), in mm/s with sign
/// giving direction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Odometry {
    pub tow_ms: u32,
    pub velocity_mm_s: i32,
    pub flags: u8,
}

pub fn decode_odometry(payload: &[u8]) -> Result<Odometry, Error> {
    if payload.len() < 9 {
        return Err(Error::InvalidMessage("odometry payload shorter than 9 bytes"));
    }
    let tow_ms = u32::from_le_bytes(payload[0..4].try_into().unwrap());
    let velocity_mm_s = i32::from_le_bytes(payload[4..8].try_into().unwrap());
    let flags = payload[8];
    Ok(Odometry { tow_ms, velocity_mm_s, flags })
}

pub fn encode_odometry(msg: &Odometry) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(9);
    out.extend_from_slice(&msg.tow_ms.to_le_bytes());
    out.extend_from_slice(&msg.velocity_mm_s.to_le_bytes());
    out.push(msg.flags);
    Ok(out)
}

/// Accumulated wheel-tick count (ESF-MEAS `WHEEL_TICK_*` data types):
/// a 24-bit magnitude with the sign of `ticks` carrying direction, folded
/// into a plain `i32` here rather than the wire's sign-bit-plus-magnitude
/// encoding (spec §4.K: "24-bit wheeltick counter with forward/reverse
/// direction").
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WheelTick {
    pub source: u8,
    pub flags: u8,
    pub time_tag: u32,
    pub ticks: i32,
}

pub fn decode_wheeltick(payload: &[u8]) -> Result<WheelTick, Error> {
    if payload.len() < 10 {
        return Err(Error::InvalidMessage("wheeltick payload shorter than 10 bytes"));
    }
    let source = payload[0];
    let flags = payload[1];
    let time_tag = u32::from_le_bytes(payload[2..6].try_into().unwrap());
    let ticks = i32::from_le_bytes(payload[6..10].try_into().unwrap());
    Ok(WheelTick { source, flags, time_tag, ticks })
}

pub fn encode_wheeltick(msg: &WheelTick) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(10);
    out.push(msg.source);
    out.push(msg.flags);
    out.extend_from_slice(&msg.time_tag.to_le_bytes());
    out.extend_from_slice(&msg.ticks.to_le_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imu_raw_round_trips() {
        let msg = ImuRaw { tow_ms: 123_456, acc_x: 100, acc_y: -200, acc_z: 16384, gyr_x: -1, gyr_y: 2, gyr_z: -3 };
        let bytes = encode_imu_raw(&msg).unwrap();
        assert_eq!(decode_imu_raw(&bytes).unwrap(), msg);
    }

    #[test]
    fn imu_aux_round_trips() {
        let msg = ImuAux { imu_type: 1, temp: 250, imu_conf: 0x002A };
        let bytes = encode_imu_aux(&msg).unwrap();
        assert_eq!(decode_imu_aux(&bytes).unwrap(), msg);
    }

    #[test]
    fn odometry_round_trips_negative_velocity() {
        let msg = Odometry { tow_ms: 1, velocity_mm_s: -500, flags: 0 };
        let bytes = encode_odometry(&msg).unwrap();
        assert_eq!(decode_odometry(&bytes).unwrap(), msg);
    }

    #[test]
    fn wheeltick_round_trips_reverse_direction() {
        let msg = WheelTick { source: 0, flags: 1, time_tag: 99, ticks: -42 };
        let bytes = encode_wheeltick(&msg).unwrap();
        assert_eq!(decode_wheeltick(&bytes).unwrap(), msg);
    }

    #[test]
    fn short_payloads_rejected() {
        assert!(decode_imu_raw(&[0u8; 4]).is_err());
        assert!(decode_imu_aux(&[0u8; 2]).is_err());
        assert!(decode_odometry(&[0u8; 3]).is_err());
        assert!(decode_wheeltick(&[0u8; 3]).is_err());
    }
}
