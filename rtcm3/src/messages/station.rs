//! Reference station descriptor messages: antenna reference point (1005,
//! 1006), antenna descriptor (1007, 1008), receiver/antenna descriptor
//! (1033), and the GLONASS bias message (1230) (spec §3 "Station
//! descriptor", §4.D "station messages").

use crate::error::Error;
use bitflags::bitflags;
use bitstream::{BitReader, BitWriter};

bitflags! {
    /// The four single-bit GNSS/reference-station indicators packed after
    /// `itrf_epoch` in 1005/1006 (DF021-DF024).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GnssIndicators: u8 {
        const GPS = 0b1000;
        const GLONASS = 0b0100;
        const GALILEO = 0b0010;
        const REFERENCE_STATION = 0b0001;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AntennaReferencePoint {
    pub station_id: u16,
    pub itrf_epoch: u8,
    pub indicators: GnssIndicators,
    pub ecef_x_m: f64,
    pub single_receiver_oscillator_indicator: bool,
    pub ecef_y_m: f64,
    pub quarter_cycle_indicator: u8,
    pub ecef_z_m: f64,
    /// Present only on 1006.
    pub antenna_height_m: Option<f64>,
}

const ECEF_SCALE: f64 = 0.0001;
const HEIGHT_SCALE: f64 = 0.0001;

pub fn decode_antenna_reference_point(payload: &[u8]) -> Result<AntennaReferencePoint, Error> {
    let mut r = BitReader::new(payload);
    let msg_num = r.u(12)? as u16;
    if msg_num != 1005 && msg_num != 1006 {
        return Err(Error::MessageTypeMismatch { expected: 1005, got: msg_num });
    }
    let station_id = r.u(12)? as u16;
    let itrf_epoch = r.u(6)? as u8;
    let indicators = GnssIndicators::from_bits_truncate(r.u(4)? as u8);
    let ecef_x_m = r.s(38)? as f64 * ECEF_SCALE;
    let single_receiver_oscillator_indicator = r.u(1)? == 1;
    let _reserved = r.u(1)?;
    let ecef_y_m = r.s(38)? as f64 * ECEF_SCALE;
    let quarter_cycle_indicator = r.u(2)? as u8;
    let ecef_z_m = r.s(38)? as f64 * ECEF_SCALE;
    let antenna_height_m = if msg_num == 1006 {
        Some(r.u(16)? as f64 * HEIGHT_SCALE)
    } else {
        None
    };

    Ok(AntennaReferencePoint {
        station_id,
        itrf_epoch,
        indicators,
        ecef_x_m,
        single_receiver_oscillator_indicator,
        ecef_y_m,
        quarter_cycle_indicator,
        ecef_z_m,
        antenna_height_m,
    })
}

pub fn encode_antenna_reference_point(arp: &AntennaReferencePoint) -> Result<Vec<u8>, Error> {
    let msg_num = if arp.antenna_height_m.is_some() { 1006 } else { 1005 };
    let mut w = BitWriter::new();
    w.u(msg_num, 12)?;
    w.u(arp.station_id as u64, 12)?;
    w.u(arp.itrf_epoch as u64, 6)?;
    w.u(arp.indicators.bits() as u64, 4)?;
    w.s((arp.ecef_x_m / ECEF_SCALE).round() as i64, 38)?;
    w.u(arp.single_receiver_oscillator_indicator as u64, 1)?;
    w.u(0, 1)?;
    w.s((arp.ecef_y_m / ECEF_SCALE).round() as i64, 38)?;
    w.u(arp.quarter_cycle_indicator as u64, 2)?;
    w.s((arp.ecef_z_m / ECEF_SCALE).round() as i64, 38)?;
    if let Some(height) = arp.antenna_height_m {
        w.u((height / HEIGHT_SCALE).round() as u64, 16)?;
    }
    Ok(w.into_bytes())
}

/// Antenna/receiver descriptor text (1007, 1008, 1033): one or more
/// length-prefixed ASCII strings. 1033 additionally carries the receiver
/// descriptor, firmware, and serial number.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AntennaDescriptor {
    pub station_id: u16,
    pub antenna_descriptor: String,
    pub antenna_setup_id: u8,
    pub antenna_serial_number: Option<String>,
    pub receiver_type_descriptor: Option<String>,
    pub receiver_firmware_version: Option<String>,
    pub receiver_serial_number: Option<String>,
}

fn read_string(r: &mut BitReader<'_>) -> Result<String, Error> {
    let len = r.u(8)? as usize;
    let bytes = r.bytes(len)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn write_string(w: &mut BitWriter, s: &str) -> Result<(), Error> {
    let bytes = s.as_bytes();
    let len = bytes.len().min(255);
    w.u(len as u64, 8)?;
    w.bytes(&bytes[..len])?;
    Ok(())
}

pub fn decode_antenna_descriptor(msg_num: u16, payload: &[u8]) -> Result<AntennaDescriptor, Error> {
    let mut r = BitReader::new(payload);
    let got = r.u(12)? as u16;
    if got != msg_num {
        return Err(Error::MessageTypeMismatch { expected: msg_num, got });
    }
    let station_id = r.u(12)? as u16;
    let antenna_descriptor = read_string(&mut r)?;
    let antenna_setup_id = r.u(8)? as u8;
    let antenna_serial_number = if msg_num == 1008 || msg_num == 1033 {
        Some(read_string(&mut r)?)
    } else {
        None
    };
    let (receiver_type_descriptor, receiver_firmware_version, receiver_serial_number) =
        if msg_num == 1033 {
            (
                Some(read_string(&mut r)?),
                Some(read_string(&mut r)?),
                Some(read_string(&mut r)?),
            )
        } else {
            (None, None, None)
        };

    Ok(AntennaDescriptor {
        station_id,
        antenna_descriptor,
        antenna_setup_id,
        antenna_serial_number,
        receiver_type_descriptor,
        receiver_firmware_version,
        receiver_serial_number,
    })
}

pub fn encode_antenna_descriptor(msg_num: u16, desc: &AntennaDescriptor) -> Result<Vec<u8>, Error> {
    let mut w = BitWriter::new();
    w.u(msg_num as u64, 12)?;
    w.u(desc.station_id as u64, 12)?;
    write_string(&mut w, &desc.antenna_descriptor)?;
    w.u(desc.antenna_setup_id as u64, 8)?;
    if msg_num == 1008 || msg_num == 1033 {
        write_string(&mut w, desc.antenna_serial_number.as_deref().unwrap_or(""))?;
    }
    if msg_num == 1033 {
        write_string(&mut w, desc.receiver_type_descriptor.as_deref().unwrap_or(""))?;
        write_string(&mut w, desc.receiver_firmware_version.as_deref().unwrap_or(""))?;
        write_string(&mut w, desc.receiver_serial_number.as_deref().unwrap_or(""))?;
    }
    Ok(w.into_bytes())
}

/// GLONASS code-phase bias message (1230): per-signal biases, present-flags
/// packed into a 4-bit mask.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlonassBiases {
    pub station_id: u16,
    pub bias_indicator: bool,
    pub l1_ca_bias_m: Option<f64>,
    pub l1_p_bias_m: Option<f64>,
    pub l2_ca_bias_m: Option<f64>,
    pub l2_p_bias_m: Option<f64>,
}

const BIAS_SCALE: f64 = 0.02;
const BIAS_SENTINEL: i64 = -1 << 15;

pub fn decode_glonass_biases(payload: &[u8]) -> Result<GlonassBiases, Error> {
    let mut r = BitReader::new(payload);
    let got = r.u(12)? as u16;
    if got != 1230 {
        return Err(Error::MessageTypeMismatch { expected: 1230, got });
    }
    let station_id = r.u(12)? as u16;
    let bias_indicator = r.u(1)? == 1;
    let _reserved = r.u(3)?;
    let mask = r.u(4)? as u8;
    let mut read_if_present = |present: bool| -> Result<Option<f64>, Error> {
        if present {
            let raw = r.s(16)?;
            Ok(if raw == BIAS_SENTINEL { None } else { Some(raw as f64 * BIAS_SCALE) })
        } else {
            Ok(None)
        }
    };
    let l1_ca_bias_m = read_if_present(mask & 0b1000 != 0)?;
    let l1_p_bias_m = read_if_present(mask & 0b0100 != 0)?;
    let l2_ca_bias_m = read_if_present(mask & 0b0010 != 0)?;
    let l2_p_bias_m = read_if_present(mask & 0b0001 != 0)?;

    Ok(GlonassBiases {
        station_id,
        bias_indicator,
        l1_ca_bias_m,
        l1_p_bias_m,
        l2_ca_bias_m,
        l2_p_bias_m,
    })
}

pub fn encode_glonass_biases(biases: &GlonassBiases) -> Result<Vec<u8>, Error> {
    let mut w = BitWriter::new();
    w.u(1230, 12)?;
    w.u(biases.station_id as u64, 12)?;
    w.u(biases.bias_indicator as u64, 1)?;
    w.u(0, 3)?;
    let mask = ((biases.l1_ca_bias_m.is_some() as u8) << 3)
        | ((biases.l1_p_bias_m.is_some() as u8) << 2)
        | ((biases.l2_ca_bias_m.is_some() as u8) << 1)
        | biases.l2_p_bias_m.is_some() as u8;
    w.u(mask as u64, 4)?;
    for bias in [
        biases.l1_ca_bias_m,
        biases.l1_p_bias_m,
        biases.l2_ca_bias_m,
        biases.l2_p_bias_m,
    ] {
        if let Some(v) = bias {
            w.s((v / BIAS_SCALE).round() as i64, 16)?;
        }
    }
    Ok(w.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arp_1005_round_trips_without_height() {
        let arp = AntennaReferencePoint {
            station_id: 1,
            itrf_epoch: 0,
            indicators: GnssIndicators::GPS | GnssIndicators::GLONASS,
            ecef_x_m: 1_234_567.8,
            single_receiver_oscillator_indicator: false,
            ecef_y_m: -2_345_678.9,
            quarter_cycle_indicator: 1,
            ecef_z_m: 5_555_555.5,
            antenna_height_m: None,
        };
        let bytes = encode_antenna_reference_point(&arp).unwrap();
        let decoded = decode_antenna_reference_point(&bytes).unwrap();
        assert!((decoded.ecef_x_m - arp.ecef_x_m).abs() < ECEF_SCALE);
        assert!(decoded.antenna_height_m.is_none());
    }

    #[test]
    fn arp_1006_round_trips_with_height() {
        let arp = AntennaReferencePoint {
            station_id: 9,
            itrf_epoch: 2,
            indicators: GnssIndicators::GPS | GnssIndicators::GALILEO | GnssIndicators::REFERENCE_STATION,
            ecef_x_m: 0.0,
            single_receiver_oscillator_indicator: true,
            ecef_y_m: 0.0,
            quarter_cycle_indicator: 0,
            ecef_z_m: 0.0,
            antenna_height_m: Some(1.5),
        };
        let bytes = encode_antenna_reference_point(&arp).unwrap();
        let decoded = decode_antenna_reference_point(&bytes).unwrap();
        assert!((decoded.antenna_height_m.unwrap() - 1.5).abs() < HEIGHT_SCALE);
        assert_eq!(decoded.indicators, arp.indicators);
    }

    #[test]
    fn descriptor_1033_round_trips_all_strings() {
        let desc = AntennaDescriptor {
            station_id: 3,
            antenna_descriptor: "TRM59800.80".to_string(),
            antenna_setup_id: 0,
            antenna_serial_number: Some("12345".to_string()),
            receiver_type_descriptor: Some("NOV OEM729".to_string()),
            receiver_firmware_version: Some("7.08".to_string()),
            receiver_serial_number: Some("SN001".to_string()),
        };
        let bytes = encode_antenna_descriptor(1033, &desc).unwrap();
        let decoded = decode_antenna_descriptor(1033, &bytes).unwrap();
        assert_eq!(decoded, desc);
    }

    #[test]
    fn biases_round_trip_with_partial_mask() {
        let biases = GlonassBiases {
            station_id: 7,
            bias_indicator: true,
            l1_ca_bias_m: Some(1.0),
            l1_p_bias_m: None,
            l2_ca_bias_m: Some(-0.5),
            l2_p_bias_m: None,
        };
        let bytes = encode_glonass_biases(&biases).unwrap();
        let decoded = decode_glonass_biases(&bytes).unwrap();
        assert_eq!(decoded, biases);
    }
}
