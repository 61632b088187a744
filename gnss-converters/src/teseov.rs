//! TeseoV/999 sub-message interpretation (spec §4.D "999 dispatched but
//! not decoded further" is superseded for STGSV, see spec §4.J "999 STGSV
//! -> SBP SV az/el + measurement-state"). RESTART and AUX stay opaque;
//! only STGSV's field layout is grounded here, on
//! `rtcm3_decode_999_stgsv_base`/`rtcm3_decode_999_stgsv_field_value_base`.

use bitstream::BitReader;
use rtcm3::messages::proprietary::TESEOV_SUBTYPE_STGSV;

use crate::error::Error;

const FIELDMASK_EL: u8 = 0b0000_0001;
const FIELDMASK_AZ: u8 = 0b0000_0010;
const FIELDMASK_CN0_B1: u8 = 0b0000_0100;
const FIELDMASK_CN0_B2: u8 = 0b0000_1000;
const FIELDMASK_CN0_B3: u8 = 0b0001_0000;

/// Width of the STGSV satellite-active bitmask (`RTCM_TESEOV_SATELLITE_MASK_SIZE`
/// upstream); satellite `i` (0-based) is bit `MASK_BITS - i - 1`.
const SATELLITE_MASK_BITS: u32 = 64;

const CN0_SCALE: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StgsvSatellite {
    /// 0-based index into the active-satellite bitmask; the caller maps
    /// this to a constellation-specific PRN.
    pub sat_id: u8,
    pub el_deg: Option<i8>,
    pub az_deg: Option<u16>,
    pub cn0_b1_db_hz: Option<f64>,
    pub cn0_b2_db_hz: Option<f64>,
    pub cn0_b3_db_hz: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stgsv {
    pub tow_ms: u32,
    pub constellation: u8,
    pub mul_msg_ind: bool,
    pub satellites: Vec<StgsvSatellite>,
}

pub fn is_stgsv(sub_type_id: u8) -> bool {
    sub_type_id == TESEOV_SUBTYPE_STGSV
}

/// Decodes a TeseoV STGSV sub-message body (the bytes after the 8-bit
/// sub-type tag that `rtcm3::messages::proprietary::decode_teseov`
/// already stripped).
pub fn decode_stgsv(body: &[u8]) -> Result<Stgsv, Error> {
    let mut r = BitReader::new(body);
    let read = |r: &mut BitReader, n: u32, what: &'static str| {
        r.u(n).map_err(|_| Error::ConfigError(what))
    };

    let tow_ms = read(&mut r, 30, "STGSV: failed to read tow_ms")? as u32;
    let constellation = read(&mut r, 4, "STGSV: failed to read constellation")? as u8;
    let sat_mask = read(&mut r, SATELLITE_MASK_BITS, "STGSV: failed to read satellite mask")?;
    let field_mask = read(&mut r, 8, "STGSV: failed to read field mask")? as u8;
    let mul_msg_ind = read(&mut r, 1, "STGSV: failed to read mul_msg_ind")? == 1;

    let mut satellites = Vec::new();
    for bit in 0..SATELLITE_MASK_BITS as u8 {
        if sat_mask & (1u64 << (SATELLITE_MASK_BITS as u8 - bit - 1)) == 0 {
            continue;
        }
        let el_deg = if field_mask & FIELDMASK_EL != 0 {
            Some(r.s(8).map_err(|_| Error::ConfigError("STGSV: failed to read elevation"))? as i8)
        } else {
            None
        };
        let az_deg = if field_mask & FIELDMASK_AZ != 0 {
            Some(read(&mut r, 9, "STGSV: failed to read azimuth")? as u16)
        } else {
            None
        };
        let cn0_b1_db_hz = if field_mask & FIELDMASK_CN0_B1 != 0 {
            Some(read(&mut r, 8, "STGSV: failed to read cn0_b1")? as f64 * CN0_SCALE)
        } else {
            None
        };
        let cn0_b2_db_hz = if field_mask & FIELDMASK_CN0_B2 != 0 {
            Some(read(&mut r, 8, "STGSV: failed to read cn0_b2")? as f64 * CN0_SCALE)
        } else {
            None
        };
        let cn0_b3_db_hz = if field_mask & FIELDMASK_CN0_B3 != 0 {
            Some(read(&mut r, 8, "STGSV: failed to read cn0_b3")? as f64 * CN0_SCALE)
        } else {
            None
        };
        satellites.push(StgsvSatellite { sat_id: bit, el_deg, az_deg, cn0_b1_db_hz, cn0_b2_db_hz, cn0_b3_db_hz });
    }

    Ok(Stgsv { tow_ms, constellation, mul_msg_ind, satellites })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream::BitWriter;

    fn encode_stgsv_for_test(msg: &Stgsv, field_mask: u8) -> Vec<u8> {
        let mut w = BitWriter::new();
        w.u(msg.tow_ms as u64, 30).unwrap();
        w.u(msg.constellation as u64, 4).unwrap();
        let mut mask = 0u64;
        for sat in &msg.satellites {
            mask |= 1u64 << (SATELLITE_MASK_BITS as u8 - sat.sat_id - 1);
        }
        w.u(mask, SATELLITE_MASK_BITS).unwrap();
        w.u(field_mask as u64, 8).unwrap();
        w.u(msg.mul_msg_ind as u64, 1).unwrap();
        for sat in &msg.satellites {
            if let Some(el) = sat.el_deg {
                w.s(el as i64, 8).unwrap();
            }
            if let Some(az) = sat.az_deg {
                w.u(az as u64, 9).unwrap();
            }
            if let Some(cn0) = sat.cn0_b1_db_hz {
                w.u((cn0 / CN0_SCALE).round() as u64, 8).unwrap();
            }
            if let Some(cn0) = sat.cn0_b2_db_hz {
                w.u((cn0 / CN0_SCALE).round() as u64, 8).unwrap();
            }
            if let Some(cn0) = sat.cn0_b3_db_hz {
                w.u((cn0 / CN0_SCALE).round() as u64, 8).unwrap();
            }
        }
        w.into_bytes()
    }

    #[test]
    fn decodes_el_az_only() {
        let msg = Stgsv {
            tow_ms: 123_456,
            constellation: 0,
            mul_msg_ind: false,
            satellites: vec![
                StgsvSatellite { sat_id: 2, el_deg: Some(45), az_deg: Some(180), cn0_b1_db_hz: None, cn0_b2_db_hz: None, cn0_b3_db_hz: None },
                StgsvSatellite { sat_id: 7, el_deg: Some(-10), az_deg: Some(359), cn0_b1_db_hz: None, cn0_b2_db_hz: None, cn0_b3_db_hz: None },
            ],
        };
        let field_mask = FIELDMASK_EL | FIELDMASK_AZ;
        let bytes = encode_stgsv_for_test(&msg, field_mask);
        let decoded = decode_stgsv(&bytes).unwrap();
        assert_eq!(decoded.tow_ms, msg.tow_ms);
        assert_eq!(decoded.satellites, msg.satellites);
    }

    #[test]
    fn decodes_with_all_cn0_fields() {
        let msg = Stgsv {
            tow_ms: 1,
            constellation: 3,
            mul_msg_ind: true,
            satellites: vec![StgsvSatellite {
                sat_id: 0,
                el_deg: Some(5),
                az_deg: Some(10),
                cn0_b1_db_hz: Some(40.0),
                cn0_b2_db_hz: Some(38.5),
                cn0_b3_db_hz: Some(0.0),
            }],
        };
        let field_mask = FIELDMASK_EL | FIELDMASK_AZ | FIELDMASK_CN0_B1 | FIELDMASK_CN0_B2 | FIELDMASK_CN0_B3;
        let bytes = encode_stgsv_for_test(&msg, field_mask);
        let decoded = decode_stgsv(&bytes).unwrap();
        assert_eq!(decoded.satellites, msg.satellites);
        assert!(decoded.mul_msg_ind);
    }

    #[test]
    fn empty_satellite_mask_decodes_no_entries() {
        let msg = Stgsv { tow_ms: 0, constellation: 0, mul_msg_ind: false, satellites: vec![] };
        let bytes = encode_stgsv_for_test(&msg, 0);
        let decoded = decode_stgsv(&bytes).unwrap();
        assert!(decoded.satellites.is_empty());
    }
}
