//! Proprietary envelope messages: Swift's 4062 (wraps an SBP frame), the
//! NDF/4075 SBAS-subframe envelope, and the TeseoV/999 envelope (spec §3
//! "proprietary envelope", §4.D "4062/4075/999").

use crate::error::Error;
use bitstream::{BitReader, BitWriter};

pub const MSG_NUM_SWIFT: u16 = crate::constants::MSG_NUM_SWIFT_PROPRIETARY;
pub const MSG_NUM_NDF: u16 = crate::constants::MSG_NUM_NDF;
pub const MSG_NUM_TESEOV: u16 = crate::constants::MSG_NUM_TESEOV;

/// Swift's 4062 envelope: a 12-bit sub-type tag followed by an opaque
/// payload (normally a complete SBP frame, see `sbp::framer`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwiftProprietary {
    pub sub_type: u16,
    pub body: Vec<u8>,
}

pub fn decode_swift(payload: &[u8]) -> Result<SwiftProprietary, Error> {
    let mut r = BitReader::new(payload);
    let got = r.u(12)? as u16;
    if got != MSG_NUM_SWIFT {
        return Err(Error::MessageTypeMismatch { expected: MSG_NUM_SWIFT, got });
    }
    let sub_type = r.u(12)? as u16;
    let remaining_bits = r.remaining_bits();
    let body = r.bytes(remaining_bits / 8)?.to_vec();
    Ok(SwiftProprietary { sub_type, body })
}

pub fn encode_swift(msg: &SwiftProprietary) -> Result<Vec<u8>, Error> {
    let mut w = BitWriter::new();
    w.u(MSG_NUM_SWIFT as u64, 12)?;
    w.u(msg.sub_type as u64, 12)?;
    w.bytes(&msg.body)?;
    Ok(w.into_bytes())
}

/// 4075: Navigation Data Frame, wrapping raw SBAS L1 C/A subframe bits for
/// a given satellite/signal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavigationDataFrame {
    pub satellite: u8,
    pub signal_id: u8,
    pub subframe: Vec<u8>,
}

pub fn decode_ndf(payload: &[u8]) -> Result<NavigationDataFrame, Error> {
    let mut r = BitReader::new(payload);
    let got = r.u(12)? as u16;
    if got != MSG_NUM_NDF {
        return Err(Error::MessageTypeMismatch { expected: MSG_NUM_NDF, got });
    }
    let satellite = r.u(8)? as u8;
    let signal_id = r.u(8)? as u8;
    let remaining_bits = r.remaining_bits();
    let subframe = r.bytes(remaining_bits / 8)?.to_vec();
    Ok(NavigationDataFrame { satellite, signal_id, subframe })
}

pub fn encode_ndf(msg: &NavigationDataFrame) -> Result<Vec<u8>, Error> {
    let mut w = BitWriter::new();
    w.u(MSG_NUM_NDF as u64, 12)?;
    w.u(msg.satellite as u64, 8)?;
    w.u(msg.signal_id as u64, 8)?;
    w.bytes(&msg.subframe)?;
    Ok(w.into_bytes())
}

/// TeseoV's 8-bit sub-message discriminator, right after the 999 message
/// number (grounded on `rtcm3_decode_999_bitstream`'s `sub_type_id` field
/// and its `RESTART`/`STGSV`/`AUX` switch).
pub const TESEOV_SUBTYPE_RESTART: u8 = 0;
pub const TESEOV_SUBTYPE_STGSV: u8 = 1;
pub const TESEOV_SUBTYPE_AUX: u8 = 2;

/// 999: TeseoV's proprietary envelope. The message number and 8-bit
/// sub-type are decoded here; `body` is the sub-type's own payload,
/// opaque at this layer (spec §4.D: sub-type interpretation happens in
/// the translator, see `gnss_converters::teseov`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TeseoV {
    pub sub_type_id: u8,
    pub body: Vec<u8>,
}

pub fn decode_teseov(payload: &[u8]) -> Result<TeseoV, Error> {
    let mut r = BitReader::new(payload);
    let got = r.u(12)? as u16;
    if got != MSG_NUM_TESEOV {
        return Err(Error::MessageTypeMismatch { expected: MSG_NUM_TESEOV, got });
    }
    let sub_type_id = r.u(8)? as u8;
    let remaining_bits = r.remaining_bits();
    let body = r.bytes(remaining_bits / 8)?.to_vec();
    Ok(TeseoV { sub_type_id, body })
}

pub fn encode_teseov(msg: &TeseoV) -> Result<Vec<u8>, Error> {
    let mut w = BitWriter::new();
    w.u(MSG_NUM_TESEOV as u64, 12)?;
    w.u(msg.sub_type_id as u64, 8)?;
    w.bytes(&msg.body)?;
    Ok(w.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swift_envelope_round_trips() {
        let msg = SwiftProprietary { sub_type: 1, body: vec![0xDE, 0xAD, 0xBE, 0xEF] };
        let bytes = encode_swift(&msg).unwrap();
        let decoded = decode_swift(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn ndf_round_trips() {
        let msg = NavigationDataFrame { satellite: 120, signal_id: 1, subframe: vec![1, 2, 3] };
        let bytes = encode_ndf(&msg).unwrap();
        let decoded = decode_ndf(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn teseov_round_trips_opaque_body() {
        let msg = TeseoV { sub_type_id: TESEOV_SUBTYPE_RESTART, body: vec![9, 9, 9] };
        let bytes = encode_teseov(&msg).unwrap();
        let decoded = decode_teseov(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }
}
