//! MSG_HEARTBEAT (0xFFFF): liveness/status beacon. Not produced by the
//! translator itself, but decoded/passed through so a mixed SBP stream
//! (e.g. a real receiver's heartbeat mixed with translator output) round
//! trips without falling into [`crate::messages::Message::Unknown`].

use crate::error::Error;
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HeartbeatFlags: u32 {
        const SYSTEM_ERROR = 1 << 0;
        const IO_ERROR = 1 << 1;
        const SWIFTNAP_ERROR = 1 << 2;
        const EXT_ANTENNA_PRESENT = 1 << 31;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Heartbeat {
    pub flags: HeartbeatFlags,
}

pub fn decode_heartbeat(payload: &[u8]) -> Result<Heartbeat, Error> {
    if payload.len() != 4 {
        return Err(Error::InvalidMessage("heartbeat payload must be 4 bytes"));
    }
    let raw = u32::from_le_bytes(payload.try_into().unwrap());
    Ok(Heartbeat { flags: HeartbeatFlags::from_bits_truncate(raw) })
}

pub fn encode_heartbeat(hb: &Heartbeat) -> Result<Vec<u8>, Error> {
    Ok(hb.flags.bits().to_le_bytes().to_vec())
}

/// Offset of the local sensor clock from GNSS time (spec §4.K "NAV-STATUS
/// -> ... emits an SBP GNSS-time-offset message"), split the way the wire
/// format splits any SBP duration: a whole-week part, a millisecond part,
/// and a microsecond remainder, plus a one-byte validity flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GnssTimeOffset {
    pub week_offset: i16,
    pub ms_offset: i32,
    pub microsecond_offset: i16,
    pub flags: u8,
}

pub fn decode_gnss_time_offset(payload: &[u8]) -> Result<GnssTimeOffset, Error> {
    if payload.len() != 9 {
        return Err(Error::InvalidMessage("gnss time offset payload must be 9 bytes"));
    }
    Ok(GnssTimeOffset {
        week_offset: i16::from_le_bytes(payload[0..2].try_into().unwrap()),
        ms_offset: i32::from_le_bytes(payload[2..6].try_into().unwrap()),
        microsecond_offset: i16::from_le_bytes(payload[6..8].try_into().unwrap()),
        flags: payload[8],
    })
}

pub fn encode_gnss_time_offset(offset: &GnssTimeOffset) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(9);
    out.extend_from_slice(&offset.week_offset.to_le_bytes());
    out.extend_from_slice(&offset.ms_offset.to_le_bytes());
    out.extend_from_slice(&offset.microsecond_offset.to_le_bytes());
    out.push(offset.flags);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let hb = Heartbeat { flags: HeartbeatFlags::EXT_ANTENNA_PRESENT };
        let bytes = encode_heartbeat(&hb).unwrap();
        assert_eq!(decode_heartbeat(&bytes).unwrap(), hb);
    }

    #[test]
    fn gnss_time_offset_round_trips() {
        let offset = GnssTimeOffset { week_offset: 0, ms_offset: -1234, microsecond_offset: 500, flags: 1 };
        let bytes = encode_gnss_time_offset(&offset).unwrap();
        assert_eq!(decode_gnss_time_offset(&bytes).unwrap(), offset);
    }
}
