//! HNR-PVT: the high-navigation-rate PVT solution (spec §4.K: "NAV (...),
//! HNR (PVT)"). Same field shapes as NAV-PVT at a coarser set (no DOP/
//! vertical accuracy split), emitted at the receiver's HNR rate rather
//! than the main nav rate.

use crate::error::Error;
use crate::reader::Reader;
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HnrValidFlags: u8 {
        const VALID_DATE = 1 << 0;
        const VALID_TIME = 1 << 1;
        const FULLY_RESOLVED = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HnrPvt {
    pub itow_ms: u32,
    pub nano_s: i32,
    pub valid: HnrValidFlags,
    pub fix_type: u8,
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub height_m: f64,
    pub g_speed_m_s: f64,
    pub head_mot_deg: f64,
}

pub fn decode(payload: &[u8]) -> Result<HnrPvt, Error> {
    if payload.len() < 72 {
        return Err(Error::InvalidMessage("HNR-PVT payload shorter than 72 bytes"));
    }
    let mut r = Reader::new(payload);
    let itow_ms = r.u32()?;
    r.skip(2)?; // year
    r.skip(1)?; // month
    r.skip(1)?; // day
    r.skip(1)?; // hour
    r.skip(1)?; // min
    r.skip(1)?; // sec
    let valid = HnrValidFlags::from_bits_truncate(r.u8()?);
    let nano_s = r.i32()?;
    let fix_type = r.u8()?;
    r.skip(1)?; // flags
    r.skip(2)?; // reserved1
    let lon_deg = r.i32()? as f64 * 1e-7;
    let lat_deg = r.i32()? as f64 * 1e-7;
    let height_m = r.i32()? as f64 * 1e-3;
    r.skip(4)?; // hMSL
    let g_speed_m_s = r.i32()? as f64 * 1e-3;
    r.skip(4)?; // speed
    let head_mot_deg = r.i32()? as f64 * 1e-5;

    Ok(HnrPvt { itow_ms, nano_s, valid, fix_type, lon_deg, lat_deg, height_m, g_speed_m_s, head_mot_deg })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_payload() {
        assert!(decode(&[0u8; 10]).is_err());
    }
}
