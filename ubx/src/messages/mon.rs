//! MON-HW: RF/antenna health, listed in spec §4.K as informational
//! passthrough (no SBP mapping named, unlike NAV/RXM/ESF/HNR).

use crate::error::Error;
use crate::reader::Reader;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonHw {
    pub noise_per_ms: u16,
    pub agc_cnt: u16,
    pub a_status: u8,
    pub a_power: u8,
    pub jamming_indicator: u8,
}

pub fn decode(payload: &[u8]) -> Result<MonHw, Error> {
    if payload.len() < 60 {
        return Err(Error::InvalidMessage("MON-HW payload shorter than 60 bytes"));
    }
    let mut r = Reader::new(payload);
    r.skip(16)?; // pinSel, pinBank, pinDir, pinVal
    let noise_per_ms = r.u16()?;
    let agc_cnt = r.u16()?;
    let a_status = r.u8()?;
    let a_power = r.u8()?;
    r.skip(1)?; // flags
    r.skip(1)?; // reserved1
    r.skip(4)?; // usedMask
    r.skip(17)?; // VP[17]
    let jamming_indicator = r.u8()?;
    Ok(MonHw { noise_per_ms, agc_cnt, a_status, a_power, jamming_indicator })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_payload() {
        assert!(decode(&[0u8; 5]).is_err());
    }
}
