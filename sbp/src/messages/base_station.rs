//! MSG_BASE_POS_ECEF (0x0048): the base station's ECEF position, folded in
//! from RTCM 1005/1006 by the translator (spec §4.J "1005/1006 -> SBP base
//! position ECEF, antenna height folded in for 1006").

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BasePositionEcef {
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
}

pub fn decode(payload: &[u8]) -> Result<BasePositionEcef, Error> {
    if payload.len() != 24 {
        return Err(Error::InvalidMessage("base position ECEF payload must be 24 bytes"));
    }
    let x_m = f64::from_le_bytes(payload[0..8].try_into().unwrap());
    let y_m = f64::from_le_bytes(payload[8..16].try_into().unwrap());
    let z_m = f64::from_le_bytes(payload[16..24].try_into().unwrap());
    Ok(BasePositionEcef { x_m, y_m, z_m })
}

pub fn encode(pos: &BasePositionEcef) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(24);
    out.extend_from_slice(&pos.x_m.to_le_bytes());
    out.extend_from_slice(&pos.y_m.to_le_bytes());
    out.extend_from_slice(&pos.z_m.to_le_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let pos = BasePositionEcef { x_m: -2_703_115.0, y_m: -4_261_339.0, z_m: 3_887_791.5 };
        let bytes = encode(&pos).unwrap();
        assert_eq!(decode(&bytes).unwrap(), pos);
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(decode(&[0u8; 10]).is_err());
    }
}
