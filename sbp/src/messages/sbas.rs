//! MSG_SBAS_RAW: a decoded SBAS L1 C/A subframe, sourced from RTCM's
//! 4075/NDF envelope (spec §4.J "4075 NDF -> SBAS L1 C/A decoder -> SBP
//! SBAS raw-data message").

use crate::error::Error;

const DATA_LEN: usize = 27;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SbasRawData {
    pub sid_satellite: u8,
    pub sid_code: u8,
    pub message_type: u8,
    /// The 212-bit data field, MSB-first, zero-padded to 27 bytes.
    pub data: Vec<u8>,
}

pub fn decode(payload: &[u8]) -> Result<SbasRawData, Error> {
    if payload.len() != 3 + DATA_LEN {
        return Err(Error::InvalidMessage("SBAS raw payload must be 30 bytes"));
    }
    Ok(SbasRawData {
        sid_satellite: payload[0],
        sid_code: payload[1],
        message_type: payload[2],
        data: payload[3..3 + DATA_LEN].to_vec(),
    })
}

pub fn encode(msg: &SbasRawData) -> Result<Vec<u8>, Error> {
    if msg.data.len() != DATA_LEN {
        return Err(Error::InvalidMessage("SBAS raw data field must be 27 bytes"));
    }
    let mut out = Vec::with_capacity(3 + DATA_LEN);
    out.push(msg.sid_satellite);
    out.push(msg.sid_code);
    out.push(msg.message_type);
    out.extend_from_slice(&msg.data);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let msg = SbasRawData { sid_satellite: 133, sid_code: 2, message_type: 9, data: vec![0xAB; DATA_LEN] };
        let bytes = encode(&msg).unwrap();
        assert_eq!(decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn wrong_data_length_rejected() {
        let msg = SbasRawData { sid_satellite: 133, sid_code: 2, message_type: 9, data: vec![0xAB; 10] };
        assert!(encode(&msg).is_err());
    }
}
