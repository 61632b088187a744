//! MSG_SV_AZ_EL (sky geometry) and MSG_MEASUREMENT_STATE (per-signal
//! tracking quality), sourced from RTCM's TeseoV/999 STGSV sub-message
//! (spec §4.J "999 STGSV -> SBP SV az/el + measurement-state"). Each
//! carries a variable-length list of per-satellite entries, count-prefixed
//! like the rest of SBP's variable-length messages.

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SvAzElEntry {
    pub sid_satellite: u8,
    pub sid_code: u8,
    /// Azimuth, 0-359 degrees.
    pub az_deg: u16,
    /// Elevation, -90..=90 degrees.
    pub el_deg: i8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SvAzEl {
    pub entries: Vec<SvAzElEntry>,
}

const SV_AZ_EL_ENTRY_LEN: usize = 5;

pub fn decode_sv_az_el(payload: &[u8]) -> Result<SvAzEl, Error> {
    if payload.is_empty() {
        return Err(Error::InvalidMessage("SV az/el payload must have a count byte"));
    }
    let count = payload[0] as usize;
    let body = &payload[1..];
    if body.len() != count * SV_AZ_EL_ENTRY_LEN {
        return Err(Error::InvalidMessage("SV az/el payload length doesn't match its count"));
    }
    let mut entries = Vec::with_capacity(count);
    for chunk in body.chunks_exact(SV_AZ_EL_ENTRY_LEN) {
        let az_raw = u16::from_le_bytes([chunk[2], chunk[3]]);
        entries.push(SvAzElEntry {
            sid_satellite: chunk[0],
            sid_code: chunk[1],
            az_deg: az_raw / 2,
            el_deg: chunk[4] as i8,
        });
    }
    Ok(SvAzEl { entries })
}

pub fn encode_sv_az_el(msg: &SvAzEl) -> Result<Vec<u8>, Error> {
    if msg.entries.len() > u8::MAX as usize {
        return Err(Error::InvalidMessage("SV az/el message cannot carry more than 255 satellites"));
    }
    let mut out = Vec::with_capacity(1 + msg.entries.len() * SV_AZ_EL_ENTRY_LEN);
    out.push(msg.entries.len() as u8);
    for entry in &msg.entries {
        out.push(entry.sid_satellite);
        out.push(entry.sid_code);
        out.extend_from_slice(&(entry.az_deg * 2).to_le_bytes());
        out.push(entry.el_deg as u8);
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasurementStateEntry {
    pub mesid_satellite: u8,
    pub mesid_code: u8,
    pub cn0_db_hz: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasurementState {
    pub entries: Vec<MeasurementStateEntry>,
}

const MEASUREMENT_STATE_ENTRY_LEN: usize = 3;
const CN0_SCALE: f64 = 0.25;

pub fn decode_measurement_state(payload: &[u8]) -> Result<MeasurementState, Error> {
    if payload.is_empty() {
        return Err(Error::InvalidMessage("measurement state payload must have a count byte"));
    }
    let count = payload[0] as usize;
    let body = &payload[1..];
    if body.len() != count * MEASUREMENT_STATE_ENTRY_LEN {
        return Err(Error::InvalidMessage("measurement state payload length doesn't match its count"));
    }
    let mut entries = Vec::with_capacity(count);
    for chunk in body.chunks_exact(MEASUREMENT_STATE_ENTRY_LEN) {
        entries.push(MeasurementStateEntry {
            mesid_satellite: chunk[0],
            mesid_code: chunk[1],
            cn0_db_hz: chunk[2] as f64 * CN0_SCALE,
        });
    }
    Ok(MeasurementState { entries })
}

pub fn encode_measurement_state(msg: &MeasurementState) -> Result<Vec<u8>, Error> {
    if msg.entries.len() > u8::MAX as usize {
        return Err(Error::InvalidMessage("measurement state message cannot carry more than 255 signals"));
    }
    let mut out = Vec::with_capacity(1 + msg.entries.len() * MEASUREMENT_STATE_ENTRY_LEN);
    out.push(msg.entries.len() as u8);
    for entry in &msg.entries {
        out.push(entry.mesid_satellite);
        out.push(entry.mesid_code);
        out.push((entry.cn0_db_hz / CN0_SCALE).round() as u8);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sv_az_el_round_trips() {
        let msg = SvAzEl {
            entries: vec![
                SvAzElEntry { sid_satellite: 5, sid_code: 0, az_deg: 180, el_deg: 45 },
                SvAzElEntry { sid_satellite: 12, sid_code: 1, az_deg: 359, el_deg: -10 },
            ],
        };
        let bytes = encode_sv_az_el(&msg).unwrap();
        assert_eq!(decode_sv_az_el(&bytes).unwrap(), msg);
    }

    #[test]
    fn measurement_state_round_trips() {
        let msg = MeasurementState {
            entries: vec![
                MeasurementStateEntry { mesid_satellite: 5, mesid_code: 0, cn0_db_hz: 42.25 },
                MeasurementStateEntry { mesid_satellite: 12, mesid_code: 1, cn0_db_hz: 0.0 },
            ],
        };
        let bytes = encode_measurement_state(&msg).unwrap();
        assert_eq!(decode_measurement_state(&bytes).unwrap(), msg);
    }

    #[test]
    fn empty_lists_round_trip() {
        let msg = SvAzEl { entries: vec![] };
        let bytes = encode_sv_az_el(&msg).unwrap();
        assert_eq!(bytes, vec![0]);
        assert_eq!(decode_sv_az_el(&bytes).unwrap(), msg);
    }
}
