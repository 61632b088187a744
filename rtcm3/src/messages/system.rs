//! System parameter messages: 1013 (system parameters, broadcast schedule)
//! and 1029 (Unicode text string) (spec §3 "System parameters", §4.D
//! "1013/1029").

use crate::error::Error;
use bitstream::{BitReader, BitWriter};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BroadcastMessageEntry {
    pub message_number: u16,
    pub message_interval_s: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemParameters {
    pub station_id: u16,
    pub modified_julian_day: u16,
    pub seconds_of_day: u32,
    pub leap_second_count: u8,
    pub entries: Vec<BroadcastMessageEntry>,
}

const MSG_NUM_1013: u16 = 1013;
const INTERVAL_SCALE: f64 = 0.1;

pub fn decode_system_parameters(payload: &[u8]) -> Result<SystemParameters, Error> {
    let mut r = BitReader::new(payload);
    let got = r.u(12)? as u16;
    if got != MSG_NUM_1013 {
        return Err(Error::MessageTypeMismatch { expected: MSG_NUM_1013, got });
    }
    let station_id = r.u(12)? as u16;
    let modified_julian_day = r.u(16)? as u16;
    let seconds_of_day = r.u(17)? as u32;
    // DF053 "number of messages": a receiver that has nothing scheduled
    // sends this zero, not the lowest-count sentinel the wire width would
    // otherwise suggest -- decoders must not treat zero as "unknown" (spec
    // §9 Open Questions).
    let num_messages = r.u(5)? as usize;
    let leap_second_count = r.u(8)? as u8;

    let mut entries = Vec::with_capacity(num_messages);
    for _ in 0..num_messages {
        let message_number = r.u(12)? as u16;
        let _sync_flag = r.u(1)?;
        let interval_code = r.u(16)? as u32;
        entries.push(BroadcastMessageEntry {
            message_number,
            message_interval_s: interval_code as f64 * INTERVAL_SCALE,
        });
    }

    Ok(SystemParameters {
        station_id,
        modified_julian_day,
        seconds_of_day,
        leap_second_count,
        entries,
    })
}

pub fn encode_system_parameters(params: &SystemParameters) -> Result<Vec<u8>, Error> {
    let mut w = BitWriter::new();
    w.u(MSG_NUM_1013 as u64, 12)?;
    w.u(params.station_id as u64, 12)?;
    w.u(params.modified_julian_day as u64, 16)?;
    w.u(params.seconds_of_day as u64, 17)?;
    w.u(params.entries.len() as u64, 5)?;
    w.u(params.leap_second_count as u64, 8)?;
    for entry in &params.entries {
        w.u(entry.message_number as u64, 12)?;
        w.u(1, 1)?; // synchronous by default
        w.u((entry.message_interval_s / INTERVAL_SCALE).round() as u64, 16)?;
    }
    Ok(w.into_bytes())
}

/// 1029: a free-text Unicode message tied to a station and UTC-ish
/// timestamp. The wire carries two independent counts here -- the number of
/// UTF-8 *characters* (DF138) and the number of UTF-8 *code units/bytes*
/// (DF140) -- and they differ for any non-ASCII text; callers must trust
/// the byte count for framing and the character count only for display
/// (spec §9 supplemented feature, grounded in `original_source/`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnicodeTextMessage {
    pub station_id: u16,
    pub modified_julian_day: u16,
    pub seconds_of_day: u32,
    pub text: String,
}

const MSG_NUM_1029: u16 = 1029;

pub fn decode_unicode_text(payload: &[u8]) -> Result<UnicodeTextMessage, Error> {
    let mut r = BitReader::new(payload);
    let got = r.u(12)? as u16;
    if got != MSG_NUM_1029 {
        return Err(Error::MessageTypeMismatch { expected: MSG_NUM_1029, got });
    }
    let station_id = r.u(12)? as u16;
    let modified_julian_day = r.u(16)? as u16;
    let seconds_of_day = r.u(17)? as u32;
    let _char_count = r.u(7)?; // DF138, informational only; not used for framing
    let byte_count = r.u(8)? as usize;
    let bytes = r.bytes(byte_count)?;
    let text = String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::InvalidMessage("1029 text is not valid UTF-8"))?;

    Ok(UnicodeTextMessage {
        station_id,
        modified_julian_day,
        seconds_of_day,
        text,
    })
}

pub fn encode_unicode_text(msg: &UnicodeTextMessage) -> Result<Vec<u8>, Error> {
    let mut w = BitWriter::new();
    w.u(MSG_NUM_1029 as u64, 12)?;
    w.u(msg.station_id as u64, 12)?;
    w.u(msg.modified_julian_day as u64, 16)?;
    w.u(msg.seconds_of_day as u64, 17)?;
    let char_count = msg.text.chars().count().min(127);
    let byte_count = msg.text.len().min(255);
    w.u(char_count as u64, 7)?;
    w.u(byte_count as u64, 8)?;
    w.bytes(&msg.text.as_bytes()[..byte_count])?;
    Ok(w.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_schedule_round_trips_with_zero_count() {
        let params = SystemParameters {
            station_id: 4,
            modified_julian_day: 59_000,
            seconds_of_day: 12_345,
            leap_second_count: 18,
            entries: vec![],
        };
        let bytes = encode_system_parameters(&params).unwrap();
        let decoded = decode_system_parameters(&bytes).unwrap();
        assert!(decoded.entries.is_empty());
        assert_eq!(decoded.leap_second_count, 18);
    }

    #[test]
    fn schedule_entries_round_trip() {
        let params = SystemParameters {
            station_id: 4,
            modified_julian_day: 59_000,
            seconds_of_day: 12_345,
            leap_second_count: 18,
            entries: vec![
                BroadcastMessageEntry { message_number: 1005, message_interval_s: 10.0 },
                BroadcastMessageEntry { message_number: 1074, message_interval_s: 1.0 },
            ],
        };
        let bytes = encode_system_parameters(&params).unwrap();
        let decoded = decode_system_parameters(&bytes).unwrap();
        assert_eq!(decoded.entries.len(), 2);
        assert_eq!(decoded.entries[1].message_number, 1074);
    }

    #[test]
    fn unicode_text_byte_count_differs_from_char_count() {
        let msg = UnicodeTextMessage {
            station_id: 1,
            modified_julian_day: 59_000,
            seconds_of_day: 0,
            text: "Base \u{00e9}t\u{00e9}".to_string(),
        };
        let bytes = encode_unicode_text(&msg).unwrap();
        let decoded = decode_unicode_text(&bytes).unwrap();
        assert_eq!(decoded.text, msg.text);
        assert_ne!(msg.text.chars().count(), msg.text.len());
    }

    #[test]
    fn invalid_utf8_rejected() {
        let mut w = BitWriter::new();
        w.u(MSG_NUM_1029 as u64, 12).unwrap();
        w.u(1, 12).unwrap();
        w.u(0, 16).unwrap();
        w.u(0, 17).unwrap();
        w.u(1, 7).unwrap();
        w.u(1, 8).unwrap();
        w.bytes(&[0xFF]).unwrap();
        let err = decode_unicode_text(&w.into_bytes()).unwrap_err();
        assert_eq!(err, Error::InvalidMessage("1029 text is not valid UTF-8"));
    }
}
