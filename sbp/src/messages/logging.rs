//! MSG_LOG (0x0401): a free-text diagnostic string tagged with a syslog-style
//! severity, emitted by the translator for `UnsupportedCode`/`BufferFull`
//! conditions (spec §7) and for RTCM 1029 passthrough (spec §4.J "1029 ->
//! SBP log").

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogLevel {
    Emerg = 0,
    Alert = 1,
    Crit = 2,
    Error = 3,
    Warn = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl LogLevel {
    fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => LogLevel::Emerg,
            1 => LogLevel::Alert,
            2 => LogLevel::Crit,
            3 => LogLevel::Error,
            4 => LogLevel::Warn,
            5 => LogLevel::Notice,
            6 => LogLevel::Info,
            7 => LogLevel::Debug,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogMessage {
    pub level: LogLevel,
    pub text: String,
}

pub fn decode(payload: &[u8]) -> Result<LogMessage, Error> {
    let (level_byte, text_bytes) = payload
        .split_first()
        .ok_or(Error::InvalidMessage("log message missing level byte"))?;
    let level = LogLevel::from_u8(*level_byte)
        .ok_or(Error::InvalidMessage("log message level out of range"))?;
    let text = String::from_utf8_lossy(text_bytes).into_owned();
    Ok(LogMessage { level, text })
}

pub fn encode(msg: &LogMessage) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(1 + msg.text.len());
    out.push(msg.level as u8);
    out.extend_from_slice(msg.text.as_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let msg = LogMessage { level: LogLevel::Warn, text: "dropping signal GPS_L2CL".into() };
        let bytes = encode(&msg).unwrap();
        assert_eq!(decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn empty_payload_rejected() {
        assert!(decode(&[]).is_err());
    }
}
