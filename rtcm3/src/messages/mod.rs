//! Message-number dispatch: maps a frame's leading 12-bit message number to
//! the right per-family codec (spec §4.C "frame dispatch").

pub mod common;
pub mod ephemeris;
pub mod glonass_ephemeris;
pub mod msm;
pub mod observations;
pub mod proprietary;
pub mod ssr;
pub mod station;
pub mod system;

use crate::error::Error;
use common::Constellation;

/// A decoded RTCM3 payload, tagged by message family. Unrecognised but
/// well-formed message numbers decode to `Unknown` rather than erroring
/// (spec §7 `UnsupportedCode`/"unknown message number" policy: surface it,
/// don't fail the stream).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Message {
    LegacyObservation(observations::LegacyObservationMessage),
    Msm(msm::MsmMessage),
    Ephemeris(ephemeris::KeplerianEphemeris),
    GlonassEphemeris(glonass_ephemeris::GlonassEphemeris),
    AntennaReferencePoint(station::AntennaReferencePoint),
    AntennaDescriptor(station::AntennaDescriptor),
    GlonassBiases(station::GlonassBiases),
    SystemParameters(system::SystemParameters),
    UnicodeText(system::UnicodeTextMessage),
    Ssr(ssr::SsrCorrection),
    SwiftProprietary(proprietary::SwiftProprietary),
    NavigationDataFrame(proprietary::NavigationDataFrame),
    TeseoV(proprietary::TeseoV),
    Unknown { msg_num: u16, payload: Vec<u8> },
}

fn peek_msg_num(payload: &[u8]) -> Result<u16, Error> {
    if payload.len() < 2 {
        return Err(Error::InvalidMessage("payload shorter than the message number field"));
    }
    Ok(((payload[0] as u16) << 4) | (payload[1] as u16 >> 4))
}

pub fn decode(payload: &[u8]) -> Result<Message, Error> {
    let msg_num = peek_msg_num(payload)?;

    if let Some((constellation, variant)) = msm::MsmVariant::from_message_number(msg_num) {
        return Ok(Message::Msm(msm::decode(constellation, variant, payload)?));
    }
    if matches!(msg_num, 1001..=1004 | 1009..=1012) {
        return Ok(Message::LegacyObservation(observations::decode(msg_num, payload)?));
    }
    if msg_num == 1019 {
        return Ok(Message::Ephemeris(ephemeris::decode(Constellation::Gps, payload)?));
    }
    if msg_num == 1044 {
        return Ok(Message::Ephemeris(ephemeris::decode(Constellation::Qzss, payload)?));
    }
    if msg_num == 1042 {
        return Ok(Message::Ephemeris(ephemeris::decode(Constellation::BeiDou, payload)?));
    }
    if msg_num == 1045 || msg_num == 1046 {
        return Ok(Message::Ephemeris(ephemeris::decode(Constellation::Galileo, payload)?));
    }
    if msg_num == 1020 {
        return Ok(Message::GlonassEphemeris(glonass_ephemeris::decode(payload)?));
    }
    if msg_num == 1005 || msg_num == 1006 {
        return Ok(Message::AntennaReferencePoint(station::decode_antenna_reference_point(payload)?));
    }
    if msg_num == 1007 || msg_num == 1008 || msg_num == 1033 {
        return Ok(Message::AntennaDescriptor(station::decode_antenna_descriptor(msg_num, payload)?));
    }
    if msg_num == 1230 {
        return Ok(Message::GlonassBiases(station::decode_glonass_biases(payload)?));
    }
    if msg_num == 1013 {
        return Ok(Message::SystemParameters(system::decode_system_parameters(payload)?));
    }
    if msg_num == 1029 {
        return Ok(Message::UnicodeText(system::decode_unicode_text(payload)?));
    }
    if is_ssr_message(msg_num) {
        return Ok(Message::Ssr(ssr::decode(msg_num, payload)?));
    }
    if msg_num == proprietary::MSG_NUM_SWIFT {
        return Ok(Message::SwiftProprietary(proprietary::decode_swift(payload)?));
    }
    if msg_num == proprietary::MSG_NUM_NDF {
        return Ok(Message::NavigationDataFrame(proprietary::decode_ndf(payload)?));
    }
    if msg_num == proprietary::MSG_NUM_TESEOV {
        return Ok(Message::TeseoV(proprietary::decode_teseov(payload)?));
    }

    log::debug!("RTCM3 message {msg_num} has no decoder, passing through as Unknown");
    Ok(Message::Unknown { msg_num, payload: payload.to_vec() })
}

fn is_ssr_message(msg_num: u16) -> bool {
    (1057..=1068).contains(&msg_num) || (1240..=1270).contains(&msg_num)
}

pub fn encode(message: &Message) -> Result<Vec<u8>, Error> {
    match message {
        Message::LegacyObservation(m) => observations::encode(m),
        Message::Msm(m) => msm::encode(m),
        Message::Ephemeris(m) => ephemeris::encode(m),
        Message::GlonassEphemeris(m) => glonass_ephemeris::encode(m),
        Message::AntennaReferencePoint(m) => station::encode_antenna_reference_point(m),
        Message::AntennaDescriptor(m) => {
            let msg_num = if m.receiver_type_descriptor.is_some() {
                1033
            } else if m.antenna_serial_number.is_some() {
                1008
            } else {
                1007
            };
            station::encode_antenna_descriptor(msg_num, m)
        }
        Message::GlonassBiases(m) => station::encode_glonass_biases(m),
        Message::SystemParameters(m) => system::encode_system_parameters(m),
        Message::UnicodeText(m) => system::encode_unicode_text(m),
        Message::Ssr(m) => ssr::encode(m, true),
        Message::SwiftProprietary(m) => proprietary::encode_swift(m),
        Message::NavigationDataFrame(m) => proprietary::encode_ndf(m),
        Message::TeseoV(m) => proprietary::encode_teseov(m),
        Message::Unknown { payload, .. } => Ok(payload.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_message_number_passes_through() {
        let payload = vec![0b1111_1111, 0b1111_0000, 1, 2, 3];
        let decoded = decode(&payload).unwrap();
        match decoded {
            Message::Unknown { msg_num, .. } => assert_eq!(msg_num, 0xFFF),
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn short_payload_rejected() {
        let err = decode(&[0u8]).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidMessage("payload shorter than the message number field")
        );
    }
}
