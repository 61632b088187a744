//! SBP frame locate/validate/dispatch and frame encoding (spec §4.I "SBP
//! framing").

use crate::constants::{CRC_LEN_BYTES, HEADER_LEN_BYTES, MAX_PAYLOAD_LEN, PREAMBLE};
use crate::crc16;
use crate::error::Error;

pub struct Frame<'a> {
    pub msg_type: u16,
    pub sender_id: u16,
    pub payload: &'a [u8],
}

/// Scans `buf` for the next valid SBP frame, returning `(frame,
/// bytes_consumed)`. Mirrors `rtcm3::framer::decode_frame`'s resync
/// behaviour: a CRC miss advances one byte past the failed preamble rather
/// than failing the whole stream.
pub fn decode_frame(buf: &[u8]) -> Result<(Frame<'_>, usize), Error> {
    let mut search_start = 0usize;
    loop {
        let preamble_pos = match buf[search_start..].iter().position(|&b| b == PREAMBLE) {
            Some(rel) => search_start + rel,
            None => return Err(Error::NeedMoreBytes),
        };
        let remaining = &buf[preamble_pos..];
        if remaining.len() < HEADER_LEN_BYTES + 1 {
            return Err(Error::NeedMoreBytes);
        }

        let msg_type = u16::from_le_bytes([remaining[1], remaining[2]]);
        let sender_id = u16::from_le_bytes([remaining[3], remaining[4]]);
        let length = remaining[5] as usize;
        if length > MAX_PAYLOAD_LEN {
            search_start = preamble_pos + 1;
            continue;
        }

        let frame_len = 1 + HEADER_LEN_BYTES + length + CRC_LEN_BYTES;
        if remaining.len() < frame_len {
            return Err(Error::NeedMoreBytes);
        }

        let crc_region = &remaining[1..1 + HEADER_LEN_BYTES + length];
        let computed = crc16::compute(crc_region);
        let trailer_pos = 1 + HEADER_LEN_BYTES + length;
        let trailing_crc =
            u16::from_le_bytes([remaining[trailer_pos], remaining[trailer_pos + 1]]);

        if computed != trailing_crc {
            search_start = preamble_pos + 1;
            continue;
        }

        let payload = &remaining[1 + HEADER_LEN_BYTES..1 + HEADER_LEN_BYTES + length];
        return Ok((
            Frame { msg_type, sender_id, payload },
            preamble_pos + frame_len,
        ));
    }
}

pub fn encode_frame(msg_type: u16, sender_id: u16, payload: &[u8]) -> Result<Vec<u8>, Error> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(Error::InvalidMessage("payload exceeds 255 bytes"));
    }
    let mut out = Vec::with_capacity(1 + HEADER_LEN_BYTES + payload.len() + CRC_LEN_BYTES);
    out.push(PREAMBLE);
    out.extend_from_slice(&msg_type.to_le_bytes());
    out.extend_from_slice(&sender_id.to_le_bytes());
    out.push(payload.len() as u8);
    out.extend_from_slice(payload);
    let crc = crc16::compute(&out[1..]);
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_round_trips() {
        let payload = [1u8, 2, 3, 4];
        let framed = encode_frame(0x004A, 66, &payload).unwrap();
        let (frame, consumed) = decode_frame(&framed).unwrap();
        assert_eq!(frame.msg_type, 0x004A);
        assert_eq!(frame.sender_id, 66);
        assert_eq!(frame.payload, &payload);
        assert_eq!(consumed, framed.len());
    }

    #[test]
    fn corrupted_crc_resyncs() {
        let good = encode_frame(0x0048, 1, &[9, 9]).unwrap();
        let mut corrupt = encode_frame(0x004A, 1, &[1, 1]).unwrap();
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0xFF;
        corrupt.extend_from_slice(&good);
        let (frame, _) = decode_frame(&corrupt).unwrap();
        assert_eq!(frame.msg_type, 0x0048);
    }

    #[test]
    fn truncated_frame_needs_more_bytes() {
        let framed = encode_frame(0x004A, 1, &[1, 2, 3]).unwrap();
        let err = decode_frame(&framed[..framed.len() - 1]).unwrap_err();
        assert_eq!(err, Error::NeedMoreBytes);
    }
}
