//! RTCM3 frame locate/validate/dispatch (spec §4.C) and frame encoding.

use crate::constants::{CRC_LEN_BYTES, MAX_PAYLOAD_LEN, PREAMBLE};
use crate::error::Error;
use bitstream::crc24q;

/// A located, CRC-verified RTCM3 frame: the 6 reserved bits (echoed by
/// encoders, otherwise unconstrained) and the payload bytes.
pub struct Frame<'a> {
    pub reserved: u8,
    pub payload: &'a [u8],
}

/// Scans `buf` for the next valid RTCM3 frame.
///
/// Returns `(frame, bytes_consumed)` on success. `bytes_consumed` is the
/// number of bytes the caller should drop from the front of its buffer
/// before the next call, which always includes the frame itself and any
/// garbage bytes skipped before it.
///
/// Preamble miss, length-bounds miss, and CRC miss are all recoverable: on
/// `CrcMismatch`/certain `InvalidMessage`s the caller should retry
/// `decode_frame` starting one byte past the failed preamble, exactly as
/// this function does internally when it must resync mid-scan.
pub fn decode_frame(buf: &[u8]) -> Result<(Frame<'_>, usize), Error> {
    let mut search_start = 0usize;
    loop {
        let preamble_pos = match buf[search_start..].iter().position(|&b| b == PREAMBLE) {
            Some(rel) => search_start + rel,
            None => return Err(Error::NeedMoreBytes),
        };

        let remaining = &buf[preamble_pos..];
        if remaining.len() < 3 {
            return Err(Error::NeedMoreBytes);
        }

        let reserved = (remaining[1] >> 2) & 0x3F;
        let length = (((remaining[1] & 0x03) as usize) << 8) | remaining[2] as usize;

        if length > MAX_PAYLOAD_LEN {
            // Cannot possibly be a valid frame at this position; resync.
            search_start = preamble_pos + 1;
            continue;
        }

        let frame_len = 3 + length + CRC_LEN_BYTES;
        if remaining.len() < frame_len {
            return Err(Error::NeedMoreBytes);
        }

        let crc_bytes = &remaining[3 + length..frame_len];
        let trailing_crc =
            ((crc_bytes[0] as u32) << 16) | ((crc_bytes[1] as u32) << 8) | crc_bytes[2] as u32;
        let computed = crc24q::compute(&remaining[..3 + length]);

        if computed != trailing_crc {
            search_start = preamble_pos + 1;
            continue;
        }

        let payload = &remaining[3..3 + length];
        return Ok((
            Frame { reserved, payload },
            preamble_pos + frame_len,
        ));
    }
}

/// Encodes `payload` (the message-number-prefixed RTCM3 payload body
/// produced by a message codec) into a complete framed byte sequence, with
/// `reserved` placed in the 6 reserved bits after the preamble.
pub fn encode_frame(payload: &[u8], reserved: u8) -> Result<Vec<u8>, Error> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(Error::InvalidMessage("payload exceeds 1023 bytes"));
    }
    let mut out = Vec::with_capacity(3 + payload.len() + CRC_LEN_BYTES);
    out.push(PREAMBLE);
    let length = payload.len() as u16;
    out.push(((reserved & 0x3F) << 2) | ((length >> 8) as u8 & 0x03));
    out.push((length & 0xFF) as u8);
    out.extend_from_slice(payload);
    let crc = crc24q::compute(&out);
    out.push((crc >> 16) as u8);
    out.push((crc >> 8) as u8);
    out.push(crc as u8);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_round_trips() {
        let payload = [0x3Fu8, 0x01, 0x02, 0x03, 0x04];
        let framed = encode_frame(&payload, 0).unwrap();
        let (frame, consumed) = decode_frame(&framed).unwrap();
        assert_eq!(frame.payload, &payload);
        assert_eq!(consumed, framed.len());
    }

    #[test]
    fn garbage_before_preamble_is_skipped() {
        let payload = [0xAAu8, 0xBB];
        let framed = encode_frame(&payload, 0).unwrap();
        let mut buf = vec![0x00, 0x11, 0x22];
        buf.extend_from_slice(&framed);
        let (frame, consumed) = decode_frame(&buf).unwrap();
        assert_eq!(frame.payload, &payload);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn corrupted_crc_resyncs_to_next_preamble() {
        let payload = [0x01u8, 0x02, 0x03];
        let mut framed = encode_frame(&payload, 0).unwrap();
        let last = framed.len() - 1;
        framed[last] ^= 0xFF; // corrupt CRC

        let good_payload = [0xDEu8, 0xAD];
        let good = encode_frame(&good_payload, 0).unwrap();
        framed.extend_from_slice(&good);

        let (frame, _consumed) = decode_frame(&framed).unwrap();
        assert_eq!(frame.payload, &good_payload);
    }

    #[test]
    fn truncated_frame_needs_more_bytes() {
        let payload = [0x01u8; 10];
        let framed = encode_frame(&payload, 0).unwrap();
        let err = decode_frame(&framed[..framed.len() - 1]).unwrap_err();
        assert_eq!(err, Error::NeedMoreBytes);
    }
}
