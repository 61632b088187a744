//! UBX frame locate/validate/dispatch (spec §4.K: "sync `0xB5 0x62`, 1-byte
//! class, 1-byte id, 2-byte LE length, payload, 2-byte Fletcher-like
//! checksum"). Mirrors `rtcm3::framer`'s resync-on-failure shape.

use crate::checksum;
use crate::constants::*;
use crate::error::Error;

pub struct Frame<'a> {
    pub class: u8,
    pub id: u8,
    pub payload: &'a [u8],
}

/// Scans `buf` for the next valid UBX frame, returning `(frame,
/// bytes_consumed)`. A checksum miss resyncs one byte past the failed sync,
/// same policy as `rtcm3`/`sbp`.
pub fn decode_frame(buf: &[u8]) -> Result<(Frame<'_>, usize), Error> {
    let mut search_start = 0usize;
    loop {
        let sync_pos = find_sync(&buf[search_start..]).map(|p| search_start + p);
        let sync_pos = match sync_pos {
            Some(p) => p,
            None => return Err(Error::NeedMoreBytes),
        };
        let remaining = &buf[sync_pos..];
        if remaining.len() < HEADER_LEN {
            return Err(Error::NeedMoreBytes);
        }

        let class = remaining[CLASS_OFFSET];
        let id = remaining[ID_OFFSET];
        let length =
            u16::from_le_bytes([remaining[LENGTH_OFFSET], remaining[LENGTH_OFFSET + 1]]) as usize;

        let frame_len = HEADER_LEN + length + CHECKSUM_LEN;
        if remaining.len() < frame_len {
            return Err(Error::NeedMoreBytes);
        }

        let (computed_a, computed_b) = checksum::compute(&remaining[CLASS_OFFSET..PAYLOAD_OFFSET + length]);
        let recv_a = remaining[PAYLOAD_OFFSET + length];
        let recv_b = remaining[PAYLOAD_OFFSET + length + 1];

        if computed_a != recv_a || computed_b != recv_b {
            search_start = sync_pos + 1;
            continue;
        }

        let payload = &remaining[PAYLOAD_OFFSET..PAYLOAD_OFFSET + length];
        return Ok((Frame { class, id, payload }, sync_pos + frame_len));
    }
}

fn find_sync(buf: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i + 1 < buf.len() {
        if buf[i] == SYNC_CHAR_1 && buf[i + 1] == SYNC_CHAR_2 {
            return Some(i);
        }
        i += 1;
    }
    None
}

pub fn encode_frame(class: u8, id: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + CHECKSUM_LEN);
    out.push(SYNC_CHAR_1);
    out.push(SYNC_CHAR_2);
    out.push(class);
    out.push(id);
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(payload);
    let (ck_a, ck_b) = checksum::compute(&out[CLASS_OFFSET..]);
    out.push(ck_a);
    out.push(ck_b);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_round_trips() {
        let framed = encode_frame(CLASS_NAV, ID_NAV_STATUS, &[1, 2, 3, 4]);
        let (frame, consumed) = decode_frame(&framed).unwrap();
        assert_eq!(frame.class, CLASS_NAV);
        assert_eq!(frame.id, ID_NAV_STATUS);
        assert_eq!(frame.payload, &[1, 2, 3, 4]);
        assert_eq!(consumed, framed.len());
    }

    #[test]
    fn corrupted_checksum_resyncs() {
        let good = encode_frame(CLASS_NAV, ID_NAV_STATUS, &[9, 9]);
        let mut corrupt = encode_frame(CLASS_RXM, ID_RXM_RAWX, &[1, 1]);
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0xFF;
        corrupt.extend_from_slice(&good);
        let (frame, _) = decode_frame(&corrupt).unwrap();
        assert_eq!(frame.class, CLASS_NAV);
        assert_eq!(frame.id, ID_NAV_STATUS);
    }

    #[test]
    fn truncated_frame_needs_more_bytes() {
        let framed = encode_frame(CLASS_NAV, ID_NAV_STATUS, &[1, 2, 3]);
        let err = decode_frame(&framed[..framed.len() - 1]).unwrap_err();
        assert_eq!(err, Error::NeedMoreBytes);
    }
}
