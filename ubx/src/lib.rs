//! UBX (u-blox binary protocol) frame locate/validate/dispatch and the
//! message payloads the UBX->SBP translator consumes (spec §4.K).
//!
//! Same two-layer shape as `rtcm3`/`sbp`: [`framer`] resyncs past bad
//! frames, [`messages`] holds typed per-class/id codecs. Byte-aligned
//! throughout (UBX has no bit-packed fields), so [`reader`] is a much
//! simpler cursor than `bitstream::BitReader`.

pub mod checksum;
pub mod constants;
pub mod error;
pub mod framer;
pub mod messages;
pub mod reader;

pub use error::Error;
pub use framer::{decode_frame, encode_frame, Frame};
pub use messages::{decode as decode_message, Message};
