//! RTCM 10403.x bit-level codec: frame locate/validate/dispatch, CRC24Q
//! framing, and the message-family decoders under [`messages`].
//!
//! This crate stays wire-faithful: it does not resolve ambiguous week
//! numbers against wall-clock time (see `timetruth`) and does not
//! canonicalise observation codes across constellations (see
//! `gnss_converters::unpacker`). It only turns bytes into typed records and
//! back.

pub mod constants;
pub mod error;
pub mod framer;
pub mod messages;
pub mod time;

pub use error::Error;
pub use framer::{decode_frame, encode_frame, Frame};
pub use messages::{decode as decode_message, encode as encode_message, Message};
