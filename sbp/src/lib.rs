//! Swift Binary Protocol framing and message codecs (spec §4.I "SBP
//! packer", §6 "SBP wire format").
//!
//! Mirrors `rtcm3`'s shape: a frame layer (`framer`) that locates,
//! validates, and resyncs past bad frames, and a `messages` layer of typed
//! per-message-type codecs. This crate stays wire-faithful; epoch
//! reassembly/fragmentation across *multiple* frames lives here
//! ([`messages::observation`]) because it is purely a framing concern, but
//! cross-stream epoch matching and adjustment is `gnss_converters`'s job.

pub mod constants;
pub mod crc16;
pub mod error;
pub mod framer;
pub mod messages;

pub use error::Error;
pub use framer::{decode_frame, encode_frame, Frame};
pub use messages::{decode as decode_message, encode as encode_message, Message};
