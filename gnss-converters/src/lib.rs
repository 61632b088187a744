//! Epoch matching, adjustment, and bidirectional RTCM3/SBP/UBX message
//! translation (spec §4.F-§4.K): the "main" crate of the workspace, tying
//! together `bitstream`, `rtcm3`, `sbp`, `ubx`, and `timetruth`.
//!
//! Pipeline shape (spec §2 "Data flow"):
//!
//! ```text
//! bytes -> framer -> typed record -> translator -> framed output bytes
//! ```
//!
//! with the VRS pipeline running `decode -> unpacker -> matcher -> adjuster
//! -> encode` across three SBP streams (a base station's raw observations,
//! that base's correction stream, and a virtual reference station's
//! correction stream).

pub mod adjuster;
pub mod codes;
pub mod constants;
pub mod epoch;
pub mod error;
pub mod matcher;
pub mod sbas;
pub mod teseov;
pub mod translator;
pub mod unpacker;

pub use adjuster::adjust;
pub use epoch::{CanonicalObservation, Epoch};
pub use error::Error;
pub use matcher::{MatchedEpoch, MessageMatcher, StreamKind};
pub use translator::rtcm_sbp::{ObservationOutputMode, RtcmToSbp, SbpToRtcm};
pub use translator::ubx_sbp::UbxToSbp;
pub use translator::SbpSink;
pub use unpacker::ObservationUnpacker;
