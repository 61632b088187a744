pub const PREAMBLE: u8 = 0xD3;
pub(crate) const RESERVED_LEN_BITS: u32 = 6;
pub(crate) const LENGTH_FIELD_BITS: u32 = 10;
pub(crate) const MAX_PAYLOAD_LEN: usize = 1023;
pub(crate) const CRC_LEN_BYTES: usize = 3;
pub(crate) const HEADER_LEN_BYTES: usize = 3; // preamble(1) + reserved(6b)+length(10b) packed into 2 bytes

pub(crate) const MSG_NUM_BITS: u32 = 12;

/// Swift proprietary envelope (wraps SBP or an RTCM sub-message).
pub const MSG_NUM_SWIFT_PROPRIETARY: u16 = 4062;
/// Navigation Data Frame (SBAS L1 C/A subframes).
pub const MSG_NUM_NDF: u16 = 4075;
/// TeseoV proprietary envelope.
pub const MSG_NUM_TESEOV: u16 = 999;

/// Cap on the number of `(sat, signal)` cells an MSM cell mask may describe.
/// The RTCM standard does not state this bound explicitly; it follows from
/// `popcount(sat_mask) <= 64` and `popcount(sig_mask) <= 32`, but a
/// corrupted frame can claim a cross product far larger than any receiver
/// emits, so decoding bounds it to protect downstream buffers (see spec §9
/// Open Questions: implementers may raise this if justified).
pub(crate) const MSM_MAX_CELLS: usize = 64;

pub(crate) const BDS_SECOND_TO_GPS_SECOND: i64 = 14;
pub(crate) const BDS_WEEK_TO_GPS_WEEK: i16 = 1356;
pub(crate) const WEEK_SECONDS: i64 = 604_800;
pub(crate) const WEEK_MS: i64 = WEEK_SECONDS * 1000;

pub(crate) const GLO_UTC_SU_OFFSET_HOURS: i64 = 3;
