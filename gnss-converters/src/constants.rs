//! Magic numbers the translator layer needs that don't belong to any one
//! wire format (spec §4.J/§4.K translation policy constants).

/// After any MSM message from a station, legacy (pre-MSM) observations
/// from the same station are suppressed for this long (spec §4.J:
/// "gated by a 5-second lock-out after any MSM message from the same
/// station").
pub const MSM_LEGACY_LOCKOUT_MS: u32 = 5_000;

/// GPS week length in milliseconds, used when comparing epoch timestamps
/// that may straddle a week boundary.
pub const WEEK_MS: i64 = 604_800_000;
