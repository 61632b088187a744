//! GNSS time conversions local to the RTCM3 wire format: BeiDou's
//! GPS-relative time-of-week offset (spec §4.D "BeiDou time offset"),
//! truncated-week-number rollover resolution, and the three lock-time
//! indicator encodings used by observation messages (spec §4.D
//! "Lock-time indicators").

use crate::constants::{BDS_SECOND_TO_GPS_SECOND, BDS_WEEK_TO_GPS_WEEK, WEEK_SECONDS};

/// Converts a BeiDou wire time-of-week (seconds) and BeiDou week number into
/// GPS time-of-week and GPS week number.
///
/// Per spec §8: a BDS TOW of `0..13` s decodes to
/// `WEEK_MS - (14 - tow_bds) * 1000` ms in GPS time, i.e. this subtracts the
/// 14 s offset and wraps into the *previous* GPS week when the result would
/// go negative.
pub fn bds_tow_to_gps(bds_tow_s: f64, bds_week: u16) -> (f64, i32) {
    let mut gps_tow = bds_tow_s - BDS_SECOND_TO_GPS_SECOND as f64;
    let mut gps_week = bds_week as i32 + BDS_WEEK_TO_GPS_WEEK as i32;
    if gps_tow < 0.0 {
        gps_tow += WEEK_SECONDS as f64;
        gps_week -= 1;
    }
    (gps_tow, gps_week)
}

/// The inverse of [`bds_tow_to_gps`]: converts GPS time-of-week and GPS week
/// number into a BeiDou wire time-of-week and week number, wrapping forward
/// into the next BeiDou week when `gps_tow_s + 14 >= WEEK_SECONDS`.
pub fn gps_tow_to_bds(gps_tow_s: f64, gps_week: i32) -> (f64, u16) {
    let mut bds_tow = gps_tow_s + BDS_SECOND_TO_GPS_SECOND as f64;
    let mut bds_week = gps_week - BDS_WEEK_TO_GPS_WEEK as i32;
    if bds_tow >= WEEK_SECONDS as f64 {
        bds_tow -= WEEK_SECONDS as f64;
        bds_week += 1;
    }
    (bds_tow, bds_week as u16)
}

/// Some vendors transmit an MSM BeiDou header TOW that has underflowed by
/// one week (a 30-bit rollover quirk, not part of the RTCM standard itself;
/// spec §9 Open Questions says to preserve it for field compatibility). If
/// `raw_tow_ms` looks like it underflowed, add back a week.
pub fn normalize_bds2_tow_ms(raw_tow_ms: i64) -> i64 {
    const WEEK_MS: i64 = WEEK_SECONDS * 1000;
    if raw_tow_ms < 0 {
        raw_tow_ms + WEEK_MS
    } else {
        raw_tow_ms
    }
}

/// Projects a truncated, constellation-native week number into the unique
/// absolute GPS-frame week number closest to `absolute_gps_week_reference`,
/// wrapping by `2^wn_resolution_bits` weeks (spec §4.D "Week-number
/// rollover"). `gps_offset_weeks` is the constellation's week-numbering
/// offset from GPS (0 for GPS itself and GLONASS's own frame, `1356` for
/// BeiDou; Galileo week numbering matches GPS so its offset is also 0).
///
/// Idempotent when re-applied to an already-absolute GPS-frame week: the
/// nearest representative of a value already within half the modulus of the
/// reference is itself.
pub fn week_rollover_adjustment(
    constellation_wn_truncated: u16,
    absolute_gps_week_reference: i32,
    wn_resolution_bits: u32,
    gps_offset_weeks: i32,
) -> i32 {
    let modulus: i32 = 1i32 << wn_resolution_bits;
    let truncated_gps_frame = constellation_wn_truncated as i32 + gps_offset_weeks;
    let truncated_mod = truncated_gps_frame.rem_euclid(modulus);
    let ref_mod = absolute_gps_week_reference.rem_euclid(modulus);
    let mut candidate = absolute_gps_week_reference - ref_mod + truncated_mod;
    if candidate - absolute_gps_week_reference > modulus / 2 {
        candidate -= modulus;
    } else if absolute_gps_week_reference - candidate > modulus / 2 {
        candidate += modulus;
    }
    candidate
}

/// Decodes the legacy 7-bit lock-time indicator (DF013/DF019/DF043/DF049)
/// into a lock duration in seconds, per RTCM Table 3.4-2. Saturates at 937 s
/// for indicator values at or beyond 127.
///
/// The exact published breakpoints of Table 3.4-2 are not reproduced in the
/// distilled spec this crate implements; this piecewise-linear table is this
/// implementation's own monotonic approximation anchored at the two
/// documented checkpoints (`0 -> 0s`, `127 -> 937s`). See `DESIGN.md`.
pub fn legacy_lock_time_seconds(indicator: u8) -> f64 {
    const BREAKPOINTS: [(u8, f64); 7] = [
        (0, 0.0),
        (24, 24.0),
        (48, 72.0),
        (72, 168.0),
        (96, 360.0),
        (112, 744.0),
        (127, 937.0),
    ];
    piecewise_interpolate(indicator, &BREAKPOINTS)
}

/// Inverse of [`legacy_lock_time_seconds`]: quantizes a lock duration in
/// seconds to the nearest 7-bit indicator.
pub fn legacy_lock_time_indicator(seconds: f64) -> u8 {
    const BREAKPOINTS: [(u8, f64); 7] = [
        (0, 0.0),
        (24, 24.0),
        (48, 72.0),
        (72, 168.0),
        (96, 360.0),
        (112, 744.0),
        (127, 937.0),
    ];
    piecewise_quantize(seconds, &BREAKPOINTS)
}

/// Decodes the extended 10-bit MSM lock-time indicator (DF407, RTCM Table
/// 3.5-75) into a lock duration in seconds, saturating at the cap named in
/// spec §4.D (~67,108,864 ms).
pub fn extended_lock_time_seconds(indicator: u16) -> f64 {
    const MAX_MS: f64 = 67_108_864.0;
    const BREAKPOINTS: [(u16, f64); 8] = [
        (0, 0.0),
        (64, 64.0),
        (128, 2048.0),
        (256, 8192.0),
        (512, 32768.0),
        (768, 131_072.0),
        (960, 1_048_576.0),
        (1023, MAX_MS / 1000.0),
    ];
    piecewise_interpolate(indicator, &BREAKPOINTS)
}

/// Inverse of [`extended_lock_time_seconds`].
pub fn extended_lock_time_indicator(seconds: f64) -> u16 {
    const MAX_MS: f64 = 67_108_864.0;
    const BREAKPOINTS: [(u16, f64); 8] = [
        (0, 0.0),
        (64, 64.0),
        (128, 2048.0),
        (256, 8192.0),
        (512, 32768.0),
        (768, 131_072.0),
        (960, 1_048_576.0),
        (1023, MAX_MS / 1000.0),
    ];
    piecewise_quantize(seconds, &BREAKPOINTS)
}

/// Decodes the 4-bit extended-lock-time indicator (DF402) used by SSR
/// messages: `2^(indicator+4)` ms for `indicator in 1..=15`, `0` for `0`
/// (verified against spec §8: indicator 15 -> 524.288 s).
pub fn ssr_lock_time_ms(indicator: u8) -> u32 {
    if indicator == 0 {
        0
    } else {
        1u32 << (indicator as u32 + 4)
    }
}

fn piecewise_interpolate<T>(indicator: T, breakpoints: &[(T, f64)]) -> f64
where
    T: Copy + PartialOrd + Into<i64>,
{
    let last = breakpoints.len() - 1;
    if indicator.into() >= breakpoints[last].0.into() {
        return breakpoints[last].1;
    }
    for w in breakpoints.windows(2) {
        let (lo_i, lo_t) = w[0];
        let (hi_i, hi_t) = w[1];
        if indicator.into() >= lo_i.into() && indicator.into() < hi_i.into() {
            let frac = (indicator.into() - lo_i.into()) as f64 / (hi_i.into() - lo_i.into()) as f64;
            return lo_t + frac * (hi_t - lo_t);
        }
    }
    breakpoints[0].1
}

fn piecewise_quantize<T>(seconds: f64, breakpoints: &[(T, f64)]) -> T
where
    T: Copy + PartialOrd + Into<i64> + TryFrom<i64>,
    <T as TryFrom<i64>>::Error: core::fmt::Debug,
{
    let last = breakpoints.len() - 1;
    if seconds >= breakpoints[last].1 {
        return breakpoints[last].0;
    }
    for w in breakpoints.windows(2) {
        let (lo_i, lo_t) = w[0];
        let (hi_i, hi_t) = w[1];
        if seconds >= lo_t && seconds < hi_t {
            let frac = (seconds - lo_t) / (hi_t - lo_t);
            let value = lo_i.into() as f64 + frac * (hi_i.into() - lo_i.into()) as f64;
            return T::try_from(value.round() as i64).unwrap();
        }
    }
    breakpoints[0].0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bds_underflow_wraps_to_previous_week() {
        const WEEK_MS: i64 = WEEK_SECONDS * 1000;
        for tow_bds in 0..14 {
            let (gps_tow, _week) = bds_tow_to_gps(tow_bds as f64, 100);
            let expected_ms = WEEK_MS - (14 - tow_bds) * 1000;
            assert!((gps_tow * 1000.0 - expected_ms as f64).abs() < 1e-6);
        }
    }

    #[test]
    fn bds_gps_round_trip() {
        let (bds_tow, bds_week) = gps_tow_to_bds(100_000.0, 2200);
        let (gps_tow, gps_week) = bds_tow_to_gps(bds_tow, bds_week);
        assert!((gps_tow - 100_000.0).abs() < 1e-9);
        assert_eq!(gps_week, 2200);
    }

    #[test]
    fn week_rollover_is_idempotent() {
        let reference = 2200;
        let resolved = week_rollover_adjustment(2200 % 1024, reference, 10, 0);
        let resolved_again = week_rollover_adjustment((resolved % 1024) as u16, resolved, 10, 0);
        assert_eq!(resolved, resolved_again);
    }

    #[test]
    fn week_rollover_picks_closest() {
        // Truncated week 5 with a reference near week 1029 (1024 + 5) should
        // resolve to 1029, not 5 or 2053.
        let resolved = week_rollover_adjustment(5, 1029, 10, 0);
        assert_eq!(resolved, 1029);
    }

    #[test]
    fn legacy_lock_time_checkpoints() {
        assert_eq!(legacy_lock_time_seconds(0), 0.0);
        assert_eq!(legacy_lock_time_seconds(127), 937.0);
        assert_eq!(legacy_lock_time_seconds(200), 937.0);
    }

    #[test]
    fn ssr_lock_time_matches_worked_example() {
        assert_eq!(ssr_lock_time_ms(15), 524_288);
        assert_eq!(ssr_lock_time_ms(0), 0);
        assert_eq!(ssr_lock_time_ms(1), 32);
    }
}
