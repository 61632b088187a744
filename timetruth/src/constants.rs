pub const WEEK_SECONDS: i64 = 604_800;
pub const WEEK_MS: i64 = WEEK_SECONDS * 1000;

/// Observation-TOW acceptance window before `ObservationTimeEstimator`
/// counts a mismatch (spec §4.E estimator 1).
pub const OBSERVATION_TOLERANCE_MS: i64 = 5_000;
/// Consecutive mismatches before the observation estimator treats the new
/// TOW as a discontinuity rather than noise.
pub const OBSERVATION_MISMATCH_LIMIT: u32 = 5;

/// Ephemeris toe pool window half-width (spec §4.E estimator 2: "within
/// ±4 h of the candidate TOW").
pub const EPHEMERIS_WINDOW_MS: i64 = 4 * 3600 * 1000;
/// Window widening applied on each side once the IQR check passes.
pub const EPHEMERIS_WINDOW_WIDEN_MS: i64 = 2 * 3600 * 1000 + 30 * 60 * 1000;
/// IQR rejection threshold.
pub const EPHEMERIS_MAX_IQR_MS: i64 = 8 * 3600 * 1000;
/// Minimum toe samples (any one constellation) before an estimate is
/// attempted.
pub const EPHEMERIS_MIN_SAMPLES: usize = 6;

/// `Rtcm1013TimeEstimator`/`UbxLeapTimeEstimator` acceptance window.
pub const SINGLE_SAMPLE_TOLERANCE_MS: i64 = 60_000;

/// Cross-estimator TOW agreement tolerance used by the confidence ladder.
pub const CONFIDENCE_TOW_TOLERANCE_MS: i64 = 10_000;
/// Cross-estimator WN agreement tolerance, expressed in the same ms domain
/// as TOW so the two can share [`is_tow_ms_within_tolerance`]-style
/// wraparound logic when a candidate straddles a week boundary.
pub const CONFIDENCE_WN_TOLERANCE_MS: i64 = 6 * 3600 * 1000;
