//! The four per-source-per-kind estimator state machines of spec §4.E.
//! Each is a tiny, single-writer state machine; [`crate::TimeTruth`] owns
//! the pool and hands out one handle per `(source, kind)`.

use std::collections::HashMap;

use crate::constants::*;
use crate::time_util::{get_quartile_indices, is_tow_ms_within_tolerance, quartile_value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Constellation {
    Gps,
    Glonass,
    Galileo,
    BeiDou,
    Qzss,
}

/// Estimator 1: the latest accepted observation TOW, with a mismatch
/// counter that triggers a jump on a sustained discontinuity.
#[derive(Debug, Default)]
pub struct ObservationTimeEstimator {
    latest_tow_ms: Option<i64>,
    mismatch_count: u32,
}

impl ObservationTimeEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tow_ms: i64) {
        match self.latest_tow_ms {
            None => self.latest_tow_ms = Some(tow_ms),
            Some(latest) => {
                if is_tow_ms_within_tolerance(tow_ms, latest, OBSERVATION_TOLERANCE_MS) {
                    self.latest_tow_ms = Some(tow_ms);
                    self.mismatch_count = 0;
                } else {
                    self.mismatch_count += 1;
                    if self.mismatch_count >= OBSERVATION_MISMATCH_LIMIT {
                        log::debug!("ObservationTimeEstimator: TOW discontinuity detected, jumping to {tow_ms}");
                        self.latest_tow_ms = Some(tow_ms);
                        self.mismatch_count = 0;
                    }
                }
            }
        }
    }

    pub fn estimate(&self) -> Option<i64> {
        self.latest_tow_ms
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Estimator 2: per-constellation, most-recent toe per satellite, used to
/// resolve a candidate TOW into an absolute week number by clustering toe
/// values that land within a tolerance window.
#[derive(Debug, Default)]
pub struct EphemerisTimeEstimator {
    per_constellation: HashMap<Constellation, HashMap<u8, i64>>,
}

impl EphemerisTimeEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the most recent toe for `(constellation, sat_id)` as an
    /// absolute millisecond value (`wn * WEEK_MS + toe_tow_s * 1000`).
    pub fn push(&mut self, constellation: Constellation, sat_id: u8, absolute_toe_ms: i64) {
        self.per_constellation
            .entry(constellation)
            .or_default()
            .insert(sat_id, absolute_toe_ms);
    }

    pub fn reset(&mut self) {
        self.per_constellation.clear();
    }

    /// Resolves `candidate_tow_ms` into an absolute `(week, tow_ms)` pair,
    /// or `None` if there isn't enough corroborating ephemeris data yet
    /// (spec §4.E estimator 2).
    pub fn get_estimate(&self, candidate_tow_ms: i64) -> Option<(i32, i64)> {
        let has_enough = self
            .per_constellation
            .values()
            .any(|sats| sats.len() >= EPHEMERIS_MIN_SAMPLES);
        if !has_enough {
            return None;
        }

        let mut pool: Vec<i64> = self
            .per_constellation
            .values()
            .flat_map(|sats| sats.values().copied())
            .filter(|&abs_ms| {
                let tow_component = abs_ms.rem_euclid(WEEK_MS);
                is_tow_ms_within_tolerance(tow_component, candidate_tow_ms, EPHEMERIS_WINDOW_MS)
            })
            .collect();

        if pool.len() < 2 {
            return None;
        }
        pool.sort_unstable();

        let (lower_pair, upper_pair) = get_quartile_indices(pool.len());
        let q1 = quartile_value(&pool, lower_pair);
        let q3 = quartile_value(&pool, upper_pair);
        let iqr = q3 - q1;
        if iqr > EPHEMERIS_MAX_IQR_MS as f64 {
            return None;
        }

        let window_lo = q1 - EPHEMERIS_WINDOW_WIDEN_MS as f64;
        let window_hi = q3 + EPHEMERIS_WINDOW_WIDEN_MS as f64;

        let wn_lo = ((window_lo - candidate_tow_ms as f64) / WEEK_MS as f64).ceil() as i32;
        let wn_hi = ((window_hi - candidate_tow_ms as f64) / WEEK_MS as f64).floor() as i32;
        if wn_lo > wn_hi {
            return None;
        }
        // Prefer the lower week number when more than one brackets the window.
        Some((wn_lo.min(wn_hi), candidate_tow_ms))
    }
}

/// Estimators 3/4: a single `(week, tow, leap_seconds)` sample, accepted
/// only when it is still close (in TOW) to the query's candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleSampleTimeEstimator {
    sample: Option<(i32, i64, u8)>,
}

impl SingleSampleTimeEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, week: i32, tow_ms: i64, leap_seconds: u8) {
        self.sample = Some((week, tow_ms, leap_seconds));
    }

    pub fn reset(&mut self) {
        self.sample = None;
    }

    pub fn get_estimate(&self, candidate_tow_ms: i64) -> Option<(i32, i64, u8)> {
        self.sample.filter(|(_, tow_ms, _)| {
            is_tow_ms_within_tolerance(*tow_ms, candidate_tow_ms, SINGLE_SAMPLE_TOLERANCE_MS)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_estimator_accepts_small_drift() {
        let mut est = ObservationTimeEstimator::new();
        est.push(100_000);
        est.push(101_000);
        assert_eq!(est.estimate(), Some(101_000));
    }

    #[test]
    fn observation_estimator_jumps_after_five_mismatches() {
        let mut est = ObservationTimeEstimator::new();
        est.push(100_000);
        for _ in 0..4 {
            est.push(500_000); // far outside tolerance
        }
        assert_eq!(est.estimate(), Some(100_000), "should not jump before the 5th mismatch");
        est.push(500_000);
        assert_eq!(est.estimate(), Some(500_000), "should jump on the 5th consecutive mismatch");
    }

    #[test]
    fn ephemeris_estimator_needs_six_samples() {
        let mut est = EphemerisTimeEstimator::new();
        for sat in 0..5u8 {
            est.push(Constellation::Gps, sat, 2200 * WEEK_MS + 300_000);
        }
        assert_eq!(est.get_estimate(300_000), None);
        est.push(Constellation::Gps, 5, 2200 * WEEK_MS + 300_000);
        assert!(est.get_estimate(300_000).is_some());
    }

    #[test]
    fn single_sample_estimator_rejects_stale_candidate() {
        let mut est = SingleSampleTimeEstimator::new();
        est.push(2200, 300_000, 18);
        assert!(est.get_estimate(300_000).is_some());
        assert_eq!(est.get_estimate(300_000 + SINGLE_SAMPLE_TOLERANCE_MS + 1), None);
    }
}
