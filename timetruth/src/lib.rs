//! TimeTruth: resolves absolute GPS time (week number, time-of-week, leap
//! seconds) from several imperfect sources, none of which carries complete
//! absolute time on its own (spec §4.E).
//!
//! Concurrency model (spec §5): many producer threads push into their own
//! dedicated estimator; one consumer thread queries. Each estimator is
//! reachable only through the [`EstimatorHandle`] returned by
//! [`TimeTruth::request_estimator`], and a second request for the same
//! `(source, kind)` pair fails rather than handing out a second writer.
//! Pushes take only the per-estimator mutex; a query takes every
//! estimator's mutex in turn to build its snapshot, so it never observes a
//! torn write, modelling the "atomic publication" spec §5/§9 describe as a
//! seqlock-style snapshot (see `DESIGN.md` for why a plain `Mutex` stands
//! in for that here).

pub mod cache;
pub mod confidence;
pub mod constants;
pub mod error;
pub mod estimators;
pub mod time_util;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub use cache::TimeTruthCache;
pub use confidence::Confidence;
pub use error::Error;
pub use estimators::Constellation;
use estimators::{EphemerisTimeEstimator, ObservationTimeEstimator, SingleSampleTimeEstimator};
use time_util::is_tow_ms_within_tolerance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeTruthSource {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EstimatorKind {
    Observation,
    Ephemeris,
    Rtcm1013,
    UbxLeap,
}

enum EstimatorState {
    Observation(ObservationTimeEstimator),
    Ephemeris(EphemerisTimeEstimator),
    Rtcm1013(SingleSampleTimeEstimator),
    UbxLeap(SingleSampleTimeEstimator),
}

impl EstimatorState {
    fn new(kind: EstimatorKind) -> Self {
        match kind {
            EstimatorKind::Observation => EstimatorState::Observation(ObservationTimeEstimator::new()),
            EstimatorKind::Ephemeris => EstimatorState::Ephemeris(EphemerisTimeEstimator::new()),
            EstimatorKind::Rtcm1013 => EstimatorState::Rtcm1013(SingleSampleTimeEstimator::new()),
            EstimatorKind::UbxLeap => EstimatorState::UbxLeap(SingleSampleTimeEstimator::new()),
        }
    }

    fn reset(&mut self) {
        match self {
            EstimatorState::Observation(e) => e.reset(),
            EstimatorState::Ephemeris(e) => e.reset(),
            EstimatorState::Rtcm1013(e) => e.reset(),
            EstimatorState::UbxLeap(e) => e.reset(),
        }
    }
}

/// A writer's capability into exactly one `(source, kind)` estimator slot.
pub struct EstimatorHandle {
    inner: Arc<Mutex<EstimatorState>>,
    kind: EstimatorKind,
}

impl EstimatorHandle {
    pub fn kind(&self) -> EstimatorKind {
        self.kind
    }

    /// Pushes an observation epoch's TOW. Valid only on a handle requested
    /// with [`EstimatorKind::Observation`]; a mismatched push is a no-op
    /// (programmer error, not a runtime condition spec §7 models).
    pub fn push_observation_tow_ms(&self, tow_ms: i64) {
        if let EstimatorState::Observation(e) = &mut *self.inner.lock().unwrap() {
            e.push(tow_ms);
        }
    }

    /// Pushes one satellite's toe, as an absolute millisecond value
    /// (`week * WEEK_MS + toe_tow_s * 1000`).
    pub fn push_ephemeris_toe(&self, constellation: Constellation, sat_id: u8, absolute_toe_ms: i64) {
        if let EstimatorState::Ephemeris(e) = &mut *self.inner.lock().unwrap() {
            e.push(constellation, sat_id, absolute_toe_ms);
        }
    }

    /// Pushes an RTCM 1013 system-parameters sample.
    pub fn push_rtcm_1013(&self, week: i32, tow_ms: i64, leap_seconds: u8) {
        if let EstimatorState::Rtcm1013(e) = &mut *self.inner.lock().unwrap() {
            e.push(week, tow_ms, leap_seconds);
        }
    }

    /// Pushes a UBX leap-second sample (e.g. from NAV-TIMELS).
    pub fn push_ubx_leap(&self, week: i32, tow_ms: i64, leap_seconds: u8) {
        if let EstimatorState::UbxLeap(e) = &mut *self.inner.lock().unwrap() {
            e.push(week, tow_ms, leap_seconds);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldState {
    None,
    Bad,
    Good,
    Best,
}

impl From<Confidence> for FieldState {
    fn from(c: Confidence) -> Self {
        match c {
            Confidence::None => FieldState::None,
            Confidence::Bad => FieldState::Bad,
            Confidence::Good => FieldState::Good,
            Confidence::Best => FieldState::Best,
        }
    }
}

/// A read-only snapshot answering "what time is it" as best as the
/// evidence currently supports (spec §3 "TimeTruth state").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeEstimate {
    pub week: Option<i32>,
    pub week_state: FieldState,
    pub tow_ms: Option<i64>,
    pub tow_ms_state: FieldState,
    pub leap_seconds: Option<u8>,
    pub leap_seconds_state: FieldState,
}

impl TimeEstimate {
    /// A `Bad`/`None` week or TOW state should suppress downstream
    /// emission of time-dependent messages (spec §4.E "confidence
    /// calculation": "a `No` state suppresses downstream emission").
    pub fn is_usable(&self) -> bool {
        matches!(self.week_state, FieldState::Good | FieldState::Best)
            && matches!(self.tow_ms_state, FieldState::Good | FieldState::Best)
    }
}

pub struct TimeTruth {
    estimators: Mutex<HashMap<(TimeTruthSource, EstimatorKind), Arc<Mutex<EstimatorState>>>>,
    issued: Mutex<HashSet<(TimeTruthSource, EstimatorKind)>>,
    cache: Mutex<TimeTruthCache>,
    /// Caller-supplied initial lower bound on "now", used only to seed the
    /// very first query before any estimator has corroborating evidence
    /// (spec §9 Open Questions: TimeTruth takes precedence once available).
    gps_week_reference: Mutex<Option<i32>>,
}

impl Default for TimeTruth {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeTruth {
    pub fn new() -> Self {
        TimeTruth {
            estimators: Mutex::new(HashMap::new()),
            issued: Mutex::new(HashSet::new()),
            cache: Mutex::new(TimeTruthCache::new()),
            gps_week_reference: Mutex::new(None),
        }
    }

    /// Seeds the initial week-number reference (spec §9 Open Questions).
    pub fn set_gps_week_reference(&self, week: i32) {
        *self.gps_week_reference.lock().unwrap() = Some(week);
    }

    /// Requests ownership of the estimator for `(source, kind)`. Fails if a
    /// handle for this pair was already issued (spec §5, §7 `ConfigError`).
    pub fn request_estimator(
        &self,
        source: TimeTruthSource,
        kind: EstimatorKind,
    ) -> Result<EstimatorHandle, Error> {
        let key = (source, kind);
        let mut issued = self.issued.lock().unwrap();
        if !issued.insert(key) {
            return Err(Error::EstimatorAlreadyOwned);
        }
        let mut estimators = self.estimators.lock().unwrap();
        let inner = estimators
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(EstimatorState::new(kind))))
            .clone();
        Ok(EstimatorHandle { inner, kind })
    }

    /// Clears every estimator and the cache (spec §8 "push; reset; query ->
    /// None" for every kind).
    pub fn reset(&self) {
        for est in self.estimators.lock().unwrap().values() {
            est.lock().unwrap().reset();
        }
        self.cache.lock().unwrap().clear();
    }

    /// Resolves absolute time given a candidate TOW (typically the
    /// caller's best guess from the current wire message). Read-only: never
    /// mutates estimator state, only the cache (spec §4.E "The query is a
    /// read-only snapshot").
    pub fn query(&self, candidate_tow_ms: i64) -> TimeEstimate {
        let estimators = self.estimators.lock().unwrap();

        // Candidates are tagged by `TimeTruthSource` (spec §3: estimator
        // handles are keyed by `(source, kind)`), not by `EstimatorKind`,
        // the confidence ladder's "same-source" vs. "cross-source" test is
        // about independent *producers*, so two different estimators of
        // the same kind registered under different sources (e.g. a base
        // station's own Ephemeris estimator vs. a VRS service's) must be
        // able to cross-agree, not collapse into a same-source match.
        let mut week_candidates: Vec<(i32, TimeTruthSource)> = Vec::new();
        let mut tow_candidates: Vec<(i64, TimeTruthSource)> = Vec::new();
        let mut leap_candidates: Vec<(u8, TimeTruthSource)> = Vec::new();

        for (&(source, _kind), est) in estimators.iter() {
            match &*est.lock().unwrap() {
                EstimatorState::Observation(e) => {
                    if let Some(tow) = e.estimate() {
                        tow_candidates.push((tow, source));
                    }
                }
                EstimatorState::Ephemeris(e) => {
                    if let Some((wn, tow)) = e.get_estimate(candidate_tow_ms) {
                        week_candidates.push((wn, source));
                        tow_candidates.push((tow, source));
                    }
                }
                EstimatorState::Rtcm1013(e) => {
                    if let Some((wn, tow, leap)) = e.get_estimate(candidate_tow_ms) {
                        week_candidates.push((wn, source));
                        tow_candidates.push((tow, source));
                        leap_candidates.push((leap, source));
                    }
                }
                EstimatorState::UbxLeap(e) => {
                    if let Some((wn, tow, leap)) = e.get_estimate(candidate_tow_ms) {
                        week_candidates.push((wn, source));
                        tow_candidates.push((tow, source));
                        leap_candidates.push((leap, source));
                    }
                }
            }
        }
        drop(estimators);

        let week_conf = confidence::confidence(&week_candidates, |a, b| {
            is_tow_ms_within_tolerance(
                a as i64 * constants::WEEK_MS,
                b as i64 * constants::WEEK_MS,
                constants::CONFIDENCE_WN_TOLERANCE_MS,
            )
        });
        let tow_conf = confidence::confidence(&tow_candidates, |a, b| {
            is_tow_ms_within_tolerance(a, b, constants::CONFIDENCE_TOW_TOLERANCE_MS)
        });
        let leap_conf = confidence::confidence(&leap_candidates, |a, b| a == b);

        let mut cache = self.cache.lock().unwrap();

        let week = pick_value(&week_candidates, week_conf, cache.week(), |v| cache.update_week(v, week_conf));
        let tow_ms = pick_value(&tow_candidates, tow_conf, cache.tow_ms(), |v| cache.update_tow_ms(v, tow_conf));
        let leap_seconds =
            pick_value(&leap_candidates, leap_conf, cache.leap_seconds(), |v| cache.update_leap_seconds(v, leap_conf));

        // No estimator and no cached value for week: fall back to the
        // caller-supplied seed, but only as a first-query bootstrap (spec
        // §9 Open Questions); it never carries a confidence state of its
        // own, so downstream callers still see `FieldState::None` here and
        // must treat it as advisory.
        let seeded_week = week.is_none().then(|| *self.gps_week_reference.lock().unwrap()).flatten();

        TimeEstimate {
            week: week.map(|(v, _)| v).or(seeded_week),
            week_state: week.map(|(_, s)| s).unwrap_or(FieldState::None),
            tow_ms: tow_ms.map(|(v, _)| v),
            tow_ms_state: tow_ms.map(|(_, s)| s).unwrap_or(FieldState::None),
            leap_seconds: leap_seconds.map(|(v, _)| v),
            leap_seconds_state: leap_seconds.map(|(_, s)| s).unwrap_or(FieldState::None),
        }
    }
}

/// Picks the freshest candidate's value if the field produced any evidence
/// this query, falling back to the cache's last good value otherwise (spec
/// §4.E "Cache": "shadows any estimator state a query cannot recompute this
/// instant").
fn pick_value<T: Copy>(
    candidates: &[(T, TimeTruthSource)],
    conf: Confidence,
    cached: Option<(T, Confidence)>,
    mut store: impl FnMut(T),
) -> Option<(T, FieldState)> {
    if let Some((value, _)) = candidates.first() {
        store(*value);
        Some((*value, conf.into()))
    } else {
        cached.map(|(v, c)| (v, c.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_estimator_request_fails() {
        let tt = TimeTruth::new();
        tt.request_estimator(TimeTruthSource::Local, EstimatorKind::Observation).unwrap();
        let err = tt
            .request_estimator(TimeTruthSource::Local, EstimatorKind::Observation)
            .unwrap_err();
        assert_eq!(err, Error::EstimatorAlreadyOwned);
    }

    #[test]
    fn distinct_sources_can_each_hold_the_same_kind() {
        let tt = TimeTruth::new();
        assert!(tt.request_estimator(TimeTruthSource::Local, EstimatorKind::Observation).is_ok());
        assert!(tt.request_estimator(TimeTruthSource::Remote, EstimatorKind::Observation).is_ok());
    }

    #[test]
    fn reset_clears_all_estimators() {
        let tt = TimeTruth::new();
        let obs = tt.request_estimator(TimeTruthSource::Local, EstimatorKind::Observation).unwrap();
        obs.push_observation_tow_ms(300_000);
        assert!(tt.query(300_000).tow_ms.is_some());
        tt.reset();
        assert_eq!(tt.query(300_000).tow_ms, None);
    }

    #[test]
    fn cross_source_ephemeris_and_observation_agreement_is_best() {
        let tt = TimeTruth::new();
        let gps_eph = tt.request_estimator(TimeTruthSource::Local, EstimatorKind::Ephemeris).unwrap();
        let gal_eph = tt.request_estimator(TimeTruthSource::Remote, EstimatorKind::Ephemeris).unwrap();
        let obs = tt.request_estimator(TimeTruthSource::Local, EstimatorKind::Observation).unwrap();

        let wn: i64 = 2200;
        let tow_ms: i64 = 300_000;
        for sat in 0..6u8 {
            gps_eph.push_ephemeris_toe(Constellation::Gps, sat, wn * constants::WEEK_MS + tow_ms);
            gal_eph.push_ephemeris_toe(Constellation::Galileo, sat, wn * constants::WEEK_MS + tow_ms);
        }
        obs.push_observation_tow_ms(tow_ms + 123);

        let estimate = tt.query(tow_ms + 123);
        assert_eq!(estimate.week, Some(2200));
        assert_eq!(estimate.week_state, FieldState::Best);
        assert_eq!(estimate.tow_ms_state, FieldState::Best);
    }
}
