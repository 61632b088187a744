//! `TimeTruthCache`: optional memoisation of the last good query result per
//! field, so a transient gap in fresh estimator data doesn't blank out a
//! query that was confidently answered a moment ago (spec §4.E "Cache").

use crate::confidence::Confidence;

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeTruthCache {
    week: Option<(i32, Confidence)>,
    tow_ms: Option<(i64, Confidence)>,
    leap_seconds: Option<(u8, Confidence)>,
}

impl TimeTruthCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_week(&mut self, value: i32, state: Confidence) {
        self.week = Some((value, state));
    }

    pub fn update_tow_ms(&mut self, value: i64, state: Confidence) {
        self.tow_ms = Some((value, state));
    }

    pub fn update_leap_seconds(&mut self, value: u8, state: Confidence) {
        self.leap_seconds = Some((value, state));
    }

    pub fn week(&self) -> Option<(i32, Confidence)> {
        self.week
    }

    pub fn tow_ms(&self) -> Option<(i64, Confidence)> {
        self.tow_ms
    }

    pub fn leap_seconds(&self) -> Option<(u8, Confidence)> {
        self.leap_seconds
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadows_with_last_known_value() {
        let mut cache = TimeTruthCache::new();
        assert_eq!(cache.week(), None);
        cache.update_week(2200, Confidence::Best);
        assert_eq!(cache.week(), Some((2200, Confidence::Best)));
    }

    #[test]
    fn clear_resets_all_fields() {
        let mut cache = TimeTruthCache::new();
        cache.update_week(2200, Confidence::Best);
        cache.update_tow_ms(100, Confidence::Good);
        cache.clear();
        assert_eq!(cache.week(), None);
        assert_eq!(cache.tow_ms(), None);
    }
}
