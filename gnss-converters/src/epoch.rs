//! The canonical, already-unpacked observation epoch shared by the matcher,
//! adjuster, and both translators (spec §3 "observation epoch", §4.F).

use crate::codes::ObsCode;
use sbp::messages::observation::ObsFlags;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanonicalObservation {
    pub satellite: u8,
    pub code: ObsCode,
    pub pseudorange_m: f64,
    pub carrier_phase_cycles: f64,
    pub doppler_hz: f64,
    pub cn0_db_hz: f64,
    pub lock_time_s: f64,
    pub flags: ObsFlags,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Epoch {
    pub tow_ms: u32,
    pub week_number: i16,
    pub observations: Vec<CanonicalObservation>,
}
