//! Shared vocabulary across message families: constellations and codes.

use num_traits::{FromPrimitive, ToPrimitive};

/// A GNSS constellation, tagged rather than punned: every ephemeris and
/// observation record names its constellation explicitly instead of relying
/// on a C-style union (spec §9 "Duck-typed numeric fields").
///
/// The discriminants are SBP's constellation id byte (spec §4.D category
/// table order: GPS first); [`FromPrimitive`]/[`ToPrimitive`] convert to and
/// from it the way `ublox` converts `GpsFix` to and from its wire byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Constellation {
    Gps = 0,
    Glonass = 1,
    Galileo = 2,
    Sbas = 3,
    Qzss = 4,
    BeiDou = 5,
}

impl FromPrimitive for Constellation {
    fn from_i64(n: i64) -> Option<Self> {
        Self::from_u64(n as u64)
    }

    fn from_u64(n: u64) -> Option<Self> {
        match n {
            0 => Some(Constellation::Gps),
            1 => Some(Constellation::Glonass),
            2 => Some(Constellation::Galileo),
            3 => Some(Constellation::Sbas),
            4 => Some(Constellation::Qzss),
            5 => Some(Constellation::BeiDou),
            _ => None,
        }
    }
}

impl ToPrimitive for Constellation {
    fn to_i64(&self) -> Option<i64> {
        self.to_u64().map(|n| n as i64)
    }

    fn to_u64(&self) -> Option<u64> {
        Some(*self as u64)
    }
}

impl Constellation {
    /// Week-number field width on the RTCM wire for this constellation's
    /// own ephemeris message, used by [`crate::time::week_rollover_adjustment`].
    pub fn wn_resolution_bits(self) -> u32 {
        match self {
            Constellation::Gps => 10,
            Constellation::Glonass => 0, // GLONASS ephemeris carries no week field at all
            Constellation::Galileo => 12,
            Constellation::BeiDou => 13,
            Constellation::Qzss => 10,
            Constellation::Sbas => 0,
        }
    }

    /// This constellation's week-numbering offset from the GPS week frame.
    pub fn gps_week_offset(self) -> i32 {
        match self {
            Constellation::BeiDou => 1356,
            _ => 0,
        }
    }

    /// Native toe/toc resolution in seconds (spec §3 "Keplerian ephemeris").
    pub fn toe_resolution_seconds(self) -> f64 {
        match self {
            Constellation::Gps | Constellation::Qzss => 16.0,
            Constellation::Galileo => 60.0,
            Constellation::BeiDou => 8.0,
            Constellation::Glonass | Constellation::Sbas => 1.0,
        }
    }
}

/// A `(satellite PRN/slot, signal code)` pair identifying one channel of
/// observation data, mirroring SBP's `sid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalId {
    pub constellation: Constellation,
    pub satellite: u8,
    pub code: ObsCode,
}

/// A wire-faithful observation code, naming every signal the RTCM MSM
/// signal-mask tables distinguish (including near-duplicates like
/// `GpsL2Cl`/`GpsL2Cm` that spec §4.F later folds together). Canonicalising
/// these for cross-stream matching is the observation unpacker's job
/// (`gnss_converters::unpacker`), not this codec's, RTCM decode stays
/// wire-faithful.
///
/// The discriminants are the SBP observation code byte (spec §3 "SBP sid
/// code"); [`FromPrimitive`]/[`ToPrimitive`] convert to and from it the way
/// `ublox` converts `GpsFix` to and from its wire byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
#[repr(u8)]
pub enum ObsCode {
    GpsL1Ca = 0,
    GpsL2Cm = 1,
    SbasL1Ca = 2,
    GloL1Of = 3,
    GloL2Of = 4,
    GpsL1P = 5,
    GpsL2P = 6,
    GpsL2Cl = 7,
    GpsL5I = 9,
    BdsB1I = 12,
    BdsB2I = 13,
    GalE1B = 14,
    GalE1C = 15,
    GalE5bI = 20,
    GalE5aI = 24,
    QzssL1Ca = 29,
    QzssL2Cm = 32,
    SbasL5I = 38,
}

impl FromPrimitive for ObsCode {
    fn from_i64(n: i64) -> Option<Self> {
        Self::from_u64(n as u64)
    }

    fn from_u64(n: u64) -> Option<Self> {
        match n {
            0 => Some(ObsCode::GpsL1Ca),
            1 => Some(ObsCode::GpsL2Cm),
            2 => Some(ObsCode::SbasL1Ca),
            3 => Some(ObsCode::GloL1Of),
            4 => Some(ObsCode::GloL2Of),
            5 => Some(ObsCode::GpsL1P),
            6 => Some(ObsCode::GpsL2P),
            7 => Some(ObsCode::GpsL2Cl),
            9 => Some(ObsCode::GpsL5I),
            12 => Some(ObsCode::BdsB1I),
            13 => Some(ObsCode::BdsB2I),
            14 => Some(ObsCode::GalE1B),
            15 => Some(ObsCode::GalE1C),
            20 => Some(ObsCode::GalE5bI),
            24 => Some(ObsCode::GalE5aI),
            29 => Some(ObsCode::QzssL1Ca),
            32 => Some(ObsCode::QzssL2Cm),
            38 => Some(ObsCode::SbasL5I),
            _ => None,
        }
    }
}

impl ToPrimitive for ObsCode {
    fn to_i64(&self) -> Option<i64> {
        self.to_u64().map(|n| n as i64)
    }

    fn to_u64(&self) -> Option<u64> {
        Some(*self as u64)
    }
}

/// Sentinel used by MSM5/7 satellite-info fields: FCN unknown.
pub const MSM_FCN_UNKNOWN: u8 = 0xF;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constellation_round_trips_through_its_wire_byte() {
        for c in [
            Constellation::Gps,
            Constellation::Glonass,
            Constellation::Galileo,
            Constellation::Sbas,
            Constellation::Qzss,
            Constellation::BeiDou,
        ] {
            assert_eq!(Constellation::from_u8(c.to_u8().unwrap()), Some(c));
        }
    }

    #[test]
    fn obs_code_round_trips_through_its_sbp_byte() {
        for code in [
            ObsCode::GpsL1Ca,
            ObsCode::GpsL2Cl,
            ObsCode::GloL2Of,
            ObsCode::GalE1C,
            ObsCode::BdsB2I,
            ObsCode::QzssL2Cm,
            ObsCode::SbasL5I,
        ] {
            assert_eq!(ObsCode::from_u8(code.to_u8().unwrap()), Some(code));
        }
    }

    #[test]
    fn unmapped_byte_has_no_obs_code() {
        assert_eq!(ObsCode::from_u8(255), None);
    }
}
