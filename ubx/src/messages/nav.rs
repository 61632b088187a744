//! NAV-PVT, NAV-ATT, NAV-VELECEF, NAV-SAT, NAV-STATUS: the subset of the
//! NAV class spec §4.K names. NAV-PVT/STATUS feed the GNSS-time-offset
//! computation; NAV-SAT/ATT/VELECEF are informational passthrough.

use crate::error::Error;
use crate::reader::{Reader, Writer};
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PvtValidFlags: u8 {
        const VALID_DATE = 1 << 0;
        const VALID_TIME = 1 << 1;
        const FULLY_RESOLVED = 1 << 2;
        const VALID_MAG = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavPvt {
    pub itow_ms: u32,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub min: u8,
    pub sec: u8,
    pub valid: PvtValidFlags,
    pub t_acc_ns: u32,
    pub nano_s: i32,
    pub fix_type: u8,
    pub num_sv: u8,
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub height_m: f64,
    pub h_msl_m: f64,
    pub g_speed_m_s: f64,
    pub head_mot_deg: f64,
}

pub fn decode_pvt(payload: &[u8]) -> Result<NavPvt, Error> {
    if payload.len() < 92 {
        return Err(Error::InvalidMessage("NAV-PVT payload shorter than 92 bytes"));
    }
    let mut r = Reader::new(payload);
    let itow_ms = r.u32()?;
    let year = r.u16()?;
    let month = r.u8()?;
    let day = r.u8()?;
    let hour = r.u8()?;
    let min = r.u8()?;
    let sec = r.u8()?;
    let valid = PvtValidFlags::from_bits_truncate(r.u8()?);
    let t_acc_ns = r.u32()?;
    let nano_s = r.i32()?;
    let fix_type = r.u8()?;
    r.skip(1)?; // flags
    r.skip(1)?; // flags2
    let num_sv = r.u8()?;
    let lon_deg = r.i32()? as f64 * 1e-7;
    let lat_deg = r.i32()? as f64 * 1e-7;
    let height_m = r.i32()? as f64 * 1e-3;
    let h_msl_m = r.i32()? as f64 * 1e-3;
    r.skip(4)?; // hAcc
    r.skip(4)?; // vAcc
    r.skip(4)?; // velN
    r.skip(4)?; // velE
    r.skip(4)?; // velD
    let g_speed_m_s = r.i32()? as f64 * 1e-3;
    let head_mot_deg = r.i32()? as f64 * 1e-5;

    Ok(NavPvt {
        itow_ms, year, month, day, hour, min, sec, valid, t_acc_ns, nano_s, fix_type, num_sv,
        lon_deg, lat_deg, height_m, h_msl_m, g_speed_m_s, head_mot_deg,
    })
}

pub fn encode_pvt(msg: &NavPvt) -> Result<Vec<u8>, Error> {
    let mut w = Writer::new();
    w.u32(msg.itow_ms);
    w.u16(msg.year);
    w.u8(msg.month);
    w.u8(msg.day);
    w.u8(msg.hour);
    w.u8(msg.min);
    w.u8(msg.sec);
    w.u8(msg.valid.bits());
    w.u32(msg.t_acc_ns);
    w.i32(msg.nano_s);
    w.u8(msg.fix_type);
    w.u8(0); // flags
    w.u8(0); // flags2
    w.u8(msg.num_sv);
    w.i32((msg.lon_deg / 1e-7).round() as i32);
    w.i32((msg.lat_deg / 1e-7).round() as i32);
    w.i32((msg.height_m / 1e-3).round() as i32);
    w.i32((msg.h_msl_m / 1e-3).round() as i32);
    w.zeros(16); // hAcc, vAcc, velN, velE, velD
    w.i32((msg.g_speed_m_s / 1e-3).round() as i32);
    w.i32((msg.head_mot_deg / 1e-5).round() as i32);
    w.zeros(4); // sAcc
    w.zeros(4); // headAcc
    w.zeros(2); // pDOP
    w.zeros(2); // flags3
    w.zeros(4); // reserved1
    w.zeros(4); // headVeh
    w.zeros(2); // magDec
    w.zeros(2); // magAcc
    Ok(w.into_bytes())
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavAtt {
    pub itow_ms: u32,
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub heading_deg: f64,
}

pub fn decode_att(payload: &[u8]) -> Result<NavAtt, Error> {
    if payload.len() < 32 {
        return Err(Error::InvalidMessage("NAV-ATT payload shorter than 32 bytes"));
    }
    let mut r = Reader::new(payload);
    r.skip(4)?; // version + reserved1
    let itow_ms = r.u32()?;
    let roll_deg = r.i32()? as f64 * 1e-5;
    let pitch_deg = r.i32()? as f64 * 1e-5;
    let heading_deg = r.i32()? as f64 * 1e-5;
    Ok(NavAtt { itow_ms, roll_deg, pitch_deg, heading_deg })
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavVelEcef {
    pub itow_ms: u32,
    pub vx_m_s: f64,
    pub vy_m_s: f64,
    pub vz_m_s: f64,
}

pub fn decode_velecef(payload: &[u8]) -> Result<NavVelEcef, Error> {
    if payload.len() < 20 {
        return Err(Error::InvalidMessage("NAV-VELECEF payload shorter than 20 bytes"));
    }
    let mut r = Reader::new(payload);
    let itow_ms = r.u32()?;
    let vx_m_s = r.i32()? as f64 * 1e-2;
    let vy_m_s = r.i32()? as f64 * 1e-2;
    let vz_m_s = r.i32()? as f64 * 1e-2;
    Ok(NavVelEcef { itow_ms, vx_m_s, vy_m_s, vz_m_s })
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SatInfo {
    pub gnss_id: u8,
    pub sv_id: u8,
    pub cno_db_hz: u8,
    pub elev_deg: i8,
    pub azim_deg: i16,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavSat {
    pub itow_ms: u32,
    pub satellites: Vec<SatInfo>,
}

pub fn decode_sat(payload: &[u8]) -> Result<NavSat, Error> {
    if payload.len() < 8 {
        return Err(Error::InvalidMessage("NAV-SAT payload shorter than the fixed header"));
    }
    let mut r = Reader::new(payload);
    let itow_ms = r.u32()?;
    r.skip(1)?; // version
    let num_svs = r.u8()?;
    r.skip(2)?; // reserved1

    let mut satellites = Vec::with_capacity(num_svs as usize);
    for _ in 0..num_svs {
        let gnss_id = r.u8()?;
        let sv_id = r.u8()?;
        let cno_db_hz = r.u8()?;
        let elev_deg = r.i8()?;
        let azim_deg = r.i16()?;
        r.skip(2)?; // prRes
        r.skip(4)?; // flags
        satellites.push(SatInfo { gnss_id, sv_id, cno_db_hz, elev_deg, azim_deg });
    }
    Ok(NavSat { itow_ms, satellites })
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NavStatusFlags: u8 {
        const GPS_FIX_OK = 1 << 0;
        const DIFF_SOLN = 1 << 1;
        const WKN_SET = 1 << 2;
        const TOW_SET = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavStatus {
    pub itow_ms: u32,
    pub gps_fix: u8,
    pub flags: NavStatusFlags,
    pub ttff_ms: u32,
    pub msss_ms: u32,
}

impl NavStatus {
    /// Spec §4.K: "when fix and timing are good", the gate before the
    /// translator emits a GNSS-time-offset message.
    pub fn timing_is_good(&self) -> bool {
        self.flags.contains(NavStatusFlags::GPS_FIX_OK)
            && self.flags.contains(NavStatusFlags::TOW_SET)
            && self.flags.contains(NavStatusFlags::WKN_SET)
    }
}

pub fn decode_status(payload: &[u8]) -> Result<NavStatus, Error> {
    if payload.len() < 16 {
        return Err(Error::InvalidMessage("NAV-STATUS payload shorter than 16 bytes"));
    }
    let mut r = Reader::new(payload);
    let itow_ms = r.u32()?;
    let gps_fix = r.u8()?;
    let flags = NavStatusFlags::from_bits_truncate(r.u8()?);
    r.skip(1)?; // fixStat
    r.skip(1)?; // flags2
    let ttff_ms = r.u32()?;
    let msss_ms = r.u32()?;
    Ok(NavStatus { itow_ms, gps_fix, flags, ttff_ms, msss_ms })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pvt_round_trips_position_and_time() {
        let msg = NavPvt {
            itow_ms: 466_544_000,
            year: 2026,
            month: 7,
            day: 28,
            hour: 12,
            min: 0,
            sec: 0,
            valid: PvtValidFlags::VALID_DATE | PvtValidFlags::VALID_TIME | PvtValidFlags::FULLY_RESOLVED,
            t_acc_ns: 20,
            nano_s: 0,
            fix_type: 3,
            num_sv: 12,
            lon_deg: -122.1,
            lat_deg: 37.4,
            height_m: 30.0,
            h_msl_m: 0.0,
            g_speed_m_s: 0.0,
            head_mot_deg: 0.0,
        };
        let bytes = encode_pvt(&msg).unwrap();
        assert_eq!(bytes.len(), 92);
        let decoded = decode_pvt(&bytes).unwrap();
        assert_eq!(decoded.itow_ms, msg.itow_ms);
        assert!((decoded.lon_deg - msg.lon_deg).abs() < 1e-6);
    }

    #[test]
    fn status_timing_good_requires_fix_and_time_flags() {
        let good = NavStatus {
            itow_ms: 0,
            gps_fix: 3,
            flags: NavStatusFlags::GPS_FIX_OK | NavStatusFlags::TOW_SET | NavStatusFlags::WKN_SET,
            ttff_ms: 0,
            msss_ms: 0,
        };
        assert!(good.timing_is_good());
        let bad = NavStatus { flags: NavStatusFlags::GPS_FIX_OK, ..good };
        assert!(!bad.timing_is_good());
    }
}
