//! SBP ephemeris messages: the GPS (0x0086) and GLONASS (0x0087) variants
//! the translator actually emits (spec §4.J "RTCM->SBP ephemeris
//! translation").

use crate::error::Error;
use bitstream::{BitReader, BitWriter};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommonHeader {
    pub sid_satellite: u8,
    pub sid_code: u8,
    pub toe_tow_s: f64,
    pub toe_wn: u16,
    pub ura_m: f64,
    pub fit_interval_s: u32,
    pub valid: bool,
    pub health_bits: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsEphemeris {
    pub common: CommonHeader,
    pub tgd_s: f64,
    pub crs_m: f64,
    pub crc_m: f64,
    pub cuc_rad: f64,
    pub cus_rad: f64,
    pub cic_rad: f64,
    pub cis_rad: f64,
    pub dn_rad_s: f64,
    pub m0_rad: f64,
    pub ecc: f64,
    pub sqrta: f64,
    pub omega0_rad: f64,
    pub omegadot_rad_s: f64,
    pub w_rad: f64,
    pub inc_rad: f64,
    pub inc_dot_rad_s: f64,
    pub af0_s: f64,
    pub af1_s_s: f64,
    pub af2_s_s2: f64,
    pub toc_tow_s: f64,
    pub iode: u8,
    pub iodc: u16,
}

/// Galileo I/NAV ephemeris (spec §4.K "word types 1-5"): same Kepler terms
/// as GPS plus dual E1/E5a-E5b broadcast group delays.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GalileoEphemeris {
    pub common: CommonHeader,
    pub bgd_e1e5a_s: f64,
    pub bgd_e1e5b_s: f64,
    pub crs_m: f64,
    pub crc_m: f64,
    pub cuc_rad: f64,
    pub cus_rad: f64,
    pub cic_rad: f64,
    pub cis_rad: f64,
    pub dn_rad_s: f64,
    pub m0_rad: f64,
    pub ecc: f64,
    pub sqrta: f64,
    pub omega0_rad: f64,
    pub omegadot_rad_s: f64,
    pub w_rad: f64,
    pub inc_rad: f64,
    pub inc_dot_rad_s: f64,
    pub af0_s: f64,
    pub af1_s_s: f64,
    pub af2_s_s2: f64,
    pub toc_tow_s: f64,
    pub iode: u8,
    pub iodc: u16,
}

/// BeiDou D1/D2 ephemeris (spec §4.K "subframes 1/2/3"): Kepler terms plus
/// the two-slot BDS group delay (`tgd1`/`tgd2`, §4.D scale `1e-10 s`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeidouEphemeris {
    pub common: CommonHeader,
    pub tgd1_s: f64,
    pub tgd2_s: f64,
    pub crs_m: f64,
    pub crc_m: f64,
    pub cuc_rad: f64,
    pub cus_rad: f64,
    pub cic_rad: f64,
    pub cis_rad: f64,
    pub dn_rad_s: f64,
    pub m0_rad: f64,
    pub ecc: f64,
    pub sqrta: f64,
    pub omega0_rad: f64,
    pub omegadot_rad_s: f64,
    pub w_rad: f64,
    pub inc_rad: f64,
    pub inc_dot_rad_s: f64,
    pub af0_s: f64,
    pub af1_s_s: f64,
    pub af2_s_s2: f64,
    pub toc_tow_s: f64,
    pub iode: u8,
    pub iodc: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlonassEphemeris {
    pub common: CommonHeader,
    pub gamma: f64,
    pub tau_s: f64,
    pub d_tau_s: f64,
    pub pos_m: [f64; 3],
    pub vel_m_s: [f64; 3],
    pub acc_m_s2: [f64; 3],
    pub fcn: i8,
    pub iod: u8,
}

fn write_header(w: &mut BitWriter, h: &CommonHeader) -> Result<(), Error> {
    w.u(h.sid_satellite as u64, 8)?;
    w.u(h.sid_code as u64, 8)?;
    w.u((h.toe_tow_s * 1000.0).round() as u64, 32)?;
    w.u(h.toe_wn as u64, 16)?;
    w.u((h.ura_m * 1000.0).round() as u64, 32)?;
    w.u(h.fit_interval_s as u64, 32)?;
    w.u(h.valid as u64, 8)?;
    w.u(h.health_bits as u64, 8)?;
    Ok(())
}

fn read_header(r: &mut BitReader<'_>) -> Result<CommonHeader, Error> {
    Ok(CommonHeader {
        sid_satellite: r.u(8)? as u8,
        sid_code: r.u(8)? as u8,
        toe_tow_s: r.u(32)? as f64 / 1000.0,
        toe_wn: r.u(16)? as u16,
        ura_m: r.u(32)? as f64 / 1000.0,
        fit_interval_s: r.u(32)? as u32,
        valid: r.u(8)? == 1,
        health_bits: r.u(8)? as u8,
    })
}

macro_rules! f64_field {
    (write $w:expr, $v:expr, $scale:expr) => {
        $w.s((($v) / ($scale)).round() as i64, 64)?
    };
    (read $r:expr, $scale:expr) => {
        ($r.s(64)? as f64) * ($scale)
    };
}

const FINE: f64 = 1e-12;

pub fn encode_gps(eph: &GpsEphemeris) -> Result<Vec<u8>, Error> {
    let mut w = BitWriter::new();
    write_header(&mut w, &eph.common)?;
    for v in [
        eph.tgd_s, eph.crs_m, eph.crc_m, eph.cuc_rad, eph.cus_rad, eph.cic_rad, eph.cis_rad,
        eph.dn_rad_s, eph.m0_rad, eph.ecc, eph.sqrta, eph.omega0_rad, eph.omegadot_rad_s,
        eph.w_rad, eph.inc_rad, eph.inc_dot_rad_s, eph.af0_s, eph.af1_s_s, eph.af2_s_s2,
        eph.toc_tow_s,
    ] {
        f64_field!(write w, v, FINE);
    }
    w.u(eph.iode as u64, 8)?;
    w.u(eph.iodc as u64, 16)?;
    Ok(w.into_bytes())
}

pub fn decode_gps(payload: &[u8]) -> Result<GpsEphemeris, Error> {
    let mut r = BitReader::new(payload);
    let common = read_header(&mut r)?;
    let mut vals = [0f64; 20];
    for v in vals.iter_mut() {
        *v = f64_field!(read r, FINE);
    }
    let iode = r.u(8)? as u8;
    let iodc = r.u(16)? as u16;
    Ok(GpsEphemeris {
        common,
        tgd_s: vals[0],
        crs_m: vals[1],
        crc_m: vals[2],
        cuc_rad: vals[3],
        cus_rad: vals[4],
        cic_rad: vals[5],
        cis_rad: vals[6],
        dn_rad_s: vals[7],
        m0_rad: vals[8],
        ecc: vals[9],
        sqrta: vals[10],
        omega0_rad: vals[11],
        omegadot_rad_s: vals[12],
        w_rad: vals[13],
        inc_rad: vals[14],
        inc_dot_rad_s: vals[15],
        af0_s: vals[16],
        af1_s_s: vals[17],
        af2_s_s2: vals[18],
        toc_tow_s: vals[19],
        iode,
        iodc,
    })
}

pub fn encode_galileo(eph: &GalileoEphemeris) -> Result<Vec<u8>, Error> {
    let mut w = BitWriter::new();
    write_header(&mut w, &eph.common)?;
    for v in [
        eph.bgd_e1e5a_s, eph.bgd_e1e5b_s, eph.crs_m, eph.crc_m, eph.cuc_rad, eph.cus_rad,
        eph.cic_rad, eph.cis_rad, eph.dn_rad_s, eph.m0_rad, eph.ecc, eph.sqrta, eph.omega0_rad,
        eph.omegadot_rad_s, eph.w_rad, eph.inc_rad, eph.inc_dot_rad_s, eph.af0_s, eph.af1_s_s,
        eph.af2_s_s2, eph.toc_tow_s,
    ] {
        f64_field!(write w, v, FINE);
    }
    w.u(eph.iode as u64, 8)?;
    w.u(eph.iodc as u64, 16)?;
    Ok(w.into_bytes())
}

pub fn decode_galileo(payload: &[u8]) -> Result<GalileoEphemeris, Error> {
    let mut r = BitReader::new(payload);
    let common = read_header(&mut r)?;
    let mut vals = [0f64; 21];
    for v in vals.iter_mut() {
        *v = f64_field!(read r, FINE);
    }
    let iode = r.u(8)? as u8;
    let iodc = r.u(16)? as u16;
    Ok(GalileoEphemeris {
        common,
        bgd_e1e5a_s: vals[0],
        bgd_e1e5b_s: vals[1],
        crs_m: vals[2],
        crc_m: vals[3],
        cuc_rad: vals[4],
        cus_rad: vals[5],
        cic_rad: vals[6],
        cis_rad: vals[7],
        dn_rad_s: vals[8],
        m0_rad: vals[9],
        ecc: vals[10],
        sqrta: vals[11],
        omega0_rad: vals[12],
        omegadot_rad_s: vals[13],
        w_rad: vals[14],
        inc_rad: vals[15],
        inc_dot_rad_s: vals[16],
        af0_s: vals[17],
        af1_s_s: vals[18],
        af2_s_s2: vals[19],
        toc_tow_s: vals[20],
        iode,
        iodc,
    })
}

pub fn encode_beidou(eph: &BeidouEphemeris) -> Result<Vec<u8>, Error> {
    let mut w = BitWriter::new();
    write_header(&mut w, &eph.common)?;
    for v in [
        eph.tgd1_s, eph.tgd2_s, eph.crs_m, eph.crc_m, eph.cuc_rad, eph.cus_rad, eph.cic_rad,
        eph.cis_rad, eph.dn_rad_s, eph.m0_rad, eph.ecc, eph.sqrta, eph.omega0_rad,
        eph.omegadot_rad_s, eph.w_rad, eph.inc_rad, eph.inc_dot_rad_s, eph.af0_s, eph.af1_s_s,
        eph.af2_s_s2, eph.toc_tow_s,
    ] {
        f64_field!(write w, v, FINE);
    }
    w.u(eph.iode as u64, 8)?;
    w.u(eph.iodc as u64, 16)?;
    Ok(w.into_bytes())
}

pub fn decode_beidou(payload: &[u8]) -> Result<BeidouEphemeris, Error> {
    let mut r = BitReader::new(payload);
    let common = read_header(&mut r)?;
    let mut vals = [0f64; 21];
    for v in vals.iter_mut() {
        *v = f64_field!(read r, FINE);
    }
    let iode = r.u(8)? as u8;
    let iodc = r.u(16)? as u16;
    Ok(BeidouEphemeris {
        common,
        tgd1_s: vals[0],
        tgd2_s: vals[1],
        crs_m: vals[2],
        crc_m: vals[3],
        cuc_rad: vals[4],
        cus_rad: vals[5],
        cic_rad: vals[6],
        cis_rad: vals[7],
        dn_rad_s: vals[8],
        m0_rad: vals[9],
        ecc: vals[10],
        sqrta: vals[11],
        omega0_rad: vals[12],
        omegadot_rad_s: vals[13],
        w_rad: vals[14],
        inc_rad: vals[15],
        inc_dot_rad_s: vals[16],
        af0_s: vals[17],
        af1_s_s: vals[18],
        af2_s_s2: vals[19],
        toc_tow_s: vals[20],
        iode,
        iodc,
    })
}

pub fn encode_glonass(eph: &GlonassEphemeris) -> Result<Vec<u8>, Error> {
    let mut w = BitWriter::new();
    write_header(&mut w, &eph.common)?;
    f64_field!(write w, eph.gamma, FINE);
    f64_field!(write w, eph.tau_s, FINE);
    f64_field!(write w, eph.d_tau_s, FINE);
    for axis in eph.pos_m {
        f64_field!(write w, axis, FINE);
    }
    for axis in eph.vel_m_s {
        f64_field!(write w, axis, FINE);
    }
    for axis in eph.acc_m_s2 {
        f64_field!(write w, axis, FINE);
    }
    w.s(eph.fcn as i64, 8)?;
    w.u(eph.iod as u64, 8)?;
    Ok(w.into_bytes())
}

pub fn decode_glonass(payload: &[u8]) -> Result<GlonassEphemeris, Error> {
    let mut r = BitReader::new(payload);
    let common = read_header(&mut r)?;
    let gamma = f64_field!(read r, FINE);
    let tau_s = f64_field!(read r, FINE);
    let d_tau_s = f64_field!(read r, FINE);
    let mut pos_m = [0f64; 3];
    for v in pos_m.iter_mut() {
        *v = f64_field!(read r, FINE);
    }
    let mut vel_m_s = [0f64; 3];
    for v in vel_m_s.iter_mut() {
        *v = f64_field!(read r, FINE);
    }
    let mut acc_m_s2 = [0f64; 3];
    for v in acc_m_s2.iter_mut() {
        *v = f64_field!(read r, FINE);
    }
    let fcn = r.s(8)? as i8;
    let iod = r.u(8)? as u8;
    Ok(GlonassEphemeris { common, gamma, tau_s, d_tau_s, pos_m, vel_m_s, acc_m_s2, fcn, iod })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> CommonHeader {
        CommonHeader {
            sid_satellite: 5,
            sid_code: 0,
            toe_tow_s: 345_600.0,
            toe_wn: 2200,
            ura_m: 2.4,
            fit_interval_s: 14_400,
            valid: true,
            health_bits: 0,
        }
    }

    #[test]
    fn gps_ephemeris_round_trips() {
        let eph = GpsEphemeris {
            common: header(),
            tgd_s: -1e-8,
            crs_m: 12.0,
            crc_m: 200.0,
            cuc_rad: 1e-7,
            cus_rad: 2e-7,
            cic_rad: -1e-7,
            cis_rad: 1e-8,
            dn_rad_s: 4e-9,
            m0_rad: 0.25,
            ecc: 0.01,
            sqrta: 5153.7,
            omega0_rad: -0.5,
            omegadot_rad_s: -8e-9,
            w_rad: 0.1,
            inc_rad: 0.3,
            inc_dot_rad_s: 1e-10,
            af0_s: 1e-5,
            af1_s_s: 1e-12,
            af2_s_s2: 0.0,
            toc_tow_s: 345_600.0,
            iode: 45,
            iodc: 45,
        };
        let bytes = encode_gps(&eph).unwrap();
        let decoded = decode_gps(&bytes).unwrap();
        assert_eq!(decoded.common.toe_wn, eph.common.toe_wn);
        assert!((decoded.ecc - eph.ecc).abs() < 1e-9);
    }

    #[test]
    fn galileo_ephemeris_round_trips() {
        let eph = GalileoEphemeris {
            common: header(),
            bgd_e1e5a_s: 1e-9,
            bgd_e1e5b_s: -1e-9,
            crs_m: 10.0,
            crc_m: 150.0,
            cuc_rad: 1e-7,
            cus_rad: 2e-7,
            cic_rad: -1e-7,
            cis_rad: 1e-8,
            dn_rad_s: 4e-9,
            m0_rad: 0.5,
            ecc: 0.02,
            sqrta: 5440.6,
            omega0_rad: -1.0,
            omegadot_rad_s: -8e-9,
            w_rad: 0.2,
            inc_rad: 0.97,
            inc_dot_rad_s: 1e-10,
            af0_s: 1e-5,
            af1_s_s: 1e-12,
            af2_s_s2: 0.0,
            toc_tow_s: 345_600.0,
            iode: 10,
            iodc: 10,
        };
        let bytes = encode_galileo(&eph).unwrap();
        let decoded = decode_galileo(&bytes).unwrap();
        assert_eq!(decoded.common.toe_wn, eph.common.toe_wn);
        assert!((decoded.bgd_e1e5a_s - eph.bgd_e1e5a_s).abs() < 1e-15);
        assert!((decoded.ecc - eph.ecc).abs() < 1e-9);
    }

    #[test]
    fn beidou_ephemeris_round_trips() {
        let eph = BeidouEphemeris {
            common: header(),
            tgd1_s: 1e-10,
            tgd2_s: -1e-10,
            crs_m: 8.0,
            crc_m: 120.0,
            cuc_rad: 1e-7,
            cus_rad: 2e-7,
            cic_rad: -1e-7,
            cis_rad: 1e-8,
            dn_rad_s: 4e-9,
            m0_rad: 0.3,
            ecc: 0.015,
            sqrta: 5282.6,
            omega0_rad: -0.8,
            omegadot_rad_s: -8e-9,
            w_rad: 0.15,
            inc_rad: 0.3,
            inc_dot_rad_s: 1e-10,
            af0_s: 1e-5,
            af1_s_s: 1e-12,
            af2_s_s2: 0.0,
            toc_tow_s: 345_600.0,
            iode: 3,
            iodc: 3,
        };
        let bytes = encode_beidou(&eph).unwrap();
        let decoded = decode_beidou(&bytes).unwrap();
        assert_eq!(decoded.common.toe_wn, eph.common.toe_wn);
        assert!((decoded.tgd1_s - eph.tgd1_s).abs() < 1e-15);
        assert!((decoded.ecc - eph.ecc).abs() < 1e-9);
    }

    #[test]
    fn glonass_ephemeris_round_trips_fcn() {
        let eph = GlonassEphemeris {
            common: header(),
            gamma: 1e-11,
            tau_s: 1e-6,
            d_tau_s: 0.0,
            pos_m: [1.0, 2.0, 3.0],
            vel_m_s: [0.1, 0.2, 0.3],
            acc_m_s2: [0.0, 0.0, 0.0],
            fcn: -3,
            iod: 12,
        };
        let bytes = encode_glonass(&eph).unwrap();
        let decoded = decode_glonass(&bytes).unwrap();
        assert_eq!(decoded.fcn, -3);
        assert_eq!(decoded.pos_m, eph.pos_m);
    }
}
