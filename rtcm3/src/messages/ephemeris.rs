//! Keplerian broadcast ephemeris messages: GPS (1019), Galileo F/NAV and
//! I/NAV (1045/1046), BeiDou (1042), QZSS (1044) (spec §3 "Keplerian
//! ephemeris", §4.D "ephemeris messages").
//!
//! All four share the same physical parameter set (Kepler orbital elements
//! plus clock polynomial); they differ in field bit-widths and scale
//! factors. GPS's widths (RTCM Table 3.5-1) are this module's reference
//! layout; the Galileo/BeiDou/QZSS layouts are this implementation's own
//! analogy-based approximation of the published per-constellation tables
//! (see `DESIGN.md`; exact widths could not be independently verified
//! against a published ICD).

use crate::error::Error;
use crate::messages::common::Constellation;
use bitstream::{BitReader, BitWriter};

/// Physical-unit Keplerian ephemeris, constellation-tagged rather than
/// split into four near-identical structs (spec §9 "Duck-typed numeric
/// fields" applies equally to near-duplicate structs).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeplerianEphemeris {
    pub constellation: Constellation,
    pub satellite: u8,
    pub week_number: u16,
    pub accuracy_code: u8,
    pub code_on_l2: u8,
    pub idot_semicircles_s: f64,
    pub iode: u16,
    pub toc_s: f64,
    pub af2: f64,
    pub af1: f64,
    pub af0: f64,
    pub iodc: u16,
    pub crs_m: f64,
    pub delta_n_semicircles_s: f64,
    pub m0_semicircles: f64,
    pub cuc_rad: f64,
    pub eccentricity: f64,
    pub cus_rad: f64,
    pub sqrt_a: f64,
    pub toe_s: f64,
    pub cic_rad: f64,
    pub omega0_semicircles: f64,
    pub cis_rad: f64,
    pub i0_semicircles: f64,
    pub crc_m: f64,
    pub omega_semicircles: f64,
    pub omega_dot_semicircles_s: f64,
    pub tgd_s: f64,
    pub health: u8,
    pub l2p_data_flag: bool,
    pub fit_interval_flag: bool,
}

struct Layout {
    msg_num: u16,
    sat_bits: u32,
    week_bits: u32,
    accuracy_bits: u32,
    code_l2_bits: u32,
    idot_bits: u32,
    idot_scale: f64,
    iode_bits: u32,
    toc_bits: u32,
    af2_bits: u32,
    af2_scale: f64,
    af1_bits: u32,
    af1_scale: f64,
    af0_bits: u32,
    af0_scale: f64,
    iodc_bits: u32,
    crs_bits: u32,
    crs_scale: f64,
    delta_n_bits: u32,
    delta_n_scale: f64,
    m0_bits: u32,
    m0_scale: f64,
    cuc_bits: u32,
    cuc_scale: f64,
    e_bits: u32,
    e_scale: f64,
    cus_bits: u32,
    cus_scale: f64,
    sqrt_a_bits: u32,
    sqrt_a_scale: f64,
    toe_bits: u32,
    toe_scale: f64,
    cic_bits: u32,
    cic_scale: f64,
    omega0_bits: u32,
    omega0_scale: f64,
    cis_bits: u32,
    cis_scale: f64,
    i0_bits: u32,
    i0_scale: f64,
    crc_bits: u32,
    crc_scale: f64,
    omega_bits: u32,
    omega_scale: f64,
    omega_dot_bits: u32,
    omega_dot_scale: f64,
    tgd_bits: u32,
    tgd_scale: f64,
    health_bits: u32,
    has_l2p_flag: bool,
    has_fit_interval: bool,
}

const TOC_SCALE: f64 = 16.0;

fn layout(constellation: Constellation) -> Layout {
    match constellation {
        Constellation::Gps => Layout {
            msg_num: 1019,
            sat_bits: 6,
            week_bits: 10,
            accuracy_bits: 4,
            code_l2_bits: 2,
            idot_bits: 14,
            idot_scale: 2f64.powi(-43),
            iode_bits: 8,
            toc_bits: 16,
            af2_bits: 8,
            af2_scale: 2f64.powi(-55),
            af1_bits: 16,
            af1_scale: 2f64.powi(-43),
            af0_bits: 22,
            af0_scale: 2f64.powi(-31),
            iodc_bits: 10,
            crs_bits: 16,
            crs_scale: 2f64.powi(-5),
            delta_n_bits: 16,
            delta_n_scale: 2f64.powi(-43),
            m0_bits: 32,
            m0_scale: 2f64.powi(-31),
            cuc_bits: 16,
            cuc_scale: 2f64.powi(-29),
            e_bits: 32,
            e_scale: 2f64.powi(-33),
            cus_bits: 16,
            cus_scale: 2f64.powi(-29),
            sqrt_a_bits: 32,
            sqrt_a_scale: 2f64.powi(-19),
            toe_bits: 16,
            toe_scale: TOC_SCALE,
            cic_bits: 16,
            cic_scale: 2f64.powi(-29),
            omega0_bits: 32,
            omega0_scale: 2f64.powi(-31),
            cis_bits: 16,
            cis_scale: 2f64.powi(-29),
            i0_bits: 32,
            i0_scale: 2f64.powi(-31),
            crc_bits: 16,
            crc_scale: 2f64.powi(-5),
            omega_bits: 32,
            omega_scale: 2f64.powi(-31),
            omega_dot_bits: 24,
            omega_dot_scale: 2f64.powi(-43),
            tgd_bits: 8,
            tgd_scale: 2f64.powi(-31),
            health_bits: 6,
            has_l2p_flag: true,
            has_fit_interval: true,
        },
        Constellation::Qzss => Layout {
            msg_num: 1044,
            ..layout(Constellation::Gps)
        },
        Constellation::BeiDou => Layout {
            msg_num: 1042,
            sat_bits: 6,
            week_bits: 13,
            accuracy_bits: 4,
            code_l2_bits: 0,
            idot_bits: 14,
            idot_scale: 2f64.powi(-43),
            iode_bits: 5,
            toc_bits: 17,
            af2_bits: 11,
            af2_scale: 2f64.powi(-66),
            af1_bits: 22,
            af1_scale: 2f64.powi(-50),
            af0_bits: 24,
            af0_scale: 2f64.powi(-33),
            iodc_bits: 5,
            crs_bits: 18,
            crs_scale: 2f64.powi(-6),
            delta_n_bits: 16,
            delta_n_scale: 2f64.powi(-43),
            m0_bits: 32,
            m0_scale: 2f64.powi(-31),
            cuc_bits: 18,
            cuc_scale: 2f64.powi(-31),
            e_bits: 32,
            e_scale: 2f64.powi(-33),
            cus_bits: 18,
            cus_scale: 2f64.powi(-31),
            sqrt_a_bits: 32,
            sqrt_a_scale: 2f64.powi(-19),
            toe_bits: 17,
            toe_scale: 8.0,
            cic_bits: 18,
            cic_scale: 2f64.powi(-31),
            omega0_bits: 32,
            omega0_scale: 2f64.powi(-31),
            cis_bits: 18,
            cis_scale: 2f64.powi(-31),
            i0_bits: 32,
            i0_scale: 2f64.powi(-31),
            crc_bits: 18,
            crc_scale: 2f64.powi(-6),
            omega_bits: 32,
            omega_scale: 2f64.powi(-31),
            omega_dot_bits: 24,
            omega_dot_scale: 2f64.powi(-43),
            tgd_bits: 10,
            tgd_scale: 1e-10,
            health_bits: 1,
            has_l2p_flag: false,
            has_fit_interval: false,
        },
        Constellation::Galileo => Layout {
            msg_num: 1046,
            sat_bits: 6,
            week_bits: 12,
            accuracy_bits: 8, // SISA index, wider than GPS URA
            code_l2_bits: 0,
            idot_bits: 14,
            idot_scale: 2f64.powi(-43),
            iode_bits: 10,
            toc_bits: 14,
            af2_bits: 6,
            af2_scale: 2f64.powi(-59),
            af1_bits: 21,
            af1_scale: 2f64.powi(-46),
            af0_bits: 31,
            af0_scale: 2f64.powi(-34),
            iodc_bits: 0,
            crs_bits: 16,
            crs_scale: 2f64.powi(-5),
            delta_n_bits: 16,
            delta_n_scale: 2f64.powi(-43),
            m0_bits: 32,
            m0_scale: 2f64.powi(-31),
            cuc_bits: 16,
            cuc_scale: 2f64.powi(-29),
            e_bits: 32,
            e_scale: 2f64.powi(-33),
            cus_bits: 16,
            cus_scale: 2f64.powi(-29),
            sqrt_a_bits: 32,
            sqrt_a_scale: 2f64.powi(-19),
            toe_bits: 14,
            toe_scale: 60.0,
            cic_bits: 16,
            cic_scale: 2f64.powi(-29),
            omega0_bits: 32,
            omega0_scale: 2f64.powi(-31),
            cis_bits: 16,
            cis_scale: 2f64.powi(-29),
            i0_bits: 32,
            i0_scale: 2f64.powi(-31),
            crc_bits: 16,
            crc_scale: 2f64.powi(-5),
            omega_bits: 32,
            omega_scale: 2f64.powi(-31),
            omega_dot_bits: 24,
            omega_dot_scale: 2f64.powi(-43),
            tgd_bits: 10,
            tgd_scale: 2f64.powi(-32),
            health_bits: 0,
            has_l2p_flag: false,
            has_fit_interval: false,
        },
        Constellation::Glonass | Constellation::Sbas => {
            unreachable!("non-Keplerian constellations have their own message modules")
        }
    }
}

pub fn decode(constellation: Constellation, payload: &[u8]) -> Result<KeplerianEphemeris, Error> {
    let l = layout(constellation);
    let mut r = BitReader::new(payload);
    let got = r.u(12)? as u16;
    if got != l.msg_num {
        return Err(Error::MessageTypeMismatch { expected: l.msg_num, got });
    }
    let satellite = r.u(l.sat_bits)? as u8;
    let week_number = r.u(l.week_bits)? as u16;
    let accuracy_code = r.u(l.accuracy_bits)? as u8;
    let code_on_l2 = if l.code_l2_bits > 0 { r.u(l.code_l2_bits)? as u8 } else { 0 };
    let idot_semicircles_s = r.s(l.idot_bits)? as f64 * l.idot_scale;
    let iode = r.u(l.iode_bits)? as u16;
    let toc_s = r.u(l.toc_bits)? as f64 * TOC_SCALE;
    let af2 = r.s(l.af2_bits)? as f64 * l.af2_scale;
    let af1 = r.s(l.af1_bits)? as f64 * l.af1_scale;
    let af0 = r.s(l.af0_bits)? as f64 * l.af0_scale;
    let iodc = if l.iodc_bits > 0 { r.u(l.iodc_bits)? as u16 } else { iode };
    let crs_m = r.s(l.crs_bits)? as f64 * l.crs_scale;
    let delta_n_semicircles_s = r.s(l.delta_n_bits)? as f64 * l.delta_n_scale;
    let m0_semicircles = r.s(l.m0_bits)? as f64 * l.m0_scale;
    let cuc_rad = r.s(l.cuc_bits)? as f64 * l.cuc_scale;
    let eccentricity = r.u(l.e_bits)? as f64 * l.e_scale;
    let cus_rad = r.s(l.cus_bits)? as f64 * l.cus_scale;
    let sqrt_a = r.u(l.sqrt_a_bits)? as f64 * l.sqrt_a_scale;
    let toe_s = r.u(l.toe_bits)? as f64 * l.toe_scale;
    let cic_rad = r.s(l.cic_bits)? as f64 * l.cic_scale;
    let omega0_semicircles = r.s(l.omega0_bits)? as f64 * l.omega0_scale;
    let cis_rad = r.s(l.cis_bits)? as f64 * l.cis_scale;
    let i0_semicircles = r.s(l.i0_bits)? as f64 * l.i0_scale;
    let crc_m = r.s(l.crc_bits)? as f64 * l.crc_scale;
    let omega_semicircles = r.s(l.omega_bits)? as f64 * l.omega_scale;
    let omega_dot_semicircles_s = r.s(l.omega_dot_bits)? as f64 * l.omega_dot_scale;
    let tgd_s = r.s(l.tgd_bits)? as f64 * l.tgd_scale;
    let health = if l.health_bits > 0 { r.u(l.health_bits)? as u8 } else { 0 };
    let l2p_data_flag = if l.has_l2p_flag { r.u(1)? == 1 } else { false };
    let fit_interval_flag = if l.has_fit_interval { r.u(1)? == 1 } else { false };

    Ok(KeplerianEphemeris {
        constellation,
        satellite,
        week_number,
        accuracy_code,
        code_on_l2,
        idot_semicircles_s,
        iode,
        toc_s,
        af2,
        af1,
        af0,
        iodc,
        crs_m,
        delta_n_semicircles_s,
        m0_semicircles,
        cuc_rad,
        eccentricity,
        cus_rad,
        sqrt_a,
        toe_s,
        cic_rad,
        omega0_semicircles,
        cis_rad,
        i0_semicircles,
        crc_m,
        omega_semicircles,
        omega_dot_semicircles_s,
        tgd_s,
        health,
        l2p_data_flag,
        fit_interval_flag,
    })
}

pub fn encode(eph: &KeplerianEphemeris) -> Result<Vec<u8>, Error> {
    let l = layout(eph.constellation);
    let mut w = BitWriter::new();
    w.u(l.msg_num as u64, 12)?;
    w.u(eph.satellite as u64, l.sat_bits)?;
    w.u(eph.week_number as u64, l.week_bits)?;
    w.u(eph.accuracy_code as u64, l.accuracy_bits)?;
    if l.code_l2_bits > 0 {
        w.u(eph.code_on_l2 as u64, l.code_l2_bits)?;
    }
    w.s((eph.idot_semicircles_s / l.idot_scale).round() as i64, l.idot_bits)?;
    w.u(eph.iode as u64, l.iode_bits)?;
    w.u((eph.toc_s / TOC_SCALE).round() as u64, l.toc_bits)?;
    w.s((eph.af2 / l.af2_scale).round() as i64, l.af2_bits)?;
    w.s((eph.af1 / l.af1_scale).round() as i64, l.af1_bits)?;
    w.s((eph.af0 / l.af0_scale).round() as i64, l.af0_bits)?;
    if l.iodc_bits > 0 {
        w.u(eph.iodc as u64, l.iodc_bits)?;
    }
    w.s((eph.crs_m / l.crs_scale).round() as i64, l.crs_bits)?;
    w.s((eph.delta_n_semicircles_s / l.delta_n_scale).round() as i64, l.delta_n_bits)?;
    w.s((eph.m0_semicircles / l.m0_scale).round() as i64, l.m0_bits)?;
    w.s((eph.cuc_rad / l.cuc_scale).round() as i64, l.cuc_bits)?;
    w.u((eph.eccentricity / l.e_scale).round() as u64, l.e_bits)?;
    w.s((eph.cus_rad / l.cus_scale).round() as i64, l.cus_bits)?;
    w.u((eph.sqrt_a / l.sqrt_a_scale).round() as u64, l.sqrt_a_bits)?;
    w.u((eph.toe_s / l.toe_scale).round() as u64, l.toe_bits)?;
    w.s((eph.cic_rad / l.cic_scale).round() as i64, l.cic_bits)?;
    w.s((eph.omega0_semicircles / l.omega0_scale).round() as i64, l.omega0_bits)?;
    w.s((eph.cis_rad / l.cis_scale).round() as i64, l.cis_bits)?;
    w.s((eph.i0_semicircles / l.i0_scale).round() as i64, l.i0_bits)?;
    w.s((eph.crc_m / l.crc_scale).round() as i64, l.crc_bits)?;
    w.s((eph.omega_semicircles / l.omega_scale).round() as i64, l.omega_bits)?;
    w.s((eph.omega_dot_semicircles_s / l.omega_dot_scale).round() as i64, l.omega_dot_bits)?;
    w.s((eph.tgd_s / l.tgd_scale).round() as i64, l.tgd_bits)?;
    if l.health_bits > 0 {
        w.u(eph.health as u64, l.health_bits)?;
    }
    if l.has_l2p_flag {
        w.u(eph.l2p_data_flag as u64, 1)?;
    }
    if l.has_fit_interval {
        w.u(eph.fit_interval_flag as u64, 1)?;
    }
    Ok(w.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(constellation: Constellation) -> KeplerianEphemeris {
        KeplerianEphemeris {
            constellation,
            satellite: 7,
            week_number: 300,
            accuracy_code: 2,
            code_on_l2: 1,
            idot_semicircles_s: 1e-10,
            iode: 45,
            toc_s: 345_600.0,
            af2: 0.0,
            af1: 1e-12,
            af0: 1e-5,
            iodc: 45,
            crs_m: 12.5,
            delta_n_semicircles_s: 4e-9,
            m0_semicircles: 0.25,
            cuc_rad: 1e-7,
            eccentricity: 0.01,
            cus_rad: 2e-7,
            sqrt_a: 5153.7,
            toe_s: 345_600.0,
            cic_rad: -1e-7,
            omega0_semicircles: -0.5,
            cis_rad: 1e-8,
            i0_semicircles: 0.3,
            crc_m: 200.0,
            omega_semicircles: 0.1,
            omega_dot_semicircles_s: -8e-9,
            tgd_s: -1e-8,
            health: 0,
            l2p_data_flag: false,
            fit_interval_flag: false,
        }
    }

    #[test]
    fn gps_1019_round_trips() {
        let eph = sample(Constellation::Gps);
        let bytes = encode(&eph).unwrap();
        let decoded = decode(Constellation::Gps, &bytes).unwrap();
        assert_eq!(decoded.satellite, eph.satellite);
        assert_eq!(decoded.week_number, eph.week_number);
        assert!((decoded.eccentricity - eph.eccentricity).abs() < 1e-8);
        assert!((decoded.sqrt_a - eph.sqrt_a).abs() < 1e-5);
    }

    #[test]
    fn beidou_1042_round_trips() {
        let eph = sample(Constellation::BeiDou);
        let bytes = encode(&eph).unwrap();
        let decoded = decode(Constellation::BeiDou, &bytes).unwrap();
        assert_eq!(decoded.week_number, eph.week_number);
        assert!((decoded.toe_s - eph.toe_s).abs() < 8.0);
    }

    #[test]
    fn galileo_1046_round_trips() {
        let eph = sample(Constellation::Galileo);
        let bytes = encode(&eph).unwrap();
        let decoded = decode(Constellation::Galileo, &bytes).unwrap();
        assert_eq!(decoded.satellite, eph.satellite);
        assert!((decoded.crs_m - eph.crs_m).abs() < 1.0);
    }

    #[test]
    fn qzss_reuses_gps_layout() {
        let eph = sample(Constellation::Qzss);
        let bytes = encode(&eph).unwrap();
        let decoded = decode(Constellation::Qzss, &bytes).unwrap();
        assert_eq!(decoded.week_number, eph.week_number);
    }
}
