//! RXM-RAWX (raw measurements) and RXM-SFRBX (broadcast navigation subframe
//! data), the two messages the UBX->SBP translator turns into observations
//! and ephemerides (spec §4.K).

use crate::error::Error;
use crate::reader::{Reader, Writer};
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RecStatFlags: u8 {
        const LEAP_SECOND_VALID = 1 << 0;
        const CLK_RESET = 1 << 1;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TrkStatFlags: u8 {
        const PR_VALID = 1 << 0;
        const CP_VALID = 1 << 1;
        const HALF_CYCLE = 1 << 2;
        const SUB_HALF_CYCLE = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawMeas {
    pub pr_mes_m: f64,
    pub cp_mes_cycles: f64,
    pub do_mes_hz: f32,
    pub gnss_id: u8,
    pub sv_id: u8,
    pub sig_id: u8,
    pub freq_id: u8,
    pub lock_time_ms: u16,
    pub cno_db_hz: u8,
    pub pr_stdev_m: f32,
    pub cp_stdev_cycles: f32,
    pub do_stdev_hz: f32,
    pub trk_stat: TrkStatFlags,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RxmRawx {
    pub rcv_tow_s: f64,
    pub week: i16,
    pub leap_s: i8,
    pub rec_stat: RecStatFlags,
    pub meas: Vec<RawMeas>,
}

const MEAS_BLOCK_LEN: usize = 32;

pub fn decode_rawx(payload: &[u8]) -> Result<RxmRawx, Error> {
    if payload.len() < 16 {
        return Err(Error::InvalidMessage("RXM-RAWX payload shorter than the fixed header"));
    }
    let mut r = Reader::new(payload);
    let rcv_tow_s = r.f64()?;
    let week = r.i16()?;
    let leap_s = r.i8()?;
    let num_meas = r.u8()?;
    let rec_stat = RecStatFlags::from_bits_truncate(r.u8()?);
    r.skip(1)?; // version
    r.skip(2)?; // reserved1

    if r.remaining() < num_meas as usize * MEAS_BLOCK_LEN {
        return Err(Error::InvalidMessage("RXM-RAWX payload too short for numMeas"));
    }

    let mut meas = Vec::with_capacity(num_meas as usize);
    for _ in 0..num_meas {
        let pr_mes_m = r.f64()?;
        let cp_mes_cycles = r.f64()?;
        let do_mes_hz = r.f32()?;
        let gnss_id = r.u8()?;
        let sv_id = r.u8()?;
        let sig_id = r.u8()?;
        let freq_id = r.u8()?;
        let lock_time_ms = r.u16()?;
        let cno_db_hz = r.u8()?;
        let pr_stdev_raw = r.u8()? & 0x0F;
        let cp_stdev_raw = r.u8()? & 0x0F;
        let do_stdev_raw = r.u8()? & 0x0F;
        let trk_stat = TrkStatFlags::from_bits_truncate(r.u8()?);
        r.skip(1)?; // reserved3

        meas.push(RawMeas {
            pr_mes_m,
            cp_mes_cycles,
            do_mes_hz,
            gnss_id,
            sv_id,
            sig_id,
            freq_id,
            lock_time_ms,
            cno_db_hz,
            pr_stdev_m: 0.01 * 2f32.powi(pr_stdev_raw as i32),
            cp_stdev_cycles: 0.004 * cp_stdev_raw as f32,
            do_stdev_hz: 0.002 * 2f32.powi(do_stdev_raw as i32),
            trk_stat,
        });
    }

    Ok(RxmRawx { rcv_tow_s, week, leap_s, rec_stat, meas })
}

pub fn encode_rawx(msg: &RxmRawx) -> Result<Vec<u8>, Error> {
    if msg.meas.len() > u8::MAX as usize {
        return Err(Error::InvalidMessage("RXM-RAWX cannot carry more than 255 measurements"));
    }
    let mut w = Writer::new();
    w.f64(msg.rcv_tow_s);
    w.i16(msg.week);
    w.i8(msg.leap_s);
    w.u8(msg.meas.len() as u8);
    w.u8(msg.rec_stat.bits());
    w.u8(1); // version
    w.zeros(2);
    for m in &msg.meas {
        w.f64(m.pr_mes_m);
        w.f64(m.cp_mes_cycles);
        w.f32(m.do_mes_hz);
        w.u8(m.gnss_id);
        w.u8(m.sv_id);
        w.u8(m.sig_id);
        w.u8(m.freq_id);
        w.u16(m.lock_time_ms);
        w.u8(m.cno_db_hz);
        w.u8(0);
        w.u8(0);
        w.u8(0);
        w.u8(m.trk_stat.bits());
        w.u8(0);
    }
    Ok(w.into_bytes())
}

/// One constellation's raw subframe words (spec §4.K "RXM-SFRBX -> per-
/// constellation subframe accumulator").
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RxmSfrbx {
    pub gnss_id: u8,
    pub sv_id: u8,
    pub sig_id: u8,
    pub freq_id: u8,
    pub words: Vec<u32>,
}

pub fn decode_sfrbx(payload: &[u8]) -> Result<RxmSfrbx, Error> {
    if payload.len() < 8 {
        return Err(Error::InvalidMessage("RXM-SFRBX payload shorter than the fixed header"));
    }
    let mut r = Reader::new(payload);
    let gnss_id = r.u8()?;
    let sv_id = r.u8()?;
    let sig_id = r.u8()?;
    let freq_id = r.u8()?;
    let num_words = r.u8()?;
    r.skip(1)?; // chn / reserved2
    r.skip(1)?; // version
    r.skip(1)?; // reserved1

    let mut words = Vec::with_capacity(num_words as usize);
    for _ in 0..num_words {
        words.push(r.u32()?);
    }
    Ok(RxmSfrbx { gnss_id, sv_id, sig_id, freq_id, words })
}

pub fn encode_sfrbx(msg: &RxmSfrbx) -> Result<Vec<u8>, Error> {
    if msg.words.len() > u8::MAX as usize {
        return Err(Error::InvalidMessage("RXM-SFRBX cannot carry more than 255 words"));
    }
    let mut w = Writer::new();
    w.u8(msg.gnss_id);
    w.u8(msg.sv_id);
    w.u8(msg.sig_id);
    w.u8(msg.freq_id);
    w.u8(msg.words.len() as u8);
    w.zeros(3);
    for word in &msg.words {
        w.u32(*word);
    }
    Ok(w.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rawx_round_trips() {
        let msg = RxmRawx {
            rcv_tow_s: 466_544.0,
            week: 2200,
            leap_s: 18,
            rec_stat: RecStatFlags::LEAP_SECOND_VALID,
            meas: vec![RawMeas {
                pr_mes_m: 22_500_000.0,
                cp_mes_cycles: 118_292_145.25,
                do_mes_hz: -1234.5,
                gnss_id: 0,
                sv_id: 6,
                sig_id: 0,
                freq_id: 0,
                lock_time_ms: 5000,
                cno_db_hz: 45,
                pr_stdev_m: 0.0,
                cp_stdev_cycles: 0.0,
                do_stdev_hz: 0.0,
                trk_stat: TrkStatFlags::PR_VALID | TrkStatFlags::CP_VALID,
            }],
        };
        let bytes = encode_rawx(&msg).unwrap();
        let decoded = decode_rawx(&bytes).unwrap();
        assert_eq!(decoded.meas.len(), 1);
        assert_eq!(decoded.week, 2200);
        assert!((decoded.meas[0].pr_mes_m - 22_500_000.0).abs() < 1e-6);
    }

    #[test]
    fn sfrbx_round_trips() {
        let msg = RxmSfrbx { gnss_id: 0, sv_id: 12, sig_id: 0, freq_id: 0, words: vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10] };
        let bytes = encode_sfrbx(&msg).unwrap();
        assert_eq!(decode_sfrbx(&bytes).unwrap(), msg);
    }
}
