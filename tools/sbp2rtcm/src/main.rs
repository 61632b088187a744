//! `sbp2rtcm`: stdin -> SBP decode -> RTCM3 encode -> stdout (spec §6 "CLI
//! surface"). Mirrors `ublox_cli`'s read-everything-then-parse loop.

use std::io::{self, Read, Write};

use clap::Parser;
use gnss_converters::{ObservationOutputMode, SbpToRtcm};
use sbp::constants::{MSG_BASE_POS_ECEF, MSG_EPHEMERIS_GLO, MSG_OBS};
use sbp::messages::{base_station, ephemeris, observation};

/// Translate an SBP stream to RTCM3.
#[derive(Parser)]
#[command(name = "sbp2rtcm", author, about)]
struct Args {
    /// RTCM3 reference-station ID to stamp onto emitted frames.
    #[arg(long, default_value_t = 0)]
    sender_id: u16,
    /// Emit MSM (default legacy 1004/1012) observations.
    #[arg(long)]
    msm: bool,
    /// Leap seconds to use for GLONASS ephemeris translation.
    #[arg(long)]
    leap_seconds: Option<u8>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mode = if args.msm { ObservationOutputMode::Msm } else { ObservationOutputMode::Legacy };
    let mut translator = SbpToRtcm::new(args.sender_id, mode);
    if let Some(leap_seconds) = args.leap_seconds {
        translator.set_leap_seconds(leap_seconds);
    }

    let mut input = Vec::new();
    if let Err(e) = io::stdin().lock().read_to_end(&mut input) {
        log::error!("sbp2rtcm: failed to read stdin: {e}");
        std::process::exit(1);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut offset = 0usize;

    while offset < input.len() {
        let (frame, consumed) = match sbp::framer::decode_frame(&input[offset..]) {
            Ok(result) => result,
            Err(sbp::Error::NeedMoreBytes) => break,
            Err(e) => {
                log::debug!("sbp2rtcm: frame error at byte {offset}: {e}");
                offset += 1;
                continue;
            }
        };

        match frame.msg_type {
            MSG_OBS => {
                if let Ok(frag) = observation::decode_fragment_pub(frame.payload) {
                    translator.push_observation(&frag, &mut |rtcm_msg| emit(&mut out, &rtcm_msg));
                }
            }
            MSG_BASE_POS_ECEF => {
                if let Ok(pos) = base_station::decode(frame.payload) {
                    let rtcm_msg = translator.base_position(&pos);
                    emit(&mut out, &rtcm_msg);
                }
            }
            MSG_EPHEMERIS_GLO => {
                if let Ok(eph) = ephemeris::decode_glonass(frame.payload) {
                    if let Some(rtcm_msg) = translator.glonass_ephemeris(&eph) {
                        emit(&mut out, &rtcm_msg);
                    } else {
                        log::debug!("sbp2rtcm: suppressing GLONASS ephemeris, leap seconds unknown");
                    }
                }
            }
            other => {
                // No RTCM counterpart built for this message type in this
                // build (spec §4.J: "Unknown SBP types ... wrapped in RTCM
                // 4062 ... unchanged").
                let rtcm_msg = translator.wrap_unknown(frame.payload.to_vec());
                log::debug!("sbp2rtcm: wrapping unhandled SBP type {other:#06x} in 4062");
                emit(&mut out, &rtcm_msg);
            }
        }

        offset += consumed;
    }
}

fn emit(out: &mut impl Write, message: &rtcm3::Message) {
    let payload = match rtcm3::encode_message(message) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("sbp2rtcm: failed to encode RTCM message: {e}");
            return;
        }
    };
    match rtcm3::framer::encode_frame(&payload, 0) {
        Ok(bytes) => {
            if let Err(e) = out.write_all(&bytes) {
                log::error!("sbp2rtcm: failed to write stdout: {e}");
            }
        }
        Err(e) => log::warn!("sbp2rtcm: failed to frame RTCM message: {e}"),
    }
}
