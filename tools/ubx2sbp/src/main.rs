//! `ubx2sbp`: stdin -> UBX decode -> SBP encode -> stdout (spec §6 "CLI
//! surface", "`--hnr` ... toggles").

use std::io::{self, Read, Write};
use std::sync::Arc;

use clap::Parser;
use gnss_converters::{SbpSink, UbxToSbp};
use sbp::constants::*;
use sbp::messages::base_station::BasePositionEcef;
use sbp::messages::ephemeris::{BeidouEphemeris, GalileoEphemeris, GlonassEphemeris, GpsEphemeris};
use sbp::messages::imu::{ImuAux, ImuRaw, Odometry, WheelTick};
use sbp::messages::logging::LogLevel;
use sbp::messages::observation::{self, ObservationSet};
use sbp::messages::sbas::SbasRawData;
use sbp::messages::sv_status::{MeasurementState, SvAzEl};
use sbp::messages::system::GnssTimeOffset;
use timetruth::{TimeTruth, TimeTruthSource};

/// Translate a UBX stream to SBP.
#[derive(Parser)]
#[command(name = "ubx2sbp", author, about)]
struct Args {
    /// SBP sender ID to stamp onto emitted frames.
    #[arg(long, default_value_t = 0)]
    sender_id: u16,
    /// Also decode HNR-PVT (high rate navigation) frames.
    #[arg(long)]
    hnr: bool,
}

struct StdoutSink<'a> {
    out: &'a mut dyn Write,
    sender_id: u16,
}

impl StdoutSink<'_> {
    fn write_frame(&mut self, msg_type: u16, payload: &[u8]) {
        match sbp::framer::encode_frame(msg_type, self.sender_id, payload) {
            Ok(bytes) => {
                if let Err(e) = self.out.write_all(&bytes) {
                    log::error!("ubx2sbp: failed to write stdout: {e}");
                }
            }
            Err(e) => log::warn!("ubx2sbp: failed to frame SBP message {msg_type:#06x}: {e}"),
        }
    }
}

impl SbpSink for StdoutSink<'_> {
    fn emit_obs(&mut self, obs: ObservationSet) {
        match observation::encode_fragments(&obs) {
            Ok(fragments) => {
                for payload in fragments {
                    self.write_frame(MSG_OBS, &payload);
                }
            }
            Err(e) => log::warn!("ubx2sbp: failed to fragment observation epoch: {e}"),
        }
    }

    fn emit_base_pos(&mut self, pos: BasePositionEcef) {
        if let Ok(payload) = sbp::messages::base_station::encode(&pos) {
            self.write_frame(MSG_BASE_POS_ECEF, &payload);
        }
    }

    fn emit_ephemeris_gps(&mut self, eph: GpsEphemeris) {
        if let Ok(payload) = sbp::messages::ephemeris::encode_gps(&eph) {
            self.write_frame(MSG_EPHEMERIS_GPS, &payload);
        }
    }

    fn emit_ephemeris_glonass(&mut self, eph: GlonassEphemeris) {
        if let Ok(payload) = sbp::messages::ephemeris::encode_glonass(&eph) {
            self.write_frame(MSG_EPHEMERIS_GLO, &payload);
        }
    }

    fn emit_ephemeris_galileo(&mut self, eph: GalileoEphemeris) {
        if let Ok(payload) = sbp::messages::ephemeris::encode_galileo(&eph) {
            self.write_frame(MSG_EPHEMERIS_GAL, &payload);
        }
    }

    fn emit_ephemeris_beidou(&mut self, eph: BeidouEphemeris) {
        if let Ok(payload) = sbp::messages::ephemeris::encode_beidou(&eph) {
            self.write_frame(MSG_EPHEMERIS_BDS, &payload);
        }
    }

    fn emit_log(&mut self, level: LogLevel, text: String) {
        let msg = sbp::messages::logging::LogMessage { level, text };
        if let Ok(payload) = sbp::messages::logging::encode(&msg) {
            self.write_frame(MSG_LOG, &payload);
        }
    }

    fn emit_imu_raw(&mut self, imu: ImuRaw) {
        if let Ok(payload) = sbp::messages::imu::encode_imu_raw(&imu) {
            self.write_frame(MSG_IMU_RAW, &payload);
        }
    }

    fn emit_imu_aux(&mut self, aux: ImuAux) {
        if let Ok(payload) = sbp::messages::imu::encode_imu_aux(&aux) {
            self.write_frame(MSG_IMU_AUX, &payload);
        }
    }

    fn emit_odometry(&mut self, odo: Odometry) {
        if let Ok(payload) = sbp::messages::imu::encode_odometry(&odo) {
            self.write_frame(MSG_ODOMETRY, &payload);
        }
    }

    fn emit_wheeltick(&mut self, tick: WheelTick) {
        if let Ok(payload) = sbp::messages::imu::encode_wheeltick(&tick) {
            self.write_frame(MSG_WHEELTICK, &payload);
        }
    }

    fn emit_gnss_time_offset(&mut self, offset: GnssTimeOffset) {
        if let Ok(payload) = sbp::messages::system::encode_gnss_time_offset(&offset) {
            self.write_frame(MSG_GNSS_TIME_OFFSET, &payload);
        }
    }

    fn emit_sbas_raw(&mut self, sbas: SbasRawData) {
        if let Ok(payload) = sbp::messages::sbas::encode(&sbas) {
            self.write_frame(MSG_SBAS_RAW, &payload);
        }
    }

    fn emit_sv_az_el(&mut self, az_el: SvAzEl) {
        if let Ok(payload) = sbp::messages::sv_status::encode_sv_az_el(&az_el) {
            self.write_frame(MSG_SV_AZ_EL, &payload);
        }
    }

    fn emit_measurement_state(&mut self, state: MeasurementState) {
        if let Ok(payload) = sbp::messages::sv_status::encode_measurement_state(&state) {
            self.write_frame(MSG_MEASUREMENT_STATE, &payload);
        }
    }

    fn emit_raw(&mut self, msg_type: u16, _sender_id: u16, payload: Vec<u8>) {
        self.write_frame(msg_type, &payload);
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let time_truth = Arc::new(TimeTruth::new());
    let mut translator = match UbxToSbp::new(time_truth, TimeTruthSource::Local) {
        Ok(t) => t,
        Err(e) => {
            log::error!("ubx2sbp: failed to set up translator: {e}");
            std::process::exit(1);
        }
    };

    let mut input = Vec::new();
    if let Err(e) = io::stdin().lock().read_to_end(&mut input) {
        log::error!("ubx2sbp: failed to read stdin: {e}");
        std::process::exit(1);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut sink = StdoutSink { out: &mut out, sender_id: args.sender_id };

    let mut offset = 0usize;
    while offset < input.len() {
        let (frame, consumed) = match ubx::framer::decode_frame(&input[offset..]) {
            Ok(result) => result,
            Err(ubx::Error::NeedMoreBytes) => break,
            Err(e) => {
                log::debug!("ubx2sbp: frame error at byte {offset}: {e}");
                offset += 1;
                continue;
            }
        };

        if frame.class == ubx::constants::CLASS_HNR && !args.hnr {
            offset += consumed;
            continue;
        }

        match ubx::messages::decode(frame.class, frame.id, frame.payload) {
            Ok(message) => translator.translate(&message, &mut sink),
            Err(e) => log::debug!("ubx2sbp: payload decode error at byte {offset}: {e}"),
        }

        offset += consumed;
    }
}
