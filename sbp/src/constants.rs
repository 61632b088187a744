pub const PREAMBLE: u8 = 0x55;
pub const HEADER_LEN_BYTES: usize = 5; // msg_type(2) + sender_id(2) + length(1)
pub const CRC_LEN_BYTES: usize = 2;
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Maximum observations packed into a single fragment (spec §4.I: "14
/// observations per frame").
pub const MAX_OBS_PER_FRAME: usize = 14;
/// Maximum fragments per epoch: the 4-bit total-message-count nibble in
/// `n_obs` tops out at 15 (spec §4.I: "15 frames/epoch max").
pub const MAX_FRAMES_PER_EPOCH: usize = 15;
/// `MAX_OBS_PER_FRAME * MAX_FRAMES_PER_EPOCH`.
pub const MAX_OBS_PER_EPOCH: usize = MAX_OBS_PER_FRAME * MAX_FRAMES_PER_EPOCH;

pub const MSG_OBS: u16 = 0x004A;
pub const MSG_BASE_POS_ECEF: u16 = 0x0048;
pub const MSG_EPHEMERIS_GPS: u16 = 0x0086;
pub const MSG_EPHEMERIS_GLO: u16 = 0x0087;
pub const MSG_EPHEMERIS_GAL: u16 = 0x0095;
pub const MSG_EPHEMERIS_BDS: u16 = 0x0089;
pub const MSG_LOG: u16 = 0x0401;
pub const MSG_HEARTBEAT: u16 = 0xFFFF;
pub const MSG_IMU_RAW: u16 = 0x0900;
pub const MSG_IMU_AUX: u16 = 0x0901;
pub const MSG_ODOMETRY: u16 = 0x0903;
pub const MSG_WHEELTICK: u16 = 0x0904;
pub const MSG_GNSS_TIME_OFFSET: u16 = 0x0102;
pub const MSG_SBAS_RAW: u16 = 0x007B;
pub const MSG_SV_AZ_EL: u16 = 0x0097;
pub const MSG_MEASUREMENT_STATE: u16 = 0x00B5;
