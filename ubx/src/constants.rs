pub const SYNC_CHAR_1: u8 = 0xB5;
pub const SYNC_CHAR_2: u8 = 0x62;

/// sync(2) + class(1) + id(1) + length(2)
pub const HEADER_LEN: usize = 6;
pub const CHECKSUM_LEN: usize = 2;
pub const CLASS_OFFSET: usize = 2;
pub const ID_OFFSET: usize = 3;
pub const LENGTH_OFFSET: usize = 4;
pub const PAYLOAD_OFFSET: usize = 6;

pub const CLASS_NAV: u8 = 0x01;
pub const CLASS_RXM: u8 = 0x02;
pub const CLASS_ESF: u8 = 0x10;
pub const CLASS_MON: u8 = 0x0A;
pub const CLASS_HNR: u8 = 0x28;

pub const ID_NAV_POSECEF: u8 = 0x01;
pub const ID_NAV_STATUS: u8 = 0x03;
pub const ID_NAV_ATT: u8 = 0x05;
pub const ID_NAV_PVT: u8 = 0x07;
pub const ID_NAV_VELECEF: u8 = 0x11;
pub const ID_NAV_SAT: u8 = 0x35;

pub const ID_RXM_SFRBX: u8 = 0x13;
pub const ID_RXM_RAWX: u8 = 0x15;

pub const ID_ESF_MEAS: u8 = 0x02;
pub const ID_ESF_RAW: u8 = 0x03;

pub const ID_HNR_PVT: u8 = 0x00;

pub const ID_MON_HW: u8 = 0x09;

/// u-blox M8L IMU sensor-time tick scale (spec §6 "UBX wire format").
pub const IMU_SENSOR_TIME_SCALE_S: f64 = 39.0625e-6;
