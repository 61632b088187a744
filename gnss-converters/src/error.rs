use core::fmt;

/// Errors produced by the matcher/adjuster/translator layer, on top of the
/// per-wire-format codec errors (spec §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A signal uses a code this implementation's table cannot map.
    UnsupportedCode,
    /// The SBP packer's output FIFO would overflow; oldest bytes were
    /// dropped to make room.
    BufferFull,
    /// Emission would require absolute time but TimeTruth has none.
    TimeUnknown,
    /// The caller asked for a configuration this module cannot satisfy.
    ConfigError(&'static str),
    Rtcm3(rtcm3::Error),
    Sbp(sbp::Error),
    Ubx(ubx::Error),
    TimeTruth(timetruth::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedCode => f.write_str("signal uses a code with no SBP mapping"),
            Error::BufferFull => f.write_str("output FIFO full, oldest bytes dropped"),
            Error::TimeUnknown => f.write_str("absolute time required but not yet resolved"),
            Error::ConfigError(reason) => write!(f, "configuration error: {reason}"),
            Error::Rtcm3(e) => write!(f, "{e}"),
            Error::Sbp(e) => write!(f, "{e}"),
            Error::Ubx(e) => write!(f, "{e}"),
            Error::TimeTruth(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<rtcm3::Error> for Error {
    fn from(e: rtcm3::Error) -> Self {
        Error::Rtcm3(e)
    }
}

impl From<sbp::Error> for Error {
    fn from(e: sbp::Error) -> Self {
        Error::Sbp(e)
    }
}

impl From<ubx::Error> for Error {
    fn from(e: ubx::Error) -> Self {
        Error::Ubx(e)
    }
}

impl From<timetruth::Error> for Error {
    fn from(e: timetruth::Error) -> Self {
        Error::TimeTruth(e)
    }
}
