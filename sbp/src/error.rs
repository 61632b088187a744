use core::fmt;

/// Errors produced by the SBP framer and message codecs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    NeedMoreBytes,
    CrcMismatch { expected: u16, computed: u16 },
    InvalidMessage(&'static str),
    MessageTypeMismatch { expected: u16, got: u16 },
    /// A caller tried to pack more observations into one epoch than fit in
    /// 15 fragments of 14 observations each (spec §4.I "epoch
    /// fragmentation").
    TooManyObservations(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NeedMoreBytes => f.write_str("need more bytes to complete the frame"),
            Error::CrcMismatch { expected, computed } => write!(
                f,
                "CRC16 mismatch: frame trailer 0x{expected:04x}, computed 0x{computed:04x}"
            ),
            Error::InvalidMessage(reason) => write!(f, "invalid SBP message: {reason}"),
            Error::MessageTypeMismatch { expected, got } => {
                write!(f, "decoder for message type {expected:#06x} invoked on type {got:#06x}")
            }
            Error::TooManyObservations(n) => {
                write!(f, "{n} observations exceed the 210-per-epoch fragmentation limit")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<bitstream::BitError> for Error {
    fn from(_: bitstream::BitError) -> Self {
        Error::InvalidMessage("bit cursor ran past the end of the payload")
    }
}
