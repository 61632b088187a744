use core::fmt;

/// Errors produced by the UBX framer and message codecs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    NeedMoreBytes,
    InvalidChecksum { expected: u16, computed: u16 },
    InvalidMessage(&'static str),
    MessageTypeMismatch { expected: (u8, u8), got: (u8, u8) },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NeedMoreBytes => f.write_str("need more bytes to complete the frame"),
            Error::InvalidChecksum { expected, computed } => write!(
                f,
                "UBX checksum mismatch: frame trailer {expected:#06x}, computed {computed:#06x}"
            ),
            Error::InvalidMessage(reason) => write!(f, "invalid UBX message: {reason}"),
            Error::MessageTypeMismatch { expected, got } => write!(
                f,
                "decoder for class/id {expected:02x?} invoked on class/id {got:02x?}"
            ),
        }
    }
}

impl std::error::Error for Error {}
