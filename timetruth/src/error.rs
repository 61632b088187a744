use core::fmt;

/// Errors produced by the TimeTruth estimator pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A second `request_estimator` call for a `(source, kind)` already
    /// owned by a producer (spec §5 "enforced at `request_estimator` time").
    EstimatorAlreadyOwned,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EstimatorAlreadyOwned => {
                f.write_str("an estimator handle for this (source, kind) pair was already issued")
            }
        }
    }
}

impl std::error::Error for Error {}
