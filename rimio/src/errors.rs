// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for RimIO operations.
pub type RimIOResult<T = ()> = core::result::Result<T, RimIOError>;

/// Error type for RimIO operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RimIOError {
    /// Failure reported by the OS, carrying the raw error code.
    Os(i32),
    OutOfBounds,
    Unsupported,
    Invalid(&'static str),
    Other(&'static str),
}

impl RimIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            RimIOError::Os(_) => "OS error",
            RimIOError::OutOfBounds => "Out of bounds",
            RimIOError::Unsupported => "Unsupported operation",
            RimIOError::Invalid(msg) => msg,
            RimIOError::Other(msg) => msg,
        }
    }

    /// Raw OS error code, when the failure came from the OS.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            RimIOError::Os(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<&'static str> for RimIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        RimIOError::Other(msg)
    }
}

impl fmt::Display for RimIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RimIOError::Os(code) => write!(f, "{} (os error {code})", self.msg()),
            _ => write!(f, "{}", self.msg()),
        }
    }
}
