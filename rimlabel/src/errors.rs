// SPDX-License-Identifier: MIT

use core::fmt;

use rimio::errors::*;

/// Unified error type for disklabel drivers (Sun, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelError {
    /// Device read/write failed; the OS error code is kept in the inner error.
    IO(RimIOError),
    /// The buffer does not carry this driver's signature.
    NotThisFormat,
    /// Bad slot index, oversized tag, already defined slot, ...
    InvalidArgument(&'static str),
    /// No free region left for a new partition.
    NoSpace,
    /// A confirmation prompt was not answered with the required text.
    UserDeclined,
    /// No label is active on the context (or the driver has not probed/created one).
    NoLabel,
    Unsupported,
    Other(&'static str),
}

impl LabelError {
    pub fn msg(&self) -> &'static str {
        match self {
            LabelError::IO(e) => e.msg(),
            LabelError::NotThisFormat => "Disklabel signature not found",
            LabelError::InvalidArgument(msg) => msg,
            LabelError::NoSpace => "No free sectors available",
            LabelError::UserDeclined => "Operation declined",
            LabelError::NoLabel => "No disklabel in use",
            LabelError::Unsupported => "Unsupported",
            LabelError::Other(msg) => msg,
        }
    }

    /// Raw OS error code when the failure came from the device.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            LabelError::IO(e) => e.os_code(),
            _ => None,
        }
    }
}

impl From<&'static str> for LabelError {
    fn from(s: &'static str) -> Self {
        LabelError::Other(s)
    }
}

impl From<RimIOError> for LabelError {
    fn from(e: RimIOError) -> Self {
        LabelError::IO(e)
    }
}

impl fmt::Display for LabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelError::IO(e) => write!(f, "device I/O failed: {e}"),
            _ => write!(f, "{}", self.msg()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LabelError {}

pub type LabelResult<T = ()> = Result<T, LabelError>;
