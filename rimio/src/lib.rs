// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod errors;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod stdio;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::RimIO;
    pub use super::RimIOLbaExt;
    pub use super::errors::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemRimIO;

    #[cfg(feature = "std")]
    pub use super::stdio::StdRimIO;
}

use errors::*;

/// Smallest sector size the label tools ever address.
pub const MIN_SECTOR_SIZE: u64 = 512;

/// Sector IO abstraction trait.
///
/// Allows read/write/flush at arbitrary byte offsets.
/// Implementations may target RAM, image files or block devices.
pub trait RimIO {
    /// Writes `data` at `offset` (absolute).
    fn write_at(&mut self, offset: u64, data: &[u8]) -> RimIOResult;

    /// Reads `buf.len()` bytes into `buf` from `offset` (absolute).
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> RimIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> RimIOResult;
}

impl<T: RimIO + ?Sized> RimIO for &mut T {
    #[inline]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> RimIOResult {
        (**self).write_at(offset, data)
    }

    #[inline]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> RimIOResult {
        (**self).read_at(offset, buf)
    }

    #[inline]
    fn flush(&mut self) -> RimIOResult {
        (**self).flush()
    }
}

/// Offset = LBA * sector_size (with overflow-check)
#[inline]
fn lba_offset(lba: u64, sector_size: u64) -> RimIOResult<u64> {
    lba.checked_mul(sector_size)
        .ok_or(RimIOError::Other("lba_offset overflow"))
}

/// "LBA-aware" helpers to avoid `* sector_size` everywhere.
pub trait RimIOLbaExt: RimIO {
    /// Reads `buf.len()` bytes starting from an LBA (offset = lba * sector_size).
    #[inline]
    fn read_at_lba(&mut self, lba: u64, sector_size: u64, buf: &mut [u8]) -> RimIOResult {
        let off = lba_offset(lba, sector_size)?;
        self.read_at(off, buf)
    }

    /// Writes `buf.len()` bytes starting from an LBA (offset = lba * sector_size).
    #[inline]
    fn write_at_lba(&mut self, lba: u64, sector_size: u64, data: &[u8]) -> RimIOResult {
        let off = lba_offset(lba, sector_size)?;
        self.write_at(off, data)
    }

    /// Writes exactly one sector at `lba` and flushes.
    ///
    /// `data` must be exactly `sector_size` bytes long; nothing is written otherwise.
    fn write_sector_sync(&mut self, lba: u64, sector_size: u64, data: &[u8]) -> RimIOResult {
        if data.len() as u64 != sector_size {
            return Err(RimIOError::Invalid("write_sector_sync: buffer is not one sector"));
        }
        self.write_at_lba(lba, sector_size, data)?;
        self.flush()
    }
}

impl<T: RimIO + ?Sized> RimIOLbaExt for T {}
