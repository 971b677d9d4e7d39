// SPDX-License-Identifier: MIT

use crate::{RimIO, RimIOError, RimIOResult};

/// In-memory implementation of `RimIO`.
///
/// Useful for tests and RAM-backed disk images.
#[derive(Debug)]
pub struct MemRimIO<'a> {
    buffer: &'a mut [u8],
    flushes: u64,
}

impl<'a> MemRimIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, flushes: 0 }
    }

    /// Number of `flush` calls seen so far.
    #[inline]
    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    #[inline]
    fn range(&self, off: u64, len: usize) -> RimIOResult<core::ops::Range<usize>> {
        let end = off
            .checked_add(len as u64)
            .ok_or(RimIOError::OutOfBounds)?;
        if end > self.buffer.len() as u64 {
            return Err(RimIOError::OutOfBounds);
        }
        Ok(off as usize..end as usize)
    }
}

impl<'a> RimIO for MemRimIO<'a> {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> RimIOResult {
        let range = self.range(offset, data.len())?;
        self.buffer[range].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> RimIOResult {
        let range = self.range(offset, buf.len())?;
        buf.copy_from_slice(&self.buffer[range]);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> RimIOResult {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_rw() {
        let mut buf = [0u8; 256];
        let mut io = MemRimIO::new(&mut buf);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut buf = [0u8; 16];
        let mut io = MemRimIO::new(&mut buf);
        assert_eq!(io.write_at(14, &[0; 4]), Err(RimIOError::OutOfBounds));
        assert_eq!(io.read_at(u64::MAX, &mut [0; 1]), Err(RimIOError::OutOfBounds));
    }

    #[test]
    fn test_write_sector_sync() {
        let mut buf = [0u8; 1024];
        let mut io = MemRimIO::new(&mut buf);

        io.write_sector_sync(1, 512, &[0xAB; 512]).unwrap();
        assert_eq!(io.flushes(), 1);
        assert!(io.write_sector_sync(0, 512, &[0xAB; 100]).is_err());
        assert_eq!(io.flushes(), 1);

        let mut sector = [0u8; 512];
        io.read_at_lba(1, 512, &mut sector).unwrap();
        assert!(sector.iter().all(|&b| b == 0xAB));
        io.read_at_lba(0, 512, &mut sector).unwrap();
        assert!(sector.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_lba_overflow() {
        let mut buf = [0u8; 16];
        let mut io = MemRimIO::new(&mut buf);
        assert!(io.read_at_lba(u64::MAX, 512, &mut [0; 1]).is_err());
    }
}
