// SPDX-License-Identifier: MIT

use std::io::{Error, ErrorKind, Read, Seek, SeekFrom, Write};

use crate::{RimIO, RimIOError, RimIOResult};

/// `RimIO` over anything seekable: image files, block device nodes, cursors.
#[derive(Debug)]
pub struct StdRimIO<'a, T: Read + Write + Seek> {
    io: &'a mut T,
}

impl<'a, T: Read + Write + Seek> StdRimIO<'a, T> {
    #[inline]
    pub fn new(io: &'a mut T) -> Self {
        Self { io }
    }
}

impl<'a, T: Read + Write + Seek> RimIO for StdRimIO<'a, T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> RimIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> RimIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> RimIOResult {
        self.io.flush()?;
        Ok(())
    }
}

impl From<Error> for RimIOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        if let Some(code) = e.raw_os_error() {
            return RimIOError::Os(code);
        }
        match e.kind() {
            ErrorKind::UnexpectedEof => RimIOError::OutOfBounds,
            ErrorKind::WriteZero => RimIOError::Other("short write"),
            ErrorKind::InvalidInput => RimIOError::Invalid("invalid seek or buffer"),
            ErrorKind::Unsupported => RimIOError::Unsupported,
            _ => RimIOError::Other("I/O error"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::*;
    use std::io::Cursor;
    use tempfile::tempfile;

    #[test]
    fn test_rw() {
        let mut file = tempfile().unwrap();
        let mut io = StdRimIO::new(&mut file);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_sector_roundtrip_file() {
        let mut file = tempfile().unwrap();
        file.set_len(4096).unwrap();
        let mut io = StdRimIO::new(&mut file);

        io.write_sector_sync(0, 512, &[0x5A; 512]).unwrap();
        let mut sector = [0u8; 512];
        io.read_at_lba(0, 512, &mut sector).unwrap();
        assert!(sector.iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn test_short_read_is_out_of_bounds() {
        let mut cur = Cursor::new(vec![0u8; 100]);
        let mut io = StdRimIO::new(&mut cur);
        let mut buf = [0u8; 512];
        assert_eq!(io.read_at(0, &mut buf), Err(RimIOError::OutOfBounds));
    }

    #[test]
    fn test_os_error_code_preserved() {
        let e: RimIOError = Error::from_raw_os_error(28).into();
        assert_eq!(e, RimIOError::Os(28));
    }
}
