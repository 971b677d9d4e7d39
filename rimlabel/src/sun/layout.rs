// SPDX-License-Identifier: MIT

//! Sun disklabel sector layout and its byte-order aware codec.
//!
//! Every multi-byte field is read and written through [`ByteOrder`]; the order is
//! fixed per label instance from the magic found at probe time (or chosen at create).

use core::ops::Range;

pub const SUN_LABEL_SIZE: usize = 512;
pub const SUN_NUM_PARTITIONS: usize = 8;

pub const SUN_LABEL_MAGIC: u16 = 0xDABE;
pub const SUN_LABEL_MAGIC_SWAPPED: u16 = 0xBEDA;
pub const SUN_LABEL_SANE: u32 = 0x600D_DEEE;
pub const SUN_LABEL_VERSION: u32 = 0x0000_0001;

pub const SUN_FLAG_UNMNT: u16 = 0x01;
pub const SUN_FLAG_RONLY: u16 = 0x10;

pub const LABEL_ID: Range<usize> = 0..128;
pub const OFF_VERSION: usize = 128;
pub const VOLUME_ID: Range<usize> = 132..140;
pub const OFF_NUM_PARTITIONS: usize = 140;
/// 8 x { tag: u16, flag: u16 }
pub const OFF_PART_TAGS: usize = 142;
pub const OFF_SANITY: usize = 188;
pub const OFF_RPM: usize = 420;
pub const OFF_PCYL: usize = 422;
pub const OFF_APC: usize = 424;
pub const OFF_INTRLV: usize = 430;
pub const OFF_NCYL: usize = 432;
pub const OFF_ACYL: usize = 434;
pub const OFF_NHEAD: usize = 436;
pub const OFF_NSECT: usize = 438;
/// 8 x { start_cylinder: u32, num_sectors: u32 }
pub const OFF_PARTITIONS: usize = 444;
pub const OFF_MAGIC: usize = 508;
pub const OFF_CKSUM: usize = 510;

/// Byte order of the multi-byte fields of one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    /// Matches the two magic bytes against the native and swapped constants.
    #[inline]
    pub fn from_magic(bytes: [u8; 2]) -> Option<Self> {
        match u16::from_be_bytes(bytes) {
            SUN_LABEL_MAGIC => Some(ByteOrder::Big),
            SUN_LABEL_MAGIC_SWAPPED => Some(ByteOrder::Little),
            _ => None,
        }
    }

    #[inline]
    pub fn read_u16(self, buf: &[u8], off: usize) -> u16 {
        let b = [buf[off], buf[off + 1]];
        match self {
            ByteOrder::Big => u16::from_be_bytes(b),
            ByteOrder::Little => u16::from_le_bytes(b),
        }
    }

    #[inline]
    pub fn read_u32(self, buf: &[u8], off: usize) -> u32 {
        let b = [buf[off], buf[off + 1], buf[off + 2], buf[off + 3]];
        match self {
            ByteOrder::Big => u32::from_be_bytes(b),
            ByteOrder::Little => u32::from_le_bytes(b),
        }
    }

    #[inline]
    pub fn write_u16(self, buf: &mut [u8], off: usize, v: u16) {
        let b = match self {
            ByteOrder::Big => v.to_be_bytes(),
            ByteOrder::Little => v.to_le_bytes(),
        };
        buf[off..off + 2].copy_from_slice(&b);
    }

    #[inline]
    pub fn write_u32(self, buf: &mut [u8], off: usize, v: u32) {
        let b = match self {
            ByteOrder::Big => v.to_be_bytes(),
            ByteOrder::Little => v.to_le_bytes(),
        };
        buf[off..off + 4].copy_from_slice(&b);
    }
}

/// XOR of every 16-bit word in `buf[..end]` (`end` must be even).
#[inline]
pub fn xor_fold(buf: &[u8], end: usize, order: ByteOrder) -> u16 {
    (0..end)
        .step_by(2)
        .fold(0u16, |acc, off| acc ^ order.read_u16(buf, off))
}

/// Checksum value for the label: fold of all words before the checksum field.
#[inline]
pub fn compute_checksum(buf: &[u8], order: ByteOrder) -> u16 {
    xor_fold(buf, OFF_CKSUM, order)
}

/// Folding the whole label, checksum included, gives zero for a consistent label.
#[inline]
pub fn checksum_is_valid(buf: &[u8], order: ByteOrder) -> bool {
    xor_fold(buf, SUN_LABEL_SIZE, order) == 0
}

#[inline]
pub fn tag_offset(i: usize) -> usize {
    OFF_PART_TAGS + i * 4
}

#[inline]
pub fn flag_offset(i: usize) -> usize {
    tag_offset(i) + 2
}

#[inline]
pub fn start_cylinder_offset(i: usize) -> usize {
    OFF_PARTITIONS + i * 8
}

#[inline]
pub fn num_sectors_offset(i: usize) -> usize {
    start_cylinder_offset(i) + 4
}

/// Text up to the first NUL, lossy on invalid UTF-8.
fn c_text(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let raw = &bytes[..end];
    match core::str::from_utf8(raw) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&raw[..e.valid_up_to()]).unwrap_or(""),
    }
}

/// Writes `text` NUL-terminated into `dst`, truncating to fit.
fn put_c_text(dst: &mut [u8], text: &str) {
    dst.fill(0);
    let n = text.len().min(dst.len().saturating_sub(1));
    dst[..n].copy_from_slice(&text.as_bytes()[..n]);
}

/// Read-only typed view over a Sun label sector.
#[derive(Clone, Copy)]
pub struct SunHeader<'a> {
    buf: &'a [u8],
    order: ByteOrder,
}

/// Mutable typed view over a Sun label sector.
pub struct SunHeaderMut<'a> {
    buf: &'a mut [u8],
    order: ByteOrder,
}

macro_rules! sun_header_fields {
    ($($field:ident: $ty:ident @ $off:expr),+ $(,)?) => {
        paste::paste! {
            impl SunHeader<'_> {
                $(
                    #[inline]
                    pub fn $field(&self) -> $ty {
                        self.order.[<read_ $ty>](self.buf, $off)
                    }
                )+
            }

            impl SunHeaderMut<'_> {
                $(
                    #[inline]
                    pub fn $field(&self) -> $ty {
                        self.order.[<read_ $ty>](self.buf, $off)
                    }

                    #[inline]
                    pub fn [<set_ $field>](&mut self, v: $ty) {
                        self.order.[<write_ $ty>](self.buf, $off, v)
                    }
                )+
            }
        }
    };
}

sun_header_fields! {
    magic: u16 @ OFF_MAGIC,
    version: u32 @ OFF_VERSION,
    sanity: u32 @ OFF_SANITY,
    num_partitions: u16 @ OFF_NUM_PARTITIONS,
    rpm: u16 @ OFF_RPM,
    pcyl: u16 @ OFF_PCYL,
    apc: u16 @ OFF_APC,
    intrlv: u16 @ OFF_INTRLV,
    ncyl: u16 @ OFF_NCYL,
    acyl: u16 @ OFF_ACYL,
    nhead: u16 @ OFF_NHEAD,
    nsect: u16 @ OFF_NSECT,
    cksum: u16 @ OFF_CKSUM,
}

impl<'a> SunHeader<'a> {
    /// `buf` must hold at least [`SUN_LABEL_SIZE`] bytes.
    #[inline]
    pub fn new(buf: &'a [u8], order: ByteOrder) -> Self {
        debug_assert!(buf.len() >= SUN_LABEL_SIZE);
        Self { buf, order }
    }

    #[inline]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    #[inline]
    pub fn tag(&self, i: usize) -> u16 {
        self.order.read_u16(self.buf, tag_offset(i))
    }

    #[inline]
    pub fn flag(&self, i: usize) -> u16 {
        self.order.read_u16(self.buf, flag_offset(i))
    }

    #[inline]
    pub fn start_cylinder(&self, i: usize) -> u32 {
        self.order.read_u32(self.buf, start_cylinder_offset(i))
    }

    #[inline]
    pub fn num_sectors(&self, i: usize) -> u32 {
        self.order.read_u32(self.buf, num_sectors_offset(i))
    }

    pub fn label_id(&self) -> &'a str {
        c_text(&self.buf[LABEL_ID])
    }

    pub fn volume_id(&self) -> &'a str {
        c_text(&self.buf[VOLUME_ID])
    }

    pub fn checksum_is_valid(&self) -> bool {
        checksum_is_valid(self.buf, self.order)
    }

    /// Slots with a non-zero length.
    pub fn count_used(&self) -> usize {
        (0..SUN_NUM_PARTITIONS)
            .filter(|&i| self.num_sectors(i) != 0)
            .count()
    }
}

impl<'a> SunHeaderMut<'a> {
    #[inline]
    pub fn new(buf: &'a mut [u8], order: ByteOrder) -> Self {
        debug_assert!(buf.len() >= SUN_LABEL_SIZE);
        Self { buf, order }
    }

    #[inline]
    pub fn view(&self) -> SunHeader<'_> {
        SunHeader::new(self.buf, self.order)
    }

    #[inline]
    pub fn set_tag(&mut self, i: usize, v: u16) {
        self.order.write_u16(self.buf, tag_offset(i), v)
    }

    #[inline]
    pub fn set_flag(&mut self, i: usize, v: u16) {
        self.order.write_u16(self.buf, flag_offset(i), v)
    }

    #[inline]
    pub fn set_start_cylinder(&mut self, i: usize, v: u32) {
        self.order.write_u32(self.buf, start_cylinder_offset(i), v)
    }

    #[inline]
    pub fn set_num_sectors(&mut self, i: usize, v: u32) {
        self.order.write_u32(self.buf, num_sectors_offset(i), v)
    }

    pub fn set_label_id(&mut self, text: &str) {
        put_c_text(&mut self.buf[LABEL_ID], text);
    }

    pub fn set_volume_id(&mut self, text: &str) {
        put_c_text(&mut self.buf[VOLUME_ID], text);
    }

    /// Recomputes and stores the checksum over the words preceding it.
    pub fn update_checksum(&mut self) -> u16 {
        let csum = compute_checksum(self.buf, self.order);
        self.set_cksum(csum);
        csum
    }
}
