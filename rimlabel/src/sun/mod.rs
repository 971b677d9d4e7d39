// SPDX-License-Identifier: MIT

//! Sun disklabel (SunOS/Solaris VTOC) driver.
//!
//! The label lives in the first 512 bytes of the device and describes eight
//! cylinder-aligned slots. Slot 3 (index 2) conventionally covers the whole disk.

pub mod create;
pub mod editor;
pub mod layout;
pub mod list;
pub mod probe;
pub mod types;
pub mod verify;

use core::any::Any;

use crate::{
    context::Disk,
    errors::*,
    label::{Label, LabelKind, LabelTable, PartStatus, VerifyReport},
    parttype::PartType,
};

pub use create::SunCreateOptions;
pub use layout::{ByteOrder, SUN_FLAG_RONLY, SUN_FLAG_UNMNT, SunHeader, SunHeaderMut};
pub use list::SunHeaderInfo;
pub use types::*;
pub use verify::{SlotExtents, analyze_extents, fetch_extents};

/// Outcome of the last probe (or create) on the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeState {
    #[default]
    NotProbed,
    Unrecognized,
    /// Magic matched but the checksum did not; geometry was left untouched.
    ChecksumBad,
    /// Version, sanity or slot count were repaired in memory.
    RecognizedStale,
    RecognizedClean,
    Created,
}

impl ProbeState {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, ProbeState::NotProbed | ProbeState::Unrecognized)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SunLabel {
    order: Option<ByteOrder>,
    state: ProbeState,
    options: SunCreateOptions,
}

impl SunLabel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SunCreateOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    #[inline]
    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// Byte order of the active label, fixed by probe or create.
    #[inline]
    pub fn byte_order(&self) -> Option<ByteOrder> {
        self.order
    }

    #[inline]
    pub fn options(&self) -> &SunCreateOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: SunCreateOptions) {
        self.options = options;
    }

    pub(crate) fn order(&self) -> LabelResult<ByteOrder> {
        match (self.order, self.state) {
            (Some(order), _) => Ok(order),
            (None, ProbeState::Unrecognized) => Err(LabelError::NotThisFormat),
            (None, _) => Err(LabelError::NoLabel),
        }
    }

    /// Read view over the disk's first sector.
    pub fn header<'d>(&self, disk: &'d Disk<'_>) -> LabelResult<SunHeader<'d>> {
        Ok(SunHeader::new(&disk.firstsector, self.order()?))
    }

    pub(crate) fn check_slot(&self, disk: &Disk<'_>, n: usize) -> LabelResult {
        if n >= disk.nparts_max {
            return Err(LabelError::InvalidArgument("partition number out of range"));
        }
        Ok(())
    }

    /// Sectors per cylinder; zero means the geometry was never established.
    pub(crate) fn cylinder_sectors(disk: &Disk<'_>) -> LabelResult<u64> {
        match disk.geom.cylinder_sectors() {
            0 => Err(LabelError::InvalidArgument("disk geometry is not set")),
            cs => Ok(cs),
        }
    }
}

impl Label for SunLabel {
    fn kind(&self) -> LabelKind {
        LabelKind::Sun
    }

    fn name(&self) -> &'static str {
        "sun"
    }

    fn parttypes(&self) -> &'static [PartType] {
        SUN_PARTTYPES
    }

    fn probe(&mut self, disk: &mut Disk<'_>) -> LabelResult<bool> {
        self.probe_label(disk)
    }

    fn write(&mut self, disk: &mut Disk<'_>) -> LabelResult {
        let order = self.order()?;
        SunHeaderMut::new(&mut disk.firstsector, order).update_checksum();
        disk.write_first_sector()?;
        disk.changed = false;
        Ok(())
    }

    fn verify(&self, disk: &Disk<'_>) -> LabelResult<VerifyReport> {
        self.verify_label(disk)
    }

    fn create(&mut self, disk: &mut Disk<'_>) -> LabelResult {
        self.create_label(disk)
    }

    fn part_add(&mut self, disk: &mut Disk<'_>, n: usize, ty: Option<&PartType>) -> LabelResult {
        self.add_partition(disk, n, ty)
    }

    fn part_delete(&mut self, disk: &mut Disk<'_>, n: usize) -> LabelResult {
        self.delete_partition(disk, n)
    }

    fn part_get_type(&self, disk: &Disk<'_>, n: usize) -> LabelResult<PartType> {
        self.check_slot(disk, n)?;
        let tag = self.header(disk)?.tag(n);
        Ok(PartType::from_catalog(SUN_PARTTYPES, tag as u32))
    }

    fn part_set_type(&mut self, disk: &mut Disk<'_>, n: usize, ty: &PartType) -> LabelResult {
        self.set_partition_type(disk, n, ty)
    }

    fn part_get_status(&self, disk: &Disk<'_>, n: usize) -> LabelResult<PartStatus> {
        self.check_slot(disk, n)?;
        Ok(match self.header(disk)?.num_sectors(n) {
            0 => PartStatus::None,
            _ => PartStatus::Used,
        })
    }

    fn reset_alignment(&mut self, disk: &mut Disk<'_>) -> LabelResult {
        disk.update_units();
        Ok(())
    }

    fn list_table(&self, disk: &Disk<'_>) -> LabelResult<LabelTable> {
        self.table(disk)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Geometry, Topology};

    fn fresh_disk() -> Disk<'static> {
        let topo = Topology::new()
            .with_geometry(Geometry::new(2, 18, 1000))
            .with_total_sectors(36_000);
        Disk::from_sector("disk.img", 512, &[]).unwrap().with_topology(topo)
    }

    #[test]
    fn operations_need_an_active_label() {
        let mut disk = fresh_disk();
        let label = SunLabel::new();
        disk.nparts_max = 8;
        assert_eq!(label.part_get_type(&disk, 0), Err(LabelError::NoLabel));
        assert_eq!(label.verify(&disk).err(), Some(LabelError::NoLabel));
    }

    #[test]
    fn status_follows_slot_length() {
        let mut disk = fresh_disk();
        let mut label = SunLabel::new();
        label.create(&mut disk).unwrap();
        assert_eq!(label.part_get_status(&disk, 0), Ok(PartStatus::Used));
        assert_eq!(label.part_get_status(&disk, 5), Ok(PartStatus::None));
        assert!(label.part_get_status(&disk, 8).is_err());
        assert_eq!(label.part_get_type(&disk, 2).unwrap().code, SUN_TAG_BACKUP as u32);
    }

    #[test]
    fn unknown_tag_is_reported_as_unknown() {
        let mut disk = fresh_disk();
        let mut label = SunLabel::new();
        label.create(&mut disk).unwrap();
        let order = label.byte_order().unwrap();
        SunHeaderMut::new(&mut disk.firstsector, order).set_tag(4, 0x42);
        let t = label.part_get_type(&disk, 4).unwrap();
        assert!(t.is_unknown());
        assert_eq!(t.code, 0x42);
    }

    #[test]
    fn write_without_device_keeps_dirty_flag() {
        let mut disk = fresh_disk();
        let mut label = SunLabel::new();
        label.create(&mut disk).unwrap();
        assert!(disk.is_changed());
        assert_eq!(label.write(&mut disk), Err(LabelError::Unsupported));
        assert!(disk.is_changed());
    }
}
