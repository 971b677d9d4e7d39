// SPDX-License-Identifier: MIT

use alloc::format;

use crate::{
    context::{Disk, Geometry},
    dialog::NumberRequest,
    errors::*,
    utils::pretty_bytes,
};

use super::{ProbeState, SunLabel, layout::*, types::*};

/// Space reserved for swap on disks of at least 150 MiB.
const SWAP_RESERVE_SECTORS: u64 = 50 * 2048;
const SMALL_DISK_SECTORS: u64 = 150 * 2048;

/// Parameters used when writing a fresh label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunCreateOptions {
    pub byte_order: ByteOrder,
    pub rpm: u16,
    pub alt_cylinders: u16,
    pub interleave: u16,
}

impl Default for SunCreateOptions {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::Big,
            rpm: 5400,
            alt_cylinders: 2,
            interleave: 1,
        }
    }
}

impl SunCreateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    pub fn with_rpm(mut self, rpm: u16) -> Self {
        self.rpm = rpm;
        self
    }

    pub fn with_alt_cylinders(mut self, acyl: u16) -> Self {
        self.alt_cylinders = acyl;
        self
    }

    pub fn with_interleave(mut self, intrlv: u16) -> Self {
        self.interleave = intrlv;
        self
    }
}

impl SunLabel {
    /// Writes a fresh label into the first-sector buffer: root, swap and
    /// a whole-disk backup slot.
    pub fn create_label(&mut self, disk: &mut Disk<'_>) -> LabelResult {
        disk.notices.info("sun.create", "Building a new Sun disklabel.");

        let geom = self.resolve_geometry(disk)?;
        let order = self.options.byte_order;

        disk.zeroize_firstsector();
        self.order = Some(order);
        self.state = ProbeState::Created;
        disk.nparts_max = SUN_NUM_PARTITIONS;
        disk.geom = geom;
        disk.update_units();

        // resolve_geometry keeps every value within the 16-bit fields
        let (heads, sectors, cylinders) = (geom.heads as u16, geom.sectors as u16, geom.cylinders as u16);
        {
            let mut h = SunHeaderMut::new(&mut disk.firstsector, order);
            h.set_magic(SUN_LABEL_MAGIC);
            h.set_sanity(SUN_LABEL_SANE);
            h.set_version(SUN_LABEL_VERSION);
            h.set_num_partitions(SUN_NUM_PARTITIONS as u16);

            h.set_acyl(self.options.alt_cylinders);
            h.set_pcyl(cylinders);
            h.set_ncyl(cylinders);
            h.set_rpm(self.options.rpm);
            h.set_intrlv(self.options.interleave);
            h.set_apc(0);
            h.set_nhead(heads);
            h.set_nsect(sectors);

            h.set_label_id(&format!(
                "Linux cyl {} alt {} hd {} sec {}",
                cylinders, self.options.alt_cylinders, heads, sectors
            ));
        }

        let cs = geom.cylinder_sectors();
        let total = geom.total_sectors();
        let ndiv = if total >= SMALL_DISK_SECTORS {
            geom.cylinders.saturating_sub(SWAP_RESERVE_SECTORS / cs)
        } else {
            geom.cylinders * 2 / 3
        };

        self.set_partition(disk, 0, 0, ndiv * cs, SUN_TAG_LINUX_NATIVE)?;
        self.set_partition(disk, 1, ndiv * cs, total, SUN_TAG_LINUX_SWAP)?;
        self.set_partition(disk, 2, 0, total, SUN_TAG_BACKUP)?;

        let mut h = SunHeaderMut::new(&mut disk.firstsector, order);
        h.update_checksum();
        disk.nparts_cur = h.view().count_used();
        disk.changed = true;
        Ok(())
    }

    /// Geometry for a new label: device topology first, prompts otherwise.
    fn resolve_geometry(&self, disk: &mut Disk<'_>) -> LabelResult<Geometry> {
        let geom = match disk.topology.geometry {
            Some(g) if g.heads != 0 && g.sectors != 0 => {
                let sec_fac = (disk.sector_size / 512).max(1);
                let cylinders = match disk.topology.total_sectors {
                    Some(n) => {
                        let llcyls = n / (g.cylinder_sectors() * sec_fac);
                        if llcyls > u16::MAX as u64 {
                            disk.notices.warn(
                                "sun.cylinders",
                                format!(
                                    "{} cylinders do not fit a Sun disklabel, using {}.",
                                    llcyls,
                                    u16::MAX
                                ),
                            );
                            u16::MAX as u64
                        } else {
                            llcyls
                        }
                    }
                    None => {
                        disk.notices.warn(
                            "sun.geometry",
                            format!(
                                "Cannot get the size of {}. Using geometry cylinder value of {}. \
                                 This value may be truncated for devices > 33.8 GB.",
                                disk.path, g.cylinders
                            ),
                        );
                        g.cylinders.min(u16::MAX as u64)
                    }
                };
                Geometry::new(g.heads, g.sectors, cylinders)
            }
            _ => {
                let heads = disk.ask_number(&NumberRequest::new("Heads", 1, 1024).with_default(1))?;
                let sectors = disk.ask_number(&NumberRequest::new("Sectors/track", 1, 1024).with_default(1))?;
                let cylinders = disk.ask_number(&NumberRequest::new("Cylinders", 1, 65535).with_default(1))?;
                Geometry::new(heads as u32, sectors, cylinders)
            }
        };

        if geom.heads > u16::MAX as u32 || geom.sectors > u16::MAX as u64 {
            return Err(LabelError::InvalidArgument("heads or sectors do not fit a Sun disklabel"));
        }
        if geom.cylinders == 0 {
            return Err(LabelError::InvalidArgument("device is smaller than one cylinder"));
        }
        if geom.total_sectors() > u32::MAX as u64 {
            return Err(LabelError::InvalidArgument("device is too large for a Sun disklabel"));
        }
        Ok(geom)
    }

    /// Fills slot `i` with sectors `[start, stop)`; `start` is rounded down to a cylinder.
    pub(crate) fn set_partition(
        &mut self,
        disk: &mut Disk<'_>,
        i: usize,
        start: u64,
        stop: u64,
        sysid: u16,
    ) -> LabelResult {
        let cs = Self::cylinder_sectors(disk)?;
        let order = self.order()?;
        let len = stop
            .checked_sub(start)
            .and_then(|l| u32::try_from(l).ok())
            .ok_or(LabelError::InvalidArgument("partition does not fit a Sun slot"))?;
        let start_cyl =
            u32::try_from(start / cs).map_err(|_| LabelError::InvalidArgument("start cylinder out of range"))?;

        let kind = SunPartitionKind::from_code(sysid);
        let mut h = SunHeaderMut::new(&mut disk.firstsector, order);
        h.set_tag(i, sysid);
        h.set_flag(i, if kind.is_swap() { SUN_FLAG_UNMNT } else { 0 });
        h.set_start_cylinder(i, start_cyl);
        h.set_num_sectors(i, len);
        disk.changed = true;

        let kind_name = kind.name().unwrap_or("unknown");
        disk.notices.info(
            "sun.partition",
            format!(
                "Partition {} of type {} and of size {} is set",
                i + 1,
                kind_name,
                pretty_bytes(len as u64 * disk.sector_size)
            ),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::Topology,
        dialog::ScriptedDialog,
        label::Label,
        sun::SunHeader,
    };

    fn disk_with(geom: Geometry, total: Option<u64>) -> Disk<'static> {
        let mut topo = Topology::new().with_geometry(geom);
        topo.total_sectors = total;
        Disk::from_sector("disk.img", 512, &[0xFF; 512]).unwrap().with_topology(topo)
    }

    fn slot(h: &SunHeader<'_>, cs: u64, i: usize) -> (u64, u64, u16, u16) {
        let start = h.start_cylinder(i) as u64 * cs;
        (start, start + h.num_sectors(i) as u64, h.tag(i), h.flag(i))
    }

    #[test]
    fn small_disk_default_layout() {
        let mut disk = disk_with(Geometry::new(2, 18, 1000), Some(36_000));
        let mut label = SunLabel::new();
        label.create(&mut disk).unwrap();

        let h = label.header(&disk).unwrap();
        assert_eq!(slot(&h, 36, 0), (0, 23_976, SUN_TAG_LINUX_NATIVE, 0));
        assert_eq!(slot(&h, 36, 1), (23_976, 36_000, SUN_TAG_LINUX_SWAP, SUN_FLAG_UNMNT));
        assert_eq!(slot(&h, 36, 2), (0, 36_000, SUN_TAG_BACKUP, 0));
        for i in 3..8 {
            assert_eq!(h.num_sectors(i), 0);
        }
        assert_eq!(h.magic(), SUN_LABEL_MAGIC);
        assert_eq!(h.rpm(), 5400);
        assert_eq!(h.acyl(), 2);
        assert_eq!(h.pcyl(), 1000);
        assert_eq!(h.ncyl(), 1000);
        assert_eq!(h.intrlv(), 1);
        assert_eq!(h.label_id(), "Linux cyl 1000 alt 2 hd 2 sec 18");
        assert!(h.checksum_is_valid());

        assert!(disk.is_changed());
        assert_eq!(disk.nparts_cur(), 3);
        assert_eq!(label.state(), ProbeState::Created);
        assert_eq!(disk.notices().iter().filter(|n| n.code == "sun.partition").count(), 3);
    }

    #[test]
    fn large_disk_reserves_swap() {
        // 16 heads * 63 sectors = 1008 sectors per cylinder
        let mut disk = disk_with(Geometry::new(16, 63, 0), Some(1008 * 2000));
        let mut label = SunLabel::new();
        label.create(&mut disk).unwrap();

        let h = label.header(&disk).unwrap();
        let ndiv = 2000 - (50 * 2048) / 1008;
        assert_eq!(h.ncyl(), 2000);
        assert_eq!(h.num_sectors(0) as u64, ndiv * 1008);
        assert_eq!(h.start_cylinder(1) as u64, ndiv);
        assert_eq!(h.num_sectors(2) as u64, 1008 * 2000);
    }

    #[test]
    fn missing_size_falls_back_to_geometry() {
        let mut disk = disk_with(Geometry::new(2, 18, 1000), None);
        let mut label = SunLabel::new();
        label.create(&mut disk).unwrap();
        assert!(disk.notices().has("sun.geometry"));
        assert_eq!(disk.geometry().cylinders, 1000);
    }

    #[test]
    fn huge_cylinder_count_saturates() {
        let mut disk = disk_with(Geometry::new(1, 1, 0), Some(100_000));
        let mut label = SunLabel::new();
        label.create(&mut disk).unwrap();
        assert!(disk.notices().has("sun.cylinders"));
        assert_eq!(label.header(&disk).unwrap().ncyl(), 0xFFFF);
    }

    #[test]
    fn geometry_is_asked_without_topology() {
        let dialog = ScriptedDialog::new().number(4).number(32).number(100);
        let mut disk = Disk::from_sector("disk.img", 512, &[]).unwrap().with_dialog(dialog);
        let mut label = SunLabel::new();
        label.create(&mut disk).unwrap();
        assert_eq!(disk.geometry(), Geometry::new(4, 32, 100));
        assert_eq!(label.header(&disk).unwrap().nsect(), 32);
    }

    #[test]
    fn declined_geometry_leaves_sector_untouched() {
        let dialog = ScriptedDialog::new().number(4);
        let mut disk = Disk::from_sector("disk.img", 512, &[0x11; 512]).unwrap().with_dialog(dialog);
        let mut label = SunLabel::new();
        assert_eq!(label.create(&mut disk), Err(LabelError::UserDeclined));
        assert!(disk.first_sector().iter().all(|&b| b == 0x11));
        assert!(!disk.is_changed());
    }

    #[test]
    fn little_endian_create_is_probed_back() {
        let opts = SunCreateOptions::new().with_byte_order(ByteOrder::Little).with_rpm(3600);
        let mut disk = disk_with(Geometry::new(2, 18, 1000), Some(36_000));
        let mut label = SunLabel::with_options(opts);
        label.create(&mut disk).unwrap();
        assert_eq!(&disk.first_sector()[OFF_MAGIC..OFF_MAGIC + 2], &[0xBE, 0xDA]);

        let mut copy = Disk::from_sector("copy.img", 512, disk.first_sector()).unwrap();
        let mut probed = SunLabel::new();
        assert_eq!(probed.probe(&mut copy), Ok(true));
        assert_eq!(probed.state(), ProbeState::RecognizedClean);
        assert_eq!(probed.header(&copy).unwrap().rpm(), 3600);
    }

    #[test]
    fn partition_longer_than_slot_is_rejected() {
        let mut disk = disk_with(Geometry::new(2, 18, 1000), Some(36_000));
        let mut label = SunLabel::new();
        label.create(&mut disk).unwrap();
        let err = label.set_partition(&mut disk, 3, 0, u32::MAX as u64 + 1, SUN_TAG_LINUX_NATIVE);
        assert!(matches!(err, Err(LabelError::InvalidArgument(_))));
    }
}
