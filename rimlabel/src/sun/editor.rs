// SPDX-License-Identifier: MIT

//! Slot editing and expert header fields.

use alloc::format;

use crate::{
    context::{Disk, Units},
    dialog::NumberRequest,
    errors::*,
    notice::Notice,
    parttype::PartType,
};

use super::{SunLabel, layout::*, types::*, verify::fetch_extents};

const SWAP_AT_ZERO_PROMPT: &str = "It is highly recommended that the partition at offset 0 is UFS, EXT2FS \
     filesystem or SunOS swap. Putting Linux swap on it may destroy your partition table and bootblock. \
     Type YES if you're very sure you would like that partition tagged with 82 (Linux swap): ";

impl SunLabel {
    /// Adds slot `n`, asking the dialog for its first and last sector.
    pub fn add_partition(&mut self, disk: &mut Disk<'_>, n: usize, ty: Option<&PartType>) -> LabelResult {
        self.check_slot(disk, n)?;
        let order = self.order()?;
        let cs = Self::cylinder_sectors(disk)?;
        let sys = match ty {
            Some(t) => u16::try_from(t.code).map_err(|_| LabelError::InvalidArgument("partition type out of range"))?,
            None => SUN_TAG_LINUX_NATIVE,
        };

        let ext = {
            let h = SunHeader::new(&disk.firstsector, order);
            if h.num_sectors(n) != 0 && h.tag(n) != SUN_TAG_UNASSIGNED {
                disk.notices.push(Notice::err(
                    "sun.defined",
                    format!("Partition {} is already defined. Delete it before re-adding it.", n + 1),
                ));
                return Err(LabelError::InvalidArgument("partition is already defined"));
            }
            fetch_extents(&h, &disk.geom)
        };
        let total = disk.geom.total_sectors();

        let mut whole_disk = false;
        if ext.stop <= ext.start {
            if n == 2 {
                whole_disk = true;
            } else {
                disk.notices.push(Notice::err(
                    "sun.full",
                    "Other partitions already cover the whole disk. Delete some/shrink them before retry.",
                ));
                return Err(LabelError::NoSpace);
            }
        }

        let unit = disk.units.singular();
        let in_cylinders = disk.units == Units::Cylinders;
        let mut first;
        loop {
            let prompt = format!("First {unit}");
            let req = if whole_disk {
                NumberRequest::new(prompt, 0, 0).with_default(0)
            } else {
                NumberRequest::new(prompt, disk.scround(ext.start), disk.scround(ext.stop))
            };
            first = disk.ask_number(&req)?;
            if in_cylinders {
                first *= disk.units_per_sector;
            } else {
                first = first.div_ceil(cs) * cs;
            }

            if n == 2 && first != 0 {
                disk.notices.warn(
                    "sun.whole",
                    "It is highly recommended that the third partition covers the whole disk and is of type `Whole disk'",
                );
            }
            if !whole_disk && ext.is_allocated(first) {
                if n == 2 && first == 0 {
                    whole_disk = true;
                    break;
                }
                disk.notices.warn(
                    "sun.allocated",
                    format!("Sector {first} is already allocated"),
                );
                continue;
            }
            break;
        }
        if first >= total {
            return Err(LabelError::InvalidArgument("first sector is past the end of the disk"));
        }

        let stop2 = total;
        let stop = ext
            .starts
            .iter()
            .copied()
            .filter(|&s| s > first && s < total)
            .min()
            .unwrap_or(total);

        let prompt = format!("Last {unit} or +/-{unit} or +/-size{{K,M,G,T,P}}");
        let req = if whole_disk {
            let end = disk.scround(stop2);
            NumberRequest::new(prompt, end, end).with_default(end)
        } else if n == 2 && first == 0 {
            NumberRequest::new(prompt, disk.scround(first), disk.scround(stop2))
                .with_default(disk.scround(stop2))
                .with_base(disk.scround(first))
        } else {
            NumberRequest::new(prompt, disk.scround(first), disk.scround(stop))
                .with_default(disk.scround(stop))
                .with_base(disk.scround(first))
        };
        let mut last = disk.ask_number(&req)?;
        if in_cylinders {
            last *= disk.units_per_sector;
        }

        if n == 2 && first == 0 {
            if last >= stop2 {
                whole_disk = true;
                last = stop2;
            } else if last > stop {
                disk.notices.warn(
                    "sun.clamp",
                    format!(
                        "You haven't covered the whole disk with the 3rd partition, but your value \
                         {} {} covers some other partition. Your entry has been changed to {} {}",
                        disk.scround(last),
                        unit,
                        disk.scround(stop),
                        unit
                    ),
                );
                last = stop;
            }
        } else if !whole_disk && last > stop {
            disk.notices.warn(
                "sun.clamp",
                format!(
                    "Last {} {} overlaps the next partition, using {} {}",
                    unit,
                    disk.scround(last),
                    unit,
                    disk.scround(stop)
                ),
            );
            last = stop;
        }

        if last <= first {
            return Err(LabelError::InvalidArgument("last sector must be past the first sector"));
        }

        let sys = if whole_disk { SUN_TAG_BACKUP } else { sys };
        self.set_partition(disk, n, first, last, sys)?;
        disk.nparts_cur = SunHeader::new(&disk.firstsector, order).count_used();
        Ok(())
    }

    pub fn delete_partition(&mut self, disk: &mut Disk<'_>, n: usize) -> LabelResult {
        self.check_slot(disk, n)?;
        let order = self.order()?;
        let total = disk.geom.total_sectors();

        let mut h = SunHeaderMut::new(&mut disk.firstsector, order);
        let v = h.view();
        if n == 2 && v.tag(n) == SUN_TAG_BACKUP && v.start_cylinder(n) == 0 && v.num_sectors(n) as u64 == total {
            disk.notices.warn(
                "sun.whole",
                format!(
                    "If you want to maintain SunOS/Solaris compatibility, consider leaving this partition \
                     as Whole disk (5), starting at 0, with {} sectors",
                    v.num_sectors(n)
                ),
            );
        }
        h.set_tag(n, SUN_TAG_UNASSIGNED);
        h.set_num_sectors(n, 0);
        disk.nparts_cur = h.view().count_used();
        disk.changed = true;
        Ok(())
    }

    /// Retags slot `n`. Linux swap at cylinder 0 needs a typed `YES`.
    pub fn set_partition_type(&mut self, disk: &mut Disk<'_>, n: usize, ty: &PartType) -> LabelResult {
        self.check_slot(disk, n)?;
        let code = u16::try_from(ty.code).map_err(|_| LabelError::InvalidArgument("partition type out of range"))?;
        let order = self.order()?;

        if n == 2 && code != SUN_TAG_BACKUP {
            disk.notices.warn(
                "sun.whole",
                "Consider leaving partition 3 as Whole disk (5), as SunOS/Solaris expects it and even Linux likes it.",
            );
        }

        let start_cyl = SunHeader::new(&disk.firstsector, order).start_cylinder(n);
        if code == SUN_TAG_LINUX_SWAP && start_cyl == 0 {
            let confirmed = matches!(
                disk.ask_text(SWAP_AT_ZERO_PROMPT),
                Ok(answer) if answer.trim_end_matches(['\r', '\n']) == "YES"
            );
            if !confirmed {
                return Err(LabelError::UserDeclined);
            }
        }

        let mut h = SunHeaderMut::new(&mut disk.firstsector, order);
        let flag = h.view().flag(n);
        let flag = if SunPartitionKind::from_code(code).is_swap() {
            flag | SUN_FLAG_UNMNT
        } else {
            flag & !SUN_FLAG_UNMNT
        };
        h.set_flag(n, flag);
        h.set_tag(n, code);
        disk.changed = true;
        Ok(())
    }

    /// Flips `mask` bits ([`SUN_FLAG_UNMNT`], [`SUN_FLAG_RONLY`]) on slot `n`.
    pub fn toggle_flag(&mut self, disk: &mut Disk<'_>, n: usize, mask: u16) -> LabelResult {
        self.check_slot(disk, n)?;
        let order = self.order()?;
        let mut h = SunHeaderMut::new(&mut disk.firstsector, order);
        let flag = h.view().flag(n) ^ mask;
        h.set_flag(n, flag);
        disk.changed = true;
        Ok(())
    }

    pub fn set_alt_cylinders(&mut self, disk: &mut Disk<'_>, acyl: u16) -> LabelResult {
        self.edit_header(disk, |h| h.set_acyl(acyl))
    }

    /// Data cylinders; also becomes the context geometry.
    pub fn set_data_cylinders(&mut self, disk: &mut Disk<'_>, ncyl: u16) -> LabelResult {
        self.edit_header(disk, |h| h.set_ncyl(ncyl))?;
        disk.geom.cylinders = ncyl as u64;
        disk.update_units();
        Ok(())
    }

    /// Extra sectors per cylinder, at most one track.
    pub fn set_extra_sectors(&mut self, disk: &mut Disk<'_>, apc: u16) -> LabelResult {
        let nsect = self.header(disk)?.nsect();
        if apc > nsect {
            return Err(LabelError::InvalidArgument("extra sectors exceed sectors per track"));
        }
        self.edit_header(disk, |h| h.set_apc(apc))
    }

    pub fn set_interleave(&mut self, disk: &mut Disk<'_>, intrlv: u16) -> LabelResult {
        if !(1..=32).contains(&intrlv) {
            return Err(LabelError::InvalidArgument("interleave must be within 1..=32"));
        }
        self.edit_header(disk, |h| h.set_intrlv(intrlv))
    }

    pub fn set_rpm(&mut self, disk: &mut Disk<'_>, rpm: u16) -> LabelResult {
        if rpm == 0 {
            return Err(LabelError::InvalidArgument("rotation speed must be positive"));
        }
        self.edit_header(disk, |h| h.set_rpm(rpm))
    }

    pub fn set_physical_cylinders(&mut self, disk: &mut Disk<'_>, pcyl: u16) -> LabelResult {
        self.edit_header(disk, |h| h.set_pcyl(pcyl))
    }

    pub fn set_volume_id(&mut self, disk: &mut Disk<'_>, id: &str) -> LabelResult {
        self.edit_header(disk, |h| h.set_volume_id(id))
    }

    fn edit_header(&mut self, disk: &mut Disk<'_>, f: impl FnOnce(&mut SunHeaderMut<'_>)) -> LabelResult {
        let order = self.order()?;
        f(&mut SunHeaderMut::new(&mut disk.firstsector, order));
        disk.changed = true;
        Ok(())
    }
}
