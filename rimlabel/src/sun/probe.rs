// SPDX-License-Identifier: MIT

use alloc::format;

use crate::{context::Disk, context::Geometry, errors::*};

use super::{ProbeState, SunLabel, layout::*};

impl SunLabel {
    /// Recognizes a Sun label in the first sector.
    ///
    /// Returns `Ok(false)` without touching the context when the magic does
    /// not match. A bad checksum is reported but still counts as recognized so
    /// the caller may rebuild the label.
    pub fn probe_label(&mut self, disk: &mut Disk<'_>) -> LabelResult<bool> {
        let magic = [disk.firstsector[OFF_MAGIC], disk.firstsector[OFF_MAGIC + 1]];
        let Some(order) = ByteOrder::from_magic(magic) else {
            self.order = None;
            self.state = ProbeState::Unrecognized;
            return Ok(false);
        };
        self.order = Some(order);
        disk.nparts_max = SUN_NUM_PARTITIONS;

        let mut h = SunHeaderMut::new(&mut disk.firstsector, order);
        disk.nparts_cur = h.view().count_used();

        if !h.view().checksum_is_valid() {
            disk.notices.warn(
                "sun.checksum",
                "Detected sun disklabel with wrong checksum. Probably you'll have to set all the values, \
                 e.g. heads, sectors, cylinders and partitions or write a fresh label with `rimlabel create`",
            );
            self.state = ProbeState::ChecksumBad;
            return Ok(true);
        }

        disk.geom = Geometry::new(h.nhead() as u32, h.nsect() as u64, h.ncyl() as u64);

        let mut need_fixing = false;
        if h.version() != SUN_LABEL_VERSION {
            disk.notices.warn(
                "sun.version",
                format!("Detected sun disklabel with wrong version [{}].", h.version()),
            );
            need_fixing = true;
        }
        if h.sanity() != SUN_LABEL_SANE {
            disk.notices.warn(
                "sun.sanity",
                format!("Detected sun disklabel with wrong vtoc.sanity [0x{:08x}].", h.sanity()),
            );
            need_fixing = true;
        }
        if h.num_partitions() as usize != SUN_NUM_PARTITIONS {
            disk.notices.warn(
                "sun.nparts",
                format!("Detected sun disklabel with wrong vtoc.nparts [{}].", h.num_partitions()),
            );
            need_fixing = true;
        }

        if need_fixing {
            disk.notices
                .warn("sun.fixup", "Warning: Wrong values need to be fixed up and will be corrected by w(rite)");
            h.set_version(SUN_LABEL_VERSION);
            h.set_sanity(SUN_LABEL_SANE);
            h.set_num_partitions(SUN_NUM_PARTITIONS as u16);
            h.update_checksum();
            disk.changed = true;
            self.state = ProbeState::RecognizedStale;
        } else {
            self.state = ProbeState::RecognizedClean;
        }

        disk.update_units();
        Ok(true)
    }
}
