// SPDX-License-Identifier: MIT

use alloc::{format, string::String, vec::Vec};

use crate::{
    context::Disk,
    errors::*,
    label::{LabelKind, LabelTable, TableEntry},
    parttype::PartType,
    utils::partname,
};

use super::{SunLabel, layout::*, types::*};

/// Decoded header fields, for reports and expert menus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SunHeaderInfo {
    pub order: ByteOrder,
    pub label_id: String,
    pub volume_id: String,
    pub version: u32,
    pub sanity: u32,
    pub num_partitions: u16,
    pub rpm: u16,
    pub pcyl: u16,
    pub apc: u16,
    pub intrlv: u16,
    pub ncyl: u16,
    pub acyl: u16,
    pub nhead: u16,
    pub nsect: u16,
    pub checksum: u16,
    pub checksum_ok: bool,
}

impl SunLabel {
    pub fn header_info(&self, disk: &Disk<'_>) -> LabelResult<SunHeaderInfo> {
        let h = self.header(disk)?;
        Ok(SunHeaderInfo {
            order: h.order(),
            label_id: h.label_id().into(),
            volume_id: h.volume_id().into(),
            version: h.version(),
            sanity: h.sanity(),
            num_partitions: h.num_partitions(),
            rpm: h.rpm(),
            pcyl: h.pcyl(),
            apc: h.apc(),
            intrlv: h.intrlv(),
            ncyl: h.ncyl(),
            acyl: h.acyl(),
            nhead: h.nhead(),
            nsect: h.nsect(),
            checksum: h.cksum(),
            checksum_ok: h.checksum_is_valid(),
        })
    }

    pub fn table(&self, disk: &Disk<'_>) -> LabelResult<LabelTable> {
        let h = self.header(disk)?;
        let cs = disk.geom.cylinder_sectors();

        let details = Vec::from([
            ("rpm", format!("{}", h.rpm())),
            ("alternate cylinders", format!("{}", h.acyl())),
            ("physical cylinders", format!("{}", h.pcyl())),
            ("extra sects/cyl", format!("{}", h.apc())),
            ("interleave", format!("{}", h.intrlv())),
            ("label id", h.label_id().into()),
            ("volume id", h.volume_id().into()),
        ]);

        let entries = (0..disk.nparts_max.min(SUN_NUM_PARTITIONS))
            .filter(|&i| h.num_sectors(i) != 0)
            .map(|i| {
                let len = h.num_sectors(i) as u64;
                let start = h.start_cylinder(i) as u64 * cs;
                let flag = h.flag(i);
                let mut flags = String::with_capacity(2);
                flags.push(if flag & SUN_FLAG_UNMNT != 0 { 'u' } else { ' ' });
                flags.push(if flag & SUN_FLAG_RONLY != 0 { 'r' } else { ' ' });
                TableEntry {
                    slot: i,
                    device: partname(&disk.path, i + 1),
                    flags,
                    start: disk.scround(start),
                    end: disk.scround(start + len),
                    blocks: len / 2,
                    odd: len & 1 != 0,
                    kind: PartType::from_catalog(SUN_PARTTYPES, h.tag(i) as u32),
                }
            })
            .collect();

        Ok(LabelTable {
            label: LabelKind::Sun,
            path: disk.path.clone(),
            geometry: disk.geom,
            units: disk.units,
            units_per_sector: disk.units_per_sector,
            sector_size: disk.sector_size,
            details,
            entries,
        })
    }
}
