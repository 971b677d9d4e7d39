// SPDX-License-Identifier: MIT

use alloc::{string::String, vec::Vec};
use core::{any::Any, fmt};

use crate::{
    context::{Disk, Geometry, Units},
    errors::*,
    parttype::PartType,
};

/// Disklabel formats known to the context. Only drivers linked in can be probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Dos,
    Sun,
    Sgi,
    Aix,
    Osf,
    Mac,
    Gpt,
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LabelKind::Dos => "dos",
            LabelKind::Sun => "sun",
            LabelKind::Sgi => "sgi",
            LabelKind::Aix => "aix",
            LabelKind::Osf => "osf",
            LabelKind::Mac => "mac",
            LabelKind::Gpt => "gpt",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartStatus {
    Used,
    None,
}

/// One finding of a label verification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyEvent {
    /// `slot` intersects `other` in sectors `[start, end)`.
    Overlap {
        slot: usize,
        other: usize,
        start: u64,
        end: u64,
    },
    /// The slot length is not a whole number of cylinders.
    NotCylinderAligned { slot: usize },
    /// Unused sectors `[start, end)`.
    Gap { start: u64, end: u64 },
    NoPartitions,
}

impl fmt::Display for VerifyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyEvent::Overlap { slot, start, end, .. } => write!(
                f,
                "Partition {} overlaps with others in sectors {start}-{end}",
                slot + 1
            ),
            VerifyEvent::NotCylinderAligned { slot } => {
                write!(f, "Partition {} doesn't end on cylinder boundary", slot + 1)
            }
            VerifyEvent::Gap { start, end } => write!(f, "Unused gap - sectors {start}-{end}"),
            VerifyEvent::NoPartitions => f.write_str("No partitions defined"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub events: Vec<VerifyEvent>,
}

impl VerifyReport {
    pub fn overlaps(&self) -> impl Iterator<Item = &VerifyEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, VerifyEvent::Overlap { .. }))
    }

    /// `(start, end)` of every unused gap, in disk order.
    pub fn gaps(&self) -> Vec<(u64, u64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                VerifyEvent::Gap { start, end } => Some((*start, *end)),
                _ => None,
            })
            .collect()
    }

    pub fn misaligned_slots(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| match e {
                VerifyEvent::NotCylinderAligned { slot } => Some(*slot),
                _ => None,
            })
            .collect()
    }

    pub fn has_partitions(&self) -> bool {
        !self.events.contains(&VerifyEvent::NoPartitions)
    }

    /// No overlap, no gap, no misalignment.
    pub fn is_clean(&self) -> bool {
        self.events.is_empty()
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.events {
            writeln!(f, "{e}")?;
        }
        Ok(())
    }
}

/// One used slot of a listing, positions expressed in display units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub slot: usize,
    pub device: String,
    /// Short flag column, e.g. "u " or "ur".
    pub flags: String,
    pub start: u64,
    pub end: u64,
    pub blocks: u64,
    /// Odd sector count (shown as a trailing `+` on blocks).
    pub odd: bool,
    pub kind: PartType,
}

/// Read projection of a partition table for report front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    pub label: LabelKind,
    pub path: String,
    pub geometry: Geometry,
    pub units: Units,
    pub units_per_sector: u64,
    pub sector_size: u64,
    /// Format specific header fields (name, value).
    pub details: Vec<(&'static str, String)>,
    pub entries: Vec<TableEntry>,
}

impl fmt::Display for LabelTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Disk {} ({} disk label): {} heads, {} sectors, {} cylinders",
            self.path, self.label, self.geometry.heads, self.geometry.sectors, self.geometry.cylinders
        )?;
        for (name, value) in &self.details {
            writeln!(f, "  {name}: {value}")?;
        }
        writeln!(
            f,
            "Units = {} of {} * {} bytes",
            self.units.plural(),
            self.units_per_sector,
            self.sector_size
        )?;
        let w = self
            .entries
            .iter()
            .map(|e| e.device.len())
            .max()
            .unwrap_or(0)
            .max("Device".len());
        writeln!(
            f,
            "{:>w$} Flag    Start       End    Blocks   Id  System",
            "Device"
        )?;
        for e in &self.entries {
            writeln!(
                f,
                "{:>w$} {:<2}  {:>9} {:>9} {:>9}{}  {:>2x}  {}",
                e.device,
                e.flags,
                e.start,
                e.end,
                e.blocks,
                if e.odd { '+' } else { ' ' },
                e.kind.code,
                e.kind
            )?;
        }
        Ok(())
    }
}

/// Operations every disklabel driver provides.
///
/// A driver keeps its own format state (byte order, probe outcome) and reads and
/// mutates the first-sector buffer owned by the [`Disk`]. Mutations are staged in
/// memory and only [`Label::write`] touches the device.
pub trait Label: Any {
    fn kind(&self) -> LabelKind;

    fn name(&self) -> &'static str;

    /// Partition-type catalog of this format.
    fn parttypes(&self) -> &'static [PartType];

    /// Recognizes the format in the loaded first sector.
    ///
    /// `Ok(false)` means "not this format": nothing was touched.
    fn probe(&mut self, disk: &mut Disk<'_>) -> LabelResult<bool>;

    /// Refreshes checksums and persists the label; the only device write.
    fn write(&mut self, disk: &mut Disk<'_>) -> LabelResult;

    /// Coverage report; never mutates the label.
    fn verify(&self, disk: &Disk<'_>) -> LabelResult<VerifyReport>;

    /// Overwrites the first-sector buffer with a fresh label of this format.
    fn create(&mut self, disk: &mut Disk<'_>) -> LabelResult;

    /// Adds partition `n`; without `ty`, the format's default type is used.
    fn part_add(&mut self, disk: &mut Disk<'_>, n: usize, ty: Option<&PartType>) -> LabelResult;

    fn part_delete(&mut self, disk: &mut Disk<'_>, n: usize) -> LabelResult;

    fn part_get_type(&self, disk: &Disk<'_>, n: usize) -> LabelResult<PartType>;

    fn part_set_type(&mut self, disk: &mut Disk<'_>, n: usize, ty: &PartType) -> LabelResult;

    fn part_get_status(&self, disk: &Disk<'_>, n: usize) -> LabelResult<PartStatus>;

    /// Recomputes display/alignment units after geometry changes.
    fn reset_alignment(&mut self, disk: &mut Disk<'_>) -> LabelResult;

    fn list_table(&self, disk: &Disk<'_>) -> LabelResult<LabelTable>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
