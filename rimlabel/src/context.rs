// SPDX-License-Identifier: MIT

use alloc::{boxed::Box, string::String, vec, vec::Vec};
use core::fmt;

use rimio::{MIN_SECTOR_SIZE, prelude::*};

use crate::{
    dialog::{Dialog, NumberRequest},
    errors::*,
    label::{Label, LabelKind, LabelTable, PartStatus, VerifyReport},
    notice::{Notice, Notices},
    parttype::PartType,
};

/// Legacy CHS geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geometry {
    pub heads: u32,
    pub sectors: u64,
    pub cylinders: u64,
}

impl Geometry {
    #[inline]
    pub const fn new(heads: u32, sectors: u64, cylinders: u64) -> Self {
        Self {
            heads,
            sectors,
            cylinders,
        }
    }

    /// Sectors per cylinder (heads * sectors per track).
    #[inline]
    pub fn cylinder_sectors(&self) -> u64 {
        (self.heads as u64).saturating_mul(self.sectors)
    }

    /// Capacity addressed by the geometry.
    #[inline]
    pub fn total_sectors(&self) -> u64 {
        self.cylinders.saturating_mul(self.cylinder_sectors())
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.cylinder_sectors() != 0
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} heads, {} sectors/track, {} cylinders",
            self.heads, self.sectors, self.cylinders
        )
    }
}

/// What the device-geometry query could tell about the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Topology {
    /// Geometry reported by the device (HDIO_GETGEO style), if any.
    pub geometry: Option<Geometry>,
    /// Device size in 512-byte sectors (BLKGETSIZE style), if known.
    pub total_sectors: Option<u64>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geometry(mut self, g: Geometry) -> Self {
        self.geometry = Some(g);
        self
    }

    pub fn with_total_sectors(mut self, n: u64) -> Self {
        self.total_sectors = Some(n);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Units {
    #[default]
    Sectors,
    Cylinders,
}

impl Units {
    pub fn singular(&self) -> &'static str {
        match self {
            Units::Sectors => "sector",
            Units::Cylinders => "cylinder",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Units::Sectors => "sectors",
            Units::Cylinders => "cylinders",
        }
    }
}

/// Device context: one open device, its first sector and the label bookkeeping.
///
/// The first-sector buffer is owned here; label drivers read and mutate it in place.
pub struct Disk<'io> {
    pub(crate) io: Option<&'io mut dyn RimIO>,
    pub(crate) path: String,
    pub(crate) sector_size: u64,
    pub(crate) firstsector: Vec<u8>,
    pub(crate) geom: Geometry,
    pub(crate) topology: Topology,
    pub(crate) units: Units,
    pub(crate) units_per_sector: u64,
    pub(crate) nparts_max: usize,
    pub(crate) nparts_cur: usize,
    pub(crate) changed: bool,
    pub(crate) notices: Notices,
    pub(crate) dialog: Option<Box<dyn Dialog + 'io>>,
}

impl<'io> Disk<'io> {
    /// Opens a device and loads its first sector.
    pub fn open(io: &'io mut dyn RimIO, path: impl Into<String>, sector_size: u64) -> LabelResult<Self> {
        check_sector_size(sector_size)?;
        let mut firstsector = vec![0u8; sector_size as usize];
        io.read_at_lba(0, sector_size, &mut firstsector)?;
        let mut disk = Self::bare(path.into(), sector_size, firstsector);
        disk.io = Some(io);
        Ok(disk)
    }

    /// Builds a detached context around an already loaded first sector.
    ///
    /// Shorter buffers are zero-padded to `sector_size`; such a context cannot write.
    pub fn from_sector(path: impl Into<String>, sector_size: u64, bytes: &[u8]) -> LabelResult<Self> {
        check_sector_size(sector_size)?;
        if bytes.len() as u64 > sector_size {
            return Err(LabelError::InvalidArgument("buffer larger than one sector"));
        }
        let mut firstsector = vec![0u8; sector_size as usize];
        firstsector[..bytes.len()].copy_from_slice(bytes);
        Ok(Self::bare(path.into(), sector_size, firstsector))
    }

    fn bare(path: String, sector_size: u64, firstsector: Vec<u8>) -> Self {
        Self {
            io: None,
            path,
            sector_size,
            firstsector,
            geom: Geometry::default(),
            topology: Topology::default(),
            units: Units::default(),
            units_per_sector: 1,
            nparts_max: 0,
            nparts_cur: 0,
            changed: false,
            notices: Notices::default(),
            dialog: None,
        }
    }

    pub fn with_dialog(mut self, dialog: impl Dialog + 'io) -> Self {
        self.dialog = Some(Box::new(dialog));
        self
    }

    pub fn set_dialog(&mut self, dialog: Box<dyn Dialog + 'io>) {
        self.dialog = Some(dialog);
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn set_topology(&mut self, topology: Topology) {
        self.topology = topology;
    }

    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn sector_size(&self) -> u64 {
        self.sector_size
    }

    #[inline]
    pub fn first_sector(&self) -> &[u8] {
        &self.firstsector
    }

    /// Raw access to the staged sector. Changes made here bypass the label driver.
    #[inline]
    pub fn first_sector_mut(&mut self) -> &mut [u8] {
        &mut self.firstsector
    }

    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geom
    }

    /// Overrides the in-memory geometry; call `reset_alignment` afterwards.
    pub fn set_geometry(&mut self, geom: Geometry) {
        self.geom = geom;
    }

    #[inline]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    #[inline]
    pub fn nparts_max(&self) -> usize {
        self.nparts_max
    }

    #[inline]
    pub fn nparts_cur(&self) -> usize {
        self.nparts_cur
    }

    #[inline]
    pub fn units(&self) -> Units {
        self.units
    }

    pub fn set_units(&mut self, units: Units) {
        self.units = units;
        self.update_units();
    }

    #[inline]
    pub fn units_per_sector(&self) -> u64 {
        self.units_per_sector
    }

    pub fn update_units(&mut self) {
        let cyl = self.geom.cylinder_sectors();
        self.units_per_sector = match self.units {
            Units::Cylinders if cyl != 0 => cyl,
            _ => 1,
        };
    }

    /// Sector count into display units, rounded up.
    #[inline]
    pub fn scround(&self, x: u64) -> u64 {
        x.div_ceil(self.units_per_sector.max(1))
    }

    pub fn zeroize_firstsector(&mut self) {
        self.firstsector.fill(0);
    }

    #[inline]
    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    /// Asks the dialog for a number and checks it against the request bounds.
    pub(crate) fn ask_number(&mut self, req: &NumberRequest) -> LabelResult<u64> {
        let dialog = self.dialog.as_mut().ok_or(LabelError::Unsupported)?;
        let v = dialog.ask_number(req)?;
        if !req.accepts(v) {
            return Err(LabelError::InvalidArgument("value out of range"));
        }
        Ok(v)
    }

    pub(crate) fn ask_text(&mut self, prompt: &str) -> LabelResult<String> {
        let dialog = self.dialog.as_mut().ok_or(LabelError::Unsupported)?;
        dialog.ask_text(prompt)
    }

    /// Seeks to sector zero and writes the whole first-sector buffer.
    pub(crate) fn write_first_sector(&mut self) -> LabelResult {
        let io = self.io.as_mut().ok_or(LabelError::Unsupported)?;
        io.write_sector_sync(0, self.sector_size, &self.firstsector)?;
        Ok(())
    }
}

impl fmt::Debug for Disk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disk")
            .field("path", &self.path)
            .field("sector_size", &self.sector_size)
            .field("geom", &self.geom)
            .field("units", &self.units)
            .field("nparts_max", &self.nparts_max)
            .field("nparts_cur", &self.nparts_cur)
            .field("changed", &self.changed)
            .finish_non_exhaustive()
    }
}

fn check_sector_size(sector_size: u64) -> LabelResult {
    if sector_size < MIN_SECTOR_SIZE || sector_size % MIN_SECTOR_SIZE != 0 {
        return Err(LabelError::InvalidArgument("sector size must be a multiple of 512"));
    }
    Ok(())
}

/// A device context hosting at most one active disklabel driver.
pub struct Context<'io> {
    disk: Disk<'io>,
    label: Option<Box<dyn Label>>,
}

impl<'io> Context<'io> {
    pub fn new(disk: Disk<'io>) -> Self {
        Self { disk, label: None }
    }

    #[inline]
    pub fn disk(&self) -> &Disk<'io> {
        &self.disk
    }

    #[inline]
    pub fn disk_mut(&mut self) -> &mut Disk<'io> {
        &mut self.disk
    }

    pub fn into_disk(self) -> Disk<'io> {
        self.disk
    }

    pub fn label(&self) -> Option<&dyn Label> {
        self.label.as_deref()
    }

    pub fn label_kind(&self) -> Option<LabelKind> {
        self.label.as_ref().map(|l| l.kind())
    }

    /// Tries each driver in order; the first one recognizing the sector becomes active.
    ///
    /// Drivers that do not recognize the buffer are dropped. Returns the kind found, if any.
    pub fn probe_labels(&mut self, drivers: Vec<Box<dyn Label>>) -> LabelResult<Option<LabelKind>> {
        for mut driver in drivers {
            if driver.probe(&mut self.disk)? {
                let kind = driver.kind();
                self.label = Some(driver);
                return Ok(Some(kind));
            }
        }
        Ok(None)
    }

    /// Replaces any active label with a fresh one built by `driver`.
    pub fn create_label(&mut self, mut driver: Box<dyn Label>) -> LabelResult {
        driver.create(&mut self.disk)?;
        self.label = Some(driver);
        Ok(())
    }

    /// Concrete driver access for format specific operations.
    pub fn driver_mut<T: Label>(&mut self) -> LabelResult<(&mut T, &mut Disk<'io>)> {
        let label = self.label.as_mut().ok_or(LabelError::NoLabel)?;
        let driver = label
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or(LabelError::Unsupported)?;
        Ok((driver, &mut self.disk))
    }

    pub fn driver<T: Label>(&self) -> LabelResult<(&T, &Disk<'io>)> {
        let label = self.label.as_ref().ok_or(LabelError::NoLabel)?;
        let driver = label.as_any().downcast_ref::<T>().ok_or(LabelError::Unsupported)?;
        Ok((driver, &self.disk))
    }

    fn active(&mut self) -> LabelResult<(&mut dyn Label, &mut Disk<'io>)> {
        let label = self.label.as_deref_mut().ok_or(LabelError::NoLabel)?;
        Ok((label, &mut self.disk))
    }

    fn active_ref(&self) -> LabelResult<(&dyn Label, &Disk<'io>)> {
        let label = self.label.as_deref().ok_or(LabelError::NoLabel)?;
        Ok((label, &self.disk))
    }

    pub fn parttypes(&self) -> LabelResult<&'static [PartType]> {
        Ok(self.active_ref()?.0.parttypes())
    }

    /// Catalog lookup in the active label; unknown codes yield an unknown type.
    pub fn parttype_from_code(&self, code: u32) -> LabelResult<PartType> {
        Ok(PartType::from_catalog(self.parttypes()?, code))
    }

    pub fn write(&mut self) -> LabelResult {
        let (label, disk) = self.active()?;
        label.write(disk)
    }

    pub fn verify(&self) -> LabelResult<VerifyReport> {
        let (label, disk) = self.active_ref()?;
        label.verify(disk)
    }

    pub fn part_add(&mut self, n: usize, ty: Option<&PartType>) -> LabelResult {
        let (label, disk) = self.active()?;
        label.part_add(disk, n, ty)
    }

    pub fn part_delete(&mut self, n: usize) -> LabelResult {
        let (label, disk) = self.active()?;
        label.part_delete(disk, n)
    }

    pub fn part_get_type(&self, n: usize) -> LabelResult<PartType> {
        let (label, disk) = self.active_ref()?;
        label.part_get_type(disk, n)
    }

    pub fn part_set_type(&mut self, n: usize, ty: &PartType) -> LabelResult {
        let (label, disk) = self.active()?;
        label.part_set_type(disk, n, ty)
    }

    pub fn part_get_status(&self, n: usize) -> LabelResult<PartStatus> {
        let (label, disk) = self.active_ref()?;
        label.part_get_status(disk, n)
    }

    pub fn reset_alignment(&mut self) -> LabelResult {
        let (label, disk) = self.active()?;
        label.reset_alignment(disk)
    }

    pub fn list_table(&self) -> LabelResult<LabelTable> {
        let (label, disk) = self.active_ref()?;
        label.list_table(disk)
    }
}
