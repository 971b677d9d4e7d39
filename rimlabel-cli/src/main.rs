// SPDX-License-Identifier: MIT

mod dialog;
mod layout;
mod log;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use rimio::prelude::*;
use rimlabel::dialog::Answer;
use rimlabel::prelude::*;
use rimlabel::sun::{ByteOrder, SUN_FLAG_RONLY, SUN_FLAG_UNMNT, SUN_TAG_BACKUP, fetch_extents};
use rimlabel::DEFAULT_SECTOR_SIZE;

use crate::dialog::CliDialog;
use crate::layout::{Extent, Layout};
use crate::log::{LogLevel, print_notices, set_log_level};

#[derive(Parser)]
#[command(name = "rimlabel", version, about = "Sun disklabel editor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Logical sector size in bytes
    #[arg(long, global = true, default_value_t = DEFAULT_SECTOR_SIZE)]
    sector_size: u64,

    /// Display units for positions
    #[arg(long, global = true, value_enum, default_value_t = UnitsArg::Sectors)]
    units: UnitsArg,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    /// Ask on stdin for values not given on the command line
    #[arg(short, long, global = true)]
    interactive: bool,

    /// Only print what would be done, don't write the label
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum UnitsArg {
    Sectors,
    Cylinders,
}

impl From<UnitsArg> for Units {
    fn from(u: UnitsArg) -> Self {
        match u {
            UnitsArg::Sectors => Units::Sectors,
            UnitsArg::Cylinders => Units::Cylinders,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the partition table
    Print {
        device: PathBuf,
        /// Also dump the raw header fields
        #[arg(long)]
        extra: bool,
    },
    /// Check slots for overlaps, gaps and misalignment
    Verify { device: PathBuf },
    /// Write a fresh Sun disklabel
    Create {
        device: PathBuf,
        #[arg(long)]
        heads: Option<u32>,
        #[arg(long)]
        sectors: Option<u64>,
        #[arg(long)]
        cylinders: Option<u64>,
        /// Store the label little-endian (x86 Solaris style)
        #[arg(long)]
        little_endian: bool,
    },
    /// Add a partition in a free region
    Add {
        device: PathBuf,
        /// Slot number (1-8)
        slot: usize,
        /// Partition type code (hex)
        #[arg(long = "type", value_parser = parse_code)]
        kind: Option<u32>,
        /// First position in display units (N, +N, +512M)
        #[arg(long, allow_hyphen_values = true)]
        first: Option<String>,
        /// End position (exclusive) in display units (N, +N, -N, +512M)
        #[arg(long, allow_hyphen_values = true)]
        last: Option<String>,
    },
    /// Delete a partition
    Delete { device: PathBuf, slot: usize },
    /// Change a partition type
    SetType {
        device: PathBuf,
        slot: usize,
        #[arg(value_parser = parse_code)]
        code: u32,
        /// Confirm Linux swap at cylinder 0
        #[arg(long)]
        yes: bool,
    },
    /// Toggle slot flags
    Toggle {
        device: PathBuf,
        slot: usize,
        #[arg(long)]
        unmountable: bool,
        #[arg(long)]
        read_only: bool,
    },
    /// Show or change drive header fields
    Geometry {
        device: PathBuf,
        #[arg(long)]
        rpm: Option<u16>,
        #[arg(long)]
        pcyl: Option<u16>,
        #[arg(long)]
        ncyl: Option<u16>,
        #[arg(long)]
        acyl: Option<u16>,
        #[arg(long)]
        apc: Option<u16>,
        #[arg(long)]
        interleave: Option<u16>,
        #[arg(long)]
        volume_id: Option<String>,
    },
    /// Create a label from a layout.toml
    Apply {
        device: PathBuf,
        #[arg(short, long, default_value = "layout.toml")]
        layout: PathBuf,
    },
}

/// Hex partition type code, with or without `0x`.
fn parse_code(s: &str) -> Result<u32, String> {
    let digits = s.trim().trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid type code '{s}': {e}"))
}

fn slot_index(slot: usize) -> anyhow::Result<usize> {
    match slot {
        1..=8 => Ok(slot - 1),
        _ => bail!("slot {slot} is outside 1-8"),
    }
}

/// Device size in 512-byte sectors for a CHS geometry.
fn chs_sectors(cylinders: u64, heads: u32, sectors: u64, sec_fac: u64) -> anyhow::Result<u64> {
    match cylinders
        .checked_mul(heads as u64)
        .and_then(|n| n.checked_mul(sectors))
        .and_then(|n| n.checked_mul(sec_fac))
    {
        Some(n) => Ok(n),
        None => bail!("geometry {cylinders}x{heads}x{sectors} is too large"),
    }
}

fn main() -> anyhow::Result<()> {
    run(&Cli::parse())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    set_log_level(match (cli.quiet, cli.verbose) {
        (true, _) => LogLevel::Quiet,
        (false, true) => LogLevel::Verbose,
        _ => LogLevel::Normal,
    });

    match &cli.command {
        Commands::Print { device, extra } => session(cli, device, false, |cxt| {
            probe_sun(cxt)?;
            log_normal!("{}", cxt.list_table()?);
            if *extra {
                let (label, disk) = cxt.driver::<SunLabel>()?;
                let info = label.header_info(disk)?;
                log_normal!("{info:#?}");
            }
            Ok(())
        }),
        Commands::Verify { device } => session(cli, device, false, |cxt| {
            probe_sun(cxt)?;
            let report = cxt.verify()?;
            if report.is_clean() {
                log_info!("No errors detected.");
            }
            for event in &report.events {
                log_warn!("{event}");
            }
            Ok(())
        }),
        Commands::Create {
            device,
            heads,
            sectors,
            cylinders,
            little_endian,
        } => session(cli, device, true, |cxt| {
            if probe_labels(cxt)?.is_some() {
                log_warn!("Replacing the existing Sun disklabel on {}", device.display());
            }
            let sec_fac = (cli.sector_size / 512).max(1);
            match (heads, sectors) {
                (Some(h), Some(s)) => {
                    let mut topo = *cxt.disk().topology();
                    topo.geometry = Some(Geometry::new(*h, *s, cylinders.unwrap_or(0)));
                    if let Some(c) = cylinders {
                        topo.total_sectors = Some(chs_sectors(*c, *h, *s, sec_fac)?);
                    }
                    cxt.disk_mut().set_topology(topo);
                }
                _ if !cli.interactive => {
                    bail!("device geometry unknown: pass --heads and --sectors, or --interactive")
                }
                _ => {
                    let mut dialog = CliDialog::new(true, cli.sector_size);
                    for v in [heads.map(u64::from), *sectors, *cylinders].into_iter().flatten() {
                        dialog.push(Answer::Number(v));
                    }
                    cxt.disk_mut().set_dialog(Box::new(dialog));
                }
            }
            let order = if *little_endian { ByteOrder::Little } else { ByteOrder::Big };
            let opts = SunCreateOptions::new().with_byte_order(order);
            cxt.create_label(Box::new(SunLabel::with_options(opts)))?;
            log_normal!("{}", cxt.list_table()?);
            Ok(())
        }),
        Commands::Add {
            device,
            slot,
            kind,
            first,
            last,
        } => session(cli, device, true, |cxt| {
            let n = slot_index(*slot)?;
            probe_sun(cxt)?;
            let ty = kind.map(|code| cxt.parttype_from_code(code)).transpose()?;

            let mut dialog = cli_dialog(cli, cxt);
            match first {
                Some(v) => dialog.push(Answer::Text(v.clone())),
                None if cli.interactive => {}
                None => dialog.push(free_start(cxt, n)?),
            }
            dialog.push_or_default(last.as_deref());
            cxt.disk_mut().set_dialog(Box::new(dialog));

            cxt.part_add(n, ty.as_ref())?;
            log_info!("Partition {} added.", slot);
            Ok(())
        }),
        Commands::Delete { device, slot } => session(cli, device, true, |cxt| {
            let n = slot_index(*slot)?;
            probe_sun(cxt)?;
            cxt.part_delete(n)?;
            log_info!("Partition {} has been deleted.", slot);
            Ok(())
        }),
        Commands::SetType {
            device,
            slot,
            code,
            yes,
        } => session(cli, device, true, |cxt| {
            let n = slot_index(*slot)?;
            probe_sun(cxt)?;
            let ty = cxt.parttype_from_code(*code)?;
            let mut dialog = cli_dialog(cli, cxt);
            if *yes {
                dialog.push(Answer::Text("YES".into()));
            }
            cxt.disk_mut().set_dialog(Box::new(dialog));
            cxt.part_set_type(n, &ty)?;
            log_info!("Changed type of partition {} to '{}'.", slot, ty);
            Ok(())
        }),
        Commands::Toggle {
            device,
            slot,
            unmountable,
            read_only,
        } => session(cli, device, true, |cxt| {
            let n = slot_index(*slot)?;
            probe_sun(cxt)?;
            let mask = (if *unmountable { SUN_FLAG_UNMNT } else { 0 }) | (if *read_only { SUN_FLAG_RONLY } else { 0 });
            if mask == 0 {
                bail!("nothing to toggle: pass --unmountable and/or --read-only");
            }
            let (label, disk) = cxt.driver_mut::<SunLabel>()?;
            label.toggle_flag(disk, n, mask)?;
            Ok(())
        }),
        Commands::Geometry {
            device,
            rpm,
            pcyl,
            ncyl,
            acyl,
            apc,
            interleave,
            volume_id,
        } => session(cli, device, true, |cxt| {
            probe_sun(cxt)?;
            let (label, disk) = cxt.driver_mut::<SunLabel>()?;
            if let Some(v) = rpm {
                label.set_rpm(disk, *v)?;
            }
            if let Some(v) = pcyl {
                label.set_physical_cylinders(disk, *v)?;
            }
            if let Some(v) = ncyl {
                label.set_data_cylinders(disk, *v)?;
            }
            if let Some(v) = acyl {
                label.set_alt_cylinders(disk, *v)?;
            }
            if let Some(v) = apc {
                label.set_extra_sectors(disk, *v)?;
            }
            if let Some(v) = interleave {
                label.set_interleave(disk, *v)?;
            }
            if let Some(v) = volume_id {
                label.set_volume_id(disk, v)?;
            }
            log_normal!("{:#?}", label.header_info(disk)?);
            Ok(())
        }),
        Commands::Apply { device, layout } => {
            let layout = Layout::from_file(layout).with_context(|| format!("reading {}", layout.display()))?;
            log_info!("{layout}");
            session(cli, device, true, |cxt| apply_layout(cli, cxt, &layout))
        }
    }
}

/// Opens `device`, runs `f` on its context, then prints notices and persists
/// pending changes.
fn session(
    cli: &Cli,
    device: &Path,
    writable: bool,
    f: impl FnOnce(&mut Context<'_>) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(writable && !cli.dry_run)
        .open(device)
        .with_context(|| format!("cannot open {}", device.display()))?;
    let size = file.seek(SeekFrom::End(0))?;
    log_verbose!("{}: {} bytes", device.display(), size);

    let mut io = StdRimIO::new(&mut file);
    let disk = Disk::open(&mut io, device.display().to_string(), cli.sector_size)?
        .with_topology(Topology::new().with_total_sectors(size / 512));
    let mut cxt = Context::new(disk);
    cxt.disk_mut().set_units(cli.units.into());

    let result = f(&mut cxt);
    print_notices(&cxt.disk_mut().take_notices());
    result?;

    if cxt.disk().is_changed() {
        if !writable {
            log_info!("The label was repaired in memory only; run a write command to persist it.");
        } else if cli.dry_run {
            log_info!("Dry run mode: no data will be written.");
        } else {
            cxt.write()?;
            log_info!("The partition table has been altered.");
        }
    }
    Ok(())
}

fn probe_labels(cxt: &mut Context<'_>) -> anyhow::Result<Option<LabelKind>> {
    Ok(cxt.probe_labels(vec![Box::new(SunLabel::new())])?)
}

fn probe_sun(cxt: &mut Context<'_>) -> anyhow::Result<()> {
    match probe_labels(cxt)? {
        Some(kind) => {
            log_verbose!("Found a {kind} disklabel on {}", cxt.disk().path());
            Ok(())
        }
        None => bail!("{}: no Sun disklabel found", cxt.disk().path()),
    }
}

fn cli_dialog(cli: &Cli, cxt: &Context<'_>) -> CliDialog {
    let unit_bytes = cxt.disk().units_per_sector() * cli.sector_size;
    CliDialog::new(cli.interactive, unit_bytes)
}

/// First free position offered for slot `n` when none was given.
fn free_start(cxt: &Context<'_>, n: usize) -> anyhow::Result<Answer> {
    let (label, disk) = cxt.driver::<SunLabel>()?;
    let ext = fetch_extents(&label.header(disk)?, &disk.geometry());
    if ext.stop <= ext.start && n == 2 {
        return Ok(Answer::Default);
    }
    Ok(Answer::Number(disk.scround(ext.start)))
}

fn apply_layout(cli: &Cli, cxt: &mut Context<'_>, layout: &Layout) -> anyhow::Result<()> {
    if let Some(g) = layout.geometry {
        let mut topo = *cxt.disk().topology();
        topo.geometry = Some(Geometry::new(g.heads, g.sectors, g.cylinders.unwrap_or(0)));
        if let Some(c) = g.cylinders {
            topo.total_sectors = Some(chs_sectors(c, g.heads, g.sectors, (cli.sector_size / 512).max(1))?);
        }
        cxt.disk_mut().set_topology(topo);
    } else if cli.interactive {
        cxt.disk_mut()
            .set_dialog(Box::new(CliDialog::new(true, cli.sector_size)));
    } else {
        bail!("layout has no [geometry] section: add one or pass --interactive");
    }

    cxt.create_label(Box::new(SunLabel::with_options(layout.label.create_options()?)))?;
    cxt.disk_mut().set_units(Units::Sectors);
    for n in 0..cxt.disk().nparts_max() {
        if cxt.part_get_status(n)? == PartStatus::Used {
            cxt.part_delete(n)?;
        }
    }
    // drop the advisories of the default layout we just cleared
    cxt.disk_mut().take_notices();

    let cs = cxt.disk().geometry().cylinder_sectors();
    for slot in &layout.slots {
        let n = slot.index - 1;
        let ty = slot.kind.map(|code| cxt.parttype_from_code(code as u32)).transpose()?;

        let mut dialog = CliDialog::new(false, cli.sector_size);
        let first = match slot.start.and_then(|e| e.sectors(cli.sector_size)) {
            Some(s) => s.div_ceil(cs) * cs,
            None => {
                let (label, disk) = cxt.driver::<SunLabel>()?;
                let ext = fetch_extents(&label.header(disk)?, &disk.geometry());
                if ext.stop <= ext.start && n == 2 { 0 } else { ext.start }
            }
        };
        dialog.push(Answer::Number(first));
        match slot.size {
            Extent::Rest => dialog.push(Answer::Default),
            extent => {
                let len = extent.sectors(cli.sector_size).unwrap_or(0).div_ceil(cs) * cs;
                dialog.push(Answer::Number(first + len));
            }
        }
        cxt.disk_mut().set_dialog(Box::new(dialog));
        cxt.part_add(n, ty.as_ref())
            .with_context(|| format!("adding slot {}", slot.index))?;

        let (label, disk) = cxt.driver_mut::<SunLabel>()?;
        let flag = label.header(disk)?.flag(n);
        let mut mask = 0;
        if let Some(want) = slot.unmountable {
            if want != (flag & SUN_FLAG_UNMNT != 0) {
                mask |= SUN_FLAG_UNMNT;
            }
        }
        if slot.read_only != (flag & SUN_FLAG_RONLY != 0) {
            mask |= SUN_FLAG_RONLY;
        }
        if mask != 0 {
            label.toggle_flag(disk, n, mask)?;
        }
    }
    cxt.disk_mut().set_units(cli.units.into());

    if let Some(id) = &layout.label.volume_id {
        let (label, disk) = cxt.driver_mut::<SunLabel>()?;
        label.set_volume_id(disk, id)?;
    }

    let report = cxt.verify()?;
    for event in &report.events {
        log_warn!("{event}");
    }
    if cxt.part_get_type(2)?.code != SUN_TAG_BACKUP as u32 {
        log_warn!("Slot 3 does not cover the whole disk as SunOS/Solaris expects.");
    }
    log_normal!("{}", cxt.list_table()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rimlabel::sun::{SUN_TAG_LINUX_NATIVE, SUN_TAG_LINUX_SWAP, SunHeader};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn image(sectors: u64) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        file.as_file().set_len(sectors * 512).unwrap();
        file
    }

    fn rimlabel(args: &[&str]) -> anyhow::Result<()> {
        let argv = std::iter::once("rimlabel").chain(["-q"]).chain(args.iter().copied());
        run(&Cli::parse_from(argv))
    }

    fn first_sector(file: &NamedTempFile) -> Vec<u8> {
        std::fs::read(file.path()).unwrap()[..512].to_vec()
    }

    #[test]
    fn create_then_readd_swap_slot() {
        let img = image(36_000);
        let path = img.path().to_str().unwrap();
        rimlabel(&["create", path, "--heads", "2", "--sectors", "18"]).unwrap();
        rimlabel(&["verify", path]).unwrap();

        rimlabel(&["delete", path, "2"]).unwrap();
        rimlabel(&["add", path, "2"]).unwrap();

        let buf = first_sector(&img);
        let h = SunHeader::new(&buf, ByteOrder::Big);
        assert!(h.checksum_is_valid());
        assert_eq!(h.ncyl(), 1000);
        assert_eq!(h.tag(1), SUN_TAG_LINUX_NATIVE);
        assert_eq!(h.start_cylinder(1), 666);
        assert_eq!(h.num_sectors(1), 12_024);
    }

    #[test]
    fn dry_run_leaves_device_untouched() {
        let img = image(36_000);
        let path = img.path().to_str().unwrap();
        rimlabel(&["--dry-run", "create", path, "--heads", "2", "--sectors", "18"]).unwrap();
        assert!(first_sector(&img).iter().all(|&b| b == 0));
    }

    #[test]
    fn commands_need_a_label() {
        let img = image(36_000);
        let path = img.path().to_str().unwrap();
        assert!(rimlabel(&["print", path]).is_err());
        assert!(rimlabel(&["delete", path, "9"]).is_err());
        // no geometry and not interactive
        assert!(rimlabel(&["create", path]).is_err());
    }

    #[test]
    fn apply_layout_file() {
        let img = image(36_000);
        let path = img.path().to_str().unwrap();
        let mut layout = NamedTempFile::new().unwrap();
        write!(
            layout,
            r#"
            [geometry]
            heads = 2
            sectors = 18

            [label]
            byte_order = "little"
            volume_id = "scratch"

            [[slot]]
            index = 1
            size = 18000

            [[slot]]
            index = 2
            type = 0x82
            size = "rest"

            [[slot]]
            index = 3
            type = 0x05
            start = 0
            size = "rest"
            "#
        )
        .unwrap();
        rimlabel(&["apply", path, "-l", layout.path().to_str().unwrap()]).unwrap();

        let buf = first_sector(&img);
        let h = SunHeader::new(&buf, ByteOrder::Little);
        assert!(h.checksum_is_valid());
        assert_eq!(h.volume_id(), "scratch");
        assert_eq!(h.num_sectors(0), 18_000);
        assert_eq!(h.tag(1), SUN_TAG_LINUX_SWAP);
        assert_eq!(h.start_cylinder(1), 500);
        assert_eq!(h.num_sectors(2), 36_000);
    }

    #[test]
    fn oversized_geometry_is_rejected() {
        assert_eq!(chs_sectors(1000, 2, 18, 1).unwrap(), 36_000);
        assert!(chs_sectors(u64::MAX, 2, 18, 1).is_err());

        let img = image(36_000);
        let path = img.path().to_str().unwrap();
        let huge = u64::MAX.to_string();
        let err = rimlabel(&["create", path, "--heads", "255", "--sectors", "63", "--cylinders", &huge]);
        assert!(err.is_err());
        assert!(first_sector(&img).iter().all(|&b| b == 0));
    }

    #[test]
    fn hex_type_codes() {
        assert_eq!(parse_code("0x82"), Ok(0x82));
        assert_eq!(parse_code("fd"), Ok(0xfd));
        assert!(parse_code("zz").is_err());
    }
}
