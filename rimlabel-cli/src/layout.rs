// SPDX-License-Identifier: MIT

use serde::{Deserialize, Deserializer};
use std::{fs, path::Path};

use rimlabel::sun::{ByteOrder, SunCreateOptions, layout::SUN_NUM_PARTITIONS};

/// Position or length in a layout file: `"rest"`, a sector count, or a sized
/// value such as `"512M"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    Rest,
    Sectors(u64),
    Bytes(u64),
}

impl Extent {
    /// Sector count for `sector_size` byte sectors, rounded up.
    pub fn sectors(&self, sector_size: u64) -> Option<u64> {
        match *self {
            Extent::Rest => None,
            Extent::Sectors(n) => Some(n),
            Extent::Bytes(b) => Some(b.div_ceil(sector_size.max(1))),
        }
    }
}

impl<'de> Deserialize<'de> for Extent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ExtentVisitor;

        impl<'de> serde::de::Visitor<'de> for ExtentVisitor {
            type Value = Extent;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a sector count, a size like '512M' or '1G', or 'rest'")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Extent::Sectors(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(value)
                    .map(Extent::Sectors)
                    .map_err(|_| E::custom("negative sector count"))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                parse_extent(value).ok_or_else(|| {
                    E::custom(format!(
                        "Invalid extent '{value}'. Use a sector count, K/M/G/T suffix or 'rest'."
                    ))
                })
            }
        }

        deserializer.deserialize_any(ExtentVisitor)
    }
}

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Extent::Rest => write!(f, "rest"),
            Extent::Sectors(n) => write!(f, "{n}s"),
            Extent::Bytes(b) => write!(f, "{b} B"),
        }
    }
}

fn parse_extent(value: &str) -> Option<Extent> {
    let lower = value.trim().to_lowercase();
    if lower == "rest" {
        return Some(Extent::Rest);
    }
    let suffixes = [("s", 0u32), ("k", 10), ("m", 20), ("g", 30), ("t", 40)];
    for (suffix, shift) in suffixes {
        if let Some(num) = lower.strip_suffix(suffix) {
            let n = num.trim().parse::<u64>().ok()?;
            return Some(if shift == 0 {
                Extent::Sectors(n)
            } else {
                Extent::Bytes(n.checked_mul(1u64 << shift)?)
            });
        }
    }
    lower.parse::<u64>().ok().map(Extent::Sectors)
}

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
pub struct LayoutGeometry {
    pub heads: u32,
    pub sectors: u64,
    #[serde(default)]
    pub cylinders: Option<u64>,
}

#[derive(Debug, Deserialize, PartialEq, Clone, Default)]
#[serde(default)]
pub struct LabelSettings {
    pub byte_order: Option<String>,
    pub rpm: Option<u16>,
    pub alt_cylinders: Option<u16>,
    pub interleave: Option<u16>,
    pub volume_id: Option<String>,
}

impl LabelSettings {
    pub fn create_options(&self) -> anyhow::Result<SunCreateOptions> {
        let mut opts = SunCreateOptions::new();
        if let Some(order) = &self.byte_order {
            opts = opts.with_byte_order(match order.to_lowercase().as_str() {
                "big" | "be" => ByteOrder::Big,
                "little" | "le" => ByteOrder::Little,
                other => anyhow::bail!("Unknown byte order '{other}' (use 'big' or 'little')"),
            });
        }
        if let Some(rpm) = self.rpm {
            opts = opts.with_rpm(rpm);
        }
        if let Some(acyl) = self.alt_cylinders {
            opts = opts.with_alt_cylinders(acyl);
        }
        if let Some(intrlv) = self.interleave {
            opts = opts.with_interleave(intrlv);
        }
        Ok(opts)
    }
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Slot {
    /// 1-based slot number, as printed in listings.
    pub index: usize,
    #[serde(rename = "type", default)]
    pub kind: Option<u16>,
    #[serde(default)]
    pub start: Option<Extent>,
    pub size: Extent,
    #[serde(default)]
    pub unmountable: Option<bool>,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Layout {
    #[serde(default)]
    pub geometry: Option<LayoutGeometry>,
    #[serde(default)]
    pub label: LabelSettings,
    #[serde(rename = "slot", default)]
    pub slots: Vec<Slot>,
}

impl Layout {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let layout: Layout = toml::from_str(content)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = [false; SUN_NUM_PARTITIONS];
        for s in &self.slots {
            if !(1..=SUN_NUM_PARTITIONS).contains(&s.index) {
                anyhow::bail!("Slot index {} is outside 1..={}", s.index, SUN_NUM_PARTITIONS);
            }
            if std::mem::replace(&mut seen[s.index - 1], true) {
                anyhow::bail!("Slot {} is defined twice", s.index);
            }
            if s.size == Extent::Sectors(0) {
                anyhow::bail!("Slot {} has an empty size", s.index);
            }
            if s.start == Some(Extent::Rest) {
                anyhow::bail!("Slot {}: 'rest' is only valid as a size", s.index);
            }
        }
        if let Some(g) = self.geometry {
            if g.heads == 0 || g.sectors == 0 {
                anyhow::bail!("Geometry needs non-zero heads and sectors");
            }
        }
        self.label.create_options()?;
        Ok(())
    }
}

impl core::fmt::Display for Layout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "\n  ┌──────┬──────┬────────────┬────────────┬───────┐")?;
        writeln!(f, "  | Slot | Type | Start      | Size       | Flags |")?;
        writeln!(f, "  ├──────┼──────┼────────────┼────────────┼───────┤")?;
        for s in &self.slots {
            let start = s.start.map(|e| e.to_string()).unwrap_or_else(|| "next".into());
            let flags = format!(
                "{}{}",
                if s.unmountable.unwrap_or(false) { 'u' } else { ' ' },
                if s.read_only { 'r' } else { ' ' }
            );
            writeln!(
                f,
                "  | {i:>4} | {k:>4} | {st:>10} | {sz:>10} | {fl:>5} |",
                i = s.index,
                k = s.kind.map(|k| format!("{k:x}")).unwrap_or_else(|| "83".into()),
                st = start,
                sz = s.size.to_string(),
                fl = flags,
            )?;
        }
        writeln!(f, "  └──────┴──────┴────────────┴────────────┴───────┘")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [geometry]
        heads = 16
        sectors = 63

        [label]
        byte_order = "little"
        volume_id = "scratch"

        [[slot]]
        index = 1
        size = "512M"

        [[slot]]
        index = 2
        type = 0x82
        size = "rest"

        [[slot]]
        index = 3
        type = 0x05
        start = 0
        size = "rest"
    "#;

    #[test]
    fn parses_sample_layout() {
        let layout = Layout::parse(SAMPLE).unwrap();
        assert_eq!(
            layout.geometry,
            Some(LayoutGeometry {
                heads: 16,
                sectors: 63,
                cylinders: None
            })
        );
        assert_eq!(layout.slots.len(), 3);
        assert_eq!(layout.slots[0].size, Extent::Bytes(512 << 20));
        assert_eq!(layout.slots[1].kind, Some(0x82));
        assert_eq!(layout.slots[2].start, Some(Extent::Sectors(0)));
        assert_eq!(
            layout.label.create_options().unwrap().byte_order,
            ByteOrder::Little
        );
    }

    #[test]
    fn extent_strings() {
        assert_eq!(parse_extent("rest"), Some(Extent::Rest));
        assert_eq!(parse_extent("2048s"), Some(Extent::Sectors(2048)));
        assert_eq!(parse_extent("2048"), Some(Extent::Sectors(2048)));
        assert_eq!(parse_extent("1K"), Some(Extent::Bytes(1024)));
        assert_eq!(parse_extent("big"), None);
        assert_eq!(Extent::Bytes(1000).sectors(512), Some(2));
    }

    #[test]
    fn rejects_duplicate_slots() {
        let toml = r#"
            [[slot]]
            index = 1
            size = 100
            [[slot]]
            index = 1
            size = 100
        "#;
        assert!(Layout::parse(toml).is_err());
    }

    #[test]
    fn rejects_bad_index_and_order() {
        assert!(Layout::parse("[[slot]]\nindex = 9\nsize = 1\n").is_err());
        assert!(Layout::parse("[label]\nbyte_order = \"middle\"\n").is_err());
    }
}
