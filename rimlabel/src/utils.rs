// SPDX-License-Identifier: MIT

use alloc::{format, string::String};

/// Human readable byte count, binary units ("12.5 MiB").
pub fn pretty_bytes(n: u64) -> String {
    const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    let mut val = n as f64;
    let mut idx = 0usize;
    while val >= 1024.0 && idx + 1 < UNITS.len() {
        val /= 1024.0;
        idx += 1;
    }
    if idx == 0 {
        format!("{} {}", n, UNITS[idx])
    } else {
        format!("{:.1} {}", val, UNITS[idx])
    }
}

/// Device node name of partition `partno` (1-based) on `dev`.
///
/// Devices whose name ends with a digit get a `p` separator (`/dev/nvme0n1p3`).
pub fn partname(dev: &str, partno: usize) -> String {
    let sep = if dev.ends_with(|c: char| c.is_ascii_digit()) {
        "p"
    } else {
        ""
    };
    format!("{dev}{sep}{partno}")
}
