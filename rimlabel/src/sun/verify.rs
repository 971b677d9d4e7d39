// SPDX-License-Identifier: MIT

use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::{
    context::{Disk, Geometry},
    errors::*,
    label::{VerifyEvent, VerifyReport},
};

use super::{SunLabel, layout::*, types::*};

/// Used slot extents in sectors, plus the largest free span found by a
/// greedy walk over the slots.
///
/// Unassigned and whole-disk slots read as zero length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotExtents {
    pub starts: [u64; SUN_NUM_PARTITIONS],
    pub lens: [u64; SUN_NUM_PARTITIONS],
    /// First sector past the slots packed from sector 0.
    pub start: u64,
    /// End of the free span beginning at `start`.
    pub stop: u64,
    /// False once a slot could not be chained into the walk.
    pub continuous: bool,
}

impl SlotExtents {
    /// True when `sector` lies inside one of the used extents.
    pub fn is_allocated(&self, sector: u64) -> bool {
        (0..SUN_NUM_PARTITIONS)
            .any(|i| self.lens[i] != 0 && self.starts[i] <= sector && self.starts[i] + self.lens[i] > sector)
    }
}

/// Collects slot extents and the free span heuristic.
///
/// The walk only follows slots in index order, so it can miss free space on
/// unordered tables; callers treat `start..stop` as a hint.
pub fn fetch_extents(h: &SunHeader<'_>, geom: &Geometry) -> SlotExtents {
    let cs = geom.cylinder_sectors();
    let mut ext = SlotExtents {
        starts: [0; SUN_NUM_PARTITIONS],
        lens: [0; SUN_NUM_PARTITIONS],
        start: 0,
        stop: geom.total_sectors(),
        continuous: true,
    };

    for i in 0..SUN_NUM_PARTITIONS {
        let tag = h.tag(i);
        let len = h.num_sectors(i) as u64;
        if len == 0 || tag == SUN_TAG_UNASSIGNED || tag == SUN_TAG_BACKUP {
            continue;
        }
        let start = (h.start_cylinder(i) as u64).saturating_mul(cs);
        ext.starts[i] = start;
        ext.lens[i] = len;
        if ext.continuous {
            if start == ext.start {
                ext.start = start + len;
            } else if start + len >= ext.stop {
                ext.stop = start;
            } else {
                ext.continuous = false;
            }
        }
    }
    ext
}

/// Checks extents for overlaps, cylinder misalignment and unused space.
///
/// Abutting slots are merged over a bounded number of passes before the gap
/// scan. Overlaps are only reported on the first pass; misalignment is
/// reported once per slot.
pub fn analyze_extents(
    starts: &[u64; SUN_NUM_PARTITIONS],
    lens: &[u64; SUN_NUM_PARTITIONS],
    cyl_sectors: u64,
    total: u64,
) -> VerifyReport {
    let mut starts = *starts;
    let mut lens = *lens;
    let mut events = Vec::new();
    let mut misaligned = [false; SUN_NUM_PARTITIONS];

    for k in 0..SUN_NUM_PARTITIONS - 1 {
        for i in 0..SUN_NUM_PARTITIONS {
            if k != 0 && cyl_sectors != 0 && lens[i] % cyl_sectors != 0 && !misaligned[i] {
                misaligned[i] = true;
                events.push(VerifyEvent::NotCylinderAligned { slot: i });
            }
            if lens[i] == 0 {
                continue;
            }
            for j in 0..i {
                if lens[j] == 0 {
                    continue;
                }
                let end_i = starts[i] + lens[i];
                let end_j = starts[j] + lens[j];
                if starts[j] == end_i {
                    lens[i] += lens[j];
                    lens[j] = 0;
                } else if starts[i] == end_j {
                    starts[i] = starts[j];
                    lens[i] += lens[j];
                    lens[j] = 0;
                } else if k == 0 && starts[i] < end_j && starts[j] < end_i {
                    events.push(VerifyEvent::Overlap {
                        slot: i,
                        other: j,
                        start: starts[i].max(starts[j]),
                        end: end_i.min(end_j),
                    });
                }
            }
        }
    }

    let mut order: [usize; SUN_NUM_PARTITIONS] = core::array::from_fn(|i| i);
    order.sort_unstable_by(|&a, &b| match (lens[a] == 0, lens[b] == 0) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => starts[a].cmp(&starts[b]),
    });

    let used = order.iter().take_while(|&&i| lens[i] != 0).count();
    if used == 0 {
        events.push(VerifyEvent::NoPartitions);
        return VerifyReport { events };
    }

    let first = order[0];
    if starts[first] != 0 {
        events.push(VerifyEvent::Gap {
            start: 0,
            end: starts[first],
        });
    }
    // Gaps are measured from the furthest end seen so far, not from the end of
    // the previous slot, so a slot nested inside another never opens one.
    let mut reach = starts[first] + lens[first];
    for &i in &order[1..used] {
        if reach < starts[i] {
            events.push(VerifyEvent::Gap {
                start: reach,
                end: starts[i],
            });
        }
        reach = reach.max(starts[i] + lens[i]);
    }
    if reach < total {
        events.push(VerifyEvent::Gap { start: reach, end: total });
    }

    VerifyReport { events }
}

impl SunLabel {
    pub fn verify_label(&self, disk: &Disk<'_>) -> LabelResult<VerifyReport> {
        let h = self.header(disk)?;
        let cs = Self::cylinder_sectors(disk)?;
        let ext = fetch_extents(&h, &disk.geom);
        Ok(analyze_extents(&ext.starts, &ext.lens, cs, disk.geom.total_sectors()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Label;
    use alloc::vec;

    fn arrays(slots: &[(usize, u64, u64)]) -> ([u64; 8], [u64; 8]) {
        let mut starts = [0; 8];
        let mut lens = [0; 8];
        for &(i, start, end) in slots {
            starts[i] = start;
            lens[i] = end - start;
        }
        (starts, lens)
    }

    #[test]
    fn adjacent_slots_merge_cleanly() {
        let (s, l) = arrays(&[(0, 0, 100), (1, 100, 200)]);
        let report = analyze_extents(&s, &l, 100, 200);
        assert!(report.is_clean(), "{report}");
    }

    #[test]
    fn gap_between_slots() {
        let (s, l) = arrays(&[(0, 0, 50), (1, 60, 100)]);
        let report = analyze_extents(&s, &l, 10, 100);
        assert_eq!(report.gaps(), vec![(50, 60)]);
        assert_eq!(report.overlaps().count(), 0);
        assert!(report.misaligned_slots().is_empty());
    }

    #[test]
    fn leading_and_trailing_gaps() {
        let (s, l) = arrays(&[(3, 20, 40)]);
        let report = analyze_extents(&s, &l, 10, 100);
        assert_eq!(report.gaps(), vec![(0, 20), (40, 100)]);
    }

    #[test]
    fn overlap_is_reported_once() {
        let (s, l) = arrays(&[(0, 0, 60), (1, 40, 100)]);
        let report = analyze_extents(&s, &l, 10, 100);
        let overlaps: Vec<_> = report.overlaps().copied().collect();
        assert_eq!(
            overlaps,
            vec![VerifyEvent::Overlap {
                slot: 1,
                other: 0,
                start: 40,
                end: 60
            }]
        );
        assert!(report.gaps().is_empty());
    }

    #[test]
    fn nested_slot_does_not_fake_a_gap() {
        let (s, l) = arrays(&[(0, 0, 100), (1, 10, 20)]);
        let report = analyze_extents(&s, &l, 10, 100);
        assert!(report.gaps().is_empty());
        assert_eq!(report.overlaps().count(), 1);
    }

    #[test]
    fn misaligned_length_reported_per_slot() {
        let (s, l) = arrays(&[(0, 0, 100), (4, 200, 215)]);
        let report = analyze_extents(&s, &l, 10, 300);
        assert_eq!(report.misaligned_slots(), vec![4]);
    }

    #[test]
    fn empty_table_has_no_partitions() {
        let report = analyze_extents(&[0; 8], &[0; 8], 10, 100);
        assert_eq!(report.events, vec![VerifyEvent::NoPartitions]);
        assert!(!report.has_partitions());
    }

    #[test]
    fn chain_out_of_order_merges() {
        // slot 2 bridges slots 0 and 1
        let (s, l) = arrays(&[(0, 0, 10), (1, 20, 30), (2, 10, 20)]);
        let report = analyze_extents(&s, &l, 10, 30);
        assert!(report.is_clean(), "{report}");
    }

    #[test]
    fn fetch_skips_backup_and_tracks_free_span() {
        let mut buf = vec![0u8; SUN_LABEL_SIZE];
        let mut h = SunHeaderMut::new(&mut buf, ByteOrder::Big);
        h.set_tag(0, SUN_TAG_LINUX_NATIVE);
        h.set_num_sectors(0, 100);
        h.set_tag(2, SUN_TAG_BACKUP);
        h.set_num_sectors(2, 200);
        h.set_tag(4, SUN_TAG_LINUX_SWAP);
        h.set_start_cylinder(4, 15);
        h.set_num_sectors(4, 50);

        let ext = fetch_extents(&h.view(), &Geometry::new(1, 10, 20));
        assert_eq!(ext.lens[2], 0);
        assert_eq!((ext.starts[4], ext.lens[4]), (150, 50));
        assert_eq!((ext.start, ext.stop), (100, 150));
        assert!(ext.continuous);
        assert!(ext.is_allocated(99));
        assert!(!ext.is_allocated(100));
    }

    #[test]
    fn default_label_verifies_clean() {
        use crate::context::Topology;
        let topo = Topology::new()
            .with_geometry(Geometry::new(2, 18, 1000))
            .with_total_sectors(36_000);
        let mut disk = Disk::from_sector("disk.img", 512, &[]).unwrap().with_topology(topo);
        let mut label = SunLabel::new();
        label.create(&mut disk).unwrap();
        let report = label.verify(&disk).unwrap();
        assert!(report.is_clean(), "{report}");
    }
}
