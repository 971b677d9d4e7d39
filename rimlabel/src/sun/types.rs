// SPDX-License-Identifier: MIT

//! Sun partition tags.

define_label_types! {
    prefix: SUN, kind: SunPartitionKind, catalog: SUN_PARTTYPES;
    Unassigned = UNASSIGNED => "Unassigned", 0x00,
    Boot = BOOT => "Boot", 0x01,
    Root = ROOT => "SunOS root", 0x02,
    Swap = SWAP => "SunOS swap", 0x03,
    Usr = USR => "SunOS usr", 0x04,
    Backup = BACKUP => "Whole disk", 0x05,
    Stand = STAND => "SunOS stand", 0x06,
    Var = VAR => "SunOS var", 0x07,
    Home = HOME => "SunOS home", 0x08,
    AltSectors = ALTSCTR => "SunOS alt sectors", 0x09,
    Cache = CACHE => "SunOS cachefs", 0x0a,
    Reserved = RESERVED => "SunOS reserved", 0x0b,
    LinuxSwap = LINUX_SWAP => "Linux swap", 0x82,
    LinuxNative = LINUX_NATIVE => "Linux native", 0x83,
    LinuxLvm = LINUX_LVM => "Linux LVM", 0x8e,
    LinuxRaid = LINUX_RAID => "Linux raid autodetect", 0xfd,
}

impl SunPartitionKind {
    /// Swap tags are created unmountable.
    #[inline]
    pub fn is_swap(&self) -> bool {
        matches!(self, Self::Swap | Self::LinuxSwap)
    }
}
