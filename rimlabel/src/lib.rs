// SPDX-License-Identifier: MIT

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[doc(hidden)]
pub use paste as __paste;

#[macro_use]
mod macros;

pub mod context;
pub mod dialog;
pub mod errors;
pub mod label;
pub mod notice;
pub mod parttype;
/// Sun (SunOS/Solaris VTOC) disklabel driver.
pub mod sun;
pub mod utils;

pub use context::{Context, Disk, Geometry, Topology, Units};
pub use dialog::{Answer, Dialog, NumberRequest, ScriptedDialog};
pub use label::{Label, LabelKind, LabelTable, PartStatus, TableEntry, VerifyEvent, VerifyReport};
pub use notice::{Notice, Notices, Severity};
pub use parttype::PartType;
pub use sun::SunLabel;

pub const DEFAULT_SECTOR_SIZE: u64 = 512;

pub mod prelude {
    pub use crate::context::*;
    pub use crate::dialog::*;
    pub use crate::errors::*;
    pub use crate::label::*;
    pub use crate::notice::*;
    pub use crate::parttype::*;
    pub use crate::sun::{ProbeState, SunCreateOptions, SunLabel};
}
