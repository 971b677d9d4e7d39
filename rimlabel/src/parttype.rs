// SPDX-License-Identifier: MIT

use core::fmt;

/// A partition type as seen by the generic label layer: numeric tag plus name.
///
/// Catalog entries are static; tags read from disk that are not in the catalog
/// become transient "unknown" values carrying the raw tag and no name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartType {
    /// Numeric tag. Wider than any on-disk field so oversized requests can be rejected.
    pub code: u32,
    pub name: Option<&'static str>,
}

impl PartType {
    #[inline]
    pub const fn new(code: u32, name: &'static str) -> Self {
        Self {
            code,
            name: Some(name),
        }
    }

    #[inline]
    pub const fn unknown(code: u32) -> Self {
        Self { code, name: None }
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.name.is_none()
    }

    /// Looks `code` up in `catalog`, falling back to an unknown type.
    pub fn from_catalog(catalog: &[PartType], code: u32) -> Self {
        catalog
            .iter()
            .find(|t| t.code == code)
            .copied()
            .unwrap_or(Self::unknown(code))
    }
}

impl fmt::Display for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "Unknown ({:#x})", self.code),
        }
    }
}
