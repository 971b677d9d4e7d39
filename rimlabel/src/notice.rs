// SPDX-License-Identifier: MIT

use alloc::{string::String, vec::Vec};
use core::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// One diagnostic emitted by a label operation (warnings, advisories, progress).
///
/// The library never prints; front ends drain notices and render them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub sev: Severity,
    pub code: &'static str,
    pub msg: String,
}

impl Notice {
    pub fn info(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Info,
            code,
            msg: msg.into(),
        }
    }
    pub fn warn(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Warn,
            code,
            msg: msg.into(),
        }
    }
    pub fn err(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Error,
            code,
            msg: msg.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.sev {
            Severity::Info => "info",
            Severity::Warn => "warning",
            Severity::Error => "error",
        };
        write!(f, "{tag}[{}]: {}", self.code, self.msg)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Notices {
    items: Vec<Notice>,
}

impl Notices {
    #[inline]
    pub fn push(&mut self, n: Notice) {
        self.items.push(n);
    }

    #[inline]
    pub fn info(&mut self, code: &'static str, msg: impl Into<String>) {
        self.push(Notice::info(code, msg));
    }

    #[inline]
    pub fn warn(&mut self, code: &'static str, msg: impl Into<String>) {
        self.push(Notice::warn(code, msg));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn has(&self, code: &str) -> bool {
        self.items.iter().any(|n| n.code == code)
    }

    pub fn worst(&self) -> Option<Severity> {
        self.items.iter().map(|n| n.sev).max()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn take(&mut self) -> Vec<Notice> {
        core::mem::take(&mut self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order() {
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn take_drains() {
        let mut n = Notices::default();
        n.info("a", "first");
        n.warn("b", "second");
        assert_eq!(n.worst(), Some(Severity::Warn));
        assert!(n.has("b"));
        let drained = n.take();
        assert_eq!(drained.len(), 2);
        assert!(n.is_empty());
        assert_eq!(drained[1].to_string(), "warning[b]: second");
    }
}
