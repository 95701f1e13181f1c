//! Proxy construction options
//!
//! Options are plain serde data so embedders can load them from whatever
//! configuration format they already use. Every field has a default, so an
//! empty document yields [`ProxyOptions::default`].

use serde::{Deserialize, Serialize};

/// Which members of the target's type chain get a forwarding thunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Every callable member, protocol or not
    #[default]
    AllCallables,
    /// Protocol operations only; ordinary methods go through delegation
    ProtocolOnly,
}

/// How much descriptive metadata the proxy type copies from the target's type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorLevel {
    /// Declared name, documentation string and declaring module
    Basic,
    /// Everything in `Basic` plus the qualified name
    #[default]
    Full,
}

/// Options controlling proxy type synthesis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyOptions {
    /// Thunk selection
    pub scan: ScanMode,
    /// Metadata mirroring
    pub mirror: MirrorLevel,
}

impl ProxyOptions {
    /// Set the scan mode
    pub fn with_scan(mut self, scan: ScanMode) -> Self {
        self.scan = scan;
        self
    }

    /// Set the mirror level
    pub fn with_mirror(mut self, mirror: MirrorLevel) -> Self {
        self.mirror = mirror;
        self
    }
}
