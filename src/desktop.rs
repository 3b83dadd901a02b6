//! Per-desktop settings.
//!
//! Virtual desktops are discovered at runtime and have no upper bound, so
//! every setting is a [`PerDesktop`] value: a sparse map of explicit
//! per-desktop entries on top of one fixed default.  Reading a desktop that
//! was never written yields the default; writing one desktop never changes
//! what another unwritten desktop reads.

use crate::geometry::Geometry;
use crate::traits::WindowId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The five layout algorithms, numbered as in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tiler {
    MasterStackVertical = 1,
    StackVertical = 2,
    MasterStackHorizontal = 3,
    StackHorizontal = 4,
    Maximize = 5,
}

impl Tiler {
    /// Next tiler in the ring `1 → 2 → 3 → 4 → 5 → 1`.
    pub fn next(self) -> Self {
        match self {
            Tiler::MasterStackVertical => Tiler::StackVertical,
            Tiler::StackVertical => Tiler::MasterStackHorizontal,
            Tiler::MasterStackHorizontal => Tiler::StackHorizontal,
            Tiler::StackHorizontal => Tiler::Maximize,
            Tiler::Maximize => Tiler::MasterStackVertical,
        }
    }

    /// Whether the layout has a master window (and reacts to
    /// shrink/enlarge-master).
    pub fn has_master(self) -> bool {
        matches!(self, Tiler::MasterStackVertical | Tiler::MasterStackHorizontal)
    }
}

impl fmt::Display for Tiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tiler::MasterStackVertical => "master-and-stack-vertical",
            Tiler::StackVertical => "stack-vertical",
            Tiler::MasterStackHorizontal => "master-and-stack-horizontal",
            Tiler::StackHorizontal => "stack-horizontal",
            Tiler::Maximize => "maximize",
        };
        f.write_str(name)
    }
}

/// A tiler number outside `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid tiler number {0} (expected 1-5)")]
pub struct InvalidTiler(pub u8);

impl TryFrom<u8> for Tiler {
    type Error = InvalidTiler;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Tiler::MasterStackVertical),
            2 => Ok(Tiler::StackVertical),
            3 => Ok(Tiler::MasterStackHorizontal),
            4 => Ok(Tiler::StackHorizontal),
            5 => Ok(Tiler::Maximize),
            other => Err(InvalidTiler(other)),
        }
    }
}

impl From<Tiler> for u8 {
    fn from(t: Tiler) -> u8 {
        t as u8
    }
}

/// A setting with one default and sparse per-desktop overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct PerDesktop<T> {
    default: T,
    explicit: BTreeMap<u32, T>,
}

impl<T: Clone> PerDesktop<T> {
    pub fn new(default: T) -> Self {
        Self {
            default,
            explicit: BTreeMap::new(),
        }
    }

    /// Seed desktops `0..values.len()` from a configured list.
    pub fn with_values(default: T, values: impl IntoIterator<Item = T>) -> Self {
        let mut s = Self::new(default);
        for (desktop, value) in (0u32..).zip(values) {
            s.set(desktop, value);
        }
        s
    }

    /// The value for `desktop`, or the default if it was never set.
    pub fn get(&self, desktop: u32) -> T {
        self.explicit
            .get(&desktop)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    pub fn set(&mut self, desktop: u32, value: T) {
        self.explicit.insert(desktop, value);
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }
}

impl PerDesktop<bool> {
    /// Flip the flag for `desktop` and return the new value.
    pub fn toggle(&mut self, desktop: u32) -> bool {
        let value = !self.get(desktop);
        self.set(desktop, value);
        value
    }
}

/// Read-only view of one desktop's configuration, for the CLI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopSnapshot {
    pub desktop: u32,
    pub tiling_enabled: bool,
    pub resizing_enabled: bool,
    pub decoration_enabled: bool,
    pub tiler: Tiler,
    pub maximize_when_single_window: bool,
    pub has_stored_layout: bool,
}

/// All per-desktop state the engine keeps.
#[derive(Debug, Clone)]
pub struct DesktopSettings {
    pub tiling: PerDesktop<bool>,
    pub resizing: PerDesktop<bool>,
    pub decoration: PerDesktop<bool>,
    pub tiler: PerDesktop<Tiler>,
    pub maximize_single: PerDesktop<bool>,
    stored_layouts: HashMap<u32, BTreeMap<WindowId, Geometry>>,
}

impl DesktopSettings {
    pub fn new(
        tiling: PerDesktop<bool>,
        resizing: PerDesktop<bool>,
        decoration: PerDesktop<bool>,
        tiler: PerDesktop<Tiler>,
        maximize_single: PerDesktop<bool>,
    ) -> Self {
        Self {
            tiling,
            resizing,
            decoration,
            tiler,
            maximize_single,
            stored_layouts: HashMap::new(),
        }
    }

    /// Replace the stored layout of `desktop`.
    pub fn store_layout(&mut self, desktop: u32, layout: BTreeMap<WindowId, Geometry>) {
        self.stored_layouts.insert(desktop, layout);
    }

    pub fn stored_layout(&self, desktop: u32) -> Option<&BTreeMap<WindowId, Geometry>> {
        self.stored_layouts.get(&desktop)
    }

    pub fn snapshot(&self, desktop: u32) -> DesktopSnapshot {
        DesktopSnapshot {
            desktop,
            tiling_enabled: self.tiling.get(desktop),
            resizing_enabled: self.resizing.get(desktop),
            decoration_enabled: self.decoration.get(desktop),
            tiler: self.tiler.get(desktop),
            maximize_when_single_window: self.maximize_single.get(desktop),
            has_stored_layout: self.stored_layouts.contains_key(&desktop),
        }
    }
}

impl Default for DesktopSettings {
    fn default() -> Self {
        Self::new(
            PerDesktop::new(true),
            PerDesktop::new(true),
            PerDesktop::new(true),
            PerDesktop::new(Tiler::MasterStackVertical),
            PerDesktop::new(true),
        )
    }
}
