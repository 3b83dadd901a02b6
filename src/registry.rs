//! The window registry: xtiler's mirror of all tileable windows.
//!
//! The registry is never trusted blindly.  [`Registry::reconcile`]
//! refreshes it from the window system, dropping windows that disappeared,
//! adding new ones that pass the ignore rules and updating every known
//! window's desktop and geometry.  Between reconciliations the recorded
//! geometry is the *previous* observation, which is exactly what the
//! docked-resize logic compares fresh geometry against.

use crate::geometry::Geometry;
use crate::rules::{NamePatterns, RuleSet};
use crate::traits::{WindowId, WindowManager};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Name used when a window has no readable class.
pub const UNKNOWN_NAME: &str = "<unknown>";
/// Title used when a window has no readable title.
pub const UNNAMED_TITLE: &str = "<unnamed>";

/// Which handle accepts position changes for a window.
///
/// Some applications reposition correctly when their frame is moved,
/// others only when the client window itself is moved.  The answer is
/// probed once per window and cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Addressing {
    #[default]
    Unresolved,
    ViaFrame,
    ViaSelf,
}

/// Everything the registry knows about one window.
#[derive(Debug, Clone)]
pub struct WindowRecord {
    pub id: WindowId,
    /// Top-most ancestor below the root; receives size changes.
    pub frame: WindowId,
    pub name: String,
    title: Option<String>,
    pub desktop: u32,
    /// Geometry of the frame at the last reconciliation.
    pub geometry: Geometry,
    pub addressing: Addressing,
    /// Logical focus clock value of the last activation; `0` = never.
    pub last_focused_at: u64,
    pub group_tag: u32,
}

impl WindowRecord {
    /// The window title, fetched on first use and memoized.
    pub fn title<W: WindowManager>(&mut self, wm: &W) -> Result<&str, W::Error> {
        if self.title.is_none() {
            let title = wm
                .window_title(self.id)?
                .unwrap_or_else(|| UNNAMED_TITLE.to_string());
            self.title = Some(title);
        }
        Ok(self.title.as_deref().unwrap_or(UNNAMED_TITLE))
    }
}

/// What a reconciliation found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// The set of participating windows changed (windows appeared,
    /// disappeared or switched desktops).
    pub count_changed: bool,
    /// Desktops that lost or gained a window by a desktop switch.
    pub desktops: BTreeSet<u32>,
}

/// Geometry of the top-most ancestor of `window` (its frame).
pub fn observed_geometry<W: WindowManager>(
    wm: &W,
    window: WindowId,
) -> Result<Option<Geometry>, W::Error> {
    let Some(frame) = wm.frame_of(window)? else {
        return Ok(None);
    };
    wm.geometry(frame)
}

/// Authoritative in-memory set of [`WindowRecord`]s.
#[derive(Debug, Default)]
pub struct Registry {
    records: BTreeMap<WindowId, WindowRecord>,
    ignore: RuleSet,
    delayed: NamePatterns,
    settle_delay: Duration,
    focus_clock: u64,
}

impl Registry {
    /// Create an empty registry.
    ///
    /// `ignore` excludes windows from tiling entirely.  When a window whose
    /// name matches `delayed` first appears, reconciliation sleeps for
    /// `settle_delay` so the application can settle its initial geometry.
    pub fn new(ignore: RuleSet, delayed: NamePatterns, settle_delay: Duration) -> Self {
        Self {
            records: BTreeMap::new(),
            ignore,
            delayed,
            settle_delay,
            focus_clock: 0,
        }
    }

    pub fn get(&self, id: WindowId) -> Option<&WindowRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut WindowRecord> {
        self.records.get_mut(&id)
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WindowRecord> {
        self.records.values()
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.records.keys().copied().collect()
    }

    /// Record `id` as just activated.
    pub fn stamp_focus(&mut self, id: WindowId) {
        if let Some(record) = self.records.get_mut(&id) {
            self.focus_clock += 1;
            record.last_focused_at = self.focus_clock;
        }
    }

    /// Refresh the registry from the window system.
    pub fn reconcile<W: WindowManager>(
        &mut self,
        wm: &W,
        active: Option<WindowId>,
    ) -> Result<ReconcileOutcome, W::Error> {
        let clients = wm.client_list()?;
        let mut outcome = ReconcileOutcome::default();
        let mut settle = false;

        let before = self.records.len();
        self.records.retain(|id, _| clients.contains(id));
        if self.records.len() != before {
            outcome.count_changed = true;
        }

        for &id in &clients {
            let Some(state) = wm.window_state(id)? else {
                continue;
            };
            if state.modal || state.sticky {
                continue;
            }

            let known = self.records.contains_key(&id);
            let mut name = None;
            let mut title = None;
            if !known {
                let n = wm
                    .window_name(id)?
                    .unwrap_or_else(|| UNKNOWN_NAME.to_string());
                let ignored = self.ignore.matches(&n, || {
                    let t = wm
                        .window_title(id)
                        .ok()
                        .flatten()
                        .unwrap_or_else(|| UNNAMED_TITLE.to_string());
                    title = Some(t.clone());
                    t
                });
                if ignored {
                    debug!("ignoring window 0x{:x} ({})", id, n);
                    continue;
                }
                name = Some(n);
            }

            let Some(desktop) = wm.window_desktop(id)? else {
                continue;
            };
            let Some(frame) = wm.frame_of(id)? else {
                continue;
            };
            let Some(geometry) = wm.geometry(frame)? else {
                continue;
            };

            match self.records.get_mut(&id) {
                Some(record) => {
                    if record.desktop != desktop {
                        debug!(
                            "window 0x{:x} moved from desktop {} to {}",
                            id, record.desktop, desktop
                        );
                        outcome.count_changed = true;
                        outcome.desktops.insert(record.desktop);
                        outcome.desktops.insert(desktop);
                    }
                    record.desktop = desktop;
                    record.geometry = geometry;
                }
                None => {
                    let name = name.unwrap_or_else(|| UNKNOWN_NAME.to_string());
                    if self.delayed.matches(&name) {
                        settle = true;
                    }
                    info!(
                        "new window 0x{:x}: name {:?}, desktop {}, {}",
                        id, name, desktop, geometry
                    );
                    self.records.insert(
                        id,
                        WindowRecord {
                            id,
                            frame,
                            name,
                            title,
                            desktop,
                            geometry,
                            addressing: Addressing::Unresolved,
                            last_focused_at: 0,
                            group_tag: 0,
                        },
                    );
                    outcome.count_changed = true;
                }
            }
        }

        if let Some(active) = active {
            self.stamp_focus(active);
        }

        if settle && !self.settle_delay.is_zero() {
            debug!("delay-sensitive application started, settling for {:?}", self.settle_delay);
            std::thread::sleep(self.settle_delay);
        }

        Ok(outcome)
    }

    /// Registered windows on `desktop` that are currently neither
    /// minimized nor sticky, in registry order.
    ///
    /// The state is queried live because a window can be minimized without
    /// any reconciliation noticing.
    pub fn windows_on_desktop<W: WindowManager>(
        &self,
        wm: &W,
        desktop: u32,
    ) -> Result<Vec<WindowId>, W::Error> {
        let mut ids = Vec::new();
        for record in self.records.values().filter(|r| r.desktop == desktop) {
            match wm.window_state(record.id)? {
                Some(state) if !state.hidden && !state.sticky => ids.push(record.id),
                _ => {}
            }
        }
        Ok(ids)
    }
}
