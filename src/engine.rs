//! The orchestrator that ties the registry, the tilers, docking and focus
//! navigation to the window manager.
//!
//! [`Engine`] owns all long-lived state (the [`Registry`], the per-desktop
//! [`DesktopSettings`] and the [`Config`]) and reacts to [`Event`]s one at
//! a time.  Every layout change ends with a flush and a reconciliation, so
//! the registry afterwards reflects what the window manager actually did.

use crate::command::{Command, Direction, Event};
use crate::config::{Config, ConfigError};
use crate::desktop::{DesktopSettings, DesktopSnapshot, Tiler};
use crate::docking::Docking;
use crate::focus;
use crate::geometry::{Geometry, MovedBorder};
use crate::journal::{self, Journal};
use crate::layout::{self, Axis, MasterParams, Plan};
use crate::registry::{observed_geometry, Addressing, ReconcileOutcome, Registry, UNKNOWN_NAME, UNNAMED_TITLE};
use crate::traits::{WindowId, WindowManager};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};

/// Possible errors from the engine.
///
/// Vanished windows are not errors; anything that does reach the caller
/// means the connection to the window system is unusable.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The window manager returned an error.
    #[error("window manager error: {0}")]
    WindowManager(String),
}

fn wm_error<E: std::fmt::Display>(e: E) -> EngineError {
    EngineError::WindowManager(e.to_string())
}

/// Whether the daemon keeps running after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// Arranges windows and keeps docked windows together.
///
/// The engine is generic over any [`WindowManager`] implementation; the
/// X11 backend and the in-memory test double are interchangeable.
///
/// # Typical usage
///
/// ```ignore
/// let wm = X11Wm::connect()?;
/// let mut engine = Engine::new(wm, config)?;
/// engine.start()?;
/// for event in rx {
///     if engine.handle_event(event)? == Flow::Exit {
///         break;
///     }
/// }
/// ```
pub struct Engine<W: WindowManager> {
    wm: W,
    config: Config,
    registry: Registry,
    desktops: DesktopSettings,
    hotkeys: HashMap<u8, Command>,
    activity_log: Journal,
    active: Option<WindowId>,
}

impl<W: WindowManager> Engine<W> {
    /// Create an engine.  Nothing is queried until [`start`](Self::start).
    pub fn new(wm: W, config: Config) -> Result<Self, ConfigError> {
        let hotkeys = config.hotkeys.bindings()?;
        let registry = Registry::new(
            config.tiling.ignore_windows.clone(),
            config.tiling.delay_tiling_names.clone(),
            config.tiling.delay_tiling(),
        );
        let desktops = config.desktops.settings();
        let activity_log = Journal::new(
            config
                .activity_log
                .clone()
                .unwrap_or_else(journal::default_activity_log),
        );
        Ok(Self {
            wm,
            config,
            registry,
            desktops,
            hotkeys,
            activity_log,
            active: None,
        })
    }

    pub fn wm(&self) -> &W {
        &self.wm
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Key code → command table of the configured hotkeys.
    pub fn hotkeys(&self) -> &HashMap<u8, Command> {
        &self.hotkeys
    }

    /// Read-only view of the settings of `desktop`.
    pub fn desktop_config(&self, desktop: u32) -> DesktopSnapshot {
        self.desktops.snapshot(desktop)
    }

    /// Number of windows currently tiled on `desktop`.
    pub fn window_count(&self, desktop: u32) -> Result<usize, EngineError> {
        Ok(self
            .registry
            .windows_on_desktop(&self.wm, desktop)
            .map_err(wm_error)?
            .len())
    }

    /// Initial reconciliation and tiling of the current desktop.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.active = self.wm.active_window().map_err(wm_error)?;
        self.reconcile()?;
        info!("tracking {} windows", self.registry.len());
        let desktop = self.current_desktop()?;
        self.tile_desktop(desktop, None, 0)
    }

    /// React to one event.
    pub fn handle_event(&mut self, event: Event) -> Result<Flow, EngineError> {
        match event {
            Event::ActiveWindowChanged | Event::DesktopChanged | Event::WindowListChanged => {
                self.active = self.wm.active_window().map_err(wm_error)?;
                let outcome = self.reconcile()?;
                if event == Event::ActiveWindowChanged {
                    self.log_active_change(&outcome)?;
                } else {
                    debug!("{:?}, windows changed: {}", event, outcome.count_changed);
                }

                if !outcome.desktops.is_empty() {
                    for desktop in outcome.desktops {
                        self.tile_desktop(desktop, None, 0)?;
                    }
                } else if outcome.count_changed {
                    let desktop = self.current_desktop()?;
                    self.tile_desktop(desktop, None, 0)?;
                } else if let Some(active) = self.active {
                    // Same windows, another one active: the maximize tiler
                    // follows the focus.
                    if let Some(desktop) = self.registry.get(active).map(|r| r.desktop) {
                        if self.desktops.tiling.get(desktop)
                            && self.desktops.tiler.get(desktop) == Tiler::Maximize
                        {
                            self.maximize(active, desktop)?;
                        }
                    }
                }
            }

            Event::GeometryChanged(frame) => {
                let Some(active) = self.active else {
                    return Ok(Flow::Continue);
                };
                let Some(record) = self.registry.get(active) else {
                    return Ok(Flow::Continue);
                };
                if record.frame != frame {
                    return Ok(Flow::Continue);
                }
                let before = record.geometry;
                let Some(now) = observed_geometry(&self.wm, active).map_err(wm_error)? else {
                    return Ok(Flow::Continue);
                };
                let moved = MovedBorder::between(&before, &now);
                if !moved.is_empty() {
                    self.propagate_docked(active, before, moved, true)?;
                    self.reconcile()?;
                }
            }

            Event::KeyReleased(code) => match self.hotkeys.get(&code).copied() {
                Some(command) => return self.handle_command(command),
                None => debug!("no command bound to key code {}", code),
            },

            Event::Command(command) => return self.handle_command(command),
        }
        Ok(Flow::Continue)
    }

    /// Execute a hotkey or remote-control command.
    pub fn handle_command(&mut self, command: Command) -> Result<Flow, EngineError> {
        info!("command {} ({})", command, command.opcode());
        let desktop = self.current_desktop()?;
        match command {
            Command::ToggleResize => self.toggle_resize(desktop),
            Command::ToggleTiling => {
                if self.toggle_tiling(desktop) {
                    self.tile_desktop(desktop, None, 0)?;
                }
            }
            Command::ToggleResizeAndTiling => {
                self.toggle_resize(desktop);
                if self.toggle_tiling(desktop) {
                    self.tile_desktop(desktop, None, 0)?;
                }
            }
            Command::ToggleMaximizeWhenOneWindowLeft => {
                let enabled = self.desktops.maximize_single.toggle(desktop);
                info!(
                    "maximize when one window left {} on desktop {}",
                    on_off(enabled),
                    desktop
                );
            }
            Command::ToggleDecoration => self.toggle_decoration(desktop)?,
            Command::CycleWindows => self.cycle_windows(desktop)?,
            Command::CycleTiler => {
                self.reconcile()?;
                let next = self.desktops.tiler.get(desktop).next();
                self.tile_desktop(desktop, Some(next), 0)?;
            }
            Command::SwapWindows => self.swap_windows()?,
            Command::StoreCurrentWindowsLayout => self.store_layout(desktop)?,
            Command::RecreateWindowsLayout => self.recreate_layout(desktop)?,
            Command::TileMasterAndStackVertically => {
                self.tile_manually(desktop, Tiler::MasterStackVertical)?
            }
            Command::TileVertically => self.tile_manually(desktop, Tiler::StackVertical)?,
            Command::TileMasterAndStackHorizontally => {
                self.tile_manually(desktop, Tiler::MasterStackHorizontal)?
            }
            Command::TileHorizontally => self.tile_manually(desktop, Tiler::StackHorizontal)?,
            Command::TileMaximize => self.tile_manually(desktop, Tiler::Maximize)?,
            Command::IncreaseMaxNumWindows => self.change_max_windows(desktop, 1)?,
            Command::DecreaseMaxNumWindows => self.change_max_windows(desktop, -1)?,
            Command::Exit => {
                self.restore_decorations()?;
                return Ok(Flow::Exit);
            }
            Command::LogActiveWindow => self.log_active_window()?,
            Command::ShrinkMaster => {
                let step = self.config.tiling.step_size;
                self.tile_desktop(desktop, None, -step)?;
            }
            Command::EnlargeMaster => {
                let step = self.config.tiling.step_size;
                self.tile_desktop(desktop, None, step)?;
            }
            Command::FocusLeft | Command::FocusRight | Command::FocusUp | Command::FocusDown => {
                if let Some(direction) = command.focus_direction() {
                    self.move_focus(direction)?;
                }
            }
            Command::FocusPrevious => self.focus_previous()?,
        }
        Ok(Flow::Continue)
    }

    //  Registry

    fn current_desktop(&self) -> Result<u32, EngineError> {
        self.wm.current_desktop().map_err(wm_error)
    }

    fn reconcile(&mut self) -> Result<ReconcileOutcome, EngineError> {
        self.registry
            .reconcile(&self.wm, self.active)
            .map_err(wm_error)
    }

    fn sync(&self) -> Result<(), EngineError> {
        self.wm.sync().map_err(wm_error)
    }

    /// Participating windows of `desktop` with their recorded geometry.
    fn desktop_windows(&self, desktop: u32) -> Result<Vec<(WindowId, Geometry)>, EngineError> {
        let ids = self
            .registry
            .windows_on_desktop(&self.wm, desktop)
            .map_err(wm_error)?;
        Ok(ids
            .into_iter()
            .filter_map(|id| self.registry.get(id).map(|r| (id, r.geometry)))
            .collect())
    }

    fn log_active_change(&mut self, outcome: &ReconcileOutcome) -> Result<(), EngineError> {
        if !log::log_enabled!(log::Level::Info) {
            return Ok(());
        }
        let Some(active) = self.active else {
            return Ok(());
        };
        let Some(record) = self.registry.get_mut(active) else {
            return Ok(());
        };
        let name = record.name.clone();
        let title = record.title(&self.wm).map_err(wm_error)?;
        info!(
            "active window changed: name {:?}, title {:?}{}",
            name,
            title,
            if outcome.count_changed {
                ", number of windows changed"
            } else {
                ""
            }
        );
        Ok(())
    }

    //  Geometry primitives

    /// Move `window`, addressing its frame or itself as probed.
    fn set_position(&mut self, window: WindowId, x: Option<i32>, y: Option<i32>) -> Result<(), EngineError> {
        let Some(record) = self.registry.get(window) else {
            return Ok(());
        };
        let (frame, addressing) = (record.frame, record.addressing);
        let target = match self.wm.is_decorated(window).map_err(wm_error)? {
            None => return Ok(()),
            // Without decoration the frame offsets no longer apply.
            Some(false) => window,
            Some(true) => {
                let addressing = match addressing {
                    Addressing::Unresolved => match self.probe_addressing(window)? {
                        Some(resolved) => resolved,
                        None => return Ok(()),
                    },
                    resolved => resolved,
                };
                if addressing == Addressing::ViaSelf {
                    window
                } else {
                    frame
                }
            }
        };
        self.wm.set_position(target, x, y).map_err(wm_error)
    }

    /// Nudge the frame one pixel down and see whether it lands there.
    /// Returns `None` if the window vanished meanwhile.
    fn probe_addressing(&mut self, window: WindowId) -> Result<Option<Addressing>, EngineError> {
        let Some(record) = self.registry.get(window) else {
            return Ok(None);
        };
        let (frame, old) = (record.frame, record.geometry);

        self.wm.set_maximized(window, false).map_err(wm_error)?;
        self.wm
            .set_position(frame, None, Some(old.y + 1))
            .map_err(wm_error)?;
        self.sync()?;
        let delay = self.config.tiling.probe_delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let Some(now) = self.wm.geometry(frame).map_err(wm_error)? else {
            return Ok(None);
        };

        let (addressing, target) = if (old.y + 1 - now.y).abs() <= 1 {
            (Addressing::ViaFrame, frame)
        } else {
            (Addressing::ViaSelf, window)
        };
        debug!("window 0x{:x} is positioned {:?}", window, addressing);
        self.wm
            .set_position(target, Some(old.x), Some(old.y))
            .map_err(wm_error)?;
        self.sync()?;

        if let Some(record) = self.registry.get_mut(window) {
            record.addressing = addressing;
        }
        Ok(Some(addressing))
    }

    /// Resize the frame of `window`.
    fn set_size(&self, window: WindowId, width: Option<i32>, height: Option<i32>) -> Result<(), EngineError> {
        let frame = self.registry.get(window).map_or(window, |r| r.frame);
        self.wm.set_size(frame, width, height).map_err(wm_error)
    }

    fn unmaximize(&self, window: WindowId) -> Result<(), EngineError> {
        self.wm.set_maximized(window, false).map_err(wm_error)
    }

    fn place(&mut self, window: WindowId, geometry: Geometry) -> Result<(), EngineError> {
        self.set_position(window, Some(geometry.x), Some(geometry.y))?;
        self.set_size(window, Some(geometry.width), Some(geometry.height))
    }

    /// Show or hide the title bar, unless the window draws its own or is
    /// exempt by the decoration rules.
    fn set_decoration(&mut self, window: WindowId, show: bool) -> Result<(), EngineError> {
        if self
            .wm
            .has_client_side_decoration(window)
            .map_err(wm_error)?
            != Some(false)
        {
            return Ok(());
        }
        if let Some(record) = self.registry.get_mut(window) {
            let name = record.name.clone();
            let title = record.title(&self.wm).map_err(wm_error)?.to_string();
            if self
                .config
                .tiling
                .ignore_decoration
                .matches(&name, || title.clone())
            {
                return Ok(());
            }
        }
        if self.wm.is_decorated(window).map_err(wm_error)? == Some(show) {
            return Ok(());
        }
        self.wm.set_decoration(window, show).map_err(wm_error)
    }

    //  Tiling

    fn tile_manually(&mut self, desktop: u32, tiler: Tiler) -> Result<(), EngineError> {
        self.reconcile()?;
        self.tile_desktop(desktop, Some(tiler), 0)
    }

    /// Run the selected tiler of `desktop`.
    ///
    /// `manual` selects (and stores) a tiler and tiles even when tiling is
    /// off.  A non-zero `resize_master` only applies to master tilers.
    fn tile_desktop(&mut self, desktop: u32, manual: Option<Tiler>, resize_master: i32) -> Result<(), EngineError> {
        if manual.is_none() && !self.desktops.tiling.get(desktop) {
            return Ok(());
        }
        if let Some(tiler) = manual {
            self.desktops.tiler.set(desktop, tiler);
        }
        let tiler = self.desktops.tiler.get(desktop);
        if resize_master != 0 && !tiler.has_master() {
            return Ok(());
        }
        debug!("tiling desktop {} with {}", desktop, tiler);

        if tiler == Tiler::Maximize {
            let active = self.wm.active_window().map_err(wm_error)?;
            if let Some(active) = active.filter(|a| self.registry.contains(*a)) {
                self.maximize(active, desktop)?;
            }
            return Ok(());
        }

        let windows = self.desktop_windows(desktop)?;
        let work_area = self.wm.work_area(desktop).map_err(wm_error)?;
        let maximize_single = self.desktops.maximize_single.get(desktop);
        let min_size = self.config.tiling.min_size;
        let max_windows = self.config.max_windows(tiler).unwrap_or(1);

        let plan = match tiler {
            Tiler::MasterStackVertical => layout::master_stack(
                &windows,
                &work_area,
                Axis::X,
                MasterParams {
                    max_windows,
                    fraction: self.config.master_stack_vertical.default_width_master,
                    min_size,
                    resize: resize_master,
                },
                maximize_single,
            ),
            Tiler::MasterStackHorizontal => layout::master_stack(
                &windows,
                &work_area,
                Axis::Y,
                MasterParams {
                    max_windows,
                    fraction: self.config.master_stack_horizontal.default_height_master,
                    min_size,
                    resize: resize_master,
                },
                maximize_single,
            ),
            Tiler::StackVertical => {
                layout::stack(&windows, &work_area, Axis::Y, max_windows, maximize_single)
            }
            Tiler::StackHorizontal | Tiler::Maximize => {
                layout::stack(&windows, &work_area, Axis::X, max_windows, maximize_single)
            }
        };
        self.apply_plan(desktop, plan)
    }

    fn apply_plan(&mut self, desktop: u32, plan: Plan) -> Result<(), EngineError> {
        let decorate = self.desktops.decoration.get(desktop);
        match plan {
            Plan::Empty => return Ok(()),
            Plan::Single { window, fill } => {
                self.set_decoration(window, decorate)?;
                if let Some(geometry) = fill {
                    self.unmaximize(window)?;
                    self.place(window, geometry)?;
                }
            }
            Plan::Tiled {
                placements,
                overflow,
            } => {
                for p in placements {
                    self.set_decoration(p.window, decorate)?;
                    self.unmaximize(p.window)?;
                    self.place(p.window, p.geometry)?;
                }
                for window in overflow {
                    self.set_decoration(window, true)?;
                }
            }
            Plan::ResizeMaster {
                window,
                from,
                to,
                border,
            } => {
                self.set_size(window, Some(to.width), Some(to.height))?;
                self.sync()?;
                self.propagate_docked(window, from, border, false)?;
            }
        }
        self.sync()?;
        self.reconcile()?;
        Ok(())
    }

    /// Fill the work area with `window` and set the native maximize flags.
    fn maximize(&mut self, window: WindowId, desktop: u32) -> Result<(), EngineError> {
        let work_area = self.wm.work_area(desktop).map_err(wm_error)?;
        self.set_decoration(window, self.desktops.decoration.get(desktop))?;
        self.place(window, work_area)?;
        self.wm.set_maximized(window, true).map_err(wm_error)?;
        self.sync()?;
        self.reconcile()?;
        Ok(())
    }

    //  Docking

    fn docking(&self) -> Docking {
        Docking {
            margin: self.config.tiling.margin,
            tolerance: self.config.tiling.adjacency_tolerance,
            min_size: self.config.tiling.min_size,
        }
    }

    /// Let the neighbours of `active` follow its moved `border`.  `before`
    /// is the active window's geometry before the move; its current
    /// geometry is queried fresh.
    fn propagate_docked(
        &mut self,
        active: WindowId,
        before: Geometry,
        border: MovedBorder,
        respect_toggle: bool,
    ) -> Result<(), EngineError> {
        if border.bits().count_ones() != 1 {
            return Ok(());
        }
        let Some(desktop) = self.registry.get(active).map(|r| r.desktop) else {
            return Ok(());
        };
        if respect_toggle && !self.desktops.resizing.get(desktop) {
            return Ok(());
        }
        let Some(now) = observed_geometry(&self.wm, active).map_err(wm_error)? else {
            return Ok(());
        };
        let work_area = self.wm.work_area(desktop).map_err(wm_error)?;
        let others: Vec<(WindowId, Geometry)> = self
            .registry
            .iter()
            .filter(|r| r.id != active && r.desktop == desktop)
            .map(|r| (r.id, r.geometry))
            .collect();

        let adjustments = self
            .docking()
            .propagate(border, &before, &now, &others, &work_area);
        if adjustments.is_empty() {
            return Ok(());
        }
        for adj in adjustments {
            debug!("docked window 0x{:x} follows: {:?}", adj.window, adj);
            if adj.x.is_some() || adj.y.is_some() {
                self.set_position(adj.window, adj.x, adj.y)?;
            }
            self.set_size(adj.window, adj.width, adj.height)?;
        }
        self.sync()
    }

    //  Commands

    fn toggle_resize(&mut self, desktop: u32) {
        let enabled = self.desktops.resizing.toggle(desktop);
        info!("resizing {} on desktop {}", on_off(enabled), desktop);
    }

    fn toggle_tiling(&mut self, desktop: u32) -> bool {
        let enabled = self.desktops.tiling.toggle(desktop);
        info!("tiling {} on desktop {}", on_off(enabled), desktop);
        enabled
    }

    fn toggle_decoration(&mut self, desktop: u32) -> Result<(), EngineError> {
        let enabled = self.desktops.decoration.toggle(desktop);
        info!("decoration {} on desktop {}", on_off(enabled), desktop);
        if self.desktops.tiling.get(desktop) {
            return self.tile_desktop(desktop, None, 0);
        }
        for (window, _) in self.desktop_windows(desktop)? {
            self.set_decoration(window, enabled)?;
        }
        self.sync()
    }

    /// Every window takes the geometry of the next one.
    fn cycle_windows(&mut self, desktop: u32) -> Result<(), EngineError> {
        let windows = self.desktop_windows(desktop)?;
        if windows.len() < 2 {
            return Ok(());
        }
        let next = windows.iter().cycle().skip(1);
        let moves: Vec<(WindowId, Geometry)> = windows
            .iter()
            .zip(next)
            .map(|((id, _), (_, g))| (*id, *g))
            .collect();
        for (window, geometry) in moves {
            self.place(window, geometry)?;
        }
        self.sync()?;
        self.reconcile()?;
        Ok(())
    }

    /// Exchange the active window with the window under the pointer.
    fn swap_windows(&mut self) -> Result<(), EngineError> {
        let Some(active) = self.wm.active_window().map_err(wm_error)? else {
            return Ok(());
        };
        let Some(record) = self.registry.get(active) else {
            return Ok(());
        };
        let (desktop, active_geometry) = (record.desktop, record.geometry);
        let (px, py) = self.wm.pointer_position().map_err(wm_error)?;
        let other = self
            .desktop_windows(desktop)?
            .into_iter()
            .find(|(id, g)| *id != active && g.contains(px, py));
        let Some((other, other_geometry)) = other else {
            debug!("no window under the pointer to swap with");
            return Ok(());
        };
        self.place(active, other_geometry)?;
        self.place(other, active_geometry)?;
        self.sync()?;
        self.reconcile()?;
        Ok(())
    }

    fn store_layout(&mut self, desktop: u32) -> Result<(), EngineError> {
        let layout: BTreeMap<WindowId, Geometry> = self.desktop_windows(desktop)?.into_iter().collect();
        info!("stored layout of {} windows on desktop {}", layout.len(), desktop);
        self.desktops.store_layout(desktop, layout);
        Ok(())
    }

    fn recreate_layout(&mut self, desktop: u32) -> Result<(), EngineError> {
        let Some(layout) = self.desktops.stored_layout(desktop).cloned() else {
            info!("no stored layout for desktop {}", desktop);
            return Ok(());
        };
        for (window, _) in self.desktop_windows(desktop)? {
            let Some(geometry) = layout.get(&window) else {
                continue;
            };
            self.unmaximize(window)?;
            self.wm.focus(window).map_err(wm_error)?;
            self.wm.raise(window).map_err(wm_error)?;
            self.place(window, *geometry)?;
            self.sync()?;
        }
        self.reconcile()?;
        Ok(())
    }

    fn change_max_windows(&mut self, desktop: u32, delta: i32) -> Result<(), EngineError> {
        let tiler = self.desktops.tiler.get(desktop);
        let Some(max) = self.config.max_windows_mut(tiler) else {
            return Ok(());
        };
        *max = if delta < 0 {
            max.saturating_sub(1).max(2)
        } else {
            (*max + 1).max(2)
        };
        info!("{} shows up to {} windows", tiler, max);
        self.tile_desktop(desktop, None, 0)
    }

    fn restore_decorations(&mut self) -> Result<(), EngineError> {
        info!("restoring decorations and exiting");
        for window in self.registry.ids() {
            self.set_decoration(window, true)?;
        }
        self.sync()
    }

    fn log_active_window(&mut self) -> Result<(), EngineError> {
        let Some(active) = self.wm.active_window().map_err(wm_error)? else {
            return Ok(());
        };
        let name = self
            .wm
            .window_name(active)
            .map_err(wm_error)?
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());
        let title = self
            .wm
            .window_title(active)
            .map_err(wm_error)?
            .unwrap_or_else(|| UNNAMED_TITLE.to_string());
        let group = self.registry.get(active).map_or(0, |r| r.group_tag);
        let line = format!("name: {},  title: {},  group: {}", name, title, group);
        match self.activity_log.append(&line) {
            Ok(()) => info!("logged active window to {}", self.activity_log.path().display()),
            Err(e) => warn!(
                "could not write {}: {}",
                self.activity_log.path().display(),
                e
            ),
        }
        Ok(())
    }

    //  Focus

    fn move_focus(&mut self, direction: Direction) -> Result<(), EngineError> {
        let Some(active) = self.wm.active_window().map_err(wm_error)? else {
            return Ok(());
        };
        let Some(record) = self.registry.get(active) else {
            return Ok(());
        };
        let (desktop, origin) = (record.desktop, record.geometry);
        let candidates: Vec<(WindowId, Geometry)> = self
            .desktop_windows(desktop)?
            .into_iter()
            .filter(|(id, _)| *id != active)
            .collect();
        let target = focus::pick_direction(&origin, candidates.iter().map(|(id, g)| (*id, g)), direction);
        match target {
            Some(target) => self.focus_window(target),
            None => {
                debug!("no window {} of 0x{:x}", direction, active);
                Ok(())
            }
        }
    }

    fn focus_previous(&mut self) -> Result<(), EngineError> {
        let Some(active) = self.wm.active_window().map_err(wm_error)? else {
            return Ok(());
        };
        let Some(desktop) = self.registry.get(active).map(|r| r.desktop) else {
            return Ok(());
        };
        let candidates: Vec<(WindowId, u64)> = self
            .desktop_windows(desktop)?
            .into_iter()
            .filter(|(id, _)| *id != active)
            .filter_map(|(id, _)| self.registry.get(id).map(|r| (id, r.last_focused_at)))
            .collect();
        match focus::pick_previous(candidates) {
            Some(target) => self.focus_window(target),
            None => Ok(()),
        }
    }

    fn focus_window(&mut self, window: WindowId) -> Result<(), EngineError> {
        debug!("focusing 0x{:x}", window);
        self.wm.focus(window).map_err(wm_error)?;
        self.wm.raise(window).map_err(wm_error)?;
        if self.config.tiling.warp_pointer {
            if let Some(record) = self.registry.get(window) {
                let (x, y) = record.geometry.center();
                self.wm.warp_pointer(x, y).map_err(wm_error)?;
            }
        }
        self.sync()?;
        self.registry.stamp_focus(window);
        self.active = Some(window);
        Ok(())
    }
}

//  Tests
