//! Application configuration.
//!
//! The configuration is loaded from a JSON file, by default
//! `$XDG_CONFIG_HOME/xtiler/config.json`, or from the path passed on the
//! command line (`--config <path>`).  Every section is optional and falls
//! back to its compiled-in defaults; unknown keys are ignored.
//!
//! # Example
//!
//! ```json
//! {
//!   "tiling": {
//!     "margin": 100,
//!     "min_size": 350,
//!     "ignore_windows": [
//!       { "name": "^Xfce4-panel$" },
//!       { "name": "^Thunderbird$", "title": "^Write:", "negate_title": true }
//!     ],
//!     "delay_tiling_names": ["^Vivaldi"]
//!   },
//!   "desktops": {
//!     "default_tiler": 1,
//!     "tiler_per_desktop": [1, 5]
//!   },
//!   "master_stack_vertical": { "max_num_windows": 4 },
//!   "hotkeys": {
//!     "modifier": 64,
//!     "keys": { "cycleTiler": 54, "focusLeft": 113 }
//!   }
//! }
//! ```

use crate::command::Command;
use crate::desktop::{DesktopSettings, PerDesktop, Tiler};
use crate::rules::{NamePatterns, RuleSet};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
///
/// Every field is optional; a minimal `{}` file is valid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Thresholds, delays and window rules.
    #[serde(default)]
    pub tiling: TilingConfig,

    /// Initial per-desktop state.
    #[serde(default)]
    pub desktops: DesktopsConfig,

    #[serde(default)]
    pub master_stack_vertical: MasterStackVerticalConfig,

    #[serde(default)]
    pub master_stack_horizontal: MasterStackHorizontalConfig,

    #[serde(default)]
    pub stack_vertical: StackConfig,

    #[serde(default)]
    pub stack_horizontal: StackConfig,

    /// Key bindings, grabbed on the root window.
    #[serde(default)]
    pub hotkeys: HotkeysConfig,

    /// Where `logActiveWindow` appends; defaults to
    /// `$TMPDIR/xtiler_<user>.log`.
    #[serde(default)]
    pub activity_log: Option<PathBuf>,
}

/// Thresholds, delays and window rules.
///
/// All distances are in pixels, all durations in **milliseconds**.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TilingConfig {
    /// Windows whose edges are closer than this are considered docked.
    pub margin: i32,
    /// Windows are never shrunk below this width or height.
    pub min_size: i32,
    /// Increment for shrink/enlarge-master.
    pub step_size: i32,
    /// Slack of the docking adjacency test.
    pub adjacency_tolerance: i32,
    /// Settle time after a delay-sensitive application appeared.
    pub delay_tiling_ms: u64,
    /// Wait between nudging a frame and measuring where it went.
    pub probe_delay_ms: u64,
    /// Move the pointer onto windows focused by the focus commands.
    pub warp_pointer: bool,
    /// Windows matching any of these rules are never tiled.
    pub ignore_windows: RuleSet,
    /// Windows matching any of these rules keep their title bar.
    pub ignore_decoration: RuleSet,
    /// Application names that need `delay_tiling_ms` after starting.
    pub delay_tiling_names: NamePatterns,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            margin: 100,
            min_size: 350,
            step_size: 50,
            adjacency_tolerance: 3,
            delay_tiling_ms: 500,
            probe_delay_ms: 50,
            warp_pointer: false,
            ignore_windows: RuleSet::default(),
            ignore_decoration: RuleSet::default(),
            delay_tiling_names: NamePatterns::default(),
        }
    }
}

impl TilingConfig {
    pub fn delay_tiling(&self) -> Duration {
        Duration::from_millis(self.delay_tiling_ms)
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }
}

/// Initial per-desktop state.  The `*_per_desktop` lists are positional:
/// entry 0 configures desktop 0, and desktops beyond the list use the
/// default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DesktopsConfig {
    pub tile_windows: bool,
    pub resize_windows: bool,
    pub decorate_windows: bool,
    pub default_tiler: Tiler,
    pub tiler_per_desktop: Vec<Tiler>,
    pub maximize_when_one_window_left: bool,
    pub maximize_when_one_window_left_per_desktop: Vec<bool>,
}

impl Default for DesktopsConfig {
    fn default() -> Self {
        Self {
            tile_windows: true,
            resize_windows: true,
            decorate_windows: true,
            default_tiler: Tiler::MasterStackVertical,
            tiler_per_desktop: Vec::new(),
            maximize_when_one_window_left: true,
            maximize_when_one_window_left_per_desktop: Vec::new(),
        }
    }
}

impl DesktopsConfig {
    /// Build the engine's per-desktop settings.
    pub fn settings(&self) -> DesktopSettings {
        DesktopSettings::new(
            PerDesktop::new(self.tile_windows),
            PerDesktop::new(self.resize_windows),
            PerDesktop::new(self.decorate_windows),
            PerDesktop::with_values(self.default_tiler, self.tiler_per_desktop.iter().copied()),
            PerDesktop::with_values(
                self.maximize_when_one_window_left,
                self.maximize_when_one_window_left_per_desktop.iter().copied(),
            ),
        )
    }
}

/// Master on the left, stack on the right.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MasterStackVerticalConfig {
    pub max_num_windows: usize,
    /// Share of the work-area width given to a (re)placed master.
    pub default_width_master: f64,
}

impl Default for MasterStackVerticalConfig {
    fn default() -> Self {
        Self {
            max_num_windows: 3,
            default_width_master: 0.5,
        }
    }
}

/// Master on top, stack below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MasterStackHorizontalConfig {
    pub max_num_windows: usize,
    /// Share of the work-area height given to a (re)placed master.
    pub default_height_master: f64,
}

impl Default for MasterStackHorizontalConfig {
    fn default() -> Self {
        Self {
            max_num_windows: 3,
            default_height_master: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub max_num_windows: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self { max_num_windows: 3 }
    }
}

/// Key bindings.
///
/// `keys` maps command names (as accepted by `xtiler-ctl`, e.g.
/// `"cycleTiler"`) to X key codes.  `modifier` is an X modifier mask;
/// `-1` grabs the keys with any modifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HotkeysConfig {
    pub modifier: i32,
    pub keys: BTreeMap<String, u8>,
}

impl Default for HotkeysConfig {
    fn default() -> Self {
        Self {
            // Mod4 (the "Super" key).
            modifier: 64,
            keys: BTreeMap::new(),
        }
    }
}

impl HotkeysConfig {
    /// Resolve the configured names into a key code → command table.
    pub fn bindings(&self) -> Result<HashMap<u8, Command>, ConfigError> {
        let mut table = HashMap::new();
        for (name, &code) in &self.keys {
            let command = Command::parse(name)
                .ok_or_else(|| ConfigError(format!("unknown hotkey command {:?}", name)))?;
            if let Some(previous) = table.insert(code, command) {
                return Err(ConfigError(format!(
                    "key code {} bound to both {} and {}",
                    code,
                    previous.name(),
                    command.name()
                )));
            }
        }
        Ok(table)
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e.0)))
    }

    /// Parse configuration from a JSON string, validating the hotkeys.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError(e.to_string()))?;
        config.hotkeys.bindings()?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/xtiler/config.json`, falling back to
    /// `$HOME/.config/xtiler/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("xtiler").join("config.json"))
    }

    /// The configured `max_num_windows` of `tiler` (`None` for Maximize).
    pub fn max_windows(&self, tiler: Tiler) -> Option<usize> {
        match tiler {
            Tiler::MasterStackVertical => Some(self.master_stack_vertical.max_num_windows),
            Tiler::StackVertical => Some(self.stack_vertical.max_num_windows),
            Tiler::MasterStackHorizontal => Some(self.master_stack_horizontal.max_num_windows),
            Tiler::StackHorizontal => Some(self.stack_horizontal.max_num_windows),
            Tiler::Maximize => None,
        }
    }

    pub fn max_windows_mut(&mut self, tiler: Tiler) -> Option<&mut usize> {
        match tiler {
            Tiler::MasterStackVertical => Some(&mut self.master_stack_vertical.max_num_windows),
            Tiler::StackVertical => Some(&mut self.stack_vertical.max_num_windows),
            Tiler::MasterStackHorizontal => Some(&mut self.master_stack_horizontal.max_num_windows),
            Tiler::StackHorizontal => Some(&mut self.stack_horizontal.max_num_windows),
            Tiler::Maximize => None,
        }
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "tiling": {
                "margin": 80,
                "min_size": 300,
                "step_size": 25,
                "delay_tiling_ms": 200,
                "warp_pointer": true,
                "ignore_windows": [{ "name": "^Xfce4-panel$" }],
                "delay_tiling_names": ["^Vivaldi"]
            },
            "desktops": {
                "resize_windows": false,
                "default_tiler": 2,
                "tiler_per_desktop": [5, 3],
                "maximize_when_one_window_left_per_desktop": [false]
            },
            "master_stack_vertical": { "max_num_windows": 4, "default_width_master": 0.6 },
            "master_stack_horizontal": { "default_height_master": 0.7 },
            "stack_horizontal": { "max_num_windows": 5 },
            "hotkeys": { "modifier": -1, "keys": { "exit": 9, "focusPrevious": 23 } },
            "activity_log": "/tmp/activity.log"
        }"#;
        let cfg = Config::parse(json).unwrap();
        assert_eq!(cfg.tiling.margin, 80);
        assert_eq!(cfg.tiling.min_size, 300);
        assert_eq!(cfg.tiling.step_size, 25);
        assert_eq!(cfg.tiling.adjacency_tolerance, 3);
        assert_eq!(cfg.tiling.delay_tiling(), Duration::from_millis(200));
        assert!(cfg.tiling.warp_pointer);
        assert!(cfg.tiling.ignore_windows.matches("Xfce4-panel", String::new));
        assert!(cfg.tiling.delay_tiling_names.matches("Vivaldi-stable"));
        assert_eq!(cfg.master_stack_vertical.max_num_windows, 4);
        assert_eq!(cfg.master_stack_vertical.default_width_master, 0.6);
        assert_eq!(cfg.master_stack_horizontal.max_num_windows, 3);
        assert_eq!(cfg.master_stack_horizontal.default_height_master, 0.7);
        assert_eq!(cfg.stack_horizontal.max_num_windows, 5);
        assert_eq!(cfg.hotkeys.modifier, -1);
        assert_eq!(cfg.activity_log, Some(PathBuf::from("/tmp/activity.log")));

        let settings = cfg.desktops.settings();
        assert!(!settings.resizing.get(0));
        assert_eq!(settings.tiler.get(0), Tiler::Maximize);
        assert_eq!(settings.tiler.get(1), Tiler::MasterStackHorizontal);
        assert_eq!(settings.tiler.get(2), Tiler::StackVertical);
        assert!(!settings.maximize_single.get(0));
        assert!(settings.maximize_single.get(1));
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg = Config::parse("{}").unwrap();
        let td = TilingConfig::default();
        assert_eq!(cfg.tiling.margin, td.margin);
        assert_eq!(cfg.tiling.min_size, td.min_size);
        assert_eq!(cfg.tiling.step_size, td.step_size);
        assert_eq!(cfg.tiling.probe_delay_ms, td.probe_delay_ms);
        assert!(cfg.tiling.ignore_windows.is_empty());
        assert_eq!(cfg.max_windows(Tiler::StackVertical), Some(3));
        assert_eq!(cfg.max_windows(Tiler::Maximize), None);
        assert!(cfg.activity_log.is_none());

        let snap = cfg.desktops.settings().snapshot(4);
        assert!(snap.tiling_enabled);
        assert!(snap.resizing_enabled);
        assert!(snap.decoration_enabled);
        assert!(snap.maximize_when_single_window);
        assert_eq!(snap.tiler, Tiler::MasterStackVertical);
    }

    #[test]
    fn hotkey_bindings() {
        let cfg = Config::parse(r#"{ "hotkeys": { "keys": { "cycleTiler": 54, "18": 55 } } }"#)
            .unwrap();
        let table = cfg.hotkeys.bindings().unwrap();
        assert_eq!(table.get(&54), Some(&Command::CycleTiler));
        assert_eq!(table.get(&55), Some(&Command::LogActiveWindow));
        assert_eq!(cfg.hotkeys.modifier, 64);
    }

    #[test]
    fn unknown_hotkey_command_is_rejected() {
        let err = Config::parse(r#"{ "hotkeys": { "keys": { "fly": 10 } } }"#).unwrap_err();
        assert!(err.to_string().contains("fly"));
    }

    #[test]
    fn duplicate_key_code_is_rejected() {
        let json = r#"{ "hotkeys": { "keys": { "exit": 10, "cycleTiler": 10 } } }"#;
        assert!(Config::parse(json).is_err());
    }

    #[test]
    fn invalid_tiler_is_rejected() {
        assert!(Config::parse(r#"{ "desktops": { "default_tiler": 9 } }"#).is_err());
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let json = r#"{ "tiling": { "ignore_windows": [{ "name": "(" }] } }"#;
        assert!(Config::parse(json).is_err());
    }

    #[test]
    fn max_windows_is_adjustable() {
        let mut cfg = Config::default();
        if let Some(n) = cfg.max_windows_mut(Tiler::StackHorizontal) {
            *n = 7;
        }
        assert_eq!(cfg.max_windows(Tiler::StackHorizontal), Some(7));
        assert_eq!(cfg.max_windows(Tiler::StackVertical), Some(3));
        assert!(cfg.max_windows_mut(Tiler::Maximize).is_none());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "tiling": { "margin": 42 } }"#).unwrap();
        assert_eq!(Config::load(&path).unwrap().tiling.margin, 42);
        assert!(Config::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "tiling": {}, "future_section": { "key": 42 } }"#;
        // Unknown sections are skipped.
        let _cfg = Config::parse(json).unwrap();
    }
}
