//! Commands, directions and events used throughout xtiler.
//!
//! This module defines the vocabulary that all components share:
//! [`Command`] describes every action the engine can perform (with the
//! stable opcode numbering used by hotkeys and remote control),
//! [`Direction`] drives spatial focus navigation, and [`Event`] is what
//! event sources feed into the [`Engine`](crate::engine::Engine).
//!
//! Commands arrive on the wire either as their opcode (`7`) or as their
//! name (`"swapWindows"`, `"swap_windows"`, …); names are matched
//! case-insensitively with `_` and `-` ignored.

use crate::traits::WindowId;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Direction for spatial focus navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Every action the engine can perform.
///
/// The discriminants are the remote-control opcodes and must never be
/// renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Command {
    ToggleResize = 0,
    ToggleTiling = 1,
    ToggleResizeAndTiling = 2,
    ToggleMaximizeWhenOneWindowLeft = 3,
    ToggleDecoration = 4,
    CycleWindows = 5,
    CycleTiler = 6,
    SwapWindows = 7,
    StoreCurrentWindowsLayout = 8,
    RecreateWindowsLayout = 9,
    TileMasterAndStackVertically = 10,
    TileVertically = 11,
    TileMasterAndStackHorizontally = 12,
    TileHorizontally = 13,
    TileMaximize = 14,
    IncreaseMaxNumWindows = 15,
    DecreaseMaxNumWindows = 16,
    Exit = 17,
    LogActiveWindow = 18,
    ShrinkMaster = 19,
    EnlargeMaster = 20,
    FocusLeft = 21,
    FocusRight = 22,
    FocusUp = 23,
    FocusDown = 24,
    FocusPrevious = 25,
}

/// Opcode order; `ALL[n].opcode() == n`.
const ALL: [Command; 26] = [
    Command::ToggleResize,
    Command::ToggleTiling,
    Command::ToggleResizeAndTiling,
    Command::ToggleMaximizeWhenOneWindowLeft,
    Command::ToggleDecoration,
    Command::CycleWindows,
    Command::CycleTiler,
    Command::SwapWindows,
    Command::StoreCurrentWindowsLayout,
    Command::RecreateWindowsLayout,
    Command::TileMasterAndStackVertically,
    Command::TileVertically,
    Command::TileMasterAndStackHorizontally,
    Command::TileHorizontally,
    Command::TileMaximize,
    Command::IncreaseMaxNumWindows,
    Command::DecreaseMaxNumWindows,
    Command::Exit,
    Command::LogActiveWindow,
    Command::ShrinkMaster,
    Command::EnlargeMaster,
    Command::FocusLeft,
    Command::FocusRight,
    Command::FocusUp,
    Command::FocusDown,
    Command::FocusPrevious,
];

impl Command {
    /// All commands in opcode order.
    pub fn all() -> &'static [Command] {
        &ALL
    }

    /// The stable remote-control opcode.
    pub fn opcode(self) -> u32 {
        self as u32
    }

    /// Canonical (camelCase) name, as used in the hotkey configuration.
    pub fn name(self) -> &'static str {
        match self {
            Command::ToggleResize => "toggleResize",
            Command::ToggleTiling => "toggleTiling",
            Command::ToggleResizeAndTiling => "toggleResizeAndTiling",
            Command::ToggleMaximizeWhenOneWindowLeft => "toggleMaximizeWhenOneWindowLeft",
            Command::ToggleDecoration => "toggleDecoration",
            Command::CycleWindows => "cycleWindows",
            Command::CycleTiler => "cycleTiler",
            Command::SwapWindows => "swapWindows",
            Command::StoreCurrentWindowsLayout => "storeCurrentWindowsLayout",
            Command::RecreateWindowsLayout => "recreateWindowsLayout",
            Command::TileMasterAndStackVertically => "tileMasterAndStackVertically",
            Command::TileVertically => "tileVertically",
            Command::TileMasterAndStackHorizontally => "tileMasterAndStackHorizontally",
            Command::TileHorizontally => "tileHorizontally",
            Command::TileMaximize => "tileMaximize",
            Command::IncreaseMaxNumWindows => "increaseMaxNumWindows",
            Command::DecreaseMaxNumWindows => "decreaseMaxNumWindows",
            Command::Exit => "exit",
            Command::LogActiveWindow => "logActiveWindow",
            Command::ShrinkMaster => "shrinkMaster",
            Command::EnlargeMaster => "enlargeMaster",
            Command::FocusLeft => "focusLeft",
            Command::FocusRight => "focusRight",
            Command::FocusUp => "focusUp",
            Command::FocusDown => "focusDown",
            Command::FocusPrevious => "focusPrevious",
        }
    }

    /// The navigation direction of the four spatial focus commands.
    pub fn focus_direction(self) -> Option<Direction> {
        match self {
            Command::FocusLeft => Some(Direction::Left),
            Command::FocusRight => Some(Direction::Right),
            Command::FocusUp => Some(Direction::Up),
            Command::FocusDown => Some(Direction::Down),
            _ => None,
        }
    }

    /// Parse a command name (case-insensitive; `_`, `-` and whitespace are
    /// ignored) or a decimal opcode.
    pub fn parse(s: &str) -> Option<Command> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u32>() {
            return Command::try_from(n).ok();
        }
        let wanted = normalize(trimmed);
        ALL.iter().copied().find(|c| normalize(c.name()) == wanted)
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An opcode outside `0..=25`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown command opcode {0}")]
pub struct UnknownOpcode(pub u32);

impl TryFrom<u32> for Command {
    type Error = UnknownOpcode;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        ALL.get(n as usize).copied().ok_or(UnknownOpcode(n))
    }
}

impl Serialize for Command {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Command {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = Command;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "command opcode (0-25) or command name")
            }
            fn visit_u64<E>(self, n: u64) -> Result<Command, E>
            where
                E: DeError,
            {
                u32::try_from(n)
                    .ok()
                    .and_then(|n| Command::try_from(n).ok())
                    .ok_or_else(|| DeError::custom(format!("unknown command opcode {}", n)))
            }
            fn visit_i64<E>(self, n: i64) -> Result<Command, E>
            where
                E: DeError,
            {
                if n < 0 {
                    return Err(DeError::custom(format!("unknown command opcode {}", n)));
                }
                self.visit_u64(n as u64)
            }
            fn visit_str<E>(self, s: &str) -> Result<Command, E>
            where
                E: DeError,
            {
                Command::parse(s).ok_or_else(|| DeError::custom(format!("unknown command: {:?}", s)))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// Everything the engine reacts to.
///
/// Produced by [`EventSource`](crate::traits::EventSource)s and consumed
/// one at a time by [`Engine::handle_event`](crate::engine::Engine::handle_event).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `_NET_ACTIVE_WINDOW` changed.
    ActiveWindowChanged,
    /// `_NET_CURRENT_DESKTOP` changed.
    DesktopChanged,
    /// `_NET_CLIENT_LIST` changed.
    WindowListChanged,
    /// A top-level (frame) window was moved or resized.
    GeometryChanged(WindowId),
    /// A grabbed hotkey was released.
    KeyReleased(u8),
    /// A remote-control command.
    Command(Command),
}
