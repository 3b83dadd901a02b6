//! IPC listener that accepts remote-control commands over a Unix socket.
//!
//! External tools (`xtiler-ctl`, scripts, key-bind helpers) can connect to
//! the socket and send newline-delimited JSON commands.

pub mod listener;

use std::path::PathBuf;

/// `$XDG_RUNTIME_DIR/xtiler.sock`, or `/tmp/xtiler.sock` without a
/// runtime directory.
pub fn default_socket_path() -> PathBuf {
    let runtime = std::env::var_os("XDG_RUNTIME_DIR")
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "/tmp".into());
    PathBuf::from(runtime).join("xtiler.sock")
}
