//! Entry point for the **xtiler** daemon.
//!
//! Spawns all [`EventSource`](xtiler::traits::EventSource)s on background
//! threads and processes incoming events one at a time on the main thread.
//!
//! ```text
//! xtiler [-v | -vv] [--config <path>]
//! ```

use log::{error, info, warn};
use std::path::{Path, PathBuf};
use xtiler::config::Config;

/// Abstract socket name used as the single-instance lock.
#[cfg(target_os = "linux")]
const INSTANCE_LOCK: &[u8] = b"xtiler_lock";

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
struct Args {
    verbosity: u8,
    config: Option<PathBuf>,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-v" | "--verbose" => parsed.verbosity = parsed.verbosity.max(1),
                "-vv" => parsed.verbosity = 2,
                "-c" | "--config" => {
                    let path = args.next().ok_or("--config needs a path")?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "-h" | "--help" => return Err(String::new()),
                other => return Err(format!("unknown argument {:?}", other)),
            }
        }
        Ok(parsed)
    }
}

fn usage() -> &'static str {
    "usage: xtiler [-v | -vv] [--config <path>]\n\
     \n  -v        log active-window changes and toggles\
     \n  -vv       also log window rule decisions\
     \n  --config  configuration file (default $XDG_CONFIG_HOME/xtiler/config.json)"
}

/// `-v` → info, `-vv` → debug.  `RUST_LOG` still takes precedence.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Load the config file, falling back to compiled-in defaults.
fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path.map(Path::to_path_buf).or_else(Config::default_path) else {
        info!("no config directory, using defaults");
        return Config::default();
    };
    if !path.exists() {
        info!("no config file at {}, using defaults", path.display());
        return Config::default();
    }
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            error!("{}; using defaults", e);
            Config::default()
        }
    }
}

/// Hold an abstract Unix socket for the lifetime of the daemon so a second
/// instance refuses to start.
#[cfg(target_os = "linux")]
fn acquire_instance_lock() -> std::io::Result<std::os::unix::net::UnixListener> {
    use std::os::linux::net::SocketAddrExt;
    use std::os::unix::net::{SocketAddr, UnixListener};
    let addr = SocketAddr::from_abstract_name(INSTANCE_LOCK)?;
    UnixListener::bind_addr(&addr)
}

/// Record a fatal error in the crash journal, log it and exit.
fn fatal(message: impl std::fmt::Display) -> ! {
    let journal = xtiler::journal::Journal::new(xtiler::journal::default_crash_log());
    if let Err(e) = journal.append(&message.to_string()) {
        warn!("could not write {}: {}", journal.path().display(), e);
    }
    error!("{}", message);
    std::process::exit(1);
}

//  Main

fn main() {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("{}", msg);
            }
            eprintln!("{}", usage());
            std::process::exit(2);
        }
    };
    init_logging(args.verbosity);

    #[cfg(target_os = "linux")]
    let _lock = match acquire_instance_lock() {
        Ok(lock) => lock,
        Err(_) => {
            error!("xtiler already running, exiting");
            std::process::exit(1);
        }
    };

    let config = load_config(args.config.as_deref());
    run_daemon(config);
}

#[cfg(feature = "x11")]
fn run_daemon(config: Config) {
    use std::sync::mpsc;
    use xtiler::command::Event;
    use xtiler::engine::{Engine, Flow};
    use xtiler::x11::events::X11EventSource;
    use xtiler::x11::wm::X11Wm;

    let modifier = config.hotkeys.modifier;
    let wm = match X11Wm::connect() {
        Ok(wm) => wm,
        Err(e) => fatal(e),
    };
    let mut engine = match Engine::new(wm, config) {
        Ok(engine) => engine,
        Err(e) => fatal(e),
    };
    let keys: Vec<u8> = engine.hotkeys().keys().copied().collect();
    let x_source = match X11EventSource::connect(modifier, keys) {
        Ok(source) => source,
        Err(e) => fatal(e),
    };

    let (tx, rx) = mpsc::channel::<Event>();
    spawn_event_sources(x_source, tx);

    if let Err(e) = engine.start() {
        fatal(e);
    }
    info!("xtiler running");

    for event in rx {
        match engine.handle_event(event) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => {
                info!("exit requested");
                return;
            }
            Err(e) => fatal(e),
        }
    }
    info!("all event sources closed, exiting");
}

#[cfg(not(feature = "x11"))]
fn run_daemon(_config: Config) {
    fatal("xtiler was built without the `x11` feature; no window system backend");
}

//  Helpers

#[cfg(feature = "x11")]
fn spawn_event_sources(
    x_source: xtiler::x11::events::X11EventSource,
    tx: std::sync::mpsc::Sender<xtiler::command::Event>,
) {
    use xtiler::ipc::listener::UnixSocketListener;
    use xtiler::traits::EventSource;

    {
        let tx = tx.clone();
        std::thread::spawn(move || {
            let mut source = x_source;
            if let Err(e) = source.run(tx) {
                error!("X event source error: {}", e);
            }
        });
    }

    {
        let tx = tx.clone();
        let path = xtiler::ipc::default_socket_path();
        std::thread::spawn(move || {
            let mut source = UnixSocketListener::new(&path);
            if let Err(e) = source.run(tx) {
                error!("socket listener error: {}", e);
            }
        });
    }

    drop(tx);
}
