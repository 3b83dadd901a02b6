//! Remote control for a running xtiler daemon.
//!
//! ```text
//! xtiler-ctl <opcode|name>          send over the daemon's Unix socket
//! xtiler-ctl --x11 <opcode|name>    send as an _XTILER_REMOTE client message
//! xtiler-ctl --list                 print all commands with their opcodes
//! ```

use std::io::Write;
use std::os::unix::net::UnixStream;
use xtiler::command::Command;

fn usage() -> ! {
    eprintln!("usage: xtiler-ctl [--x11] <opcode|name> | --list");
    std::process::exit(2);
}

/// Accept either the numeric opcode or the command name.
fn resolve(arg: &str) -> Option<Command> {
    match arg.parse::<u32>() {
        Ok(n) => Command::try_from(n).ok(),
        Err(_) => Command::parse(arg),
    }
}

fn send_socket(command: Command) -> Result<(), String> {
    let path = xtiler::ipc::default_socket_path();
    let mut stream = UnixStream::connect(&path)
        .map_err(|e| format!("cannot connect to {}: {}", path.display(), e))?;
    let line = serde_json::to_string(&command).map_err(|e| e.to_string())?;
    writeln!(stream, "{}", line).map_err(|e| format!("write: {}", e))
}

#[cfg(feature = "x11")]
fn send_x11(command: Command) -> Result<(), String> {
    xtiler::x11::events::send_remote(command).map_err(|e| e.to_string())
}

#[cfg(not(feature = "x11"))]
fn send_x11(_command: Command) -> Result<(), String> {
    Err("built without the `x11` feature".into())
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (via_x11, target) = match args.as_slice() {
        [flag] if flag == "--list" => {
            for command in Command::all() {
                println!("{:2}  {}", command.opcode(), command);
            }
            return;
        }
        [flag, target] if flag == "--x11" => (true, target),
        [target] => (false, target),
        _ => usage(),
    };

    let Some(command) = resolve(target) else {
        eprintln!("unknown command {:?} (see --list)", target);
        std::process::exit(1);
    };

    let result = if via_x11 {
        send_x11(command)
    } else {
        send_socket(command)
    };
    if let Err(e) = result {
        eprintln!("xtiler-ctl: {}", e);
        std::process::exit(1);
    }
}
