//! Picking the command that starts the tool server.

use std::path::Path;

use crate::error::{Error, Result};

/// Program and arguments for spawning the tool server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// Choose an interpreter by file extension. A path without an extension
/// is run directly.
pub fn launch_command(path: &Path) -> Result<LaunchCommand> {
    let script = path.to_string_lossy().into_owned();
    let interpreter = match path.extension().and_then(|ext| ext.to_str()) {
        None => {
            return Ok(LaunchCommand {
                program: script,
                args: Vec::new(),
            });
        }
        Some("js") => "node",
        Some("ts") => "ts-node",
        Some("py") if cfg!(windows) => "python",
        Some("py") => "python3",
        Some(_) => {
            return Err(Error::UnsupportedServer {
                path: path.to_path_buf(),
            });
        }
    };
    Ok(LaunchCommand {
        program: interpreter.to_string(),
        args: vec![script],
    })
}
