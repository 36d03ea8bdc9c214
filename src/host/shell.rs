//! System shell - synchronous execution of hidden console commands.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use tracing::debug;

use super::Shell;

/// Detects the appropriate shell command for the current platform.
///
/// On Windows, attempts to find Git Bash so multi-line console commands
/// behave the same as on Unix:
/// 1. Standard Git for Windows installation path
/// 2. Alternative 32-bit path
/// 3. bash.exe from PATH
///
/// On Unix systems, uses 'sh' which is always available.
fn find_shell_command() -> &'static str {
    if cfg!(windows) {
        if std::path::Path::new(r"C:\Program Files\Git\bin\bash.exe").exists() {
            debug!("Found Git Bash at standard 64-bit location");
            return r"C:\Program Files\Git\bin\bash.exe";
        }

        if std::path::Path::new(r"C:\Program Files (x86)\Git\bin\bash.exe").exists() {
            debug!("Found Git Bash at 32-bit location");
            return r"C:\Program Files (x86)\Git\bin\bash.exe";
        }

        debug!("No Git Bash found at standard locations, trying bash.exe from PATH");
        "bash.exe"
    } else {
        "sh"
    }
}

/// Cached shell command determined at first use.
pub static SHELL_COMMAND: Lazy<&'static str> = Lazy::new(find_shell_command);

/// Runs console commands through the platform shell, blocking until they
/// exit. Output is swallowed (the command is "hidden"); a non-zero exit
/// status surfaces as an error carrying the command's stderr.
pub struct SystemShell;

impl Shell for SystemShell {
    fn run_sync(&self, command: &str) -> Result<()> {
        debug!("running console command: {command:?}");

        let output = std::process::Command::new(*SHELL_COMMAND)
            .arg("-c")
            .arg(command)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "exited with {}: {}",
                output.status,
                stderr.trim_end()
            );
        }

        Ok(())
    }
}
