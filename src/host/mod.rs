//! Host-facing capability traits.
//!
//! The engine consumes four outward surfaces: a command host (invoke and
//! register named commands), a notification surface (messages and a
//! single-choice picker), a synchronous shell, and the workspace
//! environment used for script-path resolution. Implementations for a
//! plain terminal live in [`console`] and [`shell`].

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

pub mod console;
pub mod shell;

pub type BoxedCommandFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Handler installed behind a registered command id. Arguments are whatever
/// the invoker passed along; macro bindings ignore them.
pub type CommandHandler = Arc<dyn Fn(Option<Value>) -> BoxedCommandFuture + Send + Sync>;

/// A live registration of one command id.
///
/// Dropping (or explicitly disposing) the binding removes the command from
/// the host, so a torn-down binding can never be dispatched again.
pub struct CommandBinding {
    id: String,
    dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl CommandBinding {
    pub fn new(id: impl Into<String>, dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id: id.into(),
            dispose: Some(Box::new(dispose)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Remove the command from the host now instead of at drop time.
    pub fn dispose(mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for CommandBinding {
    fn drop(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl std::fmt::Debug for CommandBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBinding").field("id", &self.id).finish()
    }
}

/// The host's command-invocation surface.
#[async_trait]
pub trait CommandHost: Send + Sync {
    /// Invoke a named command, awaiting its completion or failure.
    async fn invoke(&self, command: &str, args: Option<Value>) -> Result<()>;

    /// Every command identifier currently invokable on this host.
    async fn commands(&self) -> Vec<String>;

    /// Install a named command. The returned binding keeps it alive.
    fn register(&self, id: &str, handler: CommandHandler) -> CommandBinding;
}

/// User-facing messages and prompts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn info(&self, message: &str);

    async fn warn(&self, message: &str);

    /// Single-choice picker; `None` when the user dismisses it.
    async fn pick(&self, items: &[String]) -> Option<String>;
}

/// Synchronous shell execution. Blocks the calling thread for the duration
/// of the command; hidden console commands are meant to finish before the
/// rest of their action dispatches.
pub trait Shell: Send + Sync {
    fn run_sync(&self, command: &str) -> Result<()>;
}

/// Where the engine is running: the active workspace root (if any) and the
/// user's home directory, both used to resolve script paths.
pub trait WorkspaceEnv: Send + Sync {
    fn workspace_root(&self) -> Option<PathBuf>;

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}
