//! Console host surfaces - terminal implementations of the host traits.
//!
//! These back the bundled CLI: commands are held in an in-process table,
//! messages go to the terminal, and the picker is a numbered stdin prompt.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{CommandBinding, CommandHandler, CommandHost, Notifier, WorkspaceEnv};

/// Built-in command available without any registration: prints its `text`
/// argument (or the whole argument object) to stdout. Gives fresh
/// configurations something runnable out of the box.
pub const PRINT_COMMAND: &str = "print";

type HandlerTable = Arc<Mutex<HashMap<String, CommandHandler>>>;

fn lock_table(table: &HandlerTable) -> std::sync::MutexGuard<'_, HashMap<String, CommandHandler>> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An in-process command host.
///
/// Registered handlers live in a shared table; a binding's teardown removes
/// its entry, so a disposed command can never be dispatched again.
#[derive(Default)]
pub struct LocalCommandHost {
    handlers: HandlerTable,
}

impl LocalCommandHost {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommandHost for LocalCommandHost {
    async fn invoke(&self, command: &str, args: Option<Value>) -> Result<()> {
        let handler = lock_table(&self.handlers).get(command).cloned();
        if let Some(handler) = handler {
            handler(args).await;
            return Ok(());
        }

        match command {
            PRINT_COMMAND => {
                match args {
                    Some(Value::Object(map)) => match map.get("text") {
                        Some(Value::String(text)) => println!("{text}"),
                        _ => println!("{}", Value::Object(map)),
                    },
                    Some(other) => println!("{other}"),
                    None => println!(),
                }
                Ok(())
            }
            _ => bail!("unknown command: {command}"),
        }
    }

    async fn commands(&self) -> Vec<String> {
        let mut commands: Vec<String> = lock_table(&self.handlers).keys().cloned().collect();
        commands.push(PRINT_COMMAND.to_string());
        commands.sort();
        commands
    }

    fn register(&self, id: &str, handler: CommandHandler) -> CommandBinding {
        debug!("registering command {id}");
        lock_table(&self.handlers).insert(id.to_string(), handler);

        let table = Arc::clone(&self.handlers);
        let id_owned = id.to_string();
        CommandBinding::new(id, move || {
            debug!("disposing command {id_owned}");
            lock_table(&table).remove(&id_owned);
        })
    }
}

/// Terminal notifier: messages to stderr, picker as a numbered prompt on
/// stdin. An empty or unparseable selection dismisses the picker.
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn info(&self, message: &str) {
        println!("{message}");
    }

    async fn warn(&self, message: &str) {
        eprintln!("warning: {message}");
    }

    async fn pick(&self, items: &[String]) -> Option<String> {
        if items.is_empty() {
            return None;
        }
        for (index, item) in items.iter().enumerate() {
            println!("{:>3}. {item}", index + 1);
        }
        eprint!("select (number or name, empty to cancel): ");
        let _ = std::io::stderr().flush();

        let mut line = String::new();
        std::io::stdin().read_line(&mut line).ok()?;
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if let Ok(number) = line.parse::<usize>() {
            return number.checked_sub(1).and_then(|i| items.get(i)).cloned();
        }
        items.iter().find(|item| item.as_str() == line).cloned()
    }
}

/// Treats the process working directory as the open workspace.
pub struct CwdWorkspace;

impl WorkspaceEnv for CwdWorkspace {
    fn workspace_root(&self) -> Option<PathBuf> {
        std::env::current_dir().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_handler() -> CommandHandler {
        Arc::new(|_args| Box::pin(async {}))
    }

    #[tokio::test]
    async fn disposed_binding_is_not_dispatchable() {
        let host = LocalCommandHost::new();
        let binding = host.register("x.y", noop_handler());
        assert!(host.invoke("x.y", None).await.is_ok());

        binding.dispose();
        assert!(host.invoke("x.y", None).await.is_err());
    }

    #[tokio::test]
    async fn dropping_binding_unregisters() {
        let host = LocalCommandHost::new();
        {
            let _binding = host.register("x.y", noop_handler());
        }
        assert!(host.invoke("x.y", None).await.is_err());
    }

    #[tokio::test]
    async fn commands_lists_builtin_and_registered() {
        let host = LocalCommandHost::new();
        let _binding = host.register("a.b", noop_handler());
        let commands = host.commands().await;
        assert!(commands.contains(&"a.b".to_string()));
        assert!(commands.contains(&PRINT_COMMAND.to_string()));
    }
}
