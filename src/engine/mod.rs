//! The macro engine - core orchestration module.
//!
//! Ties the settings store, host surfaces, script runtime, and registry
//! together behind a narrow API: load macros from settings, install one
//! command binding per macro, execute by name with full failure
//! containment, and reload whenever the settings change.

use std::sync::{Arc, Weak};
use tracing::{info, warn};

pub mod action;
pub mod executor;
pub mod registry;
pub mod resolver;
pub mod script_runtime;
pub mod settings;
pub mod template;

pub use action::{Action, ActionStep, Dispatch, Injection};
pub use registry::{LoadSummary, COMMAND_NAMESPACE, RESERVED_NAMES};
pub use resolver::{EvalStrategy, Resolved, ValueResolver};
pub use script_runtime::{RhaiRuntime, ScriptRuntime};
pub use settings::{FileSettings, MemorySettings, SettingsStore};
pub use template::substitute;

use crate::error::{BatonError, Result};
use crate::host::{
    BoxedCommandFuture, CommandBinding, CommandHandler, CommandHost, Notifier, Shell, WorkspaceEnv,
};
use executor::MacroExecutor;
use registry::MacroRegistry;

/// The main engine struct. Everything outward-facing is a shared trait
/// object, so hosts, CLIs, and tests plug in their own surfaces.
///
/// Command handlers installed on the host hold a weak reference back to
/// the engine; a dropped engine leaves them as harmless no-ops instead of
/// keeping it alive through the host's command table.
pub struct MacroEngine {
    settings: Arc<dyn SettingsStore>,
    host: Arc<dyn CommandHost>,
    notifier: Arc<dyn Notifier>,
    shell: Arc<dyn Shell>,
    workspace: Arc<dyn WorkspaceEnv>,
    runtime: Arc<dyn ScriptRuntime>,
    registry: MacroRegistry,
    weak: Weak<MacroEngine>,
}

impl MacroEngine {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        host: Arc<dyn CommandHost>,
        notifier: Arc<dyn Notifier>,
        shell: Arc<dyn Shell>,
        workspace: Arc<dyn WorkspaceEnv>,
        runtime: Arc<dyn ScriptRuntime>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            settings,
            host,
            notifier,
            shell,
            workspace,
            runtime,
            registry: MacroRegistry::new(),
            weak: weak.clone(),
        })
    }

    /// Read the settings mapping and (re)install one command binding per
    /// macro. Previously installed bindings are torn down first, so a
    /// removed macro's command stops being dispatchable.
    pub fn load(&self) -> LoadSummary {
        let mapping = self.settings.macros();
        let summary = self.registry.reload(mapping, self.host.as_ref(), &|name| {
            self.macro_handler(name)
        });
        info!("registered {} macros: {:?}", summary.count, summary.names);
        summary
    }

    /// Run one macro to completion. Failures are reported through the
    /// notification surface and contained: they never reach the caller,
    /// other macros, or future runs of the same macro.
    pub async fn execute(&self, name: &str) {
        if let Err(err) = self.run(name).await {
            warn!("macro {name:?} aborted: {err}");
            self.notifier.warn(&err.to_string()).await;
        }
    }

    async fn run(&self, name: &str) -> Result<()> {
        // re-read by name at call time, never through a captured snapshot
        let actions = self
            .registry
            .actions(name)
            .ok_or_else(|| BatonError::UnknownMacro(name.to_string()))?;

        MacroExecutor {
            name,
            host: self.host.as_ref(),
            shell: self.shell.as_ref(),
            workspace: self.workspace.as_ref(),
            runtime: self.runtime.as_ref(),
        }
        .run(&actions)
        .await
    }

    /// Prompt with the current macro names and execute the selection.
    /// Dismissing the picker is a no-op.
    pub async fn run_by_name(&self) {
        let names = self.registry.macro_names();
        if let Some(choice) = self.notifier.pick(&names).await {
            self.execute(&choice).await;
        }
    }

    /// Prompt with every command the host knows and invoke the selection
    /// with no arguments. A discovery aid for macro authors.
    pub async fn list_host_commands(&self) {
        let commands = self.host.commands().await;
        if let Some(choice) = self.notifier.pick(&commands).await {
            if let Err(err) = self.host.invoke(&choice, None).await {
                self.notifier
                    .warn(&format!("the \"{choice}\" command failed: {err}"))
                    .await;
            }
        }
    }

    /// No-op diagnostic command proving the engine loaded correctly.
    pub async fn dummy(&self) {
        self.notifier
            .info("Congratulations, the macro engine is loaded and working")
            .await;
    }

    pub fn macro_names(&self) -> Vec<String> {
        self.registry.macro_names()
    }

    /// Install the fixed entry points (run-by-name, list-commands, dummy)
    /// on the host. The caller holds the bindings; unlike macro bindings
    /// they survive settings reloads.
    pub fn install_entry_points(&self) -> Vec<CommandBinding> {
        vec![
            self.host.register(
                registry::RUN_COMMAND,
                self.engine_handler(|engine| Box::pin(async move { engine.run_by_name().await })),
            ),
            self.host.register(
                registry::LIST_COMMANDS_COMMAND,
                self.engine_handler(|engine| {
                    Box::pin(async move { engine.list_host_commands().await })
                }),
            ),
            self.host.register(
                registry::DUMMY_COMMAND,
                self.engine_handler(|engine| Box::pin(async move { engine.dummy().await })),
            ),
        ]
    }

    /// React to settings-change notifications until the store goes away,
    /// reloading the registry on each one.
    pub async fn watch(&self) {
        let mut receiver = self.settings.subscribe();
        while receiver.changed().await.is_ok() {
            info!("settings changed, reloading macros");
            self.load();
        }
    }

    fn macro_handler(&self, name: &str) -> CommandHandler {
        let name = name.to_string();
        self.engine_handler(move |engine| {
            let name = name.clone();
            Box::pin(async move { engine.execute(&name).await })
        })
    }

    fn engine_handler<F>(&self, run: F) -> CommandHandler
    where
        F: Fn(Arc<MacroEngine>) -> BoxedCommandFuture + Send + Sync + 'static,
    {
        let weak = self.weak.clone();
        Arc::new(move |_args| -> BoxedCommandFuture {
            match weak.upgrade() {
                Some(engine) => run(engine),
                // the engine is gone; its commands quietly do nothing
                None => Box::pin(async {}),
            }
        })
    }
}
