//! Macro executor - sequences the actions of one macro run.
//!
//! One run is strictly sequential: an action's injections resolve, its
//! dispatch completes, and only then does the next action start. After a
//! command or script dispatch the executor yields to the bottom of the
//! task queue, so host-side events the action scheduled (prompts, UI
//! updates) are observed before the next action - the author perceives a
//! deterministic order of side effects.

use serde_json::Value;
use tracing::{debug, trace};

use super::action::{normalize, Action, Dispatch, NormalizeError};
use super::resolver::ValueResolver;
use super::script_runtime::ScriptRuntime;
use super::template::substitute;
use crate::error::{BatonError, Result};
use crate::host::{CommandHost, Shell, WorkspaceEnv};

/// Ephemeral per-run view of the capabilities one macro needs. Created for
/// each invocation; holds no state of its own.
pub struct MacroExecutor<'a> {
    pub name: &'a str,
    pub host: &'a dyn CommandHost,
    pub shell: &'a dyn Shell,
    pub workspace: &'a dyn WorkspaceEnv,
    pub runtime: &'a dyn ScriptRuntime,
}

impl<'a> MacroExecutor<'a> {
    /// Run every action in order; the first failure aborts the run and is
    /// returned as a diagnostic naming the macro and the 1-based step.
    pub async fn run(&self, actions: &[Action]) -> Result<()> {
        for (index, action) in actions.iter().enumerate() {
            let step = index + 1;
            trace!("macro {:?} step #{step}: {action:?}", self.name);

            let dispatch = normalize(action, self.workspace)
                .await
                .map_err(|err| self.normalize_diagnostic(step, err))?;

            match dispatch {
                Dispatch::Command(command) => {
                    self.invoke(step, &command, None).await?;
                    // flush: let host-side events run before the next step
                    tokio::task::yield_now().await;
                }
                Dispatch::Script(source) => {
                    self.runtime
                        .eval_script(&source)
                        .map_err(|err| BatonError::ScriptEval {
                            macro_name: self.name.to_string(),
                            step,
                            detail: err.to_string(),
                        })?;
                    tokio::task::yield_now().await;
                }
                Dispatch::Invocation {
                    command,
                    mut args,
                    mut hidden_console,
                    injections,
                } => {
                    let resolver = ValueResolver::new(self.runtime);
                    for injection in &injections {
                        let resolved = resolver.resolve(&injection.source).map_err(|err| {
                            BatonError::Injection {
                                macro_name: self.name.to_string(),
                                step,
                                marker: injection.replace.clone(),
                                detail: err.to_string(),
                            }
                        })?;
                        debug!(
                            "macro {:?} step #{step}: {:?} -> {:?} via {:?}",
                            self.name, injection.replace, resolved.value, resolved.strategy
                        );

                        // shallow by design: only top-level string args
                        for value in args.values_mut() {
                            if let Value::String(text) = value {
                                *text = substitute(text, &injection.replace, &resolved.value);
                            }
                        }
                        if let Some(console) = hidden_console.as_mut() {
                            *console = substitute(console, &injection.replace, &resolved.value);
                        }
                    }

                    if let Some(console) = hidden_console.as_deref() {
                        if !console.trim().is_empty() {
                            self.shell.run_sync(console).map_err(|err| BatonError::Shell {
                                macro_name: self.name.to_string(),
                                step,
                                detail: err.to_string(),
                            })?;
                        }
                    }

                    if let Some(command) = command {
                        self.invoke(step, &command, Some(Value::Object(args))).await?;
                    }
                }
                Dispatch::Skip => {}
            }
        }

        Ok(())
    }

    async fn invoke(&self, step: usize, command: &str, args: Option<Value>) -> Result<()> {
        self.host
            .invoke(command, args)
            .await
            .map_err(|err| BatonError::Host {
                macro_name: self.name.to_string(),
                step,
                command: command.to_string(),
                detail: err.to_string(),
            })
    }

    fn normalize_diagnostic(&self, step: usize, err: NormalizeError) -> BatonError {
        match err {
            NormalizeError::Shape { field, found } => BatonError::FieldShape {
                macro_name: self.name.to_string(),
                step,
                field,
                found,
            },
            NormalizeError::Path(detail) => BatonError::ScriptPath {
                macro_name: self.name.to_string(),
                step,
                detail,
            },
        }
    }
}
