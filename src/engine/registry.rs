//! Macro registry - definitions, bindings, and atomic reload.
//!
//! The registry owns two pieces of process-wide state: the current macro
//! definitions and the set of installed command bindings. Both are only
//! mutated inside [`MacroRegistry::reload`], between a full teardown and a
//! full recreation, so dispatch never observes a partial swap.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};
use tracing::debug;

use super::action::Action;
use crate::host::{CommandBinding, CommandHandler, CommandHost};

/// Names that collide with accessor semantics of the settings mapping;
/// never registered as macros even when their value is a sequence.
pub const RESERVED_NAMES: [&str; 4] = ["has", "get", "update", "inspect"];

/// Namespace prefix for every command the engine installs on the host.
pub const COMMAND_NAMESPACE: &str = "baton";

/// Fixed entry points, installed once alongside the per-macro bindings.
pub const RUN_COMMAND: &str = "baton.run";
pub const LIST_COMMANDS_COMMAND: &str = "baton.list-commands";
pub const DUMMY_COMMAND: &str = "baton.dummy";

/// Command id a macro is invokable under.
pub fn command_id(name: &str) -> String {
    format!("{COMMAND_NAMESPACE}.{name}")
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// What a (re)load registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub count: usize,
    pub names: Vec<String>,
}

#[derive(Default)]
pub struct MacroRegistry {
    definitions: RwLock<BTreeMap<String, Value>>,
    bindings: Mutex<Vec<CommandBinding>>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new mapping: tear down every installed binding first,
    /// replace the definitions, then register one binding per macro whose
    /// value is a sequence and whose name is not reserved.
    pub fn reload(
        &self,
        mapping: BTreeMap<String, Value>,
        host: &dyn CommandHost,
        make_handler: &(dyn Fn(&str) -> CommandHandler + Sync),
    ) -> LoadSummary {
        // teardown first so stale bindings never linger
        self.lock_bindings().clear();
        *self
            .definitions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = mapping;

        let names = self.macro_names();
        let mut bindings = Vec::with_capacity(names.len());
        for name in &names {
            bindings.push(host.register(&command_id(name), make_handler(name)));
        }
        debug!("installed {} macro bindings", bindings.len());
        *self.lock_bindings() = bindings;

        LoadSummary {
            count: names.len(),
            names,
        }
    }

    /// Names of currently registered macros: sequence-valued, unreserved.
    pub fn macro_names(&self) -> Vec<String> {
        self.read_definitions()
            .iter()
            .filter(|(name, value)| value.is_array() && !is_reserved(name))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Re-read a macro's actions by name at call time. Each call parses a
    /// fresh copy out of the stored mapping, so callers can never mutate
    /// the definition through what they are handed.
    pub fn actions(&self, name: &str) -> Option<Vec<Action>> {
        if is_reserved(name) {
            return None;
        }
        let definitions = self.read_definitions();
        let entries = definitions.get(name)?.as_array()?;
        Some(
            entries
                .iter()
                .map(|entry| {
                    serde_json::from_value(entry.clone())
                        .unwrap_or_else(|_| Action::Other(entry.clone()))
                })
                .collect(),
        )
    }

    fn read_definitions(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Value>> {
        self.definitions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_bindings(&self) -> std::sync::MutexGuard<'_, Vec<CommandBinding>> {
        self.bindings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
