#![allow(dead_code)]

//! Shared test doubles: a recording command host, a scripted notifier, a
//! recording shell, and a fixed workspace environment.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use baton::engine::{MacroEngine, MemorySettings, RhaiRuntime};
use baton::host::{CommandBinding, CommandHandler, CommandHost, Notifier, Shell, WorkspaceEnv};

/// Records every invocation. Registered handlers dispatch like a real
/// host; un-registered `baton.*` ids fail (a binding must back them),
/// anything else is accepted and recorded.
#[derive(Default)]
pub struct RecordingHost {
    pub invocations: Mutex<Vec<(String, Option<Value>)>>,
    handlers: Arc<Mutex<HashMap<String, CommandHandler>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invoked(&self) -> Vec<(String, Option<Value>)> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn registered_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.handlers.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl CommandHost for RecordingHost {
    async fn invoke(&self, command: &str, args: Option<Value>) -> Result<()> {
        self.invocations
            .lock()
            .unwrap()
            .push((command.to_string(), args.clone()));

        let handler = self.handlers.lock().unwrap().get(command).cloned();
        if let Some(handler) = handler {
            handler(args).await;
            return Ok(());
        }
        if command.starts_with("baton.") {
            bail!("unknown command: {command}");
        }
        Ok(())
    }

    async fn commands(&self) -> Vec<String> {
        self.registered_ids()
    }

    fn register(&self, id: &str, handler: CommandHandler) -> CommandBinding {
        self.handlers
            .lock()
            .unwrap()
            .insert(id.to_string(), handler);
        let table = Arc::clone(&self.handlers);
        let id_owned = id.to_string();
        CommandBinding::new(id, move || {
            table.lock().unwrap().remove(&id_owned);
        })
    }
}

/// Records messages; the picker answers with whatever the test scripted.
#[derive(Default)]
pub struct ScriptedNotifier {
    pub infos: Mutex<Vec<String>>,
    pub warns: Mutex<Vec<String>>,
    pub pick_response: Mutex<Option<String>>,
    pub picks_seen: Mutex<Vec<Vec<String>>>,
}

impl ScriptedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(response: Option<&str>) -> Self {
        let notifier = Self::default();
        *notifier.pick_response.lock().unwrap() = response.map(str::to_string);
        notifier
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warns.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for ScriptedNotifier {
    async fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    async fn warn(&self, message: &str) {
        self.warns.lock().unwrap().push(message.to_string());
    }

    async fn pick(&self, items: &[String]) -> Option<String> {
        self.picks_seen.lock().unwrap().push(items.to_vec());
        self.pick_response.lock().unwrap().clone()
    }
}

/// Records console commands instead of running them.
#[derive(Default)]
pub struct RecordingShell {
    pub commands: Mutex<Vec<String>>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ran(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl Shell for RecordingShell {
    fn run_sync(&self, command: &str) -> Result<()> {
        self.commands.lock().unwrap().push(command.to_string());
        Ok(())
    }
}

/// Workspace environment with explicit root and home directories.
pub struct FixedWorkspace {
    pub root: Option<PathBuf>,
    pub home: Option<PathBuf>,
}

impl FixedWorkspace {
    pub fn none() -> Self {
        Self {
            root: None,
            home: None,
        }
    }

    pub fn rooted(root: PathBuf) -> Self {
        Self {
            root: Some(root),
            home: None,
        }
    }
}

impl WorkspaceEnv for FixedWorkspace {
    fn workspace_root(&self) -> Option<PathBuf> {
        self.root.clone()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }
}

/// Everything a test needs to drive one engine.
pub struct Harness {
    pub engine: Arc<MacroEngine>,
    pub settings: Arc<MemorySettings>,
    pub host: Arc<RecordingHost>,
    pub notifier: Arc<ScriptedNotifier>,
    pub shell: Arc<RecordingShell>,
}

pub fn harness(mapping: BTreeMap<String, Value>) -> Harness {
    harness_with(mapping, ScriptedNotifier::new(), FixedWorkspace::none())
}

pub fn harness_with(
    mapping: BTreeMap<String, Value>,
    notifier: ScriptedNotifier,
    workspace: FixedWorkspace,
) -> Harness {
    let settings = Arc::new(MemorySettings::from_mapping(mapping));
    let host = Arc::new(RecordingHost::new());
    let notifier = Arc::new(notifier);
    let shell = Arc::new(RecordingShell::new());
    let engine = MacroEngine::new(
        Arc::clone(&settings) as _,
        Arc::clone(&host) as _,
        Arc::clone(&notifier) as _,
        Arc::clone(&shell) as _,
        Arc::new(workspace),
        Arc::new(RhaiRuntime::new()),
    );
    Harness {
        engine,
        settings,
        host,
        notifier,
        shell,
    }
}
