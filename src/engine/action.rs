//! Action model and normalizer.
//!
//! Actions arrive from user settings in several permitted shapes; the
//! normalizer resolves each one to an explicit dispatch variant exactly
//! once, so dispatch sites never re-inspect raw configuration. Everything
//! it produces is an independent copy: substitution and execution never
//! mutate the stored definition.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::host::WorkspaceEnv;

/// A conventional import line aliasing the host API. Script files may
/// carry it for editor tooling; it has no runtime effect and is stripped
/// before evaluation.
pub const HOST_IMPORT_LINE: &str = "import \"baton\" as baton;";

/// One step of a macro, as authored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Action {
    /// A bare string names a host command invoked with no arguments.
    Command(String),
    /// A structured step: host-command invocation, embedded script, or
    /// hidden console command, possibly with injections.
    Step(Box<ActionStep>),
    /// Anything else. Tolerated and skipped at dispatch time.
    Other(Value),
}

/// The object form of an action. Shape validation of the loosely typed
/// fields (`script`, `scriptPath`, `hiddenConsole`, `withResultOf`) is
/// deferred to normalization so a malformed field aborts the macro run
/// with a diagnostic instead of failing the settings parse.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionStep {
    pub command: Option<String>,
    pub args: Map<String, Value>,
    pub script: Option<Value>,
    pub script_path: Option<Value>,
    pub hidden_console: Option<Value>,
    pub injections: Vec<Injection>,
}

/// A dynamic-value computation plus the literal marker it replaces.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Injection {
    pub with_result_of: Value,
    pub replace: String,
}

/// An action with its dispatch shape resolved, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Invoke a host command with no arguments.
    Command(String),
    /// Evaluate an embedded script, normalized to one source blob.
    Script(String),
    /// Structured invocation: injections applied to `args` and
    /// `hidden_console`, then the console command and host command run.
    Invocation {
        command: Option<String>,
        args: Map<String, Value>,
        hidden_console: Option<String>,
        injections: Vec<NormalizedInjection>,
    },
    /// Unrecognized entry; skipped without aborting the run.
    Skip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInjection {
    pub source: String,
    pub replace: String,
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("\"{field}\" is not a string or an array of lines: {found}")]
    Shape { field: &'static str, found: String },

    #[error("{0}")]
    Path(String),
}

/// Resolve a raw action to its dispatch form.
///
/// Script dispatch takes precedence over a `command` on the same step; a
/// script field short-circuits injections and command dispatch entirely.
pub async fn normalize(
    action: &Action,
    workspace: &dyn WorkspaceEnv,
) -> Result<Dispatch, NormalizeError> {
    match action {
        Action::Command(name) => Ok(Dispatch::Command(name.clone())),
        Action::Step(step) => normalize_step(step, workspace).await,
        Action::Other(value) => {
            debug!("skipping unrecognized action entry: {value}");
            Ok(Dispatch::Skip)
        }
    }
}

async fn normalize_step(
    step: &ActionStep,
    workspace: &dyn WorkspaceEnv,
) -> Result<Dispatch, NormalizeError> {
    if let Some(path_value) = &step.script_path {
        let raw = path_value.as_str().ok_or_else(|| NormalizeError::Shape {
            field: "scriptPath",
            found: path_value.to_string(),
        })?;
        let path = resolve_script_path(
            raw,
            workspace.workspace_root().as_deref(),
            workspace.home_dir().as_deref(),
        )?;
        let source = tokio::fs::read_to_string(&path).await.map_err(|err| {
            NormalizeError::Path(format!(
                "could not read the script file {path:?}: {err}. If the path is \
                 workspace-relative, check the open workspace; a \"~/\"-prefixed \
                 path may be more reliable"
            ))
        })?;
        return Ok(Dispatch::Script(source.replacen(HOST_IMPORT_LINE, "", 1)));
    }

    if let Some(script) = &step.script {
        let source = join_lines(script).ok_or_else(|| NormalizeError::Shape {
            field: "script",
            found: script.to_string(),
        })?;
        return Ok(Dispatch::Script(source));
    }

    let hidden_console = match &step.hidden_console {
        Some(value) => {
            let mut command = join_lines(value).ok_or_else(|| NormalizeError::Shape {
                field: "hiddenConsole",
                found: value.to_string(),
            })?;
            command.push('\n');
            Some(command)
        }
        None => None,
    };

    let mut injections = Vec::with_capacity(step.injections.len());
    for injection in &step.injections {
        let source = join_lines(&injection.with_result_of).ok_or_else(|| NormalizeError::Shape {
            field: "withResultOf",
            found: injection.with_result_of.to_string(),
        })?;
        injections.push(NormalizedInjection {
            source,
            replace: injection.replace.clone(),
        });
    }

    Ok(Dispatch::Invocation {
        command: step.command.clone(),
        args: step.args.clone(),
        hidden_console,
        injections,
    })
}

/// Unify the two permitted multi-line shapes: a single string passes
/// through, a sequence of strings is joined with newlines. Anything else
/// is a shape error at the call site.
fn join_lines(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let mut lines = Vec::with_capacity(items.len());
            for item in items {
                lines.push(item.as_str()?);
            }
            Some(lines.join("\n"))
        }
        _ => None,
    }
}

/// Resolve a script path: `~/` against the home directory, relative paths
/// against the open workspace root, absolute paths as-is.
pub(crate) fn resolve_script_path(
    raw: &str,
    workspace_root: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, NormalizeError> {
    if raw == "~" || raw.starts_with("~/") {
        let home = home.ok_or_else(|| {
            NormalizeError::Path(format!(
                "could not determine the home directory to resolve {raw:?}"
            ))
        })?;
        return Ok(home.join(raw.trim_start_matches("~/")));
    }

    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return Ok(path);
    }

    match workspace_root {
        Some(root) => Ok(root.join(path)),
        None => Err(NormalizeError::Path(format!(
            "the script path {raw:?} is workspace-relative, but no workspace is \
             open. Use a \"~/\"-prefixed or absolute path instead"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct NoWorkspace;

    impl WorkspaceEnv for NoWorkspace {
        fn workspace_root(&self) -> Option<PathBuf> {
            None
        }
    }

    fn parse(value: Value) -> Action {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn bare_string_parses_as_command() {
        assert_eq!(
            parse(json!("editor.save")),
            Action::Command("editor.save".into())
        );
    }

    #[test]
    fn unrecognized_entries_parse_as_other() {
        assert!(matches!(parse(json!(42)), Action::Other(_)));
        assert!(matches!(parse(json!(["a", "b"])), Action::Other(_)));
    }

    #[tokio::test]
    async fn script_lines_are_joined() {
        let action = parse(json!({"script": ["let x = 1;", "x + 1"]}));
        let dispatch = normalize(&action, &NoWorkspace).await.unwrap();
        assert_eq!(dispatch, Dispatch::Script("let x = 1;\nx + 1".into()));
    }

    #[tokio::test]
    async fn script_wins_over_command() {
        let action = parse(json!({"command": "a.b", "script": "1 + 1"}));
        let dispatch = normalize(&action, &NoWorkspace).await.unwrap();
        assert_eq!(dispatch, Dispatch::Script("1 + 1".into()));
    }

    #[tokio::test]
    async fn malformed_script_is_a_shape_error() {
        let action = parse(json!({"script": 7}));
        let err = normalize(&action, &NoWorkspace).await.unwrap_err();
        assert!(matches!(err, NormalizeError::Shape { field: "script", .. }));
    }

    #[tokio::test]
    async fn hidden_console_gets_one_trailing_newline() {
        let action = parse(json!({"hiddenConsole": ["echo a", "echo b"]}));
        match normalize(&action, &NoWorkspace).await.unwrap() {
            Dispatch::Invocation { hidden_console, .. } => {
                assert_eq!(hidden_console.as_deref(), Some("echo a\necho b\n"));
            }
            other => panic!("expected invocation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn injection_sources_are_joined() {
        let action = parse(json!({
            "command": "a.b",
            "injections": [{"withResultOf": ["let x = 2;", "x"], "replace": "X"}]
        }));
        match normalize(&action, &NoWorkspace).await.unwrap() {
            Dispatch::Invocation { injections, .. } => {
                assert_eq!(injections[0].source, "let x = 2;\nx");
                assert_eq!(injections[0].replace, "X");
            }
            other => panic!("expected invocation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn relative_script_path_without_workspace_fails_with_guidance() {
        let action = parse(json!({"scriptPath": "scripts/run.rhai"}));
        let err = normalize(&action, &NoWorkspace).await.unwrap_err();
        assert!(err.to_string().contains("~/"));
    }

    #[tokio::test]
    async fn script_path_reads_file_and_strips_host_import() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("snippet.rhai");
        std::fs::write(&file, format!("{HOST_IMPORT_LINE}\n1 + 1")).unwrap();

        let action = parse(json!({"scriptPath": file.to_str().unwrap()}));
        let dispatch = normalize(&action, &NoWorkspace).await.unwrap();
        assert_eq!(dispatch, Dispatch::Script("\n1 + 1".into()));
    }

    #[test]
    fn tilde_paths_resolve_against_home() {
        let resolved =
            resolve_script_path("~/bin/x.rhai", None, Some(Path::new("/home/u"))).unwrap();
        assert_eq!(resolved, PathBuf::from("/home/u/bin/x.rhai"));
    }

    #[test]
    fn relative_paths_resolve_against_workspace() {
        let resolved =
            resolve_script_path("bin/x.rhai", Some(Path::new("/ws")), None).unwrap();
        assert_eq!(resolved, PathBuf::from("/ws/bin/x.rhai"));
    }
}
