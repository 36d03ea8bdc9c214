//! Script runtime - evaluates user-supplied expression and script source.
//!
//! The engine treats the runtime as a swappable adapter: anything that can
//! evaluate a source blob to a stringified value can back the resolver and
//! script actions. The shipped adapter embeds the rhai scripting engine.

use once_cell::sync::Lazy;
use regex::Regex;
use rhai::{Dynamic, Engine};
use thiserror::Error;
use tracing::info;

/// An evaluation failure, already rendered for the macro author.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ScriptError(pub String);

/// One capability: evaluate source to a stringified value, or fail.
///
/// `eval_expression` accepts only a single bare expression;
/// `eval_script` accepts full statement sequences, its value being the
/// final expression or an explicit `return`. The split is what lets the
/// resolver layer its fallback strategies.
pub trait ScriptRuntime: Send + Sync {
    fn eval_expression(&self, source: &str) -> Result<String, ScriptError>;

    fn eval_script(&self, source: &str) -> Result<String, ScriptError>;
}

/// Name of the synthetic function the block strategy wraps statement
/// sources in. Never shown to users; [`clean_error`] scrubs it.
pub const BLOCK_WRAPPER_FN: &str = "__macro_block";

static WRAPPER_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\s*in call to function\s+)?'?__macro_block'?\s*").expect("static pattern"));

/// Strip the synthetic wrapper symbol from an evaluation error so the
/// author only sees text about their own source.
pub fn clean_error(message: &str) -> String {
    WRAPPER_NOISE.replace_all(message, " ").trim().to_string()
}

/// Adapter backed by the rhai embedded scripting engine.
///
/// A fresh engine is built per evaluation so no state bleeds between macro
/// steps. The registered helper surface is intentionally small: `log`,
/// `env`, and `timestamp`.
#[derive(Default)]
pub struct RhaiRuntime;

impl RhaiRuntime {
    pub fn new() -> Self {
        Self
    }

    fn engine() -> Engine {
        let mut engine = Engine::new();
        engine.register_fn("log", |message: &str| {
            info!(target: "macro", "{message}");
        });
        engine.register_fn("env", |name: &str| {
            std::env::var(name).unwrap_or_default()
        });
        engine.register_fn("timestamp", || {
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
        });
        engine
    }

    /// The runtime's native string conversion: strings come back unquoted,
    /// everything else through its display form.
    fn stringify(value: Dynamic) -> String {
        if value.is_string() {
            value.into_string().unwrap_or_default()
        } else {
            value.to_string()
        }
    }
}

impl ScriptRuntime for RhaiRuntime {
    fn eval_expression(&self, source: &str) -> Result<String, ScriptError> {
        Self::engine()
            .eval_expression::<Dynamic>(source)
            .map(Self::stringify)
            .map_err(|err| ScriptError(clean_error(&err.to_string())))
    }

    fn eval_script(&self, source: &str) -> Result<String, ScriptError> {
        Self::engine()
            .eval::<Dynamic>(source)
            .map(Self::stringify)
            .map_err(|err| ScriptError(clean_error(&err.to_string())))
    }
}
