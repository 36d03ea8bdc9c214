//! Dynamic value resolver - layered fallback evaluation.
//!
//! Authors may write a pure expression (`timestamp()`) or a multi-statement
//! snippet; rather than making them annotate which form they used, the
//! resolver tries an ordered list of evaluation strategies and the first
//! success wins.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::script_runtime::{ScriptError, ScriptRuntime, BLOCK_WRAPPER_FN};

/// Which evaluation layer produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalStrategy {
    /// A single bare expression.
    Expression,
    /// A full script, value of the final expression or a `return`.
    Script,
    /// The source wrapped in a synthetic function body and called.
    Block,
}

#[derive(Debug, Clone)]
pub struct Resolved {
    pub value: String,
    pub strategy: EvalStrategy,
}

/// Matches sources that read as a statement block rather than a single
/// expression: a `return` keyword, a separator, or a line break.
static STATEMENT_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\breturn\b|;|\n").expect("static pattern"));

pub struct ValueResolver<'a> {
    runtime: &'a dyn ScriptRuntime,
}

impl<'a> ValueResolver<'a> {
    pub fn new(runtime: &'a dyn ScriptRuntime) -> Self {
        Self { runtime }
    }

    /// Try each strategy in order; first success wins. The error of the
    /// last applicable layer is returned when all of them fail.
    pub fn resolve(&self, source: &str) -> Result<Resolved, ScriptError> {
        match self.runtime.eval_expression(source) {
            Ok(value) => {
                return Ok(Resolved {
                    value,
                    strategy: EvalStrategy::Expression,
                })
            }
            Err(err) => debug!("expression strategy failed: {err}"),
        }

        let script_err = match self.runtime.eval_script(source) {
            Ok(value) => {
                return Ok(Resolved {
                    value,
                    strategy: EvalStrategy::Script,
                })
            }
            Err(err) => err,
        };
        debug!("script strategy failed: {script_err}");

        if STATEMENT_SHAPE.is_match(source) {
            return self
                .runtime
                .eval_script(&wrap_block(source))
                .map(|value| Resolved {
                    value,
                    strategy: EvalStrategy::Block,
                });
        }

        Err(script_err)
    }
}

fn wrap_block(source: &str) -> String {
    format!("fn {BLOCK_WRAPPER_FN}() {{\n{source}\n}}\n{BLOCK_WRAPPER_FN}()")
}
