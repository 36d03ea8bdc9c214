use thiserror::Error;

/// Failures a macro run can surface to its author.
///
/// Every user-triggerable variant carries the macro name and the 1-based
/// step number, so the rendered message alone tells the author where to
/// look. These messages are shown verbatim through the notification
/// surface; none of them escape the engine as panics.
#[derive(Error, Debug)]
pub enum BatonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings parse error: {0}")]
    Settings(#[from] serde_yaml_ng::Error),

    #[error("no macro named \"{0}\" is configured")]
    UnknownMacro(String),

    #[error("for the \"{macro_name}\" macro, step #{step} has a \"{field}\" section that is not a string or an array of lines: {found}")]
    FieldShape {
        macro_name: String,
        step: usize,
        field: &'static str,
        found: String,
    },

    #[error("for the \"{macro_name}\" macro, step #{step}: {detail}")]
    ScriptPath {
        macro_name: String,
        step: usize,
        detail: String,
    },

    #[error("for the \"{macro_name}\" macro, the script in step #{step} failed: {detail}")]
    ScriptEval {
        macro_name: String,
        step: usize,
        detail: String,
    },

    #[error("for the \"{macro_name}\" macro, in the \"{marker}\" replacement (step #{step}), there was an error computing the value: {detail}")]
    Injection {
        macro_name: String,
        step: usize,
        marker: String,
        detail: String,
    },

    #[error("for the \"{macro_name}\" macro, the \"{command}\" command (step #{step}) failed: {detail}")]
    Host {
        macro_name: String,
        step: usize,
        command: String,
        detail: String,
    },

    #[error("for the \"{macro_name}\" macro, the console command in step #{step} failed: {detail}")]
    Shell {
        macro_name: String,
        step: usize,
        detail: String,
    },
}

pub type Result<T> = std::result::Result<T, BatonError>;
