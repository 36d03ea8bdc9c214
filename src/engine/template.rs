//! Templating - literal marker substitution.

use regex::{NoExpand, Regex};

/// Replace every non-overlapping literal occurrence of `marker` in `text`
/// with `value`.
///
/// The marker is escaped before the matcher is built, so regex
/// metacharacters in it match themselves; the value is inserted verbatim
/// (`$` sequences are not capture references). Pure function, no error
/// conditions.
pub fn substitute(text: &str, marker: &str, value: &str) -> String {
    let matcher = match Regex::new(&regex::escape(marker)) {
        Ok(matcher) => matcher,
        // an escaped literal is always a valid pattern
        Err(_) => return text.to_string(),
    };
    matcher.replace_all(text, NoExpand(value)).into_owned()
}
