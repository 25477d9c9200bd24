//! Ambient REPL/CLI-wide settings, in the same shape as a typical
//! interpreter's `ReplConfig`: a small, `Default`-able struct threaded
//! through the REPL and CLI entry points rather than read from any global.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub prompt: String,
    /// Whether pretty-printed values are wrapped in ANSI color escapes.
    pub color: bool,
    /// Location of the REPL's persistent line-editing history file.
    pub history_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prompt: "aocla> ".to_string(),
            color: std::env::var_os("NO_COLOR").is_none(),
            history_path: dirs_history_path(),
        }
    }
}

/// Best-effort history file location: `$HOME/.aocla_history`, or `None` if
/// the home directory can't be determined (history is then in-memory only
/// for the session).
fn dirs_history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".aocla_history"))
}
