//! Structured error types.
//!
//! The distilled spec describes a single "bounded error-message buffer"
//! (a 128-byte `char[]` in the original C) holding a kind, an offending
//! context truncated to a short prefix, and a `proc:line` back-trace. This
//! module renders that as two ordinary `thiserror` types instead: one for
//! parse-time failures (no trace, no frame context yet) and one for
//! evaluation failures (which accumulate a trace as the error unwinds
//! through nested `eval` calls).

use std::fmt;

/// Longest offending-context prefix kept in an error message, mirroring the
/// original interpreter's `%.30s` truncation in `setError`.
const CONTEXT_PREFIX_LEN: usize = 30;

/// Truncate `s` to a bounded prefix, appending `...` if anything was cut,
/// exactly as `setError`'s `snprintf(..., "%s: %.30s%s", ...)` does.
pub fn truncate_context(s: &str) -> String {
    if s.len() > CONTEXT_PREFIX_LEN {
        format!("{}...", &s[..CONTEXT_PREFIX_LEN])
    } else {
        s.to_string()
    }
}

/// A parse-time failure: a diagnostic message plus a bounded prefix of the
/// remaining unparsed input and the line it occurred on.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}: {context}")]
pub struct ParseError {
    pub message: String,
    pub context: String,
    pub line: u32,
}

impl ParseError {
    pub fn new(message: impl Into<String>, remaining: &str, line: u32) -> Self {
        ParseError { message: message.into(), context: truncate_context(remaining), line }
    }
}

/// One frame of the evaluator's back-trace, innermost first.
#[derive(Debug, Clone)]
pub struct TraceFrame {
    pub proc: Option<String>,
    pub line: u32,
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " in {}:{}", self.proc.as_deref().unwrap_or("unknown"), self.line)
    }
}

/// A runtime (evaluation) failure. Accumulates a back-trace as it unwinds
/// through nested procedure calls, innermost frame pushed first.
///
/// Implemented by hand rather than via `#[derive(thiserror::Error)]`: the
/// trace accumulates incrementally across call boundaries, which doesn't
/// fit thiserror's single static `#[error(...)]` format string.
#[derive(Debug, Clone)]
pub struct AoclaError {
    pub message: String,
    pub context: Option<String>,
    pub trace: Vec<TraceFrame>,
}

impl std::error::Error for AoclaError {}

impl AoclaError {
    pub fn new(message: impl Into<String>) -> Self {
        AoclaError { message: message.into(), context: None, trace: Vec::new() }
    }

    pub fn with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        AoclaError {
            message: message.into(),
            context: Some(truncate_context(&context.into())),
            trace: Vec::new(),
        }
    }

    /// Push a trace frame as the error unwinds through a call boundary.
    pub fn push_frame(mut self, proc: Option<String>, line: u32) -> Self {
        self.trace.push(TraceFrame { proc, line });
        self
    }
}

impl fmt::Display for AoclaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, ": {ctx}")?;
        }
        for frame in &self.trace {
            write!(f, "{frame}")?;
        }
        Ok(())
    }
}

impl From<ParseError> for AoclaError {
    fn from(e: ParseError) -> Self {
        AoclaError::with_context(e.message, e.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_context() {
        let long = "x".repeat(40);
        let t = truncate_context(&long);
        assert_eq!(t.len(), CONTEXT_PREFIX_LEN + 3);
        assert!(t.ends_with("..."));
    }

    #[test]
    fn display_includes_trace_in_order() {
        let err = AoclaError::new("boom")
            .push_frame(Some("inner".into()), 3)
            .push_frame(Some("outer".into()), 7);
        let s = err.to_string();
        assert_eq!(s, "boom in inner:3 in outer:7");
    }
}
