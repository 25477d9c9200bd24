//! The evaluator: walks a List's elements left to right, dispatching each
//! by variant. Lists are both code and data here, so "evaluate a program"
//! and "evaluate a procedure body" are the same operation, recursing once
//! per call into a list-bound procedure.
//!
//! Error back-traces fall out of the recursion for free: `eval` wraps
//! whatever error escapes an element's dispatch with exactly one
//! [`TraceFrame`](crate::error::TraceFrame) naming the frame that was
//! executing at the time, then lets it propagate. One `eval` invocation
//! runs inside exactly one stack frame, so one invocation contributes at
//! most one trace entry regardless of how many elements it walked through
//! before failing.

use std::rc::Rc;

use crate::error::AoclaError;
use crate::frame::Frame;
use crate::interp::Interp;
use crate::proc::{NativeFn, ProcBody};
use crate::value::{retain, unquote_copy, ObjData, Value};

/// Evaluate `program` (must be a List) in the context of whatever frame is
/// currently on top of `interp`'s frame stack. Used both for top-level
/// program/REPL-line evaluation and, recursively, for list-bound procedure
/// bodies — the caller pushes the new frame first.
pub fn eval(interp: &mut Interp, program: &Value) -> Result<(), AoclaError> {
    let elems = match &program.data {
        ObjData::List(elems) => elems,
        other => panic!("eval() requires a List, got {}", other_type_name(other)),
    };
    for o in elems {
        interp.frame_mut().current_line = o.line;
        log::trace!(
            "dispatch {} at line {} (frame depth {})",
            o.type_name(),
            o.line,
            interp.frames.len()
        );
        if let Err(e) = eval_one(interp, o) {
            let proc = interp.frame().current_proc.clone();
            let line = interp.frame().current_line;
            return Err(e.push_frame(proc, line));
        }
    }
    Ok(())
}

fn other_type_name(data: &ObjData) -> &'static str {
    match data {
        ObjData::Int(_) => "int",
        ObjData::Bool(_) => "bool",
        ObjData::String(_) => "string",
        ObjData::Symbol { .. } => "symbol",
        ObjData::List(_) => "list",
        ObjData::Tuple { .. } => "tuple",
    }
}

fn eval_one(interp: &mut Interp, o: &Value) -> Result<(), AoclaError> {
    match &o.data {
        ObjData::Tuple { elems, quoted: false } => capture_locals(interp, elems),
        ObjData::Tuple { quoted: true, .. } => {
            interp.stack.push(unquote_copy(o));
            Ok(())
        }
        ObjData::Symbol { quoted: true, .. } => {
            interp.stack.push(unquote_copy(o));
            Ok(())
        }
        ObjData::Symbol { name, quoted: false } if name.first() == Some(&b'$') => push_local(interp, name),
        ObjData::Symbol { name, quoted: false } => call_proc(interp, name),
        _ => {
            interp.stack.push(retain(o));
            Ok(())
        }
    }
}

/// Capture a contiguous run of stack values into this frame's locals, one
/// per tuple element, bottom of the run to element 0. Values move from the
/// stack into the frame; any prior binding at a reused slot is released.
fn capture_locals(interp: &mut Interp, elems: &[Value]) -> Result<(), AoclaError> {
    if interp.stack.len() < elems.len() {
        let ctx = elems.first().map(symbol_name_lossy).unwrap_or_default();
        return Err(AoclaError::with_context("Out of stack while capturing local", ctx));
    }
    let mut captured = interp.stack.drain_last(elems.len()).into_iter();
    for name_val in elems {
        let v = captured.next().expect("checked length above");
        if let ObjData::Symbol { name, .. } = &name_val.data {
            interp.frame_mut().set_local(name, v);
        }
    }
    Ok(())
}

fn symbol_name_lossy(v: &Value) -> String {
    match &v.data {
        ObjData::Symbol { name, .. } => String::from_utf8_lossy(name).into_owned(),
        _ => String::new(),
    }
}

/// Push the local bound at `$x`'s slot (keyed by `x`, the symbol's second
/// byte) onto the stack.
fn push_local(interp: &mut Interp, name: &[u8]) -> Result<(), AoclaError> {
    if name.len() < 2 {
        return Err(AoclaError::with_context("Unbound local var", String::from_utf8_lossy(name)));
    }
    let slot = [name[1]];
    match interp.frame().get_local(&slot) {
        Some(v) => {
            let v = retain(v);
            interp.stack.push(v);
            Ok(())
        }
        None => Err(AoclaError::with_context("Unbound local var", String::from_utf8_lossy(name))),
    }
}

enum CallTarget {
    Native(NativeFn),
    Aocla(Value),
}

/// Look up `name` in the procedure table and invoke it: a native closure
/// runs inline in the current frame, a list-bound procedure gets a fresh
/// frame pushed for the duration of its body.
fn call_proc(interp: &mut Interp, name: &[u8]) -> Result<(), AoclaError> {
    let name_str = String::from_utf8_lossy(name).into_owned();
    let target = match interp.procs.lookup(&name_str) {
        Some(p) => match &p.body {
            ProcBody::Native(f) => CallTarget::Native(Rc::clone(f)),
            ProcBody::Aocla(v) => CallTarget::Aocla(Rc::clone(v)),
        },
        None => return Err(AoclaError::with_context("Symbol not bound to procedure", name_str)),
    };
    match target {
        CallTarget::Native(f) => {
            let prev = interp.frame_mut().current_proc.clone();
            interp.frame_mut().current_proc = Some(name_str.clone());
            let result = f(interp).map_err(|e| {
                let line = interp.frame().current_line;
                e.push_frame(Some(name_str), line)
            });
            // Always restore, success or failure: `current_proc` is frame
            // state that outlives this call (the top-level frame persists
            // across separate `eval` invocations, e.g. REPL lines), so
            // leaving it set to the failed native's name here would leak
            // into the back-trace of a later, unrelated failure.
            interp.frame_mut().current_proc = prev;
            result
        }
        CallTarget::Aocla(list) => {
            let mut frame = Frame::new();
            frame.current_proc = Some(name_str.clone());
            interp.frames.push(frame);
            log::trace!("call {name_str} (new frame, depth {})", interp.frames.len());
            let result = eval(interp, &list);
            interp.frames.pop();
            result
        }
    }
}

/// `eval`, but targeting the frame one level up instead of the current one
/// — used by the `upeval` builtin to let a procedure run code as if it were
/// its caller (local variable capture lands in the caller's frame). Falls
/// back to an ordinary `eval` at the top level, where there is no frame up.
pub fn upeval(interp: &mut Interp, program: &Value) -> Result<(), AoclaError> {
    if interp.parent_frame_mut().is_none() {
        return eval(interp, program);
    }
    let len = interp.frames.len();
    interp.frames.swap(len - 1, len - 2);
    let result = eval(interp, program);
    interp.frames.swap(len - 1, len - 2);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::parser::parse_program;
    use crate::value::new_int;

    fn run(interp: &mut Interp, src: &str) -> Result<(), AoclaError> {
        let program = parse_program(src).unwrap();
        eval(interp, &program)
    }

    #[test]
    fn literal_push() {
        let mut interp = Interp::with_config(Config { color: false, ..Config::default() });
        run(&mut interp, "1 2 3").unwrap();
        assert_eq!(interp.stack.len(), 3);
    }

    #[test]
    fn tuple_capture_binds_locals() {
        let mut interp = Interp::with_config(Config { color: false, ..Config::default() });
        run(&mut interp, "10 20 (x y) $x $y").unwrap();
        assert_eq!(interp.stack.len(), 2);
        assert!(matches!(interp.stack.pop().unwrap().data, ObjData::Int(10)));
        assert!(matches!(interp.stack.pop().unwrap().data, ObjData::Int(20)));
    }

    #[test]
    fn quoted_symbol_pushes_unquoted_copy() {
        let mut interp = Interp::with_config(Config { color: false, ..Config::default() });
        run(&mut interp, "'foo").unwrap();
        match &interp.stack.pop().unwrap().data {
            ObjData::Symbol { name, quoted } => {
                assert_eq!(name, b"foo");
                assert!(!quoted);
            }
            _ => panic!("expected symbol"),
        }
    }

    #[test]
    fn undefined_symbol_is_an_error() {
        let mut interp = Interp::with_config(Config { color: false, ..Config::default() });
        let err = run(&mut interp, "nosuchproc").unwrap_err();
        assert!(err.message.contains("not bound to procedure"));
    }

    #[test]
    fn error_inside_list_proc_gets_backtrace() {
        let mut interp = Interp::with_config(Config { color: false, ..Config::default() });
        interp.procs.add_from_text("boom", "[nosuchproc]").unwrap();
        let err = run(&mut interp, "boom").unwrap_err();
        assert_eq!(err.trace.len(), 2);
        assert_eq!(err.trace[0].proc.as_deref(), Some("boom"));
        assert_eq!(err.trace[1].proc, None);
    }

    #[test]
    fn out_of_stack_capturing_local() {
        let mut interp = Interp::with_config(Config { color: false, ..Config::default() });
        let err = run(&mut interp, "(x y)").unwrap_err();
        assert!(err.message.contains("Out of stack"));
    }

    #[test]
    fn failing_native_does_not_leak_current_proc_into_later_statements() {
        // Each statement here is a separate top-level `eval`, as two REPL
        // lines would be, sharing one persistent top-level frame.
        let mut interp = Interp::with_config(Config { color: false, ..Config::default() });
        let err = run(&mut interp, "\"x\" 1 +").unwrap_err();
        assert_eq!(err.trace[0].proc.as_deref(), Some("+"));
        assert!(interp.frame().current_proc.is_none());

        // A later, unrelated failure must attribute to the top-level frame
        // ("unknown"), not to the previously failed native ("+").
        let err = run(&mut interp, "(a b c)").unwrap_err();
        assert_eq!(err.trace.last().unwrap().proc, None);
    }

    #[test]
    fn retain_keeps_refcount_balanced_across_push_pop() {
        let mut interp = Interp::with_config(Config { color: false, ..Config::default() });
        let v = new_int(42, 0);
        interp.stack.push(retain(&v));
        assert_eq!(Rc::strong_count(&v), 2);
        interp.stack.pop();
        assert_eq!(Rc::strong_count(&v), 1);
    }
}
