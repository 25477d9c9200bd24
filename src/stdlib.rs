//! The built-in library: native operations registered at interpreter
//! construction, followed by a handful of bootstrap definitions written in
//! Aocla itself and loaded through the same `addFromText` path a user's
//! `def` would use.

use crate::error::AoclaError;
use crate::interp::Interp;
use crate::value::{self, ObjData, TypeMask, Value};
use crate::vm;

/// Fail "Out of stack" unless at least `min` operands are available.
fn check_stack_len(interp: &Interp, min: usize) -> Result<(), AoclaError> {
    if interp.stack.len() < min {
        Err(AoclaError::with_context("Out of stack", interp.name_of_current_proc().unwrap_or_default()))
    } else {
        Ok(())
    }
}

/// Check the top `masks.len()` stack positions (`masks[0]` is the top)
/// against the corresponding type mask. Assumes `check_stack_len` already
/// ran for at least `masks.len()` operands.
fn check_stack_type(interp: &Interp, masks: &[TypeMask]) -> Result<(), AoclaError> {
    for (offset, mask) in masks.iter().enumerate() {
        let v = interp.stack.peek(offset).expect("check_stack_len ran first");
        if !mask.contains(v.type_mask()) {
            return Err(AoclaError::with_context(
                "Type mismatch",
                format!("{} where {:?} expected", v.type_name(), mask),
            ));
        }
    }
    Ok(())
}

fn pop_int(interp: &mut Interp) -> i64 {
    match interp.stack.pop().expect("checked by caller").data {
        ObjData::Int(i) => i,
        _ => unreachable!("checked by caller"),
    }
}

/// `+ - * /`. Dispatched by the currently-executing procedure's own name,
/// per the spec: one native body serves all four arithmetic operators.
/// Popping order: top is `a`, next is `b`; result is `a OP b` — so
/// `[3 2 -]` computes `2 - 3 = -1`.
fn arith(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 2)?;
    check_stack_type(interp, &[TypeMask::INT, TypeMask::INT])?;
    let a = pop_int(interp);
    let b = pop_int(interp);
    let op = interp.name_of_current_proc().unwrap_or_default();
    let result = match op.as_str() {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => a / b,
        _ => unreachable!("arith is only ever bound to + - * /"),
    };
    let line = interp.frame().current_line;
    interp.stack.push(value::new_int(result, line));
    Ok(())
}

/// `== != > < >= <=`. Pops `b` (top) then `a`; on type mismatch both
/// operands are pushed back before the error propagates.
fn compare_op(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 2)?;
    let b = interp.stack.pop().expect("checked above");
    let a = interp.stack.pop().expect("checked above");
    let op = interp.name_of_current_proc().unwrap_or_default();
    match value::compare(&a, &b) {
        Some(ord) => {
            use std::cmp::Ordering::*;
            let result = match op.as_str() {
                "==" => ord == Equal,
                "!=" => ord != Equal,
                ">" => ord == Greater,
                "<" => ord == Less,
                ">=" => ord != Less,
                "<=" => ord != Greater,
                _ => unreachable!("compare_op is only ever bound to the comparison operators"),
            };
            let line = interp.frame().current_line;
            interp.stack.push(value::new_bool(result, line));
            Ok(())
        }
        None => {
            interp.stack.push(a);
            interp.stack.push(b);
            Err(AoclaError::new("Type mismatch in comparison"))
        }
    }
}

fn sort(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 1)?;
    check_stack_type(interp, &[TypeMask::LIST])?;
    let v = interp.stack.pop().expect("checked above");
    let mut v = value::unshared(v);
    if let ObjData::List(elems) = value::data_mut(&mut v) {
        elems.sort_by(|a, b| value::compare(a, b).unwrap_or(std::cmp::Ordering::Equal));
    }
    interp.stack.push(v);
    Ok(())
}

fn def(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 2)?;
    check_stack_type(interp, &[TypeMask::SYMBOL, TypeMask::LIST])?;
    let name = interp.stack.pop().expect("checked above");
    let list = interp.stack.pop().expect("checked above");
    let name = match &name.data {
        ObjData::Symbol { name, .. } => String::from_utf8_lossy(name).into_owned(),
        _ => unreachable!("checked above"),
    };
    interp.procs.add(name, crate::proc::ProcBody::Aocla(list));
    Ok(())
}

/// Evaluate `cond`, then pop and consume the single Bool it must leave on
/// top, shared by `if`, `ifelse` and `while`.
fn eval_cond(interp: &mut Interp, cond: &Value) -> Result<bool, AoclaError> {
    vm::eval(interp, cond)?;
    check_stack_len(interp, 1)?;
    check_stack_type(interp, &[TypeMask::BOOL])?;
    match interp.stack.pop().expect("checked above").data {
        ObjData::Bool(b) => Ok(b),
        _ => unreachable!("checked above"),
    }
}

fn if_(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 2)?;
    check_stack_type(interp, &[TypeMask::LIST, TypeMask::LIST])?;
    let then_list = interp.stack.pop().expect("checked above");
    let cond = interp.stack.pop().expect("checked above");
    if eval_cond(interp, &cond)? {
        vm::eval(interp, &then_list)?;
    }
    Ok(())
}

fn ifelse(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 3)?;
    check_stack_type(interp, &[TypeMask::LIST, TypeMask::LIST, TypeMask::LIST])?;
    let else_list = interp.stack.pop().expect("checked above");
    let then_list = interp.stack.pop().expect("checked above");
    let cond = interp.stack.pop().expect("checked above");
    if eval_cond(interp, &cond)? {
        vm::eval(interp, &then_list)?;
    } else {
        vm::eval(interp, &else_list)?;
    }
    Ok(())
}

fn while_(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 2)?;
    check_stack_type(interp, &[TypeMask::LIST, TypeMask::LIST])?;
    let body = interp.stack.pop().expect("checked above");
    let cond = interp.stack.pop().expect("checked above");
    while eval_cond(interp, &cond)? {
        vm::eval(interp, &body)?;
    }
    Ok(())
}

fn eval_builtin(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 1)?;
    check_stack_type(interp, &[TypeMask::LIST])?;
    let list = interp.stack.pop().expect("checked above");
    vm::eval(interp, &list)
}

fn upeval_builtin(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 1)?;
    check_stack_type(interp, &[TypeMask::LIST])?;
    let list = interp.stack.pop().expect("checked above");
    vm::upeval(interp, &list)
}

fn print_(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 1)?;
    let v = interp.stack.pop().expect("checked above");
    print!("{}", value::to_string(&v, false, false));
    Ok(())
}

fn printnl(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 1)?;
    let v = interp.stack.pop().expect("checked above");
    println!("{}", value::to_string(&v, false, false));
    Ok(())
}

fn len(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 1)?;
    check_stack_type(interp, &[TypeMask::LIST | TypeMask::TUPLE | TypeMask::STRING | TypeMask::SYMBOL])?;
    let v = interp.stack.pop().expect("checked above");
    let n = value::len_of(&v) as i64;
    let line = interp.frame().current_line;
    interp.stack.push(value::new_int(n, line));
    Ok(())
}

/// `->` appends, `<-` prepends; dispatched by the procedure's own name,
/// same trick as `arith`.
fn append_or_prepend(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 2)?;
    check_stack_type(interp, &[TypeMask::LIST, TypeMask::ANY])?;
    let list = interp.stack.pop().expect("checked above");
    let x = interp.stack.pop().expect("checked above");
    let op = interp.name_of_current_proc().unwrap_or_default();
    let mut list = value::unshared(list);
    if let ObjData::List(elems) = value::data_mut(&mut list) {
        match op.as_str() {
            "->" => elems.push(x),
            "<-" => elems.insert(0, x),
            _ => unreachable!("append_or_prepend is only ever bound to -> and <-"),
        }
    }
    interp.stack.push(list);
    Ok(())
}

fn get_at(interp: &mut Interp) -> Result<(), AoclaError> {
    check_stack_len(interp, 2)?;
    check_stack_type(interp, &[TypeMask::INT, TypeMask::LIST | TypeMask::TUPLE | TypeMask::STRING])?;
    let idx = interp.stack.pop().expect("checked above");
    let collection = interp.stack.pop().expect("checked above");
    let idx = match idx.data {
        ObjData::Int(i) => i,
        _ => unreachable!("checked above"),
    };
    let line = interp.frame().current_line;
    let result = match &collection.data {
        ObjData::List(elems) => resolve_index(idx, elems.len()).map(|i| value::retain(&elems[i])),
        ObjData::Tuple { elems, .. } => resolve_index(idx, elems.len()).map(|i| value::retain(&elems[i])),
        ObjData::String(bytes) => resolve_index(idx, bytes.len()).map(|i| value::new_string(vec![bytes[i]], line)),
        _ => unreachable!("checked above"),
    };
    interp.stack.push(result.unwrap_or_else(|| value::new_bool(false, line)));
    Ok(())
}

fn resolve_index(idx: i64, len: usize) -> Option<usize> {
    let resolved = if idx < 0 { len as i64 + idx } else { idx };
    if resolved < 0 || resolved as usize >= len {
        None
    } else {
        Some(resolved as usize)
    }
}

fn showstack(interp: &mut Interp) -> Result<(), AoclaError> {
    println!("{}", interp.stack_show());
    Ok(())
}

/// Aocla-level bootstrap definitions, loaded after every native is
/// registered so they can call straight into them.
const BOOTSTRAP: &[(&str, &str)] = &[
    ("dup", "[(x) $x $x]"),
    ("swap", "[(x y) $y $x]"),
    ("drop", "[(_)]"),
    ("map", "[(l f) $l len (e) 0 (j) [] [$j $e <] [ $l $j get@ $f upeval swap -> $j 1 + (j)] while]"),
    ("foreach", "[(l f) $l len (e) 0 (j) [$j $e <] [$l $j get@ $f upeval $j 1 + (j)] while]"),
    ("first", "[0 get@]"),
    ("rest", "[#t (f) [] (n) [[$f] [#f (f) drop] [$n -> (n)] ifelse] foreach $n]"),
    ("cat", "[(a b) $b [$a -> (a)] foreach $a]"),
];

pub fn install(interp: &mut Interp) {
    interp.procs.add_native("+", arith);
    interp.procs.add_native("-", arith);
    interp.procs.add_native("*", arith);
    interp.procs.add_native("/", arith);
    interp.procs.add_native("==", compare_op);
    interp.procs.add_native("!=", compare_op);
    interp.procs.add_native(">", compare_op);
    interp.procs.add_native("<", compare_op);
    interp.procs.add_native(">=", compare_op);
    interp.procs.add_native("<=", compare_op);
    interp.procs.add_native("sort", sort);
    interp.procs.add_native("def", def);
    interp.procs.add_native("if", if_);
    interp.procs.add_native("ifelse", ifelse);
    interp.procs.add_native("while", while_);
    interp.procs.add_native("eval", eval_builtin);
    interp.procs.add_native("upeval", upeval_builtin);
    interp.procs.add_native("print", print_);
    interp.procs.add_native("printnl", printnl);
    interp.procs.add_native("len", len);
    interp.procs.add_native("->", append_or_prepend);
    interp.procs.add_native("<-", append_or_prepend);
    interp.procs.add_native("get@", get_at);
    interp.procs.add_native("showstack", showstack);

    for (name, source) in BOOTSTRAP {
        interp.procs.add_from_text(name, source).expect("bootstrap source is well-formed by construction");
    }
}
