//! End-to-end scenarios run through the public API exactly as a REPL line
//! or file would be: parse, evaluate, inspect the resulting stack.

use std::rc::Rc;

use aocla::{parse_program, vm, Config, Interp, ObjData};

fn run(src: &str) -> Interp {
    let mut interp = Interp::with_config(Config { color: false, ..Config::default() });
    let program = parse_program(src).expect("parses");
    vm::eval(&mut interp, &program).expect("evaluates");
    interp
}

fn try_run(src: &str) -> Result<Interp, aocla::AoclaError> {
    let mut interp = Interp::with_config(Config { color: false, ..Config::default() });
    let program = parse_program(src).expect("parses");
    vm::eval(&mut interp, &program)?;
    Ok(interp)
}

fn top_int(interp: &Interp) -> i64 {
    match interp.stack.peek(0).unwrap().data {
        ObjData::Int(i) => i,
        ref other => panic!("expected int, got {other:?}"),
    }
}

#[test]
fn scenario_1_arithmetic_popping_order() {
    let interp = run("3 2 -");
    assert_eq!(top_int(&interp), -1);
}

#[test]
fn scenario_2_map_squares() {
    let interp = run("[1 2 3] [dup *] map");
    match &interp.stack.peek(0).unwrap().data {
        ObjData::List(elems) => {
            let nums: Vec<i64> = elems.iter().map(|e| match e.data { ObjData::Int(i) => i, _ => panic!() }).collect();
            assert_eq!(nums, vec![1, 4, 9]);
        }
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn scenario_3_tuple_capture_and_local_reuse() {
    let interp = run("5 (x) $x $x +");
    assert_eq!(top_int(&interp), 10);
}

#[test]
fn scenario_4_string_len() {
    let interp = run("\"hello\" len");
    assert_eq!(top_int(&interp), 5);
}

#[test]
fn scenario_5_get_at_bounds() {
    assert_eq!(top_int(&run("[1 2 3] 0 get@")), 1);
    assert_eq!(top_int(&run("[1 2 3] -1 get@")), 3);
    let interp = run("[1 2 3] 9 get@");
    assert!(matches!(interp.stack.peek(0).unwrap().data, ObjData::Bool(false)));
}

#[test]
fn scenario_6_ifelse_both_branches() {
    assert_eq!(top_int(&run("#t [1] [2] ifelse")), 1);
    assert_eq!(top_int(&run("#f [1] [2] ifelse")), 2);
}

#[test]
fn scenario_7_empty_stack_tuple_capture_fails() {
    let err = try_run("[[1] (a b c) def] eval a").unwrap_err();
    assert!(err.message.contains("Out of stack while capturing local"));
}

#[test]
fn refcount_drops_to_zero_when_interp_is_dropped() {
    let mut interp = Interp::with_config(Config { color: false, ..Config::default() });
    let program = parse_program("[1 2 3] dup").unwrap();
    vm::eval(&mut interp, &program).unwrap();
    let top = aocla::value::retain(interp.stack.peek(0).unwrap());
    assert_eq!(Rc::strong_count(&top), 2); // one on the stack, one held here
    drop(interp);
    assert_eq!(Rc::strong_count(&top), 1);
}

#[test]
fn dup_drop_swap_preserve_depth_invariants() {
    let interp = run("1 2 3 dup");
    assert_eq!(interp.stack.len(), 4);
    let interp = run("1 2 3 drop");
    assert_eq!(interp.stack.len(), 2);
    let interp = run("1 2 swap");
    assert_eq!(interp.stack.len(), 2);
    assert_eq!(top_int(&interp), 1);
}

#[test]
fn def_then_call_persists_across_statements() {
    let interp = run("[(x) $x $x *] 'square def 6 square");
    assert_eq!(top_int(&interp), 36);
}

#[test]
fn rest_and_first_on_lists() {
    let interp = run("[1 2 3] rest");
    match &interp.stack.peek(0).unwrap().data {
        ObjData::List(elems) => assert_eq!(elems.len(), 2),
        other => panic!("expected list, got {other:?}"),
    }
    let interp = run("[1 2 3] first");
    assert_eq!(top_int(&interp), 1);
}
