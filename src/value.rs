//! The Aocla value type.
//!
//! Aocla has six value variants, all sharing a single reference-counted
//! representation. Code and data share the List variant: a program is just
//! a list of values that the evaluator happens to walk left to right.
//!
//! Sharing is `Rc`, not a hand-rolled refcount: `Rc::clone` is `retain`,
//! dropping a handle is `release`, and because nested values are themselves
//! `Rc<Obj>`, releasing the last handle to a List recursively releases its
//! children for free via `Rc`'s own drop glue. The value graph is acyclic by
//! construction (there is no way to make a value contain itself), so `Rc`
//! alone is sufficient.

use std::cmp::Ordering;
use std::rc::Rc;

use bitflags::bitflags;

bitflags! {
    /// Bitmask of value variants, used by `check_stack_type`'s type guard.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TypeMask: u8 {
        const INT    = 0b0000_0001;
        const BOOL   = 0b0000_0010;
        const STRING = 0b0000_0100;
        const SYMBOL = 0b0000_1000;
        const LIST   = 0b0001_0000;
        const TUPLE  = 0b0010_0000;
        const ANY    = Self::INT.bits() | Self::BOOL.bits() | Self::STRING.bits()
            | Self::SYMBOL.bits() | Self::LIST.bits() | Self::TUPLE.bits();
    }
}

/// The data carried by an `Obj`, one variant per Aocla type.
#[derive(Debug)]
pub enum ObjData {
    Int(i64),
    Bool(bool),
    /// A mutable byte string.
    String(Vec<u8>),
    Symbol { name: Vec<u8>, quoted: bool },
    List(Vec<Value>),
    /// Invariant: every element is a Symbol of byte length 1.
    Tuple { elems: Vec<Value>, quoted: bool },
}

/// A parsed or synthesized Aocla object. Always lives behind an `Rc`.
#[derive(Debug)]
pub struct Obj {
    /// Source line the value began on, or 0 for synthesized values.
    pub line: u32,
    pub data: ObjData,
}

/// A handle to an Aocla value. Cloning is `retain`; dropping is `release`.
pub type Value = Rc<Obj>;

impl Obj {
    pub fn type_mask(&self) -> TypeMask {
        match &self.data {
            ObjData::Int(_) => TypeMask::INT,
            ObjData::Bool(_) => TypeMask::BOOL,
            ObjData::String(_) => TypeMask::STRING,
            ObjData::Symbol { .. } => TypeMask::SYMBOL,
            ObjData::List(_) => TypeMask::LIST,
            ObjData::Tuple { .. } => TypeMask::TUPLE,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match &self.data {
            ObjData::Int(_) => "int",
            ObjData::Bool(_) => "bool",
            ObjData::String(_) => "string",
            ObjData::Symbol { .. } => "symbol",
            ObjData::List(_) => "list",
            ObjData::Tuple { .. } => "tuple",
        }
    }
}

/// Free functions rather than inherent methods on `Value` (a type alias for
/// `Rc<Obj>`, so we can't add inherent impls to it) — grouped here under
/// `obj::` so call sites read `obj::new_int(1, line)`.
pub fn new_int(i: i64, line: u32) -> Value {
    Rc::new(Obj { line, data: ObjData::Int(i) })
}

pub fn new_bool(b: bool, line: u32) -> Value {
    Rc::new(Obj { line, data: ObjData::Bool(b) })
}

pub fn new_string(bytes: Vec<u8>, line: u32) -> Value {
    Rc::new(Obj { line, data: ObjData::String(bytes) })
}

pub fn new_symbol(name: Vec<u8>, quoted: bool, line: u32) -> Value {
    Rc::new(Obj { line, data: ObjData::Symbol { name, quoted } })
}

pub fn new_list(elems: Vec<Value>, line: u32) -> Value {
    Rc::new(Obj { line, data: ObjData::List(elems) })
}

pub fn new_tuple(elems: Vec<Value>, quoted: bool, line: u32) -> Value {
    Rc::new(Obj { line, data: ObjData::Tuple { elems, quoted } })
}

/// Retain: share ownership of a value. Equivalent to `Rc::clone`.
pub fn retain(v: &Value) -> Value {
    Rc::clone(v)
}

/// Recursively copy `v` into a fresh, disjoint, refcount-1 tree. Preserves
/// `quoted` flags and line numbers. Unlike `Obj`'s absence of a `Clone`
/// impl, this walks all the way down instead of stopping at the first level
/// of `Rc` handles.
pub fn deep_copy(v: &Value) -> Value {
    let data = match &v.data {
        ObjData::Int(i) => ObjData::Int(*i),
        ObjData::Bool(b) => ObjData::Bool(*b),
        ObjData::String(s) => ObjData::String(s.clone()),
        ObjData::Symbol { name, quoted } => ObjData::Symbol { name: name.clone(), quoted: *quoted },
        ObjData::List(elems) => ObjData::List(elems.iter().map(deep_copy).collect()),
        ObjData::Tuple { elems, quoted } => {
            ObjData::Tuple { elems: elems.iter().map(deep_copy).collect(), quoted: *quoted }
        }
    };
    Rc::new(Obj { line: v.line, data })
}

/// Obtain a value guaranteed to have strong count 1, deep-copying only if
/// the passed-in handle is actually shared. The precondition for any
/// in-place mutation (`sort`, `->`, `<-`).
pub fn unshared(v: Value) -> Value {
    if Rc::strong_count(&v) > 1 {
        deep_copy(&v)
    } else {
        v
    }
}

/// Returns a mutable reference into `v`'s data, which must already be
/// unshared (`Rc::strong_count(v) == 1`) — typically obtained via
/// [`unshared`] just before calling this.
pub fn data_mut(v: &mut Value) -> &mut ObjData {
    &mut Rc::get_mut(v).expect("value must be unshared before mutation").data
}

/// Compare two values per the spec's ordering rules. `None` means the pair
/// is of mismatched, incomparable types.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    use ObjData::*;
    match (&a.data, &b.data) {
        (Int(x), Int(y)) => Some(x.cmp(y)),
        (Bool(x), Bool(y)) => Some(x.cmp(y)),
        (String(x), Symbol { name: y, .. }) | (Symbol { name: x, .. }, String(y)) => Some(x.cmp(y)),
        (String(x), String(y)) => Some(x.cmp(y)),
        (Symbol { name: x, .. }, Symbol { name: y, .. }) => Some(x.cmp(y)),
        (List(x), List(y)) | (Tuple { elems: x, .. }, Tuple { elems: y, .. })
        | (List(x), Tuple { elems: y, .. }) | (Tuple { elems: x, .. }, List(y)) => {
            // Length wins. This is specified behavior, not a placeholder:
            // equal-length lists compare equal regardless of contents.
            Some(x.len().cmp(&y.len()))
        }
        _ => None,
    }
}

const REPR_COLOR_RESET: &str = "\x1b[0m";

fn color_escape(data: &ObjData) -> &'static str {
    match data {
        ObjData::List(_) => "\x1b[33;1m",           // yellow
        ObjData::Tuple { .. } => "\x1b[34;1m",       // blue
        ObjData::Symbol { .. } => "\x1b[36;1m",      // cyan
        ObjData::String(_) => "\x1b[32;1m",          // green
        ObjData::Int(_) | ObjData::Bool(_) => "\x1b[37;1m", // gray
    }
}

/// Render `v` into `out`. `repr` selects literal, re-parseable syntax over
/// the raw form `print`/`printnl` use; `color` wraps the result in the
/// per-variant ANSI escape the original interpreter uses for its REPL.
pub fn format_value(v: &Value, out: &mut String, repr: bool, color: bool) {
    if color {
        out.push_str(color_escape(&v.data));
    }
    match &v.data {
        ObjData::Int(i) => out.push_str(&i.to_string()),
        ObjData::Bool(b) => out.push_str(if *b { "#t" } else { "#f" }),
        ObjData::String(s) => {
            if repr {
                out.push('"');
                for &b in s {
                    match b {
                        b'"' => out.push_str("\\\""),
                        b'\\' => out.push_str("\\\\"),
                        b'\n' => out.push_str("\\n"),
                        b'\r' => out.push_str("\\r"),
                        b'\t' => out.push_str("\\t"),
                        _ => out.push(b as char),
                    }
                }
                out.push('"');
            } else {
                out.push_str(&String::from_utf8_lossy(s));
            }
        }
        ObjData::Symbol { name, quoted } => {
            if repr && *quoted {
                out.push('\'');
            }
            out.push_str(&String::from_utf8_lossy(name));
        }
        ObjData::List(elems) => {
            out.push('[');
            for (i, e) in elems.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                format_value(e, out, repr, color);
            }
            out.push(']');
        }
        ObjData::Tuple { elems, quoted } => {
            if repr && *quoted {
                out.push('\'');
            }
            out.push('(');
            for (i, e) in elems.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                format_value(e, out, repr, color);
            }
            out.push(')');
        }
    }
    if color {
        out.push_str(REPR_COLOR_RESET);
    }
}

pub fn to_string(v: &Value, repr: bool, color: bool) -> String {
    let mut s = String::new();
    format_value(v, &mut s, repr, color);
    s
}

/// Deep-copy `v` (a quoted Symbol or Tuple) and clear its `quoted` flag,
/// producing the data literal that evaluating a quoted form pushes.
pub fn unquote_copy(v: &Value) -> Value {
    let mut copy = deep_copy(v);
    match data_mut(&mut copy) {
        ObjData::Symbol { quoted, .. } => *quoted = false,
        ObjData::Tuple { quoted, .. } => *quoted = false,
        _ => {}
    }
    copy
}

/// Structural equality ignoring `line`. Used by the round-trip property
/// test: parsing a value's repr must yield something structurally
/// identical, though not the same `Rc` nor necessarily the same line.
pub fn structural_eq(a: &Value, b: &Value) -> bool {
    match (&a.data, &b.data) {
        (ObjData::Int(x), ObjData::Int(y)) => x == y,
        (ObjData::Bool(x), ObjData::Bool(y)) => x == y,
        (ObjData::String(x), ObjData::String(y)) => x == y,
        (ObjData::Symbol { name: x, quoted: qx }, ObjData::Symbol { name: y, quoted: qy }) => x == y && qx == qy,
        (ObjData::List(x), ObjData::List(y)) => x.len() == y.len() && x.iter().zip(y).all(|(a, b)| structural_eq(a, b)),
        (ObjData::Tuple { elems: x, quoted: qx }, ObjData::Tuple { elems: y, quoted: qy }) => {
            qx == qy && x.len() == y.len() && x.iter().zip(y).all(|(a, b)| structural_eq(a, b))
        }
        _ => false,
    }
}

/// Element count (Lists/Tuples) or byte length (Strings/Symbols). Used by
/// the `len` builtin and by tuple-capture's arity check.
pub fn len_of(v: &Value) -> usize {
    match &v.data {
        ObjData::List(e) => e.len(),
        ObjData::Tuple { elems, .. } => elems.len(),
        ObjData::String(s) => s.len(),
        ObjData::Symbol { name, .. } => name.len(),
        ObjData::Int(_) | ObjData::Bool(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retain_increments_strong_count() {
        let v = new_int(5, 0);
        assert_eq!(Rc::strong_count(&v), 1);
        let v2 = retain(&v);
        assert_eq!(Rc::strong_count(&v), 2);
        drop(v2);
        assert_eq!(Rc::strong_count(&v), 1);
    }

    #[test]
    fn deep_copy_is_disjoint() {
        let inner = new_int(1, 0);
        let list = new_list(vec![retain(&inner)], 0);
        let copy = deep_copy(&list);
        assert_eq!(Rc::strong_count(&inner), 2); // list's handle + our own
        if let ObjData::List(elems) = &copy.data {
            assert_eq!(Rc::strong_count(&elems[0]), 1);
        } else {
            panic!("expected list");
        }
    }

    #[test]
    fn unshared_mutates_in_place_when_alone() {
        let mut v = new_list(vec![new_int(1, 0)], 0);
        let ptr_before = Rc::as_ptr(&v);
        v = unshared(v);
        assert_eq!(Rc::as_ptr(&v), ptr_before);
    }

    #[test]
    fn unshared_copies_when_shared() {
        let v = new_list(vec![new_int(1, 0)], 0);
        let shared = retain(&v);
        let ptr_before = Rc::as_ptr(&v);
        let v = unshared(v);
        assert_ne!(Rc::as_ptr(&v), ptr_before);
        drop(shared);
    }

    #[test]
    fn compare_lists_is_length_only() {
        let a = new_list(vec![new_int(1, 0)], 0);
        let b = new_list(vec![new_int(999, 0)], 0);
        assert_eq!(compare(&a, &b), Some(Ordering::Equal));
        let c = new_list(vec![new_int(1, 0), new_int(2, 0)], 0);
        assert_eq!(compare(&a, &c), Some(Ordering::Less));
    }

    #[test]
    fn compare_mismatched_types() {
        let a = new_int(1, 0);
        let b = new_bool(true, 0);
        assert_eq!(compare(&a, &b), None);
    }

    #[test]
    fn format_repr_round_trips_strings() {
        let v = new_string(b"a\nb\"c".to_vec(), 0);
        let s = to_string(&v, true, false);
        assert_eq!(s, "\"a\\nb\\\"c\"");
    }
}
