//! The procedure table: name -> native operation or Aocla-defined list.
//!
//! Kept as a linearly-scanned `Vec`, not a `HashMap`: the spec explicitly
//! models this as an insertion-ordered linked list walked front to back on
//! lookup, a deliberate simplicity choice consistent with the "not
//! optimized for throughput" Non-goal. A `HashMap` would be faster but
//! would change nothing observable here except iteration order, which
//! nothing in this crate depends on — so there's no reason to diverge from
//! what the spec describes.

use std::rc::Rc;

use crate::error::AoclaError;
use crate::interp::Interp;
use crate::parser::parse_program;
use crate::value::{ObjData, Value};

pub type NativeFn = Rc<dyn Fn(&mut Interp) -> Result<(), AoclaError>>;

pub enum ProcBody {
    Native(NativeFn),
    /// Invariant: always a List value.
    Aocla(Value),
}

pub struct Proc {
    pub name: String,
    pub body: ProcBody,
}

#[derive(Default)]
pub struct ProcTable(Vec<Proc>);

impl ProcTable {
    pub fn new() -> Self {
        ProcTable(Vec::new())
    }

    pub fn lookup(&self, name: &str) -> Option<&Proc> {
        self.0.iter().find(|p| p.name == name)
    }

    /// Bind `name` to `body`, replacing any existing binding's contents in
    /// place (preserving position) or appending a new entry.
    pub fn add(&mut self, name: impl Into<String>, body: ProcBody) {
        let name = name.into();
        if let Some(existing) = self.0.iter_mut().find(|p| p.name == name) {
            log::debug!("redefining procedure {name}");
            existing.body = body;
        } else {
            log::debug!("defining procedure {name}");
            self.0.push(Proc { name, body });
        }
    }

    pub fn add_native(&mut self, name: &str, f: impl Fn(&mut Interp) -> Result<(), AoclaError> + 'static) {
        self.add(name, ProcBody::Native(Rc::new(f)));
    }

    /// Parse `source` as a single value and, if it is a List, bind it to
    /// `name`. Fails if the source doesn't parse or isn't a List.
    pub fn add_from_text(&mut self, name: &str, source: &str) -> Result<(), AoclaError> {
        let program = parse_program(source)?;
        // parse_program always wraps in an outer List of top-level values;
        // bootstrap definitions are themselves a single list literal, so
        // unwrap that outer wrapping to get at the literal itself.
        let inner = match &program.data {
            ObjData::List(elems) if elems.len() == 1 => elems[0].clone(),
            _ => return Err(AoclaError::new("Procedure body must be a single list")),
        };
        if !matches!(inner.data, ObjData::List(_)) {
            return Err(AoclaError::new("Procedure body must be a list"));
        }
        self.add(name, ProcBody::Aocla(inner));
        Ok(())
    }
}
