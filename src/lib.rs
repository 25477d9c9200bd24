pub mod config;
pub mod error;
pub mod frame;
pub mod interp;
pub mod parser;
pub mod proc;
pub mod repl;
pub mod stdlib;
pub mod value;
pub mod vm;

pub use config::Config;
pub use error::{AoclaError, ParseError};
pub use frame::{Frame, Stack};
pub use interp::Interp;
pub use parser::{parse_program, Parser};
pub use proc::{NativeFn, Proc, ProcBody, ProcTable};
pub use repl::Repl;
pub use value::{structural_eq, ObjData, TypeMask, Value};
