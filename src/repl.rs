//! Interactive read-eval-print loop.
//!
//! Each line is parsed as a standalone program (wrapped in a synthetic
//! list, same as a whole file) and evaluated against one persistent
//! [`Interp`], so `def`s and locals from earlier lines stay live.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::error::AoclaError;
use crate::interp::Interp;
use crate::parser::parse_program;
use crate::vm;

pub struct Repl {
    interp: Interp,
}

impl Repl {
    pub fn new(interp: Interp) -> Self {
        Repl { interp }
    }

    /// Run until EOF (Ctrl-D) or an interrupt (Ctrl-C).
    pub fn run(&mut self) -> rustyline::Result<()> {
        let mut editor = DefaultEditor::new()?;
        let history_path = self.interp.config.history_path.clone();
        if let Some(path) = &history_path {
            let _ = editor.load_history(path);
        }

        loop {
            match editor.readline(&self.interp.config.prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let _ = editor.add_history_entry(line.as_str());
                    self.eval_line(&line);
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e),
            }
        }

        if let Some(path) = &history_path {
            let _ = editor.save_history(path);
        }
        Ok(())
    }

    /// Parse and evaluate one line, printing a parse/eval error and
    /// continuing, or the bounded stack view on success.
    fn eval_line(&mut self, line: &str) {
        let program = match parse_program(line) {
            Ok(p) => p,
            Err(e) => {
                println!("{e}");
                return;
            }
        };
        match vm::eval(&mut self.interp, &program) {
            Ok(()) => println!("{}", self.interp.stack_show()),
            Err(e) => self.report(e),
        }
    }

    fn report(&self, e: AoclaError) {
        println!("{e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn eval_line_leaves_interp_usable_after_parse_error() {
        let interp = Interp::with_config(Config { color: false, ..Config::default() });
        let mut repl = Repl::new(interp);
        repl.eval_line("(ab)"); // invalid tuple, should not panic
        repl.eval_line("1 2 +");
        assert_eq!(repl.interp.stack.len(), 1);
    }

    #[test]
    fn eval_line_persists_defs_across_lines() {
        let interp = Interp::with_config(Config { color: false, ..Config::default() });
        let mut repl = Repl::new(interp);
        repl.eval_line("[1 +] 'inc def");
        repl.eval_line("5 inc");
        assert_eq!(repl.interp.stack.len(), 1);
    }
}
