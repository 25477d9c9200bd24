//! The interpreter context: the one piece of process-scoped state, owned by
//! exactly one caller. Holds the operand stack, the procedure table, the
//! frame stack, and the ambient configuration. Tests routinely construct
//! several independent `Interp`s side by side.

use crate::config::Config;
use crate::frame::{Frame, Stack};
use crate::proc::ProcTable;
use crate::value::{self, Value};

pub struct Interp {
    pub stack: Stack,
    pub procs: ProcTable,
    pub frames: Vec<Frame>,
    pub config: Config,
}

impl Interp {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut interp = Interp { stack: Stack::new(), procs: ProcTable::new(), frames: vec![Frame::new()], config };
        crate::stdlib::install(&mut interp);
        interp
    }

    /// The currently executing frame (always present: the top-level frame
    /// is never popped).
    pub fn frame(&self) -> &Frame {
        self.frames.last().expect("frame stack is never empty")
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack is never empty")
    }

    /// The frame one level up from current, for `upeval`. `None` at the
    /// top level, in which case `upeval` behaves like `eval`.
    pub fn parent_frame_mut(&mut self) -> Option<&mut Frame> {
        let len = self.frames.len();
        if len < 2 {
            None
        } else {
            Some(&mut self.frames[len - 2])
        }
    }

    pub fn name_of_current_proc(&self) -> Option<String> {
        self.frame().current_proc.clone()
    }

    /// Render the top of the operand stack, bounded to the last 10
    /// elements, most-recent last, space separated, with a
    /// "[... N more object ...]" prefix when more are present.
    pub fn stack_show(&self) -> String {
        const MAX: usize = 10;
        let len = self.stack.len();
        let start = len.saturating_sub(MAX);
        let mut out = String::new();
        if len > MAX {
            out.push_str(&format!("[... {} more object ...] ", len - MAX));
        }
        let mut first = true;
        for v in self.stack.iter().skip(start) {
            if !first {
                out.push(' ');
            }
            first = false;
            out.push_str(&value::to_string(v, true, self.config.color));
        }
        out
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::new_int;

    #[test]
    fn starts_with_one_top_level_frame() {
        let interp = Interp::new();
        assert_eq!(interp.frames.len(), 1);
        assert!(interp.frame().current_proc.is_none());
    }

    #[test]
    fn stack_show_bounds_to_ten() {
        let mut interp = Interp::new();
        for i in 0..15 {
            interp.stack.push(new_int(i, 0));
        }
        let s = interp.stack_show();
        assert!(s.starts_with("[... 5 more object ...] "));
    }
}
