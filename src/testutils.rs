//! Helpers for debugging and tests. Not public API.

use std::cell::Cell;

thread_local! {
    /// Buffer of state-transition traces logged internally.
    pub static OUTPUT: Cell<String> = Cell::default();
}

/// Record one trace line.
///
/// Traces go into a thread-local buffer instead of stdout: the buffer can be
/// dumped selectively from a failing test, and nothing is printed when all is
/// well. Compiled only under `debug_assertions`; release builds trace
/// nothing.
pub fn trace_log(msg: &str) {
    OUTPUT.with(|cell| {
        let mut buf = cell.take();
        buf.push_str(msg);
        buf.push('\n');

        if buf.len() > 20 * 1024 * 1024 {
            buf.clear();
            buf.push_str("[truncated output]\n");
        }

        cell.set(buf);
    });
}
