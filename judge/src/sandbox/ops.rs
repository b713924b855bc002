//! Host ops reachable from the bootstrap script
//!
//! The bootstrap captures these before it deletes `Deno`, so submitted code
//! can only reach them through `console.log` and the error report.

use deno_core::{op2, v8, OpState};

use super::capture::OutputBuffer;
use super::error::ScriptError;

/// Per-run state kept in the isolate's `OpState`
pub struct ScriptState {
    pub output: OutputBuffer,
    /// Set once the output buffer refused a line
    pub overflowed: bool,
    /// Failure reported by the bootstrap's catch handler
    pub failure: Option<ScriptError>,
    pub handle: v8::IsolateHandle,
}

impl ScriptState {
    pub fn new(max_output_bytes: usize, handle: v8::IsolateHandle) -> Self {
        Self {
            output: OutputBuffer::new(max_output_bytes),
            overflowed: false,
            failure: None,
            handle,
        }
    }
}

/// Append one rendered `console.log` line. A full buffer stops the script.
#[op2(fast)]
fn op_quest_log(state: &mut OpState, #[string] line: &str) {
    let script = state.borrow_mut::<ScriptState>();
    if script.overflowed {
        return;
    }
    if script.output.push_line(line).is_err() {
        script.overflowed = true;
        script.handle.terminate_execution();
    }
}

/// Record the exception that ended the script
#[op2(fast)]
fn op_quest_fail(
    state: &mut OpState,
    compile_error: bool,
    #[string] name: &str,
    #[string] message: &str,
) {
    let script = state.borrow_mut::<ScriptState>();
    script.failure = Some(if compile_error {
        ScriptError::Syntax(message.to_string())
    } else {
        ScriptError::Uncaught {
            name: name.to_string(),
            message: message.to_string(),
        }
    });
}

deno_core::extension!(quest_ext, ops = [op_quest_log, op_quest_fail]);
