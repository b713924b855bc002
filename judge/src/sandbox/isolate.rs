//! One V8 isolate per script
//!
//! The isolate lives and dies on the calling thread. A scoped watchdog thread
//! terminates it when the deadline passes or the cancel flag is raised, and a
//! near-heap-limit callback terminates it before V8 runs out of memory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::Context;
use deno_core::{v8, JsRuntime, PollEventLoopOptions, RuntimeOptions};

use super::config::SandboxConfig;
use super::error::ScriptError;
use super::ops::{quest_ext, ScriptState};

const BOOTSTRAP: &str = include_str!("bootstrap.js");

/// How often the watchdog looks at the cancel flag
const WATCH_INTERVAL: Duration = Duration::from_millis(10);

/// Heap room granted after the limit is hit so termination can unwind
const HEAP_GRACE_BYTES: usize = 1024 * 1024;

struct HeapLimitState {
    handle: v8::IsolateHandle,
    triggered: AtomicBool,
}

extern "C" fn near_heap_limit_callback(
    data: *mut std::ffi::c_void,
    current_heap_limit: usize,
    _initial_heap_limit: usize,
) -> usize {
    // SAFETY: `data` is the `HeapLimitState` boxed in `run_in_isolate`, which
    // drops the runtime before the box.
    let state = unsafe { &*(data as *const HeapLimitState) };
    if !state.triggered.swap(true, Ordering::SeqCst) {
        state.handle.terminate_execution();
    }
    current_heap_limit + HEAP_GRACE_BYTES
}

/// Terminate the isolate at `deadline`, or earlier if `cancel` is raised.
/// Returns quietly once `done` fires.
fn watch(
    handle: v8::IsolateHandle,
    deadline: Instant,
    cancel: &AtomicBool,
    timed_out: &AtomicBool,
    done: Receiver<()>,
) {
    loop {
        let now = Instant::now();
        if cancel.load(Ordering::Relaxed) || now >= deadline {
            timed_out.store(true, Ordering::SeqCst);
            handle.terminate_execution();
            return;
        }
        match done.recv_timeout((deadline - now).min(WATCH_INTERVAL)) {
            Err(RecvTimeoutError::Timeout) => continue,
            _ => return,
        }
    }
}

/// Run the bootstrap with `source` and drain pending promise jobs.
/// Returns the engine's description of an error the bootstrap did not catch.
async fn drive(runtime: &mut JsRuntime, script: String) -> Option<String> {
    if let Err(e) = runtime.execute_script("[quest:run]", script) {
        return Some(e.to_string());
    }
    runtime
        .run_event_loop(PollEventLoopOptions::default())
        .await
        .err()
        .map(|e| e.to_string())
}

/// First line of an engine error, without its stack trace
fn headline(description: &str) -> String {
    description.lines().next().unwrap_or_default().trim().to_string()
}

pub(super) fn run_in_isolate(
    source: &str,
    config: &SandboxConfig,
    cancel: &AtomicBool,
) -> anyhow::Result<Result<String, ScriptError>> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build isolate event loop")?;
    let _enter = rt.enter();

    let source_literal = serde_json::to_string(source).context("Failed to quote source")?;
    let script = format!("({})(Deno.core.ops, {});", BOOTSTRAP, source_literal);

    let create_params = v8::CreateParams::default().heap_limits(0, config.max_heap_bytes);
    let mut runtime = JsRuntime::new(RuntimeOptions {
        extensions: vec![quest_ext::init()],
        create_params: Some(create_params),
        ..Default::default()
    });

    let heap_state = Box::new(HeapLimitState {
        handle: runtime.v8_isolate().thread_safe_handle(),
        triggered: AtomicBool::new(false),
    });
    runtime.v8_isolate().add_near_heap_limit_callback(
        near_heap_limit_callback,
        &*heap_state as *const HeapLimitState as *mut std::ffi::c_void,
    );

    let op_handle = runtime.v8_isolate().thread_safe_handle();
    runtime
        .op_state()
        .borrow_mut()
        .put(ScriptState::new(config.max_output_bytes, op_handle));
    let handle = runtime.v8_isolate().thread_safe_handle();

    let timed_out = AtomicBool::new(false);
    let deadline = Instant::now() + Duration::from_millis(u64::from(config.time_limit_ms));
    let (done_tx, done_rx) = mpsc::channel();

    let engine_error = std::thread::scope(|scope| {
        let timed_out = &timed_out;
        scope.spawn(move || watch(handle, deadline, cancel, timed_out, done_rx));
        let engine_error = rt.block_on(drive(&mut runtime, script));
        let _ = done_tx.send(());
        engine_error
    });

    let state = runtime.op_state().borrow_mut().try_take::<ScriptState>();
    // The heap callback points into `heap_state`, so the isolate goes first
    drop(runtime);
    let heap_exhausted = heap_state.triggered.load(Ordering::SeqCst);
    drop(heap_state);
    let state = state.context("Script state missing after run")?;

    if state.overflowed {
        return Ok(Err(ScriptError::OutputLimit(config.max_output_bytes)));
    }
    if heap_exhausted {
        return Ok(Err(ScriptError::MemoryLimit));
    }
    if timed_out.load(Ordering::SeqCst) {
        return Ok(Err(ScriptError::Timeout(config.time_limit_ms)));
    }
    if let Some(failure) = state.failure {
        return Ok(Err(failure));
    }
    if let Some(description) = engine_error {
        return Ok(Err(ScriptError::Uncaught {
            name: "Uncaught".into(),
            message: headline(&description),
        }));
    }
    Ok(Ok(state.output.into_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headline_drops_the_stack() {
        assert_eq!(
            headline("Uncaught (in promise) Error: late\n    at <anonymous>:1:7"),
            "Uncaught (in promise) Error: late"
        );
        assert_eq!(headline(""), "");
    }
}
