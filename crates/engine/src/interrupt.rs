// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide stack of interrupt listeners.
//!
//! Reacting to interrupt-like signals (SIGINT, SIGHUP, SIGTERM) happens
//! through a global stack of listeners: when a signal is received, the
//! listener at the top of the stack runs on a dedicated background thread
//! with the signal number, never in the actual signal handler. Dropping
//! the handle returned from [`push_interrupt_listener`] pops the listener,
//! re-enabling the previous one; the drop blocks while the listener is
//! executing. Popping from inside the running listener deadlocks and is
//! therefore forbidden. Blocking code in a listener is otherwise fine.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{debug, warn};

type Listener = Arc<Mutex<Box<dyn FnMut(i32) + Send>>>;

#[derive(Debug, Error)]
pub enum InterruptError {
    #[error("failed to install signal handlers: {0}")]
    Install(#[source] std::io::Error),
}

#[derive(Default)]
struct Registry {
    /// Stack slots; popped entries become `None` so indices stay stable.
    listeners: Mutex<Vec<Option<Listener>>>,
    /// Held while a listener executes. Push and pop both take it, so a pop
    /// of the currently-running listener blocks until it returns.
    exec: Mutex<()>,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::default)
}

fn ensure_listener_thread() -> Result<(), InterruptError> {
    static STARTED: OnceLock<Result<(), String>> = OnceLock::new();
    let started = STARTED.get_or_init(|| {
        let mut signals =
            Signals::new([SIGINT, SIGHUP, SIGTERM]).map_err(|e| e.to_string())?;
        std::thread::Builder::new()
            .name("interrupt-listener".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    dispatch(signal);
                }
            })
            .map_err(|e| e.to_string())?;
        Ok(())
    });
    started.clone().map_err(|message| {
        InterruptError::Install(std::io::Error::other(message))
    })
}

fn dispatch(signal: i32) {
    let reg = registry();
    let _running = reg.exec.lock();
    let top = reg.listeners.lock().iter().rev().flatten().next().cloned();
    match top {
        Some(listener) => {
            debug!(signal, "dispatching signal to interrupt listener");
            let mut listener = listener.lock();
            (*listener)(signal);
        }
        None => {
            // No listener installed: default behavior is to die like an
            // interrupted foreground process would.
            warn!(signal, "interrupt received with no listener, exiting");
            std::process::exit(128 + signal);
        }
    }
}

/// Install `listener` at the top of the stack. The returned handle pops it
/// when dropped.
pub fn push_interrupt_listener(
    listener: impl FnMut(i32) + Send + 'static,
) -> Result<InterruptListenerHandle, InterruptError> {
    ensure_listener_thread()?;
    let reg = registry();
    let _serialized = reg.exec.lock();
    let mut listeners = reg.listeners.lock();
    listeners.push(Some(Arc::new(Mutex::new(Box::new(listener)))));
    Ok(InterruptListenerHandle { index: listeners.len() - 1 })
}

/// Pops its listener from the stack on drop.
pub struct InterruptListenerHandle {
    index: usize,
}

impl Drop for InterruptListenerHandle {
    fn drop(&mut self) {
        let reg = registry();
        // Wait for a running listener to finish before disabling.
        let _serialized = reg.exec.lock();
        let mut listeners = reg.listeners.lock();
        if let Some(slot) = listeners.get_mut(self.index) {
            *slot = None;
        }
        while matches!(listeners.last(), Some(None)) {
            listeners.pop();
        }
    }
}

#[cfg(test)]
#[path = "interrupt_tests.rs"]
mod tests;
