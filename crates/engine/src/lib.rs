// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cvd-engine: subprocess supervision and interrupt handling
//!
//! Helper binaries run as children in their own process group so that
//! signals sent by the supervisor never escape to the rest of the session.
//! Interrupt-like signals are serviced by a dedicated listener thread fed
//! from the signal handler; no user code runs in signal context.

pub mod instance_lock;
pub mod interrupt;
pub mod reset;
pub mod supervisor;

pub use instance_lock::{InstanceLock, InstanceLockManager, LockError};
pub use interrupt::{push_interrupt_listener, InterruptError, InterruptListenerHandle};
pub use reset::forcefully_stop_instance;
pub use supervisor::{
    check_normal_exit, run_managed, CommandSpec, ExitStatus, Supervisor, SupervisorError,
};
