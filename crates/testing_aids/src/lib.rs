// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! An unpublished crate containing testing utilities for use within this repo.

use std::panic::resume_unwind;
use std::thread;

mod log;

pub use log::*;

/// Executes a function on a newly spawned thread and returns its result.
///
/// The function starts with only the thread entry frames below it, which keeps captured call
/// stacks short and identical from run to run, no matter how deep the test harness itself is.
///
/// # Panics
///
/// Re-raises any panic of `f` on the calling thread.
#[cfg_attr(test, mutants::skip)] // This is test logic - pointless to mutate.
pub fn on_fresh_thread<F, R>(f: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    thread::spawn(f).join().unwrap_or_else(|payload| resume_unwind(payload))
}
