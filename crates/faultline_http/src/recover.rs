// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::panic::{AssertUnwindSafe, catch_unwind};

use faultline::Fault;

/// Runs `f`, turning a panic into an error.
///
/// A panic unwinding out of `f` is caught and converted with [`Fault::from_panic`], so it reaches
/// the caller as an ordinary untagged error instead of tearing down the thread.
///
/// The panic hook still runs before the panic is caught, so the default hook prints the panic
/// message to standard error.
///
/// # Examples
///
/// ```rust
/// use faultline::Fault;
/// use faultline_http::recover;
///
/// let result: Result<(), Fault> = recover(|| panic!("panic 999"));
/// assert_eq!(result.unwrap_err().to_string(), "panic: panic 999");
/// ```
pub fn recover<T, F>(f: F) -> Result<T, Fault>
where
    F: FnOnce() -> Result<T, Fault>,
{
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| Err(Fault::from_panic(payload)))
}
