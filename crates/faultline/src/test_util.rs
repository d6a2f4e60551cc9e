// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test utilities for the faultline crate.
//!
//! This module is only available when the `test-util` feature is enabled.

/// Assert that the user-facing description of an error matches the expected text.
///
/// The description is resolved with [`extract::issue`](crate::extract::issue), so the
/// innermost message is compared when no issue was attached.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-util")]
/// # {
/// use faultline::{Fault, Message, assert_issue};
///
/// let error = Fault::wrap(Fault::new("error 500", ()), Message::with_issue("get user", "please try again"));
/// assert_issue!(error, "please try again");
/// # }
/// ```
#[macro_export]
#[cfg_attr(coverage_nightly, coverage(off))] // coverage doesn't handle panics well
macro_rules! assert_issue {
    ($error:expr, $expected:expr) => {{
        let error: &(dyn ::std::error::Error + 'static) = &$error;
        let expected: &str = $expected;
        let actual = $crate::extract::issue(error);

        if actual != expected {
            panic!("left : {expected}\nright: {actual}");
        }
    }};
}

/// Assert that an error classifies as the expected [`Tag`](crate::Tag).
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-util")]
/// # {
/// use faultline::{Fault, Tag, assert_tag};
///
/// assert_tag!(Fault::new("missing", Tag::NotFound), Tag::NotFound);
/// assert_tag!(Fault::new("untagged", ()), Tag::Internal);
/// # }
/// ```
#[macro_export]
#[cfg_attr(coverage_nightly, coverage(off))]
macro_rules! assert_tag {
    ($error:expr, $expected:expr) => {{
        let error: &(dyn ::std::error::Error + 'static) = &$error;
        let expected: $crate::Tag = $expected;
        let actual = $crate::extract::tag(error);

        if actual != expected {
            panic!("left : {expected}\nright: {actual}");
        }
    }};
}
