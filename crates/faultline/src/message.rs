// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;

use crate::Layer;
use crate::wrapper::Wrapper;

/// Wrapper that names the operation that failed and, optionally, what the user should be told.
///
/// The label becomes part of the chained error message (`"get user: not found"`). The issue is a
/// user-facing description that a boundary may show instead of the internal message.
///
/// # Examples
///
/// ```rust
/// use faultline::{Fault, Message, Tag};
///
/// let error = Fault::new("connection refused", Tag::Internal);
/// let error = Fault::wrap(error, Message::with_issue("get user", "Failed to get user, please try again!"));
///
/// assert_eq!(error.to_string(), "get user: connection refused");
/// assert_eq!(error.issue(), "Failed to get user, please try again!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    label: Cow<'static, str>,
    issue: Option<Cow<'static, str>>,
}

impl Message {
    /// Labels the operation without a user-facing description.
    #[must_use]
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            issue: None,
        }
    }

    /// Labels the operation and attaches a user-facing description.
    #[must_use]
    pub fn with_issue(label: impl Into<Cow<'static, str>>, issue: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            issue: Some(issue.into()),
        }
    }
}

impl Wrapper for Message {
    fn apply(self, layer: Layer) -> Layer {
        let layer = layer.with_label(self.label);

        match self.issue {
            Some(issue) => layer.with_issue(issue),
            None => layer,
        }
    }
}
