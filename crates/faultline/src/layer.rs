// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;

use crate::{Frames, Metadata, Tag};

/// The data a single node of a [`Fault`](crate::Fault) chain carries.
///
/// Wrappers receive the layer under construction and return it with their piece attached.
/// Setting a field that is already set replaces it, so within one `new`/`wrap` call the last
/// wrapper of a kind wins.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    tag: Option<Tag>,
    label: Option<Cow<'static, str>>,
    issue: Option<Cow<'static, str>>,
    metadata: Option<Metadata>,
    stack: Option<Frames>,
}

impl Layer {
    /// Creates an empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the classification tag.
    #[must_use]
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Sets the operation label, shown in the chained error message.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the user-facing description.
    #[must_use]
    pub fn with_issue(mut self, issue: impl Into<Cow<'static, str>>) -> Self {
        self.issue = Some(issue.into());
        self
    }

    /// Sets the metadata snapshot.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets the stack attachment.
    #[must_use]
    pub fn with_stack(mut self, stack: Frames) -> Self {
        self.stack = Some(stack);
        self
    }

    /// Returns the classification tag, if this layer declares one.
    #[must_use]
    pub fn tag(&self) -> Option<Tag> {
        self.tag
    }

    /// Returns the operation label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the user-facing description.
    #[must_use]
    pub fn issue(&self) -> Option<&str> {
        self.issue.as_deref()
    }

    /// Returns the metadata snapshot.
    #[must_use]
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Returns the stack attachment.
    #[must_use]
    pub fn stack(&self) -> Option<&Frames> {
        self.stack.as_ref()
    }
}
