// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use crate::Layer;
use crate::wrapper::Wrapper;

/// The classification of a failure.
///
/// Boundaries use the tag to choose a response code. A chain with no tag anywhere is classified as
/// [`Tag::Internal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Tag {
    /// The requested entity does not exist.
    NotFound,
    /// The caller supplied an argument that cannot be processed.
    InvalidArgument,
    /// Any other failure.
    #[default]
    Internal,
}

impl Tag {
    /// Returns the stable, upper snake case name of the tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Wrapper for Tag {
    fn apply(self, layer: Layer) -> Layer {
        layer.with_tag(self)
    }
}
