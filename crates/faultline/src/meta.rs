// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::wrapper::Wrapper;
use crate::{Args, Context, Layer, Metadata};

/// Wrapper that attaches a metadata snapshot.
///
/// The snapshot is taken when the wrapper is created, so deriving further contexts afterwards does
/// not change what the error carries.
///
/// # Examples
///
/// ```rust
/// use faultline::{Context, Fault, Meta, kv};
/// use serde_json::json;
///
/// let ctx = Context::background().with_meta(kv!("request" => "r-1"));
/// let error = Fault::new("boom", Meta::from_context(&ctx, kv!("attempt" => 2)));
///
/// assert_eq!(error.metadata().map(|m| m.to_value()), Some(json!({ "request": "r-1", "attempt": 2 })));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Meta(Metadata);

impl Meta {
    /// Snapshots the context's metadata, with `extra` overriding it on key collision.
    #[must_use]
    pub fn from_context(ctx: &Context, extra: impl Into<Args>) -> Self {
        Self(ctx.snapshot(extra))
    }

    /// Attaches only the given arguments, without a context.
    #[must_use]
    pub fn from_args(args: impl Into<Args>) -> Self {
        Self(Metadata::from(args.into()))
    }
}

impl Wrapper for Meta {
    fn apply(self, layer: Layer) -> Layer {
        layer.with_metadata(self.0)
    }
}
