// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The call-scoped carrier of metadata.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{Args, Metadata};

static EMPTY: Metadata = Metadata::new();

/// An immutable, parent-linked carrier of a metadata snapshot.
///
/// A `Context` is created once per unit of work (for example, one per inbound request) and is
/// passed down explicitly through every layer. Each layer derives a new context instead of
/// changing the one it received, so concurrent derivations from the same parent never interfere.
///
/// Cloning a context is cheap: it shares the parent chain.
///
/// # Examples
///
/// ```rust
/// use faultline::{Context, kv};
/// use serde_json::json;
///
/// let request = Context::background().with_meta(kv!("request" => "r-1"));
/// let repository = request.with_meta(kv!("table" => "users"));
///
/// assert_eq!(request.metadata().to_value(), json!({ "request": "r-1" }));
/// assert_eq!(repository.metadata().to_value(), json!({ "request": "r-1", "table": "users" }));
/// ```
#[derive(Clone)]
pub struct Context {
    // `None` is the "no context" value. Deriving from it yields it again.
    scope: Option<Arc<Scope>>,
}

struct Scope {
    parent: Option<Arc<Scope>>,
    payload: Payload,
}

enum Payload {
    Root,
    Snapshot(Metadata),
    Extension(Arc<dyn Any + Send + Sync>),
}

impl Context {
    /// Creates an empty root context.
    #[must_use]
    pub fn background() -> Self {
        Self {
            scope: Some(Arc::new(Scope {
                parent: None,
                payload: Payload::Root,
            })),
        }
    }

    /// Returns the "no context" value.
    ///
    /// Every derivation from it returns it unchanged and its metadata is always empty.
    #[must_use]
    pub const fn none() -> Self {
        Self { scope: None }
    }

    /// Returns `true` for the "no context" value.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.scope.is_none()
    }

    /// Derives a child context whose snapshot is this context's metadata overridden by `args`.
    ///
    /// The parent's snapshot is copied, never modified.
    #[must_use]
    pub fn with_meta(&self, args: impl Into<Args>) -> Self {
        self.derive(|| Payload::Snapshot(self.metadata().merged(args.into())))
    }

    /// Derives a child context carrying an arbitrary typed value and no snapshot.
    ///
    /// Metadata lookups pass through such scopes to the nearest ancestor with a snapshot.
    #[must_use]
    pub fn with_extension<T>(&self, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.derive(|| Payload::Extension(Arc::new(value)))
    }

    /// Returns the nearest extension of type `T`.
    #[must_use]
    pub fn extension<T: Any>(&self) -> Option<&T> {
        self.scopes().find_map(|scope| match &scope.payload {
            Payload::Extension(value) => value.downcast_ref::<T>(),
            _ => None,
        })
    }

    /// Returns the effective metadata: the snapshot of the nearest scope that carries one.
    ///
    /// If no scope carries a snapshot, an empty snapshot is returned.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        self.scopes()
            .find_map(|scope| match &scope.payload {
                Payload::Snapshot(meta) => Some(meta),
                _ => None,
            })
            .unwrap_or(&EMPTY)
    }

    /// Produces a freshly owned snapshot for attaching to an error.
    ///
    /// Entries from `extra` override the context's entries on key collision. The result shares
    /// nothing with this context or with any previously produced snapshot.
    #[must_use]
    pub fn snapshot(&self, extra: impl Into<Args>) -> Metadata {
        self.metadata().merged(extra.into())
    }

    fn derive(&self, payload: impl FnOnce() -> Payload) -> Self {
        match &self.scope {
            None => Self::none(),
            Some(parent) => Self {
                scope: Some(Arc::new(Scope {
                    parent: Some(Arc::clone(parent)),
                    payload: payload(),
                })),
            },
        }
    }

    fn scopes(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(self.scope.as_deref(), |scope| scope.parent.as_deref())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("Context(none)");
        }

        f.debug_struct("Context")
            .field("metadata", self.metadata())
            .field("depth", &self.scopes().count())
            .finish()
    }
}
