// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Error chains that carry call-scoped metadata, a classification tag, a user-safe issue and
//! one attributable stack trace.
//!
//! Errors in a layered service (repository → service → transport) are usually wrapped at every
//! layer on their way up. Faultline makes each of those wraps add what that layer knows without
//! losing what the layers below it already attached, and without capturing a fresh stack trace at
//! every layer of the same call path.
//!
//! # Key Features
//!
//! - [**`Context`**](Context): an immutable, parent-linked carrier of key/value metadata that is
//!   derived (never mutated) as it is passed down through the layers of a unit of work.
//! - [**`Fault`**](Fault): an append-only error chain built from composable [`Wrapper`]s:
//!   [`Tag`], [`Message`], [`Meta`] and [`Stack`].
//! - **Stack deduplication**: [`Fault::new`] captures the stack where a failure originates;
//!   [`Fault::wrap`] only captures again when the wrap happens outside the call path of the
//!   stack already in the chain.
//! - [**`extract`**](extract): read-only queries a boundary uses to turn a chain into a response
//!   code, a user-facing message and structured log fields.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::LazyLock;
//!
//! use faultline::{Context, Fault, Message, Meta, Tag, WrapErr, kv};
//! use serde_json::json;
//!
//! static ENTRY_NOT_FOUND: LazyLock<Fault> = LazyLock::new(|| Fault::sentinel("entry not found", ()));
//!
//! fn repository(ctx: &Context, id: i64) -> Result<String, Fault> {
//!     let ctx = ctx.with_meta(kv!("repositoryParams" => id));
//!     match id {
//!         404 => Err(Fault::wrap(ENTRY_NOT_FOUND.clone(), (Meta::from_context(&ctx, ()), Tag::NotFound))),
//!         500..600 => Err(Fault::new(format!("error {id}"), (Meta::from_context(&ctx, ()), Tag::Internal))),
//!         _ => Ok(format!("user{id}@example.com")),
//!     }
//! }
//!
//! fn service(ctx: &Context, id: i64) -> Result<String, Fault> {
//!     repository(ctx, id).wrap_err((
//!         Meta::from_context(ctx, kv!("serviceParams" => id)),
//!         Message::with_issue("RepositoryGetUserByID", "Failed to get user, please try again!"),
//!     ))
//! }
//!
//! let ctx = Context::background().with_meta(kv!("request" => "r-1"));
//!
//! let error = service(&ctx, 404).unwrap_err();
//! assert!(error.is(&ENTRY_NOT_FOUND));
//! assert_eq!(error.tag(), Tag::NotFound);
//! assert_eq!(error.to_string(), "RepositoryGetUserByID: entry not found");
//! assert_eq!(
//!     error.metadata().map(|m| m.to_value()),
//!     Some(json!({ "request": "r-1", "serviceParams": 404 }))
//! );
//!
//! let error = service(&ctx, 503).unwrap_err();
//! assert_eq!(error.tag(), Tag::Internal);
//! assert_eq!(error.issue(), "Failed to get user, please try again!");
//! ```
//!
//! # Metadata
//!
//! Metadata is passed as [`Args`]: an ordered list of key/value pairs built with [`kv!`],
//! [`Args::pair`] or [`Args::from_raw`]. Later writes to the same key win. Arguments that cannot
//! be paired with a string key are recorded under [`BAD_KEY`] (`"!BADKEY"`).
//!
//! Attaching metadata to an error with [`Meta::from_context`] takes an independent snapshot of
//! the context at that moment, so deriving the context further never changes errors already
//! built.
//!
//! # Stack Traces
//!
//! Frames are captured as raw addresses (at most [`MAX_FRAMES`]) and only resolved to
//! function, file and line when rendered with [`Fault::stacktrace_text`] or
//! [`Frames::render`].
//!
//! Deduplication compares raw return addresses, so it works best in builds where the functions
//! that create and wrap errors keep their own frames. Wrap with [`WrapErr::wrap_err`] or
//! [`Fault::wrap`] directly in the function that received the error.
//!
//! # Features
//!
//! - `test-util`: the `assert_issue!` and `assert_tag!` macros for downstream tests.

mod args;
mod context;
pub mod extract;
mod fault;
mod layer;
mod message;
mod meta;
mod metadata;
pub mod stack;
mod tag;
pub mod wrapper;

#[cfg(any(feature = "test-util", test))]
pub mod test_util;

pub use args::{Arg, Args, BAD_KEY};
pub use context::Context;
pub use fault::{Fault, WrapErr};
pub use layer::Layer;
pub use message::Message;
pub use meta::Meta;
pub use metadata::Metadata;
pub use stack::{Frame, Frames, MAX_FRAMES, Stack, render_frames};
pub use tag::Tag;
pub use wrapper::{Wrapper, Wrappers};
