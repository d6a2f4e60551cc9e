// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Turns [`faultline`] error chains into HTTP responses, structured logs and crash reports.
//!
//! Inner layers of a service build and wrap [`Fault`](faultline::Fault)s; this crate is the
//! place where those chains leave the service:
//!
//! - [`status_for`] maps the chain's [`Tag`](faultline::Tag) to a status code
//!   (`NotFound` → 404, `InvalidArgument` → 400, anything else → 500).
//! - [`error_response`] renders the chain's user-facing issue as a JSON body.
//! - [`recover`] converts a panic in a handler into an ordinary error.
//! - [`Report`] collects what a crash-reporting sink needs; [`Reporter`] is that sink.
//! - [`Boundary`] ties these together around a request handler and, with the `logs` feature,
//!   emits `faultline.request.started` and `faultline.request.completed` events through
//!   [`tracing`](https://docs.rs/tracing).
//!
//! # Examples
//!
//! ```rust
//! use faultline::{Context, Fault, Message, Tag, WrapErr};
//! use faultline_http::{Boundary, BoundaryOptions};
//! use http::{Request, Response, StatusCode};
//!
//! fn repository(id: i64) -> Result<String, Fault> {
//!     match id {
//!         500..600 => Err(Fault::new(format!("error {id}"), Tag::Internal)),
//!         999 => panic!("panic 999"),
//!         _ => Ok(format!("user{id}@example.com")),
//!     }
//! }
//!
//! fn get_user(_ctx: &Context, request: &Request<()>) -> Result<Response<String>, Fault> {
//!     let id = request.uri().path().trim_start_matches("/users/");
//!     let id = id.parse::<i64>().wrap_err((Tag::InvalidArgument, Message::with_issue("parse id", "invalid user id")))?;
//!     let user = repository(id).wrap_err(Message::with_issue("repository", "Failed to get user, please try again!"))?;
//!     Ok(Response::new(user))
//! }
//!
//! let boundary = Boundary::new(BoundaryOptions::new().name("users"));
//! let ctx = Context::background();
//!
//! let serve = |path: &str| boundary.handle(&ctx, &Request::get(path).body(()).unwrap(), get_user);
//!
//! assert_eq!(serve("/users/1").body(), "user1@example.com");
//! assert_eq!(serve("/users/abc").status(), StatusCode::BAD_REQUEST);
//! assert_eq!(serve("/users/503").body(), r#"{"message":"Failed to get user, please try again!"}"#);
//! assert_eq!(serve("/users/999").status(), StatusCode::INTERNAL_SERVER_ERROR);
//! ```
//!
//! # Features
//!
//! - `logs`: structured logging of request start and completion through `tracing`, enabled per
//!   boundary with `BoundaryOptions::enable_logs`.

mod boundary;
mod recover;
mod report;
mod response;
mod status;

pub use boundary::{Boundary, BoundaryOptions};
pub use recover::recover;
pub use report::{Report, Reporter};
pub use response::error_response;
pub use status::status_for;
