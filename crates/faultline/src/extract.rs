// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Read-only queries over an error's source chain.
//!
//! Each function walks `err` and its [`source`](std::error::Error::source) chain from the
//! outermost error inward, reading the layer of every [`Fault`] it meets. Faults nested behind
//! foreign errors are found as well.
//!
//! ```rust
//! use faultline::{Fault, Tag, extract};
//!
//! let error: Box<dyn std::error::Error + Send + Sync> = Box::new(Fault::new("gone", Tag::NotFound));
//!
//! assert_eq!(extract::tag(error.as_ref()), Tag::NotFound);
//! assert_eq!(extract::issue(error.as_ref()), "gone");
//! ```

use std::borrow::Cow;
use std::error::Error;

use crate::{Fault, Frames, Layer, Metadata, Tag};

/// Iterates `err` and every error in its source chain, outermost first.
pub fn chain<'a>(err: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(err), |error: &&'a (dyn Error + 'static)| (*error).source())
}

fn layers<'a>(err: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a Layer> {
    chain(err).filter_map(|error| error.downcast_ref::<Fault>().map(Fault::layer))
}

/// Returns the first declared tag, or [`Tag::Internal`] if no layer declares one.
#[must_use]
pub fn tag(err: &(dyn Error + 'static)) -> Tag {
    layers(err).find_map(Layer::tag).unwrap_or_default()
}

/// Returns the most specific user-facing description.
///
/// This is the outermost issue attached anywhere in the chain. When none was attached, the message
/// of the innermost error is returned instead.
#[must_use]
pub fn issue<'a>(err: &'a (dyn Error + 'static)) -> Cow<'a, str> {
    if let Some(issue) = layers(err).find_map(Layer::issue) {
        return Cow::Borrowed(issue);
    }

    let Some(innermost) = chain(err).last() else {
        // `chain` always yields `err` itself.
        return Cow::Owned(err.to_string());
    };

    match innermost.downcast_ref::<Fault>() {
        Some(fault) => fault.root_message(),
        None => Cow::Owned(innermost.to_string()),
    }
}

/// Returns the first metadata snapshot in the chain.
#[must_use]
pub fn metadata<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a Metadata> {
    layers(err).find_map(Layer::metadata)
}

/// Returns the first stack attachment in the chain.
#[must_use]
pub fn stacktrace<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a Frames> {
    layers(err).find_map(Layer::stack)
}

/// Renders the first stack attachment in the chain, or returns an empty string if there is none.
#[must_use]
pub fn stacktrace_text(err: &(dyn Error + 'static)) -> String {
    stacktrace(err).map(Frames::render).unwrap_or_default()
}
