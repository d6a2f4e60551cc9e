// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::stack::is_ancestor;
use crate::wrapper::Wrappers;
use crate::{Frames, Layer, Metadata, Tag, extract};

/// An immutable chain of error layers.
///
/// A `Fault` is created where a failure originates ([`Fault::new`]) and grows outward as each
/// enclosing layer wraps it ([`Fault::wrap`]). Every node carries a [`Layer`] built from the
/// wrappers passed to that call. Wrapping never changes an existing node; it returns a new outer
/// one. Cloning shares the chain.
///
/// A stack trace is attached where the failure originates. Wrapping attaches another one only when
/// the wrap happens on a call path that is not a continuation of the stack already in the chain,
/// so an error passed up through every layer of a request carries a single trace.
///
/// # Examples
///
/// ```rust
/// use faultline::{Context, Fault, Message, Meta, Tag, WrapErr, kv};
///
/// fn repository(ctx: &Context, id: i64) -> Result<String, Fault> {
///     let ctx = ctx.with_meta(kv!("id" => id));
///     Err(Fault::new("entry not found", (Tag::NotFound, Meta::from_context(&ctx, ()))))
/// }
///
/// fn service(ctx: &Context, id: i64) -> Result<String, Fault> {
///     repository(ctx, id).wrap_err(Message::new("repository"))
/// }
///
/// let error = service(&Context::background(), 404).unwrap_err();
///
/// assert_eq!(error.to_string(), "repository: entry not found");
/// assert_eq!(error.tag(), Tag::NotFound);
/// assert_eq!(error.issue(), "entry not found");
/// ```
#[derive(Clone)]
pub struct Fault {
    node: Arc<Node>,
}

#[derive(Debug)]
struct Node {
    layer: Layer,
    cause: Cause,
}

#[derive(Debug)]
enum Cause {
    Root(Cow<'static, str>),
    Foreign(Box<dyn StdError + Send + Sync>),
    Fault(Fault),
}

impl Cause {
    fn stack(&self) -> Option<&Frames> {
        match self {
            Self::Root(_) => None,
            Self::Foreign(error) => extract::stacktrace(error.as_ref()),
            Self::Fault(fault) => extract::stacktrace(fault),
        }
    }
}

// The stack handed to `assemble`, captured by the public entry point itself.
#[derive(Debug)]
enum Capture {
    Never,
    Always(Frames),
    IfNew(Frames),
}

impl Fault {
    /// Creates a new error chain rooted at `message`, capturing the caller's stack.
    ///
    /// Use this where a failure actually happens. For reusable, process-wide error values use
    /// [`Fault::sentinel`].
    #[inline(never)]
    #[must_use]
    pub fn new(message: impl Into<Cow<'static, str>>, wrappers: impl Wrappers) -> Self {
        let here = Frames::capture(1);
        Self::assemble(Cause::Root(message.into()), wrappers, Capture::Always(here))
    }

    /// Creates a new error chain rooted at `message` without capturing a stack.
    ///
    /// Sentinels are declared once and matched with [`Fault::is`]:
    ///
    /// ```rust
    /// use std::sync::LazyLock;
    ///
    /// use faultline::{Fault, Tag};
    ///
    /// static ENTRY_NOT_FOUND: LazyLock<Fault> = LazyLock::new(|| Fault::sentinel("entry not found", ()));
    ///
    /// let error = Fault::wrap(ENTRY_NOT_FOUND.clone(), Tag::NotFound);
    ///
    /// assert!(error.is(&ENTRY_NOT_FOUND));
    /// assert!(ENTRY_NOT_FOUND.stacktrace().is_none());
    /// assert!(error.stacktrace().is_some());
    /// ```
    #[must_use]
    pub fn sentinel(message: impl Into<Cow<'static, str>>, wrappers: impl Wrappers) -> Self {
        Self::assemble(Cause::Root(message.into()), wrappers, Capture::Never)
    }

    /// Wraps `error` in a new outer layer.
    ///
    /// A [`Fault`] is extended in place of being nested as a foreign error. Any other error
    /// becomes the root cause of a new chain. A stack is attached unless the chain already holds
    /// one captured further down the current call path.
    ///
    /// To wrap only the error case of a `Result` or an `Option`, use [`WrapErr`]. Prefer it over
    /// calling `wrap` inside a `map_err` closure: the closure adds frames to the current call path,
    /// so the stack already in the chain no longer looks like its continuation.
    #[inline(never)]
    #[must_use]
    pub fn wrap<E>(error: E, wrappers: impl Wrappers) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let here = Frames::capture(1);
        Self::assemble(Self::cause_of(error), wrappers, Capture::IfNew(here))
    }

    /// Converts a recovered panic payload into an error.
    ///
    /// The message is `panic: <payload>` when the payload is a string, and `panic: Box<dyn Any>`
    /// otherwise. No tag is attached, so the error classifies as [`Tag::Internal`].
    ///
    /// ```rust
    /// use faultline::{Fault, Tag};
    ///
    /// let payload = std::panic::catch_unwind(|| panic!("panic 999")).unwrap_err();
    /// let error = Fault::from_panic(payload);
    ///
    /// assert_eq!(error.to_string(), "panic: panic 999");
    /// assert_eq!(error.tag(), Tag::Internal);
    /// ```
    #[inline(never)]
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let here = Frames::capture(1);
        let message = if let Some(text) = payload.downcast_ref::<&'static str>() {
            format!("panic: {text}")
        } else if let Some(text) = payload.downcast_ref::<String>() {
            format!("panic: {text}")
        } else {
            "panic: Box<dyn Any>".to_owned()
        };

        Self::assemble(Cause::Root(message.into()), (), Capture::Always(here))
    }

    // Entry points that capture are `#[inline(never)]` and call `Frames::capture(1)` before
    // anything else, so the first recorded frame is their caller.
    fn assemble(cause: Cause, wrappers: impl Wrappers, capture: Capture) -> Self {
        let mut layer = wrappers.apply_all(Layer::new());

        if layer.stack().is_none() {
            match capture {
                Capture::Never => {}
                Capture::Always(here) => layer = layer.with_stack(here),
                Capture::IfNew(here) => {
                    let known = cause
                        .stack()
                        .is_some_and(|existing| is_ancestor(here.callers(), existing.addresses()));

                    if !known {
                        layer = layer.with_stack(here);
                    }
                }
            }
        }

        Self {
            node: Arc::new(Node { layer, cause }),
        }
    }

    fn cause_of<E>(error: E) -> Cause
    where
        E: StdError + Send + Sync + 'static,
    {
        let boxed: Box<dyn StdError + Send + Sync> = Box::new(error);

        match boxed.downcast::<Self>() {
            Ok(fault) => Cause::Fault(*fault),
            Err(foreign) => Cause::Foreign(foreign),
        }
    }

    /// Returns `true` if `other`'s outermost node is part of this chain.
    ///
    /// This is how sentinels are matched: wrapping a sentinel keeps it in the chain.
    #[must_use]
    pub fn is(&self, other: &Self) -> bool {
        self.faults().any(|fault| Arc::ptr_eq(&fault.node, &other.node))
    }

    /// Iterates the layers of this chain, outermost first.
    ///
    /// Faults nested inside foreign errors are not visited; the [`extract`] functions do that.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.faults().map(|fault| &fault.node.layer)
    }

    /// Returns the message of the innermost cause, without any labels.
    #[must_use]
    pub fn root_message(&self) -> Cow<'_, str> {
        match &self.innermost().cause {
            Cause::Root(message) => Cow::Borrowed(message.as_ref()),
            Cause::Foreign(error) => Cow::Owned(error.to_string()),
            // `innermost` never stops at a nested fault.
            Cause::Fault(fault) => fault.root_message(),
        }
    }

    /// Returns the first error of type `T` in the source chain.
    #[must_use]
    pub fn find_source<T>(&self) -> Option<&T>
    where
        T: StdError + 'static,
    {
        extract::chain(self).find_map(|error| error.downcast_ref::<T>())
    }

    /// Returns the first tag in the chain, or [`Tag::Internal`] if there is none.
    #[must_use]
    pub fn tag(&self) -> Tag {
        extract::tag(self)
    }

    /// Returns the outermost user-facing description, falling back to the innermost message.
    #[must_use]
    pub fn issue(&self) -> Cow<'_, str> {
        extract::issue(self)
    }

    /// Returns the first metadata snapshot in the chain.
    #[must_use]
    pub fn metadata(&self) -> Option<&Metadata> {
        extract::metadata(self)
    }

    /// Returns the first stack attachment in the chain.
    #[must_use]
    pub fn stacktrace(&self) -> Option<&Frames> {
        extract::stacktrace(self)
    }

    /// Renders the first stack attachment in the chain, or returns an empty string.
    #[must_use]
    pub fn stacktrace_text(&self) -> String {
        extract::stacktrace_text(self)
    }

    /// Returns the layer of the outermost node.
    #[must_use]
    pub fn layer(&self) -> &Layer {
        &self.node.layer
    }

    fn faults(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |fault| match &fault.node.cause {
            Cause::Fault(inner) => Some(inner),
            Cause::Root(_) | Cause::Foreign(_) => None,
        })
    }

    fn innermost(&self) -> &Node {
        let mut node = &*self.node;
        while let Cause::Fault(inner) = &node.cause {
            node = &inner.node;
        }
        node
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in self.layers().filter_map(Layer::label) {
            write!(f, "{label}: ")?;
        }

        match &self.innermost().cause {
            Cause::Root(message) => f.write_str(message),
            Cause::Foreign(error) => write!(f, "{error}"),
            Cause::Fault(fault) => write!(f, "{fault}"),
        }
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("layer", &self.node.layer)
            .field("cause", &self.node.cause)
            .finish()
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.node.cause {
            Cause::Root(_) => None,
            Cause::Foreign(error) => Some(error.as_ref()),
            Cause::Fault(fault) => Some(fault),
        }
    }
}

/// Wraps the error case of a `Result` or an `Option`, leaving the other case untouched.
///
/// This is the nil-safe form of [`Fault::wrap`]: wrapping "no error" yields "no error".
///
/// # Examples
///
/// ```rust
/// use faultline::{Message, WrapErr};
///
/// let parsed: Result<i64, _> = "42".parse::<i64>().wrap_err(Message::new("parse id"));
/// assert_eq!(parsed.unwrap(), 42);
///
/// let failed = "forty-two".parse::<i64>().wrap_err(Message::new("parse id")).unwrap_err();
/// assert_eq!(failed.to_string(), "parse id: invalid digit found in string");
///
/// let none: Option<std::io::Error> = None;
/// assert!(none.wrap_err(Message::new("never")).is_none());
/// ```
pub trait WrapErr {
    /// The type produced by wrapping.
    type Output;

    /// Wraps the error, if there is one.
    #[must_use]
    fn wrap_err(self, wrappers: impl Wrappers) -> Self::Output;
}

impl<T, E> WrapErr for Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    type Output = Result<T, Fault>;

    #[inline(never)]
    fn wrap_err(self, wrappers: impl Wrappers) -> Self::Output {
        match self {
            Ok(value) => Ok(value),
            Err(error) => {
                let here = Frames::capture(1);
                Err(Fault::assemble(Fault::cause_of(error), wrappers, Capture::IfNew(here)))
            }
        }
    }
}

impl<E> WrapErr for Option<E>
where
    E: StdError + Send + Sync + 'static,
{
    type Output = Option<Fault>;

    #[inline(never)]
    fn wrap_err(self, wrappers: impl Wrappers) -> Self::Output {
        match self {
            Some(error) => {
                let here = Frames::capture(1);
                Some(Fault::assemble(Fault::cause_of(error), wrappers, Capture::IfNew(here)))
            }
            None => None,
        }
    }
}
