// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Call stack capture, ancestry matching, and rendering.

use std::ffi::c_void;
use std::fmt;
use std::path::PathBuf;

use smallvec::SmallVec;

use crate::Layer;
use crate::wrapper::Wrapper;

/// The maximum number of frames recorded by a single capture.
pub const MAX_FRAMES: usize = 32;

/// An ordered sequence of captured call frames, innermost first.
///
/// Frames are recorded as raw instruction addresses at capture time and only resolved to
/// function, file, and line when rendered.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Frames {
    ips: SmallVec<[usize; MAX_FRAMES]>,
}

impl Frames {
    /// Captures the current call stack.
    ///
    /// With `skip == 0` the first recorded frame is the function that called `capture`; each
    /// increment moves one frame further towards the thread entry point. Never fails: if the
    /// stack cannot be walked, the result is empty.
    #[inline(never)]
    #[must_use]
    pub fn capture(skip: usize) -> Self {
        let anchor = (Self::capture as fn(usize) -> Self as *const ()).addr();

        let mut ips = SmallVec::new();
        let mut anchored = false;
        let mut pending = skip;

        backtrace::trace(|frame| {
            if !anchored {
                // Unwinder internals sit above us; everything up to our own frame is skipped.
                anchored = frame.symbol_address().addr() == anchor;
                return true;
            }

            if pending > 0 {
                pending -= 1;
                return true;
            }

            ips.push(frame.ip().addr());
            ips.len() < MAX_FRAMES
        });

        Self { ips }
    }

    #[cfg(test)]
    pub(crate) fn from_ips(ips: &[usize]) -> Self {
        Self {
            ips: SmallVec::from_slice(ips),
        }
    }

    /// Returns the number of captured frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ips.len()
    }

    /// Returns `true` if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ips.is_empty()
    }

    /// Returns the raw instruction addresses, innermost first.
    #[must_use]
    pub fn addresses(&self) -> &[usize] {
        &self.ips
    }

    /// Returns the frames above the innermost one.
    ///
    /// For a capture taken inside a function `f`, this is the call path that led to `f`.
    #[must_use]
    pub fn callers(&self) -> &[usize] {
        self.ips.get(1..).unwrap_or_default()
    }

    /// Returns `true` if this stack is an ancestor of `existing`.
    ///
    /// See [`is_ancestor`].
    #[must_use]
    pub fn is_ancestor_of(&self, existing: &Self) -> bool {
        is_ancestor(&self.ips, &existing.ips)
    }

    /// Resolves every frame to function, file, and line.
    ///
    /// Frames that were inlined into a single physical frame are expanded, innermost first.
    #[must_use]
    pub fn resolve(&self) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(self.ips.len());

        for &ip in &self.ips {
            let before = frames.len();

            backtrace::resolve(std::ptr::with_exposed_provenance_mut::<c_void>(ip), |symbol| {
                frames.push(Frame {
                    function: symbol.name().map(|name| format!("{name:#}")),
                    file: symbol.filename().map(PathBuf::from),
                    line: symbol.lineno(),
                });
            });

            if frames.len() == before {
                frames.push(Frame::default());
            }
        }

        frames
    }

    /// Renders the frames as text, one `<function> <file>:<line>` per line, innermost first.
    ///
    /// Equivalent to [`render_frames`] over [`Frames::resolve`].
    #[must_use]
    pub fn render(&self) -> String {
        render_frames(&self.resolve())
    }
}

impl fmt::Debug for Frames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ips.iter().copied().map(Address)).finish()
    }
}

struct Address(usize);

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Renders already resolved frames, one `<function> <file>:<line>` per line.
#[must_use]
pub fn render_frames(frames: &[Frame]) -> String {
    frames.iter().map(Frame::to_string).collect::<Vec<_>>().join("\n")
}

/// Returns `true` if `candidate` is an ancestor of `existing`.
///
/// Both stacks are ordered innermost first. `candidate` is an ancestor when it is no longer than
/// `existing` and matches it frame by frame, starting from the outermost frame of each. In other
/// words, `existing` was captured further down the same call path that `candidate` describes.
#[must_use]
pub fn is_ancestor(candidate: &[usize], existing: &[usize]) -> bool {
    if candidate.len() > existing.len() {
        return false;
    }

    candidate.iter().rev().zip(existing.iter().rev()).all(|(ours, theirs)| ours == theirs)
}

/// A resolved call frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    function: Option<String>,
    file: Option<PathBuf>,
    line: Option<u32>,
}

impl Frame {
    /// Returns the demangled function name, if known.
    #[must_use]
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// Returns the source file, if known.
    #[must_use]
    pub fn file(&self) -> Option<&std::path::Path> {
        self.file.as_deref()
    }

    /// Returns the source line, if known.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let function = self.function.as_deref().unwrap_or("<unknown function>");
        let line = self.line.unwrap_or(0);

        match &self.file {
            Some(file) => write!(f, "{function} {}:{line}", file.display()),
            None => write!(f, "{function} <unknown file>:{line}"),
        }
    }
}

/// Wrapper that attaches the call stack of the place where it was created.
///
/// [`Fault::new`](crate::Fault::new) and [`Fault::wrap`](crate::Fault::wrap) already capture a
/// stack when one is needed; use this to force a capture at a specific call site.
#[derive(Debug, Clone)]
pub struct Stack(Frames);

impl Stack {
    /// Captures the stack of the caller.
    #[inline(never)]
    #[must_use]
    pub fn here() -> Self {
        // Out of tail position, so this function keeps the frame that `capture(1)` skips.
        let frames = std::hint::black_box(Frames::capture(1));
        Self(frames)
    }

    /// Uses an already captured stack.
    #[must_use]
    pub fn from_frames(frames: Frames) -> Self {
        Self(frames)
    }
}

impl Wrapper for Stack {
    fn apply(self, layer: Layer) -> Layer {
        layer.with_stack(self.0)
    }
}
