// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use faultline::{Fault, Frame, Frames, Metadata, render_frames};
use serde::Serialize;

/// A crash report built from a failed request.
///
/// Reports are handed to every [`Reporter`] registered with a [`Boundary`](crate::Boundary).
/// They serialize to a flat JSON object:
///
/// ```json
/// {
///   "error": "ServiceGetUser: RepositoryGetUserByID: error 503",
///   "tag": "INTERNAL",
///   "issue": "Failed to get user, please try again!",
///   "errctx": { "id": 503 },
///   "stacktrace": "users::repository src/users.rs:42\n...",
///   "frames": [{ "function": "users::repository", "file": "src/users.rs", "line": 42 }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    error: String,
    tag: &'static str,
    issue: String,
    errctx: Option<Metadata>,
    stacktrace: String,
    frames: Vec<ReportFrame>,
}

impl Report {
    /// Extracts everything a crash report needs from an error chain.
    #[must_use]
    pub fn from_fault(fault: &Fault) -> Self {
        let frames = fault.stacktrace().map(Frames::resolve).unwrap_or_default();
        let stacktrace = render_frames(&frames);

        Self {
            error: fault.to_string(),
            tag: fault.tag().as_str(),
            issue: fault.issue().into_owned(),
            errctx: fault.metadata().cloned(),
            stacktrace,
            frames: frames.iter().map(ReportFrame::from).collect(),
        }
    }

    /// Returns the full chained error message.
    #[must_use]
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Returns the name of the error's tag.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Returns the user-facing description.
    #[must_use]
    pub fn issue(&self) -> &str {
        &self.issue
    }

    /// Returns the first metadata snapshot of the chain.
    #[must_use]
    pub fn errctx(&self) -> Option<&Metadata> {
        self.errctx.as_ref()
    }

    /// Returns the rendered stack trace, or an empty string.
    #[must_use]
    pub fn stacktrace(&self) -> &str {
        &self.stacktrace
    }

    /// Returns the number of resolved frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ReportFrame {
    function: Option<String>,
    file: Option<String>,
    line: Option<u32>,
}

impl From<&Frame> for ReportFrame {
    fn from(frame: &Frame) -> Self {
        Self {
            function: frame.function().map(ToOwned::to_owned),
            file: frame.file().map(|path| path.display().to_string()),
            line: frame.line(),
        }
    }
}

/// A sink for crash reports.
///
/// Implemented for any `Fn(&Report) + Send + Sync` closure.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use faultline_http::{BoundaryOptions, Report};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// let options = BoundaryOptions::new().reporter(move |report: &Report| {
///     sink.lock().unwrap().push(report.error().to_owned());
/// });
/// # drop(options);
/// ```
pub trait Reporter: Send + Sync {
    /// Receives the report of one failed request.
    fn report(&self, report: &Report);
}

impl<F> Reporter for F
where
    F: Fn(&Report) + Send + Sync,
{
    fn report(&self, report: &Report) {
        self(report);
    }
}
