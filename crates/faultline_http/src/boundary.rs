// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use faultline::{Context, Fault};
use http::{Request, Response};

use crate::{Report, Reporter, error_response, recover};

pub(crate) const DEFAULT_BOUNDARY_NAME: &str = "default";

/// Configuration of a [`Boundary`].
///
/// ```rust
/// use faultline_http::{Boundary, BoundaryOptions, Report};
///
/// let boundary = Boundary::new(
///     BoundaryOptions::new()
///         .name("users")
///         .reporter(|report: &Report| eprintln!("crash report: {}", report.error())),
/// );
/// assert_eq!(boundary.name(), "users");
/// ```
#[derive(Clone)]
#[non_exhaustive]
pub struct BoundaryOptions {
    name: Cow<'static, str>,
    #[cfg(any(feature = "logs", test))]
    logs_enabled: bool,
    reporters: Vec<Arc<dyn Reporter>>,
}

impl BoundaryOptions {
    /// Creates options with `name = "default"`, logging disabled and no reporters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: Cow::Borrowed(DEFAULT_BOUNDARY_NAME),
            #[cfg(any(feature = "logs", test))]
            logs_enabled: false,
            reporters: Vec::new(),
        }
    }

    /// Sets the boundary name used to correlate log events. Prefer `snake_case`.
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Enables structured logging of request start and completion.
    #[must_use]
    #[cfg(any(feature = "logs", test))]
    pub fn enable_logs(self) -> Self {
        Self {
            logs_enabled: true,
            ..self
        }
    }

    /// Registers a crash report sink. Every failed request is reported to every sink.
    #[must_use]
    pub fn reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporters.push(Arc::new(reporter));
        self
    }
}

impl Default for BoundaryOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BoundaryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("BoundaryOptions");
        debug.field("name", &self.name);
        #[cfg(any(feature = "logs", test))]
        debug.field("logs_enabled", &self.logs_enabled);
        debug.field("reporters", &self.reporters.len()).finish()
    }
}

/// The place where error chains leave the service.
///
/// A boundary runs a request handler, recovers it from panics, and turns a failure into the
/// client response, a structured log event and a crash report. Successful responses pass through
/// untouched and nothing is extracted from them.
///
/// # Examples
///
/// ```rust
/// use faultline::{Context, Fault, Tag};
/// use faultline_http::{Boundary, BoundaryOptions};
/// use http::{Request, Response, StatusCode};
///
/// let boundary = Boundary::new(BoundaryOptions::new().name("users"));
/// let request = Request::get("/users/404").body(()).unwrap();
///
/// let response = boundary.handle(&Context::background(), &request, |_ctx, _request| {
///     Err::<Response<String>, _>(Fault::new("entry not found", Tag::NotFound))
/// });
///
/// assert_eq!(response.status(), StatusCode::NOT_FOUND);
/// assert_eq!(response.body(), r#"{"message":"entry not found"}"#);
/// ```
#[derive(Debug, Clone)]
pub struct Boundary {
    options: BoundaryOptions,
}

impl Boundary {
    /// Creates a boundary from its options.
    #[must_use]
    pub fn new(options: BoundaryOptions) -> Self {
        Self { options }
    }

    /// Returns the boundary name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.options.name
    }

    /// Runs `handler` for `request` and returns the response for the client.
    ///
    /// A panic inside the handler is recovered and handled like any other untagged error.
    pub fn handle<B, F>(&self, ctx: &Context, request: &Request<B>, handler: F) -> Response<String>
    where
        F: FnOnce(&Context, &Request<B>) -> Result<Response<String>, Fault>,
    {
        #[cfg(any(feature = "logs", test))]
        let started = std::time::Instant::now();

        #[cfg(any(feature = "logs", test))]
        self.log_started(request);

        match recover(|| handler(ctx, request)) {
            Ok(response) => {
                #[cfg(any(feature = "logs", test))]
                self.log_completed(request, started, &response);

                response
            }
            Err(fault) => {
                let response = error_response(&fault);

                #[cfg(any(feature = "logs", test))]
                self.log_failed(request, started, &response, &fault);

                self.report(&fault);

                response
            }
        }
    }

    fn report(&self, fault: &Fault) {
        if self.options.reporters.is_empty() {
            return;
        }

        let report = Report::from_fault(fault);
        for reporter in &self.options.reporters {
            reporter.report(&report);
        }
    }

    #[cfg(any(feature = "logs", test))]
    fn log_started<B>(&self, request: &Request<B>) {
        if self.options.logs_enabled {
            tracing::event!(
                name: "faultline.request.started",
                tracing::Level::INFO,
                boundary.name = %self.options.name,
                http.method = %request.method(),
                http.path = %request.uri().path(),
                "request started"
            );
        }
    }

    #[cfg(any(feature = "logs", test))]
    fn log_completed<B>(&self, request: &Request<B>, started: std::time::Instant, response: &Response<String>) {
        if self.options.logs_enabled {
            tracing::event!(
                name: "faultline.request.completed",
                tracing::Level::INFO,
                boundary.name = %self.options.name,
                http.method = %request.method(),
                http.path = %request.uri().path(),
                http.status = response.status().as_u16(),
                since = ?started.elapsed(),
                "request completed"
            );
        }
    }

    #[cfg(any(feature = "logs", test))]
    fn log_failed<B>(&self, request: &Request<B>, started: std::time::Instant, response: &Response<String>, fault: &Fault) {
        if self.options.logs_enabled {
            let errctx = fault.metadata().map_or_else(|| "null".to_owned(), ToString::to_string);

            tracing::event!(
                name: "faultline.request.completed",
                tracing::Level::ERROR,
                boundary.name = %self.options.name,
                http.method = %request.method(),
                http.path = %request.uri().path(),
                http.status = response.status().as_u16(),
                since = ?started.elapsed(),
                error = %fault,
                tag = %fault.tag(),
                errctx = %errctx,
                stacktrace = %fault.stacktrace_text(),
                "request completed"
            );
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use faultline::{Message, Meta, Tag, kv};
    use http::StatusCode;
    use testing_aids::LogCapture;

    use super::*;

    fn get(path: &str) -> Request<()> {
        Request::get(path).body(()).unwrap()
    }

    fn ok(body: &str) -> Result<Response<String>, Fault> {
        Ok(Response::new(body.to_owned()))
    }

    #[test]
    fn default_options() {
        let options = BoundaryOptions::default();
        assert_eq!(options.name, DEFAULT_BOUNDARY_NAME);
        assert!(!options.logs_enabled);
        assert!(options.reporters.is_empty());
        assert_eq!(
            format!("{options:?}"),
            r#"BoundaryOptions { name: "default", logs_enabled: false, reporters: 0 }"#
        );
    }

    #[test]
    fn success_passes_through_without_reports() {
        let reports = Arc::new(Mutex::new(Vec::<Report>::new()));
        let sink = Arc::clone(&reports);
        let boundary = Boundary::new(BoundaryOptions::new().reporter(move |r: &Report| sink.lock().unwrap().push(r.clone())));

        let response = boundary.handle(&Context::background(), &get("/users/1"), |_, _| ok("user1"));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "user1");
        assert!(reports.lock().unwrap().is_empty());
    }

    #[test]
    fn failure_is_reported() {
        let reports = Arc::new(Mutex::new(Vec::<Report>::new()));
        let sink = Arc::clone(&reports);
        let boundary = Boundary::new(BoundaryOptions::new().reporter(move |r: &Report| sink.lock().unwrap().push(r.clone())));

        let response = boundary.handle(&Context::background(), &get("/users/450"), |_, _| {
            Err(Fault::new("error 450", Tag::InvalidArgument))
        });

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let reports = reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].tag(), "INVALID_ARGUMENT");
        assert_eq!(reports[0].error(), "error 450");
    }

    #[test]
    fn logs_failure_fields() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        let boundary = Boundary::new(BoundaryOptions::new().name("users").enable_logs());
        let ctx = Context::background().with_meta(kv!("request" => "r-1"));

        let response = boundary.handle(&ctx, &get("/users/503"), |ctx, _| {
            let error = Fault::new("error 503", (Tag::Internal, Meta::from_context(ctx, ())));
            Err(Fault::wrap(error, Message::with_issue("ServiceGetUser", "Failed to get user, please try again!")))
        });

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        capture.assert_contains("request started");
        capture.assert_contains("boundary.name=users");
        capture.assert_contains("http.path=/users/503");
        capture.assert_contains("ERROR");
        capture.assert_contains("error=ServiceGetUser: error 503");
        capture.assert_contains("tag=INTERNAL");
        capture.assert_contains(r#"errctx={"request":"r-1"}"#);
        capture.assert_contains("stacktrace=");
        capture.assert_not_contains("Failed to get user");
    }

    #[test]
    fn logs_success_at_info() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        let boundary = Boundary::new(BoundaryOptions::new().enable_logs());
        let _response = boundary.handle(&Context::background(), &get("/users/1"), |_, _| ok("user1"));

        assert_eq!(capture.lines_containing("request completed").len(), 1);
        capture.assert_contains("http.status=200");
        capture.assert_not_contains("ERROR");
        capture.assert_not_contains("stacktrace");
    }

    #[test]
    fn logs_disabled_by_default() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        let boundary = Boundary::new(BoundaryOptions::new());
        let _response = boundary.handle(&Context::background(), &get("/users/404"), |_, _| {
            Err(Fault::new("entry not found", Tag::NotFound))
        });

        assert_eq!(capture.output(), "");
    }
}
