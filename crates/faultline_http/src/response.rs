// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use faultline::Fault;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response};
use serde_json::json;

use crate::status_for;

/// Renders an error as the response a client receives.
///
/// The status code comes from the error's [`Tag`](faultline::Tag) and the body is a JSON object
/// whose `message` is the error's issue. Internal messages only reach the client when no layer
/// attached a user-facing description.
///
/// # Examples
///
/// ```rust
/// use faultline::{Fault, Message, Tag};
/// use faultline_http::error_response;
///
/// let error = Fault::new("error 503", Tag::Internal);
/// let error = Fault::wrap(error, Message::with_issue("get user", "Failed to get user, please try again!"));
///
/// let response = error_response(&error);
/// assert_eq!(response.status(), 500);
/// assert_eq!(response.body(), r#"{"message":"Failed to get user, please try again!"}"#);
/// ```
#[must_use]
pub fn error_response(fault: &Fault) -> Response<String> {
    let body = json!({ "message": fault.issue() }).to_string();

    let mut response = Response::new(body);
    *response.status_mut() = status_for(fault.tag());
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    response
}
