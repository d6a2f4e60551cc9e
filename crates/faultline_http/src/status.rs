// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use faultline::Tag;
use http::StatusCode;

/// Maps a failure classification to the status code a client receives.
///
/// | Tag | Status |
/// |---|---|
/// | [`Tag::NotFound`] | `404 Not Found` |
/// | [`Tag::InvalidArgument`] | `400 Bad Request` |
/// | anything else | `500 Internal Server Error` |
#[must_use]
pub fn status_for(tag: Tag) -> StatusCode {
    match tag {
        Tag::NotFound => StatusCode::NOT_FOUND,
        Tag::InvalidArgument => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping() {
        assert_eq!(status_for(Tag::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(Tag::InvalidArgument), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(Tag::Internal), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for(Tag::default()), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
