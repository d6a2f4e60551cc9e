// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A user lookup service whose failures travel from the repository through the service to the
//! HTTP boundary.
//!
//! | id | outcome |
//! |---|---|
//! | `404` | the `entry not found` sentinel, tagged `NotFound` |
//! | `400..500` | an `InvalidArgument` failure |
//! | `500..600` | an `Internal` failure with a user-facing issue attached by the service |
//! | `999` | a panic, recovered by the boundary |
//! | anything else | a user |

use std::sync::LazyLock;

use faultline::{Args, Context, Fault, Message, Meta, Tag, WrapErr, kv};
use faultline_http::{Boundary, BoundaryOptions, Report};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Request, Response};
use serde::Serialize;

static ENTRY_NOT_FOUND: LazyLock<Fault> = LazyLock::new(|| Fault::sentinel("entry not found", ()));

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceGetUserParams {
    id: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryGetUserByIdParams {
    id: i64,
}

#[derive(Debug, Clone, Serialize)]
struct User {
    id: i64,
    username: String,
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let boundary = Boundary::new(
        BoundaryOptions::new()
            .name("users")
            .enable_logs()
            .reporter(|report: &Report| {
                println!(
                    "crash report: {}",
                    serde_json::to_string(report).unwrap_or_else(|e| format!("<unserializable report: {e}>"))
                );
            }),
    );

    let ctx = Context::background().with_meta(kv!("service" => "users"));

    for path in ["/users/1", "/users/abc", "/users/404", "/users/450", "/users/503", "/users/999"] {
        let request = Request::get(path).body(()).expect("static paths are valid URIs");
        let response = boundary.handle(&ctx, &request, handler_get_user_by_id);

        println!("GET {path} -> {} {}", response.status(), response.body());
    }
}

fn handler_get_user_by_id(ctx: &Context, request: &Request<()>) -> Result<Response<String>, Fault> {
    let raw_id = request.uri().path().trim_start_matches("/users/");
    let id = raw_id
        .parse::<i64>()
        .wrap_err((Tag::InvalidArgument, Message::with_issue("parse id", "The user id must be a number.")))?;

    let user = service_get_user(ctx, ServiceGetUserParams { id })
        .wrap_err((Meta::from_context(ctx, kv!("id" => id)), Message::new("ServiceGetUser")))?;

    let body = serde_json::to_string(&user).wrap_err(Message::new("encode user"))?;

    let mut response = Response::new(body);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}

fn service_get_user(ctx: &Context, params: ServiceGetUserParams) -> Result<User, Fault> {
    repository_get_user_by_id(ctx, RepositoryGetUserByIdParams { id: params.id }).wrap_err((
        Meta::from_context(ctx, Args::new().serialized("serviceParams", &params)),
        Message::with_issue("RepositoryGetUserByID", "Failed to get user, please try again!"),
    ))
}

fn repository_get_user_by_id(ctx: &Context, params: RepositoryGetUserByIdParams) -> Result<User, Fault> {
    let ctx = ctx.with_meta(Args::new().serialized("repositoryParams", &params));

    match params.id {
        404 => Err::<User, _>(ENTRY_NOT_FOUND.clone()).wrap_err((Meta::from_context(&ctx, ()), Tag::NotFound)),
        400..500 => Err(Fault::new(
            format!("error {}", params.id),
            (Meta::from_context(&ctx, ()), Tag::InvalidArgument),
        )),
        500..600 => Err(Fault::new(
            format!("error {}", params.id),
            (Meta::from_context(&ctx, ()), Tag::Internal),
        )),
        999 => panic!("panic 999"),
        id => Ok(User {
            id,
            username: format!("user{id}@example.com"),
        }),
    }
}
