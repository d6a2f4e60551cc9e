// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! End-to-end: failures raised in a repository travel through a service and a handler and are
//! answered by the boundary.

use std::sync::{Arc, LazyLock, Mutex};

use faultline::{Context, Fault, Message, Meta, Tag, WrapErr, assert_issue, assert_tag, kv};
use faultline_http::{Boundary, BoundaryOptions, Report};
use http::{Request, Response, StatusCode};
use serde_json::{Value, json};

static ENTRY_NOT_FOUND: LazyLock<Fault> = LazyLock::new(|| Fault::sentinel("entry not found", ()));

fn repository(ctx: &Context, id: i64) -> Result<String, Fault> {
    let ctx = ctx.with_meta(kv!("repositoryParams" => json!({ "id": id })));

    match id {
        404 => Err::<String, _>(ENTRY_NOT_FOUND.clone()).wrap_err((Meta::from_context(&ctx, ()), Tag::NotFound)),
        400..500 => Err(Fault::new(format!("error {id}"), (Meta::from_context(&ctx, ()), Tag::InvalidArgument))),
        500..600 => Err(Fault::new(format!("error {id}"), (Meta::from_context(&ctx, ()), Tag::Internal))),
        999 => panic!("panic 999"),
        _ => Ok(format!("user{id}@example.com")),
    }
}

fn service(ctx: &Context, id: i64) -> Result<String, Fault> {
    repository(ctx, id).wrap_err((
        Meta::from_context(ctx, kv!("serviceParams" => json!({ "id": id }))),
        Message::with_issue("RepositoryGetUserByID", "Failed to get user, please try again!"),
    ))
}

fn handler(ctx: &Context, request: &Request<()>) -> Result<Response<String>, Fault> {
    let id = request
        .uri()
        .path()
        .trim_start_matches("/users/")
        .parse::<i64>()
        .wrap_err((Tag::InvalidArgument, Message::with_issue("parse id", "invalid user id")))?;

    let user = service(ctx, id).wrap_err((Meta::from_context(ctx, kv!("id" => id)), Message::new("ServiceGetUser")))?;
    Ok(Response::new(user))
}

struct Harness {
    boundary: Boundary,
    reports: Arc<Mutex<Vec<Report>>>,
}

impl Harness {
    fn new() -> Self {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let boundary = Boundary::new(
            BoundaryOptions::new()
                .name("users")
                .reporter(move |report: &Report| sink.lock().unwrap().push(report.clone())),
        );

        Self { boundary, reports }
    }

    fn get(&self, path: &str) -> Response<String> {
        let request = Request::get(path).body(()).unwrap();
        self.boundary.handle(&Context::background(), &request, handler)
    }

    fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }
}

fn message(response: &Response<String>) -> Value {
    serde_json::from_str::<Value>(response.body()).unwrap()["message"].clone()
}

#[test]
fn scenario_a_not_found() {
    let ctx = Context::background();
    assert_tag!(repository(&ctx, 404).unwrap_err(), Tag::NotFound);
    assert_tag!(service(&ctx, 404).unwrap_err(), Tag::NotFound);

    let harness = Harness::new();
    let response = harness.get("/users/404");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(message(&response), json!("Failed to get user, please try again!"));

    let reports = harness.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].error(), "ServiceGetUser: RepositoryGetUserByID: entry not found");
    assert_eq!(reports[0].errctx().map(|m| m.to_value()), Some(json!({ "id": 404 })));
}

#[test]
fn scenario_b_invalid_argument() {
    let harness = Harness::new();
    let response = harness.get("/users/450");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(harness.reports()[0].tag(), "INVALID_ARGUMENT");
}

#[test]
fn scenario_b_unparsable_id() {
    let harness = Harness::new();
    let response = harness.get("/users/abc");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(&response), json!("invalid user id"));
}

#[test]
fn scenario_c_internal_with_issue() {
    let error = service(&Context::background(), 503).unwrap_err();
    assert_issue!(error, "Failed to get user, please try again!");

    let harness = Harness::new();
    let response = harness.get("/users/503");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    insta::assert_snapshot!(response.body(), @r#"{"message":"Failed to get user, please try again!"}"#);

    let report = &harness.reports()[0];
    assert_eq!(report.error(), "ServiceGetUser: RepositoryGetUserByID: error 503");
    assert!(!report.stacktrace().is_empty());
}

#[test]
fn scenario_c_keeps_one_stack_through_the_boundary() {
    // A fresh thread keeps the whole request well below `MAX_FRAMES`.
    let (response, error) = testing_aids::on_fresh_thread(|| {
        let boundary = Boundary::new(BoundaryOptions::new().name("users"));
        let request = Request::get("/users/503").body(()).unwrap();
        let mut failure = None;

        let response = boundary.handle(&Context::background(), &request, |ctx, request| {
            let result = handler(ctx, request);
            failure = result.as_ref().err().cloned();
            result
        });

        (response, failure)
    });

    let error = error.expect("handler should fail for id 503");
    let attachments = error.layers().filter(|layer| layer.stack().is_some()).count();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error.layers().count(), 3);
    assert_eq!(attachments, 1);
    assert!(error.layers().last().is_some_and(|layer| layer.stack().is_some()));
}

#[test]
fn scenario_d_recovered_panic() {
    let harness = Harness::new();
    let response = harness.get("/users/999");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message(&response), json!("panic: panic 999"));

    let report = &harness.reports()[0];
    assert_eq!(report.tag(), "INTERNAL");
    assert!(report.errctx().is_none());

    // The boundary keeps serving after a panic.
    assert_eq!(harness.get("/users/1").status(), StatusCode::OK);
}

#[test]
fn scenario_e_success_builds_no_chain() {
    let harness = Harness::new();
    let response = harness.get("/users/7");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), "user7@example.com");
    assert!(harness.reports().is_empty());
}
