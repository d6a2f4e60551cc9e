// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Stack attachments are captured once per call path.
//!
//! Every test runs on a fresh thread so captured stacks stay well below `MAX_FRAMES` and
//! suffix matching sees the thread entry frames.

#![cfg(not(miri))] // stack walking is not supported under Miri

use std::hint::black_box;
use std::io;
use std::sync::LazyLock;

use faultline::{Fault, Frame, Message, Stack, Tag, WrapErr};
use testing_aids::on_fresh_thread;

static ENTRY_NOT_FOUND: LazyLock<Fault> = LazyLock::new(|| Fault::sentinel("entry not found", ()));

fn attachments(error: &Fault) -> usize {
    error.layers().filter(|layer| layer.stack().is_some()).count()
}

// `black_box` keeps the constructor calls out of tail position in optimized builds, so every
// helper below keeps its own frame.
#[inline(never)]
fn repository() -> Result<(), Fault> {
    let error = Fault::new("error 500", Tag::Internal);
    Err(black_box(error))
}

#[inline(never)]
fn service() -> Result<(), Fault> {
    repository().wrap_err(Message::with_issue("repository", "Failed to get user, please try again!"))
}

#[inline(never)]
fn handler() -> Result<(), Fault> {
    service().wrap_err(Message::new("service"))
}

#[test]
fn wrapping_up_the_same_call_path_keeps_one_stack() {
    let error = on_fresh_thread(|| handler().unwrap_err());

    assert_eq!(error.layers().count(), 3);
    assert_eq!(attachments(&error), 1);
    assert_eq!(error.stacktrace(), error.layers().last().and_then(|layer| layer.stack()));
}

#[test]
fn two_wraps_in_the_same_frame_keep_one_stack() {
    #[inline(never)]
    fn wrap_twice() -> Fault {
        let error = Fault::wrap(io::Error::other("disk"), ());
        let error = Fault::wrap(error, Message::new("first"));
        Fault::wrap(error, Message::new("second"))
    }

    let error = on_fresh_thread(wrap_twice);

    assert_eq!(attachments(&error), 1);
    assert!(!error.stacktrace_text().is_empty());
}

#[test]
fn wrapping_a_sentinel_attaches_its_first_stack() {
    #[inline(never)]
    fn lookup() -> Result<(), Fault> {
        Err::<(), _>(ENTRY_NOT_FOUND.clone()).wrap_err(Tag::NotFound)
    }

    #[inline(never)]
    fn get_user() -> Result<(), Fault> {
        lookup().wrap_err(Message::new("lookup"))
    }

    let error = on_fresh_thread(|| get_user().unwrap_err());

    assert!(error.is(&ENTRY_NOT_FOUND));
    assert_eq!(attachments(&error), 1);
    assert!(error.layers().last().is_some_and(|layer| layer.stack().is_none()));
}

#[test]
fn different_call_path_gets_its_own_stack() {
    let origin = on_fresh_thread(|| repository().unwrap_err());

    let error = on_fresh_thread(move || {
        #[inline(never)]
        fn rewrap(error: Fault) -> Fault {
            Fault::wrap(error, Message::new("elsewhere"))
        }

        rewrap(origin)
    });

    assert_eq!(attachments(&error), 2);
    assert_ne!(
        error.layer().stack(),
        error.layers().last().and_then(|layer| layer.stack())
    );
}

#[test]
fn returning_and_wrapping_in_a_sibling_gets_its_own_stack() {
    #[inline(never)]
    fn sibling(error: Fault) -> Fault {
        Fault::wrap(error, Message::new("sibling"))
    }

    #[inline(never)]
    fn caller() -> Fault {
        let error = repository().unwrap_err();
        black_box(sibling(error))
    }

    let error = on_fresh_thread(caller);
    assert_eq!(attachments(&error), 2);
}

#[test]
fn explicit_stack_is_always_attached() {
    #[inline(never)]
    fn wrap_with_explicit_stack() -> Fault {
        let error = Fault::new("origin", ());
        Fault::wrap(error, Stack::here())
    }

    let error = on_fresh_thread(wrap_with_explicit_stack);
    assert_eq!(attachments(&error), 2);
}

#[test]
fn first_attachment_is_rendered() {
    let error = on_fresh_thread(|| handler().unwrap_err());
    let text = error.stacktrace_text();

    assert!(text.lines().count() > 1);
    assert!(text.contains("repository"), "origin missing from trace:\n{text}");
}

#[test]
fn innermost_frame_is_the_originating_function() {
    let error = on_fresh_thread(|| handler().unwrap_err());
    let frames = error.stacktrace().map(|frames| frames.resolve()).unwrap_or_default();
    let innermost = frames.first().and_then(Frame::function).unwrap_or_default();

    assert!(innermost.ends_with("repository"), "unexpected innermost frame: {innermost}");
}

#[test]
fn wrapping_records_the_wrapping_function() {
    #[inline(never)]
    fn rewrap_here(error: Fault) -> Fault {
        let error = Fault::wrap(error, Message::new("rewrap"));
        black_box(error)
    }

    let origin = on_fresh_thread(|| repository().unwrap_err());
    let error = on_fresh_thread(move || rewrap_here(origin));

    let frames = error.layer().stack().map(|frames| frames.resolve()).unwrap_or_default();
    let innermost = frames.first().and_then(Frame::function).unwrap_or_default();

    assert!(innermost.ends_with("rewrap_here"), "unexpected innermost frame: {innermost}");
}
