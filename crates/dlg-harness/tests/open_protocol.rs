#![forbid(unsafe_code)]

//! Integration tests: content resolution, pre-open veto, resolver data and
//! the view-ready sequence.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dlg_harness::{Harness, ScriptedContent, ViewReadyMode};
use dlg_stack::{
    CollectionEvent, ContentRef, DialogError, DialogHandle, HookError, ModalEvent, Resolution,
    Verdict,
};
use serde_json::json;

#[test]
fn open_without_content_is_rejected_immediately() {
    let mut h = Harness::new();
    let dialog = h.service().title("Empty");
    let result = h.run_until(dialog.open());
    assert_eq!(result, Err(DialogError::MissingContent { id: dialog.id() }));
    assert!(h.service().is_empty());
    assert_eq!(h.anchor().surface_count(), 0);
}

#[test]
fn loader_resolves_content_lazily() {
    let mut h = Harness::new();
    let content = ScriptedContent::new();
    let loaded = content.as_content();
    let dialog = h
        .service()
        .load_component(move || async move { Ok::<ContentRef, HookError>(loaded) });
    let _completion = dialog.open();
    h.settle();
    assert!(h.surface(&dialog).is_some());
    assert_eq!(content.attach_count(), 1);
}

#[test]
fn loader_failure_surfaces_from_open() {
    let mut h = Harness::new();
    let dialog = h
        .service()
        .load_component(|| async { Err::<ContentRef, _>(HookError::new("chunk missing")) });
    let result = h.run_until(dialog.open());
    assert_eq!(result, Err(DialogError::Loader(HookError::new("chunk missing"))));
    assert!(h.service().is_empty());
}

#[test]
fn pre_open_veto_rejects_without_materializing() {
    let mut h = Harness::new();
    let dialog = h
        .service()
        .component(ScriptedContent::new().as_content())
        .pre_open(|| false);
    let result = h.run_until(dialog.open());
    assert_eq!(result, Ok(ModalEvent::reject()));
    assert_eq!(h.anchor().surface_count(), 0);
    assert!(h.service().is_empty());
    assert!(h.tracker().get().is_none());
}

#[test]
fn pre_open_accepts_async_answers() {
    let mut h = Harness::new();
    let dialog = h
        .service()
        .component(ScriptedContent::new().as_content())
        .pre_open(|| Verdict::from_future(async { Ok::<bool, HookError>(true) }));
    let _completion = dialog.open();
    h.settle();
    assert!(h.surface(&dialog).is_some());
}

#[test]
fn resolver_data_is_bound_with_lowest_precedence() {
    let mut h = Harness::new();
    h.service().set_resolver(Rc::new(|_: &DialogHandle| {
        Resolution::ready(json!({"name": "resolved", "role": "admin"}))
    }));
    let content = ScriptedContent::new();
    let dialog = h
        .service()
        .component(content.as_content())
        .title("User")
        .params(json!({"name": "params"}))
        .additional_params(json!({"role": "viewer", "extra": true}));
    let _completion = dialog.open();
    h.settle();

    let inputs = content.inputs().expect("bound");
    assert_eq!(inputs.title.as_deref(), Some("User"));
    assert_eq!(inputs.get("name"), Some(&json!("params")));
    assert_eq!(inputs.get("role"), Some(&json!("viewer")));
    assert_eq!(inputs.get("extra"), Some(&json!(true)));
    assert_eq!(inputs.resolved, Some(json!({"name": "resolved", "role": "admin"})));
}

#[test]
fn resolver_failure_surfaces_from_open() {
    let mut h = Harness::new();
    h.service().set_resolver(Rc::new(|_: &DialogHandle| {
        Resolution::fail(HookError::new("offline"))
    }));
    let dialog = h.service().component(ScriptedContent::new().as_content());
    let result = h.run_until(dialog.open());
    assert_eq!(result, Err(DialogError::Resolver(HookError::new("offline"))));
    assert!(h.service().is_empty());
}

#[test]
fn opening_twice_is_an_error() {
    let mut h = Harness::new();
    let dialog = h.service().component(ScriptedContent::new().as_content());
    let _first = dialog.open();
    h.settle();
    let second = h.run_until(dialog.open());
    assert_eq!(second, Err(DialogError::AlreadyOpened { id: dialog.id() }));
    assert_eq!(h.anchor().surface_count(), 1);
}

#[test]
fn view_ready_runs_hooks_then_emits_open() {
    let mut h = Harness::new();
    h.anchor().set_view_ready_mode(ViewReadyMode::Manual);
    let opened = Rc::new(RefCell::new(Vec::new()));
    let _sub = {
        let opened = Rc::clone(&opened);
        h.service().subscribe_open(move |id| opened.borrow_mut().push(id))
    };
    let after_init = Rc::new(Cell::new(false));
    let dialog = {
        let after_init = Rc::clone(&after_init);
        h.service()
            .component(ScriptedContent::new().as_content())
            .after_view_init(move |_| after_init.set(true))
    };
    let _completion = dialog.open();
    h.settle();

    let surface = h.surface(&dialog).expect("materialized");
    assert!(dialog.is_active());
    assert!(!after_init.get());
    assert!(opened.borrow().is_empty());
    assert_eq!(dialog.snapshot().left, None);

    surface.fire_view_ready();
    h.settle();
    assert!(after_init.get());
    assert!(dialog.is_view_ready());
    assert_eq!(*opened.borrow(), vec![dialog.id()]);
    assert!(dialog.snapshot().left.is_some());
}

#[test]
fn collection_reports_open_and_close() {
    let mut h = Harness::new();
    let events = Rc::new(RefCell::new(Vec::new()));
    let _sub = {
        let events = Rc::clone(&events);
        h.service().collection().subscribe(move |e| events.borrow_mut().push(*e))
    };
    let closed = Rc::new(RefCell::new(Vec::new()));
    let _close_sub = {
        let closed = Rc::clone(&closed);
        h.service().subscribe_close(move |id| closed.borrow_mut().push(id))
    };
    let dialog = h.service().component(ScriptedContent::new().as_content());
    let _completion = dialog.open();
    h.settle();
    let status = dialog.cancel();
    let _ = h.run_until(status);

    assert_eq!(
        *events.borrow(),
        vec![CollectionEvent::Open(dialog.id()), CollectionEvent::Close(dialog.id())]
    );
    assert_eq!(*closed.borrow(), vec![dialog.id()]);
}

#[test]
fn content_sees_activation_changes() {
    let mut h = Harness::new();
    let first = ScriptedContent::new();
    let a = h.service().component(first.as_content());
    let _ca = a.open();
    h.settle();
    let b = h.service().component(ScriptedContent::new().as_content());
    let _cb = b.open();
    h.settle();

    assert_eq!(first.activations(), vec![true, false]);
    a.activate();
    assert_eq!(first.activations(), vec![true, false, true]);
    assert!(!b.is_active());
}
