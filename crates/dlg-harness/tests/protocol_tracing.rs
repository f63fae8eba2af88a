//! Structured logging emitted by the open/close protocol.

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use dlg_harness::{Harness, RecordingFocus, ScriptedContent};
use dlg_stack::{CloseOutcome, FocusTarget};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    message: String,
    span: Option<String>,
}

#[derive(Default)]
struct Capture {
    spans: Arc<Mutex<Vec<String>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        self.spans
            .lock()
            .unwrap()
            .push(attrs.metadata().name().to_string());
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.0,
            span: ctx.event_span(event).map(|span| span.name().to_string()),
        });
    }
}

fn with_capture(f: impl FnOnce()) -> (Vec<String>, Vec<CapturedEvent>) {
    let capture = Capture::default();
    let spans = Arc::clone(&capture.spans);
    let events = Arc::clone(&capture.events);
    let subscriber = tracing_subscriber::registry().with(capture);
    tracing::subscriber::with_default(subscriber, f);
    let spans = spans.lock().unwrap().clone();
    let events = events.lock().unwrap().clone();
    (spans, events)
}

fn find<'a>(events: &'a [CapturedEvent], message: &str) -> Option<&'a CapturedEvent> {
    events.iter().find(|e| e.message == message)
}

// ============================================================================
// Spans
// ============================================================================

#[test]
fn open_and_close_run_inside_named_spans() {
    let (spans, events) = with_capture(|| {
        let mut h = Harness::new();
        let dialog = h.service().component(ScriptedContent::new().as_content());
        let completion = dialog.open();
        h.settle();
        let status = dialog.cancel();
        assert_eq!(h.run_until(status), Ok(CloseOutcome::Closed));
        assert!(h.run_until(completion).is_ok());
    });

    for name in ["dialog.open", "tracker.set", "dialog.close"] {
        assert!(spans.iter().any(|s| s == name), "missing span {name}: {spans:?}");
    }
    let destroy = find(&events, "dialog.destroy").expect("destroy event");
    assert_eq!(destroy.level, Level::DEBUG);
    assert_eq!(destroy.span.as_deref(), Some("dialog.close"));
}

// ============================================================================
// Levels
// ============================================================================

#[test]
fn veto_logs_at_debug() {
    let (_, events) = with_capture(|| {
        let mut h = Harness::new();
        let dialog = h
            .service()
            .component(ScriptedContent::denying().as_content());
        let _completion = dialog.open();
        h.settle();
        assert_eq!(h.run_until(dialog.cancel()), Ok(CloseOutcome::Vetoed));
    });

    let veto = find(&events, "close vetoed").expect("veto event");
    assert_eq!(veto.level, Level::DEBUG);
}

#[test]
fn failures_log_at_warn() {
    let (_, events) = with_capture(|| {
        let mut h = Harness::new();
        let dialog = h
            .service()
            .component(ScriptedContent::failing("disk full").as_content());
        let _completion = dialog.open();
        h.settle();
        assert!(h.run_until(dialog.cancel()).is_err());

        let empty = h.service().dialog();
        assert!(h.run_until(empty.open()).is_err());
    });

    for message in ["pre-close hook failed", "dialog.open without content"] {
        let event = find(&events, message).unwrap_or_else(|| panic!("missing {message}"));
        assert_eq!(event.level, Level::WARN);
    }
}

#[test]
fn swallowed_focus_failure_logs_at_debug() {
    let (_, events) = with_capture(|| {
        let mut h = Harness::new();
        let target = Rc::new(RecordingFocus::detached());
        let dialog = h
            .service()
            .component(ScriptedContent::new().as_content())
            .focus_on_close(Rc::clone(&target) as Rc<dyn FocusTarget>);
        let _completion = dialog.open();
        h.settle();
        dialog.destroy(false);
        assert_eq!(target.calls(), 1);
    });

    let event = find(&events, "focus restoration failed").expect("focus event");
    assert_eq!(event.level, Level::DEBUG);
}
