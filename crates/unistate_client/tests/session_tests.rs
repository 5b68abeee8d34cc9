use std::cell::Cell;
use std::sync::{Arc, Mutex};

use serde_json::{Map, json};
use unistate_client::{LinkStatus, Session, SessionConfig, SessionError, SessionHost, Transport};
use unistate_common::state::{ERROR_FIELD, NAME_FIELD, RESULT_VECTOR_FIELD};
use unistate_common::{Action, decode_frame, encode_frame};

// Transport that keeps every frame it is asked to send
#[derive(Clone, Default)]
struct RecordingTransport {
    frames: Arc<Mutex<Vec<String>>>,
}

impl RecordingTransport {
    fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn send_frame(&self, frame: String) -> Result<(), SessionError> {
        self.frames.lock().unwrap().push(frame);
        Ok(())
    }
}

fn open_session() -> (Session, RecordingTransport) {
    let transport = RecordingTransport::default();
    let session = Session::open(&SessionConfig::default(), transport.clone());
    (session, transport)
}

#[test]
fn test_initial_state() {
    let (session, transport) = open_session();
    let state = session.state();

    assert_eq!(state.name(), "");
    assert!(state.result_vector().is_empty());
    assert!(!state.contains(ERROR_FIELD));
    assert_eq!(session.status(), LinkStatus::Open);
    assert!(transport.frames().is_empty());
}

#[test]
fn test_unknown_tag_is_idempotent() {
    let (session, transport) = open_session();
    let notified = Arc::new(Mutex::new(0));
    {
        let notified = Arc::clone(&notified);
        session.subscribe(move |_| *notified.lock().unwrap() += 1);
    }

    let before = session.state();
    session.dispatch(Action::custom("shave", Map::new()));
    session.dispatch(Action::custom("shave", Map::new()));

    assert!(Arc::ptr_eq(&before, &session.state()));
    assert_eq!(*notified.lock().unwrap(), 0);
    assert!(transport.frames().is_empty());
}

#[test]
fn test_assign_is_local_only() {
    let (session, transport) = open_session();

    session.dispatch(Action::assign(NAME_FIELD, "yak"));

    assert_eq!(session.state().name(), "yak");
    assert!(transport.frames().is_empty());
}

#[test]
fn test_forwarded_action_does_not_mutate() {
    let (session, transport) = open_session();
    let action = Action::axpy(3.15, vec![3.0, 7.0], vec![6.0, 28.0]);

    let before = session.state();
    session.dispatch(action.clone());

    assert!(Arc::ptr_eq(&before, &session.state()));
    assert_eq!(transport.frames(), vec![encode_frame(&action)]);
}

#[test]
fn test_configured_tag_is_forwarded() {
    let transport = RecordingTransport::default();
    let config = SessionConfig::default().with_forward_tag("broken");
    let session = Session::open(&config, transport.clone());

    session.dispatch(Action::custom("broken", Map::new()));

    let frames = transport.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(decode_frame(&frames[0]).unwrap().tag(), "broken");
}

#[test]
fn test_round_trip_through_peer() {
    let (session, transport) = open_session();
    let action = Action::axpy(2.0, vec![1.0, 2.0], vec![3.0, 4.0]);

    session.dispatch(action.clone());
    assert_eq!(transport.frames(), vec![encode_frame(&action)]);

    session.receive_frame(r#"{"tag": "assign", "key": "result_vector", "value": [5, 8]}"#);

    assert_eq!(session.state().result_vector(), vec![5.0, 8.0]);
    assert_eq!(transport.frames().len(), 1);
}

#[test]
fn test_peer_reply_matches_evaluate() {
    let (session, transport) = open_session();

    session.dispatch(Action::axpy(2.0, vec![1.0, 2.0], vec![3.0, 4.0]));
    let sent = decode_frame(&transport.frames()[0]).unwrap();
    let Action::Axpy(axpy) = sent else {
        panic!("expected axpy, got {sent:?}");
    };

    // Play the backend's part
    let reply = Action::assign(RESULT_VECTOR_FIELD, axpy.evaluate());
    session.receive_frame(&encode_frame(&reply));

    assert_eq!(session.state().result_vector(), vec![5.0, 8.0]);
}

#[test]
fn test_inbound_error_is_recorded() {
    let (session, _) = open_session();

    session.receive_frame(
        r#"{"tag": "error", "error": "Seems I've made a mistake!", "details": "Traceback"}"#,
    );

    assert_eq!(
        session.state().get(ERROR_FIELD),
        Some(&json!({
            "tag": "error",
            "error": "Seems I've made a mistake!",
            "details": "Traceback"
        }))
    );
    assert_eq!(session.status(), LinkStatus::Open);
}

#[test]
fn test_inbound_error_record_is_stored_as_sent() {
    let records = [
        json!({"tag": "error"}),
        json!({"tag": "error", "error": "x", "details": null}),
        json!({"tag": "error", "error": "boom", "details": {"line": 3}}),
        json!({"tag": "error", "error": 500}),
    ];
    for record in records {
        let (session, _) = open_session();
        session.receive_frame(&record.to_string());
        assert_eq!(session.state().get(ERROR_FIELD), Some(&record));
    }
}

#[test]
fn test_reserved_tags_are_honoured_by_name() {
    let (session, transport) = open_session();

    let axpy = json!({"a": 2, "x": [1], "y": [1]});
    session.dispatch(Action::custom("axpy", axpy.as_object().unwrap().clone()));
    let frames = transport.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(
        decode_frame(&frames[0]).unwrap(),
        Action::axpy(2.0, vec![1.0], vec![1.0])
    );

    let assign = json!({"key": "name", "value": "yak"});
    session.dispatch(Action::custom("assign", assign.as_object().unwrap().clone()));
    assert_eq!(session.state().name(), "yak");
    assert_eq!(transport.frames().len(), 1);
}

#[test]
fn test_malformed_frame_becomes_error() {
    let (session, _) = open_session();

    session.receive_frame("not json");

    let report = session.state().error().unwrap();
    assert_eq!(report.error(), "Malformed frame");
    assert!(report.details().unwrap().contains("not json"));
    assert_eq!(session.status(), LinkStatus::Open);
}

#[test]
fn test_close_is_terminal() {
    let (session, transport) = open_session();

    session.transport_closed("server went away");

    assert_eq!(session.status(), LinkStatus::Closed);
    let report = session.state().error().unwrap();
    assert_eq!(report.error(), "Websocket error");
    assert_eq!(report.details().as_deref(), Some("server went away"));

    session.dispatch(Action::axpy(1.0, vec![1.0], vec![1.0]));
    assert!(transport.frames().is_empty());

    // Local actions still reduce
    session.dispatch(Action::assign(NAME_FIELD, "after"));
    assert_eq!(session.state().name(), "after");
}

#[test]
fn test_host_connects_once() {
    let host = SessionHost::new(SessionConfig::default());
    let connects = Cell::new(0);
    let transport = RecordingTransport::default();

    let connect = |_: &SessionConfig| {
        connects.set(connects.get() + 1);
        Ok::<_, SessionError>(transport.clone())
    };
    let (first_state, first) = host.open_session(connect);
    let (_, second) = host.open_session(connect);

    assert_eq!(connects.get(), 1);
    assert_eq!(first_state.name(), "");

    first.dispatch(Action::assign(NAME_FIELD, "shared"));
    second.dispatch(Action::axpy(1.0, vec![1.0], vec![1.0]));

    assert_eq!(host.session().unwrap().state().name(), "shared");
    assert_eq!(transport.frames().len(), 1);
}

#[test]
fn test_host_failed_connect_yields_closed_session() {
    let host = SessionHost::new(SessionConfig::for_host("bad host"));

    let session = host.open(|config| config.url().map(|_| RecordingTransport::default()));

    assert_eq!(session.status(), LinkStatus::Closed);
    assert_eq!(session.state().error().unwrap().error(), "Websocket error");
}

#[test]
fn test_subscribers_notified_in_order() {
    let (session, _) = open_session();
    let order = Arc::new(Mutex::new(Vec::new()));

    let first = {
        let order = Arc::clone(&order);
        session.subscribe(move |state| order.lock().unwrap().push(format!("a:{}", state.name())))
    };
    {
        let order = Arc::clone(&order);
        session.subscribe(move |state| order.lock().unwrap().push(format!("b:{}", state.name())));
    }

    session.dispatch(Action::assign(NAME_FIELD, "one"));
    first.unsubscribe();
    session.dispatch(Action::assign(NAME_FIELD, "two"));

    assert_eq!(*order.lock().unwrap(), vec!["a:one", "b:one", "b:two"]);
}

#[test]
fn test_listener_can_dispatch() {
    let (session, transport) = open_session();
    {
        let handle = session.dispatcher();
        session.subscribe(move |state| {
            if state.name() == "go" {
                handle.dispatch(Action::axpy(2.0, vec![1.0], vec![0.0]));
            }
        });
    }

    session.dispatch(Action::assign(NAME_FIELD, "go"));

    assert_eq!(transport.frames().len(), 1);
}
