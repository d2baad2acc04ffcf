//! E2E session tests: create, poll, pool reactions, fire haptics, end.
//!
//! Drives `FfiApp` against an in-process fake API. Ticks are dispatched by the test.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::tempdir;
use xcel_core::{
    AppAction, AppReconciler, AppUpdate, ExtendedRuntimeSession, FfiApp, HapticDevice,
    HapticPulse, PollPhase, SessionState, SESSION_FAILED_ALERT,
};

#[path = "support/mod.rs"]
mod support;

use support::{reaction_batch, wait_until, write_config, Canned, TestInfra};

const WAIT: Duration = Duration::from_secs(10);

#[derive(Clone, Default)]
struct RecordingDevice {
    pulses: Arc<Mutex<Vec<HapticPulse>>>,
}

impl HapticDevice for RecordingDevice {
    fn play(&self, pulse: HapticPulse) {
        self.pulses.lock().unwrap().push(pulse);
    }
}

#[derive(Clone)]
struct Collector {
    updates: Arc<Mutex<Vec<AppUpdate>>>,
}

impl AppReconciler for Collector {
    fn reconcile(&self, update: AppUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

fn app_against(infra: &TestInfra) -> (tempfile::TempDir, Arc<FfiApp>) {
    let dir = tempdir().unwrap();
    let data_dir = dir.path().to_string_lossy().to_string();
    write_config(
        &data_dir,
        serde_json::json!({
            "base_url": infra.base_url,
            "request_timeout_ms": 2000,
        }),
    );
    let app = FfiApp::new(data_dir);
    (dir, app)
}

fn rows(app: &FfiApp) -> Vec<(String, u32, i64)> {
    app.state()
        .reactions
        .into_iter()
        .map(|r| (r.kind, r.quantity, r.last_updated_at_ms))
        .collect()
}

fn create_session(app: &FfiApp) -> String {
    app.dispatch(AppAction::CreateSession);
    wait_until("session active", WAIT, || {
        matches!(app.state().session, SessionState::Active { .. })
    });
    app.state().session.session_id().unwrap().to_string()
}

#[test]
fn create_poll_pool_and_end() {
    let infra = TestInfra::start_api();
    infra.set_session(Canned::ok(
        r#"{"session_id":"sess-42","link":"https://haptic-xcel.example/join/sess-42"}"#,
    ));
    let (_dir, app) = app_against(&infra);

    let updates = Arc::new(Mutex::new(Vec::<AppUpdate>::new()));
    app.listen_for_updates(Box::new(Collector {
        updates: updates.clone(),
    }));
    let device = RecordingDevice::default();
    app.set_haptic_device(Box::new(device.clone()));

    let session_id = create_session(&app);
    assert_eq!(session_id, "sess-42");
    wait_until("session created update", WAIT, || {
        updates.lock().unwrap().iter().any(|u| {
            matches!(u, AppUpdate::SessionCreated { link, .. } if link.ends_with("/join/sess-42"))
        })
    });

    app.dispatch(AppAction::StartPolling {
        session_id: session_id.clone(),
    });
    wait_until("polling", WAIT, || {
        app.state().poll
            == PollPhase::Polling {
                session_id: "sess-42".into(),
            }
    });

    // First tick: two raised hands and one confused.
    infra.push_reactions(Canned::ok(reaction_batch("sess-42", &[1, 1, 2])));
    app.dispatch(AppAction::Tick { now_ms: 0 });
    wait_until("first batch merged", WAIT, || app.state().reactions.len() == 2);
    assert_eq!(
        rows(&app),
        vec![
            ("CONFUSED".to_string(), 1, 0),
            ("RAISE_HAND".to_string(), 2, 0),
        ]
    );
    let state = app.state();
    assert_eq!(state.reactions[1].quantity_label, "x2");
    assert_eq!(state.reactions[0].quantity_label, "");
    assert_eq!(state.reactions[0].glyph, "😕");
    assert_eq!(state.reactions[1].glyph, "✋");

    // Both new rows play their two-step pattern.
    wait_until("four pulses", WAIT, || device.pulses.lock().unwrap().len() == 4);
    {
        let pulses = device.pulses.lock().unwrap();
        assert_eq!(
            pulses.iter().filter(|p| **p == HapticPulse::Failure).count(),
            2
        );
        assert_eq!(pulses.iter().filter(|p| **p == HapticPulse::Stop).count(), 2);
    }

    // Second tick inside the pooling window merges without reordering or buzzing.
    infra.push_reactions(Canned::ok(reaction_batch("sess-42", &[1])));
    app.dispatch(AppAction::Tick { now_ms: 2000 });
    wait_until("second batch merged", WAIT, || {
        app.state()
            .reactions
            .iter()
            .any(|r| r.kind == "RAISE_HAND" && r.quantity == 3)
    });
    assert_eq!(
        rows(&app),
        vec![
            ("CONFUSED".to_string(), 1, 0),
            ("RAISE_HAND".to_string(), 3, 0),
        ]
    );
    std::thread::sleep(Duration::from_millis(1500));
    assert_eq!(device.pulses.lock().unwrap().len(), 4);

    // End: server is told, list is cleared, later ticks fetch nothing.
    app.dispatch(AppAction::EndSession);
    wait_until("session ended on server", WAIT, || {
        infra.ended_sessions() == vec!["sess-42".to_string()]
    });
    let state = app.state();
    assert_eq!(state.session, SessionState::Inactive);
    assert_eq!(state.poll, PollPhase::Stopped);
    assert!(state.reactions.is_empty());

    let requests_before = infra.reaction_requests().len();
    app.dispatch(AppAction::Tick { now_ms: 4000 });
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(infra.reaction_requests().len(), requests_before);

    let revs: Vec<u64> = updates.lock().unwrap().iter().map(|u| u.rev()).collect();
    assert!(revs.windows(2).all(|w| w[0] < w[1]), "revs must increase: {revs:?}");
}

#[test]
fn fetch_failures_show_up_as_rows() {
    let infra = TestInfra::start_api();
    let (_dir, app) = app_against(&infra);

    app.dispatch(AppAction::StartPolling {
        session_id: "sess-7".into(),
    });

    infra.push_reactions(Canned::status(500));
    app.dispatch(AppAction::Tick { now_ms: 1_000 });
    wait_until("http error row", WAIT, || app.state().reactions.len() == 1);
    assert_eq!(app.state().reactions[0].kind, "HTTP_ERROR");
    assert_eq!(app.state().reactions[0].glyph, "HTTP ERROR");

    // Outside the pooling window of the first failure.
    infra.push_reactions(Canned::ok("not json"));
    app.dispatch(AppAction::Tick { now_ms: 20_000 });
    wait_until("decode error row", WAIT, || app.state().reactions.len() == 2);
    assert_eq!(
        rows(&app),
        vec![
            ("DECODE_ERROR".to_string(), 1, 20_000),
            ("HTTP_ERROR".to_string(), 1, 1_000),
        ]
    );
    assert_eq!(app.state().reactions[0].glyph, "JSON ERROR");
}

#[test]
fn unknown_codes_pool_into_an_invalid_row() {
    let infra = TestInfra::start_api();
    let (_dir, app) = app_against(&infra);

    app.dispatch(AppAction::StartPolling {
        session_id: "sess-8".into(),
    });
    infra.push_reactions(Canned::ok(reaction_batch("sess-8", &[9, 0, 3])));
    app.dispatch(AppAction::Tick { now_ms: 500 });
    wait_until("batch merged", WAIT, || app.state().reactions.len() == 2);
    assert_eq!(
        rows(&app),
        vec![
            ("INTERESTING".to_string(), 1, 500),
            ("INVALID".to_string(), 2, 500),
        ]
    );
    assert_eq!(app.state().reactions[1].glyph, "INVALID REACTION");
}

#[test]
fn failed_session_start_raises_an_alert() {
    // No canned session: the fake API answers 503.
    let infra = TestInfra::start_api();
    let (_dir, app) = app_against(&infra);

    app.dispatch(AppAction::CreateSession);
    wait_until("alert shown", WAIT, || app.state().alert.is_some());
    let state = app.state();
    assert_eq!(state.alert.as_deref(), Some(SESSION_FAILED_ALERT));
    assert_eq!(state.session, SessionState::Inactive);
    assert!(!state.busy.creating_session);

    app.dispatch(AppAction::DismissAlert);
    wait_until("alert dismissed", WAIT, || app.state().alert.is_none());
}

#[test]
fn empty_session_id_is_a_failed_start() {
    let infra = TestInfra::start_api();
    infra.set_session(Canned::ok(r#"{"session_id":"  ","link":""}"#));
    let (_dir, app) = app_against(&infra);

    app.dispatch(AppAction::CreateSession);
    wait_until("alert shown", WAIT, || app.state().alert.is_some());
    assert_eq!(app.state().session, SessionState::Inactive);
}

#[derive(Clone, Default)]
struct FakeRuntimeSession {
    calls: Arc<Mutex<Vec<&'static str>>>,
    expires_at: Arc<Mutex<Option<i64>>>,
}

impl ExtendedRuntimeSession for FakeRuntimeSession {
    fn start(&self) {
        self.calls.lock().unwrap().push("start");
    }

    fn invalidate(&self) {
        self.calls.lock().unwrap().push("invalidate");
    }

    fn expiration_ms(&self) -> Option<i64> {
        *self.expires_at.lock().unwrap()
    }

    fn is_running(&self) -> bool {
        true
    }
}

#[test]
fn runtime_session_follows_polling_and_renews_near_expiry() {
    let dir = tempdir().unwrap();
    let data_dir = dir.path().to_string_lossy().to_string();
    write_config(
        &data_dir,
        serde_json::json!({
            "disable_network": true,
            "runtime_session_refresh_offset_ms": 60_000,
        }),
    );
    let app = FfiApp::new(data_dir);
    let session = FakeRuntimeSession::default();
    *session.expires_at.lock().unwrap() = Some(1_000_000);
    app.set_extended_runtime_session(Box::new(session.clone()));

    app.dispatch(AppAction::StartPolling {
        session_id: "offline".into(),
    });
    wait_until("runtime session started", WAIT, || {
        *session.calls.lock().unwrap() == vec!["start"]
    });

    // Plenty of time left: no renewal.
    app.dispatch(AppAction::Tick { now_ms: 100_000 });
    // Under a minute left: invalidate and restart.
    app.dispatch(AppAction::Tick { now_ms: 950_000 });
    wait_until("renewal counted", WAIT, || {
        app.state().runtime_session_renewals == 1
    });
    assert_eq!(
        *session.calls.lock().unwrap(),
        vec!["start", "invalidate", "start"]
    );
    assert!(app.state().reactions.is_empty());

    app.dispatch(AppAction::StopPolling);
    wait_until("stopped", WAIT, || app.state().poll == PollPhase::Stopped);
    assert_eq!(
        *session.calls.lock().unwrap(),
        vec!["start", "invalidate", "start", "invalidate"]
    );
}
