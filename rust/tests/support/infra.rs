#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

/// Canned (status, body) pair served by the fake API.
#[derive(Clone, Debug)]
pub struct Canned {
    pub status: u16,
    pub body: String,
}

impl Canned {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

#[derive(Default)]
struct Inner {
    session: Option<Canned>,
    reactions: VecDeque<Canned>,
    reaction_requests: Vec<String>,
    ended: Vec<String>,
}

/// In-process stand-in for the reaction backend (`/get-session`, `/get-reaction/:id`,
/// `/end-session/:id`), served on an ephemeral localhost port.
pub struct TestInfra {
    pub base_url: String,
    inner: Arc<Mutex<Inner>>,
}

impl TestInfra {
    pub fn start_api() -> Self {
        let inner = Arc::new(Mutex::new(Inner::default()));
        let (addr_tx, addr_rx) = std::sync::mpsc::channel();
        let app = Router::new()
            .route("/get-session", get(get_session))
            .route("/get-reaction/:session_id", get(get_reaction))
            .route("/end-session/:session_id", get(end_session))
            .with_state(inner.clone());

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("fake api runtime");
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind fake api");
                addr_tx
                    .send(listener.local_addr().expect("local addr"))
                    .expect("report addr");
                axum::serve(listener, app).await.expect("serve fake api");
            });
        });

        let addr = addr_rx.recv().expect("fake api address");
        Self {
            base_url: format!("http://{addr}"),
            inner,
        }
    }

    pub fn set_session(&self, canned: Canned) {
        self.inner.lock().unwrap().session = Some(canned);
    }

    /// Queued responses are served once each, in order; an empty queue serves `[]`.
    pub fn push_reactions(&self, canned: Canned) {
        self.inner.lock().unwrap().reactions.push_back(canned);
    }

    pub fn reaction_requests(&self) -> Vec<String> {
        self.inner.lock().unwrap().reaction_requests.clone()
    }

    pub fn ended_sessions(&self) -> Vec<String> {
        self.inner.lock().unwrap().ended.clone()
    }
}

/// A localhost URL with nothing listening on it.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe port");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);
    format!("http://{addr}")
}

fn reply(canned: Canned) -> (StatusCode, String) {
    let status = StatusCode::from_u16(canned.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, canned.body)
}

async fn get_session(State(inner): State<Arc<Mutex<Inner>>>) -> (StatusCode, String) {
    let canned = inner.lock().unwrap().session.clone();
    reply(canned.unwrap_or_else(|| Canned::status(503)))
}

async fn get_reaction(
    State(inner): State<Arc<Mutex<Inner>>>,
    Path(session_id): Path<String>,
) -> (StatusCode, String) {
    let canned = {
        let mut g = inner.lock().unwrap();
        g.reaction_requests.push(session_id);
        g.reactions.pop_front()
    };
    reply(canned.unwrap_or_else(|| Canned::ok("[]")))
}

async fn end_session(
    State(inner): State<Arc<Mutex<Inner>>>,
    Path(session_id): Path<String>,
) -> StatusCode {
    inner.lock().unwrap().ended.push(session_id);
    StatusCode::OK
}
