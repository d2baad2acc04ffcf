// Session lifecycle: create on the server, end best effort.

use serde::Deserialize;

use super::fetcher::{api_url, FetchError};
use super::*;

/// Response of `GET /get-session`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedSession {
    pub session_id: String,
    pub link: String,
}

#[derive(Clone, Debug)]
pub struct SessionApi {
    client: reqwest::Client,
    base_url: String,
}

impl SessionApi {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn create_session(&self) -> Result<CreatedSession, FetchError> {
        let resp = self
            .client
            .get(api_url(&self.base_url, "get-session"))
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FetchError::HttpStatus { status });
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn end_session(&self, session_id: &str) -> Result<(), FetchError> {
        let resp = self
            .client
            .get(api_url(&self.base_url, &format!("end-session/{session_id}")))
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FetchError::HttpStatus { status });
        }
        Ok(())
    }
}

impl AppCore {
    pub(super) fn create_session(&mut self) {
        if self.state.busy.creating_session {
            return;
        }
        if !self.network_enabled() {
            self.fail_session_creation("network disabled");
            return;
        }
        self.session_create_token = self.session_create_token.wrapping_add(1);
        let token = self.session_create_token;
        self.state.busy.creating_session = true;
        self.state.alert = None;
        self.emit_busy();

        let api = self.session_api();
        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            let (session, error) = match api.create_session().await {
                Ok(created) => (Some(created), None),
                Err(e) => (None, Some(e.to_string())),
            };
            let _ = tx.send(CoreMsg::Internal(Box::new(
                InternalEvent::SessionCreateResult {
                    token,
                    session,
                    error,
                },
            )));
        });
    }

    pub(super) fn handle_session_create_result(
        &mut self,
        token: u64,
        session: Option<CreatedSession>,
        error: Option<String>,
    ) {
        if token != self.session_create_token || !self.state.busy.creating_session {
            return;
        }
        self.state.busy.creating_session = false;
        match session {
            Some(created) if !created.session_id.trim().is_empty() => {
                tracing::info!(session_id = %created.session_id, "session: created");
                self.state.session = SessionState::Active {
                    session_id: created.session_id.clone(),
                    link: created.link.clone(),
                };
                self.emit_session_created(created.session_id, created.link);
                self.emit_state();
            }
            Some(_) => self.fail_session_creation("server returned an empty session id"),
            None => {
                let error = error.unwrap_or_else(|| "unknown error".into());
                self.fail_session_creation(&error);
            }
        }
    }

    fn fail_session_creation(&mut self, error: &str) {
        tracing::warn!(error, "session: could not start new session");
        self.state.busy.creating_session = false;
        self.state.session = SessionState::Inactive;
        self.state.alert = Some(SESSION_FAILED_ALERT.to_string());
        self.emit_state();
    }

    pub(super) fn end_session(&mut self) {
        self.stop_polling();
        let ended = std::mem::replace(&mut self.state.session, SessionState::Inactive);
        // Invalidate an in-flight create so it cannot resurrect the session.
        self.session_create_token = self.session_create_token.wrapping_add(1);
        self.state.busy.creating_session = false;
        let SessionState::Active { session_id, .. } = ended else {
            self.emit_state();
            return;
        };
        tracing::info!(session_id = %session_id, "session: ending");
        self.emit_state();

        if !self.network_enabled() {
            return;
        }
        let api = self.session_api();
        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            let (ok, error) = match api.end_session(&session_id).await {
                Ok(()) => (true, None),
                Err(e) => (false, Some(e.to_string())),
            };
            let _ = tx.send(CoreMsg::Internal(Box::new(InternalEvent::SessionEnded {
                session_id,
                ok,
                error,
            })));
        });
    }

    pub(super) fn handle_session_ended(
        &mut self,
        session_id: String,
        ok: bool,
        error: Option<String>,
    ) {
        if ok {
            tracing::info!(session_id = %session_id, "session: ended");
        } else {
            tracing::warn!(session_id = %session_id, ?error, "session: could not end session");
        }
    }
}
