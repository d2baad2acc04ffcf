// Remote reaction fetch: one GET per tick, failures folded into a synthetic event.

use serde::Deserialize;
use xcel_reaction_profiles::ReactionKind;

use crate::state::now_millis;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server returned status {status}")]
    HttpStatus { status: u16 },
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    pub fn synthetic_kind(&self) -> ReactionKind {
        match self {
            FetchError::Transport(_) | FetchError::HttpStatus { .. } => ReactionKind::HttpError,
            FetchError::Decode(_) => ReactionKind::DecodeError,
        }
    }

    /// A failed fetch still yields exactly one event, so the failure shows up as a row.
    pub fn into_synthetic_event(self, session_id: &str) -> RawReactionEvent {
        RawReactionEvent::synthetic(self.synthetic_kind(), session_id)
    }
}

fn transport(e: reqwest::Error) -> FetchError {
    FetchError::Transport(e.to_string())
}

/// One reaction submission as returned by `GET /get-reaction/{session_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawReactionEvent {
    #[serde(rename = "reaction")]
    pub kind_code: i64,
    #[serde(rename = "timeStamp")]
    pub timestamp: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "userSessionId")]
    pub submitter_id: String,
    /// Set only on events the core fabricates for fetch failures.
    #[serde(skip)]
    pub synthetic_kind: Option<ReactionKind>,
}

impl RawReactionEvent {
    pub fn synthetic(kind: ReactionKind, session_id: &str) -> Self {
        Self {
            kind_code: -1,
            timestamp: now_millis().to_string(),
            session_id: session_id.to_string(),
            submitter_id: String::new(),
            synthetic_kind: Some(kind),
        }
    }

    /// Submission time in unix millis; the server sends either RFC 3339 or a millis string.
    pub fn submitted_at_ms(&self) -> Option<i64> {
        let raw = self.timestamp.trim();
        if let Ok(ms) = raw.parse::<i64>() {
            return Some(ms);
        }
        chrono::DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.timestamp_millis())
    }
}

/// Status check plus decode, kept free of I/O so it can be tested directly.
pub fn decode_reaction_batch(status: u16, body: &[u8]) -> Result<Vec<RawReactionEvent>, FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::HttpStatus { status });
    }
    Ok(serde_json::from_slice(body)?)
}

pub(crate) fn api_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

#[derive(Clone, Debug)]
pub struct ReactionFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl ReactionFetcher {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn reactions_url(&self, session_id: &str) -> String {
        api_url(&self.base_url, &format!("get-reaction/{session_id}"))
    }

    /// Never retries; the next tick is the retry.
    pub async fn fetch(&self, session_id: &str) -> Result<Vec<RawReactionEvent>, FetchError> {
        let resp = self
            .client
            .get(self.reactions_url(session_id))
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(transport)?;
        decode_reaction_batch(status, &body)
    }

    /// Infallible variant used by the poll loop.
    pub async fn fetch_batch(&self, session_id: &str) -> Vec<RawReactionEvent> {
        match self.fetch(session_id).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(%e, session_id, "poll: reaction fetch failed");
                vec![e.into_synthetic_event(session_id)]
            }
        }
    }
}
