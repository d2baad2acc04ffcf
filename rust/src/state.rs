use std::time::{SystemTime, UNIX_EPOCH};

pub const SESSION_FAILED_ALERT: &str =
    "Oops! Something went wrong... Seems like our servers are down :(";

#[derive(uniffi::Record, Clone, Debug, PartialEq)]
pub struct AppState {
    pub rev: u64,
    pub session: SessionState,
    pub poll: PollPhase,
    /// Display order: newest insertion first.
    pub reactions: Vec<ReactionRowView>,
    pub busy: BusyState,
    /// Terminal alert for a failed session start; cleared by `DismissAlert`.
    pub alert: Option<String>,
    pub runtime_session_renewals: u64,
}

impl AppState {
    pub fn empty() -> Self {
        Self {
            rev: 0,
            session: SessionState::Inactive,
            poll: PollPhase::Idle,
            reactions: vec![],
            busy: BusyState::idle(),
            alert: None,
            runtime_session_renewals: 0,
        }
    }
}

#[derive(uniffi::Enum, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Inactive,
    Active { session_id: String, link: String },
}

impl SessionState {
    pub fn session_id(&self) -> Option<&str> {
        match self {
            SessionState::Inactive => None,
            SessionState::Active { session_id, .. } => Some(session_id),
        }
    }
}

#[derive(uniffi::Enum, Clone, Debug, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Polling { session_id: String },
    Stopped,
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct ReactionRowView {
    /// Stable kind label, e.g. `RAISE_HAND`.
    pub kind: String,
    pub glyph: String,
    pub quantity: u32,
    /// `x3` when more than one reaction was pooled into the row, empty otherwise.
    pub quantity_label: String,
    pub last_updated_at_ms: i64,
}

#[derive(uniffi::Record, Clone, Debug, Default, PartialEq, Eq)]
pub struct BusyState {
    pub creating_session: bool,
}

impl BusyState {
    pub fn idle() -> Self {
        Self::default()
    }
}

pub fn quantity_label(quantity: u32) -> String {
    if quantity > 1 {
        format!("x{quantity}")
    } else {
        String::new()
    }
}

/// Renders an elapsed duration the way the reaction list shows it ("1h 2m 3s",
/// "4m 0s", "9s"); zero hours and zero minutes are omitted.
#[uniffi::export]
pub fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (hours, minutes, secs) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    let mut out = String::new();
    if hours != 0 {
        out.push_str(&format!("{hours}h "));
    }
    if minutes != 0 {
        out.push_str(&format!("{minutes}m "));
    }
    out.push_str(&format!("{secs}s"));
    out
}

/// "… ago" label for a row, relative to `now_ms`.
#[uniffi::export]
pub fn format_row_age(last_updated_at_ms: i64, now_ms: i64) -> String {
    format!(
        "{} ago",
        format_elapsed(now_ms.saturating_sub(last_updated_at_ms) / 1000)
    )
}

#[uniffi::export]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
