use crate::core::{CreatedSession, PollTicket, RawReactionEvent};
use crate::state::AppState;
use crate::AppAction;

#[derive(uniffi::Enum, Clone, Debug)]
#[allow(clippy::large_enum_variant)] // uniffi enums cannot use Box<T> indirection
pub enum AppUpdate {
    /// Primary update stream: always send a full state snapshot.
    FullState(AppState),
    /// Side-effect update so the UI can show the attendee link once.
    SessionCreated {
        rev: u64,
        session_id: String,
        link: String,
    },
}

impl AppUpdate {
    pub fn rev(&self) -> u64 {
        match self {
            AppUpdate::FullState(s) => s.rev,
            AppUpdate::SessionCreated { rev, .. } => *rev,
        }
    }
}

#[derive(Debug)]
pub enum CoreMsg {
    Action(AppAction),
    Internal(Box<InternalEvent>),
}

#[derive(Debug)]
pub enum InternalEvent {
    // Async results
    SessionCreateResult {
        token: u64,
        session: Option<CreatedSession>,
        error: Option<String>,
    },
    SessionEnded {
        session_id: String,
        ok: bool,
        error: Option<String>,
    },

    // Poll receive path
    ReactionsFetched {
        ticket: PollTicket,
        events: Vec<RawReactionEvent>,
    },
}
