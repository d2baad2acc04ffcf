#[derive(uniffi::Enum, Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    // Session
    CreateSession,
    EndSession,

    // Polling
    StartPolling { session_id: String },
    /// One external tick; `now_ms` stamps the batch this tick fetches.
    Tick { now_ms: i64 },
    StopPolling,

    // UI
    DismissAlert,

    // Lifecycle
    ReloadConfig,
}

impl AppAction {
    /// Log tag; ticks are too frequent to log with their payload.
    pub fn tag(&self) -> &'static str {
        match self {
            // Session
            AppAction::CreateSession => "CreateSession",
            AppAction::EndSession => "EndSession",

            // Polling
            AppAction::StartPolling { .. } => "StartPolling",
            AppAction::Tick { .. } => "Tick",
            AppAction::StopPolling => "StopPolling",

            // UI
            AppAction::DismissAlert => "DismissAlert",

            // Lifecycle
            AppAction::ReloadConfig => "ReloadConfig",
        }
    }

    pub fn is_tick(&self) -> bool {
        matches!(self, AppAction::Tick { .. })
    }
}
