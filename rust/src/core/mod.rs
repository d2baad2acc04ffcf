mod aggregator;
mod config;
mod fetcher;
mod haptics;
mod poll;
mod runtime_session;
mod session;

use std::sync::{Arc, RwLock};
use std::time::Duration;

use flume::Sender;
use xcel_reaction_profiles::ReactionRegistry;

use crate::actions::AppAction;
use crate::host::{SharedHapticDevice, SharedRuntimeSession};
use crate::state::{
    quantity_label, AppState, PollPhase, ReactionRowView, SessionState, SESSION_FAILED_ALERT,
};
use crate::updates::{AppUpdate, CoreMsg, InternalEvent};

pub use aggregator::{MergeOutcome, ReactionAggregator, ReactionRow};
pub use config::{load_app_config, save_app_config, AppConfig};
pub use fetcher::{decode_reaction_batch, FetchError, RawReactionEvent, ReactionFetcher};
pub use haptics::{schedule, HapticPlayer};
pub use poll::{PollTicket, SessionPoller};
pub use runtime_session::{needs_renewal, RuntimeSessionKeeper};
pub use session::{CreatedSession, SessionApi};

pub struct AppCore {
    pub state: AppState,
    rev: u64,

    update_sender: Sender<AppUpdate>,
    core_sender: Sender<CoreMsg>,
    shared_state: Arc<RwLock<AppState>>,

    data_dir: String,
    config: config::AppConfig,
    runtime: tokio::runtime::Runtime,

    // Shared HTTP client (session create/end, reaction polling).
    http_client: reqwest::Client,
    registry: Arc<ReactionRegistry>,

    poller: SessionPoller,
    haptics: HapticPlayer,
    runtime_session: RuntimeSessionKeeper,

    session_create_token: u64,
}

impl AppCore {
    pub fn new(
        update_sender: Sender<AppUpdate>,
        core_sender: Sender<CoreMsg>,
        data_dir: String,
        shared_state: Arc<RwLock<AppState>>,
        haptic_device: SharedHapticDevice,
        runtime_session_host: SharedRuntimeSession,
    ) -> Self {
        let config = config::load_app_config(&data_dir);
        let state = AppState::empty();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .enable_io()
            .build()
            .expect("tokio runtime");

        let registry = Arc::new(ReactionRegistry::standard());
        let http_client = build_http_client(&config);
        let poller = SessionPoller::new(ReactionAggregator::new(
            registry.clone(),
            config.pooling_window_ms(),
        ));
        let haptics = HapticPlayer::new(registry.clone(), haptic_device, runtime.handle().clone());
        let runtime_session = RuntimeSessionKeeper::new(
            runtime_session_host,
            config.runtime_session_refresh_offset_ms(),
        );

        tracing::info!(
            base_url = %config.base_url(),
            pooling_window_ms = config.pooling_window_ms(),
            network = config.network_enabled(),
            "core: config loaded"
        );

        let this = Self {
            state,
            rev: 0,
            update_sender,
            core_sender,
            shared_state,
            data_dir,
            config,
            runtime,
            http_client,
            registry,
            poller,
            haptics,
            runtime_session,
            session_create_token: 0,
        };

        // Ensure FfiApp.state() has an immediately-available snapshot.
        let snapshot = this.state.clone();
        this.commit_state_snapshot(&snapshot);
        this
    }

    fn network_enabled(&self) -> bool {
        self.config.network_enabled()
    }

    fn reaction_fetcher(&self) -> ReactionFetcher {
        ReactionFetcher::new(self.http_client.clone(), self.config.base_url())
    }

    fn session_api(&self) -> SessionApi {
        SessionApi::new(self.http_client.clone(), self.config.base_url())
    }

    fn reload_config(&mut self) {
        self.config = config::load_app_config(&self.data_dir);
        self.http_client = build_http_client(&self.config);
        self.poller
            .aggregator_mut()
            .set_window_ms(self.config.pooling_window_ms());
        self.runtime_session
            .set_refresh_offset_ms(self.config.runtime_session_refresh_offset_ms());
        tracing::info!(base_url = %self.config.base_url(), "core: config reloaded");
    }

    fn next_rev(&mut self) -> u64 {
        self.rev += 1;
        self.state.rev = self.rev;
        self.rev
    }

    fn commit_state_snapshot(&self, snapshot: &AppState) {
        match self.shared_state.write() {
            Ok(mut g) => *g = snapshot.clone(),
            Err(poison) => *poison.into_inner() = snapshot.clone(),
        }
    }

    fn emit_state(&mut self) {
        self.next_rev();
        let snapshot = self.state.clone();
        self.commit_state_snapshot(&snapshot);
        let _ = self.update_sender.send(AppUpdate::FullState(snapshot));
    }

    fn emit_busy(&mut self) {
        // Busy flags are part of AppState; emit a full snapshot like everything else.
        self.emit_state();
    }

    fn emit_session_created(&mut self, session_id: String, link: String) {
        let rev = self.next_rev();
        // Keep snapshot rev in sync with the update stream even though this is a side-effect update.
        let snapshot = self.state.clone();
        self.commit_state_snapshot(&snapshot);
        let _ = self.update_sender.send(AppUpdate::SessionCreated {
            rev,
            session_id,
            link,
        });
    }

    pub fn handle_message(&mut self, msg: CoreMsg) {
        match msg {
            CoreMsg::Action(action) => {
                if action.is_tick() {
                    tracing::trace!(action = action.tag(), "dispatch");
                } else {
                    tracing::info!(action = action.tag(), "dispatch");
                }
                self.handle_action(action);
            }
            CoreMsg::Internal(internal) => self.handle_internal(*internal),
        }
    }

    fn handle_internal(&mut self, internal: InternalEvent) {
        match internal {
            InternalEvent::SessionCreateResult {
                token,
                session,
                error,
            } => self.handle_session_create_result(token, session, error),
            InternalEvent::SessionEnded {
                session_id,
                ok,
                error,
            } => self.handle_session_ended(session_id, ok, error),
            InternalEvent::ReactionsFetched { ticket, events } => {
                self.handle_reactions_fetched(ticket, events)
            }
        }
    }

    fn handle_action(&mut self, action: AppAction) {
        match action {
            // Session
            AppAction::CreateSession => self.create_session(),
            AppAction::EndSession => self.end_session(),

            // Polling
            AppAction::StartPolling { session_id } => self.start_polling(session_id),
            AppAction::Tick { now_ms } => self.handle_tick(now_ms),
            AppAction::StopPolling => self.stop_polling(),

            // UI
            AppAction::DismissAlert => {
                if self.state.alert.take().is_some() {
                    self.emit_state();
                }
            }

            // Lifecycle
            AppAction::ReloadConfig => self.reload_config(),
        }
    }
}

fn build_http_client(config: &config::AppConfig) -> reqwest::Client {
    let timeout = Duration::from_millis(config.request_timeout_ms());
    match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(%e, "core: falling back to default http client");
            reqwest::Client::new()
        }
    }
}
