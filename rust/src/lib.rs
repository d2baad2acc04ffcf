mod actions;
mod core;
mod host;
mod logging;
mod state;
mod updates;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use flume::{Receiver, Sender};

pub use actions::AppAction;
pub use crate::core::{
    decode_reaction_batch, load_app_config, needs_renewal, save_app_config, schedule, AppConfig,
    CreatedSession, FetchError, HapticPlayer, MergeOutcome, PollTicket, RawReactionEvent,
    ReactionAggregator, ReactionFetcher, ReactionRow, RuntimeSessionKeeper, SessionApi,
    SessionPoller,
};
pub use host::{ExtendedRuntimeSession, HapticDevice, HapticPulse};
pub use state::*;
pub use updates::*;
pub use xcel_reaction_profiles::{ReactionKind, ReactionRegistry};

uniffi::setup_scaffolding!();

#[uniffi::export(callback_interface)]
pub trait AppReconciler: Send + Sync + 'static {
    fn reconcile(&self, update: AppUpdate);
}

#[derive(uniffi::Object)]
pub struct FfiApp {
    core_tx: Sender<CoreMsg>,
    update_rx: Receiver<AppUpdate>,
    listening: AtomicBool,
    shared_state: Arc<RwLock<AppState>>,
    haptic_device: host::SharedHapticDevice,
    runtime_session: host::SharedRuntimeSession,
}

#[uniffi::export]
impl FfiApp {
    #[uniffi::constructor]
    pub fn new(data_dir: String) -> Arc<Self> {
        logging::init_logging(&data_dir);
        tracing::info!(data_dir = %data_dir, "FfiApp::new() starting");

        let (update_tx, update_rx) = flume::unbounded();
        let (core_tx, core_rx) = flume::unbounded::<CoreMsg>();
        let shared_state = Arc::new(RwLock::new(AppState::empty()));
        let haptic_device: host::SharedHapticDevice = Arc::new(RwLock::new(None));
        let runtime_session: host::SharedRuntimeSession = Arc::new(RwLock::new(None));

        // Actor loop thread (single threaded "app actor"); every merge happens here.
        let core_tx_for_core = core_tx.clone();
        let shared_for_core = shared_state.clone();
        let haptics_for_core = haptic_device.clone();
        let runtime_session_for_core = runtime_session.clone();
        thread::spawn(move || {
            let mut core = crate::core::AppCore::new(
                update_tx,
                core_tx_for_core,
                data_dir,
                shared_for_core,
                haptics_for_core,
                runtime_session_for_core,
            );
            while let Ok(msg) = core_rx.recv() {
                core.handle_message(msg);
            }
        });

        Arc::new(Self {
            core_tx,
            update_rx,
            listening: AtomicBool::new(false),
            shared_state,
            haptic_device,
            runtime_session,
        })
    }

    pub fn state(&self) -> AppState {
        match self.shared_state.read() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    pub fn dispatch(&self, action: AppAction) {
        // Contract: never block caller.
        let _ = self.core_tx.send(CoreMsg::Action(action));
    }

    pub fn listen_for_updates(&self, reconciler: Box<dyn AppReconciler>) {
        if self
            .listening
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Avoid multiple listeners that would split messages.
            return;
        }

        let rx = self.update_rx.clone();
        thread::spawn(move || {
            while let Ok(update) = rx.recv() {
                reconciler.reconcile(update);
            }
        });
    }

    pub fn set_haptic_device(&self, device: Box<dyn HapticDevice>) {
        let device: Arc<dyn HapticDevice> = Arc::from(device);
        host::write_slot(&self.haptic_device, Some(device));
    }

    pub fn set_extended_runtime_session(&self, session: Box<dyn ExtendedRuntimeSession>) {
        let session: Arc<dyn ExtendedRuntimeSession> = Arc::from(session);
        host::write_slot(&self.runtime_session, Some(session));
    }
}
