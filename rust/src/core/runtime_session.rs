// Keeps the platform's extended runtime session alive for the length of a poll session.

use crate::host::{read_slot, SharedRuntimeSession};

/// True when the session must be torn down and restarted: it is not running, or
/// less than `refresh_offset_ms` remains before it expires.
pub fn needs_renewal(
    expiration_ms: Option<i64>,
    running: bool,
    now_ms: i64,
    refresh_offset_ms: u64,
) -> bool {
    if !running {
        return true;
    }
    match expiration_ms {
        Some(expires_at) => expires_at.saturating_sub(now_ms) < refresh_offset_ms as i64,
        None => false,
    }
}

pub struct RuntimeSessionKeeper {
    host: SharedRuntimeSession,
    refresh_offset_ms: u64,
    active: bool,
    renewals: u64,
}

impl RuntimeSessionKeeper {
    pub fn new(host: SharedRuntimeSession, refresh_offset_ms: u64) -> Self {
        Self {
            host,
            refresh_offset_ms,
            active: false,
            renewals: 0,
        }
    }

    pub fn set_refresh_offset_ms(&mut self, refresh_offset_ms: u64) {
        self.refresh_offset_ms = refresh_offset_ms;
    }

    pub fn renewals(&self) -> u64 {
        self.renewals
    }

    /// Starts a fresh host session. One that is already running is invalidated first.
    pub fn start(&mut self) {
        let was_active = std::mem::replace(&mut self.active, true);
        if let Some(host) = read_slot(&self.host) {
            if was_active {
                tracing::info!("runtime_session: restart");
                host.invalidate();
            } else {
                tracing::info!("runtime_session: start");
            }
            host.start();
        }
    }

    /// Called on every tick while polling. Returns whether the session was restarted.
    pub fn refresh(&mut self, now_ms: i64) -> bool {
        if !self.active {
            return false;
        }
        let Some(host) = read_slot(&self.host) else {
            return false;
        };
        let expiration_ms = host.expiration_ms();
        let running = host.is_running();
        if !needs_renewal(expiration_ms, running, now_ms, self.refresh_offset_ms) {
            return false;
        }
        tracing::info!(?expiration_ms, running, now_ms, "runtime_session: renewing");
        host.invalidate();
        host.start();
        self.renewals = self.renewals.saturating_add(1);
        true
    }

    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(host) = read_slot(&self.host) {
            tracing::info!("runtime_session: invalidate");
            host.invalidate();
        }
    }
}
