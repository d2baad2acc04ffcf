use std::sync::{Arc, RwLock};

/// Pulse types the wrist device can play.
#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HapticPulse {
    Notification,
    DirectionUp,
    DirectionDown,
    Success,
    Failure,
    Retry,
    Start,
    Stop,
    Click,
}

impl From<xcel_reaction_profiles::HapticPulse> for HapticPulse {
    fn from(pulse: xcel_reaction_profiles::HapticPulse) -> Self {
        use xcel_reaction_profiles::HapticPulse as P;
        match pulse {
            P::Notification => HapticPulse::Notification,
            P::DirectionUp => HapticPulse::DirectionUp,
            P::DirectionDown => HapticPulse::DirectionDown,
            P::Success => HapticPulse::Success,
            P::Failure => HapticPulse::Failure,
            P::Retry => HapticPulse::Retry,
            P::Start => HapticPulse::Start,
            P::Stop => HapticPulse::Stop,
            P::Click => HapticPulse::Click,
        }
    }
}

/// Implemented by the host platform; plays one pulse immediately.
///
/// Called from runtime worker threads, never from the actor thread.
#[uniffi::export(callback_interface)]
pub trait HapticDevice: Send + Sync + 'static {
    fn play(&self, pulse: HapticPulse);
}

/// The platform's "keep the app running in the background" session.
///
/// The core only starts, invalidates and inspects it; the host owns the real object.
#[uniffi::export(callback_interface)]
pub trait ExtendedRuntimeSession: Send + Sync + 'static {
    fn start(&self);
    fn invalidate(&self);
    /// Unix millis at which the platform will expire the session, if known.
    fn expiration_ms(&self) -> Option<i64>;
    fn is_running(&self) -> bool;
}

pub type SharedHapticDevice = Arc<RwLock<Option<Arc<dyn HapticDevice>>>>;
pub type SharedRuntimeSession = Arc<RwLock<Option<Arc<dyn ExtendedRuntimeSession>>>>;

pub(crate) fn read_slot<T: ?Sized>(slot: &RwLock<Option<Arc<T>>>) -> Option<Arc<T>> {
    match slot.read() {
        Ok(g) => g.clone(),
        Err(poison) => poison.into_inner().clone(),
    }
}

pub(crate) fn write_slot<T: ?Sized>(slot: &RwLock<Option<Arc<T>>>, value: Option<Arc<T>>) {
    match slot.write() {
        Ok(mut g) => *g = value,
        Err(poison) => *poison.into_inner() = value,
    }
}
