// Haptic playback: pure schedule + fire-and-forget driver.

use std::sync::Arc;
use std::time::Duration;

use xcel_reaction_profiles::{PulseStep, ReactionKind, ReactionRegistry};

use crate::host::{read_slot, SharedHapticDevice};

/// Pulses for `kind` as offsets from the start of playback. Empty when the kind has no pattern.
pub fn schedule(registry: &ReactionRegistry, kind: ReactionKind) -> Vec<PulseStep> {
    registry
        .pattern(kind)
        .map(|p| p.steps.to_vec())
        .unwrap_or_default()
}

#[derive(Clone)]
pub struct HapticPlayer {
    registry: Arc<ReactionRegistry>,
    device: SharedHapticDevice,
    handle: tokio::runtime::Handle,
}

impl HapticPlayer {
    pub fn new(
        registry: Arc<ReactionRegistry>,
        device: SharedHapticDevice,
        handle: tokio::runtime::Handle,
    ) -> Self {
        Self {
            registry,
            device,
            handle,
        }
    }

    /// Spawns the pattern and returns immediately. Overlapping calls each run
    /// to completion; nothing is cancelled or queued.
    pub fn play(&self, kind: ReactionKind) {
        let steps = schedule(&self.registry, kind);
        if steps.is_empty() {
            return;
        }
        let Some(device) = read_slot(&self.device) else {
            tracing::debug!(kind = kind.label(), "haptics: no device attached");
            return;
        };
        tracing::debug!(kind = kind.label(), pulses = steps.len(), "haptics: play");
        self.handle.spawn(async move {
            let started = tokio::time::Instant::now();
            for step in steps {
                tokio::time::sleep_until(started + Duration::from_millis(step.delay_ms)).await;
                device.play(step.pulse.into());
            }
        });
    }
}
