use tokio::sync::mpsc::UnboundedSender;
use xcel_core::{AppReconciler, AppUpdate, HapticDevice, HapticPulse, ReactionRowView};

/// Stands in for the wrist: every pulse becomes a log line.
pub struct ConsoleHaptics;

impl HapticDevice for ConsoleHaptics {
    fn play(&self, pulse: HapticPulse) {
        tracing::info!(?pulse, "haptic");
    }
}

/// Forwards core updates onto the async side.
pub struct Forwarder {
    pub tx: UnboundedSender<AppUpdate>,
}

impl AppReconciler for Forwarder {
    fn reconcile(&self, update: AppUpdate) {
        let _ = self.tx.send(update);
    }
}

pub fn render_rows(rows: &[ReactionRowView], now_ms: i64) -> String {
    if rows.is_empty() {
        return "  (no reactions yet)".to_string();
    }
    rows.iter()
        .map(|row| {
            let mut line = format!("  {}", row.glyph);
            if !row.quantity_label.is_empty() {
                line.push(' ');
                line.push_str(&row.quantity_label);
            }
            line.push_str("  ");
            line.push_str(&xcel_core::format_row_age(row.last_updated_at_ms, now_ms));
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
