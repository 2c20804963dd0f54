//! Crossover alerts.
//!
//! Delivery is best-effort: a failed notifier is logged and the cycle goes on.
//! `NoCross` events are never delivered.

pub mod telegram;

use thiserror::Error;

use crate::signal::{CrossoverEvent, CrossoverKind};

pub use telegram::TelegramNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier is missing its token (set {env_var})")]
    MissingToken { env_var: String },

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("delivery rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Destination for crossover alerts.
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver one alert. `label` is the human name of the instrument.
    fn notify(&self, event: &CrossoverEvent, label: &str) -> Result<(), NotifyError>;
}

/// Markdown alert text for a crossover, or `None` for `NoCross`.
pub fn format_crossover_message(event: &CrossoverEvent, label: &str) -> Option<String> {
    let (header, direction) = match event.kind {
        CrossoverKind::Upward => ("🚀 *UPWARD CROSS", "above"),
        CrossoverKind::Downward => ("📉 *DOWNWARD CROSS", "below"),
        CrossoverKind::NoCross => return None,
    };
    Some(format!(
        "{header} {label}*\nPrice: ${:.2}\nEMA{} crossed {direction} EMA{}",
        event.price, event.fast_span, event.slow_span
    ))
}

/// Writes alerts to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn notify(&self, event: &CrossoverEvent, label: &str) -> Result<(), NotifyError> {
        if let Some(message) = format_crossover_message(event, label) {
            tracing::info!(symbol = %event.symbol, %message, "crossover alert");
        }
        Ok(())
    }
}

/// Send `event` through every notifier. Returns how many deliveries succeeded.
pub fn dispatch(notifiers: &[Box<dyn Notifier>], event: &CrossoverEvent, label: &str) -> usize {
    if !event.is_cross() {
        return 0;
    }
    notifiers
        .iter()
        .filter(|n| match n.notify(event, label) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    notifier = n.name(),
                    symbol = %event.symbol,
                    error = %err,
                    "crossover alert not delivered"
                );
                false
            }
        })
        .count()
}
