//! Error kinds of the signal core.

use thiserror::Error;

/// Failures surfaced by the resampler, indicator engine and configuration.
///
/// `DataUnavailable` means "no result this cycle": the caller skips the
/// symbol and leaves its crossover state untouched. `InvalidConfiguration`
/// is raised at load time, before any cycle runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SignalError {
    pub fn data(reason: impl Into<String>) -> Self {
        Self::DataUnavailable(reason.into())
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable(_))
    }
}
