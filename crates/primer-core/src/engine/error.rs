use super::config::ConfigError;
use crate::core::diagnostics::AllocationError;
use thiserror::Error;

/// Failures that abort a whole design call.
///
/// Problems with one sequence are not errors at this level: they are written to
/// the result's per-sequence error buffer instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Out of memory while recording diagnostics: {source}")]
    Allocation {
        #[from]
        source: AllocationError,
    },
}
