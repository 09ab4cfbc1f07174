use thiserror::Error;

/// Errors that abort a run before its first tick.
///
/// Contention refusals and stale lookups during a run are never errors; they
/// are counted or skipped so a multi-decade run cannot fall over mid-flight.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("forecast error: {0}")]
    Forecast(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
