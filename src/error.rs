// =============================================================================
// Error taxonomy
// =============================================================================
//
// `SourceError` covers every way an external data provider can fail.  The
// collector turns it into an absent signal, so it never aborts a run.
// `EngineError` covers the pipeline itself.  Application glue (main, config
// IO) keeps using `anyhow`.

use thiserror::Error;

/// Failure of an external signal source (the "source unavailable" category).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("malformed response: {0}")]
    Malformed(String),

    /// The source is not configured (e.g. missing API key).
    #[error("source disabled: {0}")]
    Disabled(String),
}

/// Failures raised by the scoring pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid price series: {0}")]
    InvalidSeries(String),

    #[error("insufficient history: need {required} points, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("history append failed: {0}")]
    Persistence(String),

    #[error("score unavailable: {0}")]
    ScoreUnavailable(String),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}
