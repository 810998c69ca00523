use thiserror::Error;

/// Top-level error type shared by the Argot crates.
#[derive(Debug, Error)]
pub enum ArgotError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("content probe failed for {url}: {message}")]
    Probe { url: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
