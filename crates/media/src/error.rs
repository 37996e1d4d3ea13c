/// Errors raised by image storage backends.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP request to the CDN failed (network, DNS, timeout, etc.).
    #[error("CDN request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The CDN answered with a non-2xx status.
    #[error("CDN returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Media configuration error: {0}")]
    Config(String),
}
