use thiserror::Error;

/// Errors raised by the plumbing around the particle field (config files,
/// presets, exports and the relay transport). The engine itself never fails.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("GIF encoding error: {0}")]
    Gif(#[from] gif::EncodingError),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Upstream request failed: {0}")]
    Upstream(String),
}

pub type Result<T> = std::result::Result<T, FieldError>;
