use thiserror::Error;

/// Errors returned by embedding extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The image decoded fine but contained no detectable face.
    #[error("extract: no face detected")]
    NoFaceDetected,

    #[error("extract: unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("extract: model error: {0}")]
    Model(String),
}
