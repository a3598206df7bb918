use thiserror::Error;

/// Failures that abandon the preprocessing run of one image
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// The loader produced no image, or the image has no pixels
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// A step received a frame from the wrong pipeline stage
    #[error("step '{step}' expected a {expected} frame, got {actual}")]
    UnexpectedFrame {
        step: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
}
