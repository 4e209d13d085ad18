pub type MatteResult<T> = Result<T, MatteError>;

/// Errors surfaced by the matting pipeline.
///
/// `Resource` failures (device loss, pipeline creation) are fatal to a pipeline instance.
/// `Asset` and `Input` failures are recoverable: callers see them as reports or as a
/// passthrough frame, never as a dropped frame.
#[derive(thiserror::Error, Debug)]
pub enum MatteError {
    #[error("resource error: {0}")]
    Resource(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("input error: {0}")]
    Input(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MatteError {
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the pipeline that produced this error can keep rendering.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Resource(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
