//! Error types.
//!
//! Two layers:
//!
//! - [`ModelError`]: the typed failures of the regression core (design matrix
//!   construction, least squares, scoring, selection)
//! - [`AppError`]: what the binary reports, carrying a process exit code

/// Result alias for the regression core.
pub type ModelResult<T> = Result<T, ModelError>;

/// Failures raised by the regression core.
#[derive(Clone, PartialEq)]
pub enum ModelError {
    /// A column is missing, duplicated, or holds a value that is not a finite number.
    Schema(String),
    /// The least-squares solver could not produce a solution for a trial design.
    SingularDesign(String),
    /// Matrix/vector dimensions do not line up.
    Shape { expected: String, actual: String },
    /// Too few rows (or no outcome variance) for the requested criterion.
    DegenerateSample(String),
}

impl ModelError {
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    pub fn singular(message: impl Into<String>) -> Self {
        Self::SingularDesign(message.into())
    }

    pub fn shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::Shape {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateSample(message.into())
    }

    /// Whether the selection loop may recover from this error by skipping the trial.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SingularDesign(_))
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema(msg) => write!(f, "Schema error: {msg}"),
            Self::SingularDesign(msg) => write!(f, "Singular design: {msg}"),
            Self::Shape { expected, actual } => {
                write!(f, "Shape mismatch: expected {expected}, got {actual}")
            }
            Self::DegenerateSample(msg) => write!(f, "Degenerate sample: {msg}"),
        }
    }
}

impl std::fmt::Debug for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ModelError({self})")
    }
}

impl std::error::Error for ModelError {}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        let exit_code = match err {
            ModelError::Schema(_) => 2,
            ModelError::DegenerateSample(_) => 3,
            ModelError::Shape { .. } | ModelError::SingularDesign(_) => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
