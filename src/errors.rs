// Error types module
use datafusion::error::DataFusionError;
use pyo3::exceptions::{PyException, PyTypeError, PyValueError};
use pyo3::{create_exception, PyErr};
use thiserror::Error;

create_exception!(
    jisr,
    EngineError,
    PyException,
    "Raised when the native engine reports a plan or execution failure."
);

/// Main error type for the binding layer
#[derive(Error, Debug)]
pub enum JisrError {
    #[error("Engine error: {0}")]
    Engine(#[from] DataFusionError),

    #[error("Type mismatch: expected {expected}, actual {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Python(#[from] PyErr),
}

impl JisrError {
    /// Create a type mismatch error
    pub fn type_mismatch<E: Into<String>, A: Into<String>>(expected: E, actual: A) -> Self {
        JisrError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        JisrError::InvalidArgument(msg.into())
    }
}

impl From<datafusion::arrow::error::ArrowError> for JisrError {
    fn from(err: datafusion::arrow::error::ArrowError) -> Self {
        JisrError::Engine(err.into())
    }
}

impl From<JisrError> for PyErr {
    fn from(err: JisrError) -> PyErr {
        match err {
            // A Python exception that crossed the boundary is re-raised as-is
            // so the caller sees the original exception type and traceback.
            JisrError::Python(err) => err,
            JisrError::Engine(err) => EngineError::new_err(err.to_string()),
            err @ JisrError::TypeMismatch { .. } => PyTypeError::new_err(err.to_string()),
            err @ JisrError::InvalidArgument(_) => PyValueError::new_err(err.to_string()),
        }
    }
}
