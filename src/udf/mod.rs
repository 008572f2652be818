//! User-defined function adapters
//!
//! This module bridges Python callables into native expression evaluation:
//! - `scalar`: a Python function of (array, ...) -> array as a scalar UDF
//! - `aggregate`: a Python accumulator class as an aggregate UDF
//!
//! Both adapters acquire the GIL for exactly the duration of a Python call
//! and release it before handing control back to the engine. Python code is
//! never assumed reentrant-safe against native threads.

pub mod aggregate;
pub mod scalar;

use datafusion::logical_expr::Volatility;

use crate::errors::JisrError;

/// Parse a caller-declared volatility string.
pub(crate) fn volatility_from_str(value: &str) -> Result<Volatility, JisrError> {
    match value {
        "immutable" => Ok(Volatility::Immutable),
        "stable" => Ok(Volatility::Stable),
        "volatile" => Ok(Volatility::Volatile),
        other => Err(JisrError::invalid_argument(format!(
            "unsupported volatility '{other}' (expected immutable, stable, or volatile)"
        ))),
    }
}
