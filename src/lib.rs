// Jisr: Python bindings for the DataFusion columnar query engine
//
// This crate is a translation shim. Python calls become logical-plan
// construction calls on the engine, columnar data crosses the boundary as
// pyarrow record batches, and Python callables run inside native query
// execution as scalar or aggregate UDFs. Plan optimization, physical
// execution, and file I/O all live in the `datafusion` dependency.

pub mod config;
pub mod context;
pub mod dataframe;
pub mod errors;
pub mod expr;
pub mod functions;
pub mod marshal;
pub mod runtime;
pub mod udf;

pub use config::PySessionConfig;
pub use context::PySessionContext;
pub use dataframe::PyDataFrame;
pub use errors::{EngineError, JisrError};
pub use expr::{PyExpr, PySortExpr};
pub use udf::aggregate::PyAggregateUDF;
pub use udf::scalar::PyScalarUDF;

use pyo3::prelude::*;

/// Python module entry point.
#[pymodule]
fn jisr(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySessionConfig>()?;
    m.add_class::<PySessionContext>()?;
    m.add_class::<PyDataFrame>()?;
    m.add_class::<PyExpr>()?;
    m.add_class::<PySortExpr>()?;
    m.add_class::<PyScalarUDF>()?;
    m.add_class::<PyAggregateUDF>()?;
    m.add("EngineError", m.py().get_type::<EngineError>())?;
    functions::register(m)?;
    Ok(())
}
