//! Aggregate UDF adapter
//!
//! Wraps a Python class exposing four operations into the engine's
//! accumulator capability:
//! - construction: one Python instance per native accumulator
//! - `update(*values)`: called once per input batch assigned to a partition
//! - `merge(*states)`: combines partial states from parallel partitions
//! - `evaluate()`: called once per group to produce the final scalar
//!
//! The engine owns parallelism and partitioning; this adapter has no
//! visibility into that policy. Because the accumulator's internal state is
//! Python-only and opaque to the engine, `state()` serializes it into the
//! engine's scalar representation at merge boundaries, one `ScalarValue`
//! per declared state field.

use std::any::Any;
use std::sync::Arc;

use arrow::pyarrow::PyArrowType;
use datafusion::arrow::array::ArrayRef;
use datafusion::arrow::datatypes::{DataType, Field, FieldRef};
use datafusion::error::{DataFusionError, Result as DataFusionResult};
use datafusion::logical_expr::function::{AccumulatorArgs, StateFieldsArgs};
use datafusion::logical_expr::{Accumulator, AggregateUDF, AggregateUDFImpl, Signature};
use datafusion::scalar::ScalarValue;
use pyo3::prelude::*;
use pyo3::types::PyTuple;

use crate::errors::JisrError;
use crate::expr::PyExpr;
use crate::marshal;
use crate::udf::volatility_from_str;

/// Engine-side aggregate function backed by a Python accumulator class
#[derive(Debug)]
struct PythonAggregateFn {
    name: String,
    factory: PyObject,
    signature: Signature,
    state_type: Vec<DataType>,
    output_type: DataType,
}

impl AggregateUDFImpl for PythonAggregateFn {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn return_type(&self, _arg_types: &[DataType]) -> DataFusionResult<DataType> {
        Ok(self.output_type.clone())
    }

    fn state_fields(&self, args: StateFieldsArgs) -> DataFusionResult<Vec<FieldRef>> {
        Ok(self
            .state_type
            .iter()
            .enumerate()
            .map(|(i, data_type)| {
                Arc::new(Field::new(
                    format!("{}[{}]", args.name, i),
                    data_type.clone(),
                    true,
                ))
            })
            .collect())
    }

    fn accumulator(
        &self,
        _acc_args: AccumulatorArgs,
    ) -> DataFusionResult<Box<dyn Accumulator>> {
        // One Python instance per native accumulator; instantiation runs
        // arbitrary Python, so it happens under the GIL.
        let accum = Python::with_gil(|py| {
            self.factory.bind(py).call0().map(Bound::unbind)
        })
        .map_err(|err| {
            DataFusionError::Execution(format!(
                "Aggregate UDF '{}' failed to initialize: {err}",
                self.name
            ))
        })?;
        Ok(Box::new(PythonAccumulator {
            name: self.name.clone(),
            accum,
            state_type: self.state_type.clone(),
            output_type: self.output_type.clone(),
        }))
    }
}

/// Native accumulator that forwards to one Python accumulator instance
#[derive(Debug)]
struct PythonAccumulator {
    name: String,
    accum: PyObject,
    state_type: Vec<DataType>,
    output_type: DataType,
}

impl PythonAccumulator {
    fn call_with_arrays(&self, method: &str, arrays: &[ArrayRef]) -> DataFusionResult<()> {
        Python::with_gil(|py| -> Result<(), JisrError> {
            let py_args = arrays
                .iter()
                .map(|array| marshal::array_to_pyarrow(py, array))
                .collect::<Result<Vec<_>, JisrError>>()?;
            let py_args = PyTuple::new(py, py_args).map_err(JisrError::from)?;
            self.accum.bind(py).call_method1(method, py_args)?;
            Ok(())
        })
        .map_err(|err| {
            DataFusionError::Execution(format!(
                "Aggregate UDF '{}' {method} failed: {err}",
                self.name
            ))
        })
    }
}

impl Accumulator for PythonAccumulator {
    fn update_batch(&mut self, values: &[ArrayRef]) -> DataFusionResult<()> {
        self.call_with_arrays("update", values)
    }

    fn merge_batch(&mut self, states: &[ArrayRef]) -> DataFusionResult<()> {
        self.call_with_arrays("merge", states)
    }

    fn state(&mut self) -> DataFusionResult<Vec<ScalarValue>> {
        Python::with_gil(|py| -> Result<Vec<ScalarValue>, JisrError> {
            let state = self.accum.bind(py).call_method0("state")?;
            let mut items = Vec::new();
            for item in state.try_iter()? {
                items.push(item?);
            }
            if items.len() != self.state_type.len() {
                return Err(JisrError::invalid_argument(format!(
                    "accumulator state returned {} value(s) but {} state field(s) are declared",
                    items.len(),
                    self.state_type.len()
                )));
            }
            items
                .iter()
                .zip(&self.state_type)
                .map(|(item, data_type)| marshal::py_to_scalar(item, data_type))
                .collect()
        })
        .map_err(|err| {
            DataFusionError::Execution(format!(
                "Aggregate UDF '{}' state serialization failed: {err}",
                self.name
            ))
        })
    }

    fn evaluate(&mut self) -> DataFusionResult<ScalarValue> {
        Python::with_gil(|py| -> Result<ScalarValue, JisrError> {
            let value = self.accum.bind(py).call_method0("evaluate")?;
            marshal::py_to_scalar(&value, &self.output_type)
        })
        .map_err(|err| {
            DataFusionError::Execution(format!(
                "Aggregate UDF '{}' evaluation failed: {err}",
                self.name
            ))
        })
    }

    fn size(&self) -> usize {
        // The Python-side state is opaque; report only the native footprint.
        std::mem::size_of_val(self)
    }
}

/// Python handle for a registered aggregate UDF
#[pyclass(name = "AggregateUDF", module = "jisr")]
#[derive(Debug, Clone)]
pub struct PyAggregateUDF {
    pub(crate) function: AggregateUDF,
}

impl PyAggregateUDF {
    /// Build the engine UDAF from already-parsed parts.
    pub(crate) fn from_parts(
        name: String,
        factory: PyObject,
        input_types: Vec<DataType>,
        state_type: Vec<DataType>,
        output_type: DataType,
        volatility: &str,
    ) -> Result<Self, JisrError> {
        let volatility = volatility_from_str(volatility)?;
        let function = AggregateUDF::new_from_impl(PythonAggregateFn {
            name,
            factory,
            signature: Signature::exact(input_types, volatility),
            state_type,
            output_type,
        });
        Ok(Self { function })
    }
}

#[pymethods]
impl PyAggregateUDF {
    #[new]
    #[pyo3(signature = (name, accum, output_type, state_type, input_types, volatility="volatile"))]
    pub fn new(
        name: &str,
        accum: PyObject,
        output_type: PyArrowType<DataType>,
        state_type: Vec<PyArrowType<DataType>>,
        input_types: Vec<PyArrowType<DataType>>,
        volatility: &str,
    ) -> PyResult<Self> {
        let input_types = input_types.into_iter().map(|t| t.0).collect();
        let state_type = state_type.into_iter().map(|t| t.0).collect();
        Ok(Self::from_parts(
            name.to_string(),
            accum,
            input_types,
            state_type,
            output_type.0,
            volatility,
        )?)
    }

    /// Apply the UDAF to argument expressions, producing a new expression.
    #[pyo3(signature = (*args))]
    pub fn __call__(&self, args: Vec<PyExpr>) -> PyExpr {
        let args = args.into_iter().map(|arg| arg.expr).collect();
        self.function.call(args).into()
    }

    #[getter]
    pub fn name(&self) -> String {
        self.function.name().to_string()
    }

    pub fn __repr__(&self) -> String {
        format!("AggregateUDF({})", self.function.name())
    }
}
