//! Data frame bindings
//!
//! `PyDataFrame` wraps an unexecuted logical plan. Transformations clone
//! the inner plan and return a new handle, so handles behave like
//! immutable values on the Python side. Nothing runs until `collect`,
//! `count`, or `show`.

use std::sync::Arc;

use datafusion::arrow::datatypes::Schema;
use datafusion::arrow::util::pretty::pretty_format_batches;
use datafusion::common::JoinType;
use datafusion::dataframe::DataFrame;
use pyo3::prelude::*;

use crate::errors::JisrError;
use crate::expr::{PyExpr, PySortExpr};
use crate::marshal;
use crate::runtime::wait_for_future;

/// An unexecuted query against an engine session
#[pyclass(name = "DataFrame", module = "jisr")]
#[derive(Clone, Debug)]
pub struct PyDataFrame {
    df: Arc<DataFrame>,
}

impl PyDataFrame {
    pub(crate) fn new(df: DataFrame) -> Self {
        Self { df: Arc::new(df) }
    }

    /// Clone the inner plan; engine transformations consume their input.
    fn plan(&self) -> DataFrame {
        self.df.as_ref().clone()
    }
}

#[pymethods]
impl PyDataFrame {
    /// Project onto the given expressions.
    #[pyo3(signature = (*exprs))]
    pub fn select(&self, exprs: Vec<PyExpr>) -> PyResult<Self> {
        let exprs: Vec<_> = exprs.into_iter().map(|e| e.expr).collect();
        let df = self.plan().select(exprs).map_err(JisrError::from)?;
        Ok(Self::new(df))
    }

    /// Project onto the given columns by name.
    #[pyo3(signature = (*names))]
    pub fn select_columns(&self, names: Vec<String>) -> PyResult<Self> {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let df = self.plan().select_columns(&names).map_err(JisrError::from)?;
        Ok(Self::new(df))
    }

    /// Keep rows for which the predicate is true.
    pub fn filter(&self, predicate: PyExpr) -> PyResult<Self> {
        let df = self.plan().filter(predicate.expr).map_err(JisrError::from)?;
        Ok(Self::new(df))
    }

    /// Group by the given expressions and compute the given aggregates.
    pub fn aggregate(&self, group_by: Vec<PyExpr>, aggs: Vec<PyExpr>) -> PyResult<Self> {
        let group_by = group_by.into_iter().map(|e| e.expr).collect();
        let aggs = aggs.into_iter().map(|e| e.expr).collect();
        let df = self.plan().aggregate(group_by, aggs).map_err(JisrError::from)?;
        Ok(Self::new(df))
    }

    /// Order rows by the given sort keys.
    #[pyo3(signature = (*sort_exprs))]
    pub fn sort(&self, sort_exprs: Vec<PySortExpr>) -> PyResult<Self> {
        let sort_exprs = sort_exprs.into_iter().map(|e| e.sort).collect();
        let df = self.plan().sort(sort_exprs).map_err(JisrError::from)?;
        Ok(Self::new(df))
    }

    /// Keep at most `count` rows.
    pub fn limit(&self, count: usize) -> PyResult<Self> {
        let df = self.plan().limit(0, Some(count)).map_err(JisrError::from)?;
        Ok(Self::new(df))
    }

    /// Join with another data frame on equal column pairs.
    #[pyo3(signature = (right, left_on, right_on, how="inner"))]
    pub fn join(
        &self,
        right: PyDataFrame,
        left_on: Vec<String>,
        right_on: Vec<String>,
        how: &str,
    ) -> PyResult<Self> {
        let join_type = join_type_from_str(how)?;
        let left_on: Vec<&str> = left_on.iter().map(String::as_str).collect();
        let right_on: Vec<&str> = right_on.iter().map(String::as_str).collect();
        let df = self
            .plan()
            .join(right.plan(), join_type, &left_on, &right_on, None)
            .map_err(JisrError::from)?;
        Ok(Self::new(df))
    }

    /// Execute the plan and return the results as pyarrow record batches.
    ///
    /// Execution runs with the GIL released; the batches are converted to
    /// Python objects only after the engine has finished.
    pub fn collect(&self, py: Python<'_>) -> PyResult<Vec<PyObject>> {
        let batches = wait_for_future(py, self.plan().collect()).map_err(JisrError::from)?;
        log::debug!("Collected {} batch(es)", batches.len());
        Ok(marshal::batches_to_pyarrow(py, &batches)?)
    }

    /// Execute the plan and return the number of rows.
    pub fn count(&self, py: Python<'_>) -> PyResult<usize> {
        Ok(wait_for_future(py, self.plan().count()).map_err(JisrError::from)?)
    }

    /// The pyarrow schema of the plan's output.
    pub fn schema(&self, py: Python<'_>) -> PyResult<PyObject> {
        let schema = Schema::from(self.df.schema());
        Ok(marshal::schema_to_pyarrow(py, &schema)?)
    }

    /// Execute the plan and print at most `num` rows.
    #[pyo3(signature = (num=20))]
    pub fn show(&self, py: Python<'_>, num: usize) -> PyResult<()> {
        let df = self.plan().limit(0, Some(num)).map_err(JisrError::from)?;
        let batches = wait_for_future(py, df.collect()).map_err(JisrError::from)?;
        let formatted = pretty_format_batches(&batches).map_err(JisrError::from)?;
        println!("{formatted}");
        Ok(())
    }

    /// Print the logical and physical plans.
    #[pyo3(signature = (verbose=false, analyze=false))]
    pub fn explain(&self, py: Python<'_>, verbose: bool, analyze: bool) -> PyResult<()> {
        let df = self.plan().explain(verbose, analyze).map_err(JisrError::from)?;
        let batches = wait_for_future(py, df.collect()).map_err(JisrError::from)?;
        let formatted = pretty_format_batches(&batches).map_err(JisrError::from)?;
        println!("{formatted}");
        Ok(())
    }

    pub fn __repr__(&self) -> String {
        format!(
            "DataFrame(\n{}\n)",
            self.df.logical_plan().display_indent()
        )
    }
}

fn join_type_from_str(how: &str) -> Result<JoinType, JisrError> {
    match how {
        "inner" => Ok(JoinType::Inner),
        "left" => Ok(JoinType::Left),
        "right" => Ok(JoinType::Right),
        "full" => Ok(JoinType::Full),
        "semi" => Ok(JoinType::LeftSemi),
        "anti" => Ok(JoinType::LeftAnti),
        other => Err(JisrError::invalid_argument(format!(
            "unsupported join type '{other}' (expected inner, left, right, full, semi, or anti)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_type_parsing() {
        assert!(matches!(join_type_from_str("inner").unwrap(), JoinType::Inner));
        assert!(matches!(join_type_from_str("full").unwrap(), JoinType::Full));
        assert!(matches!(
            join_type_from_str("anti").unwrap(),
            JoinType::LeftAnti
        ));
        let err = join_type_from_str("sideways").unwrap_err();
        assert!(err.to_string().contains("sideways"));
    }
}
