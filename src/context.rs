//! Session context bindings
//!
//! This module wraps the engine's `SessionContext` for Python callers:
//! - In-memory tables from pyarrow record batches
//! - Parquet and CSV registration
//! - SQL queries
//! - Scalar and aggregate UDF registration
//!
//! The context is a handle; dropping it on the Python side releases the
//! engine session but never invalidates batches already collected.

use std::collections::HashSet;
use std::sync::Arc;

use datafusion::datasource::MemTable;
use datafusion::execution::context::SessionContext;
use datafusion::prelude::{CsvReadOptions, ParquetReadOptions};
use pyo3::prelude::*;
use pyo3::types::PyList;
use uuid::Uuid;

use crate::config::PySessionConfig;
use crate::dataframe::PyDataFrame;
use crate::errors::JisrError;
use crate::marshal;
use crate::runtime::wait_for_future;
use crate::udf::aggregate::PyAggregateUDF;
use crate::udf::scalar::PyScalarUDF;

/// Engine session handle
#[pyclass(name = "SessionContext", module = "jisr")]
#[derive(Clone)]
pub struct PySessionContext {
    pub(crate) ctx: SessionContext,
}

#[pymethods]
impl PySessionContext {
    #[new]
    #[pyo3(signature = (config=None))]
    pub fn new(config: Option<PySessionConfig>) -> Self {
        let ctx = match config {
            Some(config) => SessionContext::new_with_config(config.config),
            None => SessionContext::new(),
        };
        Self { ctx }
    }

    pub fn session_id(&self) -> String {
        self.ctx.session_id()
    }

    /// Create a data frame from partitions of pyarrow record batches.
    ///
    /// Each inner list becomes one engine partition. The backing table is
    /// registered under `name`, or a generated name when omitted.
    #[pyo3(signature = (partitions, name=None))]
    pub fn create_dataframe(
        &self,
        py: Python<'_>,
        partitions: &Bound<'_, PyList>,
        name: Option<&str>,
    ) -> PyResult<PyDataFrame> {
        let table_name = match name {
            Some(name) => name.to_string(),
            None => format!("dataframe_{}", Uuid::new_v4().simple()),
        };
        self.register_partitions(&table_name, partitions)?;
        self.table(py, &table_name)
    }

    /// Register partitions of pyarrow record batches as a named table.
    pub fn register_record_batches(
        &self,
        name: &str,
        partitions: &Bound<'_, PyList>,
    ) -> PyResult<()> {
        self.register_partitions(name, partitions)
    }

    /// Load a Parquet file or directory as a data frame.
    pub fn read_parquet(&self, py: Python<'_>, path: &str) -> PyResult<PyDataFrame> {
        let df = wait_for_future(py, self.ctx.read_parquet(path, ParquetReadOptions::default()))
            .map_err(JisrError::from)?;
        log::debug!("Opened Parquet source path={path}");
        Ok(PyDataFrame::new(df))
    }

    /// Register a Parquet file or directory as a named table.
    pub fn register_parquet(&self, py: Python<'_>, name: &str, path: &str) -> PyResult<()> {
        wait_for_future(
            py,
            self.ctx
                .register_parquet(name, path, ParquetReadOptions::default()),
        )
        .map_err(JisrError::from)?;
        log::debug!("Registered Parquet table name={name} path={path}");
        Ok(())
    }

    /// Load a CSV file as a data frame.
    #[pyo3(signature = (path, has_header=true, delimiter=","))]
    pub fn read_csv(
        &self,
        py: Python<'_>,
        path: &str,
        has_header: bool,
        delimiter: &str,
    ) -> PyResult<PyDataFrame> {
        let delimiter = single_byte_delimiter(delimiter)?;
        let options = CsvReadOptions::new().has_header(has_header).delimiter(delimiter);
        let df = wait_for_future(py, self.ctx.read_csv(path, options))
            .map_err(JisrError::from)?;
        log::debug!("Opened CSV source path={path}");
        Ok(PyDataFrame::new(df))
    }

    /// Register a CSV file as a named table.
    #[pyo3(signature = (name, path, has_header=true, delimiter=","))]
    pub fn register_csv(
        &self,
        py: Python<'_>,
        name: &str,
        path: &str,
        has_header: bool,
        delimiter: &str,
    ) -> PyResult<()> {
        let delimiter = single_byte_delimiter(delimiter)?;
        let options = CsvReadOptions::new().has_header(has_header).delimiter(delimiter);
        wait_for_future(py, self.ctx.register_csv(name, path, options))
            .map_err(JisrError::from)?;
        log::debug!("Registered CSV table name={name} path={path}");
        Ok(())
    }

    /// Plan a SQL query against the registered tables.
    pub fn sql(&self, py: Python<'_>, query: &str) -> PyResult<PyDataFrame> {
        let df = wait_for_future(py, self.ctx.sql(query)).map_err(JisrError::from)?;
        Ok(PyDataFrame::new(df))
    }

    /// Register a scalar UDF for use in expressions and SQL.
    pub fn register_udf(&self, udf: PyScalarUDF) {
        log::debug!("Registered scalar UDF '{}'", udf.function.name());
        self.ctx.register_udf(udf.function);
    }

    /// Register an aggregate UDF for use in expressions and SQL.
    pub fn register_udaf(&self, udaf: PyAggregateUDF) {
        log::debug!("Registered aggregate UDF '{}'", udaf.function.name());
        self.ctx.register_udaf(udaf.function);
    }

    /// Open a registered table as a data frame.
    pub fn table(&self, py: Python<'_>, name: &str) -> PyResult<PyDataFrame> {
        let df = wait_for_future(py, self.ctx.table(name)).map_err(JisrError::from)?;
        Ok(PyDataFrame::new(df))
    }

    /// Names of every registered table, across all catalogs and schemas.
    pub fn tables(&self) -> HashSet<String> {
        let state = self.ctx.state();
        let catalog_list = state.catalog_list();
        let mut names = HashSet::new();
        for catalog_name in catalog_list.catalog_names() {
            let Some(catalog) = catalog_list.catalog(&catalog_name) else {
                continue;
            };
            for schema_name in catalog.schema_names() {
                if let Some(schema) = catalog.schema(&schema_name) {
                    names.extend(schema.table_names());
                }
            }
        }
        names
    }

    /// Drop a table registration. The table's data is unaffected.
    pub fn deregister_table(&self, name: &str) -> PyResult<()> {
        self.ctx.deregister_table(name).map_err(JisrError::from)?;
        log::debug!("Deregistered table name={name}");
        Ok(())
    }

    pub fn __repr__(&self) -> String {
        format!("SessionContext(session_id={})", self.ctx.session_id())
    }
}

impl PySessionContext {
    fn register_partitions(
        &self,
        name: &str,
        partitions: &Bound<'_, PyList>,
    ) -> PyResult<()> {
        let (schema, partitions) = marshal::partitions_from_pyarrow(partitions)?;
        let partition_count = partitions.len();
        let table = MemTable::try_new(schema, partitions).map_err(JisrError::from)?;
        self.ctx
            .register_table(name, Arc::new(table))
            .map_err(JisrError::from)?;
        log::debug!("Registered in-memory table name={name} partitions={partition_count}");
        Ok(())
    }
}

fn single_byte_delimiter(delimiter: &str) -> Result<u8, JisrError> {
    let bytes = delimiter.as_bytes();
    if bytes.len() != 1 {
        return Err(JisrError::invalid_argument(format!(
            "delimiter must be a single byte, got '{delimiter}'"
        )));
    }
    Ok(bytes[0])
}
