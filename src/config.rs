//! Session configuration bindings
//!
//! Builder-style wrapper over the engine's `SessionConfig`. Every `with_*`
//! call returns a new config, so a base config can be shared and varied.

use datafusion::prelude::SessionConfig;
use pyo3::prelude::*;

/// Engine session configuration
#[pyclass(name = "SessionConfig", module = "jisr")]
#[derive(Debug, Clone, Default)]
pub struct PySessionConfig {
    pub(crate) config: SessionConfig,
}

#[pymethods]
impl PySessionConfig {
    #[new]
    pub fn new() -> Self {
        Self {
            config: SessionConfig::new(),
        }
    }

    /// Expose the `information_schema` virtual tables.
    pub fn with_information_schema(&self, enabled: bool) -> Self {
        Self {
            config: self.config.clone().with_information_schema(enabled),
        }
    }

    pub fn with_default_catalog_and_schema(&self, catalog: &str, schema: &str) -> Self {
        Self {
            config: self
                .config
                .clone()
                .with_default_catalog_and_schema(catalog, schema),
        }
    }

    /// Number of partitions the engine may split execution into.
    pub fn with_target_partitions(&self, target_partitions: usize) -> Self {
        Self {
            config: self
                .config
                .clone()
                .with_target_partitions(target_partitions),
        }
    }

    /// Preferred number of rows per batch during execution.
    pub fn with_batch_size(&self, batch_size: usize) -> Self {
        Self {
            config: self.config.clone().with_batch_size(batch_size),
        }
    }

    pub fn __repr__(&self) -> String {
        let options = self.config.options();
        format!(
            "SessionConfig(target_partitions={}, batch_size={})",
            options.execution.target_partitions, options.execution.batch_size
        )
    }
}
