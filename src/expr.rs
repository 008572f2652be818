//! Logical expression wrappers
//!
//! `PyExpr` wraps the engine's `Expr` so Python operator syntax builds
//! engine expressions without evaluating anything. `PySortExpr` carries an
//! expression plus sort direction for `DataFrame.sort`.

use datafusion::logical_expr::{Expr, SortExpr};
use pyo3::basic::CompareOp;
use pyo3::prelude::*;

/// An unevaluated engine expression
#[pyclass(name = "Expr", module = "jisr")]
#[derive(Debug, Clone)]
pub struct PyExpr {
    pub(crate) expr: Expr,
}

impl From<Expr> for PyExpr {
    fn from(expr: Expr) -> Self {
        Self { expr }
    }
}

#[pymethods]
impl PyExpr {
    pub fn __repr__(&self) -> String {
        format!("Expr({})", self.expr)
    }

    pub fn __add__(&self, rhs: &PyExpr) -> PyExpr {
        (self.expr.clone() + rhs.expr.clone()).into()
    }

    pub fn __sub__(&self, rhs: &PyExpr) -> PyExpr {
        (self.expr.clone() - rhs.expr.clone()).into()
    }

    pub fn __mul__(&self, rhs: &PyExpr) -> PyExpr {
        (self.expr.clone() * rhs.expr.clone()).into()
    }

    pub fn __truediv__(&self, rhs: &PyExpr) -> PyExpr {
        (self.expr.clone() / rhs.expr.clone()).into()
    }

    pub fn __mod__(&self, rhs: &PyExpr) -> PyExpr {
        (self.expr.clone() % rhs.expr.clone()).into()
    }

    pub fn __and__(&self, rhs: &PyExpr) -> PyExpr {
        self.expr.clone().and(rhs.expr.clone()).into()
    }

    pub fn __or__(&self, rhs: &PyExpr) -> PyExpr {
        self.expr.clone().or(rhs.expr.clone()).into()
    }

    pub fn __invert__(&self) -> PyExpr {
        (!self.expr.clone()).into()
    }

    pub fn __richcmp__(&self, other: &PyExpr, op: CompareOp) -> PyExpr {
        let lhs = self.expr.clone();
        let rhs = other.expr.clone();
        match op {
            CompareOp::Lt => lhs.lt(rhs),
            CompareOp::Le => lhs.lt_eq(rhs),
            CompareOp::Eq => lhs.eq(rhs),
            CompareOp::Ne => lhs.not_eq(rhs),
            CompareOp::Gt => lhs.gt(rhs),
            CompareOp::Ge => lhs.gt_eq(rhs),
        }
        .into()
    }

    /// Rename the expression in the output schema.
    pub fn alias(&self, name: &str) -> PyExpr {
        self.expr.clone().alias(name).into()
    }

    pub fn is_null(&self) -> PyExpr {
        self.expr.clone().is_null().into()
    }

    pub fn is_not_null(&self) -> PyExpr {
        self.expr.clone().is_not_null().into()
    }

    /// Turn the expression into a sort key.
    #[pyo3(signature = (ascending=true, nulls_first=false))]
    pub fn sort(&self, ascending: bool, nulls_first: bool) -> PySortExpr {
        self.expr.clone().sort(ascending, nulls_first).into()
    }
}

/// A sort key for `DataFrame.sort`
#[pyclass(name = "SortExpr", module = "jisr")]
#[derive(Debug, Clone)]
pub struct PySortExpr {
    pub(crate) sort: SortExpr,
}

impl From<SortExpr> for PySortExpr {
    fn from(sort: SortExpr) -> Self {
        Self { sort }
    }
}

#[pymethods]
impl PySortExpr {
    pub fn __repr__(&self) -> String {
        format!("SortExpr({})", self.sort)
    }

    #[getter]
    pub fn ascending(&self) -> bool {
        self.sort.asc
    }

    #[getter]
    pub fn nulls_first(&self) -> bool {
        self.sort.nulls_first
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::prelude::col;

    #[test]
    fn test_arithmetic_builds_engine_expressions() {
        let a: PyExpr = col("a").into();
        let b: PyExpr = col("b").into();
        assert_eq!(a.__add__(&b).expr.to_string(), "a + b");
        assert_eq!(a.__sub__(&b).expr.to_string(), "a - b");
        assert_eq!(a.__mul__(&b).expr.to_string(), "a * b");
        assert_eq!(a.__mod__(&b).expr.to_string(), "a % b");
    }

    #[test]
    fn test_comparison_builds_engine_expressions() {
        let a: PyExpr = col("a").into();
        let b: PyExpr = col("b").into();
        let expr = a.__richcmp__(&b, CompareOp::Lt);
        assert_eq!(expr.expr.to_string(), "a < b");
    }

    #[test]
    fn test_alias_renames_output_column() {
        let a: PyExpr = col("a").into();
        assert_eq!(a.alias("renamed").expr.to_string(), "a AS renamed");
    }

    #[test]
    fn test_sort_carries_direction() {
        let a: PyExpr = col("a").into();
        let sort = a.sort(false, true);
        assert!(!sort.ascending());
        assert!(sort.nulls_first());
    }
}
