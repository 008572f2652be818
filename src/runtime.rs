//! Shared tokio runtime for driving engine futures
//!
//! The engine executes plans on its own thread pool with partitioned
//! parallelism. The binding only has to hand futures to a runtime and make
//! sure the GIL is not held while native execution is in flight, so other
//! Python threads keep running.

use std::future::Future;
use std::sync::OnceLock;

use pyo3::Python;
use tokio::runtime::{Builder, Runtime};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Process-wide runtime, created on first use.
pub(crate) fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        Builder::new_multi_thread()
            .enable_all()
            .thread_name("jisr-engine")
            .build()
            .expect("Failed to create tokio runtime")
    })
}

/// Block on an engine future with the GIL released.
///
/// The GIL is re-acquired by the caller's frame once the future resolves;
/// result marshaling back into Python objects happens after this returns.
pub(crate) fn wait_for_future<F>(py: Python<'_>, fut: F) -> F::Output
where
    F: Future + Send,
    F::Output: Send,
{
    py.allow_threads(|| runtime().block_on(fut))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_for_future_returns_value() {
        Python::with_gil(|py| {
            let value = wait_for_future(py, async { 21 * 2 });
            assert_eq!(value, 42);
        });
    }

    #[test]
    fn test_runtime_is_reused() {
        let first = runtime() as *const Runtime;
        let second = runtime() as *const Runtime;
        assert_eq!(first, second);
    }
}
