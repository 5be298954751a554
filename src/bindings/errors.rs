// Python exception types for bridge errors
//
// InvalidArgument maps onto the builtin ValueError; everything else gets its
// own exception class so callers can catch stale handles specifically.

use crate::error::BridgeError;
use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyMemoryError, PyValueError};
use pyo3::prelude::*;

create_exception!(
    clang_bridge,
    InvalidHandleError,
    PyException,
    "Token or handle refers to a disposed or foreign translation unit."
);
create_exception!(
    clang_bridge,
    ParseFailedError,
    PyException,
    "libclang returned no translation unit."
);
create_exception!(
    clang_bridge,
    LibraryUnavailableError,
    PyException,
    "No libclang shared library could be loaded."
);

impl From<BridgeError> for PyErr {
    fn from(err: BridgeError) -> PyErr {
        let message = err.to_string();
        match err {
            BridgeError::InvalidArgument(_) => PyValueError::new_err(message),
            BridgeError::InvalidHandle { .. } => InvalidHandleError::new_err(message),
            BridgeError::ParseFailed { .. } => ParseFailedError::new_err(message),
            BridgeError::ResourceExhausted(_) => PyMemoryError::new_err(message),
            BridgeError::LibraryUnavailable(_) => LibraryUnavailableError::new_err(message),
        }
    }
}

/// Register the exception classes on the module
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    m.add("InvalidHandleError", py.get_type::<InvalidHandleError>())?;
    m.add("ParseFailedError", py.get_type::<ParseFailedError>())?;
    m.add("LibraryUnavailableError", py.get_type::<LibraryUnavailableError>())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ResourceKind, ResourceRegistry};

    #[test]
    fn test_bridge_errors_map_to_python_exceptions() {
        let registry = ResourceRegistry::new();
        let id = registry.acquire(ResourceKind::TranslationUnit, || Ok(())).unwrap();

        Python::initialize();
        Python::attach(|py| {
            let err: PyErr = BridgeError::InvalidArgument("bad".into()).into();
            assert!(err.is_instance_of::<PyValueError>(py));

            let err: PyErr = BridgeError::invalid_handle(id, "disposed").into();
            assert!(err.is_instance_of::<InvalidHandleError>(py));

            let err: PyErr = BridgeError::ParseFailed {
                filename: "missing.h".into(),
                code: 1,
            }
            .into();
            assert!(err.is_instance_of::<ParseFailedError>(py));
            assert!(err.to_string().contains("missing.h"));

            let err: PyErr = BridgeError::ResourceExhausted(ResourceKind::Index).into();
            assert!(err.is_instance_of::<PyMemoryError>(py));

            let err: PyErr = BridgeError::LibraryUnavailable("no libclang".into()).into();
            assert!(err.is_instance_of::<LibraryUnavailableError>(py));
        });
    }

    #[test]
    fn test_register_adds_exception_types() {
        Python::initialize();
        Python::attach(|py| {
            let module = PyModule::new(py, "clang_bridge").unwrap();
            register(&module).unwrap();
            for name in ["InvalidHandleError", "ParseFailedError", "LibraryUnavailableError"] {
                assert!(module.hasattr(name).unwrap(), "missing {}", name);
            }
        });
    }
}
