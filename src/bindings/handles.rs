// PyIndex / PyTranslationUnit - PyO3 wrappers for session resources
//
// Both are context managers: leaving the `with` block disposes the resource.
// Disposal is idempotent, so an explicit dispose() inside the block is fine.

use super::PyCursor;
use crate::session::{IndexHandle, ParserSession, TranslationUnitHandle};
use pyo3::prelude::*;
use std::rc::Rc;

/// Python-accessible index handle
///
/// Thread-affine: libclang objects stay on the thread that created them.
#[pyclass(name = "Index", unsendable)]
pub struct PyIndex {
    pub(crate) handle: IndexHandle,
    pub(crate) session: Rc<ParserSession>,
}

#[pymethods]
impl PyIndex {
    #[getter]
    fn is_alive(&self) -> bool {
        self.session.is_alive(self.handle)
    }

    /// Release the index. Returns False if it was already disposed.
    fn dispose(&self) -> bool {
        self.session.dispose(self.handle)
    }

    fn __enter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __exit__(
        &self,
        _exc_type: &Bound<'_, PyAny>,
        _exc_value: &Bound<'_, PyAny>,
        _traceback: &Bound<'_, PyAny>,
    ) -> bool {
        self.session.dispose(self.handle);
        false
    }

    fn __repr__(&self) -> String {
        format!("Index(alive={})", self.is_alive())
    }
}

/// Python-accessible translation unit handle
#[pyclass(name = "TranslationUnit", unsendable)]
pub struct PyTranslationUnit {
    pub(crate) handle: TranslationUnitHandle,
    pub(crate) session: Rc<ParserSession>,
}

#[pymethods]
impl PyTranslationUnit {
    #[getter]
    fn is_alive(&self) -> bool {
        self.session.is_alive(self.handle)
    }

    #[getter]
    fn filename(&self) -> PyResult<String> {
        Ok(self.session.translation_unit_filename(self.handle)?)
    }

    /// Root cursor of the translation unit
    fn cursor(&self) -> PyResult<PyCursor> {
        let token = self.session.translation_unit_cursor(self.handle)?;
        Ok(PyCursor::new(token, self.session.clone()))
    }

    /// Release the translation unit. Cursors and types taken from it become
    /// invalid and raise InvalidHandleError on use.
    fn dispose(&self) -> bool {
        self.session.dispose(self.handle)
    }

    fn __enter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __exit__(
        &self,
        _exc_type: &Bound<'_, PyAny>,
        _exc_value: &Bound<'_, PyAny>,
        _traceback: &Bound<'_, PyAny>,
    ) -> bool {
        self.session.dispose(self.handle);
        false
    }

    fn __repr__(&self) -> String {
        match self.session.translation_unit_filename(self.handle) {
            Ok(filename) => format!("TranslationUnit(filename='{}')", filename),
            Err(_) => "TranslationUnit(disposed)".to_string(),
        }
    }
}
