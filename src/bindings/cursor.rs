// PyCursor / PyClangType - PyO3 wrappers for cursor and type tokens
//
// Each wrapper carries the token plus the session that can validate it.
// Queries live in api.rs as module functions; these classes only add
// identity, equality and repr.

use crate::handle::{CursorToken, TypeToken};
use crate::query::SourceLocation;
use crate::session::ParserSession;
use pyo3::prelude::*;
use std::rc::Rc;

/// Python-accessible cursor token
///
/// Valid while its translation unit is alive.
#[pyclass(name = "Cursor", unsendable)]
pub struct PyCursor {
    pub(crate) token: CursorToken,
    pub(crate) session: Rc<ParserSession>,
}

impl PyCursor {
    pub fn new(token: CursorToken, session: Rc<ParserSession>) -> Self {
        PyCursor { token, session }
    }

    /// Wrap a cursor derived from this one (same session, same owner)
    pub fn derive(&self, token: CursorToken) -> PyCursor {
        PyCursor::new(token, self.session.clone())
    }

    pub fn derive_type(&self, token: TypeToken) -> PyClangType {
        PyClangType::new(token, self.session.clone())
    }
}

#[pymethods]
impl PyCursor {
    /// Raw libclang cursor kind; readable even after the unit is disposed.
    #[getter]
    fn raw_kind(&self) -> i32 {
        self.token.raw_kind()
    }

    #[getter]
    fn is_valid(&self) -> bool {
        self.session.codec().unwrap_cursor(&self.token).is_ok()
    }

    fn __eq__(&self, other: PyRef<'_, PyCursor>) -> bool {
        self.token == other.token
    }

    fn __repr__(&self) -> String {
        format!("Cursor(kind={}, owner={})", self.token.raw_kind(), self.token.owner())
    }
}

/// Python-accessible type token
#[pyclass(name = "Type", unsendable)]
pub struct PyClangType {
    pub(crate) token: TypeToken,
    pub(crate) session: Rc<ParserSession>,
}

impl PyClangType {
    pub fn new(token: TypeToken, session: Rc<ParserSession>) -> Self {
        PyClangType { token, session }
    }

    pub fn derive(&self, token: TypeToken) -> PyClangType {
        PyClangType::new(token, self.session.clone())
    }
}

#[pymethods]
impl PyClangType {
    #[getter]
    fn raw_kind(&self) -> i32 {
        self.token.raw_kind()
    }

    #[getter]
    fn is_valid(&self) -> bool {
        self.session.codec().unwrap_type(&self.token).is_ok()
    }

    fn __eq__(&self, other: PyRef<'_, PyClangType>) -> bool {
        self.token == other.token
    }

    fn __repr__(&self) -> String {
        format!("Type(kind={}, owner={})", self.token.raw_kind(), self.token.owner())
    }
}

/// Python-accessible source location
///
/// All fields are read-only from Python.
#[pyclass(name = "SourceLocation")]
pub struct PySourceLocation {
    #[pyo3(get)]
    pub file: Option<String>,

    #[pyo3(get)]
    pub line: u32,

    #[pyo3(get)]
    pub column: u32,

    #[pyo3(get)]
    pub offset: u32,
}

impl From<SourceLocation> for PySourceLocation {
    fn from(location: SourceLocation) -> Self {
        PySourceLocation {
            file: location.file,
            line: location.line,
            column: location.column,
            offset: location.offset,
        }
    }
}

#[pymethods]
impl PySourceLocation {
    fn __repr__(&self) -> String {
        format!(
            "SourceLocation(file={:?}, line={}, column={}, offset={})",
            self.file, self.line, self.column, self.offset
        )
    }
}
