// API Functions - PyO3-exposed functions for Python
//
// Module-level functions mirroring the bridge's boundary operations. Each
// handle object carries the session that created it, so only create_index
// needs the per-thread default session (`ParserSession::current`).

use super::{PyClangType, PyCursor, PyIndex, PySourceLocation, PyTranslationUnit};
use crate::constants::ChildVisit;
use crate::session::ParserSession;
use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;
use pyo3::types::PyBool;
use tracing::warn;

/// Create a parser index
///
/// Args:
///     exclude_declarations_from_pch (bool): Skip declarations from precompiled headers
///     display_diagnostics (bool): Let libclang print diagnostics to stderr
///
/// Returns:
///     Index: Handle to the new index (a context manager)
///
/// Raises:
///     LibraryUnavailableError: If libclang cannot be loaded
///     MemoryError: If libclang fails to allocate the index
#[pyfunction]
#[pyo3(signature = (exclude_declarations_from_pch=false, display_diagnostics=false))]
pub fn create_index(exclude_declarations_from_pch: bool, display_diagnostics: bool) -> PyResult<PyIndex> {
    let session = ParserSession::current()?;
    let handle = session.create_index(exclude_declarations_from_pch, display_diagnostics)?;
    Ok(PyIndex { handle, session })
}

/// Parse a source file into a translation unit
///
/// Args:
///     index (Index): Index created by create_index()
///     filename (str): Path of the file to parse
///     args (list[str] | None): Compiler arguments, passed verbatim
///     options (int): Bitwise OR of CXTranslationUnit_* flags
///
/// Returns:
///     TranslationUnit: Handle to the parsed unit (a context manager)
///
/// Raises:
///     ParseFailedError: If libclang produced no translation unit
///     InvalidHandleError: If the index was disposed
///     ValueError: If the filename or an argument contains a NUL byte
#[pyfunction]
#[pyo3(signature = (index, filename, args=None, options=0))]
pub fn parse_translation_unit(
    index: PyRef<'_, PyIndex>,
    filename: &str,
    args: Option<Vec<String>>,
    options: u32,
) -> PyResult<PyTranslationUnit> {
    let args = args.unwrap_or_default();
    let handle = index
        .session
        .parse_translation_unit(index.handle, filename, &args, options)?;
    Ok(PyTranslationUnit {
        handle,
        session: index.session.clone(),
    })
}

/// Root cursor of a translation unit
#[pyfunction]
pub fn get_translation_unit_cursor(unit: PyRef<'_, PyTranslationUnit>) -> PyResult<PyCursor> {
    let token = unit.session.translation_unit_cursor(unit.handle)?;
    Ok(PyCursor::new(token, unit.session.clone()))
}

/// Release an Index or TranslationUnit
///
/// Returns:
///     bool: True if this call released the resource, False if it was
///           already disposed
///
/// Raises:
///     TypeError: If handle is neither an Index nor a TranslationUnit
#[pyfunction]
pub fn dispose(handle: &Bound<'_, PyAny>) -> PyResult<bool> {
    if let Ok(index) = handle.extract::<PyRef<'_, PyIndex>>() {
        return Ok(index.session.dispose(index.handle));
    }
    if let Ok(unit) = handle.extract::<PyRef<'_, PyTranslationUnit>>() {
        return Ok(unit.session.dispose(unit.handle));
    }
    Err(PyTypeError::new_err(
        "dispose() expects an Index or a TranslationUnit",
    ))
}

// Cursor queries

#[pyfunction]
pub fn get_cursor_kind(cursor: PyRef<'_, PyCursor>) -> PyResult<i32> {
    Ok(cursor.session.query().cursor_kind(&cursor.token)?)
}

/// Identifier of the cursor; empty string for anonymous declarations
#[pyfunction]
pub fn get_cursor_spelling(cursor: PyRef<'_, PyCursor>) -> PyResult<String> {
    Ok(cursor.session.query().cursor_spelling(&cursor.token)?)
}

#[pyfunction]
pub fn get_cursor_display_name(cursor: PyRef<'_, PyCursor>) -> PyResult<String> {
    Ok(cursor.session.query().cursor_display_name(&cursor.token)?)
}

#[pyfunction]
pub fn get_cursor_location(cursor: PyRef<'_, PyCursor>) -> PyResult<PySourceLocation> {
    Ok(cursor.session.query().cursor_location(&cursor.token)?.into())
}

#[pyfunction]
pub fn get_cursor_type(cursor: PyRef<'_, PyCursor>) -> PyResult<PyClangType> {
    let token = cursor.session.query().cursor_type(&cursor.token)?;
    Ok(cursor.derive_type(token))
}

/// Documentation comment attached to the cursor, or None
#[pyfunction]
pub fn get_cursor_raw_comment(cursor: PyRef<'_, PyCursor>) -> PyResult<Option<String>> {
    Ok(cursor.session.query().cursor_raw_comment(&cursor.token)?)
}

/// Value of an enum constant declaration
///
/// Note:
///     Other cursor kinds are not rejected; libclang answers with the
///     minimum 64-bit integer for them.
#[pyfunction]
pub fn get_enum_constant_value(cursor: PyRef<'_, PyCursor>) -> PyResult<i64> {
    Ok(cursor.session.query().enum_constant_value(&cursor.token)?)
}

#[pyfunction]
pub fn get_typedef_underlying_type(cursor: PyRef<'_, PyCursor>) -> PyResult<PyClangType> {
    let token = cursor.session.query().typedef_underlying_type(&cursor.token)?;
    Ok(cursor.derive_type(token))
}

#[pyfunction]
pub fn get_cursor_result_type(cursor: PyRef<'_, PyCursor>) -> PyResult<PyClangType> {
    let token = cursor.session.query().cursor_result_type(&cursor.token)?;
    Ok(cursor.derive_type(token))
}

/// Number of parameters, or -1 if the cursor is not function-like
#[pyfunction]
pub fn get_num_arguments(cursor: PyRef<'_, PyCursor>) -> PyResult<i32> {
    Ok(cursor.session.query().num_arguments(&cursor.token)?)
}

/// Parameter declaration at index; a null cursor when out of range
#[pyfunction]
pub fn get_argument(cursor: PyRef<'_, PyCursor>, index: u32) -> PyResult<PyCursor> {
    let token = cursor.session.query().argument(&cursor.token, index)?;
    Ok(cursor.derive(token))
}

#[pyfunction]
pub fn is_null_cursor(cursor: PyRef<'_, PyCursor>) -> PyResult<bool> {
    Ok(cursor.session.query().is_null_cursor(&cursor.token)?)
}

// Type queries

#[pyfunction]
pub fn get_type_kind(ty: PyRef<'_, PyClangType>) -> PyResult<i32> {
    Ok(ty.session.query().type_kind(&ty.token)?)
}

#[pyfunction]
pub fn get_type_spelling(ty: PyRef<'_, PyClangType>) -> PyResult<String> {
    Ok(ty.session.query().type_spelling(&ty.token)?)
}

/// One of the CXTypeNullability_* constants
#[pyfunction]
pub fn get_type_nullability(ty: PyRef<'_, PyClangType>) -> PyResult<i32> {
    Ok(ty.session.query().type_nullability(&ty.token)?.as_raw())
}

#[pyfunction]
pub fn get_result_type(ty: PyRef<'_, PyClangType>) -> PyResult<PyClangType> {
    let token = ty.session.query().result_type(&ty.token)?;
    Ok(ty.derive(token))
}

#[pyfunction]
pub fn get_num_arg_types(ty: PyRef<'_, PyClangType>) -> PyResult<i32> {
    Ok(ty.session.query().num_arg_types(&ty.token)?)
}

/// Parameter type at index; a CXType_Invalid type when out of range
#[pyfunction]
pub fn get_arg_type(ty: PyRef<'_, PyClangType>, index: u32) -> PyResult<PyClangType> {
    let token = ty.session.query().arg_type(&ty.token, index)?;
    Ok(ty.derive(token))
}

#[pyfunction]
pub fn get_canonical_type(ty: PyRef<'_, PyClangType>) -> PyResult<PyClangType> {
    let token = ty.session.query().canonical_type(&ty.token)?;
    Ok(ty.derive(token))
}

#[pyfunction]
pub fn get_pointee_type(ty: PyRef<'_, PyClangType>) -> PyResult<PyClangType> {
    let token = ty.session.query().pointee_type(&ty.token)?;
    Ok(ty.derive(token))
}

/// Walk the children of a cursor, calling back into Python for each one
///
/// The callback runs synchronously as callback(child, parent) and returns one
/// of CXChildVisit_Continue, CXChildVisit_Recurse or CXChildVisit_Break. Any
/// other return value (including None) is treated as Continue.
///
/// Args:
///     cursor (Cursor): Cursor whose descendants are visited
///     callback (Callable[[Cursor, Cursor], int]): Per-node visitor
///
/// Returns:
///     int: TRAVERSAL_COMPLETED, or TRAVERSAL_ABORTED if the callback broke off
///
/// Raises:
///     TypeError: If callback is not callable
///     InvalidHandleError: If the cursor's translation unit is disposed,
///                         including by the callback itself mid-traversal
///     Exception: Whatever the callback raised; traversal stops immediately
///
/// Example:
///     >>> def visit(child, parent):
///     ...     print(get_cursor_spelling(child))
///     ...     return CXChildVisit_Recurse
///     >>> visit_children(get_translation_unit_cursor(tu), visit)
#[pyfunction]
pub fn visit_children(
    py: Python<'_>,
    cursor: PyRef<'_, PyCursor>,
    callback: &Bound<'_, PyAny>,
) -> PyResult<i32> {
    if !callback.is_callable() {
        return Err(PyTypeError::new_err("visit_children() callback must be callable"));
    }
    let session = cursor.session.clone();

    let outcome = session.visit_children::<_, PyErr>(cursor.token, |child, parent| {
        let child = Bound::new(py, PyCursor::new(child, session.clone()))?;
        let parent = Bound::new(py, PyCursor::new(parent, session.clone()))?;
        let returned = callback.call1((child, parent))?;
        Ok(visit_code(&returned))
    })?;

    Ok(outcome.as_raw())
}

/// Interpret a visitor's return value; anything but a known int code is Continue
fn visit_code(returned: &Bound<'_, PyAny>) -> ChildVisit {
    if returned.is_none() {
        return ChildVisit::Continue;
    }
    // bool subclasses int, but False must not read as CXChildVisit_Break
    let raw = if returned.is_instance_of::<PyBool>() {
        None
    } else {
        returned.extract::<i64>().ok()
    };
    match raw.and_then(ChildVisit::from_raw) {
        Some(code) => code,
        None => {
            warn!("Visitor returned an unrecognised code ({}); continuing", returned);
            ChildVisit::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::VisitOutcome;
    use pyo3::exceptions::PyKeyError;
    use pyo3::types::PyModule;

    const VISITORS: &std::ffi::CStr = c"
seen = []

def falsy(child, parent):
    seen.append(child)
    return False

def boom(child, parent):
    raise KeyError('stop')
";

    fn with_root<F>(f: F)
    where
        F: FnOnce(Python<'_>, Bound<'_, PyCursor>),
    {
        let session = match ParserSession::current() {
            Ok(session) => session,
            Err(e) => {
                eprintln!("skipping: {}", e);
                return;
            }
        };
        let sample = format!("{}/test_samples/shapes.h", env!("CARGO_MANIFEST_DIR"));
        let index = session.create_index(false, false).unwrap();
        let unit = session
            .parse_translation_unit::<&str>(index, &sample, &[], 0)
            .unwrap();
        let root = session.translation_unit_cursor(unit).unwrap();

        Python::initialize();
        Python::attach(|py| {
            let cursor = Bound::new(py, PyCursor::new(root, session.clone())).unwrap();
            f(py, cursor);
        });

        session.dispose(unit);
        session.dispose(index);
    }

    #[test]
    fn test_visit_code_accepts_only_int_codes() {
        Python::initialize();
        Python::attach(|py| {
            assert_eq!(visit_code(&0i64.into_pyobject(py).unwrap().into_any()), ChildVisit::Break);
            assert_eq!(visit_code(&1i64.into_pyobject(py).unwrap().into_any()), ChildVisit::Continue);
            assert_eq!(visit_code(&2i64.into_pyobject(py).unwrap().into_any()), ChildVisit::Recurse);

            assert_eq!(visit_code(&py.None().into_bound(py)), ChildVisit::Continue);
            assert_eq!(visit_code(&42i64.into_pyobject(py).unwrap().into_any()), ChildVisit::Continue);
            assert_eq!(visit_code(&"recurse".into_pyobject(py).unwrap().into_any()), ChildVisit::Continue);
            assert_eq!(
                visit_code(&false.into_pyobject(py).unwrap().to_owned().into_any()), ChildVisit::Continue
            );
            assert_eq!(
                visit_code(&true.into_pyobject(py).unwrap().to_owned().into_any()), ChildVisit::Continue
            );
        });
    }

    #[test]
    fn test_false_from_callback_does_not_abort() {
        with_root(|py, root| {
            let module = PyModule::from_code(py, VISITORS, c"visitors.py", c"visitors").unwrap();
            let falsy = module.getattr("falsy").unwrap();

            let outcome = visit_children(py, root.borrow(), &falsy).unwrap();
            assert_eq!(outcome, VisitOutcome::Completed.as_raw());

            let seen = module.getattr("seen").unwrap().len().unwrap();
            assert!(seen > 1, "traversal stopped after {} nodes", seen);
        });
    }

    #[test]
    fn test_callback_exception_propagates() {
        with_root(|py, root| {
            let module = PyModule::from_code(py, VISITORS, c"visitors.py", c"visitors").unwrap();
            let boom = module.getattr("boom").unwrap();

            let err = visit_children(py, root.borrow(), &boom).unwrap_err();
            assert!(err.is_instance_of::<PyKeyError>(py));
        });
    }

    #[test]
    fn test_non_callable_callback_is_type_error() {
        with_root(|py, root| {
            let not_callable = 7i64.into_pyobject(py).unwrap().into_any();
            let err = visit_children(py, root.borrow(), &not_callable).unwrap_err();
            assert!(err.is_instance_of::<PyTypeError>(py));
        });
    }
}
