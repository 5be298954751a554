// Clang Bridge - safe Rust access to libclang, with optional Python bindings
//
// The core (registry, handle codec, session, queries, visitor) is plain Rust.
// The `python` feature layers a PyO3 extension module on top of it.
// Architecture: libclang objects live in a per-session registry; callers only
// ever hold copyable tokens that are re-validated on every use.

pub mod config;
pub mod constants;
pub mod error;
pub mod handle;
pub mod query;
pub mod registry;
pub mod session;
pub mod visitor;

mod native;

pub use config::{IndexOptions, ParseOptions};
pub use constants::{ChildVisit, CursorKind, Nullability, ParseFlag, TypeKind, VisitOutcome};
pub use error::{BridgeError, Result};
pub use handle::{CursorToken, HandleCodec, TypeToken};
pub use query::{QueryFacade, SourceLocation};
pub use registry::{ResourceId, ResourceKind, ResourceRegistry};
pub use session::{IndexHandle, ParserSession, TranslationUnitHandle};
pub use visitor::{ChildSource, TraversalState, VisitorBridge};

// PyO3 bindings layer
#[cfg(feature = "python")]
pub mod bindings;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Clang Bridge Python module
///
/// Exposes index/translation-unit lifecycle, cursor and type queries,
/// child visitation and the libclang constant tables.
#[cfg(feature = "python")]
#[pymodule]
fn clang_bridge(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    // Lifecycle
    m.add_function(wrap_pyfunction!(bindings::create_index, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::parse_translation_unit, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_translation_unit_cursor, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::dispose, m)?)?;

    // Cursor queries
    m.add_function(wrap_pyfunction!(bindings::get_cursor_kind, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_cursor_spelling, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_cursor_display_name, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_cursor_location, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_cursor_type, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_cursor_raw_comment, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_enum_constant_value, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_typedef_underlying_type, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_cursor_result_type, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_num_arguments, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_argument, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::is_null_cursor, m)?)?;

    // Type queries
    m.add_function(wrap_pyfunction!(bindings::get_type_kind, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_type_spelling, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_type_nullability, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_result_type, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_num_arg_types, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_arg_type, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_canonical_type, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::get_pointee_type, m)?)?;

    m.add_function(wrap_pyfunction!(bindings::visit_children, m)?)?;

    // Add Python classes
    m.add_class::<bindings::PyIndex>()?;
    m.add_class::<bindings::PyTranslationUnit>()?;
    m.add_class::<bindings::PyCursor>()?;
    m.add_class::<bindings::PyClangType>()?;
    m.add_class::<bindings::PySourceLocation>()?;

    bindings::register_exceptions(m)?;

    // Constants
    for (name, value) in constants::EXPORTED.iter() {
        m.add(*name, *value)?;
    }
    m.add("CONSTANTS_VERSION", constants::CONSTANTS_VERSION)?;

    Ok(())
}
