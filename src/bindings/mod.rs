// PyO3 Bindings Module
//
// Python surface for the bridge: handle classes, cursor/type wrappers,
// exception types and the module-level query functions.

mod errors;
mod handles;
mod cursor;
mod api;

// Re-export for lib.rs
pub use errors::{register as register_exceptions, InvalidHandleError, LibraryUnavailableError, ParseFailedError};
pub use handles::{PyIndex, PyTranslationUnit};
pub use cursor::{PyClangType, PyCursor, PySourceLocation};
pub use api::{
    create_index, dispose, get_arg_type, get_argument, get_canonical_type, get_cursor_display_name,
    get_cursor_kind, get_cursor_location, get_cursor_raw_comment, get_cursor_result_type,
    get_cursor_spelling, get_cursor_type, get_enum_constant_value, get_num_arg_types,
    get_num_arguments, get_pointee_type, get_result_type, get_translation_unit_cursor,
    get_type_kind, get_type_nullability, get_type_spelling, get_typedef_underlying_type,
    is_null_cursor, parse_translation_unit, visit_children,
};
