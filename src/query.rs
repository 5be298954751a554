//! Read-only structural queries on cursor and type tokens.
//!
//! Every query unwraps its token through the codec first, so a stale token
//! fails with `InvalidHandle` before libclang is touched. Results that are
//! themselves cursors or types inherit the owner of the input token.
//!
//! Wrong-kind inputs are passed through: libclang answers with its own
//! sentinels (`i64::MIN` for enum values, a null cursor, an invalid type).

use crate::constants::Nullability;
use crate::error::Result;
use crate::handle::{CursorToken, HandleCodec, TypeToken};
use crate::native::OwnedString;
use clang_sys::*;
use serde::Serialize;
use std::ptr;

/// Where a cursor starts, after macro expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// `None` for builtins and other cursors without a file
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

#[derive(Clone, Copy)]
pub struct QueryFacade<'r> {
    codec: HandleCodec<'r>,
}

impl<'r> QueryFacade<'r> {
    pub fn new(codec: HandleCodec<'r>) -> Self {
        QueryFacade { codec }
    }

    fn cursor_string<F>(&self, cursor: &CursorToken, f: F) -> Result<OwnedString>
    where
        F: FnOnce(CXCursor) -> CXString,
    {
        let raw = self.codec.unwrap_cursor(cursor)?;
        Ok(unsafe { OwnedString::from_raw(f(raw)) })
    }

    fn derived_type(&self, cursor: &CursorToken, raw: CXType) -> TypeToken {
        self.codec.wrap_type(raw, cursor.owner())
    }

    // Cursor queries

    /// Raw `CXCursorKind`; see `CursorKind::from_raw` for the named subset.
    pub fn cursor_kind(&self, cursor: &CursorToken) -> Result<i32> {
        let raw = self.codec.unwrap_cursor(cursor)?;
        Ok(unsafe { clang_getCursorKind(raw) } as i32)
    }

    /// Identifier text; empty for anonymous declarations.
    pub fn cursor_spelling(&self, cursor: &CursorToken) -> Result<String> {
        Ok(self.cursor_string(cursor, |raw| unsafe { clang_getCursorSpelling(raw) })?.into_string())
    }

    pub fn cursor_display_name(&self, cursor: &CursorToken) -> Result<String> {
        Ok(self.cursor_string(cursor, |raw| unsafe { clang_getCursorDisplayName(raw) })?.into_string())
    }

    pub fn cursor_location(&self, cursor: &CursorToken) -> Result<SourceLocation> {
        let raw = self.codec.unwrap_cursor(cursor)?;
        let mut file: CXFile = ptr::null_mut();
        let (mut line, mut column, mut offset) = (0, 0, 0);
        unsafe {
            let location = clang_getCursorLocation(raw);
            clang_getExpansionLocation(location, &mut file, &mut line, &mut column, &mut offset);
        }
        let file = if file.is_null() {
            None
        } else {
            unsafe { OwnedString::from_raw(clang_getFileName(file)) }.into_option()
        };
        Ok(SourceLocation {
            file,
            line,
            column,
            offset,
        })
    }

    pub fn cursor_type(&self, cursor: &CursorToken) -> Result<TypeToken> {
        let raw = self.codec.unwrap_cursor(cursor)?;
        Ok(self.derived_type(cursor, unsafe { clang_getCursorType(raw) }))
    }

    /// Documentation comment attached to the declaration, if any.
    pub fn cursor_raw_comment(&self, cursor: &CursorToken) -> Result<Option<String>> {
        Ok(self.cursor_string(cursor, |raw| unsafe { clang_Cursor_getRawCommentText(raw) })?.into_option())
    }

    pub fn enum_constant_value(&self, cursor: &CursorToken) -> Result<i64> {
        let raw = self.codec.unwrap_cursor(cursor)?;
        Ok(unsafe { clang_getEnumConstantDeclValue(raw) } as i64)
    }

    pub fn typedef_underlying_type(&self, cursor: &CursorToken) -> Result<TypeToken> {
        let raw = self.codec.unwrap_cursor(cursor)?;
        Ok(self.derived_type(cursor, unsafe { clang_getTypedefDeclUnderlyingType(raw) }))
    }

    pub fn cursor_result_type(&self, cursor: &CursorToken) -> Result<TypeToken> {
        let raw = self.codec.unwrap_cursor(cursor)?;
        Ok(self.derived_type(cursor, unsafe { clang_getCursorResultType(raw) }))
    }

    /// Parameter count, or -1 when the cursor is not function-like.
    pub fn num_arguments(&self, cursor: &CursorToken) -> Result<i32> {
        let raw = self.codec.unwrap_cursor(cursor)?;
        Ok(unsafe { clang_Cursor_getNumArguments(raw) } as i32)
    }

    /// Parameter declaration at `index`; the null cursor when out of range.
    pub fn argument(&self, cursor: &CursorToken, index: u32) -> Result<CursorToken> {
        let raw = self.codec.unwrap_cursor(cursor)?;
        let argument = unsafe { clang_Cursor_getArgument(raw, index as _) };
        Ok(self.codec.wrap_cursor(argument, cursor.owner()))
    }

    pub fn is_null_cursor(&self, cursor: &CursorToken) -> Result<bool> {
        let raw = self.codec.unwrap_cursor(cursor)?;
        Ok(unsafe { clang_Cursor_isNull(raw) } != 0)
    }

    // Type queries

    pub fn type_kind(&self, ty: &TypeToken) -> Result<i32> {
        Ok(self.codec.unwrap_type(ty)?.kind as i32)
    }

    pub fn type_spelling(&self, ty: &TypeToken) -> Result<String> {
        let raw = self.codec.unwrap_type(ty)?;
        Ok(unsafe { OwnedString::from_raw(clang_getTypeSpelling(raw)) }.into_string())
    }

    pub fn type_nullability(&self, ty: &TypeToken) -> Result<Nullability> {
        let raw = self.codec.unwrap_type(ty)?;
        let nullability = unsafe { clang_Type_getNullability(raw) } as i64;
        Ok(nullability_from_raw(nullability))
    }

    /// Return type of a function type.
    pub fn result_type(&self, ty: &TypeToken) -> Result<TypeToken> {
        let raw = self.codec.unwrap_type(ty)?;
        Ok(self.codec.wrap_type(unsafe { clang_getResultType(raw) }, ty.owner()))
    }

    pub fn num_arg_types(&self, ty: &TypeToken) -> Result<i32> {
        let raw = self.codec.unwrap_type(ty)?;
        Ok(unsafe { clang_getNumArgTypes(raw) } as i32)
    }

    /// Parameter type at `index`; an invalid type when out of range.
    pub fn arg_type(&self, ty: &TypeToken, index: u32) -> Result<TypeToken> {
        let raw = self.codec.unwrap_type(ty)?;
        Ok(self.codec.wrap_type(unsafe { clang_getArgType(raw, index as _) }, ty.owner()))
    }

    pub fn canonical_type(&self, ty: &TypeToken) -> Result<TypeToken> {
        let raw = self.codec.unwrap_type(ty)?;
        Ok(self.codec.wrap_type(unsafe { clang_getCanonicalType(raw) }, ty.owner()))
    }

    pub fn pointee_type(&self, ty: &TypeToken) -> Result<TypeToken> {
        let raw = self.codec.unwrap_type(ty)?;
        Ok(self.codec.wrap_type(unsafe { clang_getPointeeType(raw) }, ty.owner()))
    }
}

/// Map a raw `CXTypeNullabilityKind` onto the exported tags.
///
/// `_Nullable_result` (4, libclang 12+) is reported as `Nullable`; anything
/// else unknown is `Invalid`.
fn nullability_from_raw(raw: i64) -> Nullability {
    const NULLABLE_RESULT: i64 = 4;
    match raw {
        NULLABLE_RESULT => Nullability::Nullable,
        _ => Nullability::from_raw(raw).unwrap_or(Nullability::Invalid),
    }
}
