//! RAII owners for libclang resources.
//!
//! Nothing in here is public outside the crate. Each owner frees its native
//! object in `Drop`, which the registry triggers on dispose.

use crate::config::IndexOptions;
use crate::error::{BridgeError, Result};
use crate::registry::ResourceKind;
use clang_sys::*;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::rc::Rc;
use tracing::debug;

/// Load libclang for the current thread if it is not loaded yet.
///
/// clang-sys keeps the runtime-loaded library per thread, so every thread
/// that creates a session goes through here once.
pub(crate) fn ensure_loaded() -> Result<()> {
    if clang_sys::is_loaded() {
        return Ok(());
    }
    clang_sys::load().map_err(BridgeError::LibraryUnavailable)?;
    debug!("Loaded libclang for thread {:?}", std::thread::current().id());
    Ok(())
}

/// Owned `CXString`, disposed on drop.
pub(crate) struct OwnedString(CXString);

impl OwnedString {
    /// # Safety
    /// `raw` must be a fresh `CXString` returned by libclang and not yet disposed.
    pub(crate) unsafe fn from_raw(raw: CXString) -> Self {
        OwnedString(raw)
    }

    /// Contents, or `None` when libclang returned a null string.
    pub(crate) fn into_option(self) -> Option<String> {
        let data = unsafe { clang_getCString(self.0) };
        if data.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(data) }.to_string_lossy().into_owned())
    }

    pub(crate) fn into_string(self) -> String {
        self.into_option().unwrap_or_default()
    }
}

impl Drop for OwnedString {
    fn drop(&mut self) {
        unsafe { clang_disposeString(self.0) };
    }
}

/// Owner of a `CXIndex`.
///
/// Translation units hold an `Rc` to the index they were parsed with, so the
/// native index outlives every unit created from it even if the host
/// disposes the index handle first.
pub(crate) struct IndexResource {
    raw: CXIndex,
}

impl IndexResource {
    pub(crate) fn create(options: IndexOptions) -> Result<Rc<Self>> {
        let raw = unsafe {
            clang_createIndex(
                options.exclude_declarations_from_pch as _,
                options.display_diagnostics as _,
            )
        };
        if raw.is_null() {
            return Err(BridgeError::ResourceExhausted(ResourceKind::Index));
        }
        Ok(Rc::new(IndexResource { raw }))
    }
}

impl Drop for IndexResource {
    fn drop(&mut self) {
        debug!("clang_disposeIndex({:p})", self.raw);
        unsafe { clang_disposeIndex(self.raw) };
    }
}

/// Owner of a `CXTranslationUnit`.
pub(crate) struct TranslationUnitResource {
    raw: CXTranslationUnit,
    filename: String,
    // Dropped after the unit itself.
    _index: Rc<IndexResource>,
}

impl TranslationUnitResource {
    pub(crate) fn parse(
        index: Rc<IndexResource>,
        filename: &str,
        args: &[String],
        flags: u32,
    ) -> Result<Self> {
        let c_filename = to_c_string(filename, "filename")?;
        let c_args = args
            .iter()
            .map(|arg| to_c_string(arg, "compiler argument"))
            .collect::<Result<Vec<_>>>()?;
        let argv: Vec<*const c_char> = c_args.iter().map(|arg| arg.as_ptr()).collect();

        let mut raw: CXTranslationUnit = ptr::null_mut();
        let code = unsafe {
            clang_parseTranslationUnit2(
                index.raw,
                c_filename.as_ptr(),
                if argv.is_empty() { ptr::null() } else { argv.as_ptr() },
                argv.len() as _,
                ptr::null_mut(),
                0,
                flags as _,
                &mut raw,
            )
        };
        if raw.is_null() {
            return Err(BridgeError::ParseFailed {
                filename: filename.to_string(),
                code,
            });
        }

        debug!("Parsed {} with {} args (flags {:#x})", filename, args.len(), flags);
        Ok(TranslationUnitResource {
            raw,
            filename: filename.to_string(),
            _index: index,
        })
    }

    pub(crate) fn root_cursor(&self) -> CXCursor {
        unsafe { clang_getTranslationUnitCursor(self.raw) }
    }

    pub(crate) fn filename(&self) -> &str {
        &self.filename
    }
}

impl Drop for TranslationUnitResource {
    fn drop(&mut self) {
        debug!("clang_disposeTranslationUnit({})", self.filename);
        unsafe { clang_disposeTranslationUnit(self.raw) };
    }
}

fn to_c_string(value: &str, what: &str) -> Result<CString> {
    CString::new(value)
        .map_err(|_| BridgeError::InvalidArgument(format!("{} contains a NUL byte: {:?}", what, value)))
}
