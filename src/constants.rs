//! Constant registry
//!
//! Every numeric tag that crosses the boundary is defined once here, with the
//! same numbering libclang uses, so consumers can pattern-match on the raw
//! integers returned by queries. `EXPORTED` is the flat table handed to the
//! host; bump `CONSTANTS_VERSION` whenever an entry is added or changed.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const CONSTANTS_VERSION: u32 = 1;

/// Declares a `#[repr(i32)]` enum together with its exported names.
macro_rules! constant_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $value:expr => $export:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $($variant = $value,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Map a raw libclang value back to a named variant.
            pub fn from_raw(raw: i64) -> Option<Self> {
                match raw {
                    $(v if v == $value as i64 => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn as_raw(self) -> i32 {
                self as i32
            }

            /// Name under which the host sees this constant.
            pub fn export_name(self) -> &'static str {
                match self {
                    $($name::$variant => $export,)+
                }
            }
        }
    };
}

constant_enum! {
    /// Declaration and reference cursor kinds the code generator dispatches on.
    pub enum CursorKind {
        UnexposedDecl = 1 => "CXCursor_UnexposedDecl",
        StructDecl = 2 => "CXCursor_StructDecl",
        UnionDecl = 3 => "CXCursor_UnionDecl",
        ClassDecl = 4 => "CXCursor_ClassDecl",
        EnumDecl = 5 => "CXCursor_EnumDecl",
        FieldDecl = 6 => "CXCursor_FieldDecl",
        EnumConstantDecl = 7 => "CXCursor_EnumConstantDecl",
        FunctionDecl = 8 => "CXCursor_FunctionDecl",
        VarDecl = 9 => "CXCursor_VarDecl",
        ParmDecl = 10 => "CXCursor_ParmDecl",
        ObjCInterfaceDecl = 11 => "CXCursor_ObjCInterfaceDecl",
        ObjCCategoryDecl = 12 => "CXCursor_ObjCCategoryDecl",
        ObjCProtocolDecl = 13 => "CXCursor_ObjCProtocolDecl",
        ObjCPropertyDecl = 14 => "CXCursor_ObjCPropertyDecl",
        ObjCIvarDecl = 15 => "CXCursor_ObjCIvarDecl",
        ObjCInstanceMethodDecl = 16 => "CXCursor_ObjCInstanceMethodDecl",
        ObjCClassMethodDecl = 17 => "CXCursor_ObjCClassMethodDecl",
        TypedefDecl = 20 => "CXCursor_TypedefDecl",
        CxxMethod = 21 => "CXCursor_CXXMethod",
        ObjCSuperClassRef = 40 => "CXCursor_ObjCSuperClassRef",
        ObjCProtocolRef = 41 => "CXCursor_ObjCProtocolRef",
        ObjCClassRef = 42 => "CXCursor_ObjCClassRef",
        TypeRef = 43 => "CXCursor_TypeRef",
        NoDeclFound = 71 => "CXCursor_NoDeclFound",
        TranslationUnit = 300 => "CXCursor_TranslationUnit",
    }
}

constant_enum! {
    /// Control code a visitor returns for each child.
    pub enum ChildVisit {
        Break = 0 => "CXChildVisit_Break",
        Continue = 1 => "CXChildVisit_Continue",
        Recurse = 2 => "CXChildVisit_Recurse",
    }
}

impl ChildVisit {
    /// Interpret a host return value. Anything unrecognised means `Continue`.
    pub fn from_raw_or_continue(raw: Option<i64>) -> Self {
        raw.and_then(ChildVisit::from_raw).unwrap_or(ChildVisit::Continue)
    }
}

constant_enum! {
    /// Result of a whole traversal, matching the non-zero-on-break return
    /// of `clang_visitChildren`.
    pub enum VisitOutcome {
        Completed = 0 => "TRAVERSAL_COMPLETED",
        Aborted = 1 => "TRAVERSAL_ABORTED",
    }
}

constant_enum! {
    /// Bit flags accepted by `parse_translation_unit`.
    pub enum ParseFlag {
        None = 0x0 => "CXTranslationUnit_None",
        DetailedPreprocessingRecord = 0x1 => "CXTranslationUnit_DetailedPreprocessingRecord",
        Incomplete = 0x2 => "CXTranslationUnit_Incomplete",
        SkipFunctionBodies = 0x40 => "CXTranslationUnit_SkipFunctionBodies",
        IncludeBriefCommentsInCodeCompletion = 0x80 => "CXTranslationUnit_IncludeBriefCommentsInCodeCompletion",
        // Keeps `_Nonnull` and friends visible to nullability queries.
        IncludeAttributedTypes = 0x1000 => "CXTranslationUnit_IncludeAttributedTypes",
    }
}

impl ParseFlag {
    /// Fold a set of flags into the bit mask libclang expects.
    pub fn mask(flags: &[ParseFlag]) -> u32 {
        flags.iter().fold(0, |acc, flag| acc | flag.as_raw() as u32)
    }
}

constant_enum! {
    pub enum Nullability {
        NonNull = 0 => "CXTypeNullability_NonNull",
        Nullable = 1 => "CXTypeNullability_Nullable",
        Unspecified = 2 => "CXTypeNullability_Unspecified",
        Invalid = 3 => "CXTypeNullability_Invalid",
    }
}

constant_enum! {
    /// Type kinds a binding generator commonly needs to tell apart.
    pub enum TypeKind {
        Invalid = 0 => "CXType_Invalid",
        Unexposed = 1 => "CXType_Unexposed",
        Void = 2 => "CXType_Void",
        Bool = 3 => "CXType_Bool",
        UChar = 5 => "CXType_UChar",
        UShort = 8 => "CXType_UShort",
        UInt = 9 => "CXType_UInt",
        ULong = 10 => "CXType_ULong",
        ULongLong = 11 => "CXType_ULongLong",
        CharS = 13 => "CXType_Char_S",
        SChar = 14 => "CXType_SChar",
        Short = 16 => "CXType_Short",
        Int = 17 => "CXType_Int",
        Long = 18 => "CXType_Long",
        LongLong = 19 => "CXType_LongLong",
        Float = 21 => "CXType_Float",
        Double = 22 => "CXType_Double",
        LongDouble = 23 => "CXType_LongDouble",
        ObjCId = 27 => "CXType_ObjCId",
        ObjCClass = 28 => "CXType_ObjCClass",
        ObjCSel = 29 => "CXType_ObjCSel",
        Pointer = 101 => "CXType_Pointer",
        BlockPointer = 102 => "CXType_BlockPointer",
        Record = 105 => "CXType_Record",
        Enum = 106 => "CXType_Enum",
        Typedef = 107 => "CXType_Typedef",
        ObjCInterface = 108 => "CXType_ObjCInterface",
        ObjCObjectPointer = 109 => "CXType_ObjCObjectPointer",
        FunctionNoProto = 110 => "CXType_FunctionNoProto",
        FunctionProto = 111 => "CXType_FunctionProto",
        ConstantArray = 112 => "CXType_ConstantArray",
        IncompleteArray = 114 => "CXType_IncompleteArray",
        Elaborated = 119 => "CXType_Elaborated",
    }
}

fn exported<T: Copy>(all: &[T], name: fn(T) -> &'static str, raw: fn(T) -> i32) -> Vec<(&'static str, i64)> {
    all.iter().map(|&v| (name(v), raw(v) as i64)).collect()
}

/// Every constant the host sees, in a stable order.
pub static EXPORTED: Lazy<Vec<(&'static str, i64)>> = Lazy::new(|| {
    let mut table = Vec::new();
    table.extend(exported(CursorKind::ALL, CursorKind::export_name, CursorKind::as_raw));
    table.extend(exported(ChildVisit::ALL, ChildVisit::export_name, ChildVisit::as_raw));
    table.extend(exported(VisitOutcome::ALL, VisitOutcome::export_name, VisitOutcome::as_raw));
    table.extend(exported(ParseFlag::ALL, ParseFlag::export_name, ParseFlag::as_raw));
    table.extend(exported(Nullability::ALL, Nullability::export_name, Nullability::as_raw));
    table.extend(exported(TypeKind::ALL, TypeKind::export_name, TypeKind::as_raw));
    table
});

static BY_NAME: Lazy<HashMap<&'static str, i64>> =
    Lazy::new(|| EXPORTED.iter().copied().collect());

/// Look up an exported constant by its host-visible name.
pub fn lookup(name: &str) -> Option<i64> {
    BY_NAME.get(name).copied()
}
