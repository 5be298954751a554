//! Parser sessions: index creation, parsing and disposal.
//!
//! A session owns a `ResourceRegistry`. Everything it hands out is a plain
//! id or token; dropping the session releases whatever is still alive.

use crate::config::{IndexOptions, ParseOptions};
use crate::constants::{ChildVisit, VisitOutcome};
use crate::error::{BridgeError, Result};
use crate::handle::{CursorToken, HandleCodec};
use crate::native::{self, IndexResource, TranslationUnitResource};
use crate::query::QueryFacade;
use crate::registry::{ResourceId, ResourceKind, ResourceRegistry};
use crate::visitor::{CursorChildren, VisitorBridge};
use once_cell::unsync::OnceCell;
use std::rc::Rc;
use tracing::debug;

thread_local! {
    static CURRENT: OnceCell<Rc<ParserSession>> = const { OnceCell::new() };
}

/// Handle to a live `CXIndex`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexHandle(ResourceId);

/// Handle to a live `CXTranslationUnit`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranslationUnitHandle(ResourceId);

impl From<IndexHandle> for ResourceId {
    fn from(handle: IndexHandle) -> Self {
        handle.0
    }
}

impl From<TranslationUnitHandle> for ResourceId {
    fn from(handle: TranslationUnitHandle) -> Self {
        handle.0
    }
}

/// One logical thread of parsing.
///
/// Not `Send`: libclang objects must stay on the thread that loaded libclang.
pub struct ParserSession {
    registry: ResourceRegistry,
}

impl ParserSession {
    /// Start a session, loading libclang for this thread if needed.
    pub fn new() -> Result<Self> {
        native::ensure_loaded()?;
        Ok(ParserSession {
            registry: ResourceRegistry::new(),
        })
    }

    /// The calling thread's shared session, created on first use.
    ///
    /// Lives until the thread exits; anything still registered is disposed
    /// then.
    pub fn current() -> Result<Rc<ParserSession>> {
        // clang-sys keeps the loaded library in its own thread local. Touching
        // it before CURRENT makes it outlive the session at thread exit, so
        // the final dispose can still reach libclang.
        native::ensure_loaded()?;
        CURRENT.with(|cell| {
            cell.get_or_try_init(|| ParserSession::new().map(Rc::new))
                .cloned()
        })
    }

    pub fn create_index(
        &self,
        exclude_declarations_from_pch: bool,
        display_diagnostics: bool,
    ) -> Result<IndexHandle> {
        self.create_index_with(IndexOptions {
            exclude_declarations_from_pch,
            display_diagnostics,
        })
    }

    pub fn create_index_with(&self, options: IndexOptions) -> Result<IndexHandle> {
        let id = self
            .registry
            .acquire(ResourceKind::Index, || IndexResource::create(options))?;
        Ok(IndexHandle(id))
    }

    /// Parse `filename` with `args` as the compiler invocation.
    ///
    /// An empty `args` means libclang's default invocation.
    pub fn parse_translation_unit<S: AsRef<str>>(
        &self,
        index: IndexHandle,
        filename: &str,
        args: &[S],
        options: u32,
    ) -> Result<TranslationUnitHandle> {
        let args: Vec<String> = args.iter().map(|arg| arg.as_ref().to_string()).collect();
        let index_resource = self
            .registry
            .with(index.0, |resource: &Rc<IndexResource>| resource.clone())?;

        let id = self.registry.acquire(ResourceKind::TranslationUnit, move || {
            TranslationUnitResource::parse(index_resource, filename, &args, options)
        })?;
        Ok(TranslationUnitHandle(id))
    }

    pub fn parse_with(
        &self,
        index: IndexHandle,
        filename: &str,
        options: &ParseOptions,
    ) -> Result<TranslationUnitHandle> {
        self.parse_translation_unit(index, filename, &options.args, options.flags)
    }

    /// Root cursor of a translation unit.
    pub fn translation_unit_cursor(&self, unit: TranslationUnitHandle) -> Result<CursorToken> {
        let root = self
            .registry
            .with(unit.0, |resource: &TranslationUnitResource| resource.root_cursor())?;
        Ok(self.codec().wrap_cursor(root, unit.0))
    }

    /// File the translation unit was parsed from.
    pub fn translation_unit_filename(&self, unit: TranslationUnitHandle) -> Result<String> {
        self.registry
            .with(unit.0, |resource: &TranslationUnitResource| resource.filename().to_string())
    }

    /// Release an index or translation unit. Never fails; returns whether
    /// this call released anything.
    ///
    /// Disposing an index while units parsed from it are alive only retires
    /// the handle. The native index is freed with the last of those units.
    pub fn dispose(&self, handle: impl Into<ResourceId>) -> bool {
        self.registry.dispose(handle.into())
    }

    pub fn is_alive(&self, handle: impl Into<ResourceId>) -> bool {
        self.registry.is_alive(handle.into())
    }

    pub fn codec(&self) -> HandleCodec<'_> {
        HandleCodec::new(&self.registry)
    }

    pub fn query(&self) -> QueryFacade<'_> {
        QueryFacade::new(self.codec())
    }

    /// Walk the descendants of `cursor`; see `VisitorBridge::run`.
    pub fn visit_children<F, E>(
        &self,
        cursor: CursorToken,
        callback: F,
    ) -> std::result::Result<VisitOutcome, E>
    where
        F: FnMut(CursorToken, CursorToken) -> std::result::Result<ChildVisit, E>,
        E: From<BridgeError>,
    {
        let source = CursorChildren::new(self.codec());
        let mut bridge = VisitorBridge::new(&source);
        let outcome = bridge.run(cursor, callback)?;
        debug!("Traversal {:?} after {} nodes", outcome, bridge.visited());
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CursorKind, Nullability, ParseFlag, TypeKind};
    use std::io::Write;

    fn sample(name: &str) -> String {
        format!("{}/test_samples/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    /// Sessions need a libclang shared library; skip when there is none,
    /// unless CLANG_BRIDGE_REQUIRE_LIBCLANG is set.
    fn session() -> Option<ParserSession> {
        match ParserSession::new() {
            Ok(session) => Some(session),
            Err(e) => skip(e),
        }
    }

    fn skip<T>(e: BridgeError) -> Option<T> {
        if std::env::var_os("CLANG_BRIDGE_REQUIRE_LIBCLANG").is_some() {
            panic!("libclang required but unavailable: {}", e);
        }
        eprintln!("skipping: {}", e);
        None
    }

    fn parse(session: &ParserSession, name: &str) -> (IndexHandle, TranslationUnitHandle) {
        let index = session.create_index(false, false).unwrap();
        let unit = session
            .parse_translation_unit::<&str>(index, &sample(name), &[], 0)
            .unwrap();
        (index, unit)
    }

    /// Top-level declarations written in the parsed file, skipping builtins.
    fn declarations(session: &ParserSession, unit: TranslationUnitHandle) -> Vec<CursorToken> {
        let query = session.query();
        let root = session.translation_unit_cursor(unit).unwrap();
        let mut found = Vec::new();
        session
            .visit_children::<_, BridgeError>(root, |child, _| {
                if query.cursor_location(&child)?.file.is_some() {
                    found.push(child);
                }
                Ok(ChildVisit::Continue)
            })
            .unwrap();
        found
    }

    fn find(session: &ParserSession, unit: TranslationUnitHandle, spelling: &str) -> CursorToken {
        let query = session.query();
        declarations(session, unit)
            .into_iter()
            .find(|cursor| query.cursor_spelling(cursor).unwrap() == spelling)
            .unwrap_or_else(|| panic!("no declaration named {}", spelling))
    }

    #[test]
    fn test_typedef_and_function_signature() -> anyhow::Result<()> {
        let Some(session) = session() else { return Ok(()) };
        let (_, unit) = parse(&session, "integer_add.h");
        let query = session.query();

        let decls = declarations(&session, unit);
        assert_eq!(decls.len(), 2);

        let typedef = decls[0];
        assert_eq!(query.cursor_kind(&typedef)?, CursorKind::TypedefDecl.as_raw());
        assert_eq!(query.cursor_spelling(&typedef)?, "Integer");
        let underlying = query.typedef_underlying_type(&typedef)?;
        assert_eq!(query.type_spelling(&underlying)?, "int");

        let function = decls[1];
        assert_eq!(query.cursor_kind(&function)?, CursorKind::FunctionDecl.as_raw());
        assert_eq!(query.cursor_spelling(&function)?, "integer_add");
        assert_eq!(query.num_arguments(&function)?, 2);
        assert_eq!(query.type_spelling(&query.cursor_result_type(&function)?)?, "int");

        let first = query.argument(&function, 0)?;
        assert_eq!(query.cursor_kind(&first)?, CursorKind::ParmDecl.as_raw());
        assert_eq!(query.cursor_spelling(&first)?, "a");
        assert_eq!(query.type_spelling(&query.cursor_type(&first)?)?, "Integer");

        let function_type = query.cursor_type(&function)?;
        assert_eq!(query.type_kind(&function_type)?, TypeKind::FunctionProto.as_raw());
        assert_eq!(query.num_arg_types(&function_type)?, 2);
        assert_eq!(query.type_spelling(&query.arg_type(&function_type, 1)?)?, "Integer");
        assert_eq!(query.type_spelling(&query.result_type(&function_type)?)?, "int");

        let canonical = query.canonical_type(&query.arg_type(&function_type, 0)?)?;
        assert_eq!(query.type_spelling(&canonical)?, "int");
        Ok(())
    }

    #[test]
    fn test_out_of_range_arguments_yield_sentinels() -> anyhow::Result<()> {
        let Some(session) = session() else { return Ok(()) };
        let (_, unit) = parse(&session, "integer_add.h");
        let query = session.query();
        let function = find(&session, unit, "integer_add");
        let typedef = find(&session, unit, "Integer");

        assert!(query.is_null_cursor(&query.argument(&function, 9)?)?);
        let missing = query.arg_type(&query.cursor_type(&function)?, 9)?;
        assert_eq!(query.type_kind(&missing)?, TypeKind::Invalid.as_raw());
        assert_eq!(query.num_arguments(&typedef)?, -1);
        Ok(())
    }

    #[test]
    fn test_enum_values_comments_and_locations() -> anyhow::Result<()> {
        let Some(session) = session() else { return Ok(()) };
        let (_, unit) = parse(&session, "shapes.h");
        let query = session.query();

        let color = find(&session, unit, "Color");
        assert_eq!(query.cursor_kind(&color)?, CursorKind::EnumDecl.as_raw());
        let mut values = Vec::new();
        session.visit_children::<_, BridgeError>(color, |constant, _| {
            values.push((query.cursor_spelling(&constant)?, query.enum_constant_value(&constant)?));
            Ok(ChildVisit::Continue)
        })?;
        assert_eq!(
            values,
            vec![("RED".to_string(), 0), ("GREEN".to_string(), 5), ("BLUE".to_string(), 6)]
        );

        let point = find(&session, unit, "Point");
        let comment = query.cursor_raw_comment(&point)?.expect("Point is documented");
        assert!(comment.contains("A point in the plane."));
        assert_eq!(query.cursor_raw_comment(&color)?, None);

        let location = query.cursor_location(&point)?;
        assert!(location.file.as_deref().is_some_and(|f| f.ends_with("shapes.h")));
        assert_eq!(location.line, 2);
        assert_eq!(location.column, 8);
        Ok(())
    }

    #[test]
    fn test_pointer_nullability() -> anyhow::Result<()> {
        let Some(session) = session() else { return Ok(()) };
        let index = session.create_index(false, false)?;
        let flags = ParseFlag::mask(&[ParseFlag::IncludeAttributedTypes]);
        let unit = session.parse_translation_unit::<&str>(index, &sample("shapes.h"), &[], flags)?;
        let query = session.query();
        let draw = find(&session, unit, "draw");

        let origin = query.cursor_type(&query.argument(&draw, 0)?)?;
        assert_eq!(query.type_nullability(&origin)?, Nullability::NonNull);
        let color = query.cursor_type(&query.argument(&draw, 1)?)?;
        assert_eq!(query.type_nullability(&color)?, Nullability::Invalid);
        Ok(())
    }

    #[test]
    fn test_pointee_type() -> anyhow::Result<()> {
        let Some(session) = session() else { return Ok(()) };
        let (_, unit) = parse(&session, "shapes.h");
        let query = session.query();
        let draw = find(&session, unit, "draw");

        let label = query.cursor_type(&query.argument(&draw, 2)?)?;
        assert_eq!(query.type_kind(&label)?, TypeKind::Pointer.as_raw());
        assert_eq!(query.type_spelling(&query.pointee_type(&label)?)?, "const char");
        Ok(())
    }

    #[test]
    fn test_recurse_visits_fields_before_next_declaration() -> anyhow::Result<()> {
        let Some(session) = session() else { return Ok(()) };
        let (_, unit) = parse(&session, "shapes.h");
        let query = session.query();
        let root = session.translation_unit_cursor(unit)?;

        let mut order = Vec::new();
        let outcome = session.visit_children::<_, BridgeError>(root, |child, _| {
            if query.cursor_location(&child)?.file.is_none() {
                return Ok(ChildVisit::Continue);
            }
            let name = query.cursor_spelling(&child)?;
            let next = if name == "Point" { ChildVisit::Recurse } else { ChildVisit::Continue };
            order.push(name);
            Ok(next)
        })?;

        assert_eq!(outcome, VisitOutcome::Completed);
        assert_eq!(order, vec!["Point", "x", "y", "Color", "draw"]);
        Ok(())
    }

    #[test]
    fn test_break_aborts_traversal() -> anyhow::Result<()> {
        let Some(session) = session() else { return Ok(()) };
        let (_, unit) = parse(&session, "shapes.h");
        let query = session.query();
        let root = session.translation_unit_cursor(unit)?;

        let mut seen = Vec::new();
        let outcome = session.visit_children::<_, BridgeError>(root, |child, _| {
            if query.cursor_location(&child)?.file.is_none() {
                return Ok(ChildVisit::Continue);
            }
            seen.push(query.cursor_spelling(&child)?);
            Ok(if seen.len() == 2 { ChildVisit::Break } else { ChildVisit::Recurse })
        })?;

        assert_eq!(outcome, VisitOutcome::Aborted);
        assert_eq!(seen, vec!["Point", "x"]);
        Ok(())
    }

    #[test]
    fn test_tokens_are_invalid_after_dispose() -> anyhow::Result<()> {
        let Some(session) = session() else { return Ok(()) };
        let (index, unit) = parse(&session, "integer_add.h");
        let query = session.query();
        let function = find(&session, unit, "integer_add");
        let result_type = query.cursor_result_type(&function)?;

        assert!(session.dispose(unit));
        assert!(!session.dispose(unit));

        assert!(query.cursor_spelling(&function).unwrap_err().is_invalid_handle());
        assert!(query.type_spelling(&result_type).unwrap_err().is_invalid_handle());
        assert!(session.translation_unit_cursor(unit).unwrap_err().is_invalid_handle());
        let walk = session.visit_children::<_, BridgeError>(function, |_, _| Ok(ChildVisit::Continue));
        assert!(walk.unwrap_err().is_invalid_handle());

        assert!(session.dispose(index));
        assert!(!session.dispose(index));
        Ok(())
    }

    #[test]
    fn test_disposing_unit_inside_callback_fails_cleanly() -> anyhow::Result<()> {
        let Some(session) = session() else { return Ok(()) };
        let (_, unit) = parse(&session, "shapes.h");
        let root = session.translation_unit_cursor(unit)?;

        let result = session.visit_children::<_, BridgeError>(root, |_, _| {
            session.dispose(unit);
            Ok(ChildVisit::Recurse)
        });

        assert!(result.unwrap_err().is_invalid_handle());
        Ok(())
    }

    #[test]
    fn test_index_disposed_before_its_units() -> anyhow::Result<()> {
        let Some(session) = session() else { return Ok(()) };
        let (index, unit) = parse(&session, "integer_add.h");

        assert!(session.dispose(index));
        assert!(!session.is_alive(index));
        assert!(session.is_alive(unit));

        // The unit keeps the native index alive.
        let function = find(&session, unit, "integer_add");
        assert_eq!(session.query().cursor_spelling(&function)?, "integer_add");
        assert!(session
            .parse_translation_unit::<&str>(index, &sample("integer_add.h"), &[], 0)
            .unwrap_err()
            .is_invalid_handle());
        Ok(())
    }

    #[test]
    fn test_missing_file_fails_to_parse() {
        let Some(session) = session() else { return };
        let index = session.create_index(false, false).unwrap();

        let err = session
            .parse_translation_unit::<&str>(index, "/definitely/not/here.h", &[], 0)
            .unwrap_err();

        assert!(matches!(err, BridgeError::ParseFailed { ref filename, .. } if filename == "/definitely/not/here.h"));
    }

    #[test]
    fn test_parse_with_arguments_from_json() -> anyhow::Result<()> {
        let Some(session) = session() else { return Ok(()) };
        let mut header = tempfile::Builder::new().suffix(".h").tempfile()?;
        writeln!(header, "#ifdef WITH_WIDGET\nstruct Widget {{ int id; }};\n#endif")?;
        let path = header.path().to_string_lossy().to_string();

        let index = session.create_index_with(IndexOptions::default())?;
        let options = ParseOptions::from_json(r#"{"args": ["-x", "c", "-DWITH_WIDGET"], "flags": 1}"#)?;
        let unit = session.parse_with(index, &path, &options)?;

        assert_eq!(session.translation_unit_filename(unit)?, path);
        let widget = find(&session, unit, "Widget");
        assert_eq!(session.query().cursor_kind(&widget)?, CursorKind::StructDecl.as_raw());
        Ok(())
    }

    #[test]
    fn test_nul_in_filename_is_invalid_argument() {
        let Some(session) = session() else { return };
        let index = session.create_index(false, false).unwrap();

        let err = session
            .parse_translation_unit(index, "bad\0.h", &["-x", "c"], 0)
            .unwrap_err();

        assert!(matches!(err, BridgeError::InvalidArgument(_)));
        assert!(session.is_alive(index));
    }

    #[test]
    fn test_thread_exit_disposes_current_session() {
        if let Err(e) = native::ensure_loaded() {
            skip::<()>(e);
            return;
        }

        let worker = std::thread::spawn(|| {
            let session = ParserSession::current().unwrap();
            let index = session.create_index(false, false).unwrap();
            session
                .parse_translation_unit::<&str>(index, &sample("integer_add.h"), &[], 0)
                .unwrap();
            assert!(Rc::ptr_eq(&session, &ParserSession::current().unwrap()));
            // Index and unit stay alive; thread exit has to release them.
        });

        assert!(worker.join().is_ok());
    }
}
