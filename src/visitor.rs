//! Depth-first, pre-order traversal driven by a host callback.
//!
//! libclang's own `clang_visitChildren` steers traversal from inside a native
//! stack frame. Here native code is only asked for one level of children at a
//! time; the descent itself is an explicit stack, so the callback can return
//! errors, re-enter the bridge, or abort without crossing an `extern "C"`
//! frame.
//!
//! Each level is listed in full before its first callback runs, so a `Break`
//! on the first child of a translation unit still costs one enumeration of
//! every top-level declaration (system headers included). Deeper levels are
//! only listed when the callback asks to `Recurse` into them.

use crate::constants::{ChildVisit, VisitOutcome};
use crate::error::{BridgeError, Result};
use crate::handle::{CursorToken, HandleCodec};
use clang_sys::*;
use std::vec::IntoIter;
use tracing::trace;

/// Something that can list the direct children of a node in source order.
pub trait ChildSource {
    type Node: Copy;

    fn children(&self, parent: Self::Node) -> Result<Vec<Self::Node>>;
}

/// Where the traversal stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Idle,
    Visiting { depth: usize },
    Aborted,
}

struct Frame<N> {
    parent: N,
    pending: IntoIter<N>,
}

/// Walks the descendants of one node, asking `callback` what to do at each.
pub struct VisitorBridge<'s, S: ChildSource> {
    source: &'s S,
    state: TraversalState,
    visited: usize,
}

impl<'s, S: ChildSource> VisitorBridge<'s, S> {
    pub fn new(source: &'s S) -> Self {
        VisitorBridge {
            source,
            state: TraversalState::Idle,
            visited: 0,
        }
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    /// Number of callback invocations so far.
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Visit the descendants of `root`.
    ///
    /// `callback(child, parent)` decides per child: `Continue` moves to the
    /// next sibling, `Recurse` walks the child's subtree first, and `Break`
    /// stops everything. A callback error also stops the traversal and is
    /// returned as-is.
    pub fn run<F, E>(&mut self, root: S::Node, mut callback: F) -> std::result::Result<VisitOutcome, E>
    where
        F: FnMut(S::Node, S::Node) -> std::result::Result<ChildVisit, E>,
        E: From<BridgeError>,
    {
        let mut stack = vec![Frame {
            parent: root,
            pending: self.source.children(root)?.into_iter(),
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.pending.next() else {
                stack.pop();
                continue;
            };
            let parent = frame.parent;
            self.state = TraversalState::Visiting { depth: stack.len() };
            self.visited += 1;

            match callback(child, parent) {
                Ok(ChildVisit::Continue) => {}
                Ok(ChildVisit::Recurse) => {
                    let grandchildren = self.source.children(child)?;
                    trace!("Descending into {} children at depth {}", grandchildren.len(), stack.len());
                    stack.push(Frame {
                        parent: child,
                        pending: grandchildren.into_iter(),
                    });
                }
                Ok(ChildVisit::Break) => {
                    self.state = TraversalState::Aborted;
                    return Ok(VisitOutcome::Aborted);
                }
                Err(e) => {
                    self.state = TraversalState::Aborted;
                    return Err(e);
                }
            }
        }

        self.state = TraversalState::Idle;
        Ok(VisitOutcome::Completed)
    }
}

/// Lists cursor children through libclang, one level per call.
pub struct CursorChildren<'r> {
    codec: HandleCodec<'r>,
}

impl<'r> CursorChildren<'r> {
    pub fn new(codec: HandleCodec<'r>) -> Self {
        CursorChildren { codec }
    }
}

impl ChildSource for CursorChildren<'_> {
    type Node = CursorToken;

    fn children(&self, parent: CursorToken) -> Result<Vec<CursorToken>> {
        // Liveness is checked per level: the callback may have disposed the unit.
        let raw = self.codec.unwrap_cursor(&parent)?;
        let mut collected: Vec<CXCursor> = Vec::new();
        unsafe {
            clang_visitChildren(
                raw,
                collect_child,
                &mut collected as *mut Vec<CXCursor> as CXClientData,
            );
        }
        Ok(collected
            .into_iter()
            .map(|child| self.codec.wrap_cursor(child, parent.owner()))
            .collect())
    }
}

extern "C" fn collect_child(cursor: CXCursor, _parent: CXCursor, data: CXClientData) -> CXChildVisitResult {
    let collected = unsafe { &mut *(data as *mut Vec<CXCursor>) };
    collected.push(cursor);
    CXChildVisit_Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory tree keyed by node name.
    struct FakeTree {
        children: HashMap<&'static str, Vec<&'static str>>,
    }

    impl FakeTree {
        // root -> A, B, C; A -> A1, A2; A1 -> A1x; B -> B1
        fn sample() -> Self {
            let mut children = HashMap::new();
            children.insert("root", vec!["A", "B", "C"]);
            children.insert("A", vec!["A1", "A2"]);
            children.insert("A1", vec!["A1x"]);
            children.insert("B", vec!["B1"]);
            FakeTree { children }
        }
    }

    impl ChildSource for FakeTree {
        type Node = &'static str;

        fn children(&self, parent: &'static str) -> Result<Vec<&'static str>> {
            Ok(self.children.get(parent).cloned().unwrap_or_default())
        }
    }

    fn walk(
        tree: &FakeTree,
        mut decide: impl FnMut(&'static str) -> ChildVisit,
    ) -> (VisitOutcome, Vec<(&'static str, &'static str)>) {
        let mut seen = Vec::new();
        let mut bridge = VisitorBridge::new(tree);
        let outcome = bridge
            .run::<_, BridgeError>("root", |child, parent| {
                seen.push((child, parent));
                Ok(decide(child))
            })
            .unwrap();
        (outcome, seen)
    }

    #[test]
    fn test_continue_visits_direct_children_in_order() {
        let tree = FakeTree::sample();
        let (outcome, seen) = walk(&tree, |_| ChildVisit::Continue);

        assert_eq!(outcome, VisitOutcome::Completed);
        assert_eq!(seen, vec![("A", "root"), ("B", "root"), ("C", "root")]);
    }

    #[test]
    fn test_recurse_descends_before_next_sibling() {
        let tree = FakeTree::sample();
        let (outcome, seen) = walk(&tree, |node| {
            if node == "A" {
                ChildVisit::Recurse
            } else {
                ChildVisit::Continue
            }
        });

        assert_eq!(outcome, VisitOutcome::Completed);
        assert_eq!(
            seen,
            vec![("A", "root"), ("A1", "A"), ("A2", "A"), ("B", "root"), ("C", "root")]
        );
    }

    #[test]
    fn test_recurse_everywhere_is_full_preorder() {
        let tree = FakeTree::sample();
        let (_, seen) = walk(&tree, |_| ChildVisit::Recurse);
        let order: Vec<_> = seen.iter().map(|(child, _)| *child).collect();

        assert_eq!(order, vec!["A", "A1", "A1x", "A2", "B", "B1", "C"]);
        assert!(seen.contains(&("A1x", "A1")));
    }

    #[test]
    fn test_break_on_second_node_aborts_everything() {
        let tree = FakeTree::sample();
        let mut count = 0;
        // A recurses, so A1 is second; its sibling A2 and all of B, C must be skipped.
        let (outcome, seen) = walk(&tree, |node| {
            count += 1;
            match (count, node) {
                (2, _) => ChildVisit::Break,
                (_, "A") => ChildVisit::Recurse,
                _ => ChildVisit::Continue,
            }
        });

        assert_eq!(outcome, VisitOutcome::Aborted);
        assert_eq!(seen, vec![("A", "root"), ("A1", "A")]);
    }

    #[test]
    fn test_callback_error_stops_traversal() {
        let tree = FakeTree::sample();
        let mut bridge = VisitorBridge::new(&tree);
        let mut calls = 0;

        let result = bridge.run("root", |_, _| {
            calls += 1;
            Err(BridgeError::InvalidArgument("host callback raised".into()))
        });

        assert!(matches!(result, Err(BridgeError::InvalidArgument(_))));
        assert_eq!(calls, 1);
        assert_eq!(bridge.state(), TraversalState::Aborted);
    }

    #[test]
    fn test_leaf_root_completes_without_callbacks() {
        let tree = FakeTree::sample();
        let mut bridge = VisitorBridge::new(&tree);

        let outcome = bridge
            .run::<_, BridgeError>("C", |_, _| panic!("leaf has no children"))
            .unwrap();

        assert_eq!(outcome, VisitOutcome::Completed);
        assert_eq!(bridge.visited(), 0);
        assert_eq!(bridge.state(), TraversalState::Idle);
    }
}
