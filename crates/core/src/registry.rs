//! Shared lookup table for `LazyRef` nodes.
//!
//! Built once (usually from an optimizer artifact), then read-only.
//! Each entry is a thunk that is run on first access and memoized.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::ast::Node;
use crate::error::InvalidSyntax;

/// Deep resolution stops here; the optimizer never produces cycles, so a
/// chain this long means a broken table.
const MAX_RESOLVE_DEPTH: usize = 256;

pub type NodeThunk = Box<dyn Fn() -> Result<Node, InvalidSyntax> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("no node registered under key '{0}'")]
    UnknownKey(String),
    #[error("node '{key}' could not be built: {source}")]
    Build { key: String, source: InvalidSyntax },
    #[error("reference chain deeper than {0}")]
    TooDeep(usize),
}

struct Entry {
    thunk: NodeThunk,
    cell: OnceLock<Result<Node, InvalidSyntax>>,
}

#[derive(Default)]
pub struct NodeRegistry {
    entries: HashMap<String, Entry>,
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("NodeRegistry").field("keys", &keys).finish()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a thunk. Only meant for the construction phase; a built
    /// registry is shared immutably.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        thunk: impl Fn() -> Result<Node, InvalidSyntax> + Send + Sync + 'static,
    ) {
        self.entries.insert(
            key.into(),
            Entry {
                thunk: Box::new(thunk),
                cell: OnceLock::new(),
            },
        );
    }

    /// Register an already-built node.
    pub fn insert_node(&mut self, key: impl Into<String>, node: Node) {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(node));
        self.entries.insert(
            key.into(),
            Entry {
                thunk: Box::new(|| Err(InvalidSyntax::invariant("prebuilt entry"))),
                cell,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up `key`, building the node on first access.
    pub fn get(&self, key: &str) -> Result<&Node, RegistryError> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| RegistryError::UnknownKey(key.to_owned()))?;
        entry
            .cell
            .get_or_init(|| {
                tracing::trace!(key, "building registry node");
                (entry.thunk)()
            })
            .as_ref()
            .map_err(|e| RegistryError::Build {
                key: key.to_owned(),
                source: e.clone(),
            })
    }

    /// Follow references until a non-reference node is reached.
    pub fn follow<'a>(&'a self, mut node: &'a Node) -> Result<&'a Node, RegistryError> {
        let mut hops = 0;
        while let Node::LazyRef { key } = node {
            hops += 1;
            if hops > MAX_RESOLVE_DEPTH {
                return Err(RegistryError::TooDeep(MAX_RESOLVE_DEPTH));
            }
            node = self.get(key)?;
        }
        Ok(node)
    }
}

impl Node {
    /// Replace every `LazyRef` in the tree with the node it refers to.
    pub fn resolve(&self, registry: &NodeRegistry) -> Result<Node, RegistryError> {
        resolve_at(self, registry, 0)
    }
}

fn resolve_at(node: &Node, registry: &NodeRegistry, depth: usize) -> Result<Node, RegistryError> {
    if depth > MAX_RESOLVE_DEPTH {
        return Err(RegistryError::TooDeep(MAX_RESOLVE_DEPTH));
    }
    match node {
        Node::LazyRef { key } => resolve_at(registry.get(key)?, registry, depth + 1),
        other => other.map_children(&mut |child| resolve_at(child, registry, depth + 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BuiltIn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn thunks_run_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut reg = NodeRegistry::new();
        reg.insert("k", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Node::builtin(BuiltIn::Int))
        });
        assert_eq!(reg.get("k").unwrap(), &Node::builtin(BuiltIn::Int));
        assert_eq!(reg.get("k").unwrap(), &Node::builtin(BuiltIn::Int));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_key_is_an_error() {
        let reg = NodeRegistry::new();
        assert_eq!(
            reg.get("nope").unwrap_err(),
            RegistryError::UnknownKey("nope".into())
        );
    }

    #[test]
    fn resolve_replaces_nested_refs() {
        let mut reg = NodeRegistry::new();
        reg.insert_node("int", Node::builtin(BuiltIn::Int));
        reg.insert_node("alias", Node::lazy_ref("int"));
        let node = Node::list(Node::lazy_ref("alias"));
        assert_eq!(node.resolve(&reg).unwrap().to_string(), "list<int>");
        assert_eq!(
            reg.follow(&Node::lazy_ref("alias")).unwrap(),
            &Node::builtin(BuiltIn::Int)
        );
    }

    #[test]
    fn self_reference_is_bounded() {
        let mut reg = NodeRegistry::new();
        reg.insert_node("loop", Node::lazy_ref("loop"));
        assert!(matches!(
            Node::lazy_ref("loop").resolve(&reg),
            Err(RegistryError::TooDeep(_))
        ));
    }
}
