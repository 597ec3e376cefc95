//! Content-addressed sharing of sub-trees across a batch of schemas.
//!
//! A post-order rewrite replaces every leaf and every struct with a
//! `LazyRef` keyed by the SHA-256 of its canonical string, and stores the
//! rewritten node once in a shared table. Two structs that render the same
//! canonical string collapse to one entry no matter where they were
//! declared.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use castor_core::{Node, NodeRegistry, RegistryError};
use sha2::{Digest, Sha256};

use crate::emit;
use crate::error::OptimizeError;

/// Lowercase hex SHA-256 of the node's canonical string.
pub fn content_key(node: &Node) -> String {
    let hash = Sha256::digest(node.to_string().as_bytes());
    format!("{:x}", hash)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Optimizer;

impl Optimizer {
    pub fn new() -> Self {
        Optimizer
    }

    /// Rewrite every named schema against one shared table.
    ///
    /// Names are caller-chosen cache keys and are carried through
    /// unchanged. Inputs must be plain parser output: a `LazyRef` already
    /// present in a schema is rejected.
    pub fn compile(&self, schemas: &BTreeMap<String, Node>) -> Result<Compiled, OptimizeError> {
        let mut dedup = Dedup::default();
        let mut roots = BTreeMap::new();
        for (name, node) in schemas {
            let root = dedup.rewrite(node).map_err(|key| OptimizeError::UnresolvedRef {
                schema: name.clone(),
                key,
            })?;
            roots.insert(name.clone(), root);
        }
        tracing::debug!(
            schemas = roots.len(),
            shared = dedup.table.len(),
            hits = dedup.hits,
            "optimized schemas"
        );
        Ok(Compiled {
            table: dedup.table,
            roots,
        })
    }
}

#[derive(Default)]
struct Dedup {
    table: BTreeMap<String, Node>,
    hits: usize,
}

impl Dedup {
    /// The error is the key of a pre-existing reference.
    fn rewrite(&mut self, node: &Node) -> Result<Node, String> {
        match node {
            Node::LazyRef { key } => Err(key.clone()),
            // A brand may only wrap a bare built-in, so it is shared whole.
            Node::Branded(_) => Ok(self.share(node, node.clone())),
            leaf if leaf.is_leaf() => Ok(self.share(leaf, leaf.clone())),
            Node::Struct(_) => {
                let rewritten = node.map_children(&mut |child| self.rewrite(child))?;
                Ok(self.share(node, rewritten))
            }
            other => other.map_children(&mut |child| self.rewrite(child)),
        }
    }

    fn share(&mut self, original: &Node, rewritten: Node) -> Node {
        let key = content_key(original);
        match self.table.entry(key.clone()) {
            Entry::Occupied(_) => {
                self.hits += 1;
                tracing::trace!(key = %key, variant = original.variant_name(), "dedup hit");
            }
            Entry::Vacant(slot) => {
                slot.insert(rewritten);
            }
        }
        Node::lazy_ref(key)
    }
}

/// Result of one compile run: the shared table and the rewritten roots.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    table: BTreeMap<String, Node>,
    roots: BTreeMap<String, Node>,
}

impl Compiled {
    /// Shared nodes by content key. Their children are references into
    /// this same table.
    pub fn table(&self) -> &BTreeMap<String, Node> {
        &self.table
    }

    pub fn roots(&self) -> &BTreeMap<String, Node> {
        &self.roots
    }

    pub fn root(&self, name: &str) -> Option<&Node> {
        self.roots.get(name)
    }

    /// An in-process registry over the shared table, equivalent to loading
    /// the emitted source.
    pub fn registry(&self) -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        for (key, node) in &self.table {
            registry.insert_node(key.clone(), node.clone());
        }
        registry
    }

    /// The root for `name` with every reference replaced.
    pub fn resolve(&self, name: &str, registry: &NodeRegistry) -> Result<Option<Node>, RegistryError> {
        self.roots.get(name).map(|root| root.resolve(registry)).transpose()
    }

    /// Rust source that rebuilds this table and these roots at load time.
    pub fn emit_source(&self) -> String {
        let source = emit::render(self);
        tracing::debug!(bytes = source.len(), entries = self.table.len(), "emitted source");
        source
    }
}
