//! Context tree nodes stored in an index arena.
//!
//! A node is identified by the suffix of recent symbols that leads to it from
//! the root. Nodes are appended to the arena the first time their suffix is
//! traversed during training and are never removed, so a parent's handle is
//! always smaller than its children's.

use std::collections::BTreeMap;

use cts_math::{LocalEstimator, SwitchingWeight};
use serde::{Deserialize, Serialize};

/// Handle of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

/// Most nodes one arena can hold. `u32::MAX` itself is never a handle.
pub const MAX_NODES: usize = u32::MAX as usize;

impl NodeId {
    /// The root (empty context).
    pub const ROOT: NodeId = NodeId(0);

    /// Handle for arena position `position`, if it is below [`MAX_NODES`].
    fn at(position: usize) -> Option<NodeId> {
        u32::try_from(position)
            .ok()
            .filter(|&i| i < u32::MAX)
            .map(NodeId)
    }

    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One context suffix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextTreeNode {
    /// Symbol counts observed while this suffix was active.
    pub(crate) estimator: LocalEstimator,
    /// Mass on "predict with this node" vs "defer to the deeper context".
    pub(crate) weight: SwitchingWeight,
    /// Next-older context symbol → child. Missing key means no child yet.
    pub(crate) children: BTreeMap<usize, NodeId>,
    /// Suffix length.
    pub(crate) depth: u32,
}

impl ContextTreeNode {
    fn new(depth: u32) -> Self {
        Self {
            estimator: LocalEstimator::new(),
            weight: SwitchingWeight::new(),
            children: BTreeMap::new(),
            depth,
        }
    }

    pub fn estimator(&self) -> &LocalEstimator {
        &self.estimator
    }

    pub fn weight(&self) -> &SwitchingWeight {
        &self.weight
    }

    pub fn depth(&self) -> usize {
        self.depth as usize
    }

    pub fn child(&self, symbol: usize) -> Option<NodeId> {
        self.children.get(&symbol).copied()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Flat storage for all nodes of one tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeArena {
    nodes: Vec<ContextTreeNode>,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeArena {
    /// Arena holding only an untrained root.
    pub fn new() -> Self {
        Self {
            nodes: vec![ContextTreeNode::new(0)],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Only true for a deserialized arena that lost its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &ContextTreeNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut ContextTreeNode {
        &mut self.nodes[id.index()]
    }

    pub fn root(&self) -> &ContextTreeNode {
        self.get(NodeId::ROOT)
    }

    /// Child of `parent` reached by `symbol`, if it was ever created.
    pub fn child(&self, parent: NodeId, symbol: usize) -> Option<NodeId> {
        self.get(parent).child(symbol)
    }

    /// Create the child of `parent` for `symbol`. Returns the existing
    /// child if there already is one, and None once the arena is full.
    pub(crate) fn add_child(&mut self, parent: NodeId, symbol: usize) -> Option<NodeId> {
        if let Some(existing) = self.child(parent, symbol) {
            return Some(existing);
        }
        let id = NodeId::at(self.nodes.len())?;
        let depth = self.get(parent).depth + 1;
        self.nodes.push(ContextTreeNode::new(depth));
        self.get_mut(parent).children.insert(symbol, id);
        Some(id)
    }

    /// Deepest suffix length present in the arena.
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth()).max().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ContextTreeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Check structural invariants of an arena read from outside.
    ///
    /// Every non-root node must have exactly one parent with a smaller handle
    /// and a depth one greater, and its children together cannot have seen
    /// more symbols than it did. Symbols must be inside the alphabet and
    /// weights normalised.
    pub fn check(&self, alphabet_size: usize, max_depth: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("arena has no root node".to_string());
        }
        if self.root().depth != 0 {
            return Err("root node must have depth 0".to_string());
        }
        if self.nodes.len() > MAX_NODES {
            return Err("too many nodes".to_string());
        }

        let mut parent_of: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        for (id, node) in self.iter() {
            if node.depth() > max_depth {
                return Err(format!(
                    "node {} has depth {} beyond max context length {}",
                    id.index(),
                    node.depth(),
                    max_depth
                ));
            }
            if let Some(&symbol) = node.estimator.counts().keys().find(|&&s| s >= alphabet_size) {
                return Err(format!("node {} counts unknown symbol {}", id.index(), symbol));
            }
            let (log_stay, log_split) = node.weight.log_parts();
            if SwitchingWeight::from_log_parts(log_stay, log_split).is_none() {
                return Err(format!("node {} has an invalid switching weight", id.index()));
            }
            let mut child_total: u64 = 0;
            for (&symbol, &child) in &node.children {
                if symbol >= alphabet_size {
                    return Err(format!("node {} has child for unknown symbol {}", id.index(), symbol));
                }
                if child.index() >= self.nodes.len() || child <= id {
                    return Err(format!("node {} has invalid child handle {}", id.index(), child.index()));
                }
                if self.get(child).depth != node.depth + 1 {
                    return Err(format!("node {} has depth inconsistent with its parent", child.index()));
                }
                if parent_of[child.index()].replace(id).is_some() {
                    return Err(format!("node {} has more than one parent", child.index()));
                }
                child_total = child_total.saturating_add(self.get(child).estimator.total());
            }
            // A child is only on the path when its parent is.
            if child_total > node.estimator.total() {
                return Err(format!(
                    "children of node {} saw {} symbols but the node saw {}",
                    id.index(),
                    child_total,
                    node.estimator.total()
                ));
            }
        }

        if let Some(orphan) = parent_of.iter().skip(1).position(|p| p.is_none()) {
            return Err(format!("node {} is unreachable from the root", orphan + 1));
        }
        Ok(())
    }
}
