//! The discovery tree of a single test case.
//!
//! Nodes live in an arena indexed by [`NodeId`]. The tree only ever grows:
//! a node is appended the first time its site is reached and is never moved
//! or removed for the lifetime of the test case.

use serde::Serialize;

use super::site::SiteKey;

/// Index of a node inside a [`SubcaseTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// The test case body itself.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Exploration status of a node, persisted across passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeStatus {
    /// Discovered, but it or one of its descendants still needs a pass.
    Pending,
    /// Entered and completed, with every discovered child explored.
    Explored,
    /// Entered and left by a fatal failure. Never re-entered.
    Failed,
}

impl NodeStatus {
    pub fn is_explored(self) -> bool {
        !matches!(self, NodeStatus::Pending)
    }
}

#[derive(Debug, Clone)]
pub struct SubcaseNode {
    name: String,
    key: Option<SiteKey>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    status: NodeStatus,
    entered_this_pass: bool,
    branch_failed: bool,
    times_entered: u32,
}

impl SubcaseNode {
    fn new(name: String, key: Option<SiteKey>, parent: Option<NodeId>) -> Self {
        Self {
            name,
            key,
            parent,
            children: Vec::new(),
            status: NodeStatus::Pending,
            entered_this_pass: false,
            branch_failed: false,
            times_entered: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` only for the root.
    pub fn key(&self) -> Option<SiteKey> {
        self.key
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn entered_this_pass(&self) -> bool {
        self.entered_this_pass
    }

    /// True when an assertion failed or a fatal failure happened while this
    /// node was the innermost active subcase.
    pub fn branch_failed(&self) -> bool {
        self.branch_failed
    }

    pub fn times_entered(&self) -> u32 {
        self.times_entered
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SubcaseTree {
    nodes: Vec<SubcaseNode>,
}

impl SubcaseTree {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![SubcaseNode::new(root_name.into(), None, None)],
        }
    }

    pub fn root(&self) -> &SubcaseNode {
        &self.nodes[NodeId::ROOT.0]
    }

    pub fn node(&self, id: NodeId) -> &SubcaseNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SubcaseNode {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Number of discovered subcases. The root is not counted.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// True until the first subcase is discovered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SubcaseNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Whether nothing is left to run: the root itself is explored.
    pub fn is_exhausted(&self) -> bool {
        self.root().status.is_explored()
    }

    pub(crate) fn attach(&mut self, parent: NodeId, key: SiteKey, name: String) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SubcaseNode::new(name, Some(key), Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn all_children_explored(&self, id: NodeId) -> bool {
        self.nodes[id.0]
            .children
            .iter()
            .all(|child| self.nodes[child.0].status.is_explored())
    }

    pub(crate) fn mark_entered(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        node.entered_this_pass = true;
        node.times_entered += 1;
    }

    pub(crate) fn set_status(&mut self, id: NodeId, status: NodeStatus) {
        self.nodes[id.0].status = status;
    }

    pub(crate) fn mark_branch_failed(&mut self, id: NodeId) {
        self.nodes[id.0].branch_failed = true;
    }

    pub(crate) fn clear_pass_flags(&mut self) {
        for node in &mut self.nodes {
            node.entered_this_pass = false;
        }
    }

    /// Node ids from the root down to `id`, both included.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Subcase names from the first level below the root down to `id`.
    pub fn path_names(&self, id: NodeId) -> Vec<String> {
        self.path(id)
            .into_iter()
            .skip(1)
            .map(|n| self.nodes[n.0].name.clone())
            .collect()
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.path(id).len() - 1
    }

    /// Subcase nodes without children, in discovery (pre-)order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.root().children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.children.is_empty() {
                out.push(id);
            } else {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }
}
