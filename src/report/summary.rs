use std::fmt;

use serde::Serialize;

use crate::engine::{NodeId, NodeStatus, SubcaseTree};

/// Leaf branches of a test case split by outcome.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BranchSummary {
    pub failed: usize,
    pub passed: usize,
}

impl BranchSummary {
    /// A leaf failed when it aborted or when an assertion failed while it was
    /// the innermost active subcase. Failures in ancestor code are not
    /// charged to any leaf.
    pub fn of(tree: &SubcaseTree) -> Self {
        let mut summary = Self::default();
        for leaf in tree.leaves() {
            let node = tree.node(leaf);
            if node.branch_failed() || node.status() == NodeStatus::Failed {
                summary.failed += 1;
            } else {
                summary.passed += 1;
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.failed + self.passed
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for BranchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed > 0 {
            write!(f, "[✘{}|✔︎{}]", self.failed, self.passed)
        } else {
            write!(f, "[✔︎{}]", self.passed)
        }
    }
}

/// Renders the discovered subcases, one line per node:
///
/// ```text
/// ⮑ "2" (at line 14)
///    ⮑  ✅ "2.1" (at line 16)
///    ⮑  ❌ "2.2" (at line 17)
/// ```
///
/// Locations are shortened to the line when a node is declared in the same
/// file as its parent. `test_file` is the file of the test case itself.
pub fn render_tree(tree: &SubcaseTree, test_file: Option<&str>) -> String {
    let mut out = String::new();
    for &child in tree.root().children() {
        render_node(tree, child, test_file, 0, &mut out);
    }
    out
}

fn render_node(
    tree: &SubcaseTree,
    id: NodeId,
    parent_file: Option<&str>,
    depth: usize,
    out: &mut String,
) {
    let node = tree.node(id);
    let Some(key) = node.key() else {
        return;
    };
    let marker = if !node.is_leaf() {
        ""
    } else if node.branch_failed() || node.status() == NodeStatus::Failed {
        " ❌ "
    } else if node.status().is_explored() {
        " ✅ "
    } else {
        " … "
    };
    let location = if parent_file == Some(key.site.file) {
        format!("at line {}", key.site.line)
    } else {
        format!("at {}:{}", key.site.file, key.site.line)
    };
    out.push_str(&" ".repeat(depth * 3));
    out.push_str(&format!("⮑ {}\"{}\" ({})\n", marker, node.name(), location));
    for &child in node.children() {
        render_node(tree, child, Some(key.site.file), depth + 1, out);
    }
}
