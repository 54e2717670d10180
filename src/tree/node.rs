use std::fmt::Write;

/// One path segment of an archive, as shown in the entry tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Full path from the archive root, `/`-joined.
    ///
    /// Carries a trailing `/` if and only if the node is a directory.
    pub key: String,
    /// Last path segment, used as the display label.
    pub name: String,
    /// True when the node was only ever seen as a file.
    pub is_leaf: bool,
    /// Directories first, then files, each group sorted by name.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_dir(&self) -> bool {
        !self.is_leaf
    }

    /// Depth-first iterator over this node and everything below it.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Number of file nodes at or below this node.
    pub fn file_count(&self) -> usize {
        self.walk().filter(|n| n.is_leaf).count()
    }
}

/// Pre-order traversal over a forest of [`TreeNode`]s.
pub struct Walk<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Walk every node of a forest in display order.
pub fn walk(forest: &[TreeNode]) -> Walk<'_> {
    Walk {
        stack: forest.iter().rev().collect(),
    }
}

/// Look up a node by its exact key.
pub fn find<'a>(forest: &'a [TreeNode], key: &str) -> Option<&'a TreeNode> {
    walk(forest).find(|n| n.key == key)
}

/// Render a forest as an indented listing.
///
/// With `show_keys`, every line is followed by the node's full key, which is
/// what has to be passed back to select it.
pub fn render(forest: &[TreeNode], show_keys: bool) -> String {
    fn render_level(out: &mut String, nodes: &[TreeNode], depth: usize, show_keys: bool) {
        for node in nodes {
            let label = if node.is_dir() {
                format!("{}/", node.name)
            } else {
                node.name.clone()
            };
            let indent = "  ".repeat(depth);
            if show_keys {
                let _ = writeln!(out, "{indent}{label:<40}  {}", node.key);
            } else {
                let _ = writeln!(out, "{indent}{label}");
            }
            render_level(out, &node.children, depth + 1, show_keys);
        }
    }

    let mut out = String::new();
    render_level(&mut out, forest, 0, show_keys);
    out
}
