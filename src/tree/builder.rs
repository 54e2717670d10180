//! Flat entry list to tree conversion.
//!
//! ## Strategy
//!
//! 1. Walk every path in input order, creating one working node per segment
//! 2. Mark directories: explicit `dir/` entries and every intermediate segment
//! 3. Convert the working nodes into [`TreeNode`]s, sorting each level
//!
//! The working nodes live only for the duration of one [`build_tree`] call.

use std::collections::BTreeMap;

use log::trace;

use super::node::TreeNode;

/// Mutable per-segment record used while walking the flat list.
#[derive(Default)]
struct WorkNode {
    /// Set once any entry shows this segment is a directory; never cleared.
    is_dir: bool,
    children: BTreeMap<String, WorkNode>,
}

impl WorkNode {
    /// Insert one entry path below this node.
    fn insert(&mut self, path: &str) {
        let is_dir_entry = path.ends_with('/');
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();

        let mut current = self;
        while let Some(segment) = segments.next() {
            let is_last = segments.peek().is_none();
            let node = current.children.entry(segment.to_string()).or_default();
            if !is_last || is_dir_entry {
                node.is_dir = true;
            }
            current = node;
        }
    }

    /// Convert the children of this node into an ordered forest.
    fn into_forest(self, prefix: &str) -> Vec<TreeNode> {
        let mut nodes: Vec<TreeNode> = self
            .children
            .into_iter()
            .map(|(name, child)| {
                let is_dir = child.is_dir || !child.children.is_empty();
                let key = if is_dir {
                    format!("{prefix}{name}/")
                } else {
                    format!("{prefix}{name}")
                };
                let children = if is_dir {
                    child.into_forest(&key)
                } else {
                    Vec::new()
                };
                TreeNode {
                    key,
                    name,
                    is_leaf: !is_dir,
                    children,
                }
            })
            .collect();

        // Directories before files; the map already yields names in order.
        nodes.sort_by(|a, b| a.is_leaf.cmp(&b.is_leaf).then_with(|| a.name.cmp(&b.name)));
        nodes
    }
}

/// Build the entry tree for a flat list of archive paths.
///
/// Never fails: empty strings and empty segments are skipped, duplicates are
/// merged and an empty list gives an empty forest.
///
/// # Examples
///
/// ```
/// use archpick::build_tree;
///
/// let tree = build_tree(["b.txt", "a/", "a/x.txt"]);
/// assert_eq!(tree[0].key, "a/");
/// assert_eq!(tree[0].children[0].key, "a/x.txt");
/// assert_eq!(tree[1].key, "b.txt");
/// ```
pub fn build_tree<I, S>(paths: I) -> Vec<TreeNode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut root = WorkNode::default();
    let mut count = 0usize;
    for path in paths {
        root.insert(path.as_ref());
        count += 1;
    }
    trace!("build_tree: {} paths, {} top-level nodes", count, root.children.len());
    root.into_forest("")
}
