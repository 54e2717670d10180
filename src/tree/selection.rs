use std::collections::BTreeSet;

use glob::Pattern;
use log::warn;

use super::node::{TreeNode, find, walk};

/// Keep only the checked keys that name files.
///
/// Directory keys (trailing `/`) only group entries in the tree; the proxy
/// cannot pack them on their own. The remaining keys are returned verbatim in
/// iteration order. An empty result means there is nothing to download.
pub fn selectable_files<I, S>(checked: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    checked
        .into_iter()
        .filter(|key| !key.as_ref().ends_with('/'))
        .map(|key| key.as_ref().to_string())
        .collect()
}

/// Resolve checked keys the way a checkbox tree does.
///
/// Checking a directory checks every node below it. Keys that do not exist in
/// the tree are dropped.
pub fn check_keys<I, S>(forest: &[TreeNode], keys: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut checked = BTreeSet::new();
    for key in keys {
        let key = key.as_ref();
        match find(forest, key) {
            Some(node) => checked.extend(node.walk().map(|n| n.key.clone())),
            None => warn!("check_keys: no entry {:?} in archive", key),
        }
    }
    checked
}

/// Select tree keys from user-supplied patterns.
///
/// With no `include` patterns every node is checked. Otherwise a pattern
/// containing `*`, `?` or `[` is glob-matched against full keys; a plain
/// pattern matches a key exactly (with or without the directory slash) or a
/// node name. Matched directories check their whole subtree. File keys that
/// contain an `exclude` pattern, or match it as a glob, are unchecked
/// afterwards.
pub fn match_patterns(
    forest: &[TreeNode],
    include: &[String],
    exclude: &[String],
) -> BTreeSet<String> {
    let include: Vec<EntryPattern> = include.iter().map(|p| EntryPattern::new(p)).collect();
    let exclude: Vec<EntryPattern> = exclude.iter().map(|p| EntryPattern::new(p)).collect();

    let mut checked = BTreeSet::new();
    for node in walk(forest) {
        // Pre-order: an already checked node was covered by a matched ancestor
        if checked.contains(&node.key) {
            continue;
        }
        if include.is_empty() || include.iter().any(|p| p.selects(node)) {
            checked.extend(node.walk().map(|n| n.key.clone()));
        }
    }

    checked.retain(|key| key.ends_with('/') || !exclude.iter().any(|x| x.excludes(key)));
    checked
}

/// A FILES or `-x` pattern, compiled once per selection.
struct EntryPattern {
    raw: String,
    glob: Option<Pattern>,
}

impl EntryPattern {
    fn new(raw: &str) -> Self {
        let glob = if has_glob_chars(raw) {
            match Pattern::new(raw) {
                Ok(pattern) => Some(pattern),
                Err(err) => {
                    warn!("pattern {:?} is not a valid glob ({}), matching it literally", raw, err);
                    None
                }
            }
        } else {
            None
        };
        Self { raw: raw.to_string(), glob }
    }

    /// `*` and `?` also match `/`, so `*.png` finds images at any depth.
    fn matches_glob(&self, key: &str) -> bool {
        self.glob.as_ref().is_some_and(|glob| glob.matches(key))
    }

    fn selects(&self, node: &TreeNode) -> bool {
        if self.glob.is_some() {
            return self.matches_glob(&node.key);
        }
        let raw = self.raw.as_str();
        node.key == raw || node.key.trim_end_matches('/') == raw || node.name == raw
    }

    fn excludes(&self, key: &str) -> bool {
        key.contains(self.raw.as_str()) || self.matches_glob(key)
    }
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_tree;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn directories_are_not_selectable() {
        let checked: BTreeSet<&str> = ["docs/", "docs/readme.md", "img/"].into_iter().collect();
        assert_eq!(selectable_files(checked), ["docs/readme.md"]);
    }

    #[test]
    fn empty_selection_stays_empty() {
        assert!(selectable_files(BTreeSet::<String>::new()).is_empty());
        assert!(selectable_files(["only/", "dirs/"]).is_empty());
    }

    #[test]
    fn checking_a_directory_checks_descendants() {
        let tree = build_tree(["a/x.txt", "a/b/y.txt", "c.txt"]);
        let checked = check_keys(&tree, ["a/"]);
        let expected: BTreeSet<String> =
            strings(&["a/", "a/b/", "a/b/y.txt", "a/x.txt"]).into_iter().collect();
        assert_eq!(checked, expected);
        assert_eq!(selectable_files(&checked), ["a/b/y.txt", "a/x.txt"]);
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let tree = build_tree(["a.txt"]);
        assert!(check_keys(&tree, ["missing.txt"]).is_empty());
    }

    #[test]
    fn no_patterns_select_everything() {
        let tree = build_tree(["a/x.txt", "b.txt"]);
        let files = selectable_files(match_patterns(&tree, &[], &[]));
        assert_eq!(files, ["a/x.txt", "b.txt"]);
    }

    #[test]
    fn plain_patterns_match_keys_and_names() {
        let tree = build_tree(["src/main.rs", "src/lib.rs", "docs/main.rs", "README"]);
        let files = selectable_files(match_patterns(&tree, &strings(&["main.rs"]), &[]));
        assert_eq!(files, ["docs/main.rs", "src/main.rs"]);

        let files = selectable_files(match_patterns(&tree, &strings(&["src"]), &[]));
        assert_eq!(files, ["src/lib.rs", "src/main.rs"]);
    }

    #[test]
    fn glob_patterns_and_excludes() {
        let tree = build_tree(["img/a.png", "img/b.jpg", "img/c.png", "notes.txt"]);
        let files = selectable_files(match_patterns(&tree, &strings(&["*.png"]), &[]));
        assert_eq!(files, ["img/a.png", "img/c.png"]);

        let checked = match_patterns(&tree, &strings(&["img/"]), &strings(&["c.png"]));
        let files = selectable_files(checked);
        assert_eq!(files, ["img/a.png", "img/b.jpg"]);
    }

    #[test]
    fn glob_wildcards() {
        let matches = |pattern: &str, key: &str| EntryPattern::new(pattern).matches_glob(key);
        assert!(matches("*.txt", "readme.txt"));
        assert!(matches("file?.dat", "file1.dat"));
        assert!(matches("a/*", "a/b/c"));
        assert!(matches("img/[ab].png", "img/b.png"));
        assert!(!matches("*.txt", "readme.md"));
    }

    #[test]
    fn many_stars_do_not_backtrack_forever() {
        let key = "a".repeat(40);
        let tree = build_tree([key.as_str(), "ab"]);
        let checked = match_patterns(&tree, &strings(&["*a*a*a*a*a*a*a*b"]), &[]);
        let files = selectable_files(checked);
        assert!(files.is_empty());

        let pattern = "*a".repeat(20) + "*";
        let files = selectable_files(match_patterns(&tree, &[], &[pattern]));
        assert_eq!(files, ["ab"]);
    }

    #[test]
    fn invalid_glob_is_matched_literally() {
        let tree = build_tree(["logs/[old/a.txt", "logs/new/b.txt"]);
        let files = selectable_files(match_patterns(&tree, &strings(&["[old"]), &[]));
        assert_eq!(files, ["logs/[old/a.txt"]);

        let all = strings(&["logs"]);
        let files = selectable_files(match_patterns(&tree, &all, &strings(&["[old"])));
        assert_eq!(files, ["logs/new/b.txt"]);
    }
}
