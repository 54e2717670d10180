//! Application state shared between the archive client and whatever front end
//! drives it.
//!
//! Every transition takes the state by value and returns the next one. Nothing
//! here performs I/O.

use std::collections::BTreeSet;

use crate::charset::DEFAULT_CHARSET;
use crate::error::{Error, Result};
use crate::io::ArchiveListing;
use crate::tree::{TreeNode, build_tree, selectable_files};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub url: String,
    pub charset: String,
    /// Archive type reported by the last successful listing.
    pub file_type: Option<String>,
    /// Flat entry list from the last successful listing.
    pub files: Vec<String>,
    pub tree: Vec<TreeNode>,
    pub checked_keys: BTreeSet<String>,
    pub expanded_keys: BTreeSet<String>,
    /// Checked keys that name files; this is what gets packed.
    pub selected_files: Vec<String>,
    /// Message of the last failed operation.
    pub error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            url: String::new(),
            charset: DEFAULT_CHARSET.to_string(),
            file_type: None,
            files: Vec::new(),
            tree: Vec::new(),
            checked_keys: BTreeSet::new(),
            expanded_keys: BTreeSet::new(),
            selected_files: Vec::new(),
            error: None,
        }
    }
}

impl AppState {
    pub fn new(charset: &str) -> Self {
        Self {
            charset: charset.to_string(),
            ..Default::default()
        }
    }

    /// A new archive URL invalidates the listing and the selection.
    pub fn url_changed(self, url: &str) -> Self {
        Self {
            url: url.to_string(),
            charset: self.charset,
            ..Default::default()
        }
    }

    /// Pick another name encoding; the current listing stays until the next
    /// `list_succeeded`.
    pub fn charset_changed(self, charset: &str) -> Self {
        Self {
            charset: charset.to_string(),
            ..self
        }
    }

    /// Replace the tree with a fresh listing and clear the selection.
    pub fn list_succeeded(self, listing: ArchiveListing) -> Self {
        let tree = build_tree(&listing.files);
        Self {
            file_type: listing.file_type,
            files: listing.files,
            tree,
            checked_keys: BTreeSet::new(),
            expanded_keys: BTreeSet::new(),
            selected_files: Vec::new(),
            error: None,
            ..self
        }
    }

    /// Record a failure; the current tree and selection stay as they are.
    pub fn operation_failed(self, err: &Error) -> Self {
        Self {
            error: Some(err.to_string()),
            ..self
        }
    }

    /// Replace the set of checked keys.
    pub fn check(self, keys: BTreeSet<String>) -> Self {
        let selected_files = selectable_files(&keys);
        Self {
            checked_keys: keys,
            selected_files,
            ..self
        }
    }

    pub fn expand(self, keys: BTreeSet<String>) -> Self {
        Self {
            expanded_keys: keys,
            ..self
        }
    }

    pub fn dismiss_error(self) -> Self {
        Self { error: None, ..self }
    }

    /// The files to pack, or [`Error::EmptySelection`] when there are none.
    pub fn pack_request(&self) -> Result<&[String]> {
        if self.selected_files.is_empty() {
            return Err(Error::EmptySelection);
        }
        Ok(&self.selected_files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(files: &[&str]) -> ArchiveListing {
        ArchiveListing {
            file_type: Some("zip".to_string()),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn keys(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn list_then_check_builds_pack_request() {
        let state = AppState::new("utf-8")
            .url_changed("https://example.com/a.zip")
            .list_succeeded(listing(&["a/x.txt", "a/y.txt", "b.txt"]));

        let top: Vec<_> = state.tree.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(top, ["a/", "b.txt"]);
        let nested: Vec<_> = state.tree[0].children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(nested, ["x.txt", "y.txt"]);

        let state = state.check(keys(&["a/x.txt", "b.txt"]));
        assert_eq!(state.pack_request().expect("files selected"), ["a/x.txt", "b.txt"]);
    }

    #[test]
    fn directories_alone_are_an_empty_selection() {
        let state = AppState::default()
            .list_succeeded(listing(&["a/", "a/x.txt"]))
            .check(keys(&["a/"]));
        assert!(matches!(state.pack_request(), Err(Error::EmptySelection)));
    }

    #[test]
    fn url_change_resets_listing_and_selection() {
        let state = AppState::new("gbk")
            .url_changed("https://example.com/a.zip")
            .list_succeeded(listing(&["a.txt"]))
            .check(keys(&["a.txt"]))
            .expand(keys(&["a/"]))
            .url_changed("https://example.com/b.zip");

        assert_eq!(state.url, "https://example.com/b.zip");
        assert_eq!(state.charset, "gbk");
        assert!(state.tree.is_empty());
        assert!(state.files.is_empty());
        assert!(state.checked_keys.is_empty());
        assert!(state.expanded_keys.is_empty());
        assert!(state.selected_files.is_empty());
    }

    #[test]
    fn charset_change_keeps_listing_and_selection() {
        let state = AppState::new("utf-8")
            .url_changed("https://example.com/a.zip")
            .list_succeeded(listing(&["a/x.txt", "b.txt"]))
            .check(keys(&["b.txt"]));
        let changed = state.clone().charset_changed("shift-jis");

        assert_eq!(changed.charset, "shift-jis");
        assert_eq!(changed.url, state.url);
        assert_eq!(changed.tree, state.tree);
        assert_eq!(changed.checked_keys, state.checked_keys);
        assert_eq!(changed.pack_request().expect("files selected"), ["b.txt"]);

        // The next listing is decoded with the new charset and resets the selection
        let relisted = changed.list_succeeded(listing(&["a/x.txt", "b.txt"]));
        assert_eq!(relisted.charset, "shift-jis");
        assert!(relisted.checked_keys.is_empty());
    }

    #[test]
    fn relisting_resets_selection() {
        let state = AppState::default()
            .list_succeeded(listing(&["a.txt"]))
            .check(keys(&["a.txt"]))
            .list_succeeded(listing(&["a.txt", "b.txt"]));
        assert!(state.checked_keys.is_empty());
        assert_eq!(state.files.len(), 2);
    }

    #[test]
    fn failure_keeps_existing_tree() {
        let state = AppState::default()
            .list_succeeded(listing(&["a.txt"]))
            .check(keys(&["a.txt"]));
        let err = Error::Remote("archive not found".to_string());
        let failed = state.clone().operation_failed(&err);

        assert_eq!(failed.error.as_deref(), Some("archive not found"));
        assert_eq!(failed.tree, state.tree);
        assert_eq!(failed.selected_files, state.selected_files);
        assert!(failed.dismiss_error().error.is_none());
    }

    #[test]
    fn failed_first_listing_leaves_tree_empty() {
        let state = AppState::default()
            .url_changed("https://example.com/missing.zip")
            .operation_failed(&Error::Remote("archive not found".to_string()));
        assert!(state.tree.is_empty());
        assert_eq!(state.error.as_deref(), Some("archive not found"));
    }
}
