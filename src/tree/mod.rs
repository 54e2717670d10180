//! Archive entry tree.
//!
//! The archive proxy lists an archive as a flat, unordered array of entry
//! paths. This module turns that array into a navigable tree and maps a set of
//! checked tree keys back to the entry paths that can be packed.
//!
//! ## Architecture
//!
//! - [`node`]: the public [`TreeNode`] type, traversal and rendering helpers
//! - [`builder`]: flat path list to ordered tree ([`build_tree`])
//! - [`selection`]: checked keys to packable file paths
//!
//! ## Entry Path Conventions
//!
//! - Segments are separated by `/`; empty segments are ignored
//! - A trailing `/` marks a directory entry
//! - Directories may be implicit: `a/b.txt` alone creates the directory `a/`
//!
//! A node is a directory as soon as any entry says so, either with a trailing
//! slash or by having something below it. The classification never goes back
//! to "file", so the input order does not affect the result.

mod builder;
mod node;
mod selection;

pub use builder::build_tree;
pub use node::{TreeNode, Walk, find, render, walk};
pub use selection::{check_keys, match_patterns, selectable_files};
