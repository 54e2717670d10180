//! # archpick
//!
//! Pick entries out of a remote archive and download them as one zip.
//!
//! This library is the client side of an archive proxy. The proxy opens a
//! remote zip, tar, 7z or rar archive on request, lists its entries and
//! repacks any selection of them into a fresh zip that is streamed back. The
//! client turns the flat entry list into a tree, maps the user's checked tree
//! nodes to entry paths, and streams the repacked archive to disk without
//! holding it in memory.
//!
//! ## Features
//!
//! - Entry tree reconstruction from flat, unordered path lists
//! - Checkbox-tree style selection (checking a directory checks its subtree)
//! - Streaming downloads with backpressure, via native sink forwarding or a
//!   read/write pump
//! - Entry names in legacy encodings, decoded by the proxy
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use archpick::{ArchiveClient, FileDestination, build_tree, select_drain, selectable_files};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ArchiveClient::new("http://127.0.0.1:8080", Duration::from_secs(30))?;
//!     let url = "https://example.com/archive.zip";
//!
//!     // List the archive and build the entry tree
//!     let listing = client.list(url, "utf-8").await?;
//!     let tree = build_tree(&listing.files);
//!     println!("{}", archpick::tree::render(&tree, false));
//!
//!     // Pack every file and save it
//!     let files = selectable_files(&listing.files);
//!     let body = client.pack(url, "utf-8", &files).await?;
//!     let mut dest = FileDestination::create("package.zip".as_ref(), true).await?;
//!     select_drain(&mut dest).drain(body, &mut dest).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod charset;
pub mod cli;
pub mod error;
pub mod io;
pub mod state;
pub mod tree;

pub use cli::Cli;
pub use error::{Error, Result};
pub use io::{
    ArchiveClient, ArchiveListing, ChunkStream, Destination, Drain, FileDestination, PipeDrain,
    PumpDrain, WriterDestination, select_drain,
};
pub use state::AppState;
pub use tree::{TreeNode, build_tree, selectable_files};
