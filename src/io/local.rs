use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};

use super::sink::{Destination, PipeTarget, WriterDestination};
use crate::error::Result;

/// Local file that a download is saved to.
///
/// An aborted download removes the partially written file.
pub struct FileDestination {
    inner: WriterDestination<File>,
    path: PathBuf,
}

impl FileDestination {
    /// Create the output file, creating parent directories if needed.
    ///
    /// With `overwrite` unset an existing file is an error.
    pub async fn create(path: &Path, overwrite: bool) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(overwrite)
            .create_new(!overwrite)
            .truncate(overwrite)
            .open(path)
            .await?;
        debug!("FileDestination: writing {}", path.display());

        Ok(Self {
            inner: WriterDestination::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Destination for FileDestination {
    fn as_sink(&mut self) -> Option<&mut PipeTarget<'_>> {
        self.inner.as_sink()
    }

    async fn write(&mut self, chunk: Bytes) -> std::io::Result<()> {
        self.inner.write(chunk).await
    }

    async fn close(&mut self) -> std::io::Result<()> {
        self.inner.close().await
    }

    async fn abort(&mut self) {
        self.inner.abort().await;
        if let Err(err) = fs::remove_file(&self.path).await {
            warn!("Could not remove partial file {}: {}", self.path.display(), err);
        }
    }
}
