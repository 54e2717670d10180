use futures_util::{StreamExt, TryStreamExt};
use log::{debug, info, warn};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use url::Url;

use super::sink::ChunkStream;
use crate::charset;
use crate::error::{Error, Result};

/// File name a packed selection is saved under unless told otherwise.
pub const DEFAULT_PACKAGE_NAME: &str = "package.zip";

/// Body of a successful `/list` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArchiveListing {
    /// Archive type detected by the proxy (`zip`, `tar`, `7z`, `rar`).
    #[serde(rename = "FileType", default)]
    pub file_type: Option<String>,
    /// Every entry path in the archive, directories with a trailing `/`.
    #[serde(rename = "Files", default, deserialize_with = "null_as_empty")]
    pub files: Vec<String>,
}

/// The proxy sends `"Files": null` for an archive without entries.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Client for an archive proxy server.
///
/// The proxy opens remote archives on the client's behalf: it lists their
/// entries, repacks a selection into a fresh zip, or streams a single entry.
pub struct ArchiveClient {
    client: Client,
    server: Url,
    format: Option<String>,
}

impl ArchiveClient {
    /// Create a client for the proxy at `server`.
    pub fn new(server: &str, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Self::with_http_client(server, client)
    }

    /// Create a client that sends its requests through `client`.
    pub fn with_http_client(server: &str, client: Client) -> Result<Self> {
        let server = Url::parse(server)?;
        if server.cannot_be_a_base() {
            let message = format!("{server} cannot be used as a server address");
            return Err(Error::InvalidUrl(message));
        }
        Ok(Self {
            client,
            server,
            format: None,
        })
    }

    /// Skip the proxy's format detection and treat archives as `format`.
    pub fn with_format(mut self, format: Option<String>) -> Self {
        self.format = format;
        self
    }

    /// Check that the proxy is up.
    pub async fn health(&self) -> Result<()> {
        let url = self.endpoint(&["healthz"])?;
        debug!("GET {}", url);
        let resp = check_status(self.client.get(url).send().await?).await?;
        let body = resp.text().await?;
        if body.trim() != "OK" {
            return Err(Error::Transport(format!("unexpected health check reply: {body}")));
        }
        Ok(())
    }

    /// List the entries of the archive at `archive_url`.
    pub async fn list(&self, archive_url: &str, charset: &str) -> Result<ArchiveListing> {
        let url = self.archive_endpoint(&["list"], archive_url, charset)?;
        debug!("GET {}", url);
        let resp = check_status(self.client.get(url).send().await?).await?;
        let listing: ArchiveListing = resp.json().await?;
        info!(
            "Listed {} entries ({})",
            listing.files.len(),
            listing.file_type.as_deref().unwrap_or("unknown type")
        );
        Ok(listing)
    }

    /// Ask the proxy to repack `files` from the archive into one zip.
    ///
    /// Returns the response body as a stream; nothing is buffered here. An
    /// empty selection is refused without contacting the proxy.
    pub async fn pack(
        &self,
        archive_url: &str,
        charset: &str,
        files: &[String],
    ) -> Result<ChunkStream> {
        if files.is_empty() {
            return Err(Error::EmptySelection);
        }
        let url = self.archive_endpoint(&["pack"], archive_url, charset)?;
        debug!("POST {} ({} files)", url, files.len());
        let body = serde_json::to_vec(files).map_err(|e| Error::Transport(e.to_string()))?;
        let resp = self.client.post(url).body(body).send().await?;
        Ok(body_stream(check_status(resp).await?))
    }

    /// Stream a single entry of the archive, unpacked.
    pub async fn stream_entry(
        &self,
        archive_url: &str,
        charset: &str,
        name: &str,
    ) -> Result<ChunkStream> {
        let mut segments = vec!["stream"];
        segments.extend(name.split('/').filter(|s| !s.is_empty()));
        let url = self.archive_endpoint(&segments, archive_url, charset)?;
        self.get_stream(url).await
    }

    /// Stream the entry at position `index` of the archive, unpacked.
    ///
    /// Entries are counted in the archive's own order, starting at zero. This
    /// is also how single-stream compressed files (`.gz`, `.xz`, `.bz2`) are
    /// fetched: they cannot be listed, and their only entry has index 0.
    pub async fn stream_index(
        &self,
        archive_url: &str,
        charset: &str,
        index: usize,
    ) -> Result<ChunkStream> {
        let mut url = self.archive_endpoint(&["stream"], archive_url, charset)?;
        url.query_pairs_mut().append_pair("index", &index.to_string());
        self.get_stream(url).await
    }

    async fn get_stream(&self, url: Url) -> Result<ChunkStream> {
        debug!("GET {}", url);
        let resp = self.client.get(url).send().await?;
        Ok(body_stream(check_status(resp).await?))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.server.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.server.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn archive_endpoint(
        &self,
        segments: &[&str],
        archive_url: &str,
        charset: &str,
    ) -> Result<Url> {
        // Validate before anything goes on the wire
        let archive_url = validate_archive_url(archive_url)?;
        if !charset::is_supported(charset) {
            warn!("Charset {:?} is not known to the proxy", charset);
        }
        let mut url = self.endpoint(segments)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("charset", charset);
            query.append_pair("url", archive_url.as_str());
            if let Some(format) = &self.format {
                query.append_pair("format", format);
            }
        }
        Ok(url)
    }
}

/// Parse the archive URL the user typed.
pub fn validate_archive_url(archive_url: &str) -> Result<Url> {
    Url::parse(archive_url.trim()).map_err(|e| Error::InvalidUrl(format!("{archive_url}: {e}")))
}

/// Map proxy failures onto the error taxonomy.
///
/// A 500 carries a human readable message in its body, which is passed on
/// unchanged. Any other non-success status is a transport problem.
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        let message = resp.text().await?;
        return Err(Error::Remote(message));
    }
    if !status.is_success() {
        return Err(Error::Transport(format!("HTTP request failed with status: {status}")));
    }
    Ok(resp)
}

fn body_stream(resp: Response) -> ChunkStream {
    resp.bytes_stream().map_err(std::io::Error::other).boxed()
}
