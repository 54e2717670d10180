use thiserror::Error;

/// Failures surfaced to the caller of the archive client and the streaming sink.
///
/// Every variant is recoverable: the caller decides how to present it and any
/// previously listed tree stays as it was.
#[derive(Error, Debug)]
pub enum Error {
    /// The archive URL could not be parsed. No request was sent.
    #[error("Invalid archive URL: {0}")]
    InvalidUrl(String),

    /// The backend answered with HTTP 500; the body is shown verbatim.
    #[error("{0}")]
    Remote(String),

    /// Network failure, undecodable response or unexpected status.
    #[error("Invalid URL or network error: {0}")]
    Transport(String),

    /// Nothing but directories (or nothing at all) was checked.
    #[error("Please select at least one file to download")]
    EmptySelection,

    /// The destination failed while a download was being written.
    #[error("Download error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
