mod http;
mod local;
pub mod sink;

pub use http::{ArchiveClient, ArchiveListing, DEFAULT_PACKAGE_NAME, validate_archive_url};
pub use local::FileDestination;
pub use sink::{
    ChunkStream, Destination, Drain, PipeDrain, PumpDrain, WriterDestination, select_drain,
};
