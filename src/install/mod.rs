//! Archive installer - makes a build's executable available on local disk.
//!
//! Archives are downloaded on demand and extracted to a path derived from the
//! commit. A marker file records a completed install so repeat calls are free.

mod extract;
mod fetcher;
mod installer;

pub use extract::extract_archive;
pub use fetcher::{ArchiveFetcher, HttpArchiveFetcher};
pub use installer::{ArchiveInstaller, INSTALL_MARKER};
