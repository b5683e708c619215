//! Existence and file-type predicates for SFTP sessions.
//!
//! [`PathPredicates`] wraps anything implementing [`RemoteFileStat`], most
//! commonly a [`russh_sftp::client::SftpSession`], and answers `exists`,
//! `lexists`, `isfile`, `islink` and `isdir` with a plain `bool`.

#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate async_trait;

pub mod config;
pub mod error;
pub mod file_type;
/// In-memory filesystem
pub mod memory;
pub mod predicate;
pub mod stat;
/// Session setup over Russh
pub mod transport;

/// Metadata record returned by `stat` and `lstat`
pub type Metadata = russh_sftp::protocol::FileAttributes;

pub use config::StatConfig;
pub use error::StatError;
pub use file_type::{FileKind, FileMode};
pub use memory::MemoryFs;
pub use predicate::PathPredicates;
pub use stat::RemoteFileStat;
pub use transport::{from_channel, from_stream, open_sftp, StatSftp};
