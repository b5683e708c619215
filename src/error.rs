use russh_sftp::{client::error::Error as SftpError, protocol::StatusCode};
use thiserror::Error;

/// Failure of a `stat`/`lstat` call.
///
/// The first group of variants describes the remote filesystem and is what the
/// predicates collapse to `false`. [`StatError::Timeout`] and
/// [`StatError::Disconnected`] describe the transport underneath and are
/// surfaced by the `try_*` predicates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatError {
    #[error("No such file: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Broken symbolic link: {0}")]
    BrokenLink(String),
    #[error("Not a directory: {0}")]
    NotADirectory(String),
    #[error("{0}")]
    Other(String),
    /// Time limit for receiving the response exceeded
    #[error("Timeout")]
    Timeout,
    #[error("Disconnected: {0}")]
    Disconnected(String),
}

impl StatError {
    /// Returns `true` if the failure says nothing about the path itself
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout | Self::Disconnected(_))
    }

    /// Maps a client error for `path`. Status messages from the server are
    /// kept for [`StatError::Other`] only; the path is more useful elsewhere.
    pub fn from_sftp(path: &str, error: SftpError) -> Self {
        match error {
            SftpError::Status(status) => match status.status_code {
                StatusCode::NoSuchFile => Self::NotFound(path.to_owned()),
                StatusCode::PermissionDenied => Self::PermissionDenied(path.to_owned()),
                StatusCode::NoConnection | StatusCode::ConnectionLost => {
                    Self::Disconnected(status.error_message)
                }
                code => Self::Other(format!("{code}: {} ({path})", status.error_message)),
            },
            SftpError::Timeout => Self::Timeout,
            SftpError::IO(msg) => Self::Disconnected(msg),
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<SftpError> for StatError {
    fn from(error: SftpError) -> Self {
        match error {
            SftpError::Status(status) if status.status_code == StatusCode::NoSuchFile => {
                Self::NotFound(status.error_message)
            }
            SftpError::Status(status) if status.status_code == StatusCode::PermissionDenied => {
                Self::PermissionDenied(status.error_message)
            }
            other => Self::from_sftp("", other),
        }
    }
}

impl From<russh::Error> for StatError {
    fn from(error: russh::Error) -> Self {
        Self::Disconnected(error.to_string())
    }
}
