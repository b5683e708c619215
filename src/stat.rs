use std::sync::Arc;

use russh_sftp::client::SftpSession;

use crate::{error::StatError, predicate::PathPredicates, Metadata};

/// The two resolution primitives the predicates are built on.
/// This is `async_trait`
#[async_trait]
pub trait RemoteFileStat: Send + Sync {
    /// Resolves `path`, following symlinks to their final target.
    async fn stat(&self, path: &str) -> Result<Metadata, StatError>;

    /// Resolves `path` without following a final symlink component.
    async fn lstat(&self, path: &str) -> Result<Metadata, StatError>;

    /// Requests the absolute form of `path`. Used by
    /// [`PathPredicates::chdir`]; the default returns `path` unchanged.
    async fn canonicalize(&self, path: &str) -> Result<String, StatError> {
        Ok(path.to_owned())
    }

    /// Wraps a borrow of this client in the predicate layer
    fn predicates(&self) -> PathPredicates<&Self>
    where
        Self: Sized,
    {
        PathPredicates::new(self)
    }
}

#[async_trait]
impl RemoteFileStat for SftpSession {
    async fn stat(&self, path: &str) -> Result<Metadata, StatError> {
        self.metadata(path)
            .await
            .map_err(|e| StatError::from_sftp(path, e))
    }

    async fn lstat(&self, path: &str) -> Result<Metadata, StatError> {
        self.symlink_metadata(path)
            .await
            .map_err(|e| StatError::from_sftp(path, e))
    }

    async fn canonicalize(&self, path: &str) -> Result<String, StatError> {
        SftpSession::canonicalize(self, path)
            .await
            .map_err(|e| StatError::from_sftp(path, e))
    }
}

macro_rules! impl_for_pointer {
    ($($ptr:ty => [$($gen:tt)*]),*) => {
        $(
            #[async_trait]
            impl<$($gen)*> RemoteFileStat for $ptr {
                async fn stat(&self, path: &str) -> Result<Metadata, StatError> {
                    (**self).stat(path).await
                }

                async fn lstat(&self, path: &str) -> Result<Metadata, StatError> {
                    (**self).lstat(path).await
                }

                async fn canonicalize(&self, path: &str) -> Result<String, StatError> {
                    (**self).canonicalize(path).await
                }
            }
        )*
    };
}

impl_for_pointer!(
    &'a T => ['a, T: RemoteFileStat + ?Sized],
    Arc<T> => [T: RemoteFileStat + ?Sized]
);
