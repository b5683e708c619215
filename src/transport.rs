//! Opening SFTP sessions that carry the path predicates.
//!
//! The steps mirror the usual client setup: an authenticated SSH connection
//! opens a session channel, the channel requests the `sftp` subsystem, and
//! the channel stream becomes an [`SftpSession`].

use russh::{
    client::{self, Msg},
    Channel,
};
use russh_sftp::client::SftpSession;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{config::StatConfig, error::StatError, predicate::PathPredicates};

/// SFTP session wrapped in the predicate layer
pub type StatSftp = PathPredicates<SftpSession>;

/// Opens a new SFTP session on an authenticated connection
pub async fn open_sftp<H>(
    handle: &client::Handle<H>,
    config: &StatConfig,
) -> Result<StatSftp, StatError>
where
    H: client::Handler,
{
    let channel = handle.channel_open_session().await?;
    from_channel(channel, config).await
}

/// Starts the `sftp` subsystem on an open session channel
pub async fn from_channel(
    mut channel: Channel<Msg>,
    config: &StatConfig,
) -> Result<StatSftp, StatError> {
    channel.request_subsystem(true, "sftp").await?;
    from_stream(channel.into_stream(), config).await
}

/// Initializes the protocol over an already established subsystem stream
pub async fn from_stream<S>(stream: S, config: &StatConfig) -> Result<StatSftp, StatError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let session = SftpSession::new(stream).await?;
    if let Some(secs) = config.timeout_secs {
        session.set_timeout(secs);
    }

    info!("sftp session opened");

    let mut sftp = PathPredicates::new(session);
    if let Some(cwd) = config.cwd.as_deref() {
        sftp.chdir(Some(cwd)).await?;
    }

    Ok(sftp)
}
