//! TCP accept loop.
//!
//! Every accepted connection is handed to its own [`Session`] task. Accept
//! failures (for example running out of file descriptors) are logged and
//! retried after a short pause; they never stop the station.

use crate::error::Result;
use crate::server::Station;
use crate::session::Session;
use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

/// Pause after a failed accept before trying again.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Source of incoming connections.
#[async_trait]
pub trait Acceptor: Send {
    /// Connection stream type.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Wait for the next connection and its peer description.
    async fn accept(&mut self) -> io::Result<(Self::Stream, String)>;
}

#[async_trait]
impl Acceptor for TcpListener {
    type Stream = TcpStream;

    async fn accept(&mut self) -> io::Result<(TcpStream, String)> {
        let (stream, peer) = TcpListener::accept(self).await?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Could not set TCP_NODELAY for {}: {}", peer, e);
        }
        Ok((stream, peer.to_string()))
    }
}

/// Bind a listener on the configured address.
///
/// # Errors
///
/// Returns an error if the address is invalid or cannot be bound.
pub async fn bind(station: &Station) -> Result<TcpListener> {
    let addr = station.config().bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Station listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accept connections forever, one session task per connection.
pub async fn serve<A: Acceptor>(station: Arc<Station>, mut acceptor: A) {
    loop {
        let (stream, peer) = match acceptor.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!("Accept failed: {}; retrying in {:?}", e, ACCEPT_BACKOFF);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        station.record_connection();

        let session = Session::new(Arc::clone(&station), stream, peer.clone());
        tokio::spawn(async move {
            if let Err(e) = session.run().await {
                tracing::warn!("Session error from {}: {}", peer, e);
            }
        });
    }
}
