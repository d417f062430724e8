//! TcpTransport - plain TCP connection to a station.

use super::{Transport, TransportError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// TcpTransport implements the Transport trait over a tokio `TcpStream`.
///
/// `connect` has no deadline of its own; the caller bounds it (see
/// `SenderConfig::connect_timeout`).
///
/// # Example
///
/// ```ignore
/// let transport = TcpTransport::new();
/// transport.connect("192.168.1.10:1234").await?;
/// transport.send(&bytes).await?;
/// ```
pub struct TcpTransport {
    stream: Mutex<Option<TcpStream>>,
    connected: AtomicBool,
}

impl TcpTransport {
    /// Create an unconnected transport.
    pub fn new() -> Self {
        Self {
            stream: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    fn mark_closed(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self, address: &str) -> Result<(), TransportError> {
        // Close existing connection if any
        self.close().await.ok();

        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| TransportError::ConnectionFailed(format!("{address}: {e}")))?;
        stream.set_nodelay(true).ok();

        *self.stream.lock().await = Some(stream);
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!("Connected to {}", address);
        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or(TransportError::NotConnected)?;

        stream
            .write_all(data)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn poll_readable(&self, wait: Duration) -> Result<bool, TransportError> {
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or(TransportError::NotConnected)?;

        let mut peek_buf = [0u8; 1];
        match tokio::time::timeout(wait, stream.peek(&mut peek_buf)).await {
            Err(_) => Ok(false),
            Ok(Ok(0)) => {
                self.mark_closed();
                Err(TransportError::ConnectionClosed)
            }
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) => Err(TransportError::ReceiveFailed(e.to_string())),
        }
    }

    async fn recv_exact(&self, len: usize) -> Result<Vec<u8>, TransportError> {
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or(TransportError::NotConnected)?;

        let mut data = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = stream
                .read(&mut data[filled..])
                .await
                .map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;
            if n == 0 {
                self.mark_closed();
                return Err(TransportError::StreamEnded {
                    expected: len,
                    actual: filled,
                });
            }
            filled += n;
        }
        Ok(data)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.mark_closed();
        if let Some(mut stream) = self.stream.lock().await.take() {
            stream.shutdown().await.ok();
        }
        Ok(())
    }
}
