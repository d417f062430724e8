//! Transport abstraction for Pagecast.
//!
//! This module provides a pluggable transport layer that abstracts the
//! underlying connection (TCP, mock for testing).
//!
//! # Design
//!
//! The transport trait is async and connection-oriented, and works on raw
//! bytes because every wire message has a fixed size:
//! - `connect()` establishes a connection
//! - `send()` writes bytes
//! - `poll_readable()` waits a bounded time for incoming data
//! - `recv_exact()` reads an exact number of bytes
//! - `close()` gracefully terminates
//!
//! # Example
//!
//! ```ignore
//! let transport = TcpTransport::new();
//! transport.connect("127.0.0.1:1234").await?;
//! transport.send(&announcement).await?;
//! if transport.poll_readable(Duration::from_secs(1)).await? {
//!     let tag = transport.recv_exact(1).await?;
//! }
//! ```

mod mock;
mod tcp;

pub use mock::MockTransport;
pub use tcp::TcpTransport;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed by the peer.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Stream ended before the requested number of bytes arrived.
    #[error("stream ended early: expected {expected} bytes, got {actual}")]
    StreamEnded {
        /// Bytes requested.
        expected: usize,
        /// Bytes received before the end.
        actual: usize,
    },
}

/// Transport trait for exchanging fixed-layout Pagecast messages.
///
/// Implementations handle the underlying connection mechanism.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to a station at `address` (`host:port`).
    async fn connect(&self, address: &str) -> Result<(), TransportError>;

    /// Write all of `data`.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Wait up to `wait` for incoming data without consuming it.
    ///
    /// Returns `Ok(false)` when nothing arrived in time and
    /// `Err(ConnectionClosed)` when the peer closed the connection.
    async fn poll_readable(&self, wait: Duration) -> Result<bool, TransportError>;

    /// Read exactly `len` bytes.
    ///
    /// A stream that ends first yields `Err(StreamEnded)`; the caller
    /// decides whether that ends the exchange.
    async fn recv_exact(&self, len: usize) -> Result<Vec<u8>, TransportError>;

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Close the connection gracefully.
    async fn close(&self) -> Result<(), TransportError>;
}
