//! Mock transport for testing.
//!
//! Incoming data is a byte stream: queued responses are appended to one
//! buffer and `recv_exact` takes from its front, like a socket would.

use super::{Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Mock transport for testing.
///
/// Allows queueing response bytes and capturing sent messages for
/// verification. Polling never sleeps: it reports whether queued bytes
/// remain.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    connected: bool,
    connected_address: Option<String>,
    sent_messages: Vec<Vec<u8>>,
    receive_buffer: VecDeque<u8>,
    close_when_drained: bool,
    polls: usize,
    fail_next_connect: Option<String>,
    connect_delay: Option<Duration>,
    fail_next_send: Option<String>,
    fail_next_recv: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append bytes to the incoming stream.
    pub fn queue_response(&self, data: impl AsRef<[u8]>) {
        self.lock().receive_buffer.extend(data.as_ref());
    }

    /// Behave as if the peer closes the connection once the queued bytes
    /// have been read.
    pub fn close_when_drained(&self) {
        self.lock().close_when_drained = true;
    }

    /// Get all messages that were sent.
    pub fn sent_messages(&self) -> Vec<Vec<u8>> {
        self.lock().sent_messages.clone()
    }

    /// Get the last message that was sent.
    pub fn last_sent(&self) -> Option<Vec<u8>> {
        self.lock().sent_messages.last().cloned()
    }

    /// Get the address that was connected to.
    pub fn connected_address(&self) -> Option<String> {
        self.lock().connected_address.clone()
    }

    /// Number of `poll_readable` calls so far.
    pub fn polls(&self) -> usize {
        self.lock().polls
    }

    /// Bytes still waiting to be read.
    pub fn pending_bytes(&self) -> usize {
        self.lock().receive_buffer.len()
    }

    /// Cause the next connect() to fail with the given error.
    pub fn fail_next_connect(&self, error: &str) {
        self.lock().fail_next_connect = Some(error.to_string());
    }

    /// Make the next connect() take `delay` before completing.
    pub fn delay_next_connect(&self, delay: Duration) {
        self.lock().connect_delay = Some(delay);
    }

    /// Cause the next send() to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        self.lock().fail_next_send = Some(error.to_string());
    }

    /// Cause the next recv_exact() to fail with the given error.
    pub fn fail_next_recv(&self, error: &str) {
        self.lock().fail_next_recv = Some(error.to_string());
    }

}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, address: &str) -> Result<(), TransportError> {
        let delay = self.lock().connect_delay.take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.lock();

        if let Some(error) = inner.fail_next_connect.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        inner.connected = true;
        inner.connected_address = Some(address.to_string());
        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.lock();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }

        if let Some(error) = inner.fail_next_send.take() {
            return Err(TransportError::SendFailed(error));
        }

        inner.sent_messages.push(data.to_vec());
        Ok(())
    }

    async fn poll_readable(&self, _wait: Duration) -> Result<bool, TransportError> {
        let mut inner = self.lock();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }

        inner.polls += 1;
        if !inner.receive_buffer.is_empty() {
            Ok(true)
        } else if inner.close_when_drained {
            Err(TransportError::ConnectionClosed)
        } else {
            Ok(false)
        }
    }

    async fn recv_exact(&self, len: usize) -> Result<Vec<u8>, TransportError> {
        let mut inner = self.lock();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }

        if let Some(error) = inner.fail_next_recv.take() {
            return Err(TransportError::ReceiveFailed(error));
        }

        let available = inner.receive_buffer.len();
        if available < len {
            inner.receive_buffer.clear();
            return Err(TransportError::StreamEnded {
                expected: len,
                actual: available,
            });
        }
        Ok(inner.receive_buffer.drain(..len).collect())
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.lock().connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(1);

    // ===========================================
    // MockTransport Basic Tests
    // ===========================================

    #[tokio::test]
    async fn mock_transport_connects() {
        let transport = MockTransport::new();
        assert!(!transport.is_connected());

        transport.connect("127.0.0.1:1234").await.unwrap();

        assert!(transport.is_connected());
        assert_eq!(
            transport.connected_address(),
            Some("127.0.0.1:1234".to_string())
        );
    }

    #[tokio::test]
    async fn mock_transport_sends_messages() {
        let transport = MockTransport::new();
        transport.connect("station").await.unwrap();

        transport.send(&[1, 2, 0]).await.unwrap();
        transport.send(b"page").await.unwrap();

        let sent = transport.sent_messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], vec![1, 2, 0]);
        assert_eq!(sent[1], b"page");
    }

    #[tokio::test]
    async fn queued_bytes_form_one_stream() {
        let transport = MockTransport::new();
        transport.connect("station").await.unwrap();

        transport.queue_response([3, 1, 0]);
        transport.queue_response([0, 0]);

        assert!(transport.poll_readable(WAIT).await.unwrap());
        assert_eq!(transport.recv_exact(1).await.unwrap(), vec![3]);
        assert_eq!(transport.recv_exact(4).await.unwrap(), vec![1, 0, 0, 0]);
        assert!(!transport.poll_readable(WAIT).await.unwrap());
        assert_eq!(transport.polls(), 2);
    }

    #[tokio::test]
    async fn short_read_reports_stream_ended() {
        let transport = MockTransport::new();
        transport.connect("station").await.unwrap();
        transport.queue_response([9, 9]);

        let result = transport.recv_exact(4).await;
        assert!(matches!(
            result,
            Err(TransportError::StreamEnded {
                expected: 4,
                actual: 2
            })
        ));
        assert_eq!(transport.pending_bytes(), 0);
    }

    #[tokio::test]
    async fn close_when_drained_reports_closed_after_data() {
        let transport = MockTransport::new();
        transport.connect("station").await.unwrap();
        transport.queue_response([1]);
        transport.close_when_drained();

        assert!(transport.poll_readable(WAIT).await.unwrap());
        transport.recv_exact(1).await.unwrap();
        assert!(matches!(
            transport.poll_readable(WAIT).await,
            Err(TransportError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn mock_transport_closes() {
        let transport = MockTransport::new();
        transport.connect("station").await.unwrap();
        assert!(transport.is_connected());

        transport.close().await.unwrap();
        assert!(!transport.is_connected());
    }

    // ===========================================
    // Error Condition Tests
    // ===========================================

    #[tokio::test]
    async fn io_without_connect_fails() {
        let transport = MockTransport::new();

        assert!(matches!(
            transport.send(b"data").await,
            Err(TransportError::NotConnected)
        ));
        assert!(matches!(
            transport.recv_exact(1).await,
            Err(TransportError::NotConnected)
        ));
        assert!(matches!(
            transport.poll_readable(WAIT).await,
            Err(TransportError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn forced_connect_failure() {
        let transport = MockTransport::new();
        transport.fail_next_connect("network unreachable");

        let result = transport.connect("station").await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn forced_send_failure() {
        let transport = MockTransport::new();
        transport.connect("station").await.unwrap();
        transport.fail_next_send("broken pipe");

        let result = transport.send(b"data").await;
        assert!(matches!(result, Err(TransportError::SendFailed(_))));

        // Next send should work
        transport.send(b"data").await.unwrap();
    }

    #[tokio::test]
    async fn forced_recv_failure() {
        let transport = MockTransport::new();
        transport.connect("station").await.unwrap();
        transport.queue_response([7]);
        transport.fail_next_recv("reset");

        let result = transport.recv_exact(1).await;
        assert!(matches!(result, Err(TransportError::ReceiveFailed(_))));

        // Queued data is still there
        assert_eq!(transport.recv_exact(1).await.unwrap(), vec![7]);
    }

    // ===========================================
    // Clone and Shared State Tests
    // ===========================================

    #[tokio::test]
    async fn mock_transport_clone_shares_state() {
        let transport1 = MockTransport::new();
        let transport2 = transport1.clone();

        transport1.connect("station").await.unwrap();
        assert!(transport2.is_connected());

        transport1.send(b"from t1").await.unwrap();
        transport2.send(b"from t2").await.unwrap();

        assert_eq!(transport1.sent_messages().len(), 2);
        assert_eq!(transport2.last_sent(), Some(b"from t2".to_vec()));
    }
}
