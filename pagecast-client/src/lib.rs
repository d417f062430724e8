//! # pagecast-client
//!
//! Sender library for Pagecast: ships page records to a station and
//! reports what the station did with each of them.
//!
//! ## Features
//!
//! - **Ordered Transfer**: announce, send every page, then collect one
//!   answer per record
//! - **Bounded Wait**: an attempt budget limits how long unanswered records
//!   are waited for
//! - **Transport Abstraction**: Pluggable transport layer (TCP, mock)
//! - **Pure State Machine**: Uses pagecast-core for acknowledgment bookkeeping
//!
//! ## Example
//!
//! ```ignore
//! use pagecast_client::{RecordSender, SenderConfig, TcpTransport};
//!
//! let sender = RecordSender::new(SenderConfig::default(), TcpTransport::new());
//! sender.connect().await?;
//!
//! let summary = sender.transfer(&records).await?;
//! println!("{} accepted", summary.accepted);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sender;
pub mod transport;

pub use pagecast_core::TransferSummary;
pub use sender::{
    is_valid_address, is_valid_port, ClientError, RecordSender, SenderConfig, TransferEvent,
    DEFAULT_CONNECT_TIMEOUT,
};
pub use transport::{MockTransport, TcpTransport, Transport, TransportError};
