//! SMPP 3.4 ESME client core.
//!
//! This crate implements the client side of SMPP 3.4: the bind handshake and
//! session state machine, length-prefixed PDU framing, strictly ordered
//! per-connection dispatch, message submission with SAR/UDH multipart
//! splitting and USSD annotation, and bookkeeping for outstanding submits
//! through a shared key-value store.
//!
//! The entry point is [`client::Session`]: construct it with a [`Role`], bind
//! parameters, a [`KeyValueStore`] and the application's callbacks, then
//! drive it over any byte stream with [`client::Session::run`].
//!
//! ```rust,no_run
//! use esme::client::{BindParams, NoCallbacks, NullDeliveryReportProcessor,
//!     NullShortMessageProcessor};
//! use esme::{MemoryStore, Role, Session, SessionConfig, SubmitParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (session, handle) = Session::new(
//!         SessionConfig::default(),
//!         Role::Transceiver,
//!         BindParams::new("system_id", "password"),
//!         MemoryStore::new(),
//!         NullDeliveryReportProcessor,
//!         NullShortMessageProcessor,
//!         NoCallbacks,
//!     );
//!     tokio::spawn(session.run_tcp("localhost:2775"));
//!
//!     let sequence_numbers = handle
//!         .submit_sm(SubmitParams::new("1234567890", "0987654321", "Hello!"))
//!         .await?;
//!     println!("submitted as {sequence_numbers:?}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod connection;
pub mod datatypes;
pub mod frame;
mod macros;
pub mod sequence;
pub mod store;
pub mod unacked;

#[cfg(test)]
mod tests;

pub use client::{
    BindParams, DeliveryReport, DeliveryReportProcessor, EsmeCallbacks, EsmeError, EsmeResult,
    MessageType, MultipartStatus, Role, SarParams, Session, SessionConfig, SessionHandle,
    SessionState, ShortMessageProcessor, SubmitParams,
};
pub use codec::{CodecError, Decodable, Encodable, Pdu, PduHeader};
pub use frame::{Framer, FramingError};
pub use store::{KeyValueStore, MemoryStore};

/// Error returned by the transport- and store-level plumbing.
///
/// Frame I/O and the key-value store surface their failures as a boxed
/// `std::error::Error`; nothing on those paths needs to match on the cause,
/// only to propagate it. The client surface wraps these into a structured
/// [`EsmeError`] where callers do care about the kind of failure.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A specialized `Result` type for transport and store operations.
pub type Result<T> = std::result::Result<T, Error>;
