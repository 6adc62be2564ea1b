// ABOUTME: SMPP session client module wiring the state machine, dispatcher and submit pipeline
// ABOUTME: Exports session, configuration, callback and processor types for applications

//! SMPP session client.
//!
//! A [`Session`] owns one connection to an SMSC and drives the full client
//! lifecycle over it:
//!
//! * **Bind handshake**: on transport connect the session sends the bind
//!   PDU for its [`Role`] and arms a bind timeout; an SMSC that never
//!   answers cannot pin the connection open.
//! * **Ordered dispatch**: a reader task frames inbound bytes and queues
//!   complete PDUs; the session task handles them strictly in arrival
//!   order, one at a time, callbacks included.
//! * **Keepalive**: enquire_link on a configurable interval while bound.
//! * **Submission**: [`SessionHandle::submit_sm`] with SAR or UDH multipart
//!   splitting, USSD annotation, and long-message payload migration.
//! * **Shared bookkeeping**: sequence numbers and the unacked ledger live
//!   in a [`crate::store::KeyValueStore`] shared across sessions.
//!
//! Inbound deliveries flow through a fixed pipeline (delivery reports, then
//! multipart, then USSD, then plain text) defined by the processor traits in
//! [`processors`], and end up at the application through [`EsmeCallbacks`].

pub mod callbacks;
pub mod config;
pub mod error;
pub mod processors;
pub mod session;
mod submit;
pub mod types;

pub use callbacks::{EsmeCallbacks, NoCallbacks};
pub use config::SessionConfig;
pub use error::{EsmeError, EsmeResult};
pub use processors::{
    DeliveryReport, DeliveryReportProcessor, MultipartStatus, NullDeliveryReportProcessor,
    NullShortMessageProcessor, ShortMessageProcessor,
};
pub use session::{Session, SessionHandle};
pub use types::{BindParams, MessageType, Role, SarParams, SessionState, SubmitParams};
