//! Content processors for the deliver_sm pipeline.
//!
//! The session offers every acknowledged deliver_sm to these stages in a
//! fixed order (delivery-report PDU, multipart, USSD, decoded text,
//! text-form delivery report, plain message) and stops at the first stage
//! that claims it. Processors parse and classify; delivery back to the
//! application always goes through the session's
//! [`EsmeCallbacks`](crate::client::EsmeCallbacks).
//!
//! The default method bodies claim nothing and decode UTF-8, which makes a
//! unit struct a valid pass-through processor. Real deployments implement
//! these against their receipt formats, reassembly store and encodings.

use crate::datatypes::DeliverSm;
use std::future::Future;

/// A recognised delivery receipt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReport {
    /// The SMSC message id the receipt refers to.
    pub message_id: String,
    /// Receipt state, e.g. `DELIVRD` or `UNDELIV`, as it appeared in the
    /// receipt's `stat` field.
    pub stat: String,
}

/// Outcome of offering a deliver_sm to the multipart stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MultipartStatus {
    /// Not a fragment; the pipeline continues.
    NotMultipart,
    /// Fragment stored while the rest of the set is outstanding.
    Buffered,
    /// Final fragment; the full reassembled content.
    Reassembled(String),
}

/// Recognises delivery receipts.
pub trait DeliveryReportProcessor: Send + 'static {
    /// Inspect a PDU for a structured delivery receipt. `Some` claims the
    /// PDU and fires the `delivery_report` callback.
    fn handle_delivery_report_pdu(
        &mut self,
        pdu: &DeliverSm,
    ) -> impl Future<Output = Option<DeliveryReport>> + Send {
        let _ = pdu;
        async { None }
    }

    /// Inspect already-decoded text for a receipt in text form. Runs late in
    /// the pipeline, after multipart and USSD have passed on the PDU.
    fn handle_delivery_report_content(
        &mut self,
        content: &str,
    ) -> impl Future<Output = Option<DeliveryReport>> + Send {
        let _ = content;
        async { None }
    }
}

/// Classifies and decodes inbound short messages.
pub trait ShortMessageProcessor: Send + 'static {
    /// Offer a PDU as a potential multipart fragment.
    fn handle_multipart_pdu(
        &mut self,
        pdu: &DeliverSm,
    ) -> impl Future<Output = MultipartStatus> + Send {
        let _ = pdu;
        async { MultipartStatus::NotMultipart }
    }

    /// Offer a PDU as USSD; `Some(content)` claims it. The default claims
    /// PDUs carrying `ussd_service_op` when their content decodes.
    fn handle_ussd_pdu(&mut self, pdu: &DeliverSm) -> impl Future<Output = Option<String>> + Send {
        let content = if pdu.ussd_service_op.is_some() {
            self.decode_pdus(&[pdu]).pop().flatten()
        } else {
            None
        };
        async move { content }
    }

    /// Decode each PDU's content to text. `None` marks a part this
    /// processor cannot interpret; one undecodable part drops the whole
    /// message.
    fn decode_pdus(&self, pdus: &[&DeliverSm]) -> Vec<Option<String>> {
        pdus.iter()
            .map(|pdu| String::from_utf8(pdu.message_bytes().to_vec()).ok())
            .collect()
    }
}

/// Pass-through [`DeliveryReportProcessor`]: recognises nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDeliveryReportProcessor;

impl DeliveryReportProcessor for NullDeliveryReportProcessor {}

/// Pass-through [`ShortMessageProcessor`]: no multipart state, UTF-8 decode.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullShortMessageProcessor;

impl ShortMessageProcessor for NullShortMessageProcessor {}
