use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::impl_complete_header_only_pdu;

/// Catch-all negative acknowledgement, sent in place of a response when the
/// offending PDU could not even be attributed to an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericNack {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl_complete_header_only_pdu!(GenericNack, CommandId::GenericNack);
