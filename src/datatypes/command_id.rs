// ABOUTME: SMPP 3.4 command identifiers per specification Table 4-1
// ABOUTME: Covers the standard operation set with response-bit handling

use num_enum::TryFromPrimitive;

/// SMPP 3.4 command identifiers (specification Table 4-1).
///
/// Bit 31 distinguishes responses from requests; the remaining bits name the
/// operation. The table below covers the standard 3.4 operations; ids the
/// client never speaks still convert so the dispatcher can log and discard
/// the PDU instead of tearing the session down.
#[derive(TryFromPrimitive)]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandId {
    GenericNack = 0x8000_0000,
    BindReceiver = 0x0000_0001,
    BindReceiverResp = 0x8000_0001,
    BindTransmitter = 0x0000_0002,
    BindTransmitterResp = 0x8000_0002,
    QuerySm = 0x0000_0003,
    QuerySmResp = 0x8000_0003,
    SubmitSm = 0x0000_0004,
    SubmitSmResp = 0x8000_0004,
    DeliverSm = 0x0000_0005,
    DeliverSmResp = 0x8000_0005,
    Unbind = 0x0000_0006,
    UnbindResp = 0x8000_0006,
    ReplaceSm = 0x0000_0007,
    ReplaceSmResp = 0x8000_0007,
    CancelSm = 0x0000_0008,
    CancelSmResp = 0x8000_0008,
    BindTransceiver = 0x0000_0009,
    BindTransceiverResp = 0x8000_0009,
    // 0x0000000A reserved
    Outbind = 0x0000_000B,
    // 0x0000000C-0x00000014 reserved
    EnquireLink = 0x0000_0015,
    EnquireLinkResp = 0x8000_0015,
    // 0x00000016-0x00000020 reserved
    SubmitMulti = 0x0000_0021,
    SubmitMultiResp = 0x8000_0021,
    // 0x00000022-0x00000101 reserved
    AlertNotification = 0x0000_0102,
    DataSm = 0x0000_0103,
    DataSmResp = 0x8000_0103,
}

impl CommandId {
    /// Responses carry the top bit.
    pub fn is_response(self) -> bool {
        (self as u32) & 0x8000_0000 != 0
    }
}
