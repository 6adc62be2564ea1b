// ABOUTME: Supporting types for session operations: roles, states, bind and submit parameters
// ABOUTME: Provides builder-style construction with defaults matching common SMSC setups

use crate::datatypes::{
    CommandId, InterfaceVersion, NumericPlanIndicator, PriorityFlag, TypeOfNumber,
};
use crate::macros::builder_setters;
use bytes::Bytes;
use core::fmt;

/// The capability an ESME binds with. The role picks the bind PDU to send
/// and the bound state a successful response lands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Transmitter,
    Receiver,
    Transceiver,
}

impl Role {
    pub(crate) fn bind_command(self) -> CommandId {
        match self {
            Role::Transmitter => CommandId::BindTransmitter,
            Role::Receiver => CommandId::BindReceiver,
            Role::Transceiver => CommandId::BindTransceiver,
        }
    }

    pub(crate) fn bind_response_command(self) -> CommandId {
        match self {
            Role::Transmitter => CommandId::BindTransmitterResp,
            Role::Receiver => CommandId::BindReceiverResp,
            Role::Transceiver => CommandId::BindTransceiverResp,
        }
    }

    pub(crate) fn bound_state(self) -> SessionState {
        match self {
            Role::Transmitter => SessionState::BoundTx,
            Role::Receiver => SessionState::BoundRx,
            Role::Transceiver => SessionState::BoundTrx,
        }
    }
}

/// Session lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No transport.
    Closed,
    /// Transport up, bind request sent, response outstanding.
    Open,
    BoundTx,
    BoundRx,
    BoundTrx,
    /// Inbound unbind acknowledged; transport about to close.
    Unbinding,
}

impl SessionState {
    pub fn is_bound(self) -> bool {
        matches!(
            self,
            SessionState::BoundTx | SessionState::BoundRx | SessionState::BoundTrx
        )
    }

    pub(crate) fn can_transmit(self) -> bool {
        matches!(self, SessionState::BoundTx | SessionState::BoundTrx)
    }

    pub(crate) fn can_receive(self) -> bool {
        matches!(self, SessionState::BoundRx | SessionState::BoundTrx)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SessionState::Closed => "CLOSED",
            SessionState::Open => "OPEN",
            SessionState::BoundTx => "BOUND_TX",
            SessionState::BoundRx => "BOUND_RX",
            SessionState::BoundTrx => "BOUND_TRX",
            SessionState::Unbinding => "UNBINDING",
        };
        name.fmt(fmt)
    }
}

/// Credentials and addressing for the bind handshake.
#[derive(Clone, Debug)]
pub struct BindParams {
    pub system_id: String,
    pub password: Option<String>,
    pub system_type: String,
    pub interface_version: InterfaceVersion,
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,
    pub address_range: String,
}

impl BindParams {
    pub fn new(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            password: Some(password.into()),
            system_type: String::new(),
            interface_version: InterfaceVersion::SmppV34,
            addr_ton: TypeOfNumber::Unknown,
            addr_npi: NumericPlanIndicator::Unknown,
            address_range: String::new(),
        }
    }

    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = system_type.into();
        self
    }

    pub fn with_address_range(mut self, address_range: impl Into<String>) -> Self {
        self.address_range = address_range.into();
        self
    }

    pub fn with_addressing(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.addr_ton = ton;
        self.addr_npi = npi;
        self
    }
}

/// What kind of traffic a submit carries; USSD gets the session-control
/// optional parameters attached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MessageType {
    #[default]
    Sms,
    Ussd,
}

/// Explicit segmentation values for one submit_sm, as carried by the three
/// SAR optional parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SarParams {
    pub msg_ref_num: u16,
    pub total_segments: u8,
    pub segment_seqnum: u8,
}

/// Parameters for one submission.
///
/// `short_message` is raw bytes: content arrives here already encoded for
/// its `data_coding`, and multipart splitting works on byte boundaries.
#[derive(Clone, Debug)]
pub struct SubmitParams {
    pub service_type: String,
    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    pub source_addr: String,
    pub dest_addr_ton: TypeOfNumber,
    pub dest_addr_npi: NumericPlanIndicator,
    pub destination_addr: String,
    pub esm_class: u8,
    pub protocol_id: u8,
    pub priority_flag: PriorityFlag,
    pub registered_delivery: u8,
    pub data_coding: u8,
    pub short_message: Bytes,
    pub message_type: MessageType,
    /// USSD only: false marks this message as ending the session.
    pub continue_session: bool,
    /// USSD only: current session state as four hex digits.
    pub session_info: Option<String>,
    /// Pre-computed SAR values; normally filled in by the splitter.
    pub sar_params: Option<SarParams>,
}

impl SubmitParams {
    pub fn new(
        source_addr: impl Into<String>,
        destination_addr: impl Into<String>,
        short_message: impl Into<Bytes>,
    ) -> Self {
        Self {
            service_type: String::new(),
            source_addr_ton: TypeOfNumber::Unknown,
            source_addr_npi: NumericPlanIndicator::Unknown,
            source_addr: source_addr.into(),
            dest_addr_ton: TypeOfNumber::Unknown,
            dest_addr_npi: NumericPlanIndicator::Unknown,
            destination_addr: destination_addr.into(),
            esm_class: 0,
            protocol_id: 0,
            priority_flag: PriorityFlag::Level0,
            registered_delivery: 0,
            data_coding: 0,
            short_message: short_message.into(),
            message_type: MessageType::Sms,
            continue_session: true,
            session_info: None,
            sar_params: None,
        }
    }

    builder_setters! {
        service_type: String,
        source_addr_ton: TypeOfNumber,
        source_addr_npi: NumericPlanIndicator,
        dest_addr_ton: TypeOfNumber,
        dest_addr_npi: NumericPlanIndicator,
        esm_class: u8,
        protocol_id: u8,
        priority_flag: PriorityFlag,
        registered_delivery: u8,
        data_coding: u8,
        message_type: MessageType,
        continue_session: bool,
        session_info: Option<String>,
        sar_params: Option<SarParams>,
    }
}
