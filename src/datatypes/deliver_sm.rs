use crate::codec::{
    self, CodecError, Decodable, Encodable, PduHeader, cstring_size, decode_cstring,
    encode_cstring,
};
use crate::datatypes::{
    ADDR_FIELD, CommandId, CommandStatus, MESSAGE_ID_FIELD, NumericPlanIndicator, PriorityFlag,
    SERVICE_TYPE_FIELD, TIME_FIELD, Tlv, TypeOfNumber, tags,
};
use crate::macros::{encode_optional_tlvs, size_optional_tlvs};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use tracing::warn;

/// A message delivered from the SMSC: a mobile-originated short message, a
/// USSD operation, or a delivery receipt (esm_class bit 0x04). The body
/// layout matches submit_sm.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliverSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    // Mandatory parameters
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
    pub schedule_delivery_time: String,
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: u8,
    pub sm_default_msg_id: u8,
    pub short_message: Bytes,

    // Optional parameters the client reads
    pub user_message_reference: Option<Tlv>,
    pub sar_msg_ref_num: Option<Tlv>,
    pub sar_total_segments: Option<Tlv>,
    pub sar_segment_seqnum: Option<Tlv>,
    pub message_payload: Option<Tlv>,
    pub receipted_message_id: Option<Tlv>,
    pub message_state: Option<Tlv>,
    pub network_error_code: Option<Tlv>,
    pub its_session_info: Option<Tlv>,
    pub ussd_service_op: Option<Tlv>,
}

impl Default for DeliverSm {
    fn default() -> Self {
        DeliverSm {
            command_status: CommandStatus::Ok,
            sequence_number: 0,
            service_type: String::new(),
            source_addr_ton: TypeOfNumber::Unknown,
            source_addr_npi: NumericPlanIndicator::Unknown,
            source_addr: String::new(),
            dest_addr_ton: TypeOfNumber::Unknown,
            dest_addr_npi: NumericPlanIndicator::Unknown,
            destination_addr: String::new(),
            esm_class: 0,
            protocol_id: 0,
            priority_flag: PriorityFlag::Level0,
            schedule_delivery_time: String::new(),
            validity_period: String::new(),
            registered_delivery: 0,
            replace_if_present_flag: 0,
            data_coding: 0,
            sm_default_msg_id: 0,
            short_message: Bytes::new(),
            user_message_reference: None,
            sar_msg_ref_num: None,
            sar_total_segments: None,
            sar_segment_seqnum: None,
            message_payload: None,
            receipted_message_id: None,
            message_state: None,
            network_error_code: None,
            its_session_info: None,
            ussd_service_op: None,
        }
    }
}

impl DeliverSm {
    /// Content bytes: the message_payload parameter when present, otherwise
    /// the mandatory short_message field.
    pub fn message_bytes(&self) -> &[u8] {
        self.message_payload
            .as_ref()
            .map(|tlv| tlv.value.as_ref())
            .unwrap_or(&self.short_message)
    }
}

impl Encodable for DeliverSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader {
            command_length: self.encoded_size() as u32,
            command_id: CommandId::DeliverSm,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        }
        .encode(buf)?;

        encode_cstring(buf, &self.service_type, SERVICE_TYPE_FIELD);
        buf.put_u8(self.source_addr_ton as u8);
        buf.put_u8(self.source_addr_npi as u8);
        encode_cstring(buf, &self.source_addr, ADDR_FIELD);
        buf.put_u8(self.dest_addr_ton as u8);
        buf.put_u8(self.dest_addr_npi as u8);
        encode_cstring(buf, &self.destination_addr, ADDR_FIELD);
        buf.put_u8(self.esm_class);
        buf.put_u8(self.protocol_id);
        buf.put_u8(self.priority_flag as u8);
        encode_cstring(buf, &self.schedule_delivery_time, TIME_FIELD);
        encode_cstring(buf, &self.validity_period, TIME_FIELD);
        buf.put_u8(self.registered_delivery);
        buf.put_u8(self.replace_if_present_flag);
        buf.put_u8(self.data_coding);
        buf.put_u8(self.sm_default_msg_id);
        buf.put_u8(self.short_message.len() as u8);
        buf.extend_from_slice(&self.short_message);

        encode_optional_tlvs!(
            self,
            buf,
            user_message_reference,
            sar_msg_ref_num,
            sar_total_segments,
            sar_segment_seqnum,
            message_payload,
            receipted_message_id,
            message_state,
            network_error_code,
            its_session_info,
            ussd_service_op,
        );
        Ok(())
    }

    fn encoded_size(&self) -> usize {
        let mut size = PduHeader::SIZE
            + cstring_size(&self.service_type, SERVICE_TYPE_FIELD)
            + 2
            + cstring_size(&self.source_addr, ADDR_FIELD)
            + 2
            + cstring_size(&self.destination_addr, ADDR_FIELD)
            + 3
            + cstring_size(&self.schedule_delivery_time, TIME_FIELD)
            + cstring_size(&self.validity_period, TIME_FIELD)
            + 5
            + self.short_message.len();
        size_optional_tlvs!(
            size,
            self,
            user_message_reference,
            sar_msg_ref_num,
            sar_total_segments,
            sar_segment_seqnum,
            message_payload,
            receipted_message_id,
            message_state,
            network_error_code,
            its_session_info,
            ussd_service_op,
        );
        size
    }
}

impl Decodable for DeliverSm {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let mut pdu = DeliverSm {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            service_type: decode_cstring(buf, SERVICE_TYPE_FIELD, "service_type")?,
            source_addr_ton: TypeOfNumber::try_from(codec::decode_u8(buf)?)?,
            source_addr_npi: NumericPlanIndicator::try_from(codec::decode_u8(buf)?)?,
            source_addr: decode_cstring(buf, ADDR_FIELD, "source_addr")?,
            dest_addr_ton: TypeOfNumber::try_from(codec::decode_u8(buf)?)?,
            dest_addr_npi: NumericPlanIndicator::try_from(codec::decode_u8(buf)?)?,
            destination_addr: decode_cstring(buf, ADDR_FIELD, "destination_addr")?,
            esm_class: codec::decode_u8(buf)?,
            protocol_id: codec::decode_u8(buf)?,
            priority_flag: PriorityFlag::try_from(codec::decode_u8(buf)?)?,
            schedule_delivery_time: decode_cstring(buf, TIME_FIELD, "schedule_delivery_time")?,
            validity_period: decode_cstring(buf, TIME_FIELD, "validity_period")?,
            registered_delivery: codec::decode_u8(buf)?,
            replace_if_present_flag: codec::decode_u8(buf)?,
            data_coding: codec::decode_u8(buf)?,
            sm_default_msg_id: codec::decode_u8(buf)?,
            ..DeliverSm::default()
        };

        let sm_length = codec::decode_u8(buf)? as usize;
        pdu.short_message = codec::decode_bytes(buf, sm_length, "short_message")?;

        while buf.has_remaining() {
            let tlv = Tlv::decode(buf)?;
            match tlv.tag {
                tags::USER_MESSAGE_REFERENCE => pdu.user_message_reference = Some(tlv),
                tags::SAR_MSG_REF_NUM => pdu.sar_msg_ref_num = Some(tlv),
                tags::SAR_TOTAL_SEGMENTS => pdu.sar_total_segments = Some(tlv),
                tags::SAR_SEGMENT_SEQNUM => pdu.sar_segment_seqnum = Some(tlv),
                tags::MESSAGE_PAYLOAD => pdu.message_payload = Some(tlv),
                tags::RECEIPTED_MESSAGE_ID => pdu.receipted_message_id = Some(tlv),
                tags::MESSAGE_STATE => pdu.message_state = Some(tlv),
                tags::NETWORK_ERROR_CODE => pdu.network_error_code = Some(tlv),
                tags::ITS_SESSION_INFO => pdu.its_session_info = Some(tlv),
                tags::USSD_SERVICE_OP => pdu.ussd_service_op = Some(tlv),
                tag => warn!(tag, "ignoring unknown TLV"),
            }
        }

        Ok(pdu)
    }
}

/// Acknowledgement for deliver_sm. The message_id field is unused and
/// always empty on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliverSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl DeliverSmResponse {
    pub fn new(sequence_number: u32) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
        }
    }
}

impl Encodable for DeliverSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader {
            command_length: self.encoded_size() as u32,
            command_id: CommandId::DeliverSmResp,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        }
        .encode(buf)?;

        encode_cstring(buf, "", MESSAGE_ID_FIELD);
        Ok(())
    }

    fn encoded_size(&self) -> usize {
        PduHeader::SIZE + 1
    }
}

impl Decodable for DeliverSmResponse {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.has_remaining() {
            decode_cstring(buf, MESSAGE_ID_FIELD, "message_id")?;
        }

        Ok(DeliverSmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
        })
    }
}
