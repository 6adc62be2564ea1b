use crate::codec::{
    self, CodecError, Decodable, Encodable, PduHeader, cstring_size, decode_cstring,
    encode_cstring,
};
use crate::datatypes::{
    ADDRESS_RANGE_FIELD, CommandId, CommandStatus, InterfaceVersion, NumericPlanIndicator,
    PASSWORD_FIELD, SYSTEM_ID_FIELD, SYSTEM_TYPE_FIELD, Tlv, TypeOfNumber,
};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// Bind request for any of the three ESME roles. The three bind operations
/// share one body layout; only the command id differs, so a single struct
/// parameterised by its id covers transmitter, receiver and transceiver.
#[derive(Clone, Debug, PartialEq)]
pub struct Bind {
    pub command_id: CommandId,
    pub sequence_number: u32,
    pub system_id: String,
    pub password: Option<String>,
    pub system_type: String,
    pub interface_version: InterfaceVersion,
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,
    pub address_range: String,
}

/// Response to any of the three bind operations.
#[derive(Clone, Debug, PartialEq)]
pub struct BindResponse {
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub system_id: String,
    pub sc_interface_version: Option<Tlv>,
}

impl Encodable for Bind {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader {
            command_length: self.encoded_size() as u32,
            command_id: self.command_id,
            // Request PDUs always carry a zero status.
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
        }
        .encode(buf)?;

        encode_cstring(buf, &self.system_id, SYSTEM_ID_FIELD);
        encode_cstring(buf, self.password.as_deref().unwrap_or(""), PASSWORD_FIELD);
        encode_cstring(buf, &self.system_type, SYSTEM_TYPE_FIELD);
        buf.put_u8(self.interface_version as u8);
        buf.put_u8(self.addr_ton as u8);
        buf.put_u8(self.addr_npi as u8);
        encode_cstring(buf, &self.address_range, ADDRESS_RANGE_FIELD);
        Ok(())
    }

    fn encoded_size(&self) -> usize {
        PduHeader::SIZE
            + cstring_size(&self.system_id, SYSTEM_ID_FIELD)
            + cstring_size(self.password.as_deref().unwrap_or(""), PASSWORD_FIELD)
            + cstring_size(&self.system_type, SYSTEM_TYPE_FIELD)
            + 3
            + cstring_size(&self.address_range, ADDRESS_RANGE_FIELD)
    }
}

impl Decodable for Bind {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let system_id = decode_cstring(buf, SYSTEM_ID_FIELD, "system_id")?;
        let password = decode_cstring(buf, PASSWORD_FIELD, "password")?;
        let system_type = decode_cstring(buf, SYSTEM_TYPE_FIELD, "system_type")?;
        let interface_version = InterfaceVersion::try_from(codec::decode_u8(buf)?)?;
        let addr_ton = TypeOfNumber::try_from(codec::decode_u8(buf)?)?;
        let addr_npi = NumericPlanIndicator::try_from(codec::decode_u8(buf)?)?;
        let address_range = decode_cstring(buf, ADDRESS_RANGE_FIELD, "address_range")?;

        Ok(Bind {
            command_id: header.command_id,
            sequence_number: header.sequence_number,
            system_id,
            password: (!password.is_empty()).then_some(password),
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }
}

impl Encodable for BindResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader {
            command_length: self.encoded_size() as u32,
            command_id: self.command_id,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        }
        .encode(buf)?;

        encode_cstring(buf, &self.system_id, SYSTEM_ID_FIELD);
        if let Some(ref tlv) = self.sc_interface_version {
            tlv.encode(buf)?;
        }
        Ok(())
    }

    fn encoded_size(&self) -> usize {
        let mut size = PduHeader::SIZE + cstring_size(&self.system_id, SYSTEM_ID_FIELD);
        if let Some(ref tlv) = self.sc_interface_version {
            size += tlv.encoded_size();
        }
        size
    }
}

impl Decodable for BindResponse {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        // Failed binds may come back with an empty body.
        let system_id = if buf.has_remaining() {
            decode_cstring(buf, SYSTEM_ID_FIELD, "system_id")?
        } else {
            String::new()
        };

        let sc_interface_version = if buf.has_remaining() {
            Some(Tlv::decode(buf)?)
        } else {
            None
        };

        Ok(BindResponse {
            command_id: header.command_id,
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            sc_interface_version,
        })
    }
}
