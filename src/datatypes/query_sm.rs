use crate::codec::{
    self, CodecError, Decodable, Encodable, PduHeader, cstring_size, decode_cstring,
    encode_cstring,
};
use crate::datatypes::{
    ADDR_FIELD, CommandId, CommandStatus, MESSAGE_ID_FIELD, NumericPlanIndicator, TypeOfNumber,
};
use bytes::{BufMut, BytesMut};
use std::io::Cursor;

/// Status query for a previously submitted message. The client sends these
/// and deliberately leaves the response unhandled; its arrival is visible in
/// the logs only.
#[derive(Clone, Debug, PartialEq)]
pub struct QuerySm {
    pub sequence_number: u32,
    pub message_id: String,
    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    pub source_addr: String,
}

impl Encodable for QuerySm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader {
            command_length: self.encoded_size() as u32,
            command_id: CommandId::QuerySm,
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
        }
        .encode(buf)?;

        encode_cstring(buf, &self.message_id, MESSAGE_ID_FIELD);
        buf.put_u8(self.source_addr_ton as u8);
        buf.put_u8(self.source_addr_npi as u8);
        encode_cstring(buf, &self.source_addr, ADDR_FIELD);
        Ok(())
    }

    fn encoded_size(&self) -> usize {
        PduHeader::SIZE
            + cstring_size(&self.message_id, MESSAGE_ID_FIELD)
            + 2
            + cstring_size(&self.source_addr, ADDR_FIELD)
    }
}

impl Decodable for QuerySm {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Ok(QuerySm {
            sequence_number: header.sequence_number,
            message_id: decode_cstring(buf, MESSAGE_ID_FIELD, "message_id")?,
            source_addr_ton: TypeOfNumber::try_from(codec::decode_u8(buf)?)?,
            source_addr_npi: NumericPlanIndicator::try_from(codec::decode_u8(buf)?)?,
            source_addr: decode_cstring(buf, ADDR_FIELD, "source_addr")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Pdu;

    #[test]
    fn query_sm_round_trips() {
        let pdu = QuerySm {
            sequence_number: 12,
            message_id: "msg_77".to_string(),
            source_addr_ton: TypeOfNumber::International,
            source_addr_npi: NumericPlanIndicator::Isdn,
            source_addr: "1234567890".to_string(),
        };

        match Pdu::parse(&pdu.to_bytes()).unwrap() {
            Pdu::QuerySm(decoded) => assert_eq!(decoded, pdu),
            other => panic!("unexpected pdu: {other}"),
        }
    }
}
