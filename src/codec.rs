//! SMPP 3.4 wire codec: the 16-byte PDU header, the `Encodable`/`Decodable`
//! traits each PDU implements, and the [`Pdu`] enum the dispatcher matches
//! on. All integers are big-endian; C-octet strings are null-terminated with
//! a per-field maximum width.

use crate::datatypes::{
    Bind, BindResponse, CommandId, CommandStatus, DeliverSm, DeliverSmResponse, EnquireLink,
    EnquireLinkResponse, GenericNack, InterfaceVersion, NumericPlanIndicator, PriorityFlag,
    QuerySm, SubmitSm, SubmitSmResponse, TypeOfNumber, Unbind, UnbindResponse,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use core::fmt;
use num_enum::TryFromPrimitiveError;
use std::io::Cursor;
use thiserror::Error;

/// Upper bound on a single PDU. Anything larger is treated as stream
/// corruption rather than a message worth buffering.
pub const MAX_PDU_SIZE: u32 = 64 * 1024;

/// The header shared by every SMPP PDU: four big-endian 32-bit words.
#[derive(Clone, Debug, PartialEq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::Incomplete);
        }

        let command_length = buf.get_u32();
        let raw_id = buf.get_u32();
        let command_id =
            CommandId::try_from(raw_id).map_err(|_| CodecError::InvalidCommandId(raw_id))?;
        let raw_status = buf.get_u32();
        let command_status = CommandStatus::try_from(raw_status)
            .map_err(|_| CodecError::InvalidCommandStatus(raw_status))?;
        let sequence_number = buf.get_u32();

        if command_length < Self::SIZE as u32 || command_length > MAX_PDU_SIZE {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: Self::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u32(self.command_length);
        buf.put_u32(self.command_id as u32);
        buf.put_u32(self.command_status as u32);
        buf.put_u32(self.sequence_number);
        Ok(())
    }
}

/// Types that can be written to the wire.
pub trait Encodable {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Size of the encoded PDU, command_length field included.
    fn encoded_size(&self) -> usize;

    /// Encode into a fresh buffer, patching command_length to the number of
    /// bytes actually produced.
    fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_size());
        self.encode(&mut buf)
            .expect("encoding should not fail for a valid PDU");

        if buf.len() >= 4 {
            let length = buf.len() as u32;
            buf[0..4].copy_from_slice(&length.to_be_bytes());
        }

        buf.freeze()
    }
}

/// Types that can be read off the wire once the header is known.
pub trait Decodable: Sized {
    /// Decode the PDU body from `buf`; the cursor sits just past the header
    /// and covers exactly `header.command_length` bytes of input.
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError>;
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("incomplete PDU: need more data")]
    Incomplete,

    #[error("invalid command_id: {0:#010x}")]
    InvalidCommandId(u32),

    #[error("invalid command_status: {0:#010x}")]
    InvalidCommandStatus(u32),

    #[error("invalid PDU length {length}, must be {min}-{max}")]
    InvalidPduLength { length: u32, min: u32, max: u32 },

    #[error("no decoder for command {0:?}")]
    Unsupported(CommandId),

    #[error("field '{field}' validation failed: {reason}")]
    FieldValidation { field: &'static str, reason: String },

    #[error("invalid UTF-8 in field '{field}': {source}")]
    Utf8Error {
        field: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl From<TryFromPrimitiveError<TypeOfNumber>> for CodecError {
    fn from(err: TryFromPrimitiveError<TypeOfNumber>) -> CodecError {
        CodecError::FieldValidation {
            field: "type_of_number",
            reason: format!("unknown value {:#04x}", err.number),
        }
    }
}

impl From<TryFromPrimitiveError<NumericPlanIndicator>> for CodecError {
    fn from(err: TryFromPrimitiveError<NumericPlanIndicator>) -> CodecError {
        CodecError::FieldValidation {
            field: "numbering_plan_indicator",
            reason: format!("unknown value {:#04x}", err.number),
        }
    }
}

impl From<TryFromPrimitiveError<InterfaceVersion>> for CodecError {
    fn from(err: TryFromPrimitiveError<InterfaceVersion>) -> CodecError {
        CodecError::FieldValidation {
            field: "interface_version",
            reason: format!("unknown value {:#04x}", err.number),
        }
    }
}

impl From<TryFromPrimitiveError<PriorityFlag>> for CodecError {
    fn from(err: TryFromPrimitiveError<PriorityFlag>) -> CodecError {
        CodecError::FieldValidation {
            field: "priority_flag",
            reason: format!("unknown value {:#04x}", err.number),
        }
    }
}

/// Decode a null-terminated C-octet string of at most `max_len` bytes
/// (terminator included).
pub fn decode_cstring(
    buf: &mut Cursor<&[u8]>,
    max_len: usize,
    field: &'static str,
) -> Result<String, CodecError> {
    let chunk = buf.chunk();
    let window = chunk.len().min(max_len);
    let terminator = chunk[..window].iter().position(|&b| b == 0);

    let Some(end) = terminator else {
        return Err(CodecError::FieldValidation {
            field,
            reason: format!("missing null terminator within {max_len} bytes"),
        });
    };

    let value = chunk[..end].to_vec();
    buf.advance(end + 1);
    String::from_utf8(value).map_err(|source| CodecError::Utf8Error { field, source })
}

/// Encode a C-octet string, truncating to the field width (terminator
/// included) where necessary.
pub fn encode_cstring(buf: &mut BytesMut, value: &str, max_len: usize) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(max_len - 1);
    buf.put_slice(&bytes[..len]);
    buf.put_u8(0);
}

/// Encoded width of a C-octet string after field-width truncation.
pub fn cstring_size(value: &str, max_len: usize) -> usize {
    value.len().min(max_len - 1) + 1
}

pub fn decode_u8(buf: &mut Cursor<&[u8]>) -> Result<u8, CodecError> {
    if !buf.has_remaining() {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u8())
}

pub fn decode_bytes(
    buf: &mut Cursor<&[u8]>,
    len: usize,
    field: &'static str,
) -> Result<Bytes, CodecError> {
    if buf.remaining() < len {
        return Err(CodecError::FieldValidation {
            field,
            reason: format!("{len} bytes declared, {} available", buf.remaining()),
        });
    }
    Ok(buf.copy_to_bytes(len))
}

/// One inbound PDU, tagged by command so the dispatcher can match
/// exhaustively. Commands the client recognises but has no business
/// receiving still get a variant here; the dispatcher logs and drops them.
#[derive(Clone, Debug)]
pub enum Pdu {
    Bind(Bind),
    BindResponse(BindResponse),
    Unbind(Unbind),
    UnbindResponse(UnbindResponse),
    EnquireLink(EnquireLink),
    EnquireLinkResponse(EnquireLinkResponse),
    GenericNack(GenericNack),
    SubmitSm(Box<SubmitSm>),
    SubmitSmResponse(SubmitSmResponse),
    DeliverSm(Box<DeliverSm>),
    DeliverSmResponse(DeliverSmResponse),
    QuerySm(QuerySm),
}

impl Pdu {
    /// Parse one complete frame, as produced by the framer.
    pub fn parse(frame: &[u8]) -> Result<Pdu, CodecError> {
        let mut buf = Cursor::new(frame);
        let header = PduHeader::decode(&mut buf)?;

        let pdu = match header.command_id {
            CommandId::BindTransmitter | CommandId::BindReceiver | CommandId::BindTransceiver => {
                Pdu::Bind(Bind::decode(header, &mut buf)?)
            }
            CommandId::BindTransmitterResp
            | CommandId::BindReceiverResp
            | CommandId::BindTransceiverResp => {
                Pdu::BindResponse(BindResponse::decode(header, &mut buf)?)
            }
            CommandId::Unbind => Pdu::Unbind(Unbind::decode(header, &mut buf)?),
            CommandId::UnbindResp => Pdu::UnbindResponse(UnbindResponse::decode(header, &mut buf)?),
            CommandId::EnquireLink => Pdu::EnquireLink(EnquireLink::decode(header, &mut buf)?),
            CommandId::EnquireLinkResp => {
                Pdu::EnquireLinkResponse(EnquireLinkResponse::decode(header, &mut buf)?)
            }
            CommandId::GenericNack => Pdu::GenericNack(GenericNack::decode(header, &mut buf)?),
            CommandId::SubmitSm => Pdu::SubmitSm(Box::new(SubmitSm::decode(header, &mut buf)?)),
            CommandId::SubmitSmResp => {
                Pdu::SubmitSmResponse(SubmitSmResponse::decode(header, &mut buf)?)
            }
            CommandId::DeliverSm => Pdu::DeliverSm(Box::new(DeliverSm::decode(header, &mut buf)?)),
            CommandId::DeliverSmResp => {
                Pdu::DeliverSmResponse(DeliverSmResponse::decode(header, &mut buf)?)
            }
            CommandId::QuerySm => Pdu::QuerySm(QuerySm::decode(header, &mut buf)?),
            other => return Err(CodecError::Unsupported(other)),
        };

        Ok(pdu)
    }

    pub fn command_id(&self) -> CommandId {
        match self {
            Pdu::Bind(pdu) => pdu.command_id,
            Pdu::BindResponse(pdu) => pdu.command_id,
            Pdu::Unbind(_) => CommandId::Unbind,
            Pdu::UnbindResponse(_) => CommandId::UnbindResp,
            Pdu::EnquireLink(_) => CommandId::EnquireLink,
            Pdu::EnquireLinkResponse(_) => CommandId::EnquireLinkResp,
            Pdu::GenericNack(_) => CommandId::GenericNack,
            Pdu::SubmitSm(_) => CommandId::SubmitSm,
            Pdu::SubmitSmResponse(_) => CommandId::SubmitSmResp,
            Pdu::DeliverSm(_) => CommandId::DeliverSm,
            Pdu::DeliverSmResponse(_) => CommandId::DeliverSmResp,
            Pdu::QuerySm(_) => CommandId::QuerySm,
        }
    }

    pub fn sequence_number(&self) -> u32 {
        match self {
            Pdu::Bind(pdu) => pdu.sequence_number,
            Pdu::BindResponse(pdu) => pdu.sequence_number,
            Pdu::Unbind(pdu) => pdu.sequence_number,
            Pdu::UnbindResponse(pdu) => pdu.sequence_number,
            Pdu::EnquireLink(pdu) => pdu.sequence_number,
            Pdu::EnquireLinkResponse(pdu) => pdu.sequence_number,
            Pdu::GenericNack(pdu) => pdu.sequence_number,
            Pdu::SubmitSm(pdu) => pdu.sequence_number,
            Pdu::SubmitSmResponse(pdu) => pdu.sequence_number,
            Pdu::DeliverSm(pdu) => pdu.sequence_number,
            Pdu::DeliverSmResponse(pdu) => pdu.sequence_number,
            Pdu::QuerySm(pdu) => pdu.sequence_number,
        }
    }
}

impl fmt::Display for Pdu {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{:?} seq={}",
            self.command_id(),
            self.sequence_number()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let header = PduHeader {
            command_length: 16,
            command_id: CommandId::EnquireLink,
            command_status: CommandStatus::Ok,
            sequence_number: 7,
        };

        let mut buf = BytesMut::new();
        header.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), PduHeader::SIZE);

        let mut cursor = Cursor::new(buf.as_ref());
        let decoded = PduHeader::decode(&mut cursor).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn header_rejects_bad_lengths() {
        for length in [0u32, 15, MAX_PDU_SIZE + 1] {
            let mut buf = BytesMut::new();
            buf.put_u32(length);
            buf.put_u32(CommandId::EnquireLink as u32);
            buf.put_u32(0);
            buf.put_u32(1);

            let mut cursor = Cursor::new(buf.as_ref());
            let result = PduHeader::decode(&mut cursor);
            assert!(matches!(
                result,
                Err(CodecError::InvalidPduLength { .. })
            ));
        }
    }

    #[test]
    fn header_rejects_unknown_command() {
        let mut buf = BytesMut::new();
        buf.put_u32(16);
        buf.put_u32(0x0000_FFFF);
        buf.put_u32(0);
        buf.put_u32(1);

        let mut cursor = Cursor::new(buf.as_ref());
        assert!(matches!(
            PduHeader::decode(&mut cursor),
            Err(CodecError::InvalidCommandId(0x0000_FFFF))
        ));
    }

    #[test]
    fn parse_rejects_unsupported_command() {
        let mut buf = BytesMut::new();
        buf.put_u32(16);
        buf.put_u32(CommandId::DataSm as u32);
        buf.put_u32(0);
        buf.put_u32(1);

        assert!(matches!(
            Pdu::parse(buf.as_ref()),
            Err(CodecError::Unsupported(CommandId::DataSm))
        ));
    }

    #[test]
    fn cstring_round_trip() {
        let mut buf = BytesMut::new();
        encode_cstring(&mut buf, "SMPP3TEST", 16);
        assert_eq!(buf.as_ref(), b"SMPP3TEST\0");

        let inner = buf.freeze();
        let mut cursor = Cursor::new(inner.as_ref());
        let decoded = decode_cstring(&mut cursor, 16, "system_id").unwrap();
        assert_eq!(decoded, "SMPP3TEST");
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn cstring_truncates_to_field_width() {
        let mut buf = BytesMut::new();
        encode_cstring(&mut buf, "far too long for the field", 9);
        assert_eq!(buf.len(), 9);
        assert_eq!(buf.as_ref()[8], 0);
        assert_eq!(cstring_size("far too long for the field", 9), 9);
    }

    #[test]
    fn cstring_requires_terminator() {
        let data = b"NOTERMINATOR";
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            decode_cstring(&mut cursor, 8, "system_id"),
            Err(CodecError::FieldValidation { field: "system_id", .. })
        ));
    }
}
