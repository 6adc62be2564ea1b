use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

use crate::codec::{CodecError, Encodable};

/// Optional-parameter tags used by the client (SMPP 3.4 section 5.3.2).
pub mod tags {
    pub const SC_INTERFACE_VERSION: u16 = 0x0010;
    pub const USER_MESSAGE_REFERENCE: u16 = 0x0204;
    pub const SAR_MSG_REF_NUM: u16 = 0x020E;
    pub const SAR_TOTAL_SEGMENTS: u16 = 0x020F;
    pub const SAR_SEGMENT_SEQNUM: u16 = 0x0210;
    pub const MESSAGE_PAYLOAD: u16 = 0x0424;
    pub const RECEIPTED_MESSAGE_ID: u16 = 0x001E;
    pub const MESSAGE_STATE: u16 = 0x0427;
    pub const NETWORK_ERROR_CODE: u16 = 0x0423;
    pub const ITS_SESSION_INFO: u16 = 0x1383;
    pub const USSD_SERVICE_OP: u16 = 0x0501;
}

/// A tag-length-value optional parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tlv {
    pub tag: u16,
    /// Length of `value` in octets; excludes the tag and length fields.
    pub length: u16,
    pub value: Bytes,
}

impl Tlv {
    pub fn new(tag: u16, value: Bytes) -> Self {
        Self {
            tag,
            length: value.len() as u16,
            value,
        }
    }

    pub fn from_u8(tag: u16, value: u8) -> Self {
        Self::new(tag, Bytes::copy_from_slice(&[value]))
    }

    pub fn from_u16(tag: u16, value: u16) -> Self {
        Self::new(tag, Bytes::copy_from_slice(&value.to_be_bytes()))
    }

    pub fn as_u8(&self) -> Option<u8> {
        (self.value.len() == 1).then(|| self.value[0])
    }

    pub fn as_u16(&self) -> Option<u16> {
        (self.value.len() == 2).then(|| u16::from_be_bytes([self.value[0], self.value[1]]))
    }

    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < 4 {
            return Err(CodecError::Incomplete);
        }

        let tag = buf.get_u16();
        let length = buf.get_u16();

        if buf.remaining() < length as usize {
            return Err(CodecError::Incomplete);
        }
        let value = buf.copy_to_bytes(length as usize);

        Ok(Self { tag, length, value })
    }
}

impl Encodable for Tlv {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u16(self.tag);
        buf.put_u16(self.length);
        buf.extend_from_slice(&self.value);
        Ok(())
    }

    fn encoded_size(&self) -> usize {
        4 + self.value.len()
    }

    // A bare TLV has no PDU header, so the default to_bytes and its
    // command_length patch must not apply.
    fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_size());
        self.encode(&mut buf)
            .expect("TLV encoding should not fail");
        buf.freeze()
    }
}
