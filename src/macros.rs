// ABOUTME: Macros that cut boilerplate out of the PDU implementations
// ABOUTME: Covers header-only PDU codecs, batch TLV encoding and builder setters

/// Codec impls for PDUs that are a bare 16-byte header.
macro_rules! impl_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        impl $crate::codec::Decodable for $pdu_type {
            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use bytes::Buf;

                if buf.has_remaining() {
                    return Err($crate::codec::CodecError::FieldValidation {
                        field: stringify!($pdu_type),
                        reason: "header-only PDU carries a body".to_string(),
                    });
                }

                Ok($pdu_type {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                })
            }
        }

        impl $crate::codec::Encodable for $pdu_type {
            fn encode(&self, buf: &mut bytes::BytesMut) -> Result<(), $crate::codec::CodecError> {
                $crate::codec::PduHeader {
                    command_length: $crate::codec::PduHeader::SIZE as u32,
                    command_id: $command_id,
                    command_status: self.command_status,
                    sequence_number: self.sequence_number,
                }
                .encode(buf)
            }

            fn encoded_size(&self) -> usize {
                $crate::codec::PduHeader::SIZE
            }
        }
    };
}

/// `new` / `error` constructors for header-only PDUs.
macro_rules! impl_header_only_constructors {
    ($pdu_type:ident) => {
        impl $pdu_type {
            /// PDU with `Ok` status.
            pub fn new(sequence_number: u32) -> Self {
                Self {
                    command_status: $crate::datatypes::CommandStatus::Ok,
                    sequence_number,
                }
            }

            /// PDU carrying an error status.
            pub fn error(sequence_number: u32, status: $crate::datatypes::CommandStatus) -> Self {
                Self {
                    command_status: status,
                    sequence_number,
                }
            }
        }
    };
}

macro_rules! impl_complete_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        $crate::macros::impl_header_only_pdu!($pdu_type, $command_id);
        $crate::macros::impl_header_only_constructors!($pdu_type);
    };
}

/// Encode every present TLV field from the list.
macro_rules! encode_optional_tlvs {
    ($self_expr:expr, $buf_expr:expr, $($field:ident),* $(,)?) => {
        $(
            if let Some(ref tlv) = $self_expr.$field {
                tlv.encode($buf_expr)?;
            }
        )*
    };
}

/// Sum the encoded sizes of every present TLV field from the list.
macro_rules! size_optional_tlvs {
    ($size_expr:expr, $self_expr:expr, $($field:ident),* $(,)?) => {
        $(
            if let Some(ref tlv) = $self_expr.$field {
                $size_expr += tlv.encoded_size();
            }
        )*
    };
}

/// Fluent setters that overwrite a field and return `self`.
macro_rules! builder_setters {
    ($($field:ident: $type:ty),* $(,)?) => {
        $(
            pub fn $field(mut self, $field: $type) -> Self {
                self.$field = $field;
                self
            }
        )*
    };
}

pub(crate) use {
    builder_setters, encode_optional_tlvs, impl_complete_header_only_pdu,
    impl_header_only_constructors, impl_header_only_pdu, size_optional_tlvs,
};
