//! The submit pipeline: multipart splitting, USSD annotation and
//! long-message handling on top of single-segment submit_sm.

use crate::client::callbacks::EsmeCallbacks;
use crate::client::error::{EsmeError, EsmeResult};
use crate::client::processors::{DeliveryReportProcessor, ShortMessageProcessor};
use crate::client::session::Session;
use crate::client::types::{MessageType, SarParams, SubmitParams};
use crate::connection::FrameWriter;
use crate::datatypes::{MAX_SHORT_MESSAGE_BYTES, SubmitSm, Tlv, tags};
use crate::store::KeyValueStore;
use bytes::{BufMut, Bytes, BytesMut};
use rand::Rng;
use tokio::io::AsyncWrite;
use tracing::warn;

/// Longest message sent unsplit. 140 bytes is the GSM payload budget; the
/// content may already be UCS-2 or some other encoding, so the limit is in
/// bytes, not characters.
pub const MAX_SMS_BYTES: usize = 140;

/// Per-segment payload: ten bytes reserved out of the full budget for the
/// user data header, whether we prepend it ourselves (UDH) or the SMSC
/// builds one from the SAR parameters.
const SEGMENT_PAYLOAD: usize = MAX_SMS_BYTES - 10;

impl<K, D, M, C> Session<K, D, M, C>
where
    K: KeyValueStore,
    D: DeliveryReportProcessor,
    M: ShortMessageProcessor,
    C: EsmeCallbacks,
{
    /// Submit a message, splitting it when it exceeds one segment and a
    /// splitting strategy is configured.
    ///
    /// Returns one sequence number per PDU sent. Outside a transmitting
    /// state the message is dropped: logged, empty list, no error.
    pub(super) async fn submit_sm<W>(
        &mut self,
        params: SubmitParams,
        writer: &mut FrameWriter<W>,
    ) -> EsmeResult<Vec<u32>>
    where
        W: AsyncWrite + Unpin + Send,
    {
        if !self.state.can_transmit() {
            warn!(
                state = %self.state,
                destination = %params.destination_addr,
                "submit_sm in wrong state, dropping message"
            );
            return Ok(Vec::new());
        }

        if params.short_message.len() > MAX_SMS_BYTES {
            if self.config.send_multipart_sar {
                return self.submit_multipart_sar(params, writer).await;
            }
            if self.config.send_multipart_udh {
                return self.submit_multipart_udh(params, writer).await;
            }
        }

        let sequence_number = self.submit_single(params, writer).await?;
        Ok(vec![sequence_number])
    }

    /// Build, send and record one submit_sm.
    async fn submit_single<W>(
        &mut self,
        params: SubmitParams,
        writer: &mut FrameWriter<W>,
    ) -> EsmeResult<u32>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let sequence_number = self.seq.next().await?;
        let message = params.short_message.clone();
        let mut pdu = build_submit_sm(sequence_number, &params);

        if params.message_type == MessageType::Ussd {
            update_ussd_pdu(&mut pdu, params.continue_session, params.session_info.as_deref())?;
        }

        if message.len() > MAX_SHORT_MESSAGE_BYTES {
            if !self.config.send_long_messages {
                return Err(EsmeError::InvalidParams(format!(
                    "{} byte message needs send_long_messages or a multipart strategy",
                    message.len()
                )));
            }
            pdu.message_payload = Some(Tlv::new(tags::MESSAGE_PAYLOAD, message));
            pdu.short_message = Bytes::new();
        }

        if let Some(sar) = params.sar_params {
            pdu.sar_msg_ref_num = Some(Tlv::from_u16(tags::SAR_MSG_REF_NUM, sar.msg_ref_num));
            pdu.sar_total_segments = Some(Tlv::from_u8(tags::SAR_TOTAL_SEGMENTS, sar.total_segments));
            pdu.sar_segment_seqnum = Some(Tlv::from_u8(tags::SAR_SEGMENT_SEQNUM, sar.segment_seqnum));
        }

        writer.write_pdu(&pdu).await?;
        self.unacked.push(sequence_number).await?;
        Ok(sequence_number)
    }

    /// Split into 130-byte segments announced through the SAR optional
    /// parameters; the SMSC builds the concatenation headers.
    async fn submit_multipart_sar<W>(
        &mut self,
        params: SubmitParams,
        writer: &mut FrameWriter<W>,
    ) -> EsmeResult<Vec<u32>>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let segments = split_message(&params.short_message)?;
        let total_segments = segments.len() as u8;
        let msg_ref_num: u16 = rand::thread_rng().gen_range(1..=255);

        let mut sequence_numbers = Vec::with_capacity(segments.len());
        for (index, segment) in segments.into_iter().enumerate() {
            let mut segment_params = params.clone();
            segment_params.short_message = segment;
            segment_params.sar_params = Some(SarParams {
                msg_ref_num,
                total_segments,
                segment_seqnum: index as u8 + 1,
            });
            sequence_numbers.push(self.submit_single(segment_params, writer).await?);
        }
        Ok(sequence_numbers)
    }

    /// Split into 130-byte segments carrying an in-band 6-byte concatenation
    /// header, with the UDHI bit set in esm_class.
    async fn submit_multipart_udh<W>(
        &mut self,
        params: SubmitParams,
        writer: &mut FrameWriter<W>,
    ) -> EsmeResult<Vec<u32>>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let segments = split_message(&params.short_message)?;
        let total_segments = segments.len() as u8;
        let msg_ref_num: u8 = rand::thread_rng().gen_range(1..=255);

        let mut sequence_numbers = Vec::with_capacity(segments.len());
        for (index, segment) in segments.into_iter().enumerate() {
            let mut segment_params = params.clone();
            // 0x40 is the UDHI flag: the payload starts with a user data
            // header.
            segment_params.esm_class = params.esm_class | 0x40;

            let mut body = BytesMut::with_capacity(6 + segment.len());
            // Concatenation IE: length 5, IEI 0, IE length 3, then
            // reference, total, index.
            body.put_slice(&[0x05, 0x00, 0x03, msg_ref_num, total_segments, index as u8 + 1]);
            body.put_slice(&segment);
            segment_params.short_message = body.freeze();

            sequence_numbers.push(self.submit_single(segment_params, writer).await?);
        }
        Ok(sequence_numbers)
    }
}

/// Chunk a payload on byte boundaries.
///
/// Multibyte characters can end up split across segments; receivers
/// reassemble before decoding, so the bytes survive even though no segment
/// is guaranteed to be valid text on its own.
fn split_message(message: &Bytes) -> EsmeResult<Vec<Bytes>> {
    let segments: Vec<Bytes> = (0..message.len())
        .step_by(SEGMENT_PAYLOAD)
        .map(|start| message.slice(start..message.len().min(start + SEGMENT_PAYLOAD)))
        .collect();

    // Segment counts ride in single-byte fields.
    if segments.len() > u8::MAX as usize {
        return Err(EsmeError::InvalidParams(format!(
            "{} byte message splits into more than 255 segments",
            message.len()
        )));
    }
    Ok(segments)
}

/// Tag a submit_sm as USSD: service op 0x02, and a two-byte
/// its_session_info whose low bit marks the end of the session.
fn update_ussd_pdu(
    pdu: &mut SubmitSm,
    continue_session: bool,
    session_info: Option<&str>,
) -> EsmeResult<()> {
    let base = u16::from_str_radix(session_info.unwrap_or("0000"), 16).map_err(|err| {
        EsmeError::InvalidParams(format!("session_info is not a 16-bit hex value: {err}"))
    })?;
    let session_info = base.wrapping_add(u16::from(!continue_session));

    pdu.ussd_service_op = Some(Tlv::from_u8(tags::USSD_SERVICE_OP, 0x02));
    pdu.its_session_info = Some(Tlv::from_u16(tags::ITS_SESSION_INFO, session_info));
    Ok(())
}

fn build_submit_sm(sequence_number: u32, params: &SubmitParams) -> SubmitSm {
    SubmitSm {
        sequence_number,
        service_type: params.service_type.clone(),
        source_addr_ton: params.source_addr_ton,
        source_addr_npi: params.source_addr_npi,
        source_addr: params.source_addr.clone(),
        dest_addr_ton: params.dest_addr_ton,
        dest_addr_npi: params.dest_addr_npi,
        destination_addr: params.destination_addr.clone(),
        esm_class: params.esm_class,
        protocol_id: params.protocol_id,
        priority_flag: params.priority_flag,
        registered_delivery: params.registered_delivery,
        data_coding: params.data_coding,
        short_message: params.short_message.clone(),
        ..SubmitSm::default()
    }
}
