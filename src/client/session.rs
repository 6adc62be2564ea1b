//! The session state machine and its dispatcher.
//!
//! One [`Session`] drives one connection. Ingress is decoupled from
//! handling: a spawned reader task frames inbound bytes and queues complete
//! frames, while the session task consumes them one at a time. A handler,
//! callbacks included, always finishes before the next PDU is looked at.
//! Application commands arrive over the [`SessionHandle`] channel and are
//! serialised through the same loop.

use crate::client::callbacks::EsmeCallbacks;
use crate::client::config::SessionConfig;
use crate::client::error::{EsmeError, EsmeResult};
use crate::client::processors::{DeliveryReportProcessor, MultipartStatus, ShortMessageProcessor};
use crate::client::types::{BindParams, Role, SessionState, SubmitParams};
use crate::codec::Pdu;
use crate::connection::{self, FrameReader, FrameWriter};
use crate::datatypes::{
    Bind, BindResponse, CommandStatus, DeliverSm, DeliverSmResponse, EnquireLink,
    EnquireLinkResponse, QuerySm, SubmitSmResponse, Unbind, UnbindResponse,
};
use crate::sequence::SequenceAllocator;
use crate::store::KeyValueStore;
use crate::unacked::UnackedLedger;
use bytes::Bytes;
use std::mem;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

pub(super) enum Command {
    SubmitSm {
        params: SubmitParams,
        reply: oneshot::Sender<EsmeResult<Vec<u32>>>,
    },
    QuerySm {
        message_id: String,
        source_addr: String,
        reply: oneshot::Sender<EsmeResult<Option<u32>>>,
    },
}

/// Cloneable handle for issuing commands to a running session.
///
/// Commands execute on the session task, serialised with inbound PDU
/// handling. The handle stays valid until the session's `run` returns;
/// after that every call reports [`EsmeError::SessionClosed`].
#[derive(Clone, Debug)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    /// Submit a short message.
    ///
    /// Returns the sequence numbers of the PDUs sent: several for a
    /// multipart submission, one otherwise, and none when the session is
    /// not in a transmitting state (the message is dropped and logged).
    pub async fn submit_sm(&self, params: SubmitParams) -> EsmeResult<Vec<u32>> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::SubmitSm { params, reply })
            .map_err(|_| EsmeError::SessionClosed)?;
        response.await.map_err(|_| EsmeError::SessionClosed)?
    }

    /// Query the state of a previously submitted message. Returns the
    /// query's sequence number, or `None` when the session cannot transmit.
    pub async fn query_sm(
        &self,
        message_id: impl Into<String>,
        source_addr: impl Into<String>,
    ) -> EsmeResult<Option<u32>> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::QuerySm {
                message_id: message_id.into(),
                source_addr: source_addr.into(),
                reply,
            })
            .map_err(|_| EsmeError::SessionClosed)?;
        response.await.map_err(|_| EsmeError::SessionClosed)?
    }
}

/// Whether the dispatch loop keeps running after a PDU.
#[derive(PartialEq)]
enum Flow {
    Continue,
    Stop,
}

/// One SMPP session: state machine, dispatcher and submit pipeline.
pub struct Session<K, D, M, C> {
    pub(super) config: SessionConfig,
    pub(super) role: Role,
    pub(super) bind_params: BindParams,
    pub(super) state: SessionState,
    pub(super) seq: SequenceAllocator<K>,
    pub(super) unacked: UnackedLedger<K>,
    pub(super) dr_processor: D,
    pub(super) sm_processor: M,
    pub(super) callbacks: C,
    commands: mpsc::UnboundedReceiver<Command>,
    handle: SessionHandle,
}

impl<K, D, M, C> Session<K, D, M, C>
where
    K: KeyValueStore,
    D: DeliveryReportProcessor,
    M: ShortMessageProcessor,
    C: EsmeCallbacks,
{
    /// Build a session and the handle that will feed it commands.
    ///
    /// The handle is also what the `connected` callback receives; it can be
    /// cloned freely and used from any task.
    pub fn new(
        config: SessionConfig,
        role: Role,
        bind_params: BindParams,
        store: K,
        dr_processor: D,
        sm_processor: M,
        callbacks: C,
    ) -> (Self, SessionHandle) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let handle = SessionHandle {
            commands: commands_tx,
        };
        let session = Session {
            config,
            role,
            bind_params,
            state: SessionState::Closed,
            seq: SequenceAllocator::new(store.clone()),
            unacked: UnackedLedger::new(store),
            dr_processor,
            sm_processor,
            callbacks,
            commands,
            handle: handle.clone(),
        };
        (session, handle)
    }

    /// Connect to `addr` and drive the session over the TCP stream.
    pub async fn run_tcp<A: ToSocketAddrs + Send>(self, addr: A) -> EsmeResult<()> {
        let stream = TcpStream::connect(addr).await?;
        self.run(stream).await
    }

    /// Drive the session over `stream` until the connection ends.
    ///
    /// Resolves when the peer closes or unbinds, the bind times out, or the
    /// transport fails. Whatever the path out, the state ends at `CLOSED`
    /// and the `disconnected` callback fires exactly once.
    pub async fn run<S>(mut self, stream: S) -> EsmeResult<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, mut writer) = connection::split(stream);
        let (ingress, mut frames) = spawn_ingress(reader);
        // Detach the command stream so the select loop can poll it while
        // handlers borrow `self`. The replacement receiver is never used.
        let mut commands = mem::replace(&mut self.commands, mpsc::unbounded_channel().1);

        self.set_state(SessionState::Open);
        let result = self.drive(&mut writer, &mut frames, &mut commands).await;

        // Pending ingress is abandoned with the connection.
        ingress.abort();
        self.set_state(SessionState::Closed);
        self.callbacks.disconnected().await;
        result
    }

    async fn drive<W>(
        &mut self,
        writer: &mut FrameWriter<W>,
        frames: &mut mpsc::UnboundedReceiver<Bytes>,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> EsmeResult<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let sequence_number = self.seq.next().await?;
        writer.write_pdu(&self.bind_pdu(sequence_number)).await?;
        info!(role = ?self.role, sequence_number, "bind requested");

        let bind_timeout = time::sleep(self.config.bind_timeout);
        tokio::pin!(bind_timeout);
        let mut link_check = time::interval(self.config.enquire_link_interval);
        link_check.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a fresh interval completes immediately; push it
        // one full period out instead.
        link_check.reset();

        loop {
            tokio::select! {
                frame = frames.recv() => match frame {
                    Some(frame) => {
                        if self.dispatch(frame, writer).await? == Flow::Stop {
                            return Ok(());
                        }
                    }
                    // Reader gone: transport lost or framing violation.
                    None => return Ok(()),
                },
                () = &mut bind_timeout, if self.state == SessionState::Open => {
                    warn!(
                        expected = %self.role.bound_state(),
                        "breaking connection due to binding delay"
                    );
                    return Ok(());
                },
                // The link check is live in any bound state and a no-op
                // otherwise.
                _ = link_check.tick(), if self.state.is_bound() => {
                    self.enquire_link(writer).await?;
                },
                Some(command) = commands.recv() => {
                    self.handle_command(command, writer).await;
                },
            }
        }
    }

    fn set_state(&mut self, state: SessionState) {
        self.state = state;
        debug!(state = %self.state, "session state");
    }

    fn bind_pdu(&self, sequence_number: u32) -> Bind {
        let params = &self.bind_params;
        Bind {
            command_id: self.role.bind_command(),
            sequence_number,
            system_id: params.system_id.clone(),
            password: params.password.clone(),
            system_type: params.system_type.clone(),
            interface_version: params.interface_version,
            addr_ton: params.addr_ton,
            addr_npi: params.addr_npi,
            address_range: params.address_range.clone(),
        }
    }

    async fn dispatch<W>(&mut self, frame: Bytes, writer: &mut FrameWriter<W>) -> EsmeResult<Flow>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let pdu = match Pdu::parse(&frame) {
            Ok(pdu) => pdu,
            // Unknown or undecodable PDUs never tear the session down.
            Err(err) => {
                warn!(%err, "dropping inbound frame");
                return Ok(Flow::Continue);
            }
        };

        if !matches!(pdu, Pdu::EnquireLink(_) | Pdu::EnquireLinkResponse(_)) {
            debug!(%pdu, "incoming");
        }

        match pdu {
            Pdu::BindResponse(resp) => self.handle_bind_response(resp).await,
            Pdu::Unbind(pdu) => {
                self.handle_unbind(pdu, writer).await?;
                return Ok(Flow::Stop);
            }
            Pdu::EnquireLink(pdu) => self.handle_enquire_link(pdu, writer).await?,
            Pdu::EnquireLinkResponse(pdu) => self.handle_enquire_link_response(&pdu),
            Pdu::SubmitSmResponse(resp) => self.handle_submit_sm_response(resp).await?,
            Pdu::DeliverSm(pdu) => self.handle_deliver_sm(*pdu, writer).await?,
            other => warn!(pdu = %other, "no handler for inbound pdu"),
        }
        Ok(Flow::Continue)
    }

    async fn handle_bind_response(&mut self, resp: BindResponse) {
        if resp.command_id != self.role.bind_response_command() {
            warn!(
                pdu = ?resp.command_id,
                role = ?self.role,
                "bind response does not match session role"
            );
            return;
        }
        if self.state != SessionState::Open {
            warn!(state = %self.state, "bind response outside OPEN, ignoring");
            return;
        }

        if resp.command_status == CommandStatus::Ok {
            self.set_state(self.role.bound_state());
            info!(system_id = %resp.system_id, state = %self.state, "bound");
            let handle = self.handle.clone();
            self.callbacks.connected(handle).await;
        } else {
            // Stay in OPEN; the bind timeout will drop the connection.
            warn!(status = ?resp.command_status, "bind rejected");
        }
    }

    async fn handle_unbind<W>(
        &mut self,
        pdu: Unbind,
        writer: &mut FrameWriter<W>,
    ) -> EsmeResult<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        self.set_state(SessionState::Unbinding);
        writer
            .write_pdu(&UnbindResponse::new(pdu.sequence_number))
            .await?;
        info!(sequence_number = pdu.sequence_number, "unbind acknowledged, closing");
        Ok(())
    }

    async fn handle_enquire_link<W>(
        &mut self,
        pdu: EnquireLink,
        writer: &mut FrameWriter<W>,
    ) -> EsmeResult<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        if pdu.command_status == CommandStatus::Ok {
            writer
                .write_pdu(&EnquireLinkResponse::new(pdu.sequence_number))
                .await?;
        } else {
            warn!(status = ?pdu.command_status, "enquire_link with non-ok status");
        }
        Ok(())
    }

    fn handle_enquire_link_response(&self, pdu: &EnquireLinkResponse) {
        // The reply arriving at all is the liveness evidence.
        if pdu.command_status == CommandStatus::Ok {
            trace!(sequence_number = pdu.sequence_number, "enquire_link answered");
        } else {
            warn!(status = ?pdu.command_status, "enquire_link_resp with non-ok status");
        }
    }

    async fn handle_submit_sm_response(&mut self, resp: SubmitSmResponse) -> EsmeResult<()> {
        self.unacked.pop().await?;
        self.callbacks.submit_sm_resp(&resp).await;
        Ok(())
    }

    async fn handle_deliver_sm<W>(
        &mut self,
        pdu: DeliverSm,
        writer: &mut FrameWriter<W>,
    ) -> EsmeResult<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        if !self.state.can_receive() {
            warn!(state = %self.state, "deliver_sm in wrong state, dropping");
            return Ok(());
        }
        if pdu.command_status != CommandStatus::Ok {
            return Ok(());
        }

        // Ack first; the SMSC retransmits anything left unacknowledged.
        writer
            .write_pdu(&DeliverSmResponse::new(pdu.sequence_number))
            .await?;

        // Precedence is contractual: delivery reports, then multipart, then
        // USSD, then text. A PDU can structurally satisfy more than one.
        if let Some(report) = self.dr_processor.handle_delivery_report_pdu(&pdu).await {
            self.callbacks.delivery_report(&report).await;
            return Ok(());
        }

        match self.sm_processor.handle_multipart_pdu(&pdu).await {
            MultipartStatus::Buffered => return Ok(()),
            MultipartStatus::Reassembled(content) => {
                self.callbacks.deliver_sm(&pdu, &content).await;
                return Ok(());
            }
            MultipartStatus::NotMultipart => {}
        }

        if let Some(content) = self.sm_processor.handle_ussd_pdu(&pdu).await {
            self.callbacks.deliver_sm(&pdu, &content).await;
            return Ok(());
        }

        let parts = self.sm_processor.decode_pdus(&[&pdu]);
        let Some(parts) = parts.into_iter().collect::<Option<Vec<_>>>() else {
            warn!(
                sequence_number = pdu.sequence_number,
                "not all parts of the pdu could be decoded, dropping"
            );
            return Ok(());
        };
        let content = parts.concat();

        if let Some(report) = self
            .dr_processor
            .handle_delivery_report_content(&content)
            .await
        {
            self.callbacks.delivery_report(&report).await;
            return Ok(());
        }

        self.callbacks.deliver_sm(&pdu, &content).await;
        Ok(())
    }

    async fn enquire_link<W>(&mut self, writer: &mut FrameWriter<W>) -> EsmeResult<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        if !self.state.is_bound() {
            return Ok(());
        }
        let sequence_number = self.seq.next().await?;
        writer.write_pdu(&EnquireLink::new(sequence_number)).await?;
        trace!(sequence_number, "enquire_link sent");
        Ok(())
    }

    async fn query_sm<W>(
        &mut self,
        message_id: String,
        source_addr: String,
        writer: &mut FrameWriter<W>,
    ) -> EsmeResult<Option<u32>>
    where
        W: AsyncWrite + Unpin + Send,
    {
        if !self.state.can_transmit() {
            warn!(state = %self.state, %message_id, "query_sm in wrong state, dropping");
            return Ok(None);
        }

        let sequence_number = self.seq.next().await?;
        let pdu = QuerySm {
            sequence_number,
            message_id,
            source_addr_ton: self.bind_params.addr_ton,
            source_addr_npi: self.bind_params.addr_npi,
            source_addr,
        };
        writer.write_pdu(&pdu).await?;
        Ok(Some(sequence_number))
    }

    async fn handle_command<W>(&mut self, command: Command, writer: &mut FrameWriter<W>)
    where
        W: AsyncWrite + Unpin + Send,
    {
        // Command failures belong to the caller awaiting the reply, not to
        // the session; a dead transport also surfaces through the reader.
        match command {
            Command::SubmitSm { params, reply } => {
                let result = self.submit_sm(params, writer).await;
                let _ = reply.send(result);
            }
            Command::QuerySm {
                message_id,
                source_addr,
                reply,
            } => {
                let result = self.query_sm(message_id, source_addr, writer).await;
                let _ = reply.send(result);
            }
        }
    }
}

/// Read frames off the socket and queue them for the dispatcher, in arrival
/// order. The queue closing is the transport-lost signal.
fn spawn_ingress<R>(
    mut reader: FrameReader<R>,
) -> (JoinHandle<()>, mpsc::UnboundedReceiver<Bytes>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (frames, queue) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        loop {
            match reader.read_frame().await {
                Ok(Some(frame)) => {
                    if frames.send(frame).is_err() {
                        return;
                    }
                }
                Ok(None) => return,
                Err(err) => {
                    warn!(%err, "closing connection after framing error");
                    return;
                }
            }
        }
    });
    (task, queue)
}
