//! End-to-end session tests: a real `Session` driven over an in-memory
//! duplex stream against a scripted SMSC.

use crate::client::{
    BindParams, DeliveryReport, DeliveryReportProcessor, EsmeCallbacks, EsmeResult,
    MessageType, MultipartStatus, NullDeliveryReportProcessor, NullShortMessageProcessor, Role,
    Session, SessionConfig, SessionHandle, ShortMessageProcessor, SubmitParams,
};
use crate::codec::Pdu;
use crate::connection::{self, FrameReader, FrameWriter};
use crate::datatypes::{
    BindResponse, CommandId, CommandStatus, DeliverSm, EnquireLink, GenericNack, SubmitSm,
    SubmitSmResponse, Unbind,
};
use crate::store::MemoryStore;
use crate::unacked::UnackedLedger;
use bytes::Bytes;
use std::future::Future;
use std::time::Duration;
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The far side of the duplex pair, speaking just enough SMSC to script the
/// scenarios.
struct TestSmsc {
    reader: FrameReader<ReadHalf<DuplexStream>>,
    writer: FrameWriter<WriteHalf<DuplexStream>>,
}

impl TestSmsc {
    fn new(stream: DuplexStream) -> TestSmsc {
        let (reader, writer) = connection::split(stream);
        TestSmsc { reader, writer }
    }

    async fn read_pdu(&mut self) -> Pdu {
        let frame = self
            .reader
            .read_frame()
            .await
            .expect("smsc read failed")
            .expect("client hung up");
        Pdu::parse(&frame).expect("client sent an unparseable pdu")
    }

    async fn send<P: crate::codec::Encodable>(&mut self, pdu: &P) {
        self.writer.write_pdu(pdu).await.expect("smsc write failed");
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer
            .write_raw(bytes)
            .await
            .expect("smsc raw write failed");
    }

    /// Read the client's bind request and accept it.
    async fn accept_bind(&mut self, role: Role) -> u32 {
        let sequence_number = match self.read_pdu().await {
            Pdu::Bind(bind) => {
                assert_eq!(bind.command_id, role.bind_command());
                assert_eq!(bind.system_id, "testsys");
                assert_eq!(bind.password.as_deref(), Some("secret"));
                bind.sequence_number
            }
            other => panic!("expected a bind request, got {other}"),
        };

        self.send(&BindResponse {
            command_id: role.bind_response_command(),
            command_status: CommandStatus::Ok,
            sequence_number,
            system_id: "SMSC".to_string(),
            sc_interface_version: None,
        })
        .await;
        sequence_number
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Event {
    Connected,
    Disconnected,
    SubmitSmResp {
        sequence_number: u32,
        message_id: Option<String>,
    },
    DeliveryReport {
        message_id: String,
        stat: String,
    },
    DeliverSm {
        content: String,
    },
}

/// Callback implementation that records every event on a channel.
struct Recorder {
    events: mpsc::UnboundedSender<Event>,
}

impl EsmeCallbacks for Recorder {
    fn connected(&mut self, _session: SessionHandle) -> impl Future<Output = ()> + Send {
        let _ = self.events.send(Event::Connected);
        async {}
    }

    fn disconnected(&mut self) -> impl Future<Output = ()> + Send {
        let _ = self.events.send(Event::Disconnected);
        async {}
    }

    fn submit_sm_resp(&mut self, resp: &SubmitSmResponse) -> impl Future<Output = ()> + Send {
        let _ = self.events.send(Event::SubmitSmResp {
            sequence_number: resp.sequence_number,
            message_id: resp.message_id.clone(),
        });
        async {}
    }

    fn delivery_report(&mut self, report: &DeliveryReport) -> impl Future<Output = ()> + Send {
        let _ = self.events.send(Event::DeliveryReport {
            message_id: report.message_id.clone(),
            stat: report.stat.clone(),
        });
        async {}
    }

    fn deliver_sm(&mut self, _pdu: &DeliverSm, content: &str) -> impl Future<Output = ()> + Send {
        let _ = self.events.send(Event::DeliverSm {
            content: content.to_string(),
        });
        async {}
    }
}

type SessionTask = JoinHandle<EsmeResult<()>>;

fn spawn_session<D, M>(
    config: SessionConfig,
    role: Role,
    store: MemoryStore,
    dr_processor: D,
    sm_processor: M,
) -> (SessionTask, TestSmsc, SessionHandle, mpsc::UnboundedReceiver<Event>)
where
    D: DeliveryReportProcessor,
    M: ShortMessageProcessor,
{
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let (events_tx, events) = mpsc::unbounded_channel();
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (session, handle) = Session::new(
        config,
        role,
        BindParams::new("testsys", "secret"),
        store,
        dr_processor,
        sm_processor,
        Recorder { events: events_tx },
    );
    let task = tokio::spawn(session.run(client_io));
    (task, TestSmsc::new(server_io), handle, events)
}

fn spawn_default_session(
    config: SessionConfig,
    role: Role,
    store: MemoryStore,
) -> (SessionTask, TestSmsc, SessionHandle, mpsc::UnboundedReceiver<Event>) {
    spawn_session(
        config,
        role,
        store,
        NullDeliveryReportProcessor,
        NullShortMessageProcessor,
    )
}

async fn read_submit_sm(smsc: &mut TestSmsc) -> SubmitSm {
    match smsc.read_pdu().await {
        Pdu::SubmitSm(pdu) => *pdu,
        other => panic!("expected submit_sm, got {other}"),
    }
}

#[tokio::test]
async fn bind_transceiver_lifecycle() {
    let (task, mut smsc, _handle, mut events) = spawn_default_session(
        SessionConfig::default(),
        Role::Transceiver,
        MemoryStore::new(),
    );

    let bind_seq = smsc.accept_bind(Role::Transceiver).await;
    assert_eq!(bind_seq, 1);
    assert_eq!(events.recv().await, Some(Event::Connected));

    // SMSC-initiated unbind: the client echoes the sequence number and
    // closes.
    smsc.send(&Unbind::new(9)).await;
    match smsc.read_pdu().await {
        Pdu::UnbindResponse(resp) => assert_eq!(resp.sequence_number, 9),
        other => panic!("expected unbind_resp, got {other}"),
    }

    assert!(task.await.unwrap().is_ok());
    assert_eq!(events.recv().await, Some(Event::Disconnected));
    assert_eq!(events.recv().await, None);
}

#[tokio::test(start_paused = true)]
async fn bind_timeout_drops_the_connection() {
    let config = SessionConfig::default().bind_timeout(Duration::from_secs(1));
    let (task, mut smsc, _handle, mut events) =
        spawn_default_session(config, Role::Transceiver, MemoryStore::new());

    // Swallow the bind request and never answer it.
    let _ = smsc.read_pdu().await;
    let started = tokio::time::Instant::now();

    assert!(task.await.unwrap().is_ok());
    assert!(started.elapsed() >= Duration::from_secs(1));

    // Only the disconnect callback fired.
    assert_eq!(events.recv().await, Some(Event::Disconnected));
    assert_eq!(events.recv().await, None);
}

#[tokio::test(start_paused = true)]
async fn rejected_bind_stays_open_until_the_timeout_closes_it() {
    let config = SessionConfig::default().bind_timeout(Duration::from_secs(5));
    let (task, mut smsc, _handle, mut events) =
        spawn_default_session(config, Role::Transmitter, MemoryStore::new());

    let bind_seq = match smsc.read_pdu().await {
        Pdu::Bind(bind) => bind.sequence_number,
        other => panic!("expected bind, got {other}"),
    };
    smsc.send(&BindResponse {
        command_id: CommandId::BindTransmitterResp,
        command_status: CommandStatus::BindFailed,
        sequence_number: bind_seq,
        system_id: String::new(),
        sc_interface_version: None,
    })
    .await;

    assert!(task.await.unwrap().is_ok());
    assert_eq!(events.recv().await, Some(Event::Disconnected));
    assert_eq!(events.recv().await, None);
}

#[tokio::test]
async fn submit_sm_round_trip_updates_the_ledger() {
    let store = MemoryStore::new();
    let unacked = UnackedLedger::new(store.clone());
    let (_task, mut smsc, handle, mut events) =
        spawn_default_session(SessionConfig::default(), Role::Transceiver, store);

    smsc.accept_bind(Role::Transceiver).await;
    assert_eq!(events.recv().await, Some(Event::Connected));

    let sequence_numbers = handle
        .submit_sm(SubmitParams::new("12345", "67890", "hi"))
        .await
        .unwrap();
    assert_eq!(sequence_numbers, vec![2]);
    assert_eq!(unacked.len().await.unwrap(), 1);

    let pdu = read_submit_sm(&mut smsc).await;
    assert_eq!(pdu.sequence_number, 2);
    assert_eq!(pdu.destination_addr, "67890");
    assert_eq!(pdu.short_message.as_ref(), b"hi");

    smsc.send(&SubmitSmResponse {
        command_status: CommandStatus::Ok,
        sequence_number: 2,
        message_id: Some("abc".to_string()),
    })
    .await;

    assert_eq!(
        events.recv().await,
        Some(Event::SubmitSmResp {
            sequence_number: 2,
            message_id: Some("abc".to_string()),
        })
    );
    assert_eq!(unacked.len().await.unwrap(), 0);
}

#[tokio::test]
async fn submit_outside_a_transmitting_state_is_dropped() {
    let store = MemoryStore::new();
    let unacked = UnackedLedger::new(store.clone());
    let (task, smsc, handle, mut events) =
        spawn_default_session(SessionConfig::default(), Role::Transceiver, store);

    // No bind response has arrived; the session is still OPEN.
    let sequence_numbers = handle
        .submit_sm(SubmitParams::new("12345", "67890", "hi"))
        .await
        .unwrap();
    assert!(sequence_numbers.is_empty());
    assert_eq!(unacked.len().await.unwrap(), 0);

    drop(smsc);
    assert!(task.await.unwrap().is_ok());
    assert_eq!(events.recv().await, Some(Event::Disconnected));
}

#[tokio::test]
async fn long_submit_splits_via_sar() {
    let store = MemoryStore::new();
    let unacked = UnackedLedger::new(store.clone());
    let config = SessionConfig::default().send_multipart_sar(true);
    let (_task, mut smsc, handle, mut events) =
        spawn_default_session(config, Role::Transceiver, store);

    smsc.accept_bind(Role::Transceiver).await;
    assert_eq!(events.recv().await, Some(Event::Connected));

    let payload: Vec<u8> = (0..300u16).map(|i| (i % 251) as u8).collect();
    let sequence_numbers = handle
        .submit_sm(SubmitParams::new("12345", "67890", payload.clone()))
        .await
        .unwrap();
    assert_eq!(sequence_numbers, vec![2, 3, 4]);
    assert_eq!(unacked.len().await.unwrap(), 3);

    let mut rejoined = Vec::new();
    let mut reference = None;
    for expected_seqnum in 1..=3u8 {
        let pdu = read_submit_sm(&mut smsc).await;

        let msg_ref = pdu.sar_msg_ref_num.as_ref().unwrap().as_u16().unwrap();
        assert!((1..=255).contains(&msg_ref));
        // Every segment shares one reference number.
        assert_eq!(*reference.get_or_insert(msg_ref), msg_ref);

        assert_eq!(pdu.sar_total_segments.as_ref().unwrap().as_u8(), Some(3));
        assert_eq!(
            pdu.sar_segment_seqnum.as_ref().unwrap().as_u8(),
            Some(expected_seqnum)
        );
        rejoined.extend_from_slice(&pdu.short_message);
    }
    assert_eq!(rejoined, payload);
}

#[tokio::test]
async fn long_submit_splits_via_udh() {
    let config = SessionConfig::default().send_multipart_udh(true);
    let (_task, mut smsc, handle, mut events) =
        spawn_default_session(config, Role::Transceiver, MemoryStore::new());

    smsc.accept_bind(Role::Transceiver).await;
    assert_eq!(events.recv().await, Some(Event::Connected));

    let payload: Vec<u8> = (0..260u16).map(|i| (i % 251) as u8).collect();
    let sequence_numbers = handle
        .submit_sm(SubmitParams::new("12345", "67890", payload.clone()))
        .await
        .unwrap();
    assert_eq!(sequence_numbers.len(), 2);

    let mut rejoined = Vec::new();
    let mut reference = None;
    for index in 1..=2u8 {
        let pdu = read_submit_sm(&mut smsc).await;
        assert_eq!(pdu.esm_class, 0x40);

        let message = pdu.short_message.as_ref();
        assert_eq!(&message[0..3], &[0x05, 0x00, 0x03]);
        assert_eq!(*reference.get_or_insert(message[3]), message[3]);
        assert_eq!(message[4], 2);
        assert_eq!(message[5], index);
        rejoined.extend_from_slice(&message[6..]);
    }
    assert_eq!(rejoined, payload);
}

#[tokio::test]
async fn ussd_submit_carries_the_session_options() {
    let (_task, mut smsc, handle, mut events) = spawn_default_session(
        SessionConfig::default(),
        Role::Transceiver,
        MemoryStore::new(),
    );

    smsc.accept_bind(Role::Transceiver).await;
    assert_eq!(events.recv().await, Some(Event::Connected));

    let params = SubmitParams::new("1458", "27820001001", "menu text")
        .message_type(MessageType::Ussd)
        .continue_session(false)
        .session_info(Some("0010".to_string()));
    handle.submit_sm(params).await.unwrap();

    let pdu = read_submit_sm(&mut smsc).await;
    assert_eq!(pdu.ussd_service_op.as_ref().unwrap().as_u8(), Some(0x02));
    assert_eq!(
        pdu.its_session_info.as_ref().unwrap().as_u16(),
        Some(0x0011)
    );
}

#[tokio::test]
async fn oversized_single_segment_rides_in_message_payload() {
    let config = SessionConfig::default().send_long_messages(true);
    let (_task, mut smsc, handle, mut events) =
        spawn_default_session(config, Role::Transceiver, MemoryStore::new());

    smsc.accept_bind(Role::Transceiver).await;
    assert_eq!(events.recv().await, Some(Event::Connected));

    let payload = vec![b'z'; 300];
    let sequence_numbers = handle
        .submit_sm(SubmitParams::new("12345", "67890", payload.clone()))
        .await
        .unwrap();
    assert_eq!(sequence_numbers.len(), 1);

    let pdu = read_submit_sm(&mut smsc).await;
    assert!(pdu.short_message.is_empty());
    assert_eq!(
        pdu.message_payload.as_ref().unwrap().value.as_ref(),
        payload.as_slice()
    );
}

struct StubReportProcessor;

impl DeliveryReportProcessor for StubReportProcessor {
    fn handle_delivery_report_pdu(
        &mut self,
        _pdu: &DeliverSm,
    ) -> impl Future<Output = Option<DeliveryReport>> + Send {
        async {
            Some(DeliveryReport {
                message_id: "report-1".to_string(),
                stat: "DELIVRD".to_string(),
            })
        }
    }
}

/// Short-message processor that fails the test if any of its stages run.
struct UnreachableShortMessageProcessor;

impl ShortMessageProcessor for UnreachableShortMessageProcessor {
    fn handle_multipart_pdu(
        &mut self,
        _pdu: &DeliverSm,
    ) -> impl Future<Output = MultipartStatus> + Send {
        async { panic!("multipart stage ran after a recognised delivery report") }
    }

    fn handle_ussd_pdu(&mut self, _pdu: &DeliverSm) -> impl Future<Output = Option<String>> + Send {
        async { panic!("ussd stage ran after a recognised delivery report") }
    }
}

#[tokio::test]
async fn recognised_delivery_reports_preempt_the_rest_of_the_pipeline() {
    let (task, mut smsc, _handle, mut events) = spawn_session(
        SessionConfig::default(),
        Role::Transceiver,
        MemoryStore::new(),
        StubReportProcessor,
        UnreachableShortMessageProcessor,
    );

    smsc.accept_bind(Role::Transceiver).await;
    assert_eq!(events.recv().await, Some(Event::Connected));

    smsc.send(&DeliverSm {
        sequence_number: 50,
        esm_class: 0x04,
        short_message: Bytes::from_static(b"id:report-1 stat:DELIVRD"),
        ..DeliverSm::default()
    })
    .await;

    // The ack goes out before any processing.
    match smsc.read_pdu().await {
        Pdu::DeliverSmResponse(resp) => assert_eq!(resp.sequence_number, 50),
        other => panic!("expected deliver_sm_resp, got {other}"),
    }
    assert_eq!(
        events.recv().await,
        Some(Event::DeliveryReport {
            message_id: "report-1".to_string(),
            stat: "DELIVRD".to_string(),
        })
    );

    // A panic in the unreachable stages would have killed the task.
    smsc.send(&Unbind::new(60)).await;
    let _ = smsc.read_pdu().await;
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test]
async fn plain_deliveries_reach_the_deliver_sm_callback() {
    let (_task, mut smsc, _handle, mut events) = spawn_default_session(
        SessionConfig::default(),
        Role::Transceiver,
        MemoryStore::new(),
    );

    smsc.accept_bind(Role::Transceiver).await;
    assert_eq!(events.recv().await, Some(Event::Connected));

    smsc.send(&DeliverSm {
        sequence_number: 7,
        source_addr: "27820001001".to_string(),
        short_message: Bytes::from_static(b"hi there"),
        ..DeliverSm::default()
    })
    .await;

    match smsc.read_pdu().await {
        Pdu::DeliverSmResponse(resp) => assert_eq!(resp.sequence_number, 7),
        other => panic!("expected deliver_sm_resp, got {other}"),
    }
    assert_eq!(
        events.recv().await,
        Some(Event::DeliverSm {
            content: "hi there".to_string(),
        })
    );
}

#[tokio::test]
async fn undecodable_deliveries_are_acked_then_dropped() {
    let (_task, mut smsc, _handle, mut events) = spawn_default_session(
        SessionConfig::default(),
        Role::Transceiver,
        MemoryStore::new(),
    );

    smsc.accept_bind(Role::Transceiver).await;
    assert_eq!(events.recv().await, Some(Event::Connected));

    smsc.send(&DeliverSm {
        sequence_number: 8,
        data_coding: 0x08,
        short_message: Bytes::from_static(&[0xFF, 0xFE, 0x00]),
        ..DeliverSm::default()
    })
    .await;

    match smsc.read_pdu().await {
        Pdu::DeliverSmResponse(resp) => assert_eq!(resp.sequence_number, 8),
        other => panic!("expected deliver_sm_resp, got {other}"),
    }

    // Still alive, and no deliver_sm callback fired for the dropped PDU.
    smsc.send(&EnquireLink::new(70)).await;
    match smsc.read_pdu().await {
        Pdu::EnquireLinkResponse(resp) => assert_eq!(resp.sequence_number, 70),
        other => panic!("expected enquire_link_resp, got {other}"),
    }
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn deliveries_in_a_transmit_only_session_are_not_acked() {
    let (_task, mut smsc, _handle, mut events) = spawn_default_session(
        SessionConfig::default(),
        Role::Transmitter,
        MemoryStore::new(),
    );

    smsc.accept_bind(Role::Transmitter).await;
    assert_eq!(events.recv().await, Some(Event::Connected));

    smsc.send(&DeliverSm {
        sequence_number: 11,
        short_message: Bytes::from_static(b"misdirected"),
        ..DeliverSm::default()
    })
    .await;
    smsc.send(&EnquireLink::new(12)).await;

    // The first thing coming back is the enquire_link_resp: the deliver_sm
    // was dropped without an ack.
    match smsc.read_pdu().await {
        Pdu::EnquireLinkResponse(resp) => assert_eq!(resp.sequence_number, 12),
        other => panic!("expected enquire_link_resp, got {other}"),
    }
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn inbound_enquire_link_is_echoed() {
    let (_task, mut smsc, _handle, mut events) = spawn_default_session(
        SessionConfig::default(),
        Role::Transceiver,
        MemoryStore::new(),
    );

    smsc.accept_bind(Role::Transceiver).await;
    assert_eq!(events.recv().await, Some(Event::Connected));

    smsc.send(&EnquireLink::new(42)).await;
    match smsc.read_pdu().await {
        Pdu::EnquireLinkResponse(resp) => assert_eq!(resp.sequence_number, 42),
        other => panic!("expected enquire_link_resp, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn the_link_check_loop_sends_enquire_link_while_bound() {
    let config = SessionConfig::default().enquire_link_interval(Duration::from_secs(55));
    let (_task, mut smsc, _handle, mut events) =
        spawn_default_session(config, Role::Transceiver, MemoryStore::new());

    smsc.accept_bind(Role::Transceiver).await;
    assert_eq!(events.recv().await, Some(Event::Connected));
    let bound_at = tokio::time::Instant::now();

    match smsc.read_pdu().await {
        Pdu::EnquireLink(pdu) => assert_eq!(pdu.sequence_number, 2),
        other => panic!("expected enquire_link, got {other}"),
    }
    assert!(bound_at.elapsed() >= Duration::from_secs(55));

    // And again a period later.
    match smsc.read_pdu().await {
        Pdu::EnquireLink(pdu) => assert_eq!(pdu.sequence_number, 3),
        other => panic!("expected enquire_link, got {other}"),
    }
}

#[tokio::test]
async fn unknown_commands_are_dropped_without_killing_the_session() {
    let (_task, mut smsc, _handle, mut events) = spawn_default_session(
        SessionConfig::default(),
        Role::Transceiver,
        MemoryStore::new(),
    );

    smsc.accept_bind(Role::Transceiver).await;
    assert_eq!(events.recv().await, Some(Event::Connected));

    // A well-framed PDU with a command id nothing recognises.
    let mut unknown = Vec::new();
    unknown.extend_from_slice(&16u32.to_be_bytes());
    unknown.extend_from_slice(&0x0000_00FFu32.to_be_bytes());
    unknown.extend_from_slice(&0u32.to_be_bytes());
    unknown.extend_from_slice(&5u32.to_be_bytes());
    smsc.send_raw(&unknown).await;

    // A recognised-but-unhandled command is equally survivable.
    smsc.send(&GenericNack::error(1, CommandStatus::SystemError))
        .await;

    smsc.send(&EnquireLink::new(90)).await;
    match smsc.read_pdu().await {
        Pdu::EnquireLinkResponse(resp) => assert_eq!(resp.sequence_number, 90),
        other => panic!("expected enquire_link_resp, got {other}"),
    }
}

#[tokio::test]
async fn query_sm_goes_out_while_bound_for_transmit() {
    let (_task, mut smsc, handle, mut events) = spawn_default_session(
        SessionConfig::default(),
        Role::Transmitter,
        MemoryStore::new(),
    );

    smsc.accept_bind(Role::Transmitter).await;
    assert_eq!(events.recv().await, Some(Event::Connected));

    let sequence_number = handle.query_sm("msg_77", "12345").await.unwrap();
    assert_eq!(sequence_number, Some(2));

    match smsc.read_pdu().await {
        Pdu::QuerySm(pdu) => {
            assert_eq!(pdu.sequence_number, 2);
            assert_eq!(pdu.message_id, "msg_77");
            assert_eq!(pdu.source_addr, "12345");
        }
        other => panic!("expected query_sm, got {other}"),
    }
}

#[tokio::test]
async fn handles_report_closed_after_the_session_ends() {
    let (task, smsc, handle, _events) = spawn_default_session(
        SessionConfig::default(),
        Role::Transceiver,
        MemoryStore::new(),
    );

    drop(smsc);
    assert!(task.await.unwrap().is_ok());

    let result = handle.submit_sm(SubmitParams::new("1", "2", "x")).await;
    assert!(matches!(result, Err(crate::client::EsmeError::SessionClosed)));
}
