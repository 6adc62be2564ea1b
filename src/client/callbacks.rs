use crate::client::processors::DeliveryReport;
use crate::client::session::SessionHandle;
use crate::datatypes::{DeliverSm, SubmitSmResponse};
use std::future::Future;

/// Observer interface for session events.
///
/// Every method defaults to a no-op, so an implementation overrides only the
/// events it cares about. Callbacks run on the session task, between PDUs:
/// the next inbound PDU is not dispatched until the callback's future
/// completes, so ordering here matches wire order.
pub trait EsmeCallbacks: Send + 'static {
    /// The session reached its bound state. `session` accepts submissions
    /// for as long as the connection lasts.
    fn connected(&mut self, session: SessionHandle) -> impl Future<Output = ()> + Send {
        let _ = session;
        async {}
    }

    /// The transport is gone and the session is closed. Fires exactly once
    /// per connection, however it ended.
    fn disconnected(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// The SMSC answered a submit_sm.
    fn submit_sm_resp(&mut self, resp: &SubmitSmResponse) -> impl Future<Output = ()> + Send {
        let _ = resp;
        async {}
    }

    /// A delivery report was recognised, in PDU or text form.
    fn delivery_report(&mut self, report: &DeliveryReport) -> impl Future<Output = ()> + Send {
        let _ = report;
        async {}
    }

    /// An inbound message (plain, reassembled multipart, or USSD) with its
    /// decoded content.
    fn deliver_sm(&mut self, pdu: &DeliverSm, content: &str) -> impl Future<Output = ()> + Send {
        let _ = (pdu, content);
        async {}
    }
}

/// Callbacks that ignore every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCallbacks;

impl EsmeCallbacks for NoCallbacks {}
