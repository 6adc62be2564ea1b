mod bind;
mod command_id;
mod command_status;
mod deliver_sm;
mod enquire_link;
mod generic_nack;
mod interface_version;
mod numeric_plan_indicator;
mod priority_flag;
mod query_sm;
mod submit_sm;
mod tlv;
mod type_of_number;
mod unbind;

pub use bind::{Bind, BindResponse};
pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use deliver_sm::{DeliverSm, DeliverSmResponse};
pub use enquire_link::{EnquireLink, EnquireLinkResponse};
pub use generic_nack::GenericNack;
pub use interface_version::InterfaceVersion;
pub use numeric_plan_indicator::NumericPlanIndicator;
pub use priority_flag::PriorityFlag;
pub use query_sm::QuerySm;
pub use submit_sm::{MAX_SHORT_MESSAGE_BYTES, SubmitSm, SubmitSmResponse};
pub use tlv::{Tlv, tags};
pub use type_of_number::TypeOfNumber;
pub use unbind::{Unbind, UnbindResponse};

// C-octet string field widths from the 3.4 PDU definitions, null terminator
// included.
pub(crate) const SYSTEM_ID_FIELD: usize = 16;
pub(crate) const PASSWORD_FIELD: usize = 9;
pub(crate) const SYSTEM_TYPE_FIELD: usize = 13;
pub(crate) const ADDRESS_RANGE_FIELD: usize = 41;
pub(crate) const SERVICE_TYPE_FIELD: usize = 6;
pub(crate) const ADDR_FIELD: usize = 21;
pub(crate) const TIME_FIELD: usize = 17;
pub(crate) const MESSAGE_ID_FIELD: usize = 65;
