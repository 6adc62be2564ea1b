// ABOUTME: SMPP 3.4 command status codes per specification Table 5-2
// ABOUTME: Standard error table only; vendor ranges fail conversion

use num_enum::TryFromPrimitive;

/// SMPP 3.4 command status codes (specification Table 5-2).
///
/// Requests always carry `Ok`; responses carry the result of the operation.
/// This is the standard table only: vendor-specific codes (0x0400-0x04FF)
/// fail conversion, which surfaces as an undecodable PDU that the dispatcher
/// logs and drops.
#[derive(TryFromPrimitive)]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandStatus {
    /// No error (ESME_ROK).
    Ok = 0x0000_0000,
    /// Message length is invalid.
    InvalidMsgLength = 0x0000_0001,
    /// Command length is invalid.
    InvalidCommandLength = 0x0000_0002,
    /// Invalid command id.
    InvalidCommandId = 0x0000_0003,
    /// Incorrect bind status for the given command.
    IncorrectBindStatus = 0x0000_0004,
    /// ESME already in bound state.
    AlreadyBound = 0x0000_0005,
    /// Invalid priority flag.
    InvalidPriorityFlag = 0x0000_0006,
    /// Invalid registered delivery flag.
    InvalidRegisteredDeliveryFlag = 0x0000_0007,
    /// System error on the SMSC.
    SystemError = 0x0000_0008,
    /// Invalid source address.
    InvalidSourceAddress = 0x0000_000A,
    /// Invalid destination address.
    InvalidDestinationAddress = 0x0000_000B,
    /// Message id invalid or unknown.
    InvalidMessageId = 0x0000_000C,
    /// Bind failed.
    BindFailed = 0x0000_000D,
    /// Invalid password.
    InvalidPassword = 0x0000_000E,
    /// Invalid system id.
    InvalidSystemId = 0x0000_000F,
    /// cancel_sm failed.
    CancelSmFailed = 0x0000_0011,
    /// replace_sm failed.
    ReplaceSmFailed = 0x0000_0013,
    /// Message queue full.
    MessageQueueFull = 0x0000_0014,
    /// Invalid service type.
    InvalidServiceType = 0x0000_0015,
    /// Invalid number of destinations.
    InvalidNumberOfDestinations = 0x0000_0033,
    /// Invalid distribution list name.
    InvalidDistributionListName = 0x0000_0034,
    /// Invalid destination flag.
    InvalidDestinationFlag = 0x0000_0040,
    /// Invalid submit-with-replace request.
    InvalidSubmitWithReplace = 0x0000_0042,
    /// Invalid esm_class field data.
    InvalidEsmClass = 0x0000_0043,
    /// Cannot submit to distribution list.
    CannotSubmitToDistributionList = 0x0000_0044,
    /// submit_sm or submit_multi failed.
    SubmitFailed = 0x0000_0045,
    /// Invalid source address TON.
    InvalidSourceTon = 0x0000_0048,
    /// Invalid source address NPI.
    InvalidSourceNpi = 0x0000_0049,
    /// Invalid destination address TON.
    InvalidDestinationTon = 0x0000_0050,
    /// Invalid destination address NPI.
    InvalidDestinationNpi = 0x0000_0051,
    /// Invalid system_type field.
    InvalidSystemType = 0x0000_0053,
    /// Invalid replace_if_present flag.
    InvalidReplaceIfPresentFlag = 0x0000_0054,
    /// Invalid number of messages.
    InvalidNumberOfMessages = 0x0000_0055,
    /// Throttling error: ESME has exceeded its message limits.
    Throttled = 0x0000_0058,
    /// Invalid scheduled delivery time.
    InvalidScheduledDeliveryTime = 0x0000_0061,
    /// Invalid validity period.
    InvalidValidityPeriod = 0x0000_0062,
    /// Predefined message invalid or not found.
    InvalidPredefinedMessage = 0x0000_0063,
    /// ESME receiver temporary app error.
    ReceiverTemporaryError = 0x0000_0064,
    /// ESME receiver permanent app error.
    ReceiverPermanentError = 0x0000_0065,
    /// ESME receiver reject message error.
    ReceiverRejectError = 0x0000_0066,
    /// query_sm request failed.
    QuerySmFailed = 0x0000_0067,
    /// Error in the optional part of the PDU body.
    InvalidOptionalPart = 0x0000_00C0,
    /// Optional parameter not allowed.
    OptionalParameterNotAllowed = 0x0000_00C1,
    /// Invalid parameter length.
    InvalidParameterLength = 0x0000_00C2,
    /// Expected optional parameter missing.
    MissingOptionalParameter = 0x0000_00C3,
    /// Invalid optional parameter value.
    InvalidOptionalParameterValue = 0x0000_00C4,
    /// Delivery failure (used for data_sm_resp).
    DeliveryFailure = 0x0000_00FE,
    /// Unknown error.
    UnknownError = 0x0000_00FF,
}
