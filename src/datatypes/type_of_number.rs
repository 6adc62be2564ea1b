use num_enum::TryFromPrimitive;

/// Type of Number (TON) for source, destination and bind addresses.
///
/// Combined with [`super::NumericPlanIndicator`] to describe the complete
/// addressing scheme of an address field.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeOfNumber {
    Unknown = 0b0000_0000,
    /// E.164 country code plus national number.
    International = 0b0000_0001,
    National = 0b0000_0010,
    NetworkSpecific = 0b0000_0011,
    SubscriberNumber = 0b0000_0100,
    /// Text-based sender id such as a short code or brand name.
    Alphanumeric = 0b0000_0101,
    Abbreviated = 0b0000_0110,
}
