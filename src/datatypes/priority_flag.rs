use num_enum::TryFromPrimitive;

/// Message priority carried in submit_sm and deliver_sm. Levels 4-255 are
/// reserved by the specification.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PriorityFlag {
    #[default]
    Level0 = 0,
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
}
