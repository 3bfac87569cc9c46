use core::convert::Infallible;

use derive_more::derive::{Display, Error};

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Define a unified error type for this crate.
///
/// The `Display` text of the validation variants doubles as the reply line sent back to a
/// client, so keep them short and human readable.
#[expect(missing_docs, reason = "The variants are self-explanatory.")]
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // ----- command validation ------------------------------------------------
    #[display("Wrong number of arguments, expected {expected}")]
    ArgumentCount { expected: u8 },

    #[display("Arguments must be whole numbers")]
    NotANumber,

    #[display("Color values must be between 0 and 255 inclusive")]
    ChannelOutOfRange,

    #[display("Alarm duration needs to be greater than 0")]
    DurationNotPositive,

    #[display("Invalid mode name")]
    UnknownMode,

    #[display("First argument was not a 3-letter day, \"weekday\" or \"weekend\"")]
    InvalidDay,

    #[display("Invalid time, use HH:MM with hour 0-23 and minute 0-59")]
    InvalidTime,

    #[display("Macro needs an intensity from 0 to 255")]
    MissingIntensity,

    // ----- collaborator faults -----------------------------------------------
    #[display("LED strip write failed")]
    Strip,

    #[display("Temperature/humidity sensor read failed")]
    Sensor,

    #[display("Temperature/humidity log append failed")]
    SensorLog,

    #[display("Alarm store I/O failed")]
    Store,

    #[display("Alarm table encoding failed")]
    Codec,

    #[display("Alarm table storage is corrupted")]
    CorruptAlarmTable,

    #[display("Supervisor request failed")]
    Supervisor,

    // ----- internal ----------------------------------------------------------
    #[display("Buffer capacity exceeded")]
    CapacityExceeded,

    #[display("Index out of bounds")]
    IndexOutOfBounds,
}

impl From<Infallible> for Error {
    fn from(_: Infallible) -> Self {
        Self::IndexOutOfBounds
    }
}

// `heapless` reports a full buffer as `()`.
impl From<()> for Error {
    fn from((): ()) -> Self {
        Self::CapacityExceeded
    }
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Self::CapacityExceeded
    }
}

impl From<postcard::Error> for Error {
    fn from(_: postcard::Error) -> Self {
        Self::Codec
    }
}

impl From<time::error::ComponentRange> for Error {
    fn from(_: time::error::ComponentRange) -> Self {
        Self::InvalidTime
    }
}
