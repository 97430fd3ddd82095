use core::fmt;

/// Errors returned by the ring engine and the I2S layer.
///
/// Overflow/underflow is deliberately absent: data faults are recorded on
/// the ring's sticky flag and never returned from a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Slot count below [`MIN_SLOTS`](crate::constants::MIN_SLOTS) or above the ring's capacity.
    InvalidSlotCount,
    /// Words per slot below the minimum or above the ring's capacity.
    InvalidSlotWords,
    /// The first slot handed to the transfer engine is not a valid index.
    FirstSlotOutOfRange,
    /// Bits per sample other than 8, 16, 24 or 32.
    UnsupportedBitDepth,
    /// Pin number outside the usable range.
    PinOutOfRange,
    /// Sample rate of zero, or one the protocol clock divider cannot reach.
    InvalidSampleRate,
    /// Configuration change attempted while the stream is running.
    Running,
    /// No free hardware transfer channel.
    NoFreeChannel,
    /// The protocol engine could not be brought up.
    ProtocolUnavailable,
    /// `begin` called before `init`.
    NotInitialized,
    /// Data operation on a stream that is not running.
    NotRunning,
    /// Read on an output stream, or write on an input stream.
    WrongDirection,
    /// Non-blocking call hit contention. Nothing was transferred.
    WouldBlock,
    /// A bounded wait expired. Nothing was transferred.
    TimedOut,
}

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Invalid parameter or setter called while running. State is unchanged.
    Configuration,
    /// Hardware could not be acquired.
    Resource,
    /// Operation not valid in the current lifecycle state or direction.
    State,
    /// The ring had no room or no data.
    Contention,
}

impl Error {
    /// Which class of failure this is.
    pub const fn kind(self) -> ErrorKind {
        match self {
            Error::InvalidSlotCount
            | Error::InvalidSlotWords
            | Error::FirstSlotOutOfRange
            | Error::UnsupportedBitDepth
            | Error::PinOutOfRange
            | Error::InvalidSampleRate
            | Error::Running => ErrorKind::Configuration,
            Error::NoFreeChannel | Error::ProtocolUnavailable => ErrorKind::Resource,
            Error::NotInitialized | Error::NotRunning | Error::WrongDirection => ErrorKind::State,
            Error::WouldBlock | Error::TimedOut => ErrorKind::Contention,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::InvalidSlotCount => "invalid slot count",
            Error::InvalidSlotWords => "invalid words per slot",
            Error::FirstSlotOutOfRange => "first slot out of range",
            Error::UnsupportedBitDepth => "unsupported bits per sample",
            Error::PinOutOfRange => "pin out of range",
            Error::InvalidSampleRate => "invalid sample rate",
            Error::Running => "stream is running",
            Error::NoFreeChannel => "no free transfer channel",
            Error::ProtocolUnavailable => "protocol engine unavailable",
            Error::NotInitialized => "ring not initialized",
            Error::NotRunning => "stream not running",
            Error::WrongDirection => "wrong stream direction",
            Error::WouldBlock => "operation would block",
            Error::TimedOut => "wait timed out",
        };
        f.write_str(msg)
    }
}
