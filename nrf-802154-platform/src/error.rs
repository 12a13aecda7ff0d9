//! Error types for the radio platform layer.
//!
//! Three layers of errors meet here: the synchronous [`Error`] returned by the upper-layer API,
//! the closed result sets the MAC layer understands ([`TxError`], [`RxError`]), and the raw
//! error codes reported by the radio driver in its callbacks.

/// Error returned synchronously by the upper-layer API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The operation is not allowed in the current [`RadioState`](crate::RadioState).
    InvalidState,
    /// The driver refused to start the operation, or a transmission is already outstanding.
    Busy,
    /// An operation of the same kind is still outstanding.
    AlreadyInProgress,
    /// An argument is out of range.
    InvalidArgs,
    /// The driver has no room left for the requested entry.
    NoBufs,
    /// The requested address entry does not exist.
    NoAddress,
    /// The operation is not supported by this radio.
    NotSupported,
    /// The driver reported a generic failure.
    Failed,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::InvalidState => "operation invalid in current radio state",
            Error::Busy => "radio busy",
            Error::AlreadyInProgress => "operation already in progress",
            Error::InvalidArgs => "invalid arguments",
            Error::NoBufs => "no buffer space available",
            Error::NoAddress => "address not found",
            Error::NotSupported => "operation not supported",
            Error::Failed => "operation failed",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for Error {}

/// Transmission failure reported to the upper layer.
///
/// The MAC layer only accepts this closed set; every driver error is normalised into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxError {
    /// An ACK was requested but none (or none usable) arrived.
    NoAck,
    /// CCA or CSMA-CA found the channel busy, or the transmission failed for an unmapped reason.
    ChannelAccessFailure,
    /// The transmission was aborted or could not be started.
    Abort,
}

/// Reception failure reported to the upper layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxError {
    /// Nothing usable was received, e.g. a malformed frame or a closed receive window.
    NoFrameReceived,
    /// The frame check sequence did not match.
    Fcs,
    /// The frame was dropped by address filtering or the reception was aborted.
    DestinationAddressFiltered,
    /// The driver had no free receive buffer.
    NoBufs,
    /// Any other driver failure.
    Failed,
}

/// Transmit error codes reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxDriverError {
    /// No buffer was available for the received ACK.
    NoMem,
    /// CCA reported a busy channel.
    BusyChannel,
    /// A frame other than the expected ACK arrived.
    InvalidAck,
    /// The ACK timeout expired.
    NoAck,
    /// The procedure was aborted.
    Aborted,
    /// The radio timeslot was denied.
    TimeslotDenied,
    /// The radio timeslot ended before the frame went out.
    TimeslotEnded,
    /// A code this layer does not know about.
    Other(u8),
}

impl From<TxDriverError> for TxError {
    fn from(err: TxDriverError) -> Self {
        match err {
            TxDriverError::InvalidAck | TxDriverError::NoAck => TxError::NoAck,
            TxDriverError::Aborted
            | TxDriverError::TimeslotDenied
            | TxDriverError::TimeslotEnded
            | TxDriverError::Other(_) => TxError::Abort,
            TxDriverError::NoMem | TxDriverError::BusyChannel => TxError::ChannelAccessFailure,
        }
    }
}

/// Receive error codes reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxDriverError {
    /// The received frame could not be parsed.
    InvalidFrame,
    /// The frame check sequence did not match.
    InvalidFcs,
    /// The destination address did not match.
    InvalidDestAddr,
    /// The reception was aborted.
    Aborted,
    /// The delayed reception window closed without a frame.
    DelayedTimeout,
    /// The delayed reception was aborted.
    DelayedAborted,
    /// The driver ran out of receive buffers.
    NoBuffer,
    /// A code this layer does not know about.
    Other(u8),
}

impl From<RxDriverError> for RxError {
    fn from(err: RxDriverError) -> Self {
        match err {
            RxDriverError::InvalidFrame | RxDriverError::DelayedTimeout => RxError::NoFrameReceived,
            RxDriverError::InvalidFcs => RxError::Fcs,
            RxDriverError::InvalidDestAddr | RxDriverError::Aborted | RxDriverError::DelayedAborted => {
                RxError::DestinationAddressFiltered
            }
            RxDriverError::NoBuffer => RxError::NoBufs,
            RxDriverError::Other(_) => RxError::Failed,
        }
    }
}

/// Error reported by a failed stand-alone CCA procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CcaDriverError {
    /// The procedure was aborted.
    Aborted,
    /// A code this layer does not know about.
    Other(u8),
}

/// Error reported by a failed energy detection procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdDriverError {
    /// The procedure was aborted.
    Aborted,
    /// A code this layer does not know about.
    Other(u8),
}

/// Error returned by [`RadioDriver::sleep_if_idle`](crate::RadioDriver::sleep_if_idle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepError {
    /// The radio is busy, e.g. a delayed reception window is open.
    Busy,
}

/// Error returned when storing a security key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecurityError {
    /// The key storage is full.
    StorageFull,
    /// The same key is already stored.
    AlreadyPresent,
    /// A code this layer does not know about.
    Other(u8),
}
