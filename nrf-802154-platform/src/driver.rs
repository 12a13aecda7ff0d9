//! The contract between this layer and the vendor 802.15.4 radio driver.
//!
//! Commands go down through [`RadioDriver`]. Everything the driver reports back, usually from
//! interrupt context, comes up as a [`DriverEvent`] passed to
//! [`Radio::on_driver_event`](crate::Radio::on_driver_event).

use bitflags::bitflags;

use crate::error::{CcaDriverError, EdDriverError, RxDriverError, SecurityError, SleepError, TxDriverError};
use crate::frame::Psdu;

bitflags! {
    /// Optional features implemented by the driver.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DriverCapabilities: u32 {
        /// CSMA-CA is performed by the driver.
        const CSMA = 1 << 0;
        /// Transmissions can be scheduled at an absolute time.
        const DELAYED_TX = 1 << 1;
        /// Reception windows can be scheduled at an absolute time.
        const DELAYED_RX = 1 << 2;
        /// The driver waits for ACKs with a timeout.
        const ACK_TIMEOUT = 1 << 3;
        /// Frames are timestamped.
        const TIMESTAMP = 1 << 6;
        /// Frame security is processed by the driver.
        const SECURITY = 1 << 7;
    }
}

/// A short or extended address in over-the-air (little-endian) byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Address {
    /// 16-bit short address.
    Short([u8; 2]),
    /// 64-bit extended address.
    Extended([u8; 8]),
}

/// Method used to decide the frame-pending bit of outgoing ACKs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SrcMatchMethod {
    /// Thread rules: the bit is set for addresses in the pending list.
    Thread,
    /// Zigbee rules.
    Zigbee,
    /// Standard-compliant rules.
    Standard,
}

/// Frame state carried along with a transmission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameProps {
    /// Security processing has been applied to the frame.
    pub is_secured: bool,
    /// Dynamic header fields (frame counter, CSL IE) have been written.
    pub dynamic_data_is_set: bool,
}

/// Metadata of an immediate transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransmitMetadata {
    /// Security state of the frame.
    pub frame_props: FrameProps,
    /// Run a single CCA before transmitting.
    pub cca: bool,
    /// Transmit power in dBm.
    pub tx_power: i8,
}

/// Metadata of a CSMA-CA transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CsmaCaMetadata {
    /// Security state of the frame.
    pub frame_props: FrameProps,
    /// Transmit power in dBm.
    pub tx_power: i8,
}

/// Metadata of a transmission scheduled at an absolute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransmitAtMetadata {
    /// Security state of the frame.
    pub frame_props: FrameProps,
    /// Run CCA before transmitting.
    pub cca: bool,
    /// Channel to transmit on.
    pub channel: u8,
    /// Transmit power in dBm.
    pub tx_power: i8,
    /// Additional CCA attempts performed if the first one finds the channel busy.
    pub extra_cca_attempts: u8,
}

/// A security key handed to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SecurityKey {
    /// Cleartext key material.
    pub value: [u8; 16],
    /// Key identifier mode.
    pub id_mode: u8,
    /// Key index.
    pub id: u8,
}

/// The ACK received for a transmitted frame.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceivedAck<B> {
    /// The ACK, PHR first. Returned to the driver with [`RadioDriver::buffer_free`].
    pub psdu: B,
    /// Received signal strength in dBm.
    pub power: i8,
    /// Link quality indicator.
    pub lqi: u8,
    /// Timestamp of the end of the ACK, or [`NO_TIMESTAMP`].
    pub time: u64,
}

/// Timestamp value the driver uses when a frame could not be timestamped.
pub const NO_TIMESTAMP: u64 = 0;

/// A callback raised by the driver.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverEvent<'a, B> {
    /// A frame was received. `psdu` starts with the PHR.
    Received {
        /// Driver-owned frame buffer.
        psdu: B,
        /// Received signal strength in dBm.
        power: i8,
        /// Link quality indicator.
        lqi: u8,
        /// Timestamp of the end of the frame.
        time: u64,
    },
    /// A reception failed.
    ReceiveFailed {
        /// Failure reason.
        error: RxDriverError,
        /// Identifier of the delayed reception window, if any.
        id: u32,
    },
    /// The driver started transmitting an ACK. `ack` starts with the PHR.
    TxAckStarted {
        /// The outgoing ACK.
        ack: &'a [u8],
    },
    /// A frame was transmitted.
    Transmitted {
        /// The frame, as last modified by the driver.
        psdu: Psdu,
        /// Security state after transmission.
        props: FrameProps,
        /// The ACK, if one was requested and received.
        ack: Option<ReceivedAck<B>>,
    },
    /// A transmission failed.
    TransmitFailed {
        /// The frame, as last modified by the driver.
        psdu: Psdu,
        /// Failure reason.
        error: TxDriverError,
        /// Security state after the attempt.
        props: FrameProps,
    },
    /// A stand-alone CCA finished.
    CcaDone {
        /// The channel was found idle.
        channel_free: bool,
    },
    /// A stand-alone CCA failed.
    CcaFailed {
        /// Failure reason.
        error: CcaDriverError,
    },
    /// An energy detection finished.
    EnergyDetected {
        /// Maximum energy seen, in dBm.
        ed_dbm: i8,
    },
    /// An energy detection failed.
    EnergyDetectionFailed {
        /// Failure reason.
        error: EdDriverError,
    },
}

/// Commands accepted by the vendor radio driver.
///
/// Methods returning `bool` report whether the driver accepted the request. Accepted
/// transmissions, CCAs and energy detections are always completed by exactly one
/// [`DriverEvent`].
pub trait RadioDriver {
    /// Driver-owned receive buffer, PHR first.
    type Buffer: AsRef<[u8]>;

    /// Optional features of this driver.
    fn capabilities(&self) -> DriverCapabilities;
    /// Factory-programmed device identifier used to derive the EUI-64.
    fn device_id(&self) -> u64;
    /// Current driver time in microseconds.
    fn time_get(&self) -> u64;

    /// Set the channel (11..=26).
    fn channel_set(&self, channel: u8);
    /// Current channel.
    fn channel_get(&self) -> u8;
    /// Set the transmit power in dBm.
    fn tx_power_set(&self, power: i8);
    /// Current transmit power in dBm.
    fn tx_power_get(&self) -> i8;

    /// Enter receive mode.
    fn receive(&self) -> bool;
    /// Schedule a reception window.
    fn receive_at(&self, start_us: u64, duration_us: u32, channel: u8, id: u32) -> bool;
    /// Enter sleep unconditionally.
    fn sleep(&self) -> bool;
    /// Enter sleep unless an operation (e.g. a delayed reception window) is ongoing.
    fn sleep_if_idle(&self) -> Result<(), SleepError>;

    /// Transmit immediately. On rejection the PSDU is handed back.
    fn transmit_raw(&self, psdu: Psdu, metadata: &TransmitMetadata) -> Result<(), Psdu>;
    /// Transmit with CSMA-CA. On rejection the PSDU is handed back.
    fn transmit_csma_ca_raw(&self, psdu: Psdu, metadata: &CsmaCaMetadata) -> Result<(), Psdu>;
    /// Transmit at `time_us` (start of SHR). On rejection the PSDU is handed back.
    fn transmit_raw_at(&self, psdu: Psdu, time_us: u64, metadata: &TransmitAtMetadata) -> Result<(), Psdu>;
    /// Start a stand-alone CCA.
    fn cca(&self) -> bool;
    /// Start an energy detection lasting `time_us`.
    fn energy_detection(&self, time_us: u32) -> bool;
    /// Return a buffer received in a [`DriverEvent`].
    fn buffer_free(&self, buffer: Self::Buffer);

    /// Start a continuous carrier.
    fn continuous_carrier(&self) -> bool;
    /// Start a modulated carrier repeating `data`.
    fn modulated_carrier(&self, data: &[u8]) -> bool;

    /// Set the PAN identifier (little-endian).
    fn pan_id_set(&self, pan_id: [u8; 2]);
    /// Set the short address (little-endian).
    fn short_address_set(&self, address: [u8; 2]);
    /// Set the extended address (little-endian).
    fn extended_address_set(&self, address: [u8; 8]);
    /// Enable or disable promiscuous mode.
    fn promiscuous_set(&self, enabled: bool);
    /// Keep the receiver on between operations.
    fn rx_on_when_idle_set(&self, enabled: bool);

    /// Select how the frame-pending bit is computed.
    fn src_addr_matching_method_set(&self, method: SrcMatchMethod);
    /// Enable automatic frame-pending bit handling.
    fn auto_pending_bit_set(&self, enabled: bool);
    /// Add an address to the pending list. Returns `false` when the list is full.
    fn pending_bit_for_addr_set(&self, address: &Address) -> bool;
    /// Remove an address from the pending list. Returns `false` when it was absent.
    fn pending_bit_for_addr_clear(&self, address: &Address) -> bool;
    /// Remove all short or extended addresses from the pending list.
    fn pending_bit_for_addr_reset(&self, extended: bool);

    /// Install information elements injected into ACKs sent to `address`.
    fn ack_data_set(&self, address: &Address, ie: &[u8]) -> bool;
    /// Remove ACK information elements for `address`.
    fn ack_data_clear(&self, address: &Address) -> bool;
    /// Remove all ACK information elements for short or extended addresses.
    fn ack_data_remove_all(&self, extended: bool);

    /// Set the CSL period written into outgoing CSL IEs, in units of 10 symbols.
    fn csl_writer_period_set(&self, period: u16);
    /// Set the CSL anchor time, start of MAC header, microseconds.
    fn csl_writer_anchor_time_set(&self, anchor_time_us: u64);

    /// Store a security key.
    fn security_key_store(&self, key: &SecurityKey) -> Result<(), SecurityError>;
    /// Remove all stored security keys.
    fn security_key_remove_all(&self);
    /// Set the global MAC frame counter.
    fn security_global_frame_counter_set(&self, counter: u32);
    /// Set the global MAC frame counter if `counter` is larger than the current one.
    fn security_global_frame_counter_set_if_larger(&self, counter: u32);
}
