use heapless::Vec;

/// Maximum PSDU length in bytes, FCS included.
pub const MAX_PSDU_LEN: usize = 127;

/// Upper bound of an ACK frame accepted from the driver.
pub const ACK_BUFFER_LEN: usize = MAX_PSDU_LEN;

/// An IEEE 802.15.4 PHY packet as handed to the driver for transmission.
///
/// It's made up of the physical header (PHR) followed by the PSDU. The PHR holds the PSDU length,
/// FCS included. The FCS bytes are computed by the hardware, the bytes stored here are
/// placeholders.
///
/// A `Psdu` is moved into the driver when a transmission is issued and moved back with the
/// completion event. The driver may rewrite it in place (security processing, frame counters).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Psdu {
    buffer: [u8; Self::SIZE],
}

impl Psdu {
    const PHY_HDR: usize = 0;
    const DATA: core::ops::RangeFrom<usize> = 1..;

    /// Total buffer size, PHR included.
    pub const SIZE: usize = 1 + MAX_PSDU_LEN;

    /// Create an empty PSDU (length = 0).
    pub const fn new() -> Self {
        Self {
            buffer: [0; Self::SIZE],
        }
    }

    /// Fill the PSDU with `src`, returning `None` if it is larger than [`MAX_PSDU_LEN`].
    pub fn from_slice(src: &[u8]) -> Option<Self> {
        if src.len() > MAX_PSDU_LEN {
            return None;
        }
        let mut psdu = Self::new();
        psdu.buffer[Self::DATA][..src.len()].copy_from_slice(src);
        psdu.buffer[Self::PHY_HDR] = src.len() as u8;
        Some(psdu)
    }

    /// Return the PSDU length, FCS included.
    pub const fn len(&self) -> u8 {
        self.buffer[Self::PHY_HDR]
    }

    /// Return `true` if the PSDU is empty.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw buffer, PHR first.
    pub fn as_raw(&self) -> &[u8; Self::SIZE] {
        &self.buffer
    }

    /// Mutable access to the raw buffer, PHR first.
    pub fn as_raw_mut(&mut self) -> &mut [u8; Self::SIZE] {
        &mut self.buffer
    }
}

impl Default for Psdu {
    fn default() -> Self {
        Self::new()
    }
}

impl core::ops::Deref for Psdu {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        let len = usize::from(self.len()).min(MAX_PSDU_LEN);
        &self.buffer[Self::DATA][..len]
    }
}

impl core::ops::DerefMut for Psdu {
    fn deref_mut(&mut self) -> &mut [u8] {
        let len = usize::from(self.len()).min(MAX_PSDU_LEN);
        &mut self.buffer[Self::DATA][..len]
    }
}

/// IEEE 802.15.4 extended address, in the byte order used by the MAC layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExtAddress(pub [u8; 8]);

impl ExtAddress {
    /// The address in over-the-air (little-endian) byte order.
    pub fn to_le_bytes(self) -> [u8; 8] {
        let mut le = self.0;
        le.reverse();
        le
    }
}

/// A frame queued for transmission by the upper layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxFrame {
    /// MAC frame bytes, FCS placeholder included.
    pub psdu: Vec<u8, MAX_PSDU_LEN>,
    /// Channel to transmit on.
    pub channel: u8,
    /// Run CSMA-CA before the transmission.
    pub csma_ca_enabled: bool,
    /// Run a single CCA before a direct transmission.
    pub cca_enabled: bool,
    /// Base time of a timed transmission, wrapped microseconds.
    pub tx_delay_base_time: u32,
    /// Delay after `tx_delay_base_time`. Zero requests an immediate transmission.
    pub tx_delay: u32,
    /// Security processing was already applied to `psdu`.
    pub is_security_processed: bool,
    /// Dynamic header fields were already written to `psdu`.
    pub is_header_updated: bool,
}

impl TxFrame {
    /// Create a frame for `channel` carrying `psdu`, or `None` if `psdu` is too long.
    pub fn new(channel: u8, psdu: &[u8]) -> Option<Self> {
        Some(Self {
            psdu: Vec::from_slice(psdu).ok()?,
            channel,
            ..Self::default()
        })
    }

    /// The absolute time a timed transmission targets, wrapped microseconds.
    pub fn tx_time(&self) -> Option<u32> {
        (self.tx_delay != 0).then(|| self.tx_delay_base_time.wrapping_add(self.tx_delay))
    }
}

/// A received frame, borrowed from the driver buffer for the duration of the upper-layer callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxFrame<'a> {
    /// MAC frame bytes, FCS included.
    pub psdu: &'a [u8],
    /// Channel the frame was received on.
    pub channel: u8,
    /// Received signal strength in dBm.
    pub rssi: i8,
    /// Link quality indicator.
    pub lqi: u8,
    /// Timestamp of the end of the PHY header, driver clock microseconds.
    pub timestamp: u64,
    /// The ACK sent for this frame had the frame-pending bit set.
    pub acked_with_frame_pending: bool,
    /// The ACK sent for this frame was a secured enhanced ACK.
    pub acked_with_sec_enh_ack: bool,
}

/// An acknowledgment received for the last transmitted frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AckFrame {
    /// MAC frame bytes of the ACK, FCS included.
    pub psdu: Vec<u8, ACK_BUFFER_LEN>,
    /// Received signal strength in dBm.
    pub rssi: i8,
    /// Link quality indicator.
    pub lqi: u8,
    /// Timestamp of the end of the PHY header, driver clock microseconds.
    pub timestamp: u64,
}
