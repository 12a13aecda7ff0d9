/// Number of receive descriptors shared between the driver callback and the stack thread.
///
/// Must be at least the number of receive buffers the driver owns.
pub const RX_BUFFERS: usize = 16;

/// Lowest 2.4 GHz O-QPSK channel.
pub const CHANNEL_MIN: u8 = 11;
/// Highest 2.4 GHz O-QPSK channel.
pub const CHANNEL_MAX: u8 = 26;
pub(crate) const CHANNEL_COUNT: usize = (CHANNEL_MAX - CHANNEL_MIN + 1) as usize;

/// Transmit power value meaning "not configured".
pub const POWER_INVALID: i8 = 127;

/// Radio platform configuration.
///
/// ```
/// use nrf_802154_platform::Config;
///
/// let config = Config {
///     default_tx_power: 4,
///     log_rx_failures: true,
///     ..Config::default()
/// };
/// # let _ = config;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Transmit power used until the upper layer sets one, in dBm.
    pub default_tx_power: i8,
    /// Receive sensitivity reported to the upper layer, in dBm.
    pub rx_sensitivity: i8,
    /// Accuracy of the sleep clock in ppm, reported for CSL.
    pub csl_accuracy: u8,
    /// CSL scheduling uncertainty in units of 10 microseconds, if known.
    pub csl_uncertainty: Option<u8>,
    /// Vendor OUI placed in front of the device identifier to build the EUI-64.
    pub vendor_oui: u32,
    /// Log every reception failure.
    pub log_rx_failures: bool,
    /// Extra CCA attempts allowed for timed transmissions.
    pub max_extra_cca_attempts: u8,
    /// Keep the receiver on while idle.
    pub rx_on_when_idle: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_tx_power: 0,
            rx_sensitivity: -100,
            csl_accuracy: 20,
            csl_uncertainty: None,
            vendor_oui: 0xF4CE36,
            log_rx_failures: false,
            max_extra_cca_attempts: 0,
            rx_on_when_idle: true,
        }
    }
}
