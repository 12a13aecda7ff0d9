use core::cell::Cell;
use core::sync::atomic::{AtomicBool, AtomicI8, AtomicU8, Ordering};

use bitflags::bitflags;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::{Config, CHANNEL_COUNT, CHANNEL_MAX, CHANNEL_MIN, POWER_INVALID};
use crate::csl::CslScheduler;
use crate::driver::{Address, DriverCapabilities, DriverEvent, RadioDriver, SecurityKey, SrcMatchMethod};
use crate::energy::{EnergyDetector, EnergyScanResult};
use crate::error::{Error, RxDriverError, RxError, SecurityError, SleepError, TxError};
use crate::events::{PendingEvent, PendingEvents};
use crate::frame::{AckFrame, RxFrame, TxFrame};
use crate::rx::RxPool;
use crate::time;
use crate::tx::{TxCompletion, TxPipeline};

/// Identifier of the delayed reception window used for CSL sampling.
const DRX_SLOT_RX: u32 = 0;

const KEY_ID_MODE_0: u8 = 0;
const KEY_ID_MODE_1: u8 = 1;
const KEY_ID_MAX: u8 = 0x80;

/// Operating state of the radio as seen by the upper layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RadioState {
    /// Not initialized for use.
    Disabled = 0,
    /// Powered down.
    Sleep = 1,
    /// Listening on a channel.
    Receive = 2,
    /// A transmission or a carrier test is in progress.
    Transmit = 3,
}

impl RadioState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Sleep,
            2 => Self::Receive,
            3 => Self::Transmit,
            _ => Self::Disabled,
        }
    }
}

bitflags! {
    /// Optional radio features offered to the upper layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RadioCapabilities: u16 {
        /// ACK timeouts are handled by the radio.
        const ACK_TIMEOUT = 1 << 0;
        /// Energy scans are supported.
        const ENERGY_SCAN = 1 << 1;
        /// Retransmissions are handled by the radio.
        const TRANSMIT_RETRIES = 1 << 2;
        /// CSMA-CA backoff is handled by the radio.
        const CSMA_BACKOFF = 1 << 3;
        /// The radio can go straight from sleep to transmit.
        const SLEEP_TO_TX = 1 << 4;
        /// Frame security is applied by the radio.
        const TRANSMIT_SEC = 1 << 5;
        /// Transmissions can be scheduled.
        const TRANSMIT_TIMING = 1 << 6;
        /// Reception windows can be scheduled.
        const RECEIVE_TIMING = 1 << 7;
        /// Rx-on-when-idle can be switched off.
        const RX_ON_WHEN_IDLE = 1 << 8;
    }
}

impl From<DriverCapabilities> for RadioCapabilities {
    fn from(driver: DriverCapabilities) -> Self {
        let mut caps = Self::ENERGY_SCAN | Self::ACK_TIMEOUT | Self::SLEEP_TO_TX | Self::RX_ON_WHEN_IDLE;
        caps.set(Self::CSMA_BACKOFF, driver.contains(DriverCapabilities::CSMA));
        caps.set(Self::TRANSMIT_SEC, driver.contains(DriverCapabilities::SECURITY));
        caps.set(Self::TRANSMIT_TIMING, driver.contains(DriverCapabilities::DELAYED_TX));
        caps.set(Self::RECEIVE_TIMING, driver.contains(DriverCapabilities::DELAYED_RX));
        caps
    }
}

/// Upper-layer notifications delivered from [`Radio::process`].
pub trait RadioEvents {
    /// A frame was received, or a reception failed.
    fn receive_done(&mut self, result: Result<&RxFrame<'_>, RxError>);

    /// The driver started sending `frame`.
    fn tx_started(&mut self, _frame: &TxFrame) {}

    /// A transmission attempt finished. `frame` carries any bytes rewritten by the driver.
    fn tx_done(&mut self, frame: &TxFrame, ack: Option<&AckFrame>, result: Result<(), TxError>);

    /// An energy scan started with [`Radio::energy_scan`] finished.
    fn energy_scan_done(&mut self, result: EnergyScanResult);
}

/// Build the EUI-64 from the vendor OUI and the low 40 bits of the device identifier.
fn eui64(oui: u32, device_id: u64) -> [u8; 8] {
    let oui = oui.to_be_bytes();
    let id = device_id.to_le_bytes();

    let mut eui = [0; 8];
    eui[..3].copy_from_slice(&oui[1..]);
    eui[3..].copy_from_slice(&id[..5]);
    eui
}

/// IEEE 802.15.4 radio platform.
///
/// One instance is shared between the driver's callback context ([`Radio::on_driver_event`]),
/// the transmit worker ([`Radio::run_transmitter`]) and the stack thread (everything else).
pub struct Radio<D: RadioDriver> {
    pub(crate) driver: D,
    pub(crate) config: Config,
    capabilities: RadioCapabilities,
    eui64: [u8; 8],
    state: AtomicU8,
    channel: AtomicU8,
    tx_power: AtomicI8,
    max_tx_power: [AtomicI8; CHANNEL_COUNT],
    promiscuous: AtomicBool,
    rx_on_when_idle: AtomicBool,
    rx_result: Mutex<CriticalSectionRawMutex, Cell<RxError>>,
    pub(crate) events: PendingEvents,
    rx: RxPool<D::Buffer>,
    pub(crate) tx: TxPipeline<D::Buffer>,
    pub(crate) ed: EnergyDetector,
    pub(crate) csl: CslScheduler,
}

impl<D: RadioDriver> Radio<D> {
    /// Create the radio platform on top of `driver`. The radio starts [`RadioState::Disabled`].
    pub fn new(driver: D, config: Config) -> Self {
        let capabilities = RadioCapabilities::from(driver.capabilities());
        let eui64 = eui64(config.vendor_oui, driver.device_id());
        driver.rx_on_when_idle_set(config.rx_on_when_idle);

        Self {
            capabilities,
            eui64,
            state: AtomicU8::new(RadioState::Disabled as u8),
            channel: AtomicU8::new(CHANNEL_MIN),
            tx_power: AtomicI8::new(config.default_tx_power),
            max_tx_power: core::array::from_fn(|_| AtomicI8::new(POWER_INVALID)),
            promiscuous: AtomicBool::new(false),
            rx_on_when_idle: AtomicBool::new(config.rx_on_when_idle),
            rx_result: Mutex::new(Cell::new(RxError::Failed)),
            events: PendingEvents::new(),
            rx: RxPool::new(),
            tx: TxPipeline::new(),
            ed: EnergyDetector::new(),
            csl: CslScheduler::new(),
            driver,
            config,
        }
    }

    /// The underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Current radio state.
    pub fn state(&self) -> RadioState {
        RadioState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: RadioState) {
        trace!("Radio state: {:?}", state);
        self.state.store(state as u8, Ordering::Release);
    }

    /// Returns `true` unless the radio is [`RadioState::Disabled`].
    pub fn is_enabled(&self) -> bool {
        self.state() != RadioState::Disabled
    }

    /// Optional features supported by the radio.
    pub fn capabilities(&self) -> RadioCapabilities {
        self.capabilities
    }

    /// The factory EUI-64.
    pub fn eui64(&self) -> [u8; 8] {
        self.eui64
    }

    /// Receive sensitivity in dBm.
    pub fn receive_sensitivity(&self) -> i8 {
        self.config.rx_sensitivity
    }

    /// Current radio time in microseconds.
    pub fn now(&self) -> u64 {
        self.driver.time_get()
    }

    /// Channel last requested by [`Radio::receive`].
    pub fn channel(&self) -> u8 {
        self.channel.load(Ordering::Acquire)
    }

    /// Disabled/Sleep -> Sleep.
    pub fn enable(&self) -> Result<(), Error> {
        match self.state() {
            RadioState::Disabled | RadioState::Sleep => {
                self.set_state(RadioState::Sleep);
                Ok(())
            }
            _ => Err(Error::InvalidState),
        }
    }

    /// Disabled/Sleep -> Disabled.
    pub fn disable(&self) -> Result<(), Error> {
        match self.state() {
            RadioState::Disabled | RadioState::Sleep => {
                self.set_state(RadioState::Disabled);
                Ok(())
            }
            _ => Err(Error::InvalidState),
        }
    }

    /// Sleep/Receive -> Sleep.
    ///
    /// If the driver is busy with a delayed reception window the state is kept and the request is
    /// retried from [`Radio::process`] until the driver goes idle.
    pub fn sleep(&self) -> Result<(), Error> {
        if !matches!(self.state(), RadioState::Sleep | RadioState::Receive) {
            return Err(Error::InvalidState);
        }

        match self.driver.sleep_if_idle() {
            Ok(()) => {
                debug!("Radio stopped");
                self.set_state(RadioState::Sleep);
            }
            Err(SleepError::Busy) => {
                debug!("Sleep deferred, radio busy");
                self.events.set(PendingEvent::Sleep);
            }
        }

        Ok(())
    }

    /// Start listening on `channel`.
    pub fn receive(&self, channel: u8) -> Result<(), Error> {
        if self.state() == RadioState::Disabled {
            return Err(Error::InvalidState);
        }

        self.set_channel(channel)?;
        self.channel.store(channel, Ordering::Release);
        self.driver.tx_power_set(self.transmit_power_for_channel(channel));
        self.events.reset(PendingEvent::Sleep);

        if !self.driver.receive() {
            error!("Failed to enter receive state");
            return Err(Error::Failed);
        }

        debug!("Radio started (channel: {})", self.driver.channel_get());
        self.set_state(RadioState::Receive);

        Ok(())
    }

    /// Schedule a reception window on `channel` starting at `start` (wrapped microseconds).
    pub fn receive_at(&self, channel: u8, start: u32, duration_us: u32) -> Result<(), Error> {
        if self.state() == RadioState::Disabled {
            return Err(Error::InvalidState);
        }
        if !(CHANNEL_MIN..=CHANNEL_MAX).contains(&channel) {
            return Err(Error::InvalidArgs);
        }

        let start_us = time::reconcile_us(start, self.driver.time_get());
        if self.driver.receive_at(start_us, duration_us, channel, DRX_SLOT_RX) {
            Ok(())
        } else {
            Err(Error::Failed)
        }
    }

    /// Queue `frame` for transmission.
    ///
    /// The outcome is reported through [`RadioEvents::tx_done`]. Only one frame may be in flight.
    pub fn transmit(&self, frame: &TxFrame) -> Result<(), Error> {
        if !matches!(self.state(), RadioState::Receive | RadioState::Sleep) {
            return Err(Error::InvalidState);
        }

        self.tx.submit(frame)?;
        self.set_state(RadioState::Transmit);
        self.events.set(PendingEvent::FrameToSend);

        Ok(())
    }

    pub(crate) fn set_channel(&self, channel: u8) -> Result<(), Error> {
        if channel < CHANNEL_MIN {
            return Err(Error::NotSupported);
        }
        if channel > CHANNEL_MAX {
            return Err(Error::InvalidArgs);
        }

        trace!("Channel: {}", channel);
        self.driver.channel_set(channel);
        Ok(())
    }

    /// Set the PAN identifier.
    pub fn set_pan_id(&self, pan_id: u16) {
        debug!("PanId: 0x{:x}", pan_id);
        self.driver.pan_id_set(pan_id.to_le_bytes());
    }

    /// Set the extended address, little-endian.
    pub fn set_extended_address(&self, address: [u8; 8]) {
        self.driver.extended_address_set(address);
    }

    /// Set the short address.
    pub fn set_short_address(&self, address: u16) {
        debug!("Short address: 0x{:x}", address);
        self.driver.short_address_set(address.to_le_bytes());
    }

    /// Configured transmit power in dBm.
    pub fn transmit_power(&self) -> i8 {
        self.tx_power.load(Ordering::Acquire)
    }

    /// Set the transmit power, applied on the next reception or transmission.
    pub fn set_transmit_power(&self, power: i8) {
        self.tx_power.store(power, Ordering::Release);
    }

    /// Cap the transmit power used on `channel`.
    pub fn set_channel_max_transmit_power(&self, channel: u8, max_power: i8) -> Result<(), Error> {
        let slot = channel
            .checked_sub(CHANNEL_MIN)
            .and_then(|index| self.max_tx_power.get(usize::from(index)))
            .ok_or(Error::InvalidArgs)?;
        slot.store(max_power, Ordering::Release);

        if channel == self.channel() {
            self.driver.tx_power_set(self.transmit_power_for_channel(channel));
        }

        Ok(())
    }

    pub(crate) fn transmit_power_for_channel(&self, channel: u8) -> i8 {
        let cap = channel
            .checked_sub(CHANNEL_MIN)
            .and_then(|index| self.max_tx_power.get(usize::from(index)))
            .map_or(POWER_INVALID, |cap| cap.load(Ordering::Acquire));
        let power = self.transmit_power();

        if power != POWER_INVALID {
            power.min(cap)
        } else if cap != POWER_INVALID {
            cap
        } else {
            0
        }
    }

    /// Not supported by this radio.
    pub fn cca_energy_detect_threshold(&self) -> Result<i8, Error> {
        Err(Error::NotSupported)
    }

    /// Not supported by this radio.
    pub fn set_cca_energy_detect_threshold(&self, _threshold: i8) -> Result<(), Error> {
        Err(Error::NotSupported)
    }

    /// Returns `true` if promiscuous mode is on.
    pub fn promiscuous(&self) -> bool {
        self.promiscuous.load(Ordering::Acquire)
    }

    /// Receive every frame regardless of its destination.
    pub fn set_promiscuous(&self, enabled: bool) {
        debug!("Promiscuous mode: {}", enabled);
        self.promiscuous.store(enabled, Ordering::Release);
        self.driver.promiscuous_set(enabled);
    }

    /// Keep the receiver on between operations. Disabling it lets an idle radio sleep right away.
    pub fn set_rx_on_when_idle(&self, enabled: bool) {
        debug!("RxOnWhenIdle: {}", enabled);
        self.rx_on_when_idle.store(enabled, Ordering::Release);
        self.driver.rx_on_when_idle_set(enabled);

        if !enabled {
            let _ = self.driver.sleep_if_idle();
        }
    }

    /// Enable automatic frame-pending bits in outgoing ACKs.
    pub fn enable_src_match(&self, enabled: bool) {
        if enabled {
            self.driver.src_addr_matching_method_set(SrcMatchMethod::Thread);
        }
        self.driver.auto_pending_bit_set(enabled);
    }

    /// Set the frame-pending bit for ACKs sent to `address`.
    pub fn add_src_match_short_entry(&self, address: u16) -> Result<(), Error> {
        self.pending_bit_set(&Address::Short(address.to_le_bytes()))
    }

    /// Set the frame-pending bit for ACKs sent to `address` (little-endian).
    pub fn add_src_match_ext_entry(&self, address: [u8; 8]) -> Result<(), Error> {
        self.pending_bit_set(&Address::Extended(address))
    }

    /// Remove `address` from the pending list.
    pub fn clear_src_match_short_entry(&self, address: u16) -> Result<(), Error> {
        self.pending_bit_clear(&Address::Short(address.to_le_bytes()))
    }

    /// Remove `address` (little-endian) from the pending list.
    pub fn clear_src_match_ext_entry(&self, address: [u8; 8]) -> Result<(), Error> {
        self.pending_bit_clear(&Address::Extended(address))
    }

    /// Remove every short address from the pending list.
    pub fn clear_src_match_short_entries(&self) {
        self.driver.pending_bit_for_addr_reset(false);
    }

    /// Remove every extended address from the pending list.
    pub fn clear_src_match_ext_entries(&self) {
        self.driver.pending_bit_for_addr_reset(true);
    }

    fn pending_bit_set(&self, address: &Address) -> Result<(), Error> {
        if self.driver.pending_bit_for_addr_set(address) {
            Ok(())
        } else {
            Err(Error::NoBufs)
        }
    }

    fn pending_bit_clear(&self, address: &Address) -> Result<(), Error> {
        if self.driver.pending_bit_for_addr_clear(address) {
            Ok(())
        } else {
            Err(Error::NoAddress)
        }
    }

    /// Install MAC keys.
    ///
    /// With key id mode 1 the previous, current and next keys are stored under `key_id - 1`,
    /// `key_id` and `key_id + 1` (wrapping within 1..=0x80). Mode 0 with key id 0 removes every
    /// key. `key_id_mode` is the value of the auxiliary security header field (mode << 3).
    pub fn set_mac_key(
        &self,
        key_id_mode: u8,
        key_id: u8,
        prev_key: &[u8; 16],
        curr_key: &[u8; 16],
        next_key: &[u8; 16],
    ) -> Result<(), Error> {
        let mode = key_id_mode >> 3;

        match mode {
            KEY_ID_MODE_0 if key_id == 0 => {
                self.driver.security_key_remove_all();
                Ok(())
            }
            KEY_ID_MODE_1 if (1..=KEY_ID_MAX).contains(&key_id) => {
                let prev_id = if key_id == 1 { KEY_ID_MAX } else { key_id - 1 };
                let next_id = if key_id == KEY_ID_MAX { 1 } else { key_id + 1 };

                self.driver.security_key_remove_all();
                self.store_key(prev_key, mode, prev_id)?;
                self.store_key(curr_key, mode, key_id)?;
                self.store_key(next_key, mode, next_id)
            }
            _ => Err(Error::InvalidArgs),
        }
    }

    fn store_key(&self, value: &[u8; 16], id_mode: u8, id: u8) -> Result<(), Error> {
        let key = SecurityKey {
            value: *value,
            id_mode,
            id,
        };

        match self.driver.security_key_store(&key) {
            Ok(()) | Err(SecurityError::AlreadyPresent) => Ok(()),
            Err(err) => {
                error!("Failed to store key {}: {:?}", id, err);
                Err(Error::Failed)
            }
        }
    }

    /// Set the MAC frame counter.
    pub fn set_mac_frame_counter(&self, counter: u32) {
        self.driver.security_global_frame_counter_set(counter);
    }

    /// Set the MAC frame counter unless the current one is larger.
    pub fn set_mac_frame_counter_if_larger(&self, counter: u32) {
        self.driver.security_global_frame_counter_set_if_larger(counter);
    }

    /// Start or stop a continuous carrier on the current channel.
    pub fn transmit_carrier(&self, enable: bool) -> Result<(), Error> {
        self.carrier(enable, || self.driver.continuous_carrier())
    }

    /// Start or stop a carrier modulated with `data`.
    pub fn transmit_modulated_carrier(&self, enable: bool, data: Option<&[u8]>) -> Result<(), Error> {
        if enable && self.state() == RadioState::Receive && data.is_none() {
            return Err(Error::InvalidArgs);
        }
        self.carrier(enable, || self.driver.modulated_carrier(data.unwrap_or_default()))
    }

    fn carrier(&self, enable: bool, start: impl FnOnce() -> bool) -> Result<(), Error> {
        match (enable, self.state()) {
            (true, RadioState::Receive) => {
                self.driver.tx_power_set(self.transmit_power_for_channel(self.channel()));
                if !start() {
                    error!("Failed to start carrier");
                    return Err(Error::Failed);
                }

                debug!("Carrier started (channel: {})", self.driver.channel_get());
                self.set_state(RadioState::Transmit);
                Ok(())
            }
            (false, RadioState::Transmit) => self.receive(self.channel()),
            _ => Err(Error::InvalidState),
        }
    }

    /// Feed a driver callback into the radio. Never blocks.
    ///
    /// # Panics
    ///
    /// Panics if more frames are received than there are receive descriptors.
    pub fn on_driver_event(&self, event: DriverEvent<'_, D::Buffer>) {
        match event {
            DriverEvent::Received { psdu, power, lqi, time } => {
                self.rx.on_received(psdu, power, lqi, time);
                self.events.set(PendingEvent::FrameReceived);
            }
            DriverEvent::ReceiveFailed { error, id } => self.on_receive_failed(error, id),
            DriverEvent::TxAckStarted { ack } => self.rx.on_ack_started(ack),
            DriverEvent::Transmitted { psdu, props, ack } => self.tx.on_completion(TxCompletion {
                psdu,
                props,
                result: Ok(ack),
            }),
            DriverEvent::TransmitFailed { psdu, error, props } => self.tx.on_completion(TxCompletion {
                psdu,
                props,
                result: Err(error),
            }),
            DriverEvent::CcaDone { channel_free } => self.tx.on_cca(channel_free),
            DriverEvent::CcaFailed { error } => {
                debug!("CCA failed: {:?}", error);
                self.tx.on_cca(false);
            }
            DriverEvent::EnergyDetected { ed_dbm } => self.ed.on_result(Some(ed_dbm), &self.events),
            DriverEvent::EnergyDetectionFailed { error } => {
                debug!("Energy detection failed: {:?}", error);
                self.ed.on_result(None, &self.events);
            }
        }
    }

    fn on_receive_failed(&self, error: RxDriverError, id: u32) {
        if id == DRX_SLOT_RX && error == RxDriverError::DelayedTimeout {
            if !self.rx_on_when_idle.load(Ordering::Acquire) {
                // Nothing to do: the driver already went to sleep.
                return;
            }
            self.events.set(PendingEvent::Sleep);
        }

        if self.config.log_rx_failures {
            info!("Rx failed, error = {:?}", error);
        }

        self.rx.clear_ack_flags();

        if self.state() == RadioState::Receive {
            self.rx_result.lock(|result| result.set(error.into()));
            self.events.set(PendingEvent::RxFailed);
        }
    }

    /// Wait until [`Radio::process`] has something to do.
    pub async fn wait_pending(&self) {
        self.events.wait().await
    }

    /// Drain pending events, reporting them to `handler`.
    ///
    /// Call this from the stack thread whenever [`Radio::wait_pending`] returns.
    pub fn process(&self, handler: &mut impl RadioEvents) {
        if self.events.take(PendingEvent::FrameReceived) {
            while let Some(frame) = self.rx.pop() {
                let buf = frame.psdu.as_ref();
                let len = usize::from(buf.first().copied().unwrap_or(0));
                let rx_frame = RxFrame {
                    psdu: buf.get(1..=len).unwrap_or_default(),
                    channel: self.driver.channel_get(),
                    rssi: frame.rssi,
                    lqi: frame.lqi,
                    timestamp: frame.time,
                    acked_with_frame_pending: frame.ack_fpb,
                    acked_with_sec_enh_ack: frame.ack_seb,
                };

                handler.receive_done(Ok(&rx_frame));
                self.driver.buffer_free(frame.psdu);
            }
        }

        if self.events.take(PendingEvent::RxFailed) {
            handler.receive_done(Err(self.rx_result.lock(Cell::get)));
        }

        if self.events.take(PendingEvent::FrameToSend) {
            self.tx.wake_worker();
        }

        if self.events.take(PendingEvent::TxStarted) && self.tx.mark_started() {
            handler.tx_started(&self.tx.frame());
        }

        if self.events.take(PendingEvent::TxDone) {
            if self.state() == RadioState::Transmit {
                self.set_state(RadioState::Receive);
            }

            if self.tx.mark_started() {
                handler.tx_started(&self.tx.frame());
            }
            let (frame, ack, result) = self.tx.finish();
            handler.tx_done(&frame, ack.as_ref(), result);
        }

        if self.events.take(PendingEvent::Sleep) {
            let _ = self.sleep();
        }

        if self.state() != RadioState::Transmit {
            // Report a finished scan before a deferred one replaces the active request.
            if self.events.take(PendingEvent::DetectEnergyDone) {
                handler.energy_scan_done(self.ed.take_result());
            }

            if self.events.is_set(PendingEvent::DetectEnergy) {
                match self.start_energy_scan() {
                    Ok(()) => self.events.reset(PendingEvent::DetectEnergy),
                    // Retried on the next call.
                    Err(_) => self.events.signal(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eui64_is_oui_then_device_id() {
        assert_eq!(
            eui64(0xF4CE36, 0x1122_3344_5566_7788),
            [0xF4, 0xCE, 0x36, 0x88, 0x77, 0x66, 0x55, 0x44]
        );
    }

    #[test]
    fn capabilities_follow_driver() {
        let base = RadioCapabilities::ENERGY_SCAN
            | RadioCapabilities::ACK_TIMEOUT
            | RadioCapabilities::SLEEP_TO_TX
            | RadioCapabilities::RX_ON_WHEN_IDLE;
        assert_eq!(RadioCapabilities::from(DriverCapabilities::empty()), base);
        assert_eq!(
            RadioCapabilities::from(DriverCapabilities::CSMA | DriverCapabilities::DELAYED_TX),
            base | RadioCapabilities::CSMA_BACKOFF | RadioCapabilities::TRANSMIT_TIMING
        );
        assert_eq!(
            RadioCapabilities::from(DriverCapabilities::SECURITY | DriverCapabilities::DELAYED_RX),
            base | RadioCapabilities::TRANSMIT_SEC | RadioCapabilities::RECEIVE_TIMING
        );
    }

    #[test]
    fn state_round_trips_through_u8() {
        for state in [
            RadioState::Disabled,
            RadioState::Sleep,
            RadioState::Receive,
            RadioState::Transmit,
        ] {
            assert_eq!(RadioState::from_u8(state as u8), state);
        }
    }
}
