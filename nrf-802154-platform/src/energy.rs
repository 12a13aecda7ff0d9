//! Energy detection.
//!
//! Two callers share the driver's single energy detector: the upper layer's asynchronous
//! [`Radio::energy_scan`] and the awaitable [`Radio::rssi`]. Whoever claims the detector first
//! receives the next completion.

use core::cell::Cell;
use core::sync::atomic::{AtomicI16, AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use crate::config::{CHANNEL_MAX, CHANNEL_MIN};
use crate::driver::RadioDriver;
use crate::error::Error;
use crate::events::{PendingEvent, PendingEvents};
use crate::radio::Radio;

const RSSI_DETECTION_US: u32 = 1000;
const NO_RESULT: i16 = i16::MAX;

/// Outcome of an energy scan requested with [`Radio::energy_scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnergyScanResult {
    /// Scanned channel.
    pub channel: u8,
    /// Requested scan duration in milliseconds.
    pub duration_ms: u16,
    /// Maximum energy seen in dBm, `None` if the detection failed.
    pub max_rssi: Option<i8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Owner {
    Idle = 0,
    Scan = 1,
    Rssi = 2,
}

pub(crate) struct EnergyDetector {
    owner: AtomicU8,
    request: Mutex<CriticalSectionRawMutex, Cell<(u8, u16)>>,
    // Request being served by the detector, reported with its result.
    active: Mutex<CriticalSectionRawMutex, Cell<(u8, u16)>>,
    scan_result: AtomicI16,
    rssi_done: Signal<CriticalSectionRawMutex, Option<i8>>,
}

impl EnergyDetector {
    pub(crate) const fn new() -> Self {
        Self {
            owner: AtomicU8::new(Owner::Idle as u8),
            request: Mutex::new(Cell::new((CHANNEL_MIN, 0))),
            active: Mutex::new(Cell::new((CHANNEL_MIN, 0))),
            scan_result: AtomicI16::new(NO_RESULT),
            rssi_done: Signal::new(),
        }
    }

    fn claim(&self, owner: Owner) -> Result<(), Error> {
        self.owner
            .compare_exchange(Owner::Idle as u8, owner as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| Error::AlreadyInProgress)
    }

    fn release(&self) {
        self.owner.store(Owner::Idle as u8, Ordering::Release);
    }

    fn request(&self) -> (u8, u16) {
        self.request.lock(Cell::get)
    }

    /// Deliver a detection result to whoever owns the detector.
    pub(crate) fn on_result(&self, max_rssi: Option<i8>, events: &PendingEvents) {
        let owner = self.owner.swap(Owner::Idle as u8, Ordering::AcqRel);
        if owner == Owner::Scan as u8 {
            self.scan_result
                .store(max_rssi.map_or(NO_RESULT, i16::from), Ordering::Release);
            events.set(PendingEvent::DetectEnergyDone);
        } else if owner == Owner::Rssi as u8 {
            self.rssi_done.signal(max_rssi);
        } else {
            warn!("Energy detection result without a requester");
        }
    }

    pub(crate) fn take_result(&self) -> EnergyScanResult {
        let (channel, duration_ms) = self.active.lock(Cell::get);
        let raw = self.scan_result.swap(NO_RESULT, Ordering::AcqRel);
        EnergyScanResult {
            channel,
            duration_ms,
            max_rssi: i8::try_from(raw).ok(),
        }
    }
}

impl<D: RadioDriver> Radio<D> {
    /// Start an energy scan on `channel` lasting `duration_ms`.
    ///
    /// The result is reported through [`RadioEvents::energy_scan_done`](crate::RadioEvents::energy_scan_done).
    /// If the detector is busy the scan is retried from [`Radio::process`] rather than failing.
    pub fn energy_scan(&self, channel: u8, duration_ms: u16) -> Result<(), Error> {
        if !(CHANNEL_MIN..=CHANNEL_MAX).contains(&channel) {
            return Err(Error::InvalidArgs);
        }

        self.ed.request.lock(|request| request.set((channel, duration_ms)));
        self.events.reset(PendingEvent::DetectEnergy);
        self.events.reset(PendingEvent::DetectEnergyDone);

        if let Err(err) = self.start_energy_scan() {
            info!("Energy scan deferred: {:?}", err);
            self.events.set(PendingEvent::DetectEnergy);
        }

        Ok(())
    }

    pub(crate) fn start_energy_scan(&self) -> Result<(), Error> {
        let (channel, duration_ms) = self.ed.request();

        self.ed.claim(Owner::Scan)?;
        self.ed.active.lock(|active| active.set((channel, duration_ms)));
        if let Err(err) = self.set_channel(channel) {
            self.ed.release();
            return Err(err);
        }
        if !self.driver.energy_detection(u32::from(duration_ms) * 1000) {
            self.ed.release();
            return Err(Error::Busy);
        }

        Ok(())
    }

    /// Measure the energy on the current channel and wait for the result, in dBm.
    pub async fn rssi(&self) -> Result<i8, Error> {
        self.ed.rssi_done.reset();
        self.ed.claim(Owner::Rssi)?;

        if !self.driver.energy_detection(RSSI_DETECTION_US) {
            self.ed.release();
            return Err(Error::Busy);
        }

        self.ed.rssi_done.wait().await.ok_or(Error::Failed)
    }
}
