//! Coordinated sampled listening and enhanced-ACK information elements.

use core::cell::Cell;
use core::sync::atomic::{AtomicU16, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;

use crate::driver::{Address, RadioDriver};
use crate::error::Error;
use crate::frame::ExtAddress;
use crate::radio::Radio;
use crate::time;

const IE_HEADER_SIZE: usize = 2;
const IE_MAX_SIZE: usize = IE_HEADER_SIZE + 6;

const ELEMENT_ID_VENDOR_SPECIFIC: u8 = 0x00;
const ELEMENT_ID_CSL: u8 = 0x1a;

const THREAD_OUI: u32 = 0xEAB89B;
const THREAD_RSSI_TOKEN: u8 = 0x01;
const THREAD_MARGIN_TOKEN: u8 = 0x02;
const THREAD_LQI_TOKEN: u8 = 0x03;

const BROADCAST_ADDRESS: u16 = 0xffff;
const NO_SHORT_ADDRESS: u16 = 0xfffe;

/// An IEEE 802.15.4 header information element.
pub type HeaderIe = Vec<u8, IE_MAX_SIZE>;

/// Link metrics a probing peer asked to have reported in enhanced ACKs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkMetrics {
    /// Report the link quality indicator.
    pub lqi: bool,
    /// Report the link margin.
    pub link_margin: bool,
    /// Report the received signal strength.
    pub rssi: bool,
}

impl LinkMetrics {
    const fn is_empty(&self) -> bool {
        !(self.lqi || self.link_margin || self.rssi)
    }
}

fn header_ie(element_id: u8, content: &[u8]) -> HeaderIe {
    // Header IE descriptor: length (7 bits), element id (8 bits), type 0.
    let descriptor = (content.len() as u16 & 0x7f) | (u16::from(element_id) << 7);

    let mut ie = HeaderIe::new();
    // Sizes are bounded by the callers.
    let _ = ie.extend_from_slice(&descriptor.to_le_bytes());
    let _ = ie.extend_from_slice(content);
    ie
}

/// The reduced CSL IE (phase 0, `period` in units of 10 symbols).
pub fn csl_ie(period: u16) -> HeaderIe {
    let mut content = [0; 4];
    content[2..].copy_from_slice(&period.to_le_bytes());
    header_ie(ELEMENT_ID_CSL, &content)
}

/// The Thread vendor-specific IE announcing the link metrics carried in enhanced ACKs.
pub fn link_metrics_ie(metrics: LinkMetrics) -> HeaderIe {
    let oui = THREAD_OUI.to_le_bytes();
    let token = |enabled: bool, token: u8| if enabled { token } else { 0 };
    header_ie(
        ELEMENT_ID_VENDOR_SPECIFIC,
        &[
            oui[0],
            oui[1],
            oui[2],
            token(metrics.lqi, THREAD_LQI_TOKEN),
            token(metrics.link_margin, THREAD_MARGIN_TOKEN),
            token(metrics.rssi, THREAD_RSSI_TOKEN),
        ],
    )
}

pub(crate) struct CslScheduler {
    period: AtomicU16,
    last_rx_time: Mutex<CriticalSectionRawMutex, Cell<Option<u64>>>,
}

impl CslScheduler {
    pub(crate) const fn new() -> Self {
        Self {
            period: AtomicU16::new(0),
            last_rx_time: Mutex::new(Cell::new(None)),
        }
    }

    fn set_period(&self, period: u16) {
        self.period.store(period, Ordering::Release);
        self.last_rx_time.lock(|last| last.set(None));
    }

    /// Record `expected_ns` and report whether its phase differs from the previous sample.
    fn anchor_changed(&self, expected_ns: u64) -> bool {
        let period_ns = u64::from(self.period.load(Ordering::Acquire)) * time::NSEC_PER_TEN_SYMBOLS;
        let previous = self.last_rx_time.lock(|last| last.replace(Some(expected_ns)));

        match previous {
            Some(previous) if period_ns != 0 => previous.abs_diff(expected_ns) % period_ns != 0,
            _ => true,
        }
    }
}

impl<D: RadioDriver> Radio<D> {
    /// Enable CSL with `period` (units of 10 symbols) for the given parent, or disable it with a
    /// period of zero.
    pub fn enable_csl(&self, period: u16, short_address: u16, ext_address: Option<&ExtAddress>) -> Result<(), Error> {
        self.driver.csl_writer_period_set(period);
        self.csl.set_period(period);

        if period == 0 {
            self.ack_data_clear(short_address, ext_address)
        } else {
            self.ack_data_set(short_address, ext_address, &csl_ie(period))
        }
    }

    /// Disable CSL and remove every IE installed for ACKs.
    pub fn reset_csl(&self) {
        self.driver.csl_writer_period_set(0);
        self.csl.set_period(0);

        self.driver.ack_data_remove_all(false);
        self.driver.ack_data_remove_all(true);
    }

    /// Update the next CSL sample time (start of MAC header, wrapped microseconds).
    ///
    /// The driver's anchor is only reprogrammed when the sample moves out of phase with the
    /// previous one.
    pub fn update_csl_sample_time(&self, sample_time: u32) {
        let expected_ns = time::reconcile(
            sample_time.wrapping_sub(time::PHR_DURATION_US),
            self.driver.time_get(),
        );

        if self.csl.anchor_changed(expected_ns) {
            trace!("CSL anchor moved to {} ns", expected_ns);
            self.driver
                .csl_writer_anchor_time_set(time::phr_to_mhr(expected_ns / 1000));
        }
    }

    /// Current CSL period, units of 10 symbols.
    pub fn csl_period(&self) -> u16 {
        self.csl.period.load(Ordering::Acquire)
    }

    /// Accuracy of the sleep clock in ppm.
    pub fn csl_accuracy(&self) -> u8 {
        self.config.csl_accuracy
    }

    /// Scheduling uncertainty in units of 10 microseconds.
    pub fn csl_uncertainty(&self) -> Option<u8> {
        self.config.csl_uncertainty
    }

    /// Report `metrics` in enhanced ACKs sent to the given probing initiator.
    ///
    /// Empty metrics remove the IE.
    pub fn configure_enh_ack_probing(
        &self,
        metrics: LinkMetrics,
        short_address: u16,
        ext_address: Option<&ExtAddress>,
    ) -> Result<(), Error> {
        if metrics.is_empty() {
            self.ack_data_clear(short_address, ext_address)
        } else {
            self.ack_data_set(short_address, ext_address, &link_metrics_ie(metrics))
        }
    }

    fn ack_data_set(&self, short_address: u16, ext_address: Option<&ExtAddress>, ie: &[u8]) -> Result<(), Error> {
        let ext_address = match ext_address {
            Some(ext) if short_address != BROADCAST_ADDRESS => ext,
            _ => return Err(Error::NotSupported),
        };

        if short_address != NO_SHORT_ADDRESS
            && !self
                .driver
                .ack_data_set(&Address::Short(short_address.to_le_bytes()), ie)
        {
            warn!("Cannot set ACK data for {:x}", short_address);
        }
        if !self
            .driver
            .ack_data_set(&Address::Extended(ext_address.to_le_bytes()), ie)
        {
            warn!("Cannot set ACK data for extended address");
        }

        Ok(())
    }

    fn ack_data_clear(&self, short_address: u16, ext_address: Option<&ExtAddress>) -> Result<(), Error> {
        let ext_address = match ext_address {
            Some(ext) if short_address != BROADCAST_ADDRESS => ext,
            _ => return Err(Error::NotSupported),
        };

        if short_address != NO_SHORT_ADDRESS {
            self.driver
                .ack_data_clear(&Address::Short(short_address.to_le_bytes()));
        }
        self.driver
            .ack_data_clear(&Address::Extended(ext_address.to_le_bytes()));

        Ok(())
    }
}
