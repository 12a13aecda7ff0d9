//! Transmit pipeline and ACK handling.
//!
//! The stack thread places a frame in the single transmit slot with [`Radio::transmit`]. The
//! transmit worker ([`Radio::run_transmitter`]) picks it up, chooses a driver primitive, waits for
//! the driver's completion event and leaves the outcome in the slot for
//! [`Radio::process`] to report.

use core::cell::RefCell;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use heapless::Vec;

use crate::driver::{
    CsmaCaMetadata, FrameProps, RadioDriver, ReceivedAck, TransmitAtMetadata, TransmitMetadata, NO_TIMESTAMP,
};
use crate::error::{Error, TxDriverError, TxError};
use crate::events::PendingEvent;
use crate::frame::{AckFrame, Psdu, TxFrame, ACK_BUFFER_LEN};
use crate::radio::{Radio, RadioCapabilities};
use crate::time;

const FRAME_TYPE_MASK: u8 = 0x07;
const FRAME_TYPE_ACK: u8 = 0x02;

/// What the driver reported for an issued transmission.
pub(crate) struct TxCompletion<B> {
    pub psdu: Psdu,
    pub props: FrameProps,
    pub result: Result<Option<ReceivedAck<B>>, TxDriverError>,
}

struct TxSlot {
    frame: TxFrame,
    busy: bool,
    started_reported: bool,
    result: Result<(), TxError>,
}

pub(crate) struct TxPipeline<B> {
    slot: Mutex<CriticalSectionRawMutex, RefCell<TxSlot>>,
    ack: Mutex<CriticalSectionRawMutex, RefCell<Option<AckFrame>>>,
    request: Signal<CriticalSectionRawMutex, ()>,
    done: Signal<CriticalSectionRawMutex, TxCompletion<B>>,
    cca: Signal<CriticalSectionRawMutex, bool>,
}

impl<B> TxPipeline<B> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(TxSlot {
                frame: TxFrame::default(),
                busy: false,
                started_reported: false,
                result: Ok(()),
            })),
            ack: Mutex::new(RefCell::new(None)),
            request: Signal::new(),
            done: Signal::new(),
            cca: Signal::new(),
        }
    }

    /// Claim the transmit slot for `frame`. Fails without touching the slot if it is taken.
    pub(crate) fn submit(&self, frame: &TxFrame) -> Result<(), Error> {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.busy {
                return Err(Error::Busy);
            }
            slot.frame.clone_from(frame);
            slot.busy = true;
            slot.started_reported = false;
            slot.result = Ok(());
            Ok(())
        })
    }

    pub(crate) fn wake_worker(&self) {
        self.request.signal(());
    }

    pub(crate) fn frame(&self) -> TxFrame {
        self.slot.lock(|slot| slot.borrow().frame.clone())
    }

    /// Returns `true` the first time it is called for the current transmission.
    pub(crate) fn mark_started(&self) -> bool {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            !core::mem::replace(&mut slot.started_reported, true)
        })
    }

    fn complete(&self, frame: TxFrame, result: Result<(), TxError>) {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            slot.frame = frame;
            slot.result = result;
        })
    }

    /// Release the slot, returning the final frame, its ACK and the result.
    pub(crate) fn finish(&self) -> (TxFrame, Option<AckFrame>, Result<(), TxError>) {
        let ack = self.ack.lock(|ack| ack.borrow_mut().take());
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            slot.busy = false;
            (slot.frame.clone(), ack, slot.result)
        })
    }

    pub(crate) fn on_completion(&self, completion: TxCompletion<B>) {
        self.done.signal(completion);
    }

    pub(crate) fn on_cca(&self, channel_free: bool) {
        self.cca.signal(channel_free);
    }

    fn store_ack(&self, frame: AckFrame) {
        self.ack.lock(|ack| {
            if ack.replace(Some(frame)).is_some() {
                error!("Overwriting unhandled ACK frame");
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum TxMode {
    Direct { cca: bool },
    CsmaCa,
    At { time: u32 },
}

impl TxMode {
    /// The driver runs a CCA of its own before sending and may report it as a CCA event.
    fn with_cca(self) -> bool {
        matches!(self, TxMode::Direct { cca: true } | TxMode::At { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum AckRejection {
    Length(u8),
    FrameType(u8),
}

/// Check an ACK (PHR first) and return its MAC bytes.
fn parse_ack(psdu: &[u8]) -> Result<&[u8], AckRejection> {
    let len = psdu.first().copied().ok_or(AckRejection::Length(0))?;
    if usize::from(len) > ACK_BUFFER_LEN {
        return Err(AckRejection::Length(len));
    }
    let mpdu = psdu.get(1..=usize::from(len)).ok_or(AckRejection::Length(len))?;
    let frame_type = mpdu.first().copied().unwrap_or(0) & FRAME_TYPE_MASK;
    if frame_type != FRAME_TYPE_ACK {
        return Err(AckRejection::FrameType(frame_type));
    }
    Ok(mpdu)
}

impl<D: RadioDriver> Radio<D> {
    /// Run the transmit worker forever.
    ///
    /// This must run in its own task so that [`Radio::process`] never blocks on the driver.
    pub async fn run_transmitter(&self) -> ! {
        loop {
            self.process_transmit().await;
        }
    }

    /// Wait for one transmit request and carry it out.
    pub async fn process_transmit(&self) {
        self.tx.request.wait().await;

        let mut frame = self.tx.frame();
        let result = self.transmit_message(&mut frame).await;
        debug!("Tx result: {:?}", result);

        self.tx.complete(frame, result);
        self.events.set(PendingEvent::TxDone);
    }

    async fn transmit_message(&self, frame: &mut TxFrame) -> Result<(), TxError> {
        if let Err(err) = self.set_channel(frame.channel) {
            warn!("Cannot set tx channel {}: {:?}", frame.channel, err);
        }

        let caps = self.capabilities();
        match frame.tx_time() {
            Some(time) if caps.contains(RadioCapabilities::TRANSMIT_TIMING) => {
                self.transmit_with(frame, TxMode::At { time }).await
            }
            _ if frame.csma_ca_enabled => {
                if caps.contains(RadioCapabilities::CSMA_BACKOFF) {
                    self.transmit_with(frame, TxMode::CsmaCa).await
                } else {
                    self.clear_channel_assessment().await?;
                    self.transmit_with(frame, TxMode::Direct { cca: false }).await
                }
            }
            _ => {
                let cca = frame.cca_enabled;
                self.transmit_with(frame, TxMode::Direct { cca }).await
            }
        }
    }

    async fn clear_channel_assessment(&self) -> Result<(), TxError> {
        self.tx.cca.reset();
        if !self.driver.cca() {
            debug!("CCA failed");
            return Err(TxError::ChannelAccessFailure);
        }

        let channel_free = self.tx.cca.wait().await;
        debug!("Channel free? {}", channel_free);

        if channel_free {
            Ok(())
        } else {
            Err(TxError::ChannelAccessFailure)
        }
    }

    async fn transmit_with(&self, frame: &mut TxFrame, mode: TxMode) -> Result<(), TxError> {
        let psdu = Psdu::from_slice(&frame.psdu).ok_or(TxError::Abort)?;
        trace!("Transmitting {} bytes ({:?})", psdu.len(), mode);

        // A completion left over from an earlier attempt must not satisfy this one.
        if let Some(stale) = self.tx.done.try_take() {
            if let Ok(Some(ack)) = stale.result {
                self.driver.buffer_free(ack.psdu);
            }
        }

        let frame_props = FrameProps {
            is_secured: frame.is_security_processed,
            dynamic_data_is_set: frame.is_header_updated,
        };
        let tx_power = self.transmit_power_for_channel(frame.channel);
        if mode.with_cca() {
            self.tx.cca.reset();
        }

        let issued = match mode {
            TxMode::Direct { cca } => self.driver.transmit_raw(
                psdu,
                &TransmitMetadata {
                    frame_props,
                    cca,
                    tx_power,
                },
            ),
            TxMode::CsmaCa => self
                .driver
                .transmit_csma_ca_raw(psdu, &CsmaCaMetadata { frame_props, tx_power }),
            TxMode::At { time } => {
                // The driver expects the start of SHR, the MAC layer gives the start of PHR.
                let at = time::phr_to_shr(time::reconcile_us(time, self.driver.time_get()));
                self.driver.transmit_raw_at(
                    psdu,
                    at,
                    &TransmitAtMetadata {
                        frame_props,
                        cca: true,
                        channel: frame.channel,
                        tx_power,
                        extra_cca_attempts: self.config.max_extra_cca_attempts,
                    },
                )
            }
        };

        if issued.is_err() {
            error!("Cannot send frame");
            return Err(TxError::Abort);
        }

        self.events.set(PendingEvent::TxStarted);
        debug!(
            "Sending frame (ch:{}, txpower:{})",
            self.driver.channel_get(),
            self.driver.tx_power_get()
        );

        let completion = if mode.with_cca() {
            match self.wait_completion_or_busy_channel().await {
                Some(completion) => completion,
                None => return Err(TxError::ChannelAccessFailure),
            }
        } else {
            self.tx.done.wait().await
        };

        // Retransmissions must reuse the bytes the driver secured, not secure them again.
        if let Ok(psdu) = Vec::from_slice(&completion.psdu) {
            frame.psdu = psdu;
        }
        frame.is_security_processed = completion.props.is_secured;
        frame.is_header_updated = completion.props.dynamic_data_is_set;

        match completion.result {
            Ok(None) => Ok(()),
            Ok(Some(ack)) => self.handle_ack(ack),
            Err(err) => Err(err.into()),
        }
    }

    /// Wait for the completion of a transmission issued with CCA. `None` if the CCA found the
    /// channel busy or failed, in which case the driver drops the frame.
    async fn wait_completion_or_busy_channel(&self) -> Option<TxCompletion<D::Buffer>> {
        loop {
            match select(self.tx.done.wait(), self.tx.cca.wait()).await {
                Either::First(completion) => return Some(completion),
                Either::Second(true) => trace!("CCA passed"),
                Either::Second(false) => {
                    debug!("Channel busy");
                    return None;
                }
            }
        }
    }

    /// Validate the ACK carried by a completed transmission and keep a copy for the upper layer.
    ///
    /// The driver buffer is always returned. An ACK without a timestamp counts as missing.
    fn handle_ack(&self, ack: ReceivedAck<D::Buffer>) -> Result<(), TxError> {
        let result = if ack.time == NO_TIMESTAMP {
            warn!("Invalid ACK timestamp");
            Err(TxError::NoAck)
        } else {
            match parse_ack(ack.psdu.as_ref()) {
                Ok(mpdu) => {
                    // `parse_ack` bounds the length by the buffer size.
                    let psdu = Vec::from_slice(mpdu).unwrap_or_default();
                    self.tx.store_ack(AckFrame {
                        timestamp: time::end_to_phr(ack.time, psdu.len() as u8),
                        psdu,
                        rssi: ack.power,
                        lqi: ack.lqi,
                    });
                }
                Err(reason) => error!("Dropping ACK: {:?}", reason),
            }
            Ok(())
        };

        self.driver.buffer_free(ack.psdu);
        result
    }
}
