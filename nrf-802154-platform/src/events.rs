//! Pending-event set: the only signal path from driver callbacks to the stack thread.

use core::future::poll_fn;
use core::sync::atomic::{AtomicU32, Ordering};
use core::task::Poll;

use embassy_sync::waitqueue::AtomicWaker;

/// Events raised by driver callbacks or deferred requests, drained by [`Radio::process`](crate::Radio::process).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PendingEvent {
    /// A frame is waiting to be handed to the transmit worker.
    FrameToSend,
    /// One or more frames sit in the receive queue.
    FrameReceived,
    /// A reception failed.
    RxFailed,
    /// The driver accepted a frame for transmission.
    TxStarted,
    /// The transmit worker finished a transmission attempt.
    TxDone,
    /// An energy scan is waiting to be (re)started.
    DetectEnergy,
    /// An energy scan finished.
    DetectEnergyDone,
    /// A sleep request waits for the radio to become idle.
    Sleep,
}

impl PendingEvent {
    const fn mask(self) -> u32 {
        1 << self as u8
    }
}

/// Atomic bitset of [`PendingEvent`]s.
///
/// Any context may set bits. Only the stack thread clears them.
pub(crate) struct PendingEvents {
    bits: AtomicU32,
    waker: AtomicWaker,
}

impl PendingEvents {
    pub(crate) const fn new() -> Self {
        Self {
            bits: AtomicU32::new(0),
            waker: AtomicWaker::new(),
        }
    }

    pub(crate) fn is_set(&self, event: PendingEvent) -> bool {
        self.bits.load(Ordering::Acquire) & event.mask() != 0
    }

    /// Set `event` and wake the stack thread.
    pub(crate) fn set(&self, event: PendingEvent) {
        self.bits.fetch_or(event.mask(), Ordering::AcqRel);
        self.signal();
    }

    pub(crate) fn reset(&self, event: PendingEvent) {
        self.bits.fetch_and(!event.mask(), Ordering::AcqRel);
    }

    /// Clear `event`, returning whether it was set.
    pub(crate) fn take(&self, event: PendingEvent) -> bool {
        self.bits.fetch_and(!event.mask(), Ordering::AcqRel) & event.mask() != 0
    }

    pub(crate) fn any(&self) -> bool {
        self.bits.load(Ordering::Acquire) != 0
    }

    /// Wake the stack thread without changing any bit.
    pub(crate) fn signal(&self) {
        self.waker.wake();
    }

    pub(crate) async fn wait(&self) {
        poll_fn(|cx| {
            self.waker.register(cx.waker());
            if self.any() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }
}
