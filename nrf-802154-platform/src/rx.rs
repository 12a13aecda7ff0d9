//! Receive descriptor pool.
//!
//! The driver's receive callback claims a free slot, fills it and pushes the slot index into a
//! FIFO. The stack thread pops indices, takes the descriptor out and releases the slot.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;

use crate::config::RX_BUFFERS;
use crate::time;

const FRAME_CONTROL_OFFSET: usize = 1;
const FRAME_PENDING_BIT: u8 = 1 << 4;
const SECURITY_ENABLED_BIT: u8 = 1 << 3;

/// A received frame waiting for the stack thread.
#[derive(Debug)]
pub(crate) struct RxFrameDescriptor<B> {
    /// Driver-owned buffer, PHR first.
    pub psdu: B,
    pub rssi: i8,
    pub lqi: u8,
    /// End of PHR, driver clock microseconds.
    pub time: u64,
    pub ack_fpb: bool,
    pub ack_seb: bool,
}

pub(crate) struct RxPool<B> {
    slots: Mutex<CriticalSectionRawMutex, RefCell<[Option<RxFrameDescriptor<B>>; RX_BUFFERS]>>,
    fifo: Channel<CriticalSectionRawMutex, u8, RX_BUFFERS>,
    // Bits of the ACK sent for the frame currently being received.
    last_ack_fpb: AtomicBool,
    last_ack_seb: AtomicBool,
}

impl<B: AsRef<[u8]>> RxPool<B> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(core::array::from_fn(|_| None))),
            fifo: Channel::new(),
            last_ack_fpb: AtomicBool::new(false),
            last_ack_seb: AtomicBool::new(false),
        }
    }

    /// Store a frame reported by the driver and queue it.
    ///
    /// # Panics
    ///
    /// Panics if every slot is taken: the stack thread is not draining the queue.
    pub(crate) fn on_received(&self, psdu: B, rssi: i8, lqi: u8, end_time: u64) {
        let len = psdu.as_ref().first().copied().unwrap_or(0);
        let descriptor = RxFrameDescriptor {
            psdu,
            rssi,
            lqi,
            time: time::end_to_phr(end_time, len),
            ack_fpb: self.last_ack_fpb.swap(false, Ordering::AcqRel),
            ack_seb: self.last_ack_seb.swap(false, Ordering::AcqRel),
        };

        let index = self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            let index = slots.iter().position(Option::is_none)?;
            slots[index] = Some(descriptor);
            Some(index)
        });

        let Some(index) = index else {
            panic!("Not enough rx frames allocated for the 802.15.4 radio");
        };

        if self.fifo.try_send(index as u8).is_err() {
            panic!("Rx queue overflow");
        }
    }

    /// Take the oldest queued frame, releasing its slot.
    pub(crate) fn pop(&self) -> Option<RxFrameDescriptor<B>> {
        let index = self.fifo.try_receive().ok()?;
        self.slots.lock(|slots| slots.borrow_mut()[usize::from(index)].take())
    }

    /// Remember the frame-pending and security-enabled bits of the ACK being sent.
    pub(crate) fn on_ack_started(&self, ack: &[u8]) {
        let fc = ack.get(FRAME_CONTROL_OFFSET).copied().unwrap_or(0);
        self.last_ack_fpb.store(fc & FRAME_PENDING_BIT != 0, Ordering::Release);
        self.last_ack_seb.store(fc & SECURITY_ENABLED_BIT != 0, Ordering::Release);
    }

    pub(crate) fn clear_ack_flags(&self) {
        self.last_ack_fpb.store(false, Ordering::Release);
        self.last_ack_seb.store(false, Ordering::Release);
    }
}
