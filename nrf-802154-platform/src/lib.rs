//! IEEE 802.15.4 radio platform layer.
//!
//! This crate sits between an 802.15.4 MAC stack (such as OpenThread) and a vendor radio driver
//! such as the nRF 802.15.4 radio driver. It owns the radio state machine, the transmit pipeline,
//! the receive queue, energy scans and CSL scheduling. The driver is reached through the
//! [`RadioDriver`] trait and reports back through [`Radio::on_driver_event`].
//!
//! Three contexts share one [`Radio`]:
//!
//! - the driver's callback context calls [`Radio::on_driver_event`], which never blocks,
//! - a dedicated task runs [`Radio::run_transmitter`],
//! - the stack thread calls the configuration and control API and drains results with
//!   [`Radio::process`] whenever [`Radio::wait_pending`] completes.
//!
//! # Example
//!
//! ```rust,ignore
//! use nrf_802154_platform::{Config, Radio, RadioEvents};
//!
//! static RADIO: StaticCell<Radio<MyDriver>> = StaticCell::new();
//!
//! #[embassy_executor::task]
//! async fn transmitter(radio: &'static Radio<MyDriver>) -> ! {
//!     radio.run_transmitter().await
//! }
//!
//! #[embassy_executor::main]
//! async fn main(spawner: Spawner) -> ! {
//!     let radio = RADIO.init(Radio::new(MyDriver::new(), Config::default()));
//!     spawner.must_spawn(transmitter(radio));
//!
//!     radio.enable().unwrap();
//!     radio.receive(15).unwrap();
//!
//!     let mut stack = MyStack::new();
//!     loop {
//!         radio.wait_pending().await;
//!         radio.process(&mut stack);
//!     }
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub(crate) mod fmt;

mod config;
mod csl;
mod driver;
mod energy;
mod error;
mod events;
mod frame;
mod radio;
mod rx;
pub mod time;
mod tx;

pub use config::{Config, CHANNEL_MAX, CHANNEL_MIN, POWER_INVALID, RX_BUFFERS};
pub use csl::{csl_ie, link_metrics_ie, HeaderIe, LinkMetrics};
pub use driver::{
    Address, CsmaCaMetadata, DriverCapabilities, DriverEvent, FrameProps, RadioDriver, ReceivedAck, SecurityKey,
    SrcMatchMethod, TransmitAtMetadata, TransmitMetadata, NO_TIMESTAMP,
};
pub use energy::EnergyScanResult;
pub use error::{
    CcaDriverError, EdDriverError, Error, RxDriverError, RxError, SecurityError, SleepError, TxDriverError, TxError,
};
pub use events::PendingEvent;
pub use frame::{AckFrame, ExtAddress, Psdu, RxFrame, TxFrame, ACK_BUFFER_LEN, MAX_PSDU_LEN};
pub use radio::{Radio, RadioCapabilities, RadioEvents, RadioState};
