#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::future::Future;

use embassy_futures::{block_on, join::join, yield_now};
use nrf_802154_platform::{
    AckFrame, Address, Config, CsmaCaMetadata, DriverCapabilities, EnergyScanResult, FrameProps, Psdu, Radio,
    RadioDriver, RadioEvents, RxError, RxFrame, SecurityError, SecurityKey, SleepError, SrcMatchMethod,
    TransmitAtMetadata, TransmitMetadata, TxError, TxFrame,
};

pub const NOW_US: u64 = 0x0000_0001_0010_0000;
pub const DEVICE_ID: u64 = 0x0102_0304_0506_0708;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Direct { cca: bool },
    CsmaCa,
    At { time_us: u64, channel: u8 },
}

#[derive(Debug)]
pub struct Issued {
    pub psdu: Psdu,
    pub kind: TxKind,
    pub tx_power: i8,
    pub props: FrameProps,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Receive,
    ReceiveAt { start_us: u64, duration_us: u32, channel: u8, id: u32 },
    Sleep,
    SleepIfIdle,
    Cca,
    EnergyDetection(u32),
    TxPower(i8),
    ContinuousCarrier,
    ModulatedCarrier(Vec<u8>),
    PanId([u8; 2]),
    ShortAddress([u8; 2]),
    ExtendedAddress([u8; 8]),
    Promiscuous(bool),
    RxOnWhenIdle(bool),
    MatchingMethod(SrcMatchMethod),
    AutoPending(bool),
    PendingSet(Address),
    PendingClear(Address),
    PendingReset(bool),
    AckDataSet(Address, Vec<u8>),
    AckDataClear(Address),
    AckDataRemoveAll(bool),
    CslPeriod(u16),
    CslAnchor(u64),
    KeyStore(SecurityKey),
    KeyRemoveAll,
    FrameCounter(u32),
    FrameCounterIfLarger(u32),
}

/// Records every command and lets tests decide how the driver answers.
pub struct FakeDriver {
    pub caps: DriverCapabilities,
    pub now: Cell<u64>,
    pub channel: Cell<u8>,
    pub tx_power: Cell<i8>,
    /// Accept receive, transmit, CCA, energy detection and carrier requests.
    pub accept: Cell<bool>,
    pub sleep_busy: Cell<bool>,
    pub pending_list_ok: Cell<bool>,
    pub key_store_result: Cell<Result<(), SecurityError>>,
    pub issued: RefCell<Vec<Issued>>,
    pub freed: RefCell<Vec<Vec<u8>>>,
    pub calls: RefCell<Vec<Call>>,
}

impl FakeDriver {
    pub fn new(caps: DriverCapabilities) -> Self {
        Self {
            caps,
            now: Cell::new(NOW_US),
            channel: Cell::new(11),
            tx_power: Cell::new(0),
            accept: Cell::new(true),
            sleep_busy: Cell::new(false),
            pending_list_ok: Cell::new(true),
            key_store_result: Cell::new(Ok(())),
            issued: RefCell::new(Vec::new()),
            freed: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    pub fn take_calls(&self) -> Vec<Call> {
        self.calls.take()
    }

    pub fn called(&self, call: &Call) -> bool {
        self.calls.borrow().contains(call)
    }

    pub fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| f(c)).count()
    }

    pub fn take_issued(&self) -> Option<Issued> {
        let mut issued = self.issued.borrow_mut();
        (!issued.is_empty()).then(|| issued.remove(0))
    }

    pub fn has_issued(&self) -> bool {
        !self.issued.borrow().is_empty()
    }

    fn issue(&self, psdu: Psdu, kind: TxKind, tx_power: i8, props: FrameProps) -> Result<(), Psdu> {
        if !self.accept.get() {
            return Err(psdu);
        }
        self.issued.borrow_mut().push(Issued {
            psdu,
            kind,
            tx_power,
            props,
        });
        Ok(())
    }
}

impl RadioDriver for FakeDriver {
    type Buffer = Vec<u8>;

    fn capabilities(&self) -> DriverCapabilities {
        self.caps
    }

    fn device_id(&self) -> u64 {
        DEVICE_ID
    }

    fn time_get(&self) -> u64 {
        self.now.get()
    }

    fn channel_set(&self, channel: u8) {
        self.channel.set(channel);
    }

    fn channel_get(&self) -> u8 {
        self.channel.get()
    }

    fn tx_power_set(&self, power: i8) {
        self.tx_power.set(power);
        self.record(Call::TxPower(power));
    }

    fn tx_power_get(&self) -> i8 {
        self.tx_power.get()
    }

    fn receive(&self) -> bool {
        self.record(Call::Receive);
        self.accept.get()
    }

    fn receive_at(&self, start_us: u64, duration_us: u32, channel: u8, id: u32) -> bool {
        self.record(Call::ReceiveAt {
            start_us,
            duration_us,
            channel,
            id,
        });
        self.accept.get()
    }

    fn sleep(&self) -> bool {
        self.record(Call::Sleep);
        true
    }

    fn sleep_if_idle(&self) -> Result<(), SleepError> {
        self.record(Call::SleepIfIdle);
        if self.sleep_busy.get() {
            Err(SleepError::Busy)
        } else {
            Ok(())
        }
    }

    fn transmit_raw(&self, psdu: Psdu, metadata: &TransmitMetadata) -> Result<(), Psdu> {
        self.issue(
            psdu,
            TxKind::Direct { cca: metadata.cca },
            metadata.tx_power,
            metadata.frame_props,
        )
    }

    fn transmit_csma_ca_raw(&self, psdu: Psdu, metadata: &CsmaCaMetadata) -> Result<(), Psdu> {
        self.issue(psdu, TxKind::CsmaCa, metadata.tx_power, metadata.frame_props)
    }

    fn transmit_raw_at(&self, psdu: Psdu, time_us: u64, metadata: &TransmitAtMetadata) -> Result<(), Psdu> {
        self.issue(
            psdu,
            TxKind::At {
                time_us,
                channel: metadata.channel,
            },
            metadata.tx_power,
            metadata.frame_props,
        )
    }

    fn cca(&self) -> bool {
        self.record(Call::Cca);
        self.accept.get()
    }

    fn energy_detection(&self, time_us: u32) -> bool {
        self.record(Call::EnergyDetection(time_us));
        self.accept.get()
    }

    fn buffer_free(&self, buffer: Vec<u8>) {
        self.freed.borrow_mut().push(buffer);
    }

    fn continuous_carrier(&self) -> bool {
        self.record(Call::ContinuousCarrier);
        self.accept.get()
    }

    fn modulated_carrier(&self, data: &[u8]) -> bool {
        self.record(Call::ModulatedCarrier(data.to_vec()));
        self.accept.get()
    }

    fn pan_id_set(&self, pan_id: [u8; 2]) {
        self.record(Call::PanId(pan_id));
    }

    fn short_address_set(&self, address: [u8; 2]) {
        self.record(Call::ShortAddress(address));
    }

    fn extended_address_set(&self, address: [u8; 8]) {
        self.record(Call::ExtendedAddress(address));
    }

    fn promiscuous_set(&self, enabled: bool) {
        self.record(Call::Promiscuous(enabled));
    }

    fn rx_on_when_idle_set(&self, enabled: bool) {
        self.record(Call::RxOnWhenIdle(enabled));
    }

    fn src_addr_matching_method_set(&self, method: SrcMatchMethod) {
        self.record(Call::MatchingMethod(method));
    }

    fn auto_pending_bit_set(&self, enabled: bool) {
        self.record(Call::AutoPending(enabled));
    }

    fn pending_bit_for_addr_set(&self, address: &Address) -> bool {
        self.record(Call::PendingSet(*address));
        self.pending_list_ok.get()
    }

    fn pending_bit_for_addr_clear(&self, address: &Address) -> bool {
        self.record(Call::PendingClear(*address));
        self.pending_list_ok.get()
    }

    fn pending_bit_for_addr_reset(&self, extended: bool) {
        self.record(Call::PendingReset(extended));
    }

    fn ack_data_set(&self, address: &Address, ie: &[u8]) -> bool {
        self.record(Call::AckDataSet(*address, ie.to_vec()));
        true
    }

    fn ack_data_clear(&self, address: &Address) -> bool {
        self.record(Call::AckDataClear(*address));
        true
    }

    fn ack_data_remove_all(&self, extended: bool) {
        self.record(Call::AckDataRemoveAll(extended));
    }

    fn csl_writer_period_set(&self, period: u16) {
        self.record(Call::CslPeriod(period));
    }

    fn csl_writer_anchor_time_set(&self, anchor_time_us: u64) {
        self.record(Call::CslAnchor(anchor_time_us));
    }

    fn security_key_store(&self, key: &SecurityKey) -> Result<(), SecurityError> {
        self.record(Call::KeyStore(*key));
        self.key_store_result.get()
    }

    fn security_key_remove_all(&self) {
        self.record(Call::KeyRemoveAll);
    }

    fn security_global_frame_counter_set(&self, counter: u32) {
        self.record(Call::FrameCounter(counter));
    }

    fn security_global_frame_counter_set_if_larger(&self, counter: u32) {
        self.record(Call::FrameCounterIfLarger(counter));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub psdu: Vec<u8>,
    pub channel: u8,
    pub rssi: i8,
    pub lqi: u8,
    pub timestamp: u64,
    pub acked_with_frame_pending: bool,
    pub acked_with_sec_enh_ack: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxDone {
    pub frame: TxFrame,
    pub ack: Option<AckFrame>,
    pub result: Result<(), TxError>,
}

/// Upper layer stand-in keeping owned copies of every notification.
#[derive(Debug, Default)]
pub struct Recorder {
    pub received: Vec<Result<Received, RxError>>,
    pub tx_started: Vec<TxFrame>,
    pub tx_done: Vec<TxDone>,
    pub energy_scans: Vec<EnergyScanResult>,
}

impl RadioEvents for Recorder {
    fn receive_done(&mut self, result: Result<&RxFrame<'_>, RxError>) {
        self.received.push(result.map(|frame| Received {
            psdu: frame.psdu.to_vec(),
            channel: frame.channel,
            rssi: frame.rssi,
            lqi: frame.lqi,
            timestamp: frame.timestamp,
            acked_with_frame_pending: frame.acked_with_frame_pending,
            acked_with_sec_enh_ack: frame.acked_with_sec_enh_ack,
        }));
    }

    fn tx_started(&mut self, frame: &TxFrame) {
        self.tx_started.push(frame.clone());
    }

    fn tx_done(&mut self, frame: &TxFrame, ack: Option<&AckFrame>, result: Result<(), TxError>) {
        self.tx_done.push(TxDone {
            frame: frame.clone(),
            ack: ack.cloned(),
            result,
        });
    }

    fn energy_scan_done(&mut self, result: EnergyScanResult) {
        self.energy_scans.push(result);
    }
}

pub fn radio(caps: DriverCapabilities) -> Radio<FakeDriver> {
    Radio::new(FakeDriver::new(caps), Config::default())
}

/// A radio that is enabled and listening on `channel`.
pub fn receiving(caps: DriverCapabilities, channel: u8) -> Radio<FakeDriver> {
    let radio = radio(caps);
    radio.enable().unwrap();
    radio.receive(channel).unwrap();
    radio.driver().take_calls();
    radio
}

/// A data frame with a sequence number, FCS placeholder included.
pub fn data_frame(channel: u8, seq: u8) -> TxFrame {
    TxFrame::new(channel, &[0x61, 0x88, seq, 0xcd, 0xab, 0x34, 0x12, 0x78, 0x56, 0x01, 0x02, 0, 0]).unwrap()
}

/// Poll until `cond` holds.
pub async fn until(mut cond: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if cond() {
            return;
        }
        yield_now().await;
    }
    panic!("condition never became true");
}

/// Run one transmit worker iteration alongside `script`, which plays the driver's part.
pub fn with_worker(radio: &Radio<FakeDriver>, script: impl Future<Output = ()>) {
    block_on(join(radio.process_transmit(), script));
}

/// Submit `frame`, hand it to the worker and answer the issued transmission with `respond`.
pub fn transmit_and_respond(
    radio: &Radio<FakeDriver>,
    recorder: &mut Recorder,
    frame: &TxFrame,
    respond: impl FnOnce(Issued) -> nrf_802154_platform::DriverEvent<'static, Vec<u8>>,
) {
    radio.transmit(frame).unwrap();
    radio.process(recorder);

    with_worker(radio, async {
        until(|| radio.driver().has_issued()).await;
        let issued = radio.driver().take_issued().unwrap();
        radio.on_driver_event(respond(issued));
    });

    radio.process(recorder);
}
