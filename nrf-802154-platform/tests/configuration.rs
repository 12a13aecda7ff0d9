mod common;

use common::*;
use nrf_802154_platform::{
    csl_ie, link_metrics_ie, Address, Config, DriverCapabilities, Error, ExtAddress, LinkMetrics, Radio,
    RadioCapabilities, SecurityError, SecurityKey, SrcMatchMethod,
};

const PARENT: ExtAddress = ExtAddress([0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
const PARENT_LE: [u8; 8] = [0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11];

#[test]
fn identity_and_capabilities() {
    let radio = radio(DriverCapabilities::CSMA | DriverCapabilities::SECURITY);

    assert_eq!(radio.eui64(), [0xF4, 0xCE, 0x36, 0x08, 0x07, 0x06, 0x05, 0x04]);
    assert!(radio.capabilities().contains(RadioCapabilities::CSMA_BACKOFF | RadioCapabilities::TRANSMIT_SEC));
    assert!(!radio.capabilities().contains(RadioCapabilities::TRANSMIT_TIMING));
    assert_eq!(radio.receive_sensitivity(), -100);
    assert_eq!(radio.now(), NOW_US);
    assert_eq!(radio.cca_energy_detect_threshold(), Err(Error::NotSupported));
    assert_eq!(radio.set_cca_energy_detect_threshold(-75), Err(Error::NotSupported));
}

#[test]
fn addresses_are_passed_little_endian() {
    let radio = radio(DriverCapabilities::empty());
    radio.set_pan_id(0xabcd);
    radio.set_short_address(0x1234);
    radio.set_extended_address(PARENT_LE);

    let calls = radio.driver().take_calls();
    assert!(calls.contains(&Call::PanId([0xcd, 0xab])));
    assert!(calls.contains(&Call::ShortAddress([0x34, 0x12])));
    assert!(calls.contains(&Call::ExtendedAddress(PARENT_LE)));
}

#[test]
fn channel_power_cap_applies_to_the_current_channel() {
    let radio = receiving(DriverCapabilities::empty(), 15);
    radio.set_transmit_power(10);
    assert_eq!(radio.transmit_power(), 10);

    assert_eq!(radio.set_channel_max_transmit_power(15, 4), Ok(()));
    assert_eq!(radio.driver().tx_power.get(), 4);
    // The configured power is untouched.
    assert_eq!(radio.transmit_power(), 10);

    assert_eq!(radio.set_channel_max_transmit_power(10, 0), Err(Error::InvalidArgs));
    assert_eq!(radio.set_channel_max_transmit_power(27, 0), Err(Error::InvalidArgs));

    radio.receive(16).unwrap();
    assert_eq!(radio.driver().tx_power.get(), 10);
}

#[test]
fn promiscuous_and_rx_on_when_idle() {
    let radio = radio(DriverCapabilities::empty());
    assert!(radio.driver().called(&Call::RxOnWhenIdle(true)));

    assert!(!radio.promiscuous());
    radio.set_promiscuous(true);
    assert!(radio.promiscuous());
    assert!(radio.driver().called(&Call::Promiscuous(true)));

    radio.driver().take_calls();
    radio.set_rx_on_when_idle(false);
    assert_eq!(radio.driver().take_calls(), vec![Call::RxOnWhenIdle(false), Call::SleepIfIdle]);

    radio.set_rx_on_when_idle(true);
    assert_eq!(radio.driver().take_calls(), vec![Call::RxOnWhenIdle(true)]);
}

#[test]
fn source_match_list() {
    let radio = radio(DriverCapabilities::empty());
    radio.driver().take_calls();

    radio.enable_src_match(true);
    radio.enable_src_match(false);
    assert_eq!(
        radio.driver().take_calls(),
        vec![
            Call::MatchingMethod(SrcMatchMethod::Thread),
            Call::AutoPending(true),
            Call::AutoPending(false),
        ]
    );

    assert_eq!(radio.add_src_match_short_entry(0x1234), Ok(()));
    assert_eq!(radio.add_src_match_ext_entry(PARENT_LE), Ok(()));
    assert!(radio.driver().called(&Call::PendingSet(Address::Short([0x34, 0x12]))));
    assert!(radio.driver().called(&Call::PendingSet(Address::Extended(PARENT_LE))));

    radio.driver().pending_list_ok.set(false);
    assert_eq!(radio.add_src_match_short_entry(0x5678), Err(Error::NoBufs));
    assert_eq!(radio.clear_src_match_short_entry(0x5678), Err(Error::NoAddress));
    assert_eq!(radio.clear_src_match_ext_entry(PARENT_LE), Err(Error::NoAddress));

    radio.clear_src_match_short_entries();
    radio.clear_src_match_ext_entries();
    assert!(radio.driver().called(&Call::PendingReset(false)));
    assert!(radio.driver().called(&Call::PendingReset(true)));
}

#[test]
fn mac_keys_mode_one_stores_three_keys() {
    let radio = radio(DriverCapabilities::SECURITY);
    let (prev, curr, next) = ([1; 16], [2; 16], [3; 16]);
    radio.driver().take_calls();

    assert_eq!(radio.set_mac_key(1 << 3, 1, &prev, &curr, &next), Ok(()));
    assert_eq!(
        radio.driver().take_calls(),
        vec![
            Call::KeyRemoveAll,
            Call::KeyStore(SecurityKey {
                value: prev,
                id_mode: 1,
                id: 0x80,
            }),
            Call::KeyStore(SecurityKey {
                value: curr,
                id_mode: 1,
                id: 1,
            }),
            Call::KeyStore(SecurityKey {
                value: next,
                id_mode: 1,
                id: 2,
            }),
        ]
    );

    radio.set_mac_key(1 << 3, 0x80, &prev, &curr, &next).unwrap();
    let ids: Vec<u8> = radio
        .driver()
        .take_calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::KeyStore(key) => Some(key.id),
            _ => None,
        })
        .collect();
    assert_eq!(ids, vec![0x7f, 0x80, 1]);
}

#[test]
fn mac_keys_other_modes() {
    let radio = radio(DriverCapabilities::SECURITY);
    let key = [0; 16];
    radio.driver().take_calls();

    assert_eq!(radio.set_mac_key(0, 0, &key, &key, &key), Ok(()));
    assert_eq!(radio.driver().take_calls(), vec![Call::KeyRemoveAll]);

    assert_eq!(radio.set_mac_key(1 << 3, 0, &key, &key, &key), Err(Error::InvalidArgs));
    assert_eq!(radio.set_mac_key(2 << 3, 1, &key, &key, &key), Err(Error::InvalidArgs));

    radio.driver().key_store_result.set(Err(SecurityError::AlreadyPresent));
    assert_eq!(radio.set_mac_key(1 << 3, 5, &key, &key, &key), Ok(()));

    radio.driver().key_store_result.set(Err(SecurityError::StorageFull));
    assert_eq!(radio.set_mac_key(1 << 3, 5, &key, &key, &key), Err(Error::Failed));
}

#[test]
fn frame_counters() {
    let radio = radio(DriverCapabilities::SECURITY);
    radio.set_mac_frame_counter(100);
    radio.set_mac_frame_counter_if_larger(50);

    assert_eq!(
        radio.driver().take_calls()[1..],
        [Call::FrameCounter(100), Call::FrameCounterIfLarger(50)]
    );
}

#[test]
fn csl_installs_ie_for_the_parent() {
    let radio = radio(DriverCapabilities::DELAYED_RX);
    radio.driver().take_calls();

    assert_eq!(radio.enable_csl(3125, 0x1234, Some(&PARENT)), Ok(()));
    assert_eq!(radio.csl_period(), 3125);
    let ie = csl_ie(3125).to_vec();
    assert_eq!(
        radio.driver().take_calls(),
        vec![
            Call::CslPeriod(3125),
            Call::AckDataSet(Address::Short([0x34, 0x12]), ie.clone()),
            Call::AckDataSet(Address::Extended(PARENT_LE), ie),
        ]
    );

    assert_eq!(radio.enable_csl(0, 0x1234, Some(&PARENT)), Ok(()));
    assert_eq!(
        radio.driver().take_calls(),
        vec![
            Call::CslPeriod(0),
            Call::AckDataClear(Address::Short([0x34, 0x12])),
            Call::AckDataClear(Address::Extended(PARENT_LE)),
        ]
    );
}

#[test]
fn csl_needs_a_unicast_parent() {
    let radio = radio(DriverCapabilities::DELAYED_RX);

    assert_eq!(radio.enable_csl(100, 0xffff, Some(&PARENT)), Err(Error::NotSupported));
    assert_eq!(radio.enable_csl(100, 0x1234, None), Err(Error::NotSupported));

    // No short address assigned: only the extended address gets the IE.
    radio.driver().take_calls();
    radio.enable_csl(100, 0xfffe, Some(&PARENT)).unwrap();
    assert_eq!(radio.driver().count(|c| matches!(c, Call::AckDataSet(..))), 1);
}

#[test]
fn csl_reset_clears_everything() {
    let radio = radio(DriverCapabilities::DELAYED_RX);
    radio.enable_csl(100, 0x1234, Some(&PARENT)).unwrap();
    radio.driver().take_calls();

    radio.reset_csl();
    assert_eq!(radio.csl_period(), 0);
    assert_eq!(
        radio.driver().take_calls(),
        vec![
            Call::CslPeriod(0),
            Call::AckDataRemoveAll(false),
            Call::AckDataRemoveAll(true),
        ]
    );
}

#[test]
fn csl_anchor_is_not_reprogrammed_within_the_same_phase() {
    let radio = radio(DriverCapabilities::DELAYED_RX);
    let period = 100;
    let period_us = 100 * 160;
    radio.enable_csl(period, 0x1234, Some(&PARENT)).unwrap();
    radio.driver().take_calls();

    let sample = (NOW_US as u32).wrapping_add(10_000);
    radio.update_csl_sample_time(sample);
    // Start of MAC header again: the PHR offset is removed and re-added.
    assert_eq!(radio.driver().take_calls(), vec![Call::CslAnchor(NOW_US + 10_000)]);

    radio.update_csl_sample_time(sample);
    radio.update_csl_sample_time(sample.wrapping_add(period_us));
    radio.update_csl_sample_time(sample.wrapping_add(3 * period_us));
    assert!(radio.driver().take_calls().is_empty());

    radio.update_csl_sample_time(sample.wrapping_add(3 * period_us + 320));
    assert_eq!(
        radio.driver().take_calls(),
        vec![Call::CslAnchor(NOW_US + 10_000 + 3 * u64::from(period_us) + 320)]
    );
}

#[test]
fn csl_accuracy_and_uncertainty_come_from_config() {
    let radio = Radio::new(
        FakeDriver::new(DriverCapabilities::empty()),
        Config {
            csl_accuracy: 40,
            csl_uncertainty: Some(12),
            ..Config::default()
        },
    );
    assert_eq!(radio.csl_accuracy(), 40);
    assert_eq!(radio.csl_uncertainty(), Some(12));
}

#[test]
fn enh_ack_probing_ie() {
    let radio = radio(DriverCapabilities::empty());
    radio.driver().take_calls();

    let metrics = LinkMetrics {
        lqi: true,
        link_margin: true,
        rssi: false,
    };
    assert_eq!(radio.configure_enh_ack_probing(metrics, 0x4321, Some(&PARENT)), Ok(()));
    assert!(radio.driver().called(&Call::AckDataSet(
        Address::Extended(PARENT_LE),
        link_metrics_ie(metrics).to_vec()
    )));

    radio.driver().take_calls();
    assert_eq!(
        radio.configure_enh_ack_probing(LinkMetrics::default(), 0x4321, Some(&PARENT)),
        Ok(())
    );
    assert_eq!(
        radio.driver().take_calls(),
        vec![
            Call::AckDataClear(Address::Short([0x21, 0x43])),
            Call::AckDataClear(Address::Extended(PARENT_LE)),
        ]
    );
}
