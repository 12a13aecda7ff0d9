//! Radio time domain helpers.
//!
//! The MAC layer schedules in wrapped 32-bit microseconds while the driver runs a monotonic
//! 64-bit microsecond clock. [`reconcile`] maps the former onto the latter.

/// Duration of one PHY symbol in microseconds (O-QPSK, 2.4 GHz).
pub const PHY_US_PER_SYMBOL: u64 = 16;
/// Number of PHY symbols per octet.
pub const PHY_SYMBOLS_PER_OCTET: u64 = 2;
/// Number of symbols in the synchronization header (preamble + SFD).
pub const PHY_SHR_SYMBOLS: u64 = 10;
/// Duration of the PHY header in microseconds.
pub const PHR_DURATION_US: u32 = 32;
/// Nanoseconds in ten symbols, the unit of CSL periods.
pub const NSEC_PER_TEN_SYMBOLS: u64 = PHY_US_PER_SYMBOL * 1000 * 10;

const NSEC_PER_USEC: u64 = 1000;
const SPAN: u64 = 1 << 32;
const HIGH_MASK: u64 = !(u32::MAX as u64);

/// Resolve a wrapped 32-bit microsecond timestamp against the 64-bit clock value `now_us`.
///
/// Half of the 32-bit range ahead of `now_us` is treated as the future, the other half as the
/// past. The returned value is in microseconds and its low 32 bits always equal `target_us`.
///
/// During the first span of the clock (`now_us < 2^32`) there is no earlier span to map a past
/// target into. Such a target resolves into the first span and may lie after `now_us`.
pub fn reconcile_us(target_us: u32, now_us: u64) -> u64 {
    let now_wrapped = now_us as u32;
    let diff = target_us.wrapping_sub(now_wrapped);

    let base = if diff < 0x8000_0000 {
        if now_wrapped > target_us {
            // The counter wraps between now and the target.
            now_us.wrapping_add(SPAN)
        } else {
            now_us
        }
    } else if now_wrapped > target_us {
        now_us
    } else {
        // The counter wrapped between the target and now. Clamped at zero during the first span.
        now_us.saturating_sub(SPAN)
    };

    (base & HIGH_MASK) | u64::from(target_us)
}

/// Resolve a wrapped 32-bit microsecond timestamp to a 64-bit nanosecond timestamp.
///
/// See [`reconcile_us`] for how the direction is chosen.
pub fn reconcile(target_us: u32, now_us: u64) -> u64 {
    let us = reconcile_us(target_us, now_us);
    debug_assert!(us <= i64::MAX as u64 / NSEC_PER_USEC);
    us.saturating_mul(NSEC_PER_USEC)
}

/// Move a timestamp taken at the end of a frame to the end of its PHY header.
pub const fn end_to_phr(end_us: u64, psdu_len: u8) -> u64 {
    end_us.saturating_sub(psdu_len as u64 * PHY_SYMBOLS_PER_OCTET * PHY_US_PER_SYMBOL)
}

/// Move a timestamp referring to the PHY header to the start of the synchronization header.
pub const fn phr_to_shr(phr_us: u64) -> u64 {
    phr_us.saturating_sub(PHY_SHR_SYMBOLS * PHY_US_PER_SYMBOL)
}

/// Move a timestamp referring to the PHY header to the start of the MAC header.
pub const fn phr_to_mhr(phr_us: u64) -> u64 {
    phr_us + PHY_SYMBOLS_PER_OCTET * PHY_US_PER_SYMBOL
}
