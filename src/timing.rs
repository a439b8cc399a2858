//! Randomized timing draws
//!
//! Every value is drawn fresh per cycle; consecutive draws are independent.

use rand::Rng;
use std::time::Duration;

/// Floor on the inter-click interval, regardless of configuration
pub const MIN_INTERVAL_MS: u64 = 10;

/// Draw the interval until the next click
///
/// Applies a uniform offset in `[-random_offset_ms, +random_offset_ms]` to the
/// base interval, clamped to [`MIN_INTERVAL_MS`] so extreme negative offsets
/// cannot produce a busy-loop.
pub fn draw_interval<R: Rng>(rng: &mut R, base_interval_ms: u64, random_offset_ms: u64) -> u64 {
    let offset = if random_offset_ms > 0 {
        let bound = random_offset_ms as i64;
        rng.gen_range(-bound..=bound)
    } else {
        0
    };

    (base_interval_ms as i64 + offset).max(MIN_INTERVAL_MS as i64) as u64
}

/// Draw the hold duration for a hold-mode cycle
///
/// Uniform extra time in `[0, max_extra_hold_ms]` on top of the minimum.
pub fn draw_hold<R: Rng>(rng: &mut R, min_hold_ms: u64, max_extra_hold_ms: u64) -> u64 {
    let extra = if max_extra_hold_ms > 0 {
        rng.gen_range(0..=max_extra_hold_ms)
    } else {
        0
    };

    min_hold_ms + extra
}

/// Draw the short gap between press and release of a tap
///
/// Uniform in [10, 25) ms so down/up pairs are never instantaneous.
pub fn tap_gap<R: Rng>(rng: &mut R) -> Duration {
    Duration::from_millis(rng.gen_range(10..25))
}
