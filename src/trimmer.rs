// SPDX-License-Identifier: Apache-2.0

//! The idle trimmer: a periodic background job that prunes freelists back
//! toward recent demand, releasing long-idle excess to the segment source.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use crate::global;
use crate::small::CLASS_COUNT;

/// Base interval between trimming passes.
pub(crate) const INTERVAL: Duration = Duration::from_secs(120);
/// Jitter added on top of [`INTERVAL`] so many processes don't trim in
/// lockstep.
pub(crate) const JITTER: Duration = Duration::from_secs(30);
/// Entries idle for less than this are never trimmed, even if they're
/// above the high-water mark.
pub(crate) const IDLE_THRESHOLD: Duration = Duration::from_secs(90);

/// A decaying maximum: each observation either raises the mark to the
/// current value or lets it decay by a tenth, approximating "the highest
/// recent demand, discounting old spikes" without tracking a full history.
/// Fed with a pool's *in-use* count, not its free count - the mark is a
/// demand signal independent of how many idle entries currently happen
/// to be sitting on the freelist, so it can fall below the current free
/// count and actually let a trim pass reclaim something.
pub(crate) struct DecayingMax {
	mark: AtomicUsize,
}

impl DecayingMax {
	pub(crate) const fn new() -> Self {
		Self { mark: AtomicUsize::new(0) }
	}

	pub(crate) fn observe(&self, current: usize) -> usize {
		let prev = self.mark.load(Ordering::Relaxed);
		let decayed = prev - prev / 10;
		let next = current.max(decayed);
		self.mark.store(next, Ordering::Relaxed);
		next
	}
}

pub(crate) async fn run() {
	loop {
		let jitter = fastrand_jitter();
		sleep(INTERVAL + jitter).await;
		pass();
	}
}

fn fastrand_jitter() -> Duration {
	// A process-local, not-cryptographic jitter source: the low bits of
	// the live-instance counter's address salted by a monotonic tick.
	// Avoids pulling in a `rand` dependency for a cosmetic stagger.
	let nanos = std::time::Instant::now().elapsed().subsec_nanos() as u64;
	let frac = (nanos % JITTER.as_millis() as u64) as u32;
	Duration::from_millis(frac as u64)
}

fn pass() {
	let seg_pool = global::segment_pool();
	let seg_keep = global::segment_high_water().observe(seg_pool.in_use_count());
	seg_pool.trim(seg_keep, IDLE_THRESHOLD);

	let small_pool = global::small_pool();
	for class in 0..CLASS_COUNT {
		let keep = global::small_high_water(class).observe(small_pool.in_use_count(class));
		small_pool.trim_class(class, keep, IDLE_THRESHOLD);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pool::Freelist;

	#[test]
	fn decaying_max_decays_toward_a_lower_observation() {
		let mark = DecayingMax::new();
		assert_eq!(mark.observe(100), 100);
		assert_eq!(mark.observe(0), 90);
	}

	#[test]
	fn low_demand_lets_a_freelist_trim_below_its_current_size() {
		// Demand (in-use count) is low, even though the freelist holds
		// many idle entries - the keep target must come out below the
		// freelist's current length for a trim pass to reclaim anything.
		let mark = DecayingMax::new();
		let keep = mark.observe(2);
		assert!(keep < 10);

		let free = Freelist::default();
		for i in 0..10u32 {
			free.push(i);
		}
		let trimmed = free.trim_idle(keep, Duration::ZERO);
		assert_eq!(trimmed.len(), 8);
		assert_eq!(free.len(), 2);
	}
}
