// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use crate::error::{Error, Result};
use crate::global;
use crate::pool::{Freelist, Retire, ZeroPolicy};
use crate::segment::Segment;
use crate::zeroing;

/// Pool of fixed-size standard segments. One size class, so unlike
/// [`SmallBufferPool`](super::small_pool::SmallBufferPool) it needs no
/// per-class indexing.
pub(crate) struct SegmentPool {
	free: Freelist<Segment>,
	in_use: AtomicUsize,
}

impl SegmentPool {
	pub(crate) fn new() -> Self {
		Self { free: Freelist::default(), in_use: AtomicUsize::new(0) }
	}

	/// Claims a single segment, allocating from the segment source on a
	/// freelist miss.
	pub(crate) fn acquire(&'static self) -> Result<Segment> {
		if let Some(seg) = self.free.pop() {
			self.in_use.fetch_add(1, Ordering::Relaxed);
			return Ok(seg);
		}
		if global::take_injected_failure() {
			return Err(Error::out_of_memory());
		}
		let source = global::source_kind();
		let seg = Segment::alloc(source).ok_or_else(Error::out_of_memory)?;
		global::record_segment_alloc(source);
		self.in_use.fetch_add(1, Ordering::Relaxed);
		Ok(seg)
	}

	/// Claims `count` fresh-or-recycled segments, rolling back (returning
	/// anything already acquired this call) if any acquisition fails
	/// partway through.
	pub(crate) fn acquire_many(&'static self, count: usize, rollback_policy: ZeroPolicy) -> Result<Vec<Segment>> {
		let mut acquired = Vec::with_capacity(count);
		for _ in 0..count {
			match self.acquire() {
				Ok(seg) => acquired.push(seg),
				Err(err) => {
					self.release_many(acquired, rollback_policy);
					return Err(err);
				}
			}
		}
		Ok(acquired)
	}

	/// Returns a segment to the pool, honoring `policy`.
	pub(crate) fn release(&'static self, mut segment: Segment, policy: ZeroPolicy) {
		self.in_use.fetch_sub(1, Ordering::Relaxed);
		match policy {
			ZeroPolicy::None => self.free.push(segment),
			ZeroPolicy::OnRelease => {
				segment.zero_fill();
				self.free.push(segment);
			}
			ZeroPolicy::Background => {
				let sender = global::zeroing_sender();
				zeroing::submit(sender, Box::new(RetireSegment { segment, target: &self.free }));
			}
		}
	}

	/// Releases many segments with one policy, as used by chain shrinkage.
	pub(crate) fn release_many(&'static self, segments: impl IntoIterator<Item = Segment>, policy: ZeroPolicy) {
		for seg in segments {
			self.release(seg, policy);
		}
	}

	/// Immediately returns every currently-free segment to the segment
	/// source, independent of the idle trimmer's own schedule and demand
	/// tracking.
	pub(crate) fn release_all_free(&'static self) {
		let drained = self.free.trim_idle(0, Duration::ZERO);
		for seg in &drained {
			global::record_segment_release(seg.source());
		}
	}

	pub(crate) fn trim(&'static self, keep: usize, older_than: Duration) {
		let trimmed = self.free.trim_idle(keep, older_than);
		for seg in &trimmed {
			global::record_segment_release(seg.source());
		}
	}

	/// Segments currently acquired by a live stream, neither free nor
	/// in flight to the zeroing worker. The trimmer's demand signal.
	pub(crate) fn in_use_count(&self) -> usize { self.in_use.load(Ordering::Relaxed) }
}

struct RetireSegment {
	segment: Segment,
	target: &'static Freelist<Segment>,
}

impl Retire for RetireSegment {
	fn zero_and_store(self: Box<Self>) {
		let Self { mut segment, target } = *self;
		segment.zero_fill();
		target.push(segment);
	}
}

