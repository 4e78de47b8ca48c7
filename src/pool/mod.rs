// SPDX-License-Identifier: Apache-2.0

//! Recycling pools. [`SegmentPool`] and [`SmallBufferPool`] share the same
//! freelist-plus-idle-timestamp bookkeeping (see [`Freelist`]), the way the
//! teacher crate factors its segment container out from its concrete pool.

pub(crate) mod segment_pool;
pub(crate) mod small_pool;

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How a retired buffer is cleared before it becomes observable on its
/// freelist again.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum ZeroPolicy {
	/// Don't clear; the next acquirer may observe prior contents.
	None,
	/// Clear asynchronously on the zeroing worker before the buffer is
	/// inserted into its freelist.
	#[default]
	Background,
	/// Clear synchronously on the releasing thread before insertion.
	OnRelease,
}

/// A retirement job: zero a buffer, then hand it back to the freelist it
/// came from. Boxed as a trait object so the zeroing worker's channel can
/// carry jobs for both segments and small buffers of any class.
pub(crate) trait Retire: Send + 'static {
	fn zero_and_store(self: Box<Self>);
}

struct Entry<T> {
	value: T,
	idle_since: Instant,
}

/// An unordered set of free entries of one size class, LIFO for locality,
/// each carrying the timestamp at which it became idle.
pub(crate) struct Freelist<T> {
	entries: Mutex<VecDeque<Entry<T>>>,
}

impl<T> Default for Freelist<T> {
	fn default() -> Self {
		Self { entries: Mutex::new(VecDeque::new()) }
	}
}

impl<T> Freelist<T> {
	pub(crate) fn pop(&self) -> Option<T> {
		self.entries
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.pop_back()
			.map(|e| e.value)
	}

	pub(crate) fn push(&self, value: T) {
		self.entries
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.push_back(Entry { value, idle_since: Instant::now() });
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
	}

	/// Removes entries beyond `keep` whose idle time exceeds `older_than`,
	/// returning them for release back to the segment source. Entries are
	/// removed oldest-first so the freshest, most locality-friendly
	/// entries are kept.
	pub(crate) fn trim_idle(&self, keep: usize, older_than: Duration) -> Vec<T> {
		let now = Instant::now();
		let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
		let mut trimmed = Vec::new();
		while entries.len() > keep {
			let Some(front) = entries.front() else { break };
			if now.duration_since(front.idle_since) < older_than {
				break;
			}
			trimmed.push(entries.pop_front().unwrap().value);
		}
		trimmed
	}
}
