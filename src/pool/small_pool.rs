// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use crate::error::{Error, Result};
use crate::global;
use crate::pool::{Freelist, Retire, ZeroPolicy};
use crate::small::{class_size, SmallBuffer, CLASS_COUNT};
use crate::zeroing;

/// Pool of small, power-of-two buffers. One freelist per size class, each
/// managed independently so contention on one class never blocks another.
pub(crate) struct SmallBufferPool {
	classes: [Freelist<SmallBuffer>; CLASS_COUNT],
	in_use: [AtomicUsize; CLASS_COUNT],
}

impl SmallBufferPool {
	pub(crate) fn new() -> Self {
		Self {
			classes: std::array::from_fn(|_| Freelist::default()),
			in_use: std::array::from_fn(|_| AtomicUsize::new(0)),
		}
	}

	pub(crate) fn acquire(&'static self, class: usize) -> Result<SmallBuffer> {
		if let Some(buf) = self.classes[class].pop() {
			self.in_use[class].fetch_add(1, Ordering::Relaxed);
			return Ok(buf);
		}
		if global::take_injected_failure() {
			return Err(Error::out_of_memory());
		}
		let source = global::source_kind();
		let buf = SmallBuffer::alloc(source, class).ok_or_else(Error::out_of_memory)?;
		global::record_small_alloc(class_size(class));
		self.in_use[class].fetch_add(1, Ordering::Relaxed);
		Ok(buf)
	}

	pub(crate) fn release(&'static self, mut buf: SmallBuffer, policy: ZeroPolicy) {
		let class = buf.class();
		self.in_use[class].fetch_sub(1, Ordering::Relaxed);
		match policy {
			ZeroPolicy::None => self.classes[class].push(buf),
			ZeroPolicy::OnRelease => {
				buf.zero_fill();
				self.classes[class].push(buf);
			}
			ZeroPolicy::Background => {
				let sender = global::zeroing_sender();
				zeroing::submit(sender, Box::new(RetireSmall { buf, target: &self.classes[class] }));
			}
		}
	}

	pub(crate) fn release_all_free(&'static self) {
		for class in &self.classes {
			let drained = class.trim_idle(0, Duration::ZERO);
			global::record_small_release(drained.len());
		}
	}

	pub(crate) fn trim_class(&'static self, class: usize, keep: usize, older_than: Duration) {
		let trimmed = self.classes[class].trim_idle(keep, older_than);
		global::record_small_release(trimmed.len());
	}

	/// Buffers of `class` currently acquired by a live stream. The
	/// trimmer's demand signal for that class.
	pub(crate) fn in_use_count(&self, class: usize) -> usize { self.in_use[class].load(Ordering::Relaxed) }
}

struct RetireSmall {
	buf: SmallBuffer,
	target: &'static Freelist<SmallBuffer>,
}

impl Retire for RetireSmall {
	fn zero_and_store(self: Box<Self>) {
		let Self { mut buf, target } = *self;
		buf.zero_fill();
		target.push(buf);
	}
}
