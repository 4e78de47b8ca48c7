// SPDX-License-Identifier: Apache-2.0

//! The stream state machine: an instance's storage is either empty, a
//! single small buffer, or a chain of fixed-size segments, with the
//! representation promoted as the instance grows. Every growth or
//! reshape acquires its new storage in full before touching `self`, so a
//! mid-grow allocation failure leaves the instance exactly as it was.

use std::collections::VecDeque;
use std::io::{self, SeekFrom};
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use crate::error::{Error, Result};
use crate::global;
use crate::options::StreamOptions;
use crate::pool::ZeroPolicy;
use crate::segment::{Segment, SEGMENT_SIZE};
use crate::small::{SmallBuffer, MAX_CLASS};

enum Storage {
	Empty,
	Small(SmallBuffer),
	Chained(VecDeque<Segment>),
}

impl Storage {
	fn capacity(&self) -> usize {
		match self {
			Storage::Empty => 0,
			Storage::Small(buf) => buf.len(),
			Storage::Chained(segs) => segs.len() * SEGMENT_SIZE,
		}
	}
}

/// The state machine backing [`MemoryStream`](crate::stream::MemoryStream).
/// Not part of the public surface: callers only ever see it through the
/// facade, which is what implements `Read`/`Write`/`Seek`.
pub(crate) struct Core {
	storage: Storage,
	length: usize,
	position: usize,
	options: StreamOptions,
	disposed: bool,
	id: u64,
}

impl Core {
	pub(crate) fn new(options: StreamOptions) -> Result<Self> {
		// Resolving the segment source latches it for the rest of the
		// process, even for an instance that never allocates - a caller
		// that wants to choose the source must do so before constructing
		// the first instance, not before that instance's first write.
		global::source_kind();
		let mut core = Self {
			storage: Storage::Empty,
			length: 0,
			position: 0,
			options,
			disposed: false,
			id: global::next_instance_id(),
		};
		if options.initial_capacity() > 0 {
			core.set_capacity(options.initial_capacity())?;
		}
		global::instance_created();
		Ok(core)
	}

	pub(crate) fn id(&self) -> u64 { self.id }
	pub(crate) fn length(&self) -> usize { self.length }
	pub(crate) fn position(&self) -> usize { self.position }
	pub(crate) fn capacity(&self) -> usize { self.storage.capacity() }
	pub(crate) fn is_disposed(&self) -> bool { self.disposed }

	fn ensure_open(&self) -> Result<()> {
		if self.disposed { Err(Error::closed()) } else { Ok(()) }
	}

	pub(crate) fn set_capacity(&mut self, new_capacity: usize) -> Result<()> {
		self.ensure_open()?;
		if new_capacity == self.storage.capacity() {
			return Ok(());
		}
		if new_capacity < self.length {
			return Err(Error::capacity_shrink_below_length());
		}
		if new_capacity > self.options.max_capacity() {
			return Err(Error::argument_out_of_range());
		}
		self.reshape(new_capacity)
	}

	pub(crate) fn set_length(&mut self, new_length: usize) -> Result<()> {
		self.ensure_open()?;
		if new_length > self.options.max_capacity() {
			return Err(Error::stream_too_long());
		}
		if new_length > self.storage.capacity() {
			self.reshape(new_length)?;
		}
		if new_length > self.length {
			let gap_start = self.length;
			self.zero_range(gap_start, new_length - gap_start);
		} else if new_length < self.length {
			self.zero_range(new_length, self.length - new_length);
		}
		self.length = new_length;
		Ok(())
	}

	pub(crate) fn seek(&mut self, from: SeekFrom) -> Result<u64> {
		self.ensure_open()?;
		let base = match from {
			SeekFrom::Start(offset) => offset as i128,
			SeekFrom::Current(offset) => self.position as i128 + offset as i128,
			SeekFrom::End(offset) => self.length as i128 + offset as i128,
		};
		if base < 0 {
			return Err(Error::seek_before_begin());
		}
		if base as u128 > self.options.max_capacity() as u128 {
			return Err(Error::stream_too_long());
		}
		self.position = base as usize;
		Ok(self.position as u64)
	}

	pub(crate) fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
		self.ensure_open()?;
		if self.position >= self.length {
			return Ok(0);
		}
		let available = self.length - self.position;
		let n = buf.len().min(available);
		self.read_range(self.position, &mut buf[..n]);
		self.position += n;
		Ok(n)
	}

	pub(crate) fn write(&mut self, data: &[u8]) -> Result<usize> {
		self.ensure_open()?;
		if data.is_empty() {
			return Ok(0);
		}
		let end = self.position.checked_add(data.len()).ok_or_else(Error::stream_too_long)?;
		if end > self.options.max_capacity() {
			return Err(Error::stream_too_long());
		}
		if end > self.storage.capacity() {
			self.reshape(end)?;
		}
		if self.position > self.length {
			let gap_start = self.length;
			self.zero_range(gap_start, self.position - gap_start);
		}
		self.write_range(self.position, data);
		self.position = end;
		self.length = self.length.max(end);
		Ok(data.len())
	}

	/// Copies all `length` bytes from the start of the stream into a
	/// freshly allocated, tightly sized `Vec<u8>`, without disturbing
	/// `position`.
	pub(crate) fn to_contiguous_copy(&self) -> Vec<u8> {
		let mut out = vec![0u8; self.length];
		self.read_range(0, &mut out);
		out
	}

	/// Copies the full `capacity()` region, including any bytes beyond
	/// `length` that a normal read can never observe. A test-only escape
	/// hatch for inspecting what a freshly acquired or recycled segment
	/// actually contains before anything writes to it.
	pub(crate) fn peek_capacity(&self) -> Vec<u8> {
		let mut out = vec![0u8; self.storage.capacity()];
		copy_from_storage(&self.storage, 0, &mut out);
		out
	}

	/// Writes everything from the current position to the end of the
	/// stream, advancing position to `length`. Mirrors `Stream.CopyTo`.
	pub(crate) fn copy_to(&mut self, writer: &mut impl io::Write) -> io::Result<u64> {
		let mut written = 0u64;
		while self.position < self.length {
			let chunk_len = (self.length - self.position).min(SEGMENT_SIZE);
			let mut chunk = vec![0u8; chunk_len];
			self.read_range(self.position, &mut chunk);
			writer.write_all(&chunk)?;
			self.position += chunk_len;
			written += chunk_len as u64;
		}
		Ok(written)
	}

	/// As [`copy_to`](Self::copy_to), but cooperatively cancellable and
	/// writing through an async sink. A cancellation mid-copy ends the
	/// copy early and returns the bytes written so far rather than an
	/// error: the caller asked to stop, not to fail.
	pub(crate) async fn copy_to_async(
		&mut self,
		writer: &mut (impl AsyncWrite + Unpin),
		cancel: &CancellationToken,
	) -> io::Result<u64> {
		use tokio::io::AsyncWriteExt;
		let mut written = 0u64;
		while self.position < self.length {
			if cancel.is_cancelled() {
				break;
			}
			let chunk_len = (self.length - self.position).min(SEGMENT_SIZE);
			let mut chunk = vec![0u8; chunk_len];
			self.read_range(self.position, &mut chunk);
			writer.write_all(&chunk).await?;
			self.position += chunk_len;
			written += chunk_len as u64;
		}
		Ok(written)
	}

	/// Releases any held storage back to its pool and marks the instance
	/// disposed. Idempotent; safe to call more than once.
	pub(crate) fn dispose(&mut self) {
		if self.disposed {
			return;
		}
		self.disposed = true;
		let policy = self.options.zero_policy();
		match std::mem::replace(&mut self.storage, Storage::Empty) {
			Storage::Empty => {}
			Storage::Small(buf) => global::small_pool().release(buf, policy),
			Storage::Chained(segs) => global::segment_pool().release_many(segs, policy),
		}
		global::instance_disposed();
	}

	/// Grows, shrinks, or promotes storage to exactly `new_capacity`,
	/// acquiring every new segment/buffer before releasing anything the
	/// instance currently holds. Once promoted to a segment chain, an
	/// instance never demotes back to a small buffer on shrink - only its
	/// segment count changes - to avoid copying on every oscillation
	/// around the small/chained boundary.
	fn reshape(&mut self, new_capacity: usize) -> Result<()> {
		let policy = self.options.zero_policy();
		let old = std::mem::replace(&mut self.storage, Storage::Empty);
		if new_capacity == 0 {
			release_storage(old, policy);
			return Ok(());
		}
		match old {
			Storage::Chained(mut segments) => {
				let target_count = new_capacity.div_ceil(SEGMENT_SIZE);
				if target_count > segments.len() {
					match global::segment_pool().acquire_many(target_count - segments.len(), policy) {
						Ok(additional) => segments.extend(additional),
						Err(err) => {
							self.storage = Storage::Chained(segments);
							return Err(err);
						}
					}
				} else if target_count < segments.len() {
					let mut removed = Vec::with_capacity(segments.len() - target_count);
					while segments.len() > target_count {
						removed.push(segments.pop_back().expect("len checked above"));
					}
					global::segment_pool().release_many(removed, policy);
					// The retained segments may still hold capacity past
					// `new_capacity` up to the new segment-count boundary;
					// those bytes stay part of the chain rather than going
					// through a freelist, so the zero policy is applied to
					// them here directly instead of via `Retire`.
					if policy != ZeroPolicy::None {
						let retained_capacity = target_count * SEGMENT_SIZE;
						if new_capacity < retained_capacity {
							let zeros = vec![0u8; retained_capacity - new_capacity];
							copy_into_chain(&mut segments, new_capacity, &zeros);
						}
					}
				}
				self.storage = Storage::Chained(segments);
				Ok(())
			}
			old if new_capacity <= MAX_CLASS => {
				let class = crate::small::class_for(new_capacity).expect("cap <= MAX_CLASS has a class");
				let mut fresh = match global::small_pool().acquire(class) {
					Ok(fresh) => fresh,
					Err(err) => {
						self.storage = old;
						return Err(err);
					}
				};
				let to_copy = self.length.min(fresh.len());
				copy_from_storage(&old, 0, &mut fresh[..to_copy]);
				release_storage(old, policy);
				self.storage = Storage::Small(fresh);
				Ok(())
			}
			old => {
				let target_count = new_capacity.div_ceil(SEGMENT_SIZE);
				let fresh = match global::segment_pool().acquire_many(target_count, policy) {
					Ok(fresh) => fresh,
					Err(err) => {
						self.storage = old;
						return Err(err);
					}
				};
				let mut fresh: VecDeque<Segment> = fresh.into();
				let to_copy = self.length.min(new_capacity);
				let mut snapshot = vec![0u8; to_copy];
				copy_from_storage(&old, 0, &mut snapshot);
				copy_into_chain(&mut fresh, 0, &snapshot);
				release_storage(old, policy);
				self.storage = Storage::Chained(fresh);
				Ok(())
			}
		}
	}

	fn read_range(&self, offset: usize, buf: &mut [u8]) {
		copy_from_storage(&self.storage, offset, buf);
	}

	fn write_range(&mut self, offset: usize, data: &[u8]) {
		match &mut self.storage {
			Storage::Empty => debug_assert!(data.is_empty()),
			Storage::Small(buf) => buf[offset..offset + data.len()].copy_from_slice(data),
			Storage::Chained(segments) => copy_into_chain(segments, offset, data),
		}
	}

	fn zero_range(&mut self, offset: usize, len: usize) {
		if len == 0 {
			return;
		}
		match &mut self.storage {
			Storage::Empty => {}
			Storage::Small(buf) => buf[offset..offset + len].fill(0),
			Storage::Chained(segments) => {
				let zeros = vec![0u8; len];
				copy_into_chain(segments, offset, &zeros);
			}
		}
	}
}

impl Drop for Core {
	fn drop(&mut self) {
		self.dispose();
	}
}

fn release_storage(storage: Storage, policy: ZeroPolicy) {
	match storage {
		Storage::Empty => {}
		Storage::Small(buf) => global::small_pool().release(buf, policy),
		Storage::Chained(segs) => global::segment_pool().release_many(segs, policy),
	}
}

fn copy_from_storage(storage: &Storage, offset: usize, buf: &mut [u8]) {
	match storage {
		Storage::Empty => debug_assert!(buf.is_empty()),
		Storage::Small(data) => buf.copy_from_slice(&data[offset..offset + buf.len()]),
		Storage::Chained(segments) => copy_from_chain(segments, offset, buf),
	}
}

fn copy_from_chain(segments: &VecDeque<Segment>, offset: usize, buf: &mut [u8]) {
	let mut remaining = buf;
	let mut pos = offset;
	while !remaining.is_empty() {
		let seg_index = pos / SEGMENT_SIZE;
		let seg_offset = pos % SEGMENT_SIZE;
		let seg = &segments[seg_index];
		let take = remaining.len().min(SEGMENT_SIZE - seg_offset);
		remaining[..take].copy_from_slice(&seg[seg_offset..seg_offset + take]);
		remaining = &mut remaining[take..];
		pos += take;
	}
}

fn copy_into_chain(segments: &mut VecDeque<Segment>, offset: usize, data: &[u8]) {
	let mut remaining = data;
	let mut pos = offset;
	while !remaining.is_empty() {
		let seg_index = pos / SEGMENT_SIZE;
		let seg_offset = pos % SEGMENT_SIZE;
		let seg = &mut segments[seg_index];
		let take = remaining.len().min(SEGMENT_SIZE - seg_offset);
		seg[seg_offset..seg_offset + take].copy_from_slice(&remaining[..take]);
		remaining = &remaining[take..];
		pos += take;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::options::StreamOptions;

	fn core() -> Core { Core::new(StreamOptions::default()).unwrap() }

	#[test]
	fn write_then_read_round_trips() {
		let mut c = core();
		c.write(b"hello world").unwrap();
		c.seek(SeekFrom::Start(0)).unwrap();
		let mut buf = [0u8; 11];
		assert_eq!(c.read(&mut buf).unwrap(), 11);
		assert_eq!(&buf, b"hello world");
	}

	#[test]
	fn promotes_small_to_chained_past_max_class() {
		let mut c = core();
		let data = vec![7u8; MAX_CLASS + 1024];
		c.write(&data).unwrap();
		assert!(matches!(c.storage, Storage::Chained(_)));
		assert_eq!(c.length(), data.len());
	}

	#[test]
	fn sparse_write_zero_fills_gap() {
		let mut c = core();
		c.seek(SeekFrom::Start(10)).unwrap();
		c.write(b"x").unwrap();
		c.seek(SeekFrom::Start(0)).unwrap();
		let mut buf = [0u8; 11];
		c.read(&mut buf).unwrap();
		assert_eq!(&buf[..10], &[0u8; 10]);
		assert_eq!(buf[10], b'x');
	}

	#[test]
	fn shrink_then_regrow_reads_zero() {
		let mut c = core();
		c.write(&[9u8; 256]).unwrap();
		c.set_length(16).unwrap();
		c.set_length(256).unwrap();
		let mut buf = vec![0u8; 256];
		c.seek(SeekFrom::Start(0)).unwrap();
		c.read(&mut buf).unwrap();
		assert_eq!(buf, vec![0u8; 256]);
	}

	#[test]
	fn set_capacity_rejects_shrink_below_length() {
		let mut c = core();
		c.write(&[1u8; 64]).unwrap();
		assert_eq!(
			c.set_capacity(4).unwrap_err().kind(),
			crate::error::ErrorKind::CapacityShrinkBelowLength,
		);
	}

	#[test]
	fn seek_before_start_errors() {
		let mut c = core();
		assert_eq!(
			c.seek(SeekFrom::Current(-1)).unwrap_err().kind(),
			crate::error::ErrorKind::SeekBeforeBegin,
		);
	}

	#[test]
	fn rollback_leaves_instance_unchanged_on_allocation_failure() {
		let mut c = core();
		c.write(&[1u8; 64]).unwrap();
		global::inject_allocation_failures(1);
		let before_cap = c.capacity();
		let err = c.set_capacity(before_cap + SEGMENT_SIZE * 4).unwrap_err();
		assert_eq!(err.kind(), crate::error::ErrorKind::OutOfMemory);
		assert_eq!(c.capacity(), before_cap);
		assert_eq!(c.length(), 64);
	}
}
