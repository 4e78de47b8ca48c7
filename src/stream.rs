// SPDX-License-Identifier: Apache-2.0

//! The public pooled stream type. Wraps [`Core`] and implements the
//! standard `Read`/`Write`/`Seek` traits plus a handful of named
//! operations the standard traits don't cover (capacity/length
//! management, bulk copy-out, disposal).

use std::io::{self, Read, Seek, SeekFrom, Write};
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use crate::core::Core;
use crate::error::Result;
use crate::global;
use crate::options::StreamOptions;

/// A growable, segment-backed byte stream whose storage is recycled
/// through the process-wide pools on disposal rather than freed and
/// reallocated on every use.
pub struct MemoryStream {
	core: Core,
}

impl MemoryStream {
	/// Creates a stream using the process-wide default options.
	pub fn new() -> Result<Self> {
		Self::with_options(global::default_options())
	}

	/// Creates a stream with its own options, independent of the process
	/// default.
	pub fn with_options(options: StreamOptions) -> Result<Self> {
		Ok(Self { core: Core::new(options)? })
	}

	/// The unique id assigned to this instance at construction, useful
	/// for correlating log lines with a specific stream.
	pub fn id(&self) -> u64 { self.core.id() }

	/// Number of bytes written so far (the logical end of the stream).
	pub fn len(&self) -> usize { self.core.length() }

	/// Whether the stream currently holds no bytes.
	pub fn is_empty(&self) -> bool { self.core.length() == 0 }

	/// Current reserved storage, always `>= len()`.
	pub fn capacity(&self) -> usize { self.core.capacity() }

	/// Reserves exactly `capacity` bytes of storage, reshaping the
	/// backing representation as needed. Errors if `capacity` is less
	/// than [`len`](Self::len).
	pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
		self.core.set_capacity(capacity)
	}

	/// Truncates or extends the logical length. Extending zero-fills the
	/// new region; truncating zero-fills the bytes being dropped so they
	/// never reappear un-zeroed if the stream grows again later.
	pub fn set_len(&mut self, len: usize) -> Result<()> {
		self.core.set_length(len)
	}

	/// Copies the full contents into a new, tightly sized `Vec<u8>`
	/// without disturbing the current read/write position.
	pub fn to_vec(&self) -> Vec<u8> {
		self.core.to_contiguous_copy()
	}

	/// Writes everything from the current position through the end of
	/// the stream into `writer`, advancing the position to the end.
	pub fn copy_to(&mut self, writer: &mut impl Write) -> io::Result<u64> {
		self.core.copy_to(writer)
	}

	/// As [`copy_to`](Self::copy_to), but asynchronous and cooperatively
	/// cancellable via `cancel`.
	pub async fn copy_to_async(
		&mut self,
		writer: &mut (impl AsyncWrite + Unpin),
		cancel: &CancellationToken,
	) -> io::Result<u64> {
		self.core.copy_to_async(writer, cancel).await
	}

	/// Releases this instance's storage back to its pool immediately.
	/// Safe to call more than once; the stream becomes unusable (every
	/// operation returns the `closed` error) once disposed.
	pub fn dispose(&mut self) {
		self.core.dispose();
	}

	/// Whether [`dispose`](Self::dispose) has already been called.
	pub fn is_disposed(&self) -> bool {
		self.core.is_disposed()
	}

	pub(crate) fn peek_capacity(&self) -> Vec<u8> {
		self.core.peek_capacity()
	}
}

impl Default for MemoryStream {
	fn default() -> Self {
		Self::new().expect("default stream options should never fail to construct")
	}
}

impl Read for MemoryStream {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.core.read(buf).map_err(Into::into)
	}
}

impl Write for MemoryStream {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.core.write(buf).map_err(Into::into)
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl Seek for MemoryStream {
	fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
		self.core.seek(pos).map_err(Into::into)
	}
}
