// SPDX-License-Identifier: Apache-2.0

//! A thin, non-pooled adapter over a caller-supplied buffer. Useful when
//! a caller already owns a buffer (e.g. `bytes::BytesMut`, a memory-mapped
//! region) and wants the same `Read`/`Write`/`Seek` surface as
//! [`MemoryStream`](crate::stream::MemoryStream) without routing anything
//! through the recycling pools. It never grows past the buffer it was
//! given and never contacts the pools, the zeroing worker, or the
//! trimmer.

use std::io::{self, Read, Seek, SeekFrom, Write};

/// Wraps `buffer` for sequential or random-access reads and writes,
/// bounded by `buffer.len()`. Writing past the end returns an
/// `ArgumentOutOfRange`-flavored `UnexpectedEof`, mirroring a fixed-size
/// `std::io::Cursor` rather than a growable stream.
pub fn create_wrapping(buffer: Vec<u8>) -> FixedStream {
	FixedStream { buffer, position: 0 }
}

/// The fixed-capacity stream returned by [`create_wrapping`].
pub struct FixedStream {
	buffer: Vec<u8>,
	position: usize,
}

impl FixedStream {
	/// The fixed capacity this stream was created with.
	pub fn capacity(&self) -> usize { self.buffer.len() }

	/// Returns the wrapped buffer, consuming the stream.
	pub fn into_inner(self) -> Vec<u8> { self.buffer }
}

impl Read for FixedStream {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		let available = self.buffer.len().saturating_sub(self.position);
		let n = buf.len().min(available);
		buf[..n].copy_from_slice(&self.buffer[self.position..self.position + n]);
		self.position += n;
		Ok(n)
	}
}

impl Write for FixedStream {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		let available = self.buffer.len().saturating_sub(self.position);
		if buf.len() > available {
			return Err(io::Error::new(
				io::ErrorKind::WriteZero,
				"write would exceed a fixed stream's wrapped capacity",
			));
		}
		self.buffer[self.position..self.position + buf.len()].copy_from_slice(buf);
		self.position += buf.len();
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

impl Seek for FixedStream {
	fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
		let base = match pos {
			SeekFrom::Start(offset) => offset as i128,
			SeekFrom::Current(offset) => self.position as i128 + offset as i128,
			SeekFrom::End(offset) => self.buffer.len() as i128 + offset as i128,
		};
		if base < 0 || base as u128 > self.buffer.len() as u128 {
			return Err(io::Error::new(io::ErrorKind::InvalidInput, "seek out of bounds"));
		}
		self.position = base as usize;
		Ok(self.position as u64)
	}
}
