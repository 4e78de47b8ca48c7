// SPDX-License-Identifier: Apache-2.0

//! Raw, fixed-size memory regions backing [`Segment`](crate::segment::Segment)
//! and [`SmallBuffer`](crate::small::SmallBuffer). A region is sourced from
//! either the Rust global allocator ("managed") or directly from the OS
//! heap via `libc::malloc` ("native"), matching whichever
//! [`SourceKind`](crate::source::SourceKind) is latched process-wide.

use std::ptr::NonNull;
use std::slice;
use crate::source::SourceKind;

struct NativeBlock {
	ptr: NonNull<u8>,
	len: usize,
}

// SAFETY: the region is exclusively owned by whichever `RawBlock` holds
// this value; no other handle observes the pointer while it's in flight
// between a Core and a pool.
unsafe impl Send for NativeBlock {}

impl NativeBlock {
	fn alloc(len: usize) -> Option<Self> {
		if len == 0 {
			return Some(Self { ptr: NonNull::dangling(), len: 0 });
		}
		// SAFETY: len is nonzero; malloc's return value is checked below.
		let raw = unsafe { libc::malloc(len) } as *mut u8;
		NonNull::new(raw).map(|ptr| Self { ptr, len })
	}
}

impl Drop for NativeBlock {
	fn drop(&mut self) {
		if self.len == 0 { return; }
		// SAFETY: ptr was returned by a matching libc::malloc and is not
		// freed anywhere else.
		unsafe { libc::free(self.ptr.as_ptr() as *mut libc::c_void) };
	}
}

/// A fixed-size, owned chunk of raw memory, sourced from either Rust's
/// allocator or the OS heap.
pub(crate) enum RawBlock {
	Managed(Box<[u8]>),
	Native(NativeBlock),
}

impl RawBlock {
	/// Allocates a new block of `len` bytes from `source`. Returns `None`
	/// on allocation failure (native source only; the managed source
	/// aborts on the Rust allocator's own OOM path, as is normal for
	/// `Box`/`Vec`).
	pub(crate) fn alloc(source: SourceKind, len: usize) -> Option<Self> {
		match source {
			SourceKind::Managed => Some(Self::Managed(vec![0u8; len].into_boxed_slice())),
			SourceKind::Native => NativeBlock::alloc(len).map(Self::Native),
		}
	}

	pub(crate) fn source(&self) -> SourceKind {
		match self {
			Self::Managed(_) => SourceKind::Managed,
			Self::Native(_) => SourceKind::Native,
		}
	}

	pub(crate) fn len(&self) -> usize {
		match self {
			Self::Managed(b) => b.len(),
			Self::Native(n) => n.len,
		}
	}

	pub(crate) fn as_slice(&self) -> &[u8] {
		match self {
			Self::Managed(b) => b,
			// SAFETY: ptr/len describe a single allocation owned by self,
			// valid for the lifetime of this borrow.
			Self::Native(n) => unsafe { slice::from_raw_parts(n.ptr.as_ptr(), n.len) },
		}
	}

	pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
		match self {
			Self::Managed(b) => b,
			// SAFETY: as above, exclusive borrow.
			Self::Native(n) => unsafe { slice::from_raw_parts_mut(n.ptr.as_ptr(), n.len) },
		}
	}

	pub(crate) fn zero_fill(&mut self) {
		self.as_mut_slice().fill(0);
	}
}
