// SPDX-License-Identifier: Apache-2.0

//! Hooks for exercising behavior that's otherwise only observable from
//! inside the allocator: forcing the next allocation(s) to fail, and
//! peeking at what a freshly sourced segment actually contains before
//! anything has written to it.

use crate::global;
use crate::segment::{Segment, SEGMENT_SIZE};
use crate::source::SourceKind;
use crate::stream::MemoryStream;

/// Forces the next `count` segment/small-buffer allocations that miss
/// their freelist to fail with `out-of-memory`. Freelist hits are
/// unaffected, since the point is to exercise the rollback path on a
/// real source failure, not to make every call fail.
pub fn inject_allocation_failures(count: usize) {
	global::inject_allocation_failures(count);
}

/// Allocates one segment directly from `source`, bypassing the pool and
/// any zero-fill policy, and returns its raw contents. Lets a test assert
/// that the managed source hands out zeroed memory while the native
/// source does not promise it.
pub fn raw_segment_preview(source: SourceKind) -> Vec<u8> {
	let segment = Segment::alloc(source).expect("test allocation should not fail");
	segment_bytes(&segment)
}

fn segment_bytes(segment: &Segment) -> Vec<u8> {
	let mut out = vec![0u8; SEGMENT_SIZE];
	out.copy_from_slice(segment);
	out
}

/// Returns the full `capacity()` region of `stream`, including bytes
/// beyond `len()` that a normal read can never observe. Lets a test
/// confirm a freshly acquired or recycled segment's contents before
/// anything has been written to it.
pub fn peek_stream_capacity(stream: &MemoryStream) -> Vec<u8> {
	stream.peek_capacity()
}
