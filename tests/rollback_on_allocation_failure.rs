// SPDX-License-Identifier: Apache-2.0

//! Forcing a segment-source allocation to fail partway through a grow
//! must leave the stream exactly as it was - no partial chain, no
//! changed capacity or length. Kept in its own test binary since the
//! failure injection counter is process-global.

use std::io::Write;
use reservoir::{testing, MemoryStream};

#[test]
fn failed_allocation_leaves_the_stream_unchanged() {
	let mut stream = MemoryStream::new().unwrap();
	stream.write_all(&[1u8; 64]).unwrap();
	let capacity_before = stream.capacity();
	let length_before = stream.len();

	testing::inject_allocation_failures(1);
	// A grow big enough to need several fresh segments, so the injected
	// failure is certain to land inside this call rather than being
	// absorbed by a freelist hit.
	let big = capacity_before + reservoir::SEGMENT_SIZE * 8;
	let err = stream.set_capacity(big);

	assert!(err.is_err());
	assert_eq!(stream.capacity(), capacity_before);
	assert_eq!(stream.len(), length_before);
}
