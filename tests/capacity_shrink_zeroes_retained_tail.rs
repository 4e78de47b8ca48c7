// SPDX-License-Identifier: Apache-2.0

//! A capacity shrink must zero any retained segment's bytes that land
//! past the new capacity when the zero policy is background or
//! on-release, the same as bytes actually returned to a freelist get
//! zeroed. Kept in its own test binary since it relies on specific
//! segments flowing from one disposed instance into the next acquirer
//! through the process-global segment pool.

use std::io::Write;
use reservoir::{testing, MemoryStream, StreamOptions, ZeroPolicy, SEGMENT_SIZE};

#[test]
fn capacity_shrink_zeroes_retained_segments_past_new_capacity() {
	let leaky = StreamOptions::default().set_zero_policy(ZeroPolicy::None);
	let mut source = MemoryStream::with_options(leaky).unwrap();
	source.write_all(&[0xcdu8; 3 * SEGMENT_SIZE]).unwrap();
	source.dispose();

	let careful = StreamOptions::default().set_zero_policy(ZeroPolicy::Background);
	let mut stream = MemoryStream::with_options(careful).unwrap();
	stream.set_capacity(3 * SEGMENT_SIZE).unwrap();

	// The freelist hand-off doesn't zero anything by itself; confirm the
	// reused segments really do still carry the disposed instance's
	// bytes before exercising the shrink path below.
	let before = testing::peek_stream_capacity(&stream);
	assert!(before.iter().all(|&b| b == 0xcd));

	stream.set_capacity(SEGMENT_SIZE + 100).unwrap();

	let after = testing::peek_stream_capacity(&stream);
	assert_eq!(after.len(), 2 * SEGMENT_SIZE);
	assert!(
		after[..SEGMENT_SIZE + 100].iter().all(|&b| b == 0xcd),
		"bytes still within the new capacity are untouched by a shrink"
	);
	assert!(
		after[SEGMENT_SIZE + 100..].iter().all(|&b| b == 0),
		"bytes past the new capacity in a retained segment must be zeroed"
	);
}
