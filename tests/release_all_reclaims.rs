// SPDX-License-Identifier: Apache-2.0

//! `release_all_free_buffers` should hand every currently-idle pooled
//! segment back to the segment source immediately, without waiting for
//! the idle trimmer's next pass. Kept in its own test binary since the
//! segment-source gauges are process-global.

use std::io::Write;
use reservoir::{managed_segment_count, release_all_free_buffers, MemoryStream, StreamOptions, ZeroPolicy, SEGMENT_SIZE};

#[test]
fn release_all_free_buffers_reclaims_disposed_segments() {
	let baseline = managed_segment_count();

	let options = StreamOptions::default().set_zero_policy(ZeroPolicy::OnRelease);
	let mut stream = MemoryStream::with_options(options).unwrap();
	stream.write_all(&[0x42u8; SEGMENT_SIZE * 4]).unwrap();
	assert!(managed_segment_count() >= baseline + 4);

	stream.dispose();
	// Still allocated from the source, just idle in the pool.
	assert!(managed_segment_count() >= baseline + 4);

	release_all_free_buffers();
	assert_eq!(managed_segment_count(), baseline);
}
