// SPDX-License-Identifier: Apache-2.0

//! The managed segment source (Rust's global allocator) hands out
//! zero-initialized memory even before the pool's own zero-fill policy
//! ever runs.

use reservoir::{testing, SourceKind};

#[test]
fn managed_source_segments_start_zeroed() {
	let segment = testing::raw_segment_preview(SourceKind::Managed);
	assert!(segment.iter().all(|&b| b == 0));
}
