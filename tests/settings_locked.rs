// SPDX-License-Identifier: Apache-2.0

//! The segment source is a one-shot, process-wide setting: it can only
//! be changed before the first stream instance is ever constructed. Kept
//! in its own test binary so no other test's instance creation races
//! with the assertion below.

use reservoir::{set_segment_source, ErrorKind, MemoryStream, SourceKind};

#[test]
fn set_segment_source_fails_once_an_instance_exists() {
	let _stream = MemoryStream::new().unwrap();

	let err = set_segment_source(SourceKind::Native).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::SettingsLocked);
}
