// SPDX-License-Identifier: Apache-2.0

//! The segment source: the raw-memory provider selected once, process-wide,
//! before the first segment or small buffer is allocated.

use std::fmt;

/// Which raw-memory provider backs every segment and small buffer.
///
/// Selection is a one-shot, process-wide toggle (see
/// [`crate::global::set_segment_source`]); mixing sources within one pool
/// would require per-entry release-path bookkeeping for no real benefit,
/// so changing it after the first allocation fails with `settings-locked`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum SourceKind {
	/// Regions come from Rust's global allocator, zero-initialized.
	#[default]
	Managed,
	/// Regions come from the OS heap via `libc::malloc`, uninitialized.
	Native,
}

impl fmt::Display for SourceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Managed => f.write_str("managed"),
			Self::Native => f.write_str("native"),
		}
	}
}
