// SPDX-License-Identifier: Apache-2.0

use std::error;
use amplify_derive::Display;

/// The kinds of failure a stream or pool operation can surface.
///
/// These map 1:1 onto the error kinds a caller is expected to match on;
/// numeric/symbolic stability across versions is a documentation promise,
/// not an enforced one here.
#[derive(Copy, Clone, Debug, Display, Eq, PartialEq)]
pub enum ErrorKind {
	#[display("operation on a disposed stream")]
	Closed,
	#[display("argument out of range")]
	ArgumentOutOfRange,
	#[display("capacity would be set below the current length")]
	CapacityShrinkBelowLength,
	#[display("seek would move before the start of the stream")]
	SeekBeforeBegin,
	#[display("operation would exceed the maximum stream length")]
	StreamTooLong,
	#[display("operation is not supported in this stream's mode")]
	UnsupportedInThisMode,
	#[display("global setting is locked after first use")]
	SettingsLocked,
	#[display("segment or buffer allocation failed")]
	OutOfMemory,
}

#[derive(Debug, Display)]
#[display("{kind}")]
pub struct Error {
	kind: ErrorKind,
	source: Option<Box<dyn error::Error + Send + Sync + 'static>>,
}

impl error::Error for Error {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		self.source.as_ref().map(|s| s.as_ref() as &(dyn error::Error + 'static))
	}
}

impl Error {
	pub fn kind(&self) -> ErrorKind { self.kind }

	pub(crate) fn new(kind: ErrorKind) -> Self {
		Self { kind, source: None }
	}

	pub(crate) fn closed() -> Self { Self::new(ErrorKind::Closed) }
	pub(crate) fn argument_out_of_range() -> Self { Self::new(ErrorKind::ArgumentOutOfRange) }
	pub(crate) fn capacity_shrink_below_length() -> Self { Self::new(ErrorKind::CapacityShrinkBelowLength) }
	pub(crate) fn seek_before_begin() -> Self { Self::new(ErrorKind::SeekBeforeBegin) }
	pub(crate) fn stream_too_long() -> Self { Self::new(ErrorKind::StreamTooLong) }
	pub(crate) fn unsupported_in_this_mode() -> Self { Self::new(ErrorKind::UnsupportedInThisMode) }
	pub(crate) fn settings_locked() -> Self { Self::new(ErrorKind::SettingsLocked) }
	pub(crate) fn out_of_memory() -> Self { Self::new(ErrorKind::OutOfMemory) }
}

impl From<Error> for std::io::Error {
	fn from(value: Error) -> Self {
		use std::io::ErrorKind as IoKind;
		let io_kind = match value.kind {
			ErrorKind::Closed => IoKind::NotConnected,
			ErrorKind::ArgumentOutOfRange => IoKind::InvalidInput,
			ErrorKind::CapacityShrinkBelowLength => IoKind::InvalidInput,
			ErrorKind::SeekBeforeBegin => IoKind::InvalidInput,
			ErrorKind::StreamTooLong => IoKind::InvalidInput,
			ErrorKind::UnsupportedInThisMode => IoKind::Unsupported,
			ErrorKind::SettingsLocked => IoKind::Unsupported,
			ErrorKind::OutOfMemory => IoKind::OutOfMemory,
		};
		std::io::Error::new(io_kind, value)
	}
}

pub type Result<T = ()> = std::result::Result<T, Error>;
