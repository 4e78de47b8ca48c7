// SPDX-License-Identifier: Apache-2.0

//! ## How it works
//!
//! Data lives in reusable chunks of memory: fixed 64 KiB *segments* for
//! anything of meaningful size, and smaller power-of-two *small buffers*
//! (128 B up to 32 KiB) for streams that never grow past that. When a
//! [`MemoryStream`] is disposed, its storage goes back to the matching
//! pool instead of being freed, so the next stream that needs the same
//! shape of storage can reuse it without touching the allocator.
//!
//! ### Segments and small buffers
//!
//! A stream starts out empty, holding nothing. Its first write claims
//! either a single small buffer (if the write fits in one) or a chain of
//! segments (otherwise) from the process-wide pools, allocating fresh
//! ones from the segment source only when the pools are empty. A stream
//! that outgrows its small buffer is promoted to a segment chain; a
//! segment chain never demotes back down, it only grows or shrinks in
//! whole segments.
//!
//! Every growth or shrink acquires all the new storage it needs before
//! touching anything the stream already holds, so a mid-grow allocation
//! failure leaves the stream exactly as it was before the call.
//!
//! ### Zeroing
//!
//! A released buffer's old contents can be cleared before it becomes
//! visible to the next caller, controlled per-stream by
//! [`StreamOptions::set_zero_policy`]. The default hands the work to a
//! single background task and falls back to zeroing on the releasing
//! thread only if that task's queue is full.
//!
//! ### Trimming
//!
//! A background task periodically prunes each pool's freelist back
//! toward its recent high-water mark, releasing long-idle excess to the
//! segment source so a burst of large streams doesn't permanently
//! reserve memory the process no longer needs.
//!
//! ### Segment sources
//!
//! Segments and small buffers are sourced either from Rust's global
//! allocator (`managed`, zero-initialized) or directly from the OS heap
//! via `malloc`/`free` (`native`, uninitialized). The source is chosen
//! once, process-wide, by [`set_segment_source`] before the first stream
//! is created; later calls fail with the `settings-locked` error.

mod core;
mod error;
mod fixed;
mod global;
mod memory;
mod options;
mod pool;
mod segment;
mod small;
mod source;
mod stream;
pub mod testing;
mod trimmer;
mod zeroing;

pub use error::{Error, ErrorKind, Result};
pub use fixed::{create_wrapping, FixedStream};
pub use global::{
	live_instance_count, managed_segment_count, native_segment_count,
	release_all_free_buffers, set_default_options, set_segment_source,
};
pub use options::StreamOptions;
pub use pool::ZeroPolicy;
pub use segment::SEGMENT_SIZE;
pub use small::{CLASS_COUNT, MAX_CLASS, MIN_CLASS};
pub use source::SourceKind;
pub use stream::MemoryStream;
