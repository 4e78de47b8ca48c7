// SPDX-License-Identifier: Apache-2.0

//! Process-wide state: the latched segment source, default per-instance
//! options, the pools, the background runtime hosting the zeroing worker
//! and idle trimmer, and the live gauges backing the observability hooks.
//!
//! The globals own the pools; the pools own their free entries; a
//! [`Core`](crate::core::Core) exclusively owns whatever storage it holds
//! until it releases it back.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;
use once_cell::sync::Lazy;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc::Sender;
use crate::error::{Error, Result};
use crate::options::StreamOptions;
use crate::pool::segment_pool::SegmentPool;
use crate::pool::small_pool::SmallBufferPool;
use crate::small::CLASS_COUNT;
use crate::source::SourceKind;
use crate::trimmer::{self, DecayingMax};
use crate::zeroing::{self, Job};

static SOURCE_KIND: OnceLock<SourceKind> = OnceLock::new();
static DEFAULT_OPTIONS: OnceLock<StreamOptions> = OnceLock::new();

static SEGMENT_POOL: Lazy<SegmentPool> = Lazy::new(SegmentPool::new);
static SMALL_POOL: Lazy<SmallBufferPool> = Lazy::new(SmallBufferPool::new);

static SEGMENT_HIGH_WATER: DecayingMax = DecayingMax::new();
static SMALL_HIGH_WATER: [DecayingMax; CLASS_COUNT] = [
	DecayingMax::new(), DecayingMax::new(), DecayingMax::new(),
	DecayingMax::new(), DecayingMax::new(), DecayingMax::new(),
	DecayingMax::new(), DecayingMax::new(), DecayingMax::new(),
];

static BACKGROUND: Lazy<Runtime> = Lazy::new(|| {
	Builder::new_multi_thread()
		.worker_threads(1)
		.thread_name("reservoir-bg")
		.enable_time()
		.build()
		.expect("failed to start reservoir's background runtime")
});

static ZERO_SENDER: Lazy<Sender<Job>> = Lazy::new(|| {
	let (tx, rx) = zeroing::channel();
	BACKGROUND.spawn(zeroing::run(rx));
	BACKGROUND.spawn(trimmer::run());
	tx
});

static LIVE_INSTANCES: AtomicUsize = AtomicUsize::new(0);
static MANAGED_SEGMENTS: AtomicUsize = AtomicUsize::new(0);
static NATIVE_SEGMENTS: AtomicUsize = AtomicUsize::new(0);
static SMALL_BUFFERS: AtomicUsize = AtomicUsize::new(0);
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);
static INJECTED_FAILURES: AtomicUsize = AtomicUsize::new(0);

/// Resolves (and, on first call, latches) the process-wide segment source.
pub(crate) fn source_kind() -> SourceKind {
	*SOURCE_KIND.get_or_init(SourceKind::default)
}

/// Sets the segment source, failing with `settings-locked` once any
/// instance has already resolved [`source_kind`].
pub fn set_segment_source(kind: SourceKind) -> Result<()> {
	SOURCE_KIND.set(kind).map_err(|_| Error::settings_locked())
}

/// Resolves (and, on first call, latches) the process-wide default
/// per-instance options.
pub(crate) fn default_options() -> StreamOptions {
	*DEFAULT_OPTIONS.get_or_init(StreamOptions::default)
}

/// Sets the default per-instance options, failing with `settings-locked`
/// once any instance has already resolved [`default_options`].
pub fn set_default_options(options: StreamOptions) -> Result<()> {
	DEFAULT_OPTIONS.set(options).map_err(|_| Error::settings_locked())
}

pub(crate) fn segment_pool() -> &'static SegmentPool { &SEGMENT_POOL }
pub(crate) fn small_pool() -> &'static SmallBufferPool { &SMALL_POOL }

pub(crate) fn zeroing_sender() -> &'static Sender<Job> { &ZERO_SENDER }

pub(crate) fn segment_high_water() -> &'static DecayingMax { &SEGMENT_HIGH_WATER }
pub(crate) fn small_high_water(class: usize) -> &'static DecayingMax { &SMALL_HIGH_WATER[class] }

pub(crate) fn record_segment_alloc(source: SourceKind) {
	let counter = match source {
		SourceKind::Managed => &MANAGED_SEGMENTS,
		SourceKind::Native => &NATIVE_SEGMENTS,
	};
	counter.fetch_add(1, Ordering::Relaxed);
	tracing::trace!(?source, "segment allocated");
}

pub(crate) fn record_segment_release(source: SourceKind) {
	let counter = match source {
		SourceKind::Managed => &MANAGED_SEGMENTS,
		SourceKind::Native => &NATIVE_SEGMENTS,
	};
	counter.fetch_sub(1, Ordering::Relaxed);
	tracing::trace!(?source, "segment released to source");
}

pub(crate) fn record_small_alloc(size: usize) {
	SMALL_BUFFERS.fetch_add(1, Ordering::Relaxed);
	tracing::trace!(size, "small buffer allocated");
}

pub(crate) fn record_small_release(count: usize) {
	SMALL_BUFFERS.fetch_sub(count, Ordering::Relaxed);
	tracing::trace!(count, "small buffers released to source");
}

pub(crate) fn next_instance_id() -> u64 {
	NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) fn instance_created() {
	LIVE_INSTANCES.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn instance_disposed() {
	LIVE_INSTANCES.fetch_sub(1, Ordering::Relaxed);
}

/// Live stream instance count, exposed as one of the observability
/// counters named in the interface spec.
pub fn live_instance_count() -> usize { LIVE_INSTANCES.load(Ordering::Relaxed) }

/// Segments currently held by the managed (Rust-allocator) source.
pub fn managed_segment_count() -> usize { MANAGED_SEGMENTS.load(Ordering::Relaxed) }

/// Segments currently held by the native (OS-heap) source.
pub fn native_segment_count() -> usize { NATIVE_SEGMENTS.load(Ordering::Relaxed) }

/// Marks every currently-free pool entry eligible for immediate return to
/// the segment source. In-flight instances are unaffected; their storage
/// releases normally on dispose.
pub fn release_all_free_buffers() {
	segment_pool().release_all_free();
	small_pool().release_all_free();
}

/// Forces the next `count` segment/small-buffer source allocations
/// (freelist hits are unaffected) to fail with `out-of-memory`. A test
/// hook for exercising the rollback discipline described in the design
/// notes; not meant for production fault injection.
pub fn inject_allocation_failures(count: usize) {
	INJECTED_FAILURES.store(count, Ordering::SeqCst);
}

/// Consumes one injected failure slot, if any are pending.
pub(crate) fn take_injected_failure() -> bool {
	let mut current = INJECTED_FAILURES.load(Ordering::SeqCst);
	while current > 0 {
		match INJECTED_FAILURES.compare_exchange_weak(
			current, current - 1, Ordering::SeqCst, Ordering::SeqCst,
		) {
			Ok(_) => return true,
			Err(observed) => current = observed,
		}
	}
	false
}
