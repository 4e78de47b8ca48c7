// SPDX-License-Identifier: Apache-2.0

//! The background zeroing worker: a single task fed by a bounded queue of
//! retired buffers. Each entry is overwritten with zeros, then returned to
//! its originating freelist. On queue overflow the returning thread falls
//! back to zeroing synchronously itself, preserving the
//! contents-never-leak invariant without ever blocking on the worker.

use tokio::sync::mpsc;
use crate::pool::Retire;

/// Queue depth before `try_send` starts failing and callers fall back to
/// synchronous zeroing. Generous enough to absorb a burst of dispose()
/// calls without forcing the fallback path under normal load.
pub(crate) const QUEUE_CAPACITY: usize = 4096;

pub(crate) type Job = Box<dyn Retire>;

/// Enqueues `job` for background zeroing, falling back to zeroing it on
/// the calling thread immediately if the queue is full or the worker has
/// gone away.
pub(crate) fn submit(sender: &mpsc::Sender<Job>, job: Job) {
	if let Err(err) = sender.try_send(job) {
		let job = match err {
			mpsc::error::TrySendError::Full(job) => job,
			mpsc::error::TrySendError::Closed(job) => job,
		};
		job.zero_and_store();
	}
}

/// Spawned once onto the background runtime; drains the queue for the
/// lifetime of the process. Shutdown is not drained: in-flight jobs are
/// simply dropped when the runtime is torn down, which is fine because
/// zeroing here is a safety measure, not a persistence guarantee.
pub(crate) async fn run(mut receiver: mpsc::Receiver<Job>) {
	while let Some(job) = receiver.recv().await {
		job.zero_and_store();
	}
}

pub(crate) fn channel() -> (mpsc::Sender<Job>, mpsc::Receiver<Job>) {
	mpsc::channel(QUEUE_CAPACITY)
}
