// SPDX-License-Identifier: Apache-2.0

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use reservoir::{MemoryStream, SEGMENT_SIZE};
use std::io::Write;

const DATA: &[u8] = &[0x5au8; SEGMENT_SIZE * 4];

fn fresh_chained_write(c: &mut Criterion) {
	c.bench_function("write fills a fresh segment chain", |b| {
		b.iter_batched(
			|| MemoryStream::new().unwrap(),
			|mut stream| stream.write_all(DATA).unwrap(),
			BatchSize::PerIteration,
		)
	});
}

fn recycled_chained_write(c: &mut Criterion) {
	// Prime the segment pool so later iterations hit the freelist instead
	// of the segment source.
	let mut warm = MemoryStream::new().unwrap();
	warm.write_all(DATA).unwrap();
	warm.dispose();

	c.bench_function("write fills a recycled segment chain", |b| {
		b.iter_batched(
			|| MemoryStream::new().unwrap(),
			|mut stream| stream.write_all(DATA).unwrap(),
			BatchSize::PerIteration,
		)
	});
}

criterion_group!(benches, fresh_chained_write, recycled_chained_write);
criterion_main!(benches);
