// SPDX-License-Identifier: Apache-2.0

//! Exercises the storage-representation state machine directly through
//! the public facade: promotion from a small buffer to a segment chain,
//! and the gap zero-fill invariant for sparse writes and regrowth after
//! truncation.

use std::io::{Read, Seek, SeekFrom, Write};
use reservoir::{MemoryStream, MAX_CLASS};

#[test]
fn small_buffer_promotes_to_segment_chain_past_max_class() {
	let mut stream = MemoryStream::new().unwrap();
	let data = vec![0x11u8; MAX_CLASS + 1];
	stream.write_all(&data).unwrap();
	assert_eq!(stream.len(), data.len());
	assert!(stream.capacity() >= data.len());

	stream.seek(SeekFrom::Start(0)).unwrap();
	let mut readback = vec![0u8; data.len()];
	stream.read_exact(&mut readback).unwrap();
	assert_eq!(readback, data);
}

#[test]
fn seeking_past_length_then_writing_zero_fills_the_gap() {
	let mut stream = MemoryStream::new().unwrap();
	stream.seek(SeekFrom::Start(4096)).unwrap();
	stream.write_all(b"tail").unwrap();
	assert_eq!(stream.len(), 4100);

	stream.seek(SeekFrom::Start(0)).unwrap();
	let mut all = vec![0u8; 4100];
	stream.read_exact(&mut all).unwrap();
	assert!(all[..4096].iter().all(|&b| b == 0));
	assert_eq!(&all[4096..], b"tail");
}

#[test]
fn truncate_then_regrow_never_exposes_old_bytes() {
	let mut stream = MemoryStream::new().unwrap();
	stream.write_all(&[0xffu8; 8192]).unwrap();
	stream.set_len(32).unwrap();
	stream.set_len(8192).unwrap();

	stream.seek(SeekFrom::Start(0)).unwrap();
	let mut all = vec![0u8; 8192];
	stream.read_exact(&mut all).unwrap();
	assert!(all[32..].iter().all(|&b| b == 0), "bytes beyond the truncation point must read as zero after regrowth");
}

#[test]
fn to_vec_does_not_disturb_position() {
	let mut stream = MemoryStream::new().unwrap();
	stream.write_all(b"abcdef").unwrap();
	stream.seek(SeekFrom::Start(2)).unwrap();
	let snapshot = stream.to_vec();
	assert_eq!(snapshot, b"abcdef");

	let mut rest = Vec::new();
	stream.read_to_end(&mut rest).unwrap();
	assert_eq!(rest, b"cdef");
}

#[test]
fn dispose_marks_stream_closed() {
	let mut stream = MemoryStream::new().unwrap();
	stream.write_all(b"x").unwrap();
	stream.dispose();
	assert!(stream.is_disposed());
	assert!(stream.write_all(b"y").is_err());
}
