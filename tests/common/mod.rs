//! Shared fixtures for integration tests.
//!
//! FLAC streams are assembled byte by byte: a STREAMINFO block, optional
//! extra metadata, then one 16-sample mono 16-bit frame per entry of
//! `frames`, each frame a single CONSTANT subframe.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Samples per frame in generated streams.
pub const BLOCK_SIZE: u16 = 16;
const SAMPLE_RATE: u64 = 44_100;

/// Extra metadata written between STREAMINFO and the audio frames.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// Vorbis comments as `KEY=value` pairs
    pub tags: Vec<String>,
    /// Bytes of PADDING
    pub padding: usize,
}

impl Metadata {
    pub fn tagged(tags: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            padding: 0,
        }
    }

    pub fn padded(padding: usize) -> Self {
        Self {
            tags: Vec::new(),
            padding,
        }
    }
}

/// Build a FLAC stream whose frames hold the given constant sample values.
pub fn flac_bytes(frames: &[i16], metadata: &Metadata) -> Vec<u8> {
    let mut blocks: Vec<(u8, Vec<u8>)> = vec![(0, streaminfo(frames.len() as u64))];
    if !metadata.tags.is_empty() {
        blocks.push((4, vorbis_comment(&metadata.tags)));
    }
    if metadata.padding > 0 {
        blocks.push((1, vec![0; metadata.padding]));
    }

    let mut out = b"fLaC".to_vec();
    let last = blocks.len() - 1;
    for (i, (kind, body)) in blocks.into_iter().enumerate() {
        let flag = if i == last { 0x80 } else { 0x00 };
        out.push(flag | kind);
        out.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        out.extend_from_slice(&body);
    }
    for (number, value) in frames.iter().enumerate() {
        out.extend_from_slice(&frame(number as u8, *value));
    }
    out
}

/// Write a generated FLAC stream to `dir/name`.
pub fn write_flac(dir: &Path, name: &str, frames: &[i16], metadata: &Metadata) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, flac_bytes(frames, metadata)).unwrap();
    path
}

fn streaminfo(frame_count: u64) -> Vec<u8> {
    let mut body = Vec::with_capacity(34);
    body.extend_from_slice(&BLOCK_SIZE.to_be_bytes());
    body.extend_from_slice(&BLOCK_SIZE.to_be_bytes());
    body.extend_from_slice(&[0; 6]);

    let channels_minus_one = 0u64;
    let bits_minus_one = 15u64;
    let total_samples = frame_count * u64::from(BLOCK_SIZE);
    let packed =
        (SAMPLE_RATE << 44) | (channels_minus_one << 41) | (bits_minus_one << 36) | total_samples;
    body.extend_from_slice(&packed.to_be_bytes());
    body.extend_from_slice(&[0; 16]);
    body
}

fn vorbis_comment(tags: &[String]) -> Vec<u8> {
    let vendor = b"fdups tests";
    let mut body = Vec::new();
    body.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    body.extend_from_slice(vendor);
    body.extend_from_slice(&(tags.len() as u32).to_le_bytes());
    for tag in tags {
        body.extend_from_slice(&(tag.len() as u32).to_le_bytes());
        body.extend_from_slice(tag.as_bytes());
    }
    body
}

fn frame(number: u8, value: i16) -> Vec<u8> {
    assert!(number < 0x80, "single-byte frame numbers only");
    // Fixed blocksize; 8-bit block size at end of header; 44.1 kHz; mono; 16 bit.
    let mut out = vec![0xFF, 0xF8, 0x69, 0x08, number, (BLOCK_SIZE - 1) as u8];
    out.push(crc8(&out));
    // CONSTANT subframe, no wasted bits.
    out.push(0x00);
    out.extend_from_slice(&value.to_be_bytes());
    let crc = crc16(&out);
    out.extend_from_slice(&crc.to_be_bytes());
    out
}

fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x07 } else { crc << 1 };
        }
    }
    crc
}

fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x8005 } else { crc << 1 };
        }
    }
    crc
}

/// Write `content` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}
