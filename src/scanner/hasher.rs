//! Streaming content digests.
//!
//! # Overview
//! A [`Hasher`] turns a byte stream into a fixed-length digest. Two
//! strategies are provided:
//!
//! - [`ContentHasher`]: SHA-256 of the raw bytes
//! - [`FlacHasher`]: SHA-256 of the decoded FLAC samples only, so tags,
//!   padding and other metadata do not affect the digest
//!
//! Both stream their input and never hold a whole file in memory.

use std::fmt::Write as _;
use std::io::{self, Read};

use sha2::{Digest as _, Sha256};

/// Raw digest bytes.
pub type Digest = Vec<u8>;

/// Errors returned by a [`Hasher`].
#[derive(thiserror::Error, Debug)]
pub enum DigestError {
    /// Reading the stream failed.
    #[error("read failed: {0}")]
    Io(#[from] io::Error),

    /// The content is not in the format the hasher expects.
    #[error("malformed content: {0}")]
    Format(String),
}

/// Maps a byte stream to a digest.
///
/// Implementations are stateless and shared between worker threads.
/// Identical content must always produce the identical digest.
pub trait Hasher: Send + Sync {
    /// Consume `reader` to the end and return its digest.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Io`] if reading fails and
    /// [`DigestError::Format`] if the content is malformed.
    fn hash(&self, reader: &mut dyn Read) -> Result<Digest, DigestError>;
}

/// SHA-256 over the raw file bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl Hasher for ContentHasher {
    fn hash(&self, reader: &mut dyn Read) -> Result<Digest, DigestError> {
        let mut hasher = Sha256::new();
        io::copy(reader, &mut hasher)?;
        Ok(hasher.finalize().to_vec())
    }
}

/// SHA-256 over decoded FLAC audio samples.
///
/// Samples are fed interleaved by channel, little-endian, using the
/// smallest whole number of bytes that holds the stream's bit depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlacHasher;

impl Hasher for FlacHasher {
    fn hash(&self, reader: &mut dyn Read) -> Result<Digest, DigestError> {
        let mut flac = claxon::FlacReader::new(reader).map_err(flac_error)?;
        let bytes_per_sample = flac.streaminfo().bits_per_sample.div_ceil(8) as usize;

        let mut hasher = Sha256::new();
        let mut frames = flac.blocks();
        let mut buffer = Vec::new();
        let mut scratch = Vec::new();

        while let Some(block) = frames.read_next_or_eof(buffer).map_err(flac_error)? {
            scratch.clear();
            for i in 0..block.duration() {
                for ch in 0..block.channels() {
                    let bytes = block.sample(ch, i).to_le_bytes();
                    scratch.extend_from_slice(&bytes[..bytes_per_sample]);
                }
            }
            hasher.update(&scratch);
            buffer = block.into_buffer();
        }

        Ok(hasher.finalize().to_vec())
    }
}

fn flac_error(err: claxon::Error) -> DigestError {
    match err {
        claxon::Error::IoError(e) => DigestError::Io(e),
        other => DigestError::Format(other.to_string()),
    }
}

/// Lowercase hexadecimal encoding of a digest.
#[must_use]
pub fn digest_to_hex(digest: &[u8]) -> String {
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}
