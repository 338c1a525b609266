//! # Segment — binary record codec
//!
//! A segment is one immutable key-value record as it appears on disk inside
//! an append-only log file. The engine never stores anything else: a log file
//! is just a concatenation of segments.
//!
//! ## Binary Record Format
//!
//! All multi-byte fields are **big-endian**.
//!
//! ```text
//! [checksum: u16][key_len: u16][value_len: i32][key bytes...][value bytes...]
//! ```
//!
//! `checksum` is CRC-16/CCITT (polynomial `0x1021`, initial register
//! `0xFFFF`, MSB-first, no final XOR) computed over every byte from offset 2
//! to the end — i.e. both length fields and both payloads, but not the
//! checksum itself.
//!
//! `value_len` is a *signed* 32-bit field, capping values at `i32::MAX`
//! (~2.14 GB). A negative declared length only ever appears in corrupt input
//! and fails validation.
//!
//! ## Zero-copy decode
//!
//! [`Segment::from_bytes`] wraps the buffer without copying or validating.
//! Accessors slice the shared backing allocation ([`bytes::Bytes`]), so a
//! decoded segment and the values handed to callers all reference the bytes
//! that were read from disk. The buffer must be treated as immutable once
//! decoded. Untrusted input must be gated with [`Segment::is_valid`] before
//! the payload accessors are used.
//!
//! ## Example
//!
//! ```rust
//! use segment::Segment;
//!
//! let seg = Segment::encode(b"Hello", b"World").unwrap();
//! assert!(seg.is_valid());
//! assert_eq!(&seg.key()[..], b"Hello");
//! assert_eq!(&seg.value()[..], b"World");
//! ```

use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use crc::{Crc, CRC_16_IBM_3740};
use thiserror::Error;

/// Size of the checksum field in bytes.
pub const CRC_LEN: usize = 2;

/// Size of the key-length field in bytes.
pub const KEY_LEN_LEN: usize = 2;

/// Size of the value-length field in bytes.
pub const VALUE_LEN_LEN: usize = 4;

/// Total fixed header size: checksum + key length + value length.
pub const HEADER_LEN: usize = CRC_LEN + KEY_LEN_LEN + VALUE_LEN_LEN;

/// Maximum key size: the key-length field is an unsigned 16-bit integer.
pub const MAX_KEY_LEN: usize = u16::MAX as usize;

/// Maximum value size: the value-length field is a signed 32-bit integer.
pub const MAX_VALUE_LEN: usize = i32::MAX as usize;

/// CRC-16/CCITT as mandated by the record format. `CRC_16_IBM_3740` is this
/// exact parameterization (poly 0x1021, init 0xFFFF, no reflection, no xorout).
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Errors raised while encoding a key-value pair into a segment.
///
/// Decoding never errors: [`Segment::from_bytes`] wraps any buffer and defers
/// judgement to [`Segment::is_valid`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    /// Keys must contain at least one byte.
    #[error("key must not be empty")]
    EmptyKey,

    /// Key exceeds the 16-bit length field.
    #[error("key too large: {0} bytes (max {MAX_KEY_LEN})")]
    KeyTooLarge(usize),

    /// Value exceeds the signed 32-bit length field.
    #[error("value too large: {0} bytes (max {MAX_VALUE_LEN})")]
    ValueTooLarge(usize),
}

/// One immutable binary key-value record.
///
/// Holds the complete on-disk byte form. Construction is either
/// [`Segment::encode`] (from a key-value pair, computing the checksum) or
/// [`Segment::from_bytes`] (wrapping raw bytes read back from a log).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    bytes: Bytes,
}

impl Segment {
    /// Encodes a key-value pair into a freshly checksummed segment.
    ///
    /// # Errors
    ///
    /// * [`SegmentError::EmptyKey`] — `key` is empty.
    /// * [`SegmentError::KeyTooLarge`] — `key` exceeds 65535 bytes.
    /// * [`SegmentError::ValueTooLarge`] — `value` exceeds `i32::MAX` bytes.
    pub fn encode(key: &[u8], value: &[u8]) -> Result<Self, SegmentError> {
        if key.is_empty() {
            return Err(SegmentError::EmptyKey);
        }
        if key.len() > MAX_KEY_LEN {
            return Err(SegmentError::KeyTooLarge(key.len()));
        }
        if value.len() > MAX_VALUE_LEN {
            return Err(SegmentError::ValueTooLarge(value.len()));
        }

        let total = HEADER_LEN + key.len() + value.len();
        let mut buf = vec![0u8; HEADER_LEN];
        buf.reserve(total - HEADER_LEN);

        BigEndian::write_u16(&mut buf[CRC_LEN..], key.len() as u16);
        BigEndian::write_i32(&mut buf[CRC_LEN + KEY_LEN_LEN..], value.len() as i32);
        buf.extend_from_slice(key);
        buf.extend_from_slice(value);

        // Checksum covers everything after the checksum field itself.
        let crc = CRC16.checksum(&buf[CRC_LEN..]);
        BigEndian::write_u16(&mut buf[..CRC_LEN], crc);

        Ok(Self {
            bytes: Bytes::from(buf),
        })
    }

    /// Wraps a raw buffer as a segment **without copying or validating**.
    ///
    /// The buffer is shared, not cloned. Callers feeding in untrusted bytes
    /// (anything read from disk) must check [`is_valid`](Self::is_valid)
    /// before touching [`key`](Self::key) or [`value`](Self::value).
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self { bytes }
    }

    /// The stored checksum field.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is shorter than the checksum field.
    pub fn checksum(&self) -> u16 {
        BigEndian::read_u16(&self.bytes[..CRC_LEN])
    }

    /// The declared key length.
    ///
    /// Read as an unsigned 16-bit integer, so the full 1..=65535 range is
    /// supported.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is shorter than the fixed header.
    pub fn key_len(&self) -> usize {
        BigEndian::read_u16(&self.bytes[CRC_LEN..CRC_LEN + KEY_LEN_LEN]) as usize
    }

    /// The declared value length. Negative only in corrupt input.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is shorter than the fixed header.
    pub fn value_len(&self) -> i32 {
        BigEndian::read_i32(&self.bytes[CRC_LEN + KEY_LEN_LEN..HEADER_LEN])
    }

    /// The key bytes, as a cheap slice of the shared backing buffer.
    ///
    /// # Panics
    ///
    /// Panics if the declared lengths exceed the buffer; gate untrusted
    /// input with [`is_valid`](Self::is_valid) first.
    pub fn key(&self) -> Bytes {
        self.bytes.slice(HEADER_LEN..HEADER_LEN + self.key_len())
    }

    /// The value bytes, as a cheap slice of the shared backing buffer.
    ///
    /// # Panics
    ///
    /// Panics if the declared lengths exceed the buffer; gate untrusted
    /// input with [`is_valid`](Self::is_valid) first.
    pub fn value(&self) -> Bytes {
        let start = HEADER_LEN + self.key_len();
        self.bytes.slice(start..start + self.value_len() as usize)
    }

    /// The complete on-disk byte form.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the segment, yielding the shared backing buffer.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Total encoded length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the backing buffer holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when the stored checksum matches a recomputation over
    /// `bytes[2..]`.
    ///
    /// Note the checksum covers the *declared* length fields, not the actual
    /// payload boundaries: a segment with trailing garbage can be
    /// checksum-valid yet fail [`is_valid`](Self::is_valid).
    pub fn is_checksum_valid(&self) -> bool {
        if self.bytes.len() < HEADER_LEN {
            return false;
        }
        self.checksum() == CRC16.checksum(&self.bytes[CRC_LEN..])
    }

    /// The combined validity gate: checksum match, non-empty key,
    /// non-negative value length, and a total length that equals
    /// `header + key_len + value_len` exactly.
    ///
    /// A segment failing this must never be indexed or handed to a caller.
    pub fn is_valid(&self) -> bool {
        if self.bytes.len() < HEADER_LEN {
            return false;
        }
        let key_len = self.key_len();
        let value_len = self.value_len();
        key_len > 0
            && value_len >= 0
            && self.bytes.len() == HEADER_LEN + key_len + value_len as usize
            && self.is_checksum_valid()
    }
}
