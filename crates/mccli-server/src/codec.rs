//! Wire primitives shared by every control-channel frame.
//!
//! Two primitives make up the protocol:
//!
//! - an unsigned LEB128-style varint, 32 bits wide, at most five bytes;
//! - a UTF-8 string prefixed with its byte length as a varint.
//!
//! Readers distinguish a peer that hung up ([`CodecError::PeerClosed`]) from
//! malformed input so the connection loop can end quietly on the former.

use std::io::{self, Read};

use thiserror::Error;

/// Maximum number of bytes in an encoded varint.
pub const MAX_VARINT_BYTES: usize = 5;

/// Largest string, in bytes, accepted or emitted on the wire.
pub const MAX_STRING_BYTES: usize = 1024 * 1024;

const CONTINUATION_BIT: u8 = 0x80;
const PAYLOAD_BITS: u8 = 0x7F;

/// Errors produced while encoding or decoding frames.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The stream ended before a complete frame arrived.
    #[error("peer closed the connection")]
    PeerClosed,
    /// A varint kept its continuation bit set past the fifth byte.
    #[error("varint exceeds {MAX_VARINT_BYTES} bytes")]
    VarIntTooLong,
    /// A string length is above [`MAX_STRING_BYTES`].
    #[error("string of {len} bytes exceeds {max} byte limit")]
    FrameTooLarge {
        /// Announced or actual length in bytes.
        len: usize,
        /// Configured limit.
        max: usize,
    },
    /// A message announced more parts than the protocol allows.
    #[error("message of {count} parts exceeds {max} part limit")]
    TooManyParts {
        /// Announced or actual part count.
        count: usize,
        /// Configured limit.
        max: usize,
    },
    /// String bytes were not valid UTF-8.
    #[error("string is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// Any other IO failure.
    #[error("IO error: {0}")]
    Io(#[source] io::Error),
}

impl CodecError {
    /// Returns `true` when the peer went away rather than sending bad data.
    #[must_use]
    pub const fn is_peer_closed(&self) -> bool {
        matches!(self, Self::PeerClosed)
    }
}

impl From<io::Error> for CodecError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::BrokenPipe => Self::PeerClosed,
            _ => Self::Io(error),
        }
    }
}

/// Appends the varint encoding of `value` to `buffer`.
pub fn encode_varint(mut value: u32, buffer: &mut Vec<u8>) {
    loop {
        let low_seven = u8::try_from(value & u32::from(PAYLOAD_BITS)).unwrap_or(PAYLOAD_BITS);
        value >>= 7;
        if value == 0 {
            buffer.push(low_seven);
            return;
        }
        buffer.push(low_seven | CONTINUATION_BIT);
    }
}

/// Reads one varint.
///
/// Bits that do not fit in 32 bits are discarded, matching a native `u32`
/// accumulator.
pub fn read_varint<R: Read + ?Sized>(reader: &mut R) -> Result<u32, CodecError> {
    let mut value = 0_u32;
    for position in 0..MAX_VARINT_BYTES {
        let byte = read_byte(reader)?;
        value |= u32::from(byte & PAYLOAD_BITS) << (7 * position);
        if byte & CONTINUATION_BIT == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::VarIntTooLong)
}

/// Widens a decoded varint into a length or count.
///
/// Saturates on targets where `usize` is narrower than 32 bits so the caller's
/// limit check still rejects the value.
#[must_use]
pub(crate) fn wire_count(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Appends a length-prefixed UTF-8 string to `buffer`.
pub fn encode_string(value: &str, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
    let bytes = value.as_bytes();
    let len = check_string_len(bytes.len())?;
    encode_varint(len, buffer);
    buffer.extend_from_slice(bytes);
    Ok(())
}

/// Reads one length-prefixed UTF-8 string.
pub fn read_string<R: Read + ?Sized>(reader: &mut R) -> Result<String, CodecError> {
    let len = wire_count(read_varint(reader)?);
    check_string_len(len)?;
    let mut bytes = vec![0_u8; len];
    reader.read_exact(&mut bytes)?;
    Ok(String::from_utf8(bytes)?)
}

fn read_byte<R: Read + ?Sized>(reader: &mut R) -> Result<u8, CodecError> {
    let mut byte = [0_u8; 1];
    reader.read_exact(&mut byte)?;
    let [value] = byte;
    Ok(value)
}

fn check_string_len(len: usize) -> Result<u32, CodecError> {
    if len > MAX_STRING_BYTES {
        return Err(CodecError::FrameTooLarge {
            len,
            max: MAX_STRING_BYTES,
        });
    }
    u32::try_from(len).map_err(|_| CodecError::FrameTooLarge {
        len,
        max: MAX_STRING_BYTES,
    })
}
