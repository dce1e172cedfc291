//! # Envelope Constants - Frame Layout and State Limits
//!
//! ## Purpose
//!
//! Wire-format constants for the tagged-state envelope frame. These values are
//! part of the persisted format and MUST stay bit-exact across producers and
//! consumers; a frame written with one set of constants is unreadable with another.
//!
//! ## Frame Layout
//!
//! ```text
//! [1B 4E 53 51] [01] [00 00] [T: u16] ([E: u16] [name ':' value])* [0D 0A] [body...]
//!   signature    ver reserved  tag block  entries                delimiter
//! ```
//!
//! All multi-byte integers are big-endian.

/// Frame signature; the first 4 bytes of every enveloped payload
pub const ENVELOPE_SIGNATURE: [u8; 4] = [0x1b, 0x4e, 0x53, 0x51];

/// The single supported frame version
pub const ENVELOPE_VERSION: u8 = 0x01;

/// Reserved bytes following the version; written as zero, skipped on decode
pub const ENVELOPE_RESERVED: [u8; 2] = [0x00, 0x00];

/// Delimiter separating the tag block from the body
pub const STATE_END_DELIMITER: [u8; 2] = [b'\r', b'\n'];

/// Separator between a tag name and its value inside an entry
pub const TAG_SEPARATOR: u8 = b':';

/// Signature + version + reserved
pub const HEADER_SIZE: usize = 7;

/// Width of the tag-block size field and of each entry size field
pub const SIZE_FIELD_LEN: usize = 2;

/// Bytes every entry adds beyond its name and value: the 2-byte size field
/// and the separator. The tag-block size `T` counts only the separator.
pub const ENTRY_OVERHEAD: usize = SIZE_FIELD_LEN + 1;

/// Smallest possible frame: header, empty tag block and delimiter
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + SIZE_FIELD_LEN + STATE_END_DELIMITER.len();

/// Largest tag block the 2-byte size field can declare
pub const MAX_TAG_BLOCK_SIZE: usize = u16::MAX as usize;

/// Maximum tag name length in bytes
pub const STATE_NAME_MAX_LENGTH: usize = 255;

/// Maximum tag value size in bytes
pub const STATE_VALUE_MAX_SIZE: usize = 0x0fff;

/// Whether the given version byte can be decoded by this crate
pub fn is_supported_version(version: u8) -> bool {
    version == ENVELOPE_VERSION
}
