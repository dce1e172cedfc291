//! # Envelope Parser - Frame Decoding
//!
//! ## Purpose
//!
//! Decodes a frame produced by the builder back into its tagged state and body.
//! Every size field is bounds-checked against the remaining input before use, so
//! arbitrary bytes either decode or fail with a `DecodeError`; they never panic
//! or read out of bounds.
//!
//! ## Decoding Steps
//!
//! 1. Signature must equal `1B 4E 53 51` exactly
//! 2. Version must equal `01`; there is no forward compatibility
//! 3. Reserved bytes are skipped without interpretation
//! 4. Tag block is bounded to exactly its declared size `T`
//! 5. Each entry is split on its first ':'; entries without one are rejected
//! 6. Bytes after the tag block must be `0D 0A`
//! 7. Everything left is the body, copied verbatim

use crate::bounds::{read_u16_be, safe_slice};
use crate::constants::{
    is_supported_version, ENVELOPE_SIGNATURE, ENVELOPE_VERSION, HEADER_SIZE, SIZE_FIELD_LEN,
    STATE_END_DELIMITER, TAG_SEPARATOR,
};
use crate::content::MessageContent;
use crate::error::{DecodeError, DecodeResult};
use crate::state::{validate_name, TaggedState};

const SIGNATURE_OFFSET: usize = 0;
const VERSION_OFFSET: usize = 4;
const RESERVED_OFFSET: usize = 5;
const TAG_BLOCK_SIZE_OFFSET: usize = HEADER_SIZE;
const TAG_BLOCK_OFFSET: usize = HEADER_SIZE + SIZE_FIELD_LEN;

/// Quick check whether `source` starts with the envelope signature
pub fn is_enveloped(source: &[u8]) -> bool {
    source.starts_with(&ENVELOPE_SIGNATURE)
}

/// Decode a complete frame into state and body
pub fn decode(source: &[u8]) -> DecodeResult<MessageContent> {
    let signature = safe_slice(
        source,
        SIGNATURE_OFFSET,
        ENVELOPE_SIGNATURE.len(),
        "signature",
    )?;
    if signature != ENVELOPE_SIGNATURE {
        return Err(DecodeError::invalid_signature(&ENVELOPE_SIGNATURE, signature));
    }

    let version = safe_slice(source, VERSION_OFFSET, 1, "version")?[0];
    if !is_supported_version(version) {
        return Err(DecodeError::UnsupportedVersion {
            version,
            supported: ENVELOPE_VERSION,
        });
    }

    // Reserved: must be present, never interpreted
    safe_slice(source, RESERVED_OFFSET, 2, "reserved")?;

    let block_size = read_u16_be(source, TAG_BLOCK_SIZE_OFFSET, "tag block size")? as usize;
    let available = source.len() - TAG_BLOCK_OFFSET;
    if block_size > available {
        return Err(DecodeError::TagBlockOverrun {
            declared: block_size,
            available,
            offset: TAG_BLOCK_SIZE_OFFSET,
        });
    }
    let tag_block = &source[TAG_BLOCK_OFFSET..TAG_BLOCK_OFFSET + block_size];
    let state = parse_tag_block(tag_block, TAG_BLOCK_OFFSET)?;

    let delimiter_offset = TAG_BLOCK_OFFSET + block_size;
    let delimiter = safe_slice(
        source,
        delimiter_offset,
        STATE_END_DELIMITER.len(),
        "state end delimiter",
    )?;
    if delimiter != STATE_END_DELIMITER {
        return Err(DecodeError::invalid_delimiter(delimiter_offset, delimiter));
    }

    let body = source[delimiter_offset + STATE_END_DELIMITER.len()..].to_vec();
    Ok(MessageContent { state, body })
}

/// Parse the entries of a tag block; `base` is the block's offset in the frame
fn parse_tag_block(block: &[u8], base: usize) -> DecodeResult<TaggedState> {
    let mut state = TaggedState::new();
    let mut offset = 0;

    while offset < block.len() {
        if block.len() - offset < SIZE_FIELD_LEN {
            return Err(DecodeError::truncated(
                base + offset,
                SIZE_FIELD_LEN,
                block.len() - offset,
                "tag entry size",
            ));
        }
        let entry_size = u16::from_be_bytes([block[offset], block[offset + 1]]) as usize;
        let entry_offset = offset + SIZE_FIELD_LEN;
        let remaining = block.len() - entry_offset;
        if entry_size > remaining {
            return Err(DecodeError::EntryOverrun {
                declared: entry_size,
                available: remaining,
                offset: base + offset,
            });
        }

        let entry = &block[entry_offset..entry_offset + entry_size];
        parse_entry(entry, base + entry_offset, &mut state)?;
        offset = entry_offset + entry_size;
    }

    Ok(state)
}

/// Split one `name ':' value` entry and store it
fn parse_entry(entry: &[u8], offset: usize, state: &mut TaggedState) -> DecodeResult<()> {
    let separator = entry
        .iter()
        .position(|&b| b == TAG_SEPARATOR)
        .ok_or(DecodeError::MissingSeparator { offset })?;
    let (name, value) = (&entry[..separator], &entry[separator + 1..]);

    validate_name(name).map_err(|source| DecodeError::InvalidTag { offset, source })?;
    // validate_name admits ASCII only
    let name = std::str::from_utf8(name).unwrap_or_default();
    state
        .set(name, value)
        .map_err(|source| DecodeError::InvalidTag { offset, source })?;
    Ok(())
}
