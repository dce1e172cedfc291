//! Bounds checking for frame reads
//!
//! Every size field read from the wire goes through these helpers before it is
//! used to slice the input, so malformed frames fail with an error instead of a panic.

use crate::error::{DecodeError, DecodeResult};

/// Check if a buffer has enough bytes for a read operation
pub fn check_buffer_bounds(
    buffer: &[u8],
    offset: usize,
    size: usize,
    context: &'static str,
) -> DecodeResult<()> {
    if offset.saturating_add(size) > buffer.len() {
        return Err(DecodeError::truncated(
            offset,
            size,
            buffer.len().saturating_sub(offset),
            context,
        ));
    }
    Ok(())
}

/// Safely extract a slice from a buffer with bounds checking
pub fn safe_slice<'a>(
    buffer: &'a [u8],
    offset: usize,
    size: usize,
    context: &'static str,
) -> DecodeResult<&'a [u8]> {
    check_buffer_bounds(buffer, offset, size, context)?;
    Ok(&buffer[offset..offset + size])
}

/// Read a big-endian u16 at `offset`
pub fn read_u16_be(buffer: &[u8], offset: usize, context: &'static str) -> DecodeResult<u16> {
    let bytes = safe_slice(buffer, offset, 2, context)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}
