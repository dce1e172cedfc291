//! # Envelope Builder - Frame Encoding
//!
//! ## Purpose
//!
//! Serializes a `TaggedState` and an opaque body into a single self-describing
//! frame. The tag-block size is computed up front from the state's running byte
//! size, so the output buffer is allocated once.
//!
//! ## Tag Block Size
//!
//! Each entry is written as `[E: u16] name ':' value` with `E = name + 1 + value`.
//! The declared block size `T` covers entry bytes including their size fields:
//!
//! ```text
//! T = sum(2 + name + 1 + value) = byte_size() + 3 * len()
//! ```

use crate::constants::{
    ENTRY_OVERHEAD, ENVELOPE_RESERVED, ENVELOPE_SIGNATURE, ENVELOPE_VERSION, HEADER_SIZE,
    MAX_TAG_BLOCK_SIZE, SIZE_FIELD_LEN, STATE_END_DELIMITER, TAG_SEPARATOR,
};
use crate::error::{EncodeError, EncodeResult};
use crate::state::TaggedState;
use bytes::BufMut;
use std::io::Write;

/// Declared tag-block size for `state`
pub fn tag_block_size(state: &TaggedState) -> usize {
    state.byte_size() + ENTRY_OVERHEAD * state.len()
}

/// Total frame length for `state` and `body`
pub fn encoded_len(state: &TaggedState, body: &[u8]) -> usize {
    HEADER_SIZE + SIZE_FIELD_LEN + tag_block_size(state) + STATE_END_DELIMITER.len() + body.len()
}

/// Encode `state` and `body` into a new frame
pub fn encode(state: &TaggedState, body: &[u8]) -> EncodeResult<Vec<u8>> {
    let mut frame = Vec::with_capacity(encoded_len(state, body));
    encode_into(state, body, &mut frame)?;
    Ok(frame)
}

/// Encode `state` and `body` into `w`, returning the number of bytes written
pub fn write_to<W: Write>(state: &TaggedState, body: &[u8], w: &mut W) -> EncodeResult<usize> {
    let frame = encode(state, body)?;
    w.write_all(&frame)?;
    Ok(frame.len())
}

/// Encode `state` and `body` onto the end of `buf`
pub fn encode_into<B: BufMut>(state: &TaggedState, body: &[u8], buf: &mut B) -> EncodeResult<()> {
    let block_size = tag_block_size(state);
    if block_size > MAX_TAG_BLOCK_SIZE {
        return Err(EncodeError::TagBlockTooLarge {
            size: block_size,
            max: MAX_TAG_BLOCK_SIZE,
            tag_count: state.len(),
        });
    }

    buf.put_slice(&ENVELOPE_SIGNATURE);
    buf.put_u8(ENVELOPE_VERSION);
    buf.put_slice(&ENVELOPE_RESERVED);

    buf.put_u16(block_size as u16);
    for (name, value) in state.iter() {
        // name <= 255 and value <= 4095 keep every entry inside u16
        buf.put_u16((name.len() + 1 + value.len()) as u16);
        buf.put_slice(name.as_bytes());
        buf.put_u8(TAG_SEPARATOR);
        buf.put_slice(value);
    }

    buf.put_slice(&STATE_END_DELIMITER);
    buf.put_slice(body);
    Ok(())
}
