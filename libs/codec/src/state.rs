//! # Tagged State - Validated Name/Value Container
//!
//! ## Purpose
//!
//! Holds the small named tags (metadata, trace context, routing hints) that travel
//! in an envelope's tag block. Every write is validated against the wire limits and
//! the running byte size is kept so the encoder can size the tag block without a
//! second pass.
//!
//! ## Invariants
//!
//! - `byte_size()` is the sum of `name.len() + value.len()` over stored tags; it does
//!   not include the per-entry size field or separator.
//! - An empty value is never stored. Writing one deletes the tag.
//! - The backing map is allocated on the first non-empty write; an untouched state
//!   answers every read and delete without allocating.
//!
//! Mutation takes `&mut self`, so first-write initialization is always exclusive.

use crate::constants::{STATE_NAME_MAX_LENGTH, STATE_VALUE_MAX_SIZE};
use crate::error::{StateError, StateResult};
use std::collections::BTreeMap;

/// Validated mapping from tag name to tag value
///
/// Iteration is ordered by name, which makes encoding deterministic. Callers
/// must not rely on that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggedState {
    values: Option<BTreeMap<String, Vec<u8>>>,
    size: usize,
}

impl TaggedState {
    /// Create an empty, unallocated state
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tags
    pub fn len(&self) -> usize {
        self.values.as_ref().map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has(&self, name: &str) -> bool {
        self.values
            .as_ref()
            .is_some_and(|values| values.contains_key(name))
    }

    /// Stored value for `name`, if any
    pub fn value(&self, name: &str) -> Option<&[u8]> {
        self.values
            .as_ref()
            .and_then(|values| values.get(name))
            .map(Vec::as_slice)
    }

    /// Stored value for `name` as UTF-8, if present and valid
    pub fn value_str(&self, name: &str) -> Option<&str> {
        self.value(name)
            .and_then(|value| std::str::from_utf8(value).ok())
    }

    /// Store `value` under `name`, returning the previous value
    ///
    /// An empty value deletes the tag. Writing a value byte-identical to the stored
    /// one is a no-op that still returns it. Name and value are validated before
    /// anything is touched.
    pub fn set(&mut self, name: &str, value: impl Into<Vec<u8>>) -> StateResult<Option<Vec<u8>>> {
        let value = value.into();
        validate_name(name.as_bytes())?;
        validate_value(&value)?;

        if value.is_empty() {
            return Ok(self.del(name));
        }

        let values = self.values.get_or_insert_with(BTreeMap::new);
        if let Some(existing) = values.get(name) {
            if *existing == value {
                return Ok(Some(existing.clone()));
            }
        }

        let added = name.len() + value.len();
        let old = values.insert(name.to_string(), value);
        if let Some(old) = &old {
            self.size -= name.len() + old.len();
        }
        self.size += added;
        Ok(old)
    }

    /// `set` for string values
    pub fn set_str(&mut self, name: &str, value: &str) -> StateResult<Option<Vec<u8>>> {
        self.set(name, value)
    }

    /// Remove `name`, returning its value
    pub fn del(&mut self, name: &str) -> Option<Vec<u8>> {
        let old = self.values.as_mut()?.remove(name)?;
        self.size -= name.len() + old.len();
        Some(old)
    }

    /// Invoke `visit` for every stored tag
    pub fn visit<F>(&self, mut visit: F)
    where
        F: FnMut(&str, &[u8]),
    {
        for (name, value) in self.iter() {
            visit(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> + '_ {
        self.values
            .iter()
            .flat_map(|values| values.iter())
            .map(|(name, value)| (name.as_str(), value.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(name, _)| name)
    }

    /// Running sum of name and value lengths
    pub fn byte_size(&self) -> usize {
        self.size
    }
}

/// Check a tag name against length and `[A-Za-z0-9_-]`
pub fn validate_name(name: &[u8]) -> StateResult<()> {
    if name.is_empty() {
        return Err(StateError::EmptyName);
    }
    if name.len() > STATE_NAME_MAX_LENGTH {
        return Err(StateError::NameTooLong {
            len: name.len(),
            max: STATE_NAME_MAX_LENGTH,
        });
    }
    if let Some(position) = name.iter().position(|&ch| !is_valid_name_char(ch)) {
        return Err(StateError::InvalidNameChar {
            ch: char::from(name[position]),
            position,
        });
    }
    Ok(())
}

/// Check a tag value against the maximum size
pub fn validate_value(value: &[u8]) -> StateResult<()> {
    if value.len() > STATE_VALUE_MAX_SIZE {
        return Err(StateError::ValueTooLarge {
            size: value.len(),
            max: STATE_VALUE_MAX_SIZE,
        });
    }
    Ok(())
}

#[inline]
fn is_valid_name_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'-'
}
