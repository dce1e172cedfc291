//! Carrier adapter between `TaggedState` and OpenTelemetry propagators
//!
//! `get` on a missing key returns an empty string, the same as a present-but-empty
//! value. Writes are validated by the state itself; since `Injector::set` cannot
//! return an error, the first rejected write is recorded and reported by `finish`.

use codec::{StateError, StateResult, TaggedState};
use opentelemetry::propagation::{Extractor, Injector};
use std::ops::{Deref, DerefMut};

/// Key/value view of a tagged state
///
/// Wrap `&TaggedState` to extract, `&mut TaggedState` to inject.
#[derive(Debug)]
pub struct StateCarrier<S> {
    state: S,
    error: Option<StateError>,
}

impl<S> StateCarrier<S>
where
    S: Deref<Target = TaggedState>,
{
    pub fn new(state: S) -> Self {
        Self { state, error: None }
    }

    /// Value for `key` as a string; empty when missing
    pub fn get(&self, key: &str) -> String {
        self.state
            .value(key)
            .map(|value| String::from_utf8_lossy(value).into_owned())
            .unwrap_or_default()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.state.keys().collect()
    }

    /// First write the state rejected, if any
    pub fn error(&self) -> Option<&StateError> {
        self.error.as_ref()
    }

    /// Consume the carrier, reporting the first rejected write
    pub fn finish(self) -> StateResult<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<S> StateCarrier<S>
where
    S: DerefMut<Target = TaggedState>,
{
    /// Store `value` under `key`
    pub fn set(&mut self, key: &str, value: &str) -> StateResult<()> {
        self.state.set(key, value)?;
        Ok(())
    }
}

impl<S> Injector for StateCarrier<S>
where
    S: DerefMut<Target = TaggedState>,
{
    fn set(&mut self, key: &str, value: String) {
        if let Err(e) = self.state.set(key, value) {
            tracing::warn!(key, error = %e, "trace header rejected by tagged state");
            self.error.get_or_insert(e);
        }
    }
}

impl<S> Extractor for StateCarrier<S>
where
    S: Deref<Target = TaggedState>,
{
    fn get(&self, key: &str) -> Option<&str> {
        self.state.value_str(key)
    }

    fn keys(&self) -> Vec<&str> {
        self.state.keys().collect()
    }
}
