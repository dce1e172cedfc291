//! Trace-propagation content option and consumer-side extraction

use crate::carrier::StateCarrier;
use codec::{ContentOption, MessageContent, OptionError, TaggedState};
use opentelemetry::global;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::Context;
use std::fmt;
use std::sync::Arc;

type SharedPropagator = Arc<dyn TextMapPropagator + Send + Sync>;

/// Injects a trace context into content state before encoding
///
/// Uses the supplied propagator, or the globally registered one when none is given.
#[derive(Clone)]
pub struct TracePropagation {
    cx: Context,
    propagator: Option<SharedPropagator>,
}

impl fmt::Debug for TracePropagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracePropagation")
            .field("propagator", &self.propagator)
            .finish_non_exhaustive()
    }
}

impl TracePropagation {
    pub fn new<P>(cx: Context, propagator: P) -> Self
    where
        P: TextMapPropagator + Send + Sync + 'static,
    {
        Self {
            cx,
            propagator: Some(Arc::new(propagator)),
        }
    }

    pub fn with_global(cx: Context) -> Self {
        Self {
            cx,
            propagator: None,
        }
    }

    fn inject(&self, state: &mut TaggedState) -> Result<(), OptionError> {
        let mut carrier = StateCarrier::new(state);
        match &self.propagator {
            Some(propagator) => propagator.inject_context(&self.cx, &mut carrier),
            None => global::get_text_map_propagator(|propagator| {
                propagator.inject_context(&self.cx, &mut carrier)
            }),
        }
        carrier.finish()?;
        Ok(())
    }
}

impl ContentOption for TracePropagation {
    fn apply(&self, _topic: &str, content: &mut MessageContent) -> Result<(), OptionError> {
        self.inject(&mut content.state)
    }

    fn name(&self) -> &str {
        "trace_propagation"
    }
}

/// Option injecting `cx` through `propagator`
pub fn with_trace_propagation<P>(cx: Context, propagator: P) -> TracePropagation
where
    P: TextMapPropagator + Send + Sync + 'static,
{
    TracePropagation::new(cx, propagator)
}

/// Option injecting `cx` through the globally registered propagator
pub fn with_global_trace_propagation(cx: Context) -> TracePropagation {
    TracePropagation::with_global(cx)
}

/// Rebuild a trace context from decoded state
pub fn extract_trace_context(propagator: &dyn TextMapPropagator, state: &TaggedState) -> Context {
    propagator.extract(&StateCarrier::new(state))
}

/// Rebuild a trace context using the globally registered propagator
pub fn extract_with_global(state: &TaggedState) -> Context {
    let carrier = StateCarrier::new(state);
    global::get_text_map_propagator(|propagator| propagator.extract(&carrier))
}
