//! # Envelope Propagation - Trace Context over Tagged State
//!
//! ## Purpose
//!
//! Exposes a `TaggedState` through the key/value carrier interface that
//! OpenTelemetry propagators speak, so a serialized trace header can ride in an
//! envelope's tag block and be read back on the consumer side.
//!
//! ## Integration Points
//!
//! - **Producers**: `TracePropagation` is a `ContentOption`; pass it when writing
//!   content and the current trace context is injected as tags
//! - **Consumers**: `extract_trace_context` rebuilds a `Context` from decoded state
//!
//! Trace and span IDs are never generated here; the propagator and the context
//! come from the caller.

pub mod carrier;
pub mod option;

pub use carrier::StateCarrier;
pub use option::{
    extract_trace_context, extract_with_global, with_global_trace_propagation,
    with_trace_propagation, TracePropagation,
};
