//! The tool contract's registry half: a place to register
//! [`agent_types::Tool`] implementations and dispatch calls against them
//! by name.

mod registry;

pub use registry::*;
