//! State machine module root.
//!
//! The shared control record, the pure guard function, and the engine
//! that runs entry and do activities around them.

pub mod context;
pub mod engine;
pub mod guards;
