//! Safety module root.
//!
//! Emergency interlock evaluated by the plain control loop.

pub mod interlock;
