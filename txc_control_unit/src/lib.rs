//! # TXC Control Unit Library
//!
//! Cyclic control-loop executive for a small electromechanical device.
//! Each tick the loop driver samples a fresh sensor snapshot, hands it to
//! the active controller, and sleeps the remainder of the period.
//!
//! ## Controllers
//!
//! 1. **Engine** - five-state FSM (Idle, Running, Stopped, Error, Fault)
//!    with entry/do semantics and first-true-guard transition selection
//! 2. **PlainLoop** - run-switch motor control behind an emergency interlock
//! 3. **WorkpieceStation** - travel, inspect, accept/reject sequence
//!
//! ## Ownership
//!
//! The `CycleRunner` owns the device and the `ControlContext` and lends
//! both to the controller by `&mut` for the duration of one tick. There is
//! no process-wide mutable state.

pub mod controller;
pub mod cycle;
pub mod error;
pub mod plain;
pub mod safety;
pub mod state;
pub mod station;
