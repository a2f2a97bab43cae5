//! System-wide constants for the TXC workspace.
//!
//! Single source of truth for error codes, exit codes and timing defaults.

/// Number of addressable logical channels per bank (sensors, switches).
///
/// Channel readings are bit-packed into a `u64`, so ids are `0..64`.
pub const MAX_CHANNELS: usize = 64;

/// Maximum number of channels a configured channel list may hold.
pub const MAX_LISTED_CHANNELS: usize = 16;

// ─── Error Codes ────────────────────────────────────────────────────

/// No error.
pub const ERR_NONE: i32 = 0;

/// Safety interlock tripped in the plain control loop.
pub const ERR_EMERGENCY_STOP: i32 = 1;

/// Transient condition (Error state); clears on return to Idle.
pub const ERR_TRANSIENT: i32 = 2;

/// Latched fault (Fault state); cleared only by a process restart.
pub const ERR_LATCHED_FAULT: i32 = 3;

// ─── Exit Codes ─────────────────────────────────────────────────────

/// Normal termination (cancellation, emergency stop, tick limit).
pub const EXIT_OK: i32 = 0;

/// Startup or configuration failure.
pub const EXIT_STARTUP_FAILURE: i32 = 1;

/// Internal fault that escaped every handler.
pub const EXIT_INTERNAL_FAULT: i32 = 2;

// ─── Defaults ───────────────────────────────────────────────────────

/// Default control period in milliseconds.
pub const DEFAULT_PERIOD_MS: u64 = 100;

/// Default Error-state dwell before returning to Idle, in milliseconds.
pub const DEFAULT_ERROR_DWELL_MS: u64 = 1000;

/// Default motor speed setpoint applied on entering Idle.
pub const DEFAULT_IDLE_SPEED: i32 = 512;

/// Default conveyor travel time of the workpiece station, in milliseconds.
pub const DEFAULT_TRAVEL_MS: u64 = 2000;

/// Default number of ticks between periodic statistics reports.
pub const DEFAULT_REPORT_INTERVAL: u64 = 50;
