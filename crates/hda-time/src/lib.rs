//! Guest-time timer scheduling primitives.
//!
//! The codec uses **guest virtual time** (monotonic nanoseconds) as the single source of truth
//! for stream pacing. Callers pass the current guest time explicitly, so unit tests can drive
//! the engine deterministically without a host clock.

mod timer_queue;

pub use timer_queue::{TimerEvent, TimerId, TimerQueue};

/// Nanoseconds per second of guest time.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Nanoseconds per millisecond of guest time.
pub const NANOS_PER_MS: u64 = 1_000_000;
