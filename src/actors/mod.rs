//! Actor driving the monitor on a fixed interval
//!
//! ```text
//! Timer tick → Monitor::run_cycle → [save state, dispatch notifications]
//!     ↑
//!     └─── Commands (CheckNow, Shutdown)
//! ```
//!
//! The actor handles ticks and commands one at a time, so at most one
//! cycle is ever in flight. Failures inside a cycle are retried by the
//! next tick; there are no retry loops inside a cycle.

pub mod messages;
pub mod monitor;
