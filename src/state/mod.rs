//! State module for time and per-origin pacing
//!
//! # Components
//!
//! - `Clock`: Source of time and suspension (`SystemClock`, `ManualClock`)
//! - `RateLimitState`: Tracks the last request released to an origin

mod clock;
mod rate_limit;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub(crate) use clock::{elapsed_between, to_chrono};
pub use rate_limit::RateLimitState;
