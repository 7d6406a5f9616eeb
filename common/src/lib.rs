//! FxGuard Common Types
//!
//! Shared types used across the FxGuard workspace: currency codes, the
//! untyped boundary value, the error taxonomy and time utilities.

pub mod currency;
pub mod error;
pub mod input;
pub mod time;

pub use currency::*;
pub use error::*;
pub use input::*;
pub use time::{elapsed_ms, Clock, ManualClock, SystemClock, Timestamp};
