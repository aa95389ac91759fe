//! Session clock: countdown model and time sources.

pub mod countdown;
pub mod source;

pub use countdown::{check_allowance, format_mmss, truncate_millis, Countdown};
pub use source::{ManualClock, SystemClock, TimeSource};
