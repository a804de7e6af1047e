//! Line-protocol rendering of samples.
//!
//! Each sample becomes one line:
//!
//! ```text
//! gpu,hostname=<host>,uuid=<uuid> pclk=..,mclk=..,temp=..,pwr=..,mem_used=..,mem_free=..,mem_total=..[,hw_break=..,hw_slowdown=..,hw_thermal=..,sw_thermal=..] <unix_nanos>
//! ```
//!
//! Tags come first, then fields in a fixed order, then the timestamp.
//! Values are the device's raw units.

use crate::data::{Identity, Sample};
use std::time::{SystemTime, UNIX_EPOCH};

pub const MEASUREMENT: &str = "gpu";

/// Nanoseconds since the Unix epoch. Clocks set before 1970 read as 0.
pub fn unix_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

pub fn format_line(identity: &Identity, sample: &Sample, timestamp: u128) -> String {
    let mut line = format!(
        "{},hostname={},uuid={} pclk={},mclk={},temp={},pwr={},mem_used={},mem_free={},mem_total={}",
        MEASUREMENT,
        identity.hostname,
        identity.uuid,
        sample.video_clock,
        sample.memory_clock,
        sample.temperature,
        sample.power_usage,
        sample.memory.used,
        sample.memory.free,
        sample.memory.total,
    );

    if let Some(flags) = &sample.throttle {
        line.push_str(&format!(
            ",hw_break={},hw_slowdown={},hw_thermal={},sw_thermal={}",
            u8::from(flags.hw_break),
            u8::from(flags.hw_slowdown),
            u8::from(flags.hw_thermal),
            u8::from(flags.sw_thermal),
        ));
    }

    line.push_str(&format!(" {}", timestamp));
    line
}
