//! Embassy-backed clock

use embassy_time::{block_for, Duration, Instant};

use ctlbank_hal::Clock;

/// Millisecond clock on the embassy time driver
///
/// `now_ms` truncates the 64-bit tick count, giving the wrapping `u32`
/// counter the core expects.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl EmbassyClock {
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }

    fn delay_us(&mut self, us: u32) {
        block_for(Duration::from_micros(u64::from(us)));
    }
}
