//! Time source abstraction

/// Monotonic millisecond clock
///
/// The counter is a `u32` that wraps roughly every 49.7 days. Consumers
/// must compare timestamps with `wrapping_sub`, never with `<` or `>`.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch, wrapping
    fn now_ms(&self) -> u32;

    /// Busy-wait for a short time
    ///
    /// Used to let matrix lines settle after being driven. Implementations
    /// must not yield to other tasks.
    fn delay_us(&mut self, us: u32);

    /// Milliseconds elapsed since `earlier`, wraparound-safe
    fn elapsed_since(&self, earlier: u32) -> u32 {
        self.now_ms().wrapping_sub(earlier)
    }
}
