//! Analog input abstractions
//!
//! The firmware samples every potentiometer through one converter, either
//! directly or behind an external analog multiplexer. This trait models the
//! converter together with the analog pins wired to it.

/// Bank of analog inputs read through a single converter
pub trait AnalogInput {
    /// Error type for conversions
    type Error;

    /// Native converter resolution in bits
    ///
    /// Samples are always in `0..2^FULL_BITS`.
    const FULL_BITS: u8;

    /// Number of analog inputs in the bank
    fn inputs(&self) -> u8;

    /// Run one conversion on the given input
    ///
    /// # Arguments
    /// * `input` - Input index in `0..inputs()`
    fn sample(&mut self, input: u8) -> Result<u16, Self::Error>;
}
