//! Potentiometer ADC filter
//!
//! A new reading replaces the stored one only after it has stayed at least
//! one mask unit away from it for `threshold` consecutive samples. Any
//! sample back inside the tolerance band restarts the count.
//!
//! The mask unit is `2^(full_bits - configured_bits)`, so lowering the
//! reported resolution also widens the tolerance band.

/// Run-length state for one potentiometer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcFilter {
    run_length: u8,
}

impl AdcFilter {
    /// Create a filter with no pending run
    pub const fn new() -> Self {
        Self { run_length: 0 }
    }

    /// Consecutive out-of-tolerance samples seen so far
    pub fn run_length(&self) -> u8 {
        self.run_length
    }

    /// Feed one raw sample
    ///
    /// Returns the sample when it is accepted as the new stored value.
    ///
    /// # Arguments
    /// * `stored` - Currently accepted raw value
    /// * `sample` - Fresh raw conversion
    /// * `mask_unit` - Smallest step treated as real movement
    /// * `threshold` - Consecutive samples required to accept
    pub fn update(&mut self, stored: u16, sample: u16, mask_unit: u16, threshold: u8) -> Option<u16> {
        if sample.abs_diff(stored) < mask_unit {
            self.run_length = 0;
            return None;
        }

        self.run_length = self.run_length.saturating_add(1);
        if self.run_length >= threshold {
            self.run_length = 0;
            Some(sample)
        } else {
            None
        }
    }
}

/// Quantize a raw reading to the configured resolution
pub fn quantize(raw: u16, mask_bits: u8) -> u16 {
    raw >> mask_bits
}
