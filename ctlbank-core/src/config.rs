//! Panel configuration
//!
//! All values are fixed per firmware build. The firmware's build script
//! validates `controller.toml` and emits a [`PanelConfig`] constant; the
//! same checks run again at startup through [`PanelConfig::validate`].

use core::ops::Range;

/// Maximum potentiometers (8 analog inputs x 8 multiplexer positions)
pub const MAX_POTS: usize = 64;

/// Maximum switches per config
pub const MAX_SWITCHES: usize = 64;

/// Maximum rotary encoders per config
pub const MAX_ENCODERS: usize = 32;

/// Maximum total controllers (registry capacity)
pub const MAX_CONTROLLERS: usize = 128;

/// Widest converter the ADC filter supports
///
/// Raw samples are stored in the signed 16-bit value register.
pub const MAX_ADC_BITS: u8 = 15;

/// Lowest non-reserved 7-bit I2C address
pub const MIN_BUS_ADDRESS: u8 = 0x08;

/// Highest non-reserved 7-bit I2C address
pub const MAX_BUS_ADDRESS: u8 = 0x77;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// More potentiometers than [`MAX_POTS`]
    TooManyPots,
    /// More switches than [`MAX_SWITCHES`]
    TooManySwitches,
    /// More encoders than [`MAX_ENCODERS`]
    TooManyEncoders,
    /// Controller total exceeds [`MAX_CONTROLLERS`]
    TooManyControllers,
    /// Bus address outside the non-reserved 7-bit range
    InvalidBusAddress,
    /// Configured ADC bits are zero or wider than the converter
    InvalidAdcResolution,
    /// ADC sample threshold of zero
    InvalidSampleThreshold,
    /// Fast-scroll multiplier below one
    InvalidFastMultiplier,
}

/// Input bank configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelConfig {
    /// 7-bit I2C target address
    pub bus_address: u8,
    /// Number of potentiometers
    pub pots: u8,
    /// Number of on/off switches
    pub switches: u8,
    /// Number of rotary encoders
    pub encoders: u8,
    /// Native converter resolution in bits
    pub adc_full_bits: u8,
    /// Reported potentiometer resolution in bits
    pub adc_bits: u8,
    /// Consecutive out-of-tolerance samples needed to accept a new reading
    pub adc_sample_threshold: u8,
    /// Quiet period after an accepted switch change (ms)
    pub debounce_ms: u32,
    /// Encoder ticks closer together than this count as fast turns (ms)
    pub speed_threshold_ms: u32,
    /// Increment applied per tick on a fast turn
    pub fast_multiplier: i16,
    /// Potentiometers sit behind an external 8-way analog multiplexer
    pub use_multiplexer: bool,
}

impl PanelConfig {
    /// Default configuration, usable in const context
    pub const DEFAULT: Self = Self {
        bus_address: 0x42,
        pots: 16,
        switches: 16,
        encoders: 4,
        adc_full_bits: 12,
        adc_bits: 10,
        adc_sample_threshold: 8,
        debounce_ms: 20,
        speed_threshold_ms: 50,
        fast_multiplier: 4,
        use_multiplexer: true,
    };

    /// Check all limits
    ///
    /// Returns the first violated constraint.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.pots as usize > MAX_POTS {
            return Err(ConfigError::TooManyPots);
        }
        if self.switches as usize > MAX_SWITCHES {
            return Err(ConfigError::TooManySwitches);
        }
        if self.encoders as usize > MAX_ENCODERS {
            return Err(ConfigError::TooManyEncoders);
        }
        if self.total() > MAX_CONTROLLERS {
            return Err(ConfigError::TooManyControllers);
        }
        if self.bus_address < MIN_BUS_ADDRESS || self.bus_address > MAX_BUS_ADDRESS {
            return Err(ConfigError::InvalidBusAddress);
        }
        if self.adc_full_bits > MAX_ADC_BITS
            || self.adc_bits == 0
            || self.adc_bits > self.adc_full_bits
        {
            return Err(ConfigError::InvalidAdcResolution);
        }
        if self.adc_sample_threshold == 0 {
            return Err(ConfigError::InvalidSampleThreshold);
        }
        if self.fast_multiplier < 1 {
            return Err(ConfigError::InvalidFastMultiplier);
        }
        Ok(())
    }

    /// Total controller count
    pub const fn total(&self) -> usize {
        self.pots as usize + self.switches as usize + self.encoders as usize
    }

    /// Bits dropped from each raw ADC sample
    pub const fn mask_bits(&self) -> u8 {
        self.adc_full_bits.saturating_sub(self.adc_bits)
    }

    /// Smallest raw step treated as real movement
    pub const fn mask_unit(&self) -> u16 {
        1u16 << self.mask_bits()
    }

    /// Registry index ranges for each controller class
    pub const fn layout(&self) -> Layout {
        Layout {
            pots: self.pots as usize,
            switches: self.switches as usize,
            encoders: self.encoders as usize,
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Partition of the registry into contiguous class ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Layout {
    pub pots: usize,
    pub switches: usize,
    pub encoders: usize,
}

impl Layout {
    /// Indices `[0, pots)`
    pub const fn pot_range(&self) -> Range<usize> {
        0..self.pots
    }

    /// Indices `[pots, pots + switches)`
    pub const fn switch_range(&self) -> Range<usize> {
        self.pots..self.pots + self.switches
    }

    /// Indices `[pots + switches, total)`
    pub const fn encoder_range(&self) -> Range<usize> {
        self.pots + self.switches..self.total()
    }

    pub const fn total(&self) -> usize {
        self.pots + self.switches + self.encoders
    }
}
