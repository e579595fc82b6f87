//! Rotary encoder quadrature decoder
//!
//! Each sample shifts the (data, clock) line pair into a 4-bit transition
//! code `prev_data prev_clock data clock`. Codes that are not a legal
//! single-step quadrature transition are dropped, which filters contact
//! bounce without any timer. Legal codes are shifted into an 8-bit history;
//! a detent is confirmed only when the last two legal transitions match one
//! of the two sentinel patterns below.
//!
//! ```text
//! clockwise:         00 -> 01 -> 11   codes 0x1, 0x7   history 0x17
//! counter-clockwise: 11 -> 01 -> 00   codes 0xD, 0x4   history 0xD4
//!                    (data, clock)
//! ```

/// Legal transition codes, indexed by `prev_data prev_clock data clock`
const VALID_TRANSITION: [bool; 16] = [
    false, true, true, false, //
    true, false, false, true, //
    true, false, false, true, //
    false, true, true, false,
];

/// History after a complete clockwise detent
pub const CW_PATTERN: u8 = 0x17;

/// History after a complete counter-clockwise detent
pub const CCW_PATTERN: u8 = 0xD4;

/// One confirmed detent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tick {
    Clockwise,
    CounterClockwise,
}

impl Tick {
    /// Signed unit step
    pub fn step(self) -> i16 {
        match self {
            Tick::Clockwise => 1,
            Tick::CounterClockwise => -1,
        }
    }

    /// Step scaled by rotation speed
    ///
    /// Ticks arriving more than `threshold_ms` after the previous one count
    /// as a single step; faster ticks are multiplied by `fast_multiplier`.
    pub fn scaled(self, elapsed_ms: u32, threshold_ms: u32, fast_multiplier: i16) -> i16 {
        if elapsed_ms > threshold_ms {
            self.step()
        } else {
            self.step().saturating_mul(fast_multiplier)
        }
    }
}

/// Decoder state for one encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QuadratureDecoder {
    /// Last 4-bit transition code
    code: u8,
    /// Last two legal transition codes
    history: u8,
}

impl QuadratureDecoder {
    pub const fn new() -> Self {
        Self { code: 0, history: 0 }
    }

    /// Current transition code
    pub fn code(&self) -> u8 {
        self.code
    }

    /// Rolling history of legal transitions
    pub fn history(&self) -> u8 {
        self.history
    }

    /// Whether a transition sequence is in progress
    pub fn is_pending(&self) -> bool {
        self.code != 0
    }

    /// Feed one sample of the encoder lines
    pub fn update(&mut self, clock: bool, data: bool) -> Option<Tick> {
        // Idle detent: nothing to decode until the clock line rises
        if !clock && !self.is_pending() {
            return None;
        }

        self.code = ((self.code << 2) | (u8::from(data) << 1) | u8::from(clock)) & 0x0F;
        if !VALID_TRANSITION[usize::from(self.code)] {
            return None;
        }

        self.history = (self.history << 4) | self.code;
        let tick = match self.history {
            CW_PATTERN => Tick::Clockwise,
            CCW_PATTERN => Tick::CounterClockwise,
            _ => return None,
        };

        self.code = 0;
        self.history = 0;
        Some(tick)
    }
}
