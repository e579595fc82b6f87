//! GPIO line wrappers
//!
//! Thin newtypes so embassy-rp pins can implement the `ctlbank-hal` traits.

use embassy_rp::gpio::{Input, Output};

use ctlbank_hal::{InputPin, OutputPin};

/// Maximum number of GPIO pins on RP2040
pub const GPIO_COUNT: usize = 30;

/// Push-pull output line
pub struct OutputLine<'d>(Output<'d>);

impl<'d> OutputLine<'d> {
    pub fn new(output: Output<'d>) -> Self {
        Self(output)
    }
}

impl OutputPin for OutputLine<'_> {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}

/// Sensed input line
pub struct InputLine<'d>(Input<'d>);

impl<'d> InputLine<'d> {
    pub fn new(input: Input<'d>) -> Self {
        Self(input)
    }
}

impl InputPin for InputLine<'_> {
    fn is_high(&self) -> bool {
        self.0.is_high()
    }
}
