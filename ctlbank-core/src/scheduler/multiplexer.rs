//! External analog multiplexer
//!
//! An 8-way analog switch (4051 style) in front of each ADC input, selected
//! by three binary-coded address lines shared by all multiplexers.

use heapless::Vec;

use ctlbank_hal::OutputPin;

/// Maximum address lines
pub const MAX_SELECT_LINES: usize = 3;

/// Multiplexer address lines, least significant bit first
pub struct Multiplexer<O> {
    select: Vec<O, MAX_SELECT_LINES>,
}

impl<O: OutputPin> Multiplexer<O> {
    /// Take the address lines and select position 0
    pub fn new(select: Vec<O, MAX_SELECT_LINES>) -> Self {
        let mut multiplexer = Self { select };
        multiplexer.select(0);
        multiplexer
    }

    /// Number of selectable positions
    pub fn positions(&self) -> u8 {
        1 << self.select.len()
    }

    /// Route `position` to the ADC inputs
    pub fn select(&mut self, position: u8) {
        for (bit, line) in self.select.iter_mut().enumerate() {
            line.set_state(position & (1 << bit) != 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Line {
        high: bool,
    }

    impl OutputPin for Line {
        fn set_high(&mut self) {
            self.high = true;
        }

        fn set_low(&mut self) {
            self.high = false;
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    fn levels(multiplexer: &Multiplexer<Line>) -> [bool; 3] {
        [
            multiplexer.select[0].high,
            multiplexer.select[1].high,
            multiplexer.select[2].high,
        ]
    }

    #[test]
    fn test_binary_select() {
        let lines = Vec::from_iter([Line::default(), Line::default(), Line::default()]);
        let mut multiplexer = Multiplexer::new(lines);
        assert_eq!(multiplexer.positions(), 8);
        assert_eq!(levels(&multiplexer), [false, false, false]);

        multiplexer.select(0b101);
        assert_eq!(levels(&multiplexer), [true, false, true]);

        multiplexer.select(0b010);
        assert_eq!(levels(&multiplexer), [false, true, false]);

        multiplexer.select(7);
        assert_eq!(levels(&multiplexer), [true, true, true]);
    }

    #[test]
    fn test_two_line_multiplexer() {
        let lines = Vec::from_iter([Line::default(), Line::default()]);
        let multiplexer = Multiplexer::new(lines);
        assert_eq!(multiplexer.positions(), 4);
    }
}
