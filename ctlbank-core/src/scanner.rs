//! Dirty-controller scanner and change notification line
//!
//! The scanner looks for changed controllers starting at a rotating cursor
//! rather than at index 0, so a continuously changing low-index controller
//! cannot starve reports for higher indices.

use ctlbank_hal::OutputPin;

use crate::registry::Registry;

/// Rotating dirty-controller finder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChangeScanner {
    /// Index the next scan starts from
    cursor: usize,
}

impl ChangeScanner {
    pub const fn new() -> Self {
        Self { cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// First dirty controller at or after the cursor, wrapping
    ///
    /// Visits every index at most once. The cursor is not moved.
    pub fn find_next_dirty(&self, registry: &Registry) -> Option<usize> {
        let len = registry.len();
        if len == 0 {
            return None;
        }
        let start = self.cursor % len;
        (0..len)
            .map(|offset| (start + offset) % len)
            .find(|&index| registry.get(index).is_some_and(|c| c.is_dirty()))
    }

    /// Like [`find_next_dirty`](Self::find_next_dirty), then move the cursor
    /// just past the reported controller
    ///
    /// Repeated calls walk through every dirty controller once before
    /// reporting any of them again.
    pub fn report_next_dirty(&mut self, registry: &Registry) -> Option<usize> {
        let found = self.find_next_dirty(registry)?;
        self.cursor = (found + 1) % registry.len();
        Some(found)
    }

    /// Restart scanning at `index`
    ///
    /// Out-of-range values wrap so the cursor always names a valid index.
    pub fn reposition(&mut self, index: usize, registry: &Registry) {
        self.cursor = match registry.len() {
            0 => 0,
            len => index % len,
        };
    }
}

/// Active-low change interrupt line
///
/// Driven low whenever at least one controller is dirty, high otherwise.
pub struct Notifier<P> {
    pin: P,
}

impl<P: OutputPin> Notifier<P> {
    /// Take the line and drive it to idle
    pub fn new(mut pin: P) -> Self {
        pin.set_high();
        Self { pin }
    }

    /// Drive the line from the current dirty state
    pub fn update(&mut self, pending: bool) {
        self.pin.set_state(!pending);
    }

    /// Whether the line is currently asserted
    pub fn is_asserted(&self) -> bool {
        self.pin.is_set_low()
    }

    /// Give the pin back
    pub fn release(self) -> P {
        self.pin
    }
}
