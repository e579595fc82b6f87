//! Panel shared between the acquisition and bus tasks

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use ctlbank_core::{Panel, PanelLock};
use ctlbank_hal_rp2040::OutputLine;

/// Panel behind a critical-section mutex
///
/// Every access runs with interrupts masked, so a bus read-and-clear never
/// interleaves with a filter update.
pub struct SharedPanel(Mutex<CriticalSectionRawMutex, RefCell<Panel<OutputLine<'static>>>>);

impl SharedPanel {
    pub fn new(panel: Panel<OutputLine<'static>>) -> Self {
        Self(Mutex::new(RefCell::new(panel)))
    }
}

impl PanelLock for SharedPanel {
    type Pin = OutputLine<'static>;

    fn with<R>(&self, f: impl FnOnce(&mut Panel<Self::Pin>) -> R) -> R {
        self.0.lock(|panel| f(&mut panel.borrow_mut()))
    }
}
