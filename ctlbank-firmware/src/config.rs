//! Build-time panel configuration
//!
//! `build.rs` validates `controller.toml` and generates the constants
//! included here: the [`PanelConfig`] and the board pin map.

use ctlbank_core::PanelConfig;
use defmt::*;

include!(concat!(env!("OUT_DIR"), "/config.rs"));

/// Configuration the firmware runs with
///
/// Falls back to the defaults if the embedded configuration fails the
/// core's own checks.
pub fn panel_config() -> PanelConfig {
    match PANEL.validate() {
        Ok(()) => {
            info!("Using embedded configuration");
            PANEL
        }
        Err(e) => {
            error!("Embedded configuration rejected: {}", e);
            error!("Using fallback configuration");
            PanelConfig::default()
        }
    }
}
