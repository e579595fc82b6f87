//! Board-agnostic core logic for the input bank firmware
//!
//! This crate contains everything that does not depend on a specific chip:
//!
//! - Build-time configuration types and validation
//! - Signal filters (ADC hysteresis, switch debounce, quadrature decoding)
//! - The controller registry shared between acquisition and the bus
//! - The fair dirty-register scanner and change notification line
//! - The two-phase register bus protocol
//! - The acquisition scheduler driving multiplexer and matrix scans
//!
//! ```text
//!   [ Acquisition ] --(samples)--> [ Filters ] --(value, dirty)--> [ Registry ]
//!                                                                     A    |
//!                                              (read + clear dirty)   |    V
//!   [ I2C target ] <--(Response)-- [ BusHandler ] <--------------> [ Scanner ] --> IRQ line
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod log;

pub mod config;
pub mod filter;
pub mod panel;
pub mod protocol;
pub mod registry;
pub mod scanner;
pub mod scheduler;

pub use config::{ConfigError, PanelConfig};
pub use panel::{Panel, PanelLock};
pub use protocol::{BusState, Response, WriteFraming};
pub use registry::{Controller, ControllerKind, Registry};
