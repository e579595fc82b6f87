//! ctlbank Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the input engine is written
//! against. Chip-specific crates (currently RP2040) implement them, and
//! host tests implement them with plain structs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  ctlbank-core (filters, registry, bus)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ctlbank-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ ctlbank-hal-  │       │  host mocks   │
//! │    rp2040     │       │  (tests)      │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`adc::AnalogInput`] - Bank of analog inputs sharing one converter
//! - [`clock::Clock`] - Wrapping millisecond clock and short busy waits

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod clock;
pub mod gpio;

// Re-export key traits at crate root for convenience
pub use adc::AnalogInput;
pub use clock::Clock;
pub use gpio::{InputPin, OutputPin};
