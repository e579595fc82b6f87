//! Signal conditioning for each controller class
//!
//! Every filter turns raw electrical samples into a clean logical value and
//! reports only accepted changes. Filters never fail: a rejected sample is
//! simply "no change".
//!
//! - [`adc`] - tolerance band plus run-length confirmation for potentiometers
//! - [`debounce`] - quiet-period acceptance for switches
//! - [`quadrature`] - validity table and sentinel history for encoders

pub mod adc;
pub mod debounce;
pub mod quadrature;

pub use adc::AdcFilter;
pub use quadrature::{QuadratureDecoder, Tick};
