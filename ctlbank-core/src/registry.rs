//! Controller registry
//!
//! Fixed-capacity table of every input on the panel. Indices are stable and
//! partitioned into three contiguous ranges (potentiometers, switches,
//! encoders); the register address seen by the host is `index + 1`.
//!
//! The acquisition side writes through the `apply_*` methods, which run the
//! class filter and set the dirty flag on accepted changes. The bus side
//! reads through [`Registry::read_out`], which applies the per-class read
//! transform and clears the flag.

use heapless::Vec;

use crate::config::{ConfigError, Layout, PanelConfig, MAX_CONTROLLERS};
use crate::filter::{adc, debounce, AdcFilter, QuadratureDecoder};
use crate::log::trace;

/// Controller class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerKind {
    Potentiometer,
    Switch,
    Encoder,
}

/// Per-class filter state
///
/// The variant is chosen once at construction and fixes the controller's
/// kind for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum FilterState {
    Adc(AdcFilter),
    Debounce,
    Quadrature(QuadratureDecoder),
}

/// One physical input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Controller {
    /// Raw ADC reading, switch level (0/1) or accumulated encoder delta
    value: i16,
    /// Value changed since the last bus read
    dirty: bool,
    /// Timestamp of the last accepted change (ms)
    last_change_ms: u32,
    state: FilterState,
}

impl Controller {
    fn new(state: FilterState) -> Self {
        Self {
            value: 0,
            dirty: false,
            last_change_ms: 0,
            state,
        }
    }

    pub fn kind(&self) -> ControllerKind {
        match self.state {
            FilterState::Adc(_) => ControllerKind::Potentiometer,
            FilterState::Debounce => ControllerKind::Switch,
            FilterState::Quadrature(_) => ControllerKind::Encoder,
        }
    }

    /// Stored value before the read transform
    pub fn value(&self) -> i16 {
        self.value
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_change_ms(&self) -> u32 {
        self.last_change_ms
    }

    fn mark_changed(&mut self, value: i16, now_ms: u32) {
        self.value = value;
        self.dirty = true;
        self.last_change_ms = now_ms;
    }
}

/// Filter parameters copied out of [`PanelConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct FilterParams {
    mask_bits: u8,
    mask_unit: u16,
    sample_threshold: u8,
    debounce_ms: u32,
    speed_threshold_ms: u32,
    fast_multiplier: i16,
}

/// Table of all controllers
#[derive(Debug, Clone)]
pub struct Registry {
    controllers: Vec<Controller, MAX_CONTROLLERS>,
    layout: Layout,
    params: FilterParams,
}

impl Registry {
    /// Create and type every controller described by `config`
    pub fn new(config: &PanelConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let layout = config.layout();
        let mut controllers = Vec::new();
        let kinds = core::iter::repeat(FilterState::Adc(AdcFilter::new()))
            .take(layout.pots)
            .chain(core::iter::repeat(FilterState::Debounce).take(layout.switches))
            .chain(
                core::iter::repeat(FilterState::Quadrature(QuadratureDecoder::new()))
                    .take(layout.encoders),
            );
        for state in kinds {
            controllers
                .push(Controller::new(state))
                .map_err(|_| ConfigError::TooManyControllers)?;
        }

        Ok(Self {
            controllers,
            layout,
            params: FilterParams {
                mask_bits: config.mask_bits(),
                mask_unit: config.mask_unit(),
                sample_threshold: config.adc_sample_threshold,
                debounce_ms: config.debounce_ms,
                speed_threshold_ms: config.speed_threshold_ms,
                fast_multiplier: config.fast_multiplier,
            },
        })
    }

    /// Number of controllers
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn get(&self, index: usize) -> Option<&Controller> {
        self.controllers.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Controller> {
        self.controllers.iter()
    }

    /// Whether any controller has an unread change
    pub fn any_dirty(&self) -> bool {
        self.controllers.iter().any(Controller::is_dirty)
    }

    /// Feed a raw conversion to potentiometer `pot`
    ///
    /// Returns true if the reading was accepted.
    pub fn apply_pot_sample(&mut self, pot: usize, raw: u16, now_ms: u32) -> bool {
        if pot >= self.layout.pots {
            return false;
        }
        let params = self.params;
        let controller = &mut self.controllers[pot];
        let FilterState::Adc(ref mut filter) = controller.state else {
            return false;
        };

        // Values are bounded by MAX_ADC_BITS and never negative
        let stored = controller.value as u16;
        match filter.update(stored, raw, params.mask_unit, params.sample_threshold) {
            Some(accepted) => {
                controller.mark_changed(accepted as i16, now_ms);
                trace!("pot {} -> {}", pot, accepted);
                true
            }
            None => false,
        }
    }

    /// Feed a sampled level to switch `switch`
    ///
    /// Returns true if the level change was accepted.
    pub fn apply_switch_level(&mut self, switch: usize, level: bool, now_ms: u32) -> bool {
        if switch >= self.layout.switches {
            return false;
        }
        let window = self.params.debounce_ms;
        let controller = &mut self.controllers[self.layout.switch_range().start + switch];
        if !matches!(controller.state, FilterState::Debounce) {
            return false;
        }

        let stored = controller.value != 0;
        if debounce::accept(stored, level, controller.last_change_ms, now_ms, window) {
            controller.mark_changed(i16::from(level), now_ms);
            trace!("switch {} -> {}", switch, level);
            true
        } else {
            false
        }
    }

    /// Feed the (clock, data) line pair of encoder `encoder`
    ///
    /// Returns true if a detent was confirmed.
    pub fn apply_encoder_lines(&mut self, encoder: usize, clock: bool, data: bool, now_ms: u32) -> bool {
        if encoder >= self.layout.encoders {
            return false;
        }
        let params = self.params;
        let controller = &mut self.controllers[self.layout.encoder_range().start + encoder];
        let FilterState::Quadrature(ref mut decoder) = controller.state else {
            return false;
        };

        let Some(tick) = decoder.update(clock, data) else {
            return false;
        };
        let elapsed = now_ms.wrapping_sub(controller.last_change_ms);
        let step = tick.scaled(elapsed, params.speed_threshold_ms, params.fast_multiplier);
        let value = controller.value.saturating_add(step);
        controller.mark_changed(value, now_ms);
        trace!("encoder {} {} -> {}", encoder, step, value);
        true
    }

    /// Read a controller's reported value and clear its dirty flag
    ///
    /// Potentiometers report the quantized reading, switches their level,
    /// encoders the delta since the previous read (then reset to zero).
    /// Returns `None` if `index` is out of range.
    pub fn read_out(&mut self, index: usize) -> Option<i16> {
        let mask_bits = self.params.mask_bits;
        let controller = self.controllers.get_mut(index)?;
        controller.dirty = false;

        let reported = match controller.state {
            FilterState::Adc(_) => adc::quantize(controller.value as u16, mask_bits) as i16,
            FilterState::Debounce => controller.value,
            FilterState::Quadrature(_) => core::mem::take(&mut controller.value),
        };
        Some(reported)
    }
}
