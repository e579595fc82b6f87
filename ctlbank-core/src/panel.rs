//! Panel aggregate
//!
//! Owns everything that the acquisition loop and the bus callbacks share:
//! the registry, the scan cursor, the bus handler state and the change
//! interrupt line. Both sides reach it only through a [`PanelLock`], which
//! the firmware backs with a critical-section mutex.

use core::cell::RefCell;

use ctlbank_hal::OutputPin;

use crate::config::{ConfigError, PanelConfig};
use crate::protocol::{BusHandler, BusState, Response};
use crate::registry::Registry;
use crate::scanner::{ChangeScanner, Notifier};

/// Shared input bank state
pub struct Panel<P> {
    registry: Registry,
    scanner: ChangeScanner,
    bus: BusHandler,
    notifier: Notifier<P>,
}

impl<P: OutputPin> Panel<P> {
    /// Build the registry and take the interrupt line (driven idle)
    pub fn new(config: &PanelConfig, irq: P) -> Result<Self, ConfigError> {
        Ok(Self {
            registry: Registry::new(config)?,
            scanner: ChangeScanner::new(),
            bus: BusHandler::new(),
            notifier: Notifier::new(irq),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn scanner(&self) -> &ChangeScanner {
        &self.scanner
    }

    pub fn bus_state(&self) -> BusState {
        self.bus.state()
    }

    /// Whether the change line is currently asserted
    pub fn is_notifying(&self) -> bool {
        self.notifier.is_asserted()
    }

    /// Next dirty controller from the cursor, without moving it
    pub fn next_dirty(&self) -> Option<usize> {
        self.scanner.find_next_dirty(&self.registry)
    }

    pub fn apply_pot_sample(&mut self, pot: usize, raw: u16, now_ms: u32) -> bool {
        self.registry.apply_pot_sample(pot, raw, now_ms)
    }

    pub fn apply_switch_level(&mut self, switch: usize, level: bool, now_ms: u32) -> bool {
        self.registry.apply_switch_level(switch, level, now_ms)
    }

    pub fn apply_encoder_lines(&mut self, encoder: usize, clock: bool, data: bool, now_ms: u32) -> bool {
        self.registry.apply_encoder_lines(encoder, clock, data, now_ms)
    }

    /// Re-evaluate the change line
    pub fn refresh_notification(&mut self) {
        let pending = self.next_dirty().is_some();
        self.notifier.update(pending);
    }

    /// Bus receive callback
    pub fn on_receive(&mut self, bytes: &[u8]) {
        self.bus.on_receive(bytes, &self.registry, &mut self.scanner);
    }

    /// Bus request callback
    ///
    /// A value read clears the controller's dirty flag, so the change line
    /// is re-evaluated afterwards.
    pub fn on_request(&mut self) -> Response {
        let response = self.bus.on_request(&mut self.registry, &mut self.scanner);
        if let Response::Value(_) = response {
            self.refresh_notification();
        }
        response
    }
}

/// Exclusive access to a [`Panel`]
///
/// Every registry access from the acquisition loop and from the bus goes
/// through `with`, so a bus read-and-clear never interleaves with a filter
/// update.
pub trait PanelLock {
    type Pin: OutputPin;

    fn with<R>(&self, f: impl FnOnce(&mut Panel<Self::Pin>) -> R) -> R;
}

/// Single-context access for host tests and simple loops
impl<P: OutputPin> PanelLock for RefCell<Panel<P>> {
    type Pin = P;

    fn with<R>(&self, f: impl FnOnce(&mut Panel<P>) -> R) -> R {
        f(&mut self.borrow_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct IrqPin {
        high: bool,
    }

    impl OutputPin for IrqPin {
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

    fn panel() -> Panel<IrqPin> {
        Panel::new(
            &PanelConfig {
                pots: 1,
                switches: 2,
                encoders: 1,
                ..PanelConfig::DEFAULT
            },
            IrqPin::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_line_idle_at_start() {
        let panel = panel();
        assert!(!panel.is_notifying());
    }

    #[test]
    fn test_value_read_releases_line() {
        let mut panel = panel();
        panel.apply_switch_level(0, true, 1000);
        panel.refresh_notification();
        assert!(panel.is_notifying());

        panel.on_receive(&[2]);
        assert_eq!(panel.on_request(), Response::Value(1));
        assert!(!panel.is_notifying());
    }

    #[test]
    fn test_line_stays_asserted_while_others_dirty() {
        let mut panel = panel();
        panel.apply_switch_level(0, true, 1000);
        panel.apply_switch_level(1, true, 1000);
        panel.refresh_notification();

        panel.on_receive(&[2]);
        panel.on_request();
        assert!(panel.is_notifying());
        assert_eq!(panel.next_dirty(), Some(2));
    }

    #[test]
    fn test_scan_report_keeps_line() {
        let mut panel = panel();
        panel.apply_switch_level(1, true, 1000);
        panel.refresh_notification();

        assert_eq!(panel.on_request(), Response::Dirty(3));
        assert!(panel.is_notifying());
    }

    #[test]
    fn test_refcell_lock() {
        let shared = RefCell::new(panel());
        let accepted = shared.with(|panel| panel.apply_switch_level(0, true, 1000));
        assert!(accepted);
        assert!(shared.with(|panel| panel.registry().any_dirty()));
    }

    // Host-side scenarios driven through the lock, the way the firmware
    // tasks drive the panel

    type TestPanel = RefCell<Panel<IrqPin>>;

    fn shared(config: PanelConfig) -> TestPanel {
        RefCell::new(Panel::new(&config, IrqPin::default()).unwrap())
    }

    /// Host write of a register address followed by a host read
    fn read_register(panel: &TestPanel, address: u8) -> Response {
        panel.with(|panel| {
            panel.on_receive(&[address]);
            panel.on_request()
        })
    }

    /// Host read in scan-report mode
    fn scan_report(panel: &TestPanel) -> u8 {
        match panel.with(|panel| panel.on_request()) {
            Response::Dirty(address) => address,
            other => panic!("expected scan report, got {:?}", other),
        }
    }

    /// Feed one (clock, data) sample to encoder 0 and refresh the line
    fn encoder_sample(panel: &TestPanel, clock: bool, data: bool, now_ms: u32) {
        panel.with(|panel| {
            panel.apply_encoder_lines(0, clock, data, now_ms);
            panel.refresh_notification();
        });
    }

    fn encoder_only() -> PanelConfig {
        PanelConfig {
            pots: 0,
            switches: 0,
            encoders: 1,
            ..PanelConfig::DEFAULT
        }
    }

    #[test]
    fn test_adc_reading_accepted_after_threshold() {
        // 12-bit converter reported at 10 bits: mask unit 4
        let panel = shared(PanelConfig {
            pots: 1,
            switches: 0,
            encoders: 0,
            adc_full_bits: 12,
            adc_bits: 10,
            adc_sample_threshold: 8,
            ..PanelConfig::DEFAULT
        });

        // Settle on 1000 first
        panel.with(|panel| {
            for now in 0..8 {
                panel.apply_pot_sample(0, 1000, now);
            }
        });
        assert_eq!(read_register(&panel, 1), Response::Value(250));

        // Jitter inside the tolerance band never reports
        panel.with(|panel| {
            for (now, raw) in [1001, 1003, 998, 997, 1002, 1000, 999, 1003, 1001].into_iter().enumerate() {
                panel.apply_pot_sample(0, raw, 100 + now as u32);
                panel.refresh_notification();
                assert!(!panel.is_notifying());
            }
        });

        // A real move becomes visible on the 8th consecutive sample
        panel.with(|panel| {
            for sample in 1..=8u32 {
                panel.apply_pot_sample(0, 1100, 200 + sample);
                panel.refresh_notification();
                assert_eq!(panel.is_notifying(), sample == 8, "sample {}", sample);
            }
        });
        assert_eq!(scan_report(&panel), 1);
        assert_eq!(read_register(&panel, 1), Response::Value(1100 >> 2));
        assert!(!panel.with(|panel| panel.is_notifying()));
    }

    #[test]
    fn test_adc_run_restarts_on_return_to_band() {
        let panel = shared(PanelConfig {
            pots: 1,
            switches: 0,
            encoders: 0,
            ..PanelConfig::DEFAULT
        });

        panel.with(|panel| {
            for now in 0..7 {
                panel.apply_pot_sample(0, 2000, now);
            }
            // Back near the stored 0: run restarts
            panel.apply_pot_sample(0, 2, 7);
            for now in 8..15 {
                panel.apply_pot_sample(0, 2000, now);
            }
            assert!(!panel.registry().any_dirty());
            panel.apply_pot_sample(0, 2000, 15);
            assert!(panel.registry().any_dirty());
        });
    }

    #[test]
    fn test_quadrature_slow_then_fast_clockwise() {
        let panel = shared(encoder_only());

        // (clock, data): 10 then 11 completes history 0x17
        encoder_sample(&panel, true, false, 1000);
        assert!(!panel.with(|panel| panel.is_notifying()));
        encoder_sample(&panel, true, true, 1000);
        assert!(panel.with(|panel| panel.is_notifying()));
        assert_eq!(read_register(&panel, 1), Response::Value(1));

        // Back to rest, then another detent well inside the speed threshold
        encoder_sample(&panel, false, false, 1005);
        encoder_sample(&panel, true, false, 1010);
        encoder_sample(&panel, true, true, 1010);
        assert_eq!(read_register(&panel, 1), Response::Value(4));

        // Nothing turned since the last read
        assert_eq!(read_register(&panel, 1), Response::Value(0));
    }

    #[test]
    fn test_quadrature_counter_clockwise() {
        let panel = shared(encoder_only());

        // (data, clock): 11 -> 01 -> 00 gives codes 0xD, 0x4
        let detent = |now_ms| {
            encoder_sample(&panel, true, true, now_ms);
            encoder_sample(&panel, true, false, now_ms);
            encoder_sample(&panel, false, false, now_ms);
        };

        detent(2000);
        assert!(panel.with(|panel| panel.is_notifying()));
        assert_eq!(read_register(&panel, 1), Response::Value(-1));

        detent(2010);
        assert_eq!(read_register(&panel, 1), Response::Value(-4));
    }

    #[test]
    fn test_out_of_range_register_answers_empty() {
        let panel = shared(PanelConfig {
            pots: 2,
            switches: 2,
            encoders: 1,
            ..PanelConfig::DEFAULT
        });
        panel.with(|panel| {
            panel.apply_switch_level(0, true, 1000);
            panel.refresh_notification();
        });

        assert_eq!(read_register(&panel, 6), Response::Empty);
        assert_eq!(read_register(&panel, 255), Response::Empty);
        assert_eq!(panel.with(|panel| panel.bus_state()), BusState::Idle);

        // The pending switch is still reported and readable
        assert!(panel.with(|panel| panel.is_notifying()));
        assert_eq!(scan_report(&panel), 3);
        assert_eq!(read_register(&panel, 3), Response::Value(1));
    }

    #[test]
    fn test_host_polling_loop_drains_all_changes() {
        let panel = shared(PanelConfig {
            pots: 0,
            switches: 8,
            encoders: 0,
            ..PanelConfig::DEFAULT
        });
        panel.with(|panel| {
            for switch in [1, 4, 7] {
                panel.apply_switch_level(switch, true, 1000);
            }
            panel.refresh_notification();
        });

        let mut seen = Vec::new();
        while panel.with(|panel| panel.is_notifying()) {
            let address = scan_report(&panel);
            assert_ne!(address, 0);
            assert_eq!(read_register(&panel, address), Response::Value(1));
            seen.push(address);
            assert!(seen.len() <= 3, "line never released");
        }

        assert_eq!(seen, [2, 5, 8]);
        assert_eq!(scan_report(&panel), 0);
    }

    #[test]
    fn test_busy_low_register_does_not_starve_others() {
        let panel = shared(PanelConfig {
            pots: 0,
            switches: 4,
            encoders: 0,
            ..PanelConfig::DEFAULT
        });
        panel.with(|panel| {
            panel.apply_switch_level(3, true, 1000);
        });

        // Switch 0 toggles every round, faster than the host drains it
        let mut reported = Vec::new();
        for round in 0..4u32 {
            panel.with(|panel| {
                panel.apply_switch_level(0, round % 2 == 0, 1000 + 100 * round);
            });
            reported.push(scan_report(&panel));
        }

        assert!(reported.contains(&4), "reports: {:?}", reported);
    }
}
