//! Acquisition scheduler
//!
//! One [`Acquisition::poll`] call is one pass over every physical input:
//!
//! ```text
//! poll()
//!   ├─ pots:     for position { select mux; for input { sample ADC } }
//!   ├─ switches: for row { drive; read columns; release }
//!   ├─ encoders: for row { drive; read (clock, data) pairs; release }
//!   └─ refresh change line
//! ```
//!
//! Samples are pushed into the panel through a [`PanelLock`], one pot
//! sample or one matrix row per lock, so bus callbacks are never held off
//! for a whole pass.

mod matrix;
mod multiplexer;

pub use matrix::{Matrix, RowLevels, MAX_MATRIX_COLUMNS, MAX_MATRIX_ROWS, ROW_SETTLE_US};
pub use multiplexer::{Multiplexer, MAX_SELECT_LINES};

use ctlbank_hal::{AnalogInput, Clock, InputPin, OutputPin};

use crate::config::{Layout, PanelConfig};
use crate::log::warning;
use crate::panel::PanelLock;

/// Physical input hardware
pub struct Inputs<A, O, I> {
    /// ADC inputs carrying the potentiometers
    pub analog: A,
    /// Address lines of the analog multiplexers, if fitted
    pub multiplexer: Option<Multiplexer<O>>,
    /// Switch matrix, one switch per cell
    pub switches: Matrix<O, I>,
    /// Encoder matrix, one encoder per (clock, data) column pair
    pub encoders: Matrix<O, I>,
}

/// Input acquisition loop state
pub struct Acquisition<A, O, I> {
    inputs: Inputs<A, O, I>,
    layout: Layout,
    /// Multiplexer positions scanned per pass
    positions: u8,
    passes: u32,
}

impl<A, O, I> Acquisition<A, O, I>
where
    A: AnalogInput,
    O: OutputPin,
    I: InputPin,
{
    pub fn new(inputs: Inputs<A, O, I>, config: &PanelConfig) -> Self {
        if A::FULL_BITS != config.adc_full_bits {
            warning!(
                "converter is {} bits, config says {}",
                A::FULL_BITS,
                config.adc_full_bits
            );
        }

        let positions = match (&inputs.multiplexer, config.use_multiplexer) {
            (Some(multiplexer), true) => multiplexer.positions(),
            (None, true) => {
                warning!("multiplexer enabled but no select lines given");
                1
            }
            _ => 1,
        };

        Self {
            inputs,
            layout: config.layout(),
            positions,
            passes: 0,
        }
    }

    /// Completed passes, wrapping
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Run one pass over all inputs
    pub fn poll<L, C>(&mut self, panel: &L, clock: &mut C)
    where
        L: PanelLock,
        C: Clock,
    {
        self.scan_pots(panel, clock);
        self.scan_switches(panel, clock);
        self.scan_encoders(panel, clock);

        panel.with(|panel| panel.refresh_notification());
        self.passes = self.passes.wrapping_add(1);
    }

    fn scan_pots<L: PanelLock, C: Clock>(&mut self, panel: &L, clock: &mut C) {
        if self.layout.pots == 0 {
            return;
        }
        let positions = usize::from(self.positions);
        let inputs = self.inputs.analog.inputs();

        for position in 0..self.positions {
            if let Some(multiplexer) = self.inputs.multiplexer.as_mut().filter(|_| positions > 1) {
                multiplexer.select(position);
            }

            for input in 0..inputs {
                let pot = usize::from(input) * positions + usize::from(position);
                if pot >= self.layout.pots {
                    continue;
                }
                match self.inputs.analog.sample(input) {
                    Ok(raw) => {
                        let now_ms = clock.now_ms();
                        panel.with(|panel| panel.apply_pot_sample(pot, raw, now_ms));
                    }
                    Err(_) => {
                        warning!("adc input {} conversion failed", input);
                    }
                }
            }
        }
    }

    fn scan_switches<L: PanelLock, C: Clock>(&mut self, panel: &L, clock: &mut C) {
        let switches = self.layout.switches;
        if switches == 0 {
            return;
        }
        let columns = self.inputs.switches.column_count();

        self.inputs.switches.scan(clock, |row, levels, now_ms| {
            panel.with(|panel| {
                for column in 0..columns {
                    let switch = row * columns + column;
                    if switch < switches {
                        panel.apply_switch_level(switch, levels.column(column), now_ms);
                    }
                }
            });
        });
    }

    fn scan_encoders<L: PanelLock, C: Clock>(&mut self, panel: &L, clock: &mut C) {
        let encoders = self.layout.encoders;
        if encoders == 0 {
            return;
        }
        let pairs = self.inputs.encoders.column_count() / 2;

        self.inputs.encoders.scan(clock, |row, levels, now_ms| {
            panel.with(|panel| {
                for pair in 0..pairs {
                    let encoder = row * pairs + pair;
                    if encoder < encoders {
                        let clock_line = levels.column(2 * pair);
                        let data_line = levels.column(2 * pair + 1);
                        panel.apply_encoder_lines(encoder, clock_line, data_line, now_ms);
                    }
                }
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use core::cell::{Cell, RefCell};

    use heapless::Vec;

    use super::*;
    use crate::panel::Panel;
    use crate::protocol::Response;

    /// Shared bench wiring: which select position and row are driven, and
    /// the closed switch contacts per row
    #[derive(Default)]
    struct Bench {
        position: Cell<u8>,
        row: Cell<Option<usize>>,
        closed: Cell<[u16; MAX_MATRIX_ROWS]>,
    }

    impl Bench {
        fn close(&self, row: usize, column: usize, closed: bool) {
            let mut rows = self.closed.get();
            if closed {
                rows[row] |= 1 << column;
            } else {
                rows[row] &= !(1 << column);
            }
            self.closed.set(rows);
        }
    }

    enum Line<'a> {
        Select { bit: u8, bench: &'a Bench },
        Row { index: usize, bench: &'a Bench },
        Irq { high: bool },
    }

    impl OutputPin for Line<'_> {
        fn set_high(&mut self) {
            match self {
                Line::Select { bit, bench } => bench.position.set(bench.position.get() | (1 << *bit)),
                Line::Row { index, bench } => bench.row.set(Some(*index)),
                Line::Irq { high } => *high = true,
            }
        }

        fn set_low(&mut self) {
            match self {
                Line::Select { bit, bench } => bench.position.set(bench.position.get() & !(1 << *bit)),
                Line::Row { index, bench } => {
                    if bench.row.get() == Some(*index) {
                        bench.row.set(None);
                    }
                }
                Line::Irq { high } => *high = false,
            }
        }

        fn is_set_high(&self) -> bool {
            match self {
                Line::Select { bit, bench } => bench.position.get() & (1 << *bit) != 0,
                Line::Row { index, bench } => bench.row.get() == Some(*index),
                Line::Irq { high } => *high,
            }
        }
    }

    struct Column<'a> {
        index: usize,
        bench: &'a Bench,
    }

    impl InputPin for Column<'_> {
        fn is_high(&self) -> bool {
            self.bench
                .row
                .get()
                .is_some_and(|row| self.bench.closed.get()[row] & (1 << self.index) != 0)
        }
    }

    /// Two-input 12-bit ADC; reading depends on the multiplexer position
    struct Adc<'a> {
        bench: &'a Bench,
        readings: [[u16; 8]; 2],
        failing: Option<u8>,
    }

    impl AnalogInput for Adc<'_> {
        type Error = ();
        const FULL_BITS: u8 = 12;

        fn inputs(&self) -> u8 {
            2
        }

        fn sample(&mut self, input: u8) -> Result<u16, ()> {
            if self.failing == Some(input) {
                return Err(());
            }
            Ok(self.readings[usize::from(input)][usize::from(self.bench.position.get())])
        }
    }

    struct ManualClock {
        now: u32,
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u32 {
            self.now
        }

        fn delay_us(&mut self, _us: u32) {}
    }

    type TestPanel<'a> = RefCell<Panel<Line<'a>>>;
    type TestAcquisition<'a> = Acquisition<Adc<'a>, Line<'a>, Column<'a>>;

    fn config() -> PanelConfig {
        PanelConfig {
            pots: 16,
            switches: 4,
            encoders: 2,
            ..PanelConfig::DEFAULT
        }
    }

    fn matrix<'a>(bench: &'a Bench, rows: usize, first_column: usize, columns: usize) -> Matrix<Line<'a>, Column<'a>> {
        Matrix::new(
            Vec::from_iter((0..rows).map(|index| Line::Row { index, bench })),
            Vec::from_iter((first_column..first_column + columns).map(|index| Column { index, bench })),
        )
    }

    /// 2 ADC inputs x 8 positions, 2x2 switch matrix, 1 row of 2 encoders
    ///
    /// Switch columns are bench columns 0..2, encoder columns 2..6.
    fn setup<'a>(bench: &'a Bench, config: &PanelConfig) -> (TestPanel<'a>, TestAcquisition<'a>) {
        let panel = RefCell::new(Panel::new(config, Line::Irq { high: false }).unwrap());
        let mut readings = [[0u16; 8]; 2];
        for (input, row) in readings.iter_mut().enumerate() {
            for (position, reading) in row.iter_mut().enumerate() {
                *reading = ((input * 8 + position) as u16) * 100;
            }
        }

        let inputs = Inputs {
            analog: Adc {
                bench,
                readings,
                failing: None,
            },
            multiplexer: Some(Multiplexer::new(Vec::from_iter(
                (0..3).map(|bit| Line::Select { bit, bench }),
            ))),
            switches: matrix(bench, 2, 0, 2),
            encoders: matrix(bench, 1, 2, 4),
        };
        (panel, Acquisition::new(inputs, config))
    }

    fn run(acquisition: &mut TestAcquisition<'_>, panel: &TestPanel<'_>, clock: &mut ManualClock, passes: u32) {
        for _ in 0..passes {
            acquisition.poll(panel, clock);
            clock.now += 1;
        }
    }

    fn read(panel: &TestPanel<'_>, address: u8) -> Response {
        panel.with(|panel| {
            panel.on_receive(&[address]);
            panel.on_request()
        })
    }

    #[test]
    fn test_pot_index_follows_input_and_position() {
        let bench = Bench::default();
        let (panel, mut acquisition) = setup(&bench, &config());
        let mut clock = ManualClock { now: 1000 };

        run(&mut acquisition, &panel, &mut clock, 8);
        assert_eq!(acquisition.passes(), 8);

        panel.with(|panel| {
            // pot = input * 8 + position, which is how the readings were laid out
            for pot in 1..16 {
                let controller = panel.registry().get(pot).unwrap();
                assert_eq!(controller.value(), (pot as i16) * 100, "pot {}", pot);
            }
            // Pot 0 reads 0, same as its reset value
            assert!(!panel.registry().get(0).unwrap().is_dirty());
        });
        assert_eq!(read(&panel, 3), Response::Value(50));
    }

    #[test]
    fn test_failed_conversion_skipped() {
        let bench = Bench::default();
        let (panel, mut acquisition) = setup(&bench, &config());
        acquisition.inputs.analog.failing = Some(1);
        let mut clock = ManualClock { now: 1000 };

        run(&mut acquisition, &panel, &mut clock, 8);

        panel.with(|panel| {
            assert!(panel.registry().get(1).unwrap().is_dirty());
            assert!(!panel.registry().get(9).unwrap().is_dirty());
        });
    }

    #[test]
    fn test_switch_matrix_and_change_line() {
        let bench = Bench::default();
        let config = PanelConfig { pots: 0, ..config() };
        let (panel, mut acquisition) = setup(&bench, &config);
        let mut clock = ManualClock { now: 1000 };

        run(&mut acquisition, &panel, &mut clock, 1);
        assert!(!panel.with(|panel| panel.is_notifying()));

        // Row 1, column 0 is switch 2, registry index 2, address 3
        bench.close(1, 0, true);
        run(&mut acquisition, &panel, &mut clock, 1);
        assert!(panel.with(|panel| panel.is_notifying()));
        assert_eq!(panel.with(|panel| panel.on_request()), Response::Dirty(3));

        assert_eq!(read(&panel, 3), Response::Value(1));
        assert!(!panel.with(|panel| panel.is_notifying()));
    }

    #[test]
    fn test_encoder_pairs() {
        let bench = Bench::default();
        let config = PanelConfig {
            pots: 0,
            switches: 0,
            ..config()
        };
        let (panel, mut acquisition) = setup(&bench, &config);
        let mut clock = ManualClock { now: 1000 };

        // Second encoder: clock on bench column 4, data on column 5.
        // Clockwise detent, (data, clock): 00 -> 01 -> 11
        run(&mut acquisition, &panel, &mut clock, 1);
        bench.close(0, 4, true);
        run(&mut acquisition, &panel, &mut clock, 1);
        bench.close(0, 5, true);
        run(&mut acquisition, &panel, &mut clock, 1);

        panel.with(|panel| {
            assert!(!panel.registry().get(0).unwrap().is_dirty());
            assert_eq!(panel.registry().get(1).unwrap().value(), 1);
        });
        assert_eq!(read(&panel, 2), Response::Value(1));
        assert_eq!(read(&panel, 2), Response::Value(0));
    }

    #[test]
    fn test_without_multiplexer() {
        let bench = Bench::default();
        let config = PanelConfig {
            pots: 2,
            switches: 0,
            encoders: 0,
            use_multiplexer: false,
            ..config()
        };
        let (panel, mut acquisition) = setup(&bench, &config);
        let mut clock = ManualClock { now: 1000 };

        run(&mut acquisition, &panel, &mut clock, 8);

        // One position: pot = input, always at mux position 0
        panel.with(|panel| {
            assert_eq!(panel.registry().get(1).unwrap().value(), 800);
        });
        assert_eq!(bench.position.get(), 0);
    }
}
