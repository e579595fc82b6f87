//! Row/column scan matrix
//!
//! Rows are outputs idling low. To sample a row it is driven high, given a
//! moment to settle, every column is read, and the row is released low
//! again. Switches and encoders use the same matrix discipline; only the
//! per-cell interpretation differs.

use heapless::Vec;

use ctlbank_hal::{Clock, InputPin, OutputPin};

/// Maximum driven rows per matrix
pub const MAX_MATRIX_ROWS: usize = 8;

/// Maximum sensed columns per matrix
pub const MAX_MATRIX_COLUMNS: usize = 16;

/// Settling time after driving a row (µs)
pub const ROW_SETTLE_US: u32 = 5;

/// Column levels of one row, bit `n` set if column `n` read high
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RowLevels(u32);

impl RowLevels {
    pub fn column(&self, column: usize) -> bool {
        column < MAX_MATRIX_COLUMNS && self.0 & (1 << column) != 0
    }

    pub fn bits(&self) -> u32 {
        self.0
    }
}

/// Scan matrix
pub struct Matrix<O, I> {
    rows: Vec<O, MAX_MATRIX_ROWS>,
    columns: Vec<I, MAX_MATRIX_COLUMNS>,
}

impl<O: OutputPin, I: InputPin> Matrix<O, I> {
    /// Take the row and column lines and release every row
    pub fn new(rows: Vec<O, MAX_MATRIX_ROWS>, columns: Vec<I, MAX_MATRIX_COLUMNS>) -> Self {
        let mut matrix = Self { rows, columns };
        for row in matrix.rows.iter_mut() {
            row.set_low();
        }
        matrix
    }

    /// Matrix with no lines, for panels without this input class
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Sample every row
    ///
    /// `visit` receives the row index, its column levels and the time the
    /// row was sampled.
    pub fn scan<C: Clock>(&mut self, clock: &mut C, mut visit: impl FnMut(usize, RowLevels, u32)) {
        for (index, row) in self.rows.iter_mut().enumerate() {
            row.set_high();
            clock.delay_us(ROW_SETTLE_US);

            let levels = self
                .columns
                .iter()
                .enumerate()
                .filter(|(_, column)| column.is_high())
                .fold(0u32, |bits, (n, _)| bits | (1 << n));
            let now_ms = clock.now_ms();

            row.set_low();
            visit(index, RowLevels(levels), now_ms);
        }
    }
}
