//! Register bus protocol
//!
//! Two-phase exchange with the host:
//!
//! - **Receive** (host writes one byte): a 1-based register address. `0`
//!   selects scan-report mode; `1..=N` selects controller `address - 1` and
//!   moves the scan cursor just past it. Bytes after the first are dropped.
//! - **Request** (host reads): in scan-report mode, one byte with the
//!   address of the next dirty controller (0 if none). With a register
//!   selected, two bytes little-endian signed value; the controller's dirty
//!   flag and the selection are cleared.
//!
//! ```text
//!            receive(a != 0)
//!   Idle ------------------------> AwaitingValue(a)
//!    | ^ <------------------------      |
//!    | |        request()               | receive(..)
//!    +-+ request() / receive(0)         +----> (reselect)
//! ```
//!
//! An address beyond the last controller is never dereferenced: the
//! following request answers with no payload and returns to `Idle`.

use heapless::Vec;

use crate::log::{debug, trace};
use crate::registry::Registry;
use crate::scanner::ChangeScanner;

/// Largest response payload
pub const MAX_RESPONSE_LEN: usize = 2;

/// Handler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// No register selected; requests get a scan report
    #[default]
    Idle,
    /// Register address (1-based) selected by the last receive
    AwaitingValue(u8),
}

/// Reply to a host read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// 1-based address of the next dirty controller, 0 if none
    Dirty(u8),
    /// Value of the selected controller after its read transform
    Value(i16),
    /// Selected address was out of range; nothing to send
    Empty,
}

impl Response {
    /// Wire encoding
    pub fn to_bytes(&self) -> Vec<u8, MAX_RESPONSE_LEN> {
        let encoded = match self {
            Response::Dirty(address) => Vec::from_slice(&[*address]),
            Response::Value(value) => Vec::from_slice(&value.to_le_bytes()),
            Response::Empty => Ok(Vec::new()),
        };
        // Capacity covers the largest variant
        encoded.unwrap_or_default()
    }

    /// Bytes handed to the bus peripheral
    ///
    /// Never empty: a read the target leaves unanswered stays pending and
    /// is reported again, so `Empty` goes out as a single filler byte.
    pub fn to_wire(&self, filler: u8) -> Vec<u8, MAX_RESPONSE_LEN> {
        let mut bytes = self.to_bytes();
        if bytes.is_empty() {
            // Cannot fail on an empty buffer
            let _ = bytes.push(filler);
        }
        bytes
    }
}

/// Write framing across receive buffer overflows
///
/// The target peripheral hands a write longer than its receive buffer over
/// in several chunks, and the later chunks look like fresh writes. Only the
/// first chunk of a transaction carries the register address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WriteFraming {
    draining: bool,
}

impl WriteFraming {
    pub const fn new() -> Self {
        Self { draining: false }
    }

    /// True while the tail of an overflowed write is being dropped
    pub fn is_draining(&self) -> bool {
        self.draining
    }

    /// Bytes of a write chunk that belong to the protocol
    ///
    /// `complete` is false when the chunk filled the receive buffer before
    /// the host stopped writing.
    pub fn accept<'a>(&mut self, chunk: &'a [u8], complete: bool) -> &'a [u8] {
        let accepted = if self.draining {
            trace!("draining {} bytes of an overflowed write", chunk.len());
            &[]
        } else {
            chunk
        };
        self.draining = !complete;
        accepted
    }

    /// A read or a bus error ends any write in progress
    pub fn end(&mut self) {
        self.draining = false;
    }
}

/// Register bus state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusHandler {
    state: BusState,
}

impl BusHandler {
    pub const fn new() -> Self {
        Self {
            state: BusState::Idle,
        }
    }

    pub fn state(&self) -> BusState {
        self.state
    }

    /// Handle a host write
    ///
    /// Only the first byte is meaningful; an empty write is ignored.
    pub fn on_receive(&mut self, bytes: &[u8], registry: &Registry, scanner: &mut ChangeScanner) {
        let Some(&address) = bytes.first() else {
            return;
        };
        if bytes.len() > 1 {
            trace!("dropping {} extra bytes", bytes.len() - 1);
        }

        if usize::from(address) <= registry.len() {
            scanner.reposition(usize::from(address), registry);
        } else {
            debug!("register {} out of range", address);
        }

        self.state = match address {
            0 => BusState::Idle,
            selected => BusState::AwaitingValue(selected),
        };
    }

    /// Handle a host read
    pub fn on_request(&mut self, registry: &mut Registry, scanner: &mut ChangeScanner) -> Response {
        match core::mem::take(&mut self.state) {
            BusState::Idle => {
                let next = scanner
                    .report_next_dirty(registry)
                    .and_then(|index| u8::try_from(index + 1).ok())
                    .unwrap_or(0);
                Response::Dirty(next)
            }
            BusState::AwaitingValue(address) => usize::from(address)
                .checked_sub(1)
                .and_then(|index| registry.read_out(index))
                .map_or(Response::Empty, Response::Value),
        }
    }
}
