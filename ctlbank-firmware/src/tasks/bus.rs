//! I2C target task
//!
//! Maps target-mode bus events onto the panel's two protocol entry points:
//!
//! - host write: `on_receive` with the written bytes
//! - host read: `on_request`, answered with the response bytes
//! - write-then-read: both, in order
//!
//! General calls are ignored. A read that selects no controller is
//! answered with filler bytes only. A write longer than the receive buffer
//! arrives in chunks; everything after the first chunk is drained unseen.

use defmt::*;
use embassy_rp::i2c_slave::{Command, Error, I2cSlave, ReadStatus};
use embassy_rp::peripherals::I2C0;

use ctlbank_core::{PanelLock, WriteFraming};

use crate::shared::SharedPanel;

/// Receive buffer; only the first byte of a write is meaningful
const RX_BUFFER_LEN: usize = 8;

/// Byte clocked out once the response is exhausted
const FILLER: u8 = 0xFF;

#[embassy_executor::task]
pub async fn bus_task(mut target: I2cSlave<'static, I2C0>, panel: &'static SharedPanel) {
    info!("Bus task started");

    let mut buf = [0u8; RX_BUFFER_LEN];
    let mut framing = WriteFraming::new();

    loop {
        match target.listen(&mut buf).await {
            Ok(Command::Write(len)) => receive(panel, framing.accept(&buf[..len], true)),
            Err(Error::PartialWrite(len)) => receive(panel, framing.accept(&buf[..len], false)),
            Ok(Command::Read) => {
                framing.end();
                respond(&mut target, panel).await;
            }
            Ok(Command::WriteRead(len)) => {
                receive(panel, framing.accept(&buf[..len], true));
                respond(&mut target, panel).await;
            }
            Ok(Command::GeneralCall(_)) => {
                framing.end();
                trace!("General call ignored");
            }
            Err(e) => {
                framing.end();
                warn!("Bus error: {}", e);
            }
        }
    }
}

/// Hand a host write to the protocol
fn receive(panel: &SharedPanel, bytes: &[u8]) {
    if !bytes.is_empty() {
        panel.with(|panel| panel.on_receive(bytes));
    }
}

/// Answer a host read
async fn respond(target: &mut I2cSlave<'static, I2C0>, panel: &SharedPanel) {
    let response = panel.with(|panel| panel.on_request());
    trace!("Response: {}", response);

    match target.respond_and_fill(&response.to_wire(FILLER), FILLER).await {
        Ok(ReadStatus::Done) | Ok(ReadStatus::NeedMoreBytes) => {}
        Ok(ReadStatus::LeftoverBytes(n)) => debug!("Host stopped early, {} bytes unsent", n),
        Err(e) => warn!("Bus error while responding: {}", e),
    }
}
