//! ctlbank - Input Bank Firmware
//!
//! Turns an RP2040 into an I2C target exposing potentiometers, switches and
//! rotary encoders as registers. The host is told about changes over an
//! active-low interrupt line and reads the changed registers on demand.
//!
//! Two tasks share one panel:
//! - acquisition: scans multiplexer, switch matrix and encoder matrix
//! - bus: answers host reads and writes

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Level;
use embassy_rp::i2c::InterruptHandler as I2cInterruptHandler;
use embassy_rp::i2c_slave::{self, I2cSlave};
use embassy_rp::peripherals::I2C0;
use embassy_time::Timer;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ctlbank_core::scheduler::Acquisition;
use ctlbank_core::Panel;

use crate::board::Board;
use crate::shared::SharedPanel;

mod board;
mod config;
mod shared;
mod tasks;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => I2cInterruptHandler<I2C0>;
});

// Panel shared by both tasks (must live forever for task references)
static PANEL: StaticCell<SharedPanel> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("ctlbank firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::panel_config();
    info!(
        "Panel: {} pots, {} switches, {} encoders, bus address {:#x}",
        config.pots, config.switches, config.encoders, config.bus_address
    );

    let mut board = Board::new(p);

    // Change line idles high
    let irq = unwrap!(board.pins.output(config::IRQ_PIN, Level::High));
    let panel = PANEL.init(SharedPanel::new(unwrap!(Panel::new(&config, irq))));

    let inputs = board::inputs(&mut board.pins, board.analog);
    let acquisition = Acquisition::new(inputs, &config);
    info!("Inputs initialized");

    let mut bus_config = i2c_slave::Config::default();
    bus_config.addr = u16::from(config.bus_address);
    let target = I2cSlave::new(board.bus.i2c, board.bus.scl, board.bus.sda, Irqs, bus_config);
    info!("I2C target listening");

    spawner.spawn(tasks::acquisition_task(acquisition, panel).unwrap());
    spawner.spawn(tasks::bus_task(target, panel).unwrap());

    info!("All tasks spawned, firmware running");

    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
