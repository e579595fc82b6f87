//! Input acquisition task
//!
//! Scans every input as fast as the executor allows, yielding after each
//! pass so the bus task is never starved.

use defmt::*;
use embassy_futures::yield_now;

use ctlbank_hal::Clock;
use ctlbank_hal_rp2040::EmbassyClock;

use crate::board::BoardAcquisition;
use crate::shared::SharedPanel;

/// Interval between scan-rate reports (ms)
const RATE_REPORT_MS: u32 = 10_000;

#[embassy_executor::task]
pub async fn acquisition_task(mut acquisition: BoardAcquisition, panel: &'static SharedPanel) {
    info!("Acquisition task started");

    let mut clock = EmbassyClock::new();
    let mut report_ms = clock.now_ms();
    let mut report_passes = acquisition.passes();

    loop {
        acquisition.poll(panel, &mut clock);

        let elapsed = clock.elapsed_since(report_ms);
        if elapsed >= RATE_REPORT_MS {
            let passes = acquisition.passes().wrapping_sub(report_passes);
            debug!("Scan rate: {} passes/s", passes / (elapsed / 1000));
            report_ms = clock.now_ms();
            report_passes = acquisition.passes();
        }

        yield_now().await;
    }
}
