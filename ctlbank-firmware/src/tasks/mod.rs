//! Embassy async tasks
//!
//! Both tasks share the panel through [`SharedPanel`](crate::shared::SharedPanel).

pub mod acquisition;
pub mod bus;

pub use acquisition::acquisition_task;
pub use bus::bus_task;
