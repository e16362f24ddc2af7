//! Port traits at the I/O seams of the simulator.

pub mod config_port;
pub mod data_port;
pub mod indicator_port;
pub mod report_port;
