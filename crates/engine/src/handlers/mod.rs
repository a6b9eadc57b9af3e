// crates/engine/src/handlers/mod.rs
//! Built-in handlers, one per job type.

mod generate_report;
mod long_running;
mod process_data;
mod simulate_load;

pub use generate_report::GenerateReportHandler;
pub use long_running::LongRunningTaskHandler;
pub use process_data::ProcessDataHandler;
pub use simulate_load::SimulateLoadHandler;
