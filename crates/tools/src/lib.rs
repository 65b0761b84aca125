//! Airhook Tools - glue to the aircrack-ng suite
//!
//! This crate provides:
//! - a `ToolRunner` backed by real OS processes
//! - dependency and privilege checks
//! - monitor-mode interface setup and teardown

pub mod deps;
pub mod interface;
pub mod process;

pub use deps::{ensure_root, ensure_tools, is_root, missing_tools, which};
pub use interface::{
    disable_monitor_mode, enable_monitor_mode, setup_monitor_interface, MonitorInterface,
};
pub use process::{ChildProcess, SystemToolRunner};
