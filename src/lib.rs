pub mod api;
pub mod config;
pub mod consts;
pub mod coordinator;
pub mod core_types;
pub mod corridor;
pub mod driver;
pub mod error;
pub mod kernel;
pub mod lag_distance;
pub mod memory;
pub mod selector;
pub mod stepsize;
// cmd and reports are modules of the binary crate (main.rs).
