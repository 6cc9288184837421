//! hpatunerd: the hpatuner controller daemon.
//!
//! Library half of the binary: configuration resolution, logging setup,
//! and the probe server. `main.rs` assembles them with the controller
//! runtime.

pub mod config;
pub mod logging;
pub mod server;

pub use config::{Cli, Command, FileConfig, RunArgs, Settings};
pub use server::{build_router, ProbeState};
