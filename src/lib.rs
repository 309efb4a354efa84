//! docs-mirror: pull versioned documentation folders from GitHub repositories
//! into a local static-site content tree and generate a contents page per
//! source.
//!
//! The CLI surface lives in [`cli`]; all mirroring logic is in the library so
//! integration tests can drive it directly.

pub mod cli;
pub mod config;
pub mod contents;
pub mod contract;
pub mod download;
pub mod load_config;
pub mod process;
pub mod render;
pub mod synchronise;

pub use cli::{run, Cli};
