//! Command-line front end for chunkwise
//!
//! The binary in `main.rs` parses arguments and sets up logging; the
//! subcommands live in [`handlers`] so they can be driven from tests with a
//! scripted completion client.

pub mod cli;
pub mod config;
pub mod handlers;
pub mod logging;
