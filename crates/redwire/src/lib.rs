//! Library half of the `redwire` command-line client: configuration loading
//! and the interactive shell. The binary in `main.rs` wires them to a
//! [`client::Client`].

pub mod config;
pub mod shell;
