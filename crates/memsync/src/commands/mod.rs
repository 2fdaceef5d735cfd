//! Command implementations for memsync CLI.
//!
//! Each submodule implements the logic for one command.

pub mod auth;
pub mod machine;
pub mod status;
pub mod sync;
