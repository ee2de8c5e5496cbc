//! Stagehand Core - Shared wire types
//!
//! This crate contains the request, response and event types exchanged
//! between the `stagehand` CLI and the instance platform (HTTP API and the
//! live event socket).
//!
//! Everything CLI-specific (config loading, identity, presentation) lives in
//! the `stagehand` crate.

mod protocol;

pub use protocol::*;
