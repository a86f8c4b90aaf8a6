//! COINFLIP — streak-multiplier coin flip wager game
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod engine;
pub mod storage;
pub mod session;
pub mod notify;
pub mod table;
pub mod server;
