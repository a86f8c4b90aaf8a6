//! Core engine — the wager/streak state machine and its coin sources.

pub mod coin;
pub mod wager;

pub use coin::{CoinSource, RandomCoin, ScriptedCoin};
pub use wager::{multiplier, WagerEngine};
