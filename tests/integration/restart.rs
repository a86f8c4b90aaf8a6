//! Restart behaviour against the file-backed slot.
//!
//! Each test opens a session, drops it, and opens a new one over the same
//! directory, the way the binary does across process restarts.

use rust_decimal_macros::dec;
use std::path::PathBuf;

use coinflip::engine::coin::ScriptedCoin;
use coinflip::notify::Notifier;
use coinflip::session::GameSession;
use coinflip::storage::{FileSlot, PersistenceAdapter, StateSlot, DEFAULT_SLOT_KEY};
use coinflip::types::CoinSide::{Heads, Tails};
use coinflip::types::GameState;

fn temp_dir() -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("coinflip_restart_{}", uuid::Uuid::new_v4()));
    p
}

fn open(dir: &PathBuf, script: Vec<coinflip::types::CoinSide>) -> GameSession {
    GameSession::open(
        PersistenceAdapter::new(Box::new(FileSlot::new(dir)), DEFAULT_SLOT_KEY),
        Box::new(ScriptedCoin::new(script)),
        Notifier::new(10),
    )
}

#[test]
fn progress_survives_restart() {
    let dir = temp_dir();
    {
        let mut s = open(&dir, vec![Heads]);
        s.select_call(Heads).unwrap();
        s.place_bet_and_flip().unwrap();
        s.settle().unwrap();
        s.cash_out().unwrap();
    }

    let s = open(&dir, vec![Heads]);
    let st = s.state();
    assert_eq!(st.balance, dec!(10.25));
    assert_eq!(st.tally.wins, 1);
    assert_eq!(st.streak, 0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn crash_mid_flight_resumes_between_flips() {
    let dir = temp_dir();
    {
        let mut s = open(&dir, vec![Heads]);
        s.select_call(Heads).unwrap();
        s.place_bet_and_flip().unwrap();
        // Dropped without settling.
    }

    let s = open(&dir, vec![Heads]);
    let st = s.state();
    assert!(!st.in_flight);
    assert_eq!(st.balance, dec!(9.75));
    assert_eq!(st.streak, 0);
    assert!(s.snapshot().call.is_none());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn streak_survives_restart_with_default_bet() {
    let dir = temp_dir();
    {
        let mut s = open(&dir, vec![Tails]);
        s.select_call(Tails).unwrap();
        s.place_bet_and_flip().unwrap();
        s.settle().unwrap();
        s.select_call(Tails).unwrap();
        s.place_bet_and_flip().unwrap();
        s.settle().unwrap();
    }

    let mut s = open(&dir, vec![Tails]);
    assert_eq!(s.state().streak, 2);
    assert_eq!(s.state().pending_winnings, dec!(0.75));
    let receipt = s.cash_out().unwrap();
    assert_eq!(receipt.amount, dec!(0.75));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn corrupt_file_starts_fresh() {
    let dir = temp_dir();
    FileSlot::new(&dir)
        .write(DEFAULT_SLOT_KEY, "{\"wins\": \"many\"}")
        .unwrap();

    let s = open(&dir, vec![Heads]);
    assert_eq!(s.state(), &GameState::default());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn reset_is_durable() {
    let dir = temp_dir();
    {
        let mut s = open(&dir, vec![Tails]);
        s.select_call(Heads).unwrap();
        s.place_bet_and_flip().unwrap();
        s.settle().unwrap();
        s.reset();
    }

    let s = open(&dir, vec![Heads]);
    assert_eq!(s.state(), &GameState::default());
    let _ = std::fs::remove_dir_all(&dir);
}
