//! End-to-end game flows through the session layer.
//!
//! Uses a scripted coin and an in-memory slot so every sequence is
//! deterministic and needs no external dependencies.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use coinflip::engine::coin::{CoinSource, RandomCoin, ScriptedCoin};
use coinflip::notify::Notifier;
use coinflip::session::GameSession;
use coinflip::storage::PersistenceAdapter;
use coinflip::types::CoinSide::{self, Heads, Tails};
use coinflip::types::{GameError, GameEvent};

fn session(script: Vec<CoinSide>) -> GameSession {
    GameSession::open(
        PersistenceAdapter::in_memory(),
        Box::new(ScriptedCoin::new(script)),
        Notifier::new(100),
    )
}

fn play(session: &mut GameSession, call: CoinSide) -> bool {
    session.select_call(call).unwrap();
    session.place_bet_and_flip().unwrap();
    let outcome = session.settle().unwrap();
    if outcome.auto_cashout_due {
        session.auto_cash_out().unwrap();
    }
    outcome.won
}

#[test]
fn scenario_a_then_b() {
    let mut s = session(vec![Heads, Tails]);

    assert!(play(&mut s, Heads));
    let st = s.state();
    assert_eq!(st.balance, dec!(9.75));
    assert_eq!(st.streak, 1);
    assert_eq!(st.pending_winnings, dec!(0.50));
    assert!(st.cash_out_eligible);

    assert!(!play(&mut s, Heads));
    let st = s.state();
    assert_eq!(st.streak, 0);
    assert_eq!(st.pending_winnings, Decimal::ZERO);
    assert_eq!(st.balance, dec!(9.75));
    assert_eq!(st.tally.losses, 1);
}

#[test]
fn scenario_c_four_wins() {
    let mut s = session(vec![Tails]);
    for _ in 0..4 {
        assert!(play(&mut s, Tails));
    }
    let st = s.state();
    assert_eq!(st.pending_winnings, Decimal::ZERO);
    assert_eq!(st.streak, 0);
    assert_eq!(st.balance, dec!(14.75));

    let events: Vec<_> = s.notifier().recent().into_iter().map(|r| r.event).collect();
    assert_eq!(
        events,
        vec![
            GameEvent::Win { streak: 1, multiplier: 2, amount: dec!(0.50) },
            GameEvent::Win { streak: 2, multiplier: 3, amount: dec!(0.75) },
            GameEvent::Win { streak: 3, multiplier: 4, amount: dec!(1.00) },
            GameEvent::MaxMultiplier { amount: dec!(5.00) },
        ]
    );
}

#[test]
fn scenario_d_bet_over_cap() {
    let mut s = session(vec![Heads]);
    let err = s.set_bet(dec!(2.00)).unwrap_err();
    assert!(matches!(err, GameError::InvalidBet { .. }));
    assert_eq!(s.state().bet_amount, dec!(0.25));
}

#[test]
fn cash_out_after_each_streak_length() {
    for wins in 1..=3u32 {
        let mut s = session(vec![Heads]);
        s.set_bet(dec!(1.00)).unwrap();
        for _ in 0..wins {
            play(&mut s, Heads);
        }
        let receipt = s.cash_out().unwrap();
        let expected = Decimal::from(wins + 1);
        assert_eq!(receipt.amount, expected);
        assert_eq!(s.state().balance, dec!(9.00) + expected);
        assert_eq!(s.cash_out(), Err(GameError::NotEligible));
    }
}

#[test]
fn random_play_keeps_invariants() {
    let mut s = GameSession::open(
        PersistenceAdapter::in_memory(),
        Box::new(RandomCoin::seeded(2024)),
        Notifier::new(0),
    );
    let mut debits = 0u32;
    let mut sequences = 0u32;
    let mut choice = RandomCoin::seeded(99);

    for round in 0..500 {
        let st = s.state().clone();
        assert!(st.balance >= Decimal::ZERO);
        if st.streak > 0 {
            let m = coinflip::engine::multiplier(st.streak);
            assert_eq!(st.pending_winnings, st.bet_amount * Decimal::from(m));
        } else {
            assert_eq!(st.pending_winnings, Decimal::ZERO);
        }

        // Occasionally bank a streak.
        if st.cash_out_eligible && round % 3 == 0 {
            s.cash_out().unwrap();
            continue;
        }

        s.select_call(choice.flip()).unwrap();
        match s.place_bet_and_flip() {
            Ok(started) => {
                if st.streak == 0 {
                    sequences += 1;
                }
                if !started.debited.is_zero() {
                    debits += 1;
                }
                let outcome = s.settle().unwrap();
                if outcome.auto_cashout_due {
                    s.auto_cash_out().unwrap();
                }
            }
            Err(GameError::InsufficientBalance { .. }) => {
                s.reset();
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(debits, sequences);
}

#[test]
fn broke_player_can_only_reset() {
    let mut s = session(vec![Tails]);
    s.set_bet(dec!(1.00)).unwrap();
    for _ in 0..10 {
        play(&mut s, Heads);
    }
    assert_eq!(s.state().balance, Decimal::ZERO);

    s.select_call(Heads).unwrap();
    assert!(matches!(
        s.place_bet_and_flip(),
        Err(GameError::InsufficientBalance { .. })
    ));
    assert!(!s.snapshot().bet_limits.is_open());

    s.reset();
    assert_eq!(s.state().balance, dec!(10.00));
    assert_eq!(s.state().tally.losses, 0);
}
