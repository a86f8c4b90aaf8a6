//! Wager engine — the bet/streak state machine.
//!
//! Owns the `GameState` and applies every transition synchronously.
//! The engine holds no timer and performs no I/O: the caller decides when
//! to settle a flip and when to run the terminal auto-cashout, and hands
//! in the coin source for each draw.
//!
//! ```text
//! Idle --select_call--> Ready --place_bet_and_flip--> InFlight --settle--> Idle (loss)
//!                                                               \--> Streaking (win)
//! Streaking --place_bet_and_flip | cash_out--> ...
//! Streaking (streak == 4) --auto_cash_out--> Idle
//! ```

use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::coin::CoinSource;
use crate::types::{
    BetLimits, CashOutReceipt, CoinSide, FlipOutcome, FlipStarted, GameError, GameSnapshot,
    GameState, Tally, TERMINAL_STREAK,
};

/// Payout multiplier for a streak length.
pub fn multiplier(streak: u32) -> u32 {
    match streak {
        0 => 1,
        1 => 2,
        2 => 3,
        3 => 4,
        _ => 20,
    }
}

/// Drawn but not yet settled.
#[derive(Debug, Clone, Copy)]
struct PendingFlip {
    id: Uuid,
    call: CoinSide,
    outcome: CoinSide,
}

pub struct WagerEngine {
    state: GameState,
    call: Option<CoinSide>,
    pending: Option<PendingFlip>,
    auto_cashout_due: bool,
    /// Flip whose terminal win scheduled the due auto-cashout.
    terminal_flip: Option<Uuid>,
}

impl Default for WagerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WagerEngine {
    /// Fresh game: $10.00 balance, $0.25 bet, everything else zero.
    pub fn new() -> Self {
        Self {
            state: GameState::default(),
            call: None,
            pending: None,
            auto_cashout_due: false,
            terminal_flip: None,
        }
    }

    /// Rebuild from persisted fields. The bet is not persisted, so it takes
    /// its default and pending winnings are recomputed from it. A streak at
    /// the terminal length comes back with its auto-cashout due.
    pub fn restore(tally: Tally, streak: u32, balance: Decimal) -> Self {
        let mut engine = Self::new();
        engine.state.tally = tally;
        engine.state.balance = balance.max(Decimal::ZERO);
        engine.state.streak = streak;
        if streak > 0 {
            engine.state.pending_winnings =
                engine.state.bet_amount * Decimal::from(multiplier(streak));
            engine.state.cash_out_eligible = true;
        }
        engine.auto_cashout_due = streak >= TERMINAL_STREAK;
        engine
    }

    // -- Queries ------------------------------------------------------------

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The player's current call, if one is selected.
    pub fn call(&self) -> Option<CoinSide> {
        self.call
    }

    /// Id of the flip awaiting settlement.
    pub fn pending_flip_id(&self) -> Option<Uuid> {
        self.pending.map(|p| p.id)
    }

    pub fn auto_cashout_due(&self) -> bool {
        self.auto_cashout_due
    }

    /// Id of the flip whose terminal win is awaiting its auto-cashout.
    /// `None` after a restore, where the auto-cashout has no flip behind it.
    pub fn terminal_flip_id(&self) -> Option<Uuid> {
        self.terminal_flip
    }

    pub fn bet_limits(&self) -> BetLimits {
        BetLimits::for_balance(self.state.balance)
    }

    /// What the pot grows to if the next flip wins.
    pub fn next_win_amount(&self) -> Decimal {
        self.state.bet_amount * Decimal::from(multiplier(self.state.streak.saturating_add(1)))
    }

    /// Render-ready view of the table.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            state: self.state.clone(),
            call: self.call,
            current_multiplier: multiplier(self.state.streak),
            next_multiplier: multiplier(self.state.streak.saturating_add(1)),
            next_win_amount: self.next_win_amount(),
            win_rate: self.state.tally.win_rate(),
            bet_limits: self.bet_limits(),
            auto_cashout_due: self.auto_cashout_due,
        }
    }

    // -- Transitions --------------------------------------------------------

    /// Change the bet. Only between streaks and never mid-flight.
    pub fn set_bet(&mut self, amount: Decimal) -> Result<(), GameError> {
        if self.state.in_flight {
            return Err(GameError::Busy);
        }
        if self.state.streak > 0 {
            return Err(GameError::BetLocked {
                bet: self.state.bet_amount,
                streak: self.state.streak,
            });
        }
        let limits = self.bet_limits();
        if !limits.accepts(amount) {
            return Err(GameError::InvalidBet {
                amount,
                min: limits.min,
                max: limits.max,
            });
        }

        self.state.bet_amount = amount;
        debug!(bet = %amount, "Bet amount set");
        Ok(())
    }

    /// Record the player's call for the next flip.
    pub fn select_call(&mut self, side: CoinSide) -> Result<(), GameError> {
        if self.state.in_flight {
            return Err(GameError::Busy);
        }
        self.call = Some(side);
        Ok(())
    }

    /// Debit the bet (first flip of a sequence only), draw the outcome and
    /// go in flight. The outcome is returned for rendering but takes no
    /// effect until `settle`.
    pub fn place_bet_and_flip(
        &mut self,
        coin: &mut dyn CoinSource,
    ) -> Result<FlipStarted, GameError> {
        if self.state.in_flight || self.auto_cashout_due {
            return Err(GameError::Busy);
        }
        let call = self.call.ok_or(GameError::NoChoice)?;

        let starts_sequence = self.state.streak == 0;
        if starts_sequence && self.state.balance < self.state.bet_amount {
            return Err(GameError::InsufficientBalance {
                needed: self.state.bet_amount,
                available: self.state.balance,
            });
        }

        let debited = if starts_sequence {
            self.state.balance -= self.state.bet_amount;
            self.state.bet_amount
        } else {
            Decimal::ZERO
        };

        let outcome = coin.flip();
        let id = Uuid::new_v4();
        self.pending = Some(PendingFlip { id, call, outcome });
        self.state.in_flight = true;
        self.state.cash_out_eligible = false;

        info!(
            flip_id = %id,
            call = %call,
            debited = %debited,
            balance = %self.state.balance,
            streak = self.state.streak,
            "Bet placed, coin in the air"
        );

        Ok(FlipStarted {
            flip_id: id,
            call,
            outcome,
            debited,
            balance_after: self.state.balance,
            multiplier_on_win: multiplier(self.state.streak.saturating_add(1)),
        })
    }

    /// Resolve the in-flight flip against the player's call.
    pub fn settle(&mut self) -> Result<FlipOutcome, GameError> {
        let flip = self.pending.take().ok_or(GameError::NotInFlight)?;
        let won = flip.call == flip.outcome;

        if won {
            self.state.streak = self.state.streak.saturating_add(1);
            self.state.pending_winnings =
                self.state.bet_amount * Decimal::from(multiplier(self.state.streak));
            self.state.cash_out_eligible = true;
            self.state.tally.wins += 1;
            self.auto_cashout_due = self.state.streak >= TERMINAL_STREAK;
            if self.auto_cashout_due {
                self.terminal_flip = Some(flip.id);
            }
        } else {
            self.state.streak = 0;
            self.state.pending_winnings = Decimal::ZERO;
            self.state.cash_out_eligible = false;
            self.state.tally.losses += 1;
        }

        self.state.in_flight = false;
        self.call = None;

        let outcome = FlipOutcome {
            flip_id: flip.id,
            call: flip.call,
            outcome: flip.outcome,
            won,
            streak: self.state.streak,
            multiplier: multiplier(self.state.streak),
            pending_winnings: self.state.pending_winnings,
            auto_cashout_due: self.auto_cashout_due,
        };
        info!(flip_id = %flip.id, "{outcome}");
        Ok(outcome)
    }

    /// Player-initiated cash-out of the pending winnings.
    pub fn cash_out(&mut self) -> Result<CashOutReceipt, GameError> {
        if !self.state.cash_out_eligible {
            return Err(GameError::NotEligible);
        }
        Ok(self.credit_winnings(false))
    }

    /// Forced cash-out after a terminal win. Separate from `settle` so the
    /// caller can show the terminal result before the credit lands.
    pub fn auto_cash_out(&mut self) -> Result<CashOutReceipt, GameError> {
        if !self.auto_cashout_due || !self.state.cash_out_eligible {
            return Err(GameError::NotEligible);
        }
        Ok(self.credit_winnings(true))
    }

    /// Back to a fresh game, unconditionally. Any in-flight flip is dropped.
    pub fn reset(&mut self) {
        *self = Self::new();
        info!(balance = %self.state.balance, "Game reset");
    }

    fn credit_winnings(&mut self, automatic: bool) -> CashOutReceipt {
        let amount = self.state.pending_winnings;
        let streak = self.state.streak;

        self.state.balance += amount;
        self.state.pending_winnings = Decimal::ZERO;
        self.state.cash_out_eligible = false;
        self.state.streak = 0;
        self.auto_cashout_due = false;
        self.terminal_flip = None;

        info!(
            amount = %amount,
            balance = %self.state.balance,
            streak,
            automatic,
            "Winnings credited"
        );

        CashOutReceipt {
            amount,
            balance_after: self.state.balance,
            streak,
            multiplier: multiplier(streak),
            automatic,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
