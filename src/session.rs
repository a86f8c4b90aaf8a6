//! Game session — the engine's caller.
//!
//! Wires the `WagerEngine` to its collaborators: the coin source for each
//! flip, the persistence adapter after every mutating transition, and the
//! notifier for every player-visible result. Still synchronous; timing is
//! the `Table`'s job.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::coin::CoinSource;
use crate::engine::wager::WagerEngine;
use crate::notify::Notifier;
use crate::storage::PersistenceAdapter;
use crate::types::{
    CashOutReceipt, CoinSide, FlipOutcome, FlipStarted, GameError, GameEvent, GameSnapshot,
    GameState,
};

pub struct GameSession {
    engine: WagerEngine,
    coin: Box<dyn CoinSource>,
    store: PersistenceAdapter,
    notifier: Notifier,
}

impl GameSession {
    /// Restore from the store (or start fresh) and finish any auto-cashout
    /// that was cut short by a restart.
    pub fn open(store: PersistenceAdapter, coin: Box<dyn CoinSource>, notifier: Notifier) -> Self {
        let engine = match store.load() {
            Some(saved) => {
                info!(
                    balance = %saved.balance,
                    streak = saved.streak,
                    wins = saved.wins,
                    losses = saved.losses,
                    "Resumed from saved state"
                );
                WagerEngine::restore(saved.tally(), saved.streak, saved.balance)
            }
            None => {
                let engine = WagerEngine::new();
                info!(balance = %engine.state().balance, "Fresh start");
                engine
            }
        };

        let mut session = Self {
            engine,
            coin,
            store,
            notifier,
        };
        if session.engine.auto_cashout_due() {
            info!("Completing auto-cashout interrupted by restart");
            if let Err(e) = session.auto_cash_out() {
                warn!(error = %e, "Auto-cashout at startup failed");
            }
        }
        session
    }

    // -- Queries ------------------------------------------------------------

    pub fn state(&self) -> &GameState {
        self.engine.state()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.engine.snapshot()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn pending_flip_id(&self) -> Option<Uuid> {
        self.engine.pending_flip_id()
    }

    pub fn auto_cashout_due(&self) -> bool {
        self.engine.auto_cashout_due()
    }

    // -- Transitions --------------------------------------------------------

    pub fn set_bet(&mut self, amount: Decimal) -> Result<(), GameError> {
        self.engine.set_bet(amount)
    }

    pub fn select_call(&mut self, side: CoinSide) -> Result<(), GameError> {
        self.engine.select_call(side)
    }

    pub fn place_bet_and_flip(&mut self) -> Result<FlipStarted, GameError> {
        let started = self.engine.place_bet_and_flip(self.coin.as_mut())?;
        if !started.debited.is_zero() {
            self.persist();
        }
        Ok(started)
    }

    pub fn settle(&mut self) -> Result<FlipOutcome, GameError> {
        let outcome = self.engine.settle()?;
        self.persist();

        if !outcome.won {
            self.notifier.publish(GameEvent::Loss);
        } else if !outcome.auto_cashout_due {
            self.notifier.publish(GameEvent::Win {
                streak: outcome.streak,
                multiplier: outcome.multiplier,
                amount: outcome.pending_winnings,
            });
        }
        // A terminal win is announced by its auto-cashout.
        Ok(outcome)
    }

    /// Settle only if `flip_id` is still the flip in the air. Guards a
    /// delayed settle against a reset (and a new flip) in the meantime.
    pub fn settle_flip(&mut self, flip_id: Uuid) -> Result<FlipOutcome, GameError> {
        if self.engine.pending_flip_id() != Some(flip_id) {
            debug!(flip_id = %flip_id, "Stale settle ignored");
            return Err(GameError::NotInFlight);
        }
        self.settle()
    }

    pub fn cash_out(&mut self) -> Result<CashOutReceipt, GameError> {
        let receipt = self.engine.cash_out()?;
        self.persist();
        self.notifier.publish(GameEvent::CashedOut {
            amount: receipt.amount,
        });
        Ok(receipt)
    }

    pub fn auto_cash_out(&mut self) -> Result<CashOutReceipt, GameError> {
        let receipt = self.engine.auto_cash_out()?;
        self.persist();
        self.notifier.publish(GameEvent::MaxMultiplier {
            amount: receipt.amount,
        });
        Ok(receipt)
    }

    /// Run the auto-cashout only if it is still the one `flip_id`'s terminal
    /// win scheduled. Guards a delayed auto-cashout against a player
    /// cash-out and a newer terminal win in the meantime.
    pub fn auto_cash_out_flip(&mut self, flip_id: Uuid) -> Result<CashOutReceipt, GameError> {
        if self.engine.terminal_flip_id() != Some(flip_id) {
            debug!(flip_id = %flip_id, "Stale auto-cashout ignored");
            return Err(GameError::NotEligible);
        }
        self.auto_cash_out()
    }

    pub fn reset(&mut self) {
        self.engine.reset();
        self.persist();
        self.notifier.publish(GameEvent::Reset);
    }

    /// Write the durable fields now. Best-effort.
    pub fn persist(&self) {
        self.store.save(self.engine.state());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
