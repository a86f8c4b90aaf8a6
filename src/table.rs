//! Table — the async driver between the presentation layer and the session.
//!
//! Owns the caller-side timers the engine deliberately lacks: after a flip
//! starts, a tokio task waits out the settle delay and settles it, then for
//! a terminal win waits the auto-cashout delay and credits it. The session
//! lock is only ever held for a single transition, never across a sleep.

use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::TimingConfig;
use crate::notify::EventRecord;
use crate::session::GameSession;
use crate::types::{CashOutReceipt, CoinSide, FlipStarted, GameError, GameSnapshot};

pub type SharedTable = Arc<Table>;

pub struct Table {
    session: Mutex<GameSession>,
    timing: TimingConfig,
}

impl Table {
    pub fn new(session: GameSession, timing: TimingConfig) -> SharedTable {
        Arc::new(Self {
            session: Mutex::new(session),
            timing,
        })
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn recent_events(&self) -> Vec<EventRecord> {
        self.session.lock().await.notifier().recent()
    }

    pub async fn select_call(&self, side: CoinSide) -> Result<GameSnapshot, GameError> {
        let mut session = self.session.lock().await;
        session.select_call(side)?;
        Ok(session.snapshot())
    }

    pub async fn set_bet(&self, amount: Decimal) -> Result<GameSnapshot, GameError> {
        let mut session = self.session.lock().await;
        session.set_bet(amount)?;
        Ok(session.snapshot())
    }

    /// Start a flip and schedule its settlement. The returned handle
    /// resolves once the flip (and any auto-cashout) has been applied.
    pub async fn flip(self: &Arc<Self>) -> Result<(FlipStarted, JoinHandle<()>), GameError> {
        let started = self.session.lock().await.place_bet_and_flip()?;

        let table = Arc::clone(self);
        let flip_id = started.flip_id;
        let handle = tokio::spawn(async move {
            table.finish_flip(flip_id).await;
        });
        Ok((started, handle))
    }

    pub async fn cash_out(&self) -> Result<CashOutReceipt, GameError> {
        self.session.lock().await.cash_out()
    }

    pub async fn reset(&self) -> GameSnapshot {
        let mut session = self.session.lock().await;
        session.reset();
        session.snapshot()
    }

    /// Flush state on shutdown.
    pub async fn persist(&self) {
        self.session.lock().await.persist();
    }

    async fn finish_flip(&self, flip_id: uuid::Uuid) {
        tokio::time::sleep(self.timing.settle_delay()).await;

        let outcome = match self.session.lock().await.settle_flip(flip_id) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(flip_id = %flip_id, error = %e, "Flip no longer pending");
                return;
            }
        };
        if !outcome.auto_cashout_due {
            return;
        }

        info!(flip_id = %flip_id, "Maximum multiplier reached, auto-cashout scheduled");
        tokio::time::sleep(self.timing.auto_cashout_delay()).await;

        // A player cash-out or reset during the delay leaves nothing for this
        // flip, even if a newer terminal win is now due.
        if let Err(e) = self.session.lock().await.auto_cash_out_flip(flip_id) {
            debug!(flip_id = %flip_id, error = %e, "Auto-cashout skipped");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
