//! Shared types for the COINFLIP game.
//!
//! These types form the data model passed between the engine, the
//! session layer, persistence, and the HTTP presentation boundary.
//! None of them perform I/O.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Game constants
// ---------------------------------------------------------------------------

/// Balance a fresh (or reset) game starts with.
pub const STARTING_BALANCE: Decimal = dec!(10.00);
/// Bet amount a fresh (or reset) game starts with.
pub const DEFAULT_BET: Decimal = dec!(0.25);
/// Smallest accepted bet.
pub const MIN_BET: Decimal = dec!(0.25);
/// Largest accepted bet, further capped by the current balance.
pub const MAX_BET: Decimal = dec!(1.00);
/// Bet slider granularity, measured from `MIN_BET`.
pub const BET_STEP: Decimal = dec!(0.05);
/// Streak length that triggers the forced auto-cashout.
pub const TERMINAL_STREAK: u32 = 4;

// ---------------------------------------------------------------------------
// Coin
// ---------------------------------------------------------------------------

/// A face of the coin. Used both for the player's call and the drawn outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Heads => write!(f, "HEADS"),
            CoinSide::Tails => write!(f, "TAILS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Game state
// ---------------------------------------------------------------------------

/// Lifetime win/loss counters. Never decrease except on a full reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub wins: u64,
    pub losses: u64,
}

impl Tally {
    /// Flips settled so far.
    pub fn played(&self) -> u64 {
        self.wins + self.losses
    }

    /// Win rate as a whole percentage, rounded. 0 if nothing has been played.
    pub fn win_rate(&self) -> u32 {
        let played = self.played();
        if played == 0 {
            return 0;
        }
        ((self.wins as f64 / played as f64) * 100.0).round() as u32
    }
}

/// The single mutable aggregate owned by the wager engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameState {
    pub balance: Decimal,
    pub bet_amount: Decimal,
    pub streak: u32,
    pub tally: Tally,
    pub pending_winnings: Decimal,
    pub cash_out_eligible: bool,
    pub in_flight: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            balance: STARTING_BALANCE,
            bet_amount: DEFAULT_BET,
            streak: 0,
            tally: Tally::default(),
            pending_winnings: Decimal::ZERO,
            cash_out_eligible: false,
            in_flight: false,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "balance=${:.2} | bet=${:.2} | streak={} | pending=${:.2} | W{}/L{}{}",
            self.balance,
            self.bet_amount,
            self.streak,
            self.pending_winnings,
            self.tally.wins,
            self.tally.losses,
            if self.in_flight { " | in flight" } else { "" },
        )
    }
}

/// Allowed range for the bet slider given the current balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetLimits {
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

impl BetLimits {
    /// Limits for a given balance: `[MIN_BET, min(MAX_BET, balance)]`.
    pub fn for_balance(balance: Decimal) -> Self {
        Self {
            min: MIN_BET,
            max: MAX_BET.min(balance),
            step: BET_STEP,
        }
    }

    /// Whether any bet at all can be placed.
    pub fn is_open(&self) -> bool {
        self.max >= self.min
    }

    /// Whether `amount` is in range and on the step grid. The upper cap
    /// itself is always accepted since a slider clamps to it.
    pub fn accepts(&self, amount: Decimal) -> bool {
        if amount < self.min || amount > self.max {
            return false;
        }
        amount == self.max || ((amount - self.min) % self.step).is_zero()
    }
}

/// Everything the presentation layer needs to render the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    #[serde(flatten)]
    pub state: GameState,
    pub call: Option<CoinSide>,
    pub current_multiplier: u32,
    pub next_multiplier: u32,
    pub next_win_amount: Decimal,
    pub win_rate: u32,
    pub bet_limits: BetLimits,
    pub auto_cashout_due: bool,
}

// ---------------------------------------------------------------------------
// Transition results
// ---------------------------------------------------------------------------

/// Returned by a successful bet placement. The drawn outcome is revealed
/// here so the caller can animate towards it before settling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlipStarted {
    pub flip_id: Uuid,
    pub call: CoinSide,
    pub outcome: CoinSide,
    /// Amount debited by this flip (zero when continuing a streak).
    pub debited: Decimal,
    pub balance_after: Decimal,
    /// Multiplier the streak reaches if this flip wins.
    pub multiplier_on_win: u32,
}

/// Result of settling a flip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlipOutcome {
    pub flip_id: Uuid,
    pub call: CoinSide,
    pub outcome: CoinSide,
    pub won: bool,
    /// Streak after settlement (0 on a loss).
    pub streak: u32,
    pub multiplier: u32,
    pub pending_winnings: Decimal,
    /// Terminal win: the caller must run the auto-cashout step next.
    pub auto_cashout_due: bool,
}

impl fmt::Display for FlipOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.won {
            write!(
                f,
                "called {} got {}: WIN streak={} ({}x) pending=${:.2}",
                self.call, self.outcome, self.streak, self.multiplier, self.pending_winnings,
            )
        } else {
            write!(f, "called {} got {}: LOSS", self.call, self.outcome)
        }
    }
}

/// Proof of a credit to the balance, either player-initiated or automatic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashOutReceipt {
    pub amount: Decimal,
    pub balance_after: Decimal,
    /// Streak length that was cashed.
    pub streak: u32,
    pub multiplier: u32,
    pub automatic: bool,
}

// ---------------------------------------------------------------------------
// Notification events
// ---------------------------------------------------------------------------

/// Events pushed to the notification boundary. Purely observational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    Win { streak: u32, multiplier: u32, amount: Decimal },
    Loss,
    CashedOut { amount: Decimal },
    MaxMultiplier { amount: Decimal },
    Reset,
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::Win { streak, multiplier, amount } => write!(
                f,
                "Win! ({streak} in a row) You won ${amount:.2}! Current multiplier: {multiplier}x"
            ),
            GameEvent::Loss => write!(f, "You lost! Better luck next time!"),
            GameEvent::CashedOut { amount } => {
                write!(f, "Cashed out! ${amount:.2} has been added to your balance.")
            }
            GameEvent::MaxMultiplier { amount } => write!(
                f,
                "Maximum multiplier reached! You won ${amount:.2}. Game automatically reset."
            ),
            GameEvent::Reset => write!(f, "Game reset with ${STARTING_BALANCE:.2} balance."),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Recoverable game errors. The engine state is unchanged whenever one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("Invalid bet ${amount:.2}: must be between ${min:.2} and ${max:.2} in steps of $0.05")]
    InvalidBet { amount: Decimal, min: Decimal, max: Decimal },

    #[error("Bet is locked at ${bet:.2} for the current streak of {streak}")]
    BetLocked { bet: Decimal, streak: u32 },

    #[error("A flip is already in progress")]
    Busy,

    #[error("Pick heads or tails first")]
    NoChoice,

    #[error("Insufficient balance: need ${needed:.2}, have ${available:.2}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    #[error("Nothing to cash out")]
    NotEligible,

    #[error("No flip is waiting to be settled")]
    NotInFlight,
}

impl GameError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidBet { .. } => "invalid_bet",
            GameError::BetLocked { .. } => "bet_locked",
            GameError::Busy => "busy",
            GameError::NoChoice => "no_choice",
            GameError::InsufficientBalance { .. } => "insufficient_balance",
            GameError::NotEligible => "not_eligible",
            GameError::NotInFlight => "not_in_flight",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
