//! Coin sources — the injected randomness behind every flip.
//!
//! The engine never reaches for a global generator; callers hand it a
//! `CoinSource` per flip. `RandomCoin` is the production source and
//! `ScriptedCoin` replays a fixed sequence for deterministic tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::CoinSide;

/// One uniform binary draw per call.
pub trait CoinSource: Send {
    fn flip(&mut self) -> CoinSide;
}

// ---------------------------------------------------------------------------
// RandomCoin
// ---------------------------------------------------------------------------

/// Fair coin backed by a `rand` generator.
pub struct RandomCoin {
    rng: StdRng,
}

impl RandomCoin {
    /// Seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl CoinSource for RandomCoin {
    fn flip(&mut self) -> CoinSide {
        if self.rng.gen_bool(0.5) {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedCoin
// ---------------------------------------------------------------------------

/// Replays a fixed script of outcomes, wrapping around when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedCoin {
    script: Vec<CoinSide>,
    cursor: usize,
}

impl ScriptedCoin {
    /// An empty script behaves as an always-heads coin.
    pub fn new(script: Vec<CoinSide>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Always lands on `side`.
    pub fn always(side: CoinSide) -> Self {
        Self::new(vec![side])
    }

    /// Number of draws made so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl CoinSource for ScriptedCoin {
    fn flip(&mut self) -> CoinSide {
        let side = if self.script.is_empty() {
            CoinSide::Heads
        } else {
            self.script[self.cursor % self.script.len()]
        };
        self.cursor += 1;
        side
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_coin_replays_and_wraps() {
        let mut coin = ScriptedCoin::new(vec![CoinSide::Heads, CoinSide::Tails]);
        assert_eq!(coin.flip(), CoinSide::Heads);
        assert_eq!(coin.flip(), CoinSide::Tails);
        assert_eq!(coin.flip(), CoinSide::Heads);
        assert_eq!(coin.draws(), 3);
    }

    #[test]
    fn test_scripted_coin_empty_is_heads() {
        let mut coin = ScriptedCoin::new(Vec::new());
        assert_eq!(coin.flip(), CoinSide::Heads);
    }

    #[test]
    fn test_seeded_coin_is_reproducible() {
        let mut a = RandomCoin::seeded(42);
        let mut b = RandomCoin::seeded(42);
        let left: Vec<_> = (0..32).map(|_| a.flip()).collect();
        let right: Vec<_> = (0..32).map(|_| b.flip()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_random_coin_lands_both_ways() {
        let mut coin = RandomCoin::seeded(7);
        let heads = (0..1000).filter(|_| coin.flip() == CoinSide::Heads).count();
        // Loose sanity bound, not a fairness test.
        assert!(heads > 350 && heads < 650, "heads={heads}");
    }
}
