//! Game API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<Table>`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::notify::EventRecord;
use crate::table::SharedTable;
use crate::types::{CashOutReceipt, CoinSide, FlipStarted, GameError, GameSnapshot};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CallRequest {
    pub side: CoinSide,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BetRequest {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = match self {
            GameError::InvalidBet { .. } | GameError::InsufficientBalance { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            GameError::NoChoice => StatusCode::BAD_REQUEST,
            GameError::Busy
            | GameError::BetLocked { .. }
            | GameError::NotEligible
            | GameError::NotInFlight => StatusCode::CONFLICT,
        };
        let body = ErrorBody {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/state
pub async fn get_state(State(table): State<SharedTable>) -> Json<GameSnapshot> {
    Json(table.snapshot().await)
}

/// POST /api/call
pub async fn select_call(
    State(table): State<SharedTable>,
    Json(req): Json<CallRequest>,
) -> Result<Json<GameSnapshot>, GameError> {
    Ok(Json(table.select_call(req.side).await?))
}

/// POST /api/bet
pub async fn set_bet(
    State(table): State<SharedTable>,
    Json(req): Json<BetRequest>,
) -> Result<Json<GameSnapshot>, GameError> {
    Ok(Json(table.set_bet(req.amount).await?))
}

/// POST /api/flip — settlement happens in the background after the delay.
pub async fn flip(State(table): State<SharedTable>) -> Result<Json<FlipStarted>, GameError> {
    let (started, _settlement) = table.flip().await?;
    Ok(Json(started))
}

/// POST /api/cash-out
pub async fn cash_out(State(table): State<SharedTable>) -> Result<Json<CashOutReceipt>, GameError> {
    Ok(Json(table.cash_out().await?))
}

/// POST /api/reset
pub async fn reset(State(table): State<SharedTable>) -> Json<GameSnapshot> {
    Json(table.reset().await)
}

/// GET /api/events — the notifier's bounded log, oldest first.
pub async fn get_events(State(table): State<SharedTable>) -> Json<Vec<EventRecord>> {
    Json(table.recent_events().await)
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::engine::coin::ScriptedCoin;
    use crate::notify::Notifier;
    use crate::session::GameSession;
    use crate::storage::PersistenceAdapter;
    use crate::table::Table;
    use rust_decimal_macros::dec;

    fn test_table() -> SharedTable {
        let session = GameSession::open(
            PersistenceAdapter::in_memory(),
            Box::new(ScriptedCoin::always(CoinSide::Heads)),
            Notifier::new(10),
        );
        Table::new(session, TimingConfig::default())
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(GameError::Busy.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(GameError::NoChoice.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GameError::InvalidBet { amount: dec!(2), min: dec!(0.25), max: dec!(1) }
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(GameError::NotEligible.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_call_request_deserializes() {
        let req: CallRequest = serde_json::from_str(r#"{"side":"tails"}"#).unwrap();
        assert_eq!(req.side, CoinSide::Tails);
        assert!(serde_json::from_str::<CallRequest>(r#"{"side":"edge"}"#).is_err());
    }

    #[test]
    fn test_bet_request_accepts_number() {
        let req: BetRequest = serde_json::from_str(r#"{"amount":0.5}"#).unwrap();
        assert_eq!(req.amount, dec!(0.5));
    }

    #[tokio::test]
    async fn test_get_state_handler() {
        let Json(snap) = get_state(State(test_table())).await;
        assert_eq!(snap.state.balance, dec!(10.00));
        assert_eq!(snap.next_win_amount, dec!(0.50));
    }

    #[tokio::test]
    async fn test_set_bet_handler_rejects() {
        let err = set_bet(State(test_table()), Json(BetRequest { amount: dec!(2.00) }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_bet");
    }

    #[tokio::test]
    async fn test_get_events_empty() {
        let Json(events) = get_events(State(test_table())).await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_get_events_follows_configured_log_size() {
        let session = GameSession::open(
            PersistenceAdapter::in_memory(),
            Box::new(ScriptedCoin::always(CoinSide::Heads)),
            Notifier::new(2),
        );
        let table = Table::new(session, TimingConfig::default());
        for _ in 0..3 {
            table.reset().await;
        }

        let Json(events) = get_events(State(table)).await;
        let seqs: Vec<u64> = events.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![2, 3]);
    }
}
