//! RPC request handlers and their wire DTOs.
//!
//! The ledger core is synchronous (LMDB commits block), so every handler
//! hops onto the blocking pool before touching it.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequest, Request, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use custodia_ledger::{Ledger, LedgerError, WalletView};
use custodia_store::batch::LedgerStore;
use custodia_store::transaction::TransactionRecord;
use custodia_store::StoreError;
use custodia_types::{Amount, CurrencyType, UserId, WalletId};

use crate::pagination::{next_cursor, PaginationParams};

pub type SharedLedger<S> = Arc<Ledger<S>>;

// ── Response envelope ────────────────────────────────────────────────────

/// The uniform response shape: `status`, optional `message`, payload
/// fields flattened alongside.
#[derive(Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    fn success(payload: T) -> Json<Self> {
        Json(Self {
            status: "success",
            message: None,
            payload: Some(payload),
        })
    }

    fn success_with_message(message: impl Into<String>, payload: T) -> Json<Self> {
        Json(Self {
            status: "success",
            message: Some(message.into()),
            payload: Some(payload),
        })
    }

    fn error(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "error",
            message: Some(message.into()),
            payload: None,
        })
    }

    fn failure(err: LedgerError) -> Json<Self> {
        tracing::warn!(error = %err, retryable = err.is_retryable(), "request failed");
        Self::error(err.to_string())
    }
}

/// Payload for endpoints that answer with a message alone.
#[derive(Serialize)]
pub struct NoData {}

/// `Json` extractor whose rejection is the error envelope.
///
/// A missing field, a negative amount, or plain garbage in the body must
/// come back as `{status: "error", message}` like every other failure,
/// not as axum's plain-text 422.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiRejection(rejection.body_text())),
        }
    }
}

pub struct ApiRejection(String);

impl IntoResponse for ApiRejection {
    fn into_response(self) -> Response {
        tracing::debug!(message = %self.0, "rejected malformed request");
        Envelope::<NoData>::error(self.0).into_response()
    }
}

/// Run a ledger call on the blocking pool.
async fn blocking<T: Send + 'static>(
    f: impl FnOnce() -> Result<T, LedgerError> + Send + 'static,
) -> Result<T, LedgerError> {
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "ledger task aborted");
            Err(LedgerError::Storage(StoreError::Backend(
                "ledger task aborted".to_string(),
            )))
        }
    }
}

// ── Wallets ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateWalletRequest {
    pub user_id: u64,
    pub currency_type: String,
    pub balance: u128,
}

#[derive(Serialize)]
pub struct CreateWalletResponse {
    pub wallet_id: u64,
}

pub async fn create_wallet<S: LedgerStore + Send + Sync + 'static>(
    State(ledger): State<SharedLedger<S>>,
    ApiJson(req): ApiJson<CreateWalletRequest>,
) -> Json<Envelope<CreateWalletResponse>> {
    let result = blocking(move || {
        ledger.create_wallet(
            UserId::new(req.user_id),
            CurrencyType::new(req.currency_type),
            Amount::new(req.balance),
        )
    })
    .await;

    match result {
        Ok(wallet_id) => Envelope::success_with_message(
            "wallet created successfully",
            CreateWalletResponse {
                wallet_id: wallet_id.raw(),
            },
        ),
        Err(e) => Envelope::failure(e),
    }
}

#[derive(Deserialize)]
pub struct GetWalletsRequest {
    pub user_id: u64,
}

#[derive(Serialize)]
pub struct WalletEntry {
    pub wallet_id: u64,
    pub currency_type: String,
    pub balance: u128,
    pub symbol: String,
    pub current_value: u128,
}

impl From<WalletView> for WalletEntry {
    fn from(view: WalletView) -> Self {
        Self {
            wallet_id: view.wallet_id.raw(),
            currency_type: view.currency_type.to_string(),
            balance: view.balance.raw(),
            symbol: view.symbol,
            current_value: view.unit_value,
        }
    }
}

#[derive(Serialize)]
pub struct GetWalletsResponse {
    pub wallets: Vec<WalletEntry>,
}

pub async fn get_wallets<S: LedgerStore + Send + Sync + 'static>(
    State(ledger): State<SharedLedger<S>>,
    ApiJson(req): ApiJson<GetWalletsRequest>,
) -> Json<Envelope<GetWalletsResponse>> {
    let result = blocking(move || ledger.list_wallets(UserId::new(req.user_id))).await;

    match result {
        Ok(wallets) if wallets.is_empty() => Envelope::error("No wallets found"),
        Ok(wallets) => Envelope::success(GetWalletsResponse {
            wallets: wallets.into_iter().map(WalletEntry::from).collect(),
        }),
        Err(e) => Envelope::failure(e),
    }
}

#[derive(Deserialize)]
pub struct GetCurrencyRequest {
    pub wallet_id: u64,
}

pub async fn get_currency<S: LedgerStore + Send + Sync + 'static>(
    State(ledger): State<SharedLedger<S>>,
    ApiJson(req): ApiJson<GetCurrencyRequest>,
) -> Json<Envelope<WalletEntry>> {
    let result = blocking(move || ledger.get_wallet(WalletId::new(req.wallet_id))).await;

    match result {
        Ok(view) => Envelope::success(WalletEntry::from(view)),
        Err(e) => Envelope::failure(e),
    }
}

// ── Deposits and transfers ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct DepositRequest {
    pub wallet_id: u64,
    pub amount: u128,
}

pub async fn deposit<S: LedgerStore + Send + Sync + 'static>(
    State(ledger): State<SharedLedger<S>>,
    ApiJson(req): ApiJson<DepositRequest>,
) -> Json<Envelope<NoData>> {
    let result =
        blocking(move || ledger.deposit(WalletId::new(req.wallet_id), Amount::new(req.amount)))
            .await;

    match result {
        Ok(_) => Envelope::success_with_message("amount deposited successfully", NoData {}),
        Err(e) => Envelope::failure(e),
    }
}

#[derive(Deserialize)]
pub struct SendCryptoRequest {
    pub wallet_id: u64,
    pub recipient_user_id: u64,
    pub amount: u128,
}

pub async fn send_crypto<S: LedgerStore + Send + Sync + 'static>(
    State(ledger): State<SharedLedger<S>>,
    ApiJson(req): ApiJson<SendCryptoRequest>,
) -> Json<Envelope<NoData>> {
    let result = blocking(move || {
        ledger.transfer(
            WalletId::new(req.wallet_id),
            UserId::new(req.recipient_user_id),
            Amount::new(req.amount),
        )
    })
    .await;

    match result {
        Ok(_) => Envelope::success_with_message("amount sent successfully", NoData {}),
        Err(e) => Envelope::failure(e),
    }
}

// ── Transaction history ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GetTransactionsRequest {
    pub user_id: u64,
    #[serde(flatten)]
    pub page: PaginationParams,
}

#[derive(Serialize)]
pub struct TransactionEntry {
    pub transaction_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<u64>,
    pub wallet_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<u64>,
    pub currency_type: String,
    pub amount: u128,
    pub transaction_type: String,
    pub status: String,
    pub timestamp: u64,
}

impl From<TransactionRecord> for TransactionEntry {
    fn from(row: TransactionRecord) -> Self {
        Self {
            transaction_id: row.transaction_id.raw(),
            transfer_id: row.transfer_id.map(|id| id.raw()),
            wallet_id: row.wallet_id.raw(),
            counterparty: row.counterparty.map(|id| id.raw()),
            currency_type: row.currency_type.to_string(),
            amount: row.amount.raw(),
            transaction_type: row.transaction_type.to_string(),
            status: row.status.to_string(),
            timestamp: row.timestamp.as_secs(),
        }
    }
}

#[derive(Serialize)]
pub struct GetTransactionsResponse {
    pub transactions: Vec<TransactionEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

pub async fn get_transactions<S: LedgerStore + Send + Sync + 'static>(
    State(ledger): State<SharedLedger<S>>,
    ApiJson(req): ApiJson<GetTransactionsRequest>,
) -> Json<Envelope<GetTransactionsResponse>> {
    let offset = req.page.offset();
    let count = req.page.effective_count();
    let result = blocking(move || {
        ledger.list_transactions_paged(UserId::new(req.user_id), offset, count as usize)
    })
    .await;

    match result {
        Ok(rows) => {
            let cursor = next_cursor(offset, rows.len(), count);
            Envelope::success(GetTransactionsResponse {
                transactions: rows.into_iter().map(TransactionEntry::from).collect(),
                cursor,
            })
        }
        Err(e) => Envelope::failure(e),
    }
}

// ── Reconciliation ───────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct UpdateUserAmountRequest {
    /// Reconcile this user, or every user when absent.
    pub user_id: Option<u64>,
}

#[derive(Serialize)]
pub struct UpdateUserAmountResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_updated: Option<u64>,
}

pub async fn update_user_amount<S: LedgerStore + Send + Sync + 'static>(
    State(ledger): State<SharedLedger<S>>,
    ApiJson(req): ApiJson<UpdateUserAmountRequest>,
) -> Json<Envelope<UpdateUserAmountResponse>> {
    match req.user_id {
        Some(user_id) => {
            let result = blocking(move || ledger.reconcile(UserId::new(user_id))).await;
            match result {
                Ok(balance) => Envelope::success(UpdateUserAmountResponse {
                    balance: Some(balance.raw()),
                    users_updated: None,
                }),
                Err(e) => Envelope::failure(e),
            }
        }
        None => {
            let result = blocking(move || ledger.reconcile_all()).await;
            match result {
                Ok(users_updated) => Envelope::success(UpdateUserAmountResponse {
                    balance: None,
                    users_updated: Some(users_updated),
                }),
                Err(e) => Envelope::failure(e),
            }
        }
    }
}

// ── Liveness ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
