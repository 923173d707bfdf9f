//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use custodia_ledger::Ledger;
use custodia_store::batch::LedgerStore;

use crate::error::RpcError;
use crate::handlers;

/// Build the API router over a shared ledger.
pub fn router<S: LedgerStore + Send + Sync + 'static>(ledger: Arc<Ledger<S>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/create_wallet", post(handlers::create_wallet::<S>))
        .route("/get_wallets", post(handlers::get_wallets::<S>))
        .route("/get_currency", post(handlers::get_currency::<S>))
        .route("/deposit", post(handlers::deposit::<S>))
        .route("/send_crypto", post(handlers::send_crypto::<S>))
        .route("/get_transactions", post(handlers::get_transactions::<S>))
        .route(
            "/update_user_amount",
            post(handlers::update_user_amount::<S>),
        )
        .layer(CorsLayer::permissive())
        .with_state(ledger)
}

pub struct RpcServer<S: LedgerStore> {
    addr: SocketAddr,
    ledger: Arc<Ledger<S>>,
}

impl<S: LedgerStore + Send + Sync + 'static> RpcServer<S> {
    pub fn new(addr: SocketAddr, ledger: Arc<Ledger<S>>) -> Self {
        Self { addr, ledger }
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), RpcError> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Bind(self.addr, e))?;
        tracing::info!(addr = %self.addr, "API server listening");

        axum::serve(listener, router(self.ledger))
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("API server stopped");
        Ok(())
    }
}
