//! RPC server error types.
//!
//! Ledger failures never surface here; they are folded into the error
//! envelope by the handlers. These variants are for the server itself.

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("failed to bind {0}")]
    Bind(SocketAddr, #[source] std::io::Error),

    #[error("server error")]
    Serve(#[from] std::io::Error),
}
