use crate::api::MessageBody;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledger_core::LedgerError;
use thiserror::Error;

/// Failures talking to a single peer. These are logged by the caller and
/// never abort work involving the other peers.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("invalid peer address {0:?}")]
    InvalidAddress(String),

    #[error("peer {peer} unreachable: {source}")]
    Unreachable {
        peer: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("peer {peer} answered {status}: {message}")]
    Rejected {
        peer: String,
        status: u16,
        message: String,
    },

    #[error("peer {peer} sent an unreadable response: {source}")]
    Decode {
        peer: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build peer client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Errors a request handler reports back to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing values: {0}")]
    MissingField(String),

    #[error("Error: Please supply a valid list of nodes")]
    MissingNodes,

    #[error(transparent)]
    InvalidPeer(#[from] PeerError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MissingField(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Ledger(LedgerError::EmptyChain) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        let body = MessageBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
