//! HTTP node around a [`ledger_core::Ledger`]: accepts transactions and
//! mining proofs, and keeps in step with its peers.

pub mod api;
pub mod config;
mod constants;
pub mod error;
pub mod peers;
pub mod routes;
pub mod state;
pub mod sync;

pub use config::NodeConfig;
pub use error::{ApiError, PeerError};
pub use routes::router;
pub use state::AppState;
pub use sync::{BroadcastReport, ReconcileOutcome};
