//! querygate: an HTTP gateway that runs read-only SQL against BigQuery and
//! returns the rows as JSON.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod router;
pub mod startup;
pub mod state;

pub use config::Config;
pub use error::GatewayError;
pub use gateway::{QueryGateway, QueryOutcome, QueryRequest, WarehouseHandle};
pub use router::build_router;
pub use state::AppState;
