//! BigQuery warehouse client used by the query gateway.

mod auth;
pub mod client;
pub mod config;
mod convert;
pub mod error;
pub mod result;
mod wire;

pub use client::{BigQueryClient, Warehouse};
pub use config::WarehouseConfig;
pub use error::{ApiErrorDetail, WarehouseError};
pub use result::{Column, JobMetadata, QueryResult, Row};
