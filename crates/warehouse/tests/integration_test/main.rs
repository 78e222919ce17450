//! Integration tests for querygate-warehouse.
//!
//! The client is exercised against an in-process mock of the BigQuery REST
//! API; no credentials are needed. Tests marked `#[ignore]` talk to real
//! BigQuery and must be run explicitly.

mod client;
mod config;
