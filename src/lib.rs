//! Company Profile Harvest Library
//!
//! This library provides the core functionality for batch-fetching company
//! profiles from a remote GraphQL endpoint and normalizing the responses
//! into a flat, schema-stable record shape for columnar analysis.
//!
//! # Modules
//!
//! - `batch`: Bounded-concurrency batch fetch controller.
//! - `client`: Profile API client (one POST per identifier).
//! - `config`: Configuration management.
//! - `decoder`: Response envelope decoding and normalization.
//! - `errors`: Error handling types.
//! - `export`: Flat-row CSV export.
//! - `ids`: Identifier input and validation.
//! - `models`: Normalized record shape and fetch outcomes.
//! - `query`: GraphQL fragment table and query construction.
//! - `storage`: Optional Postgres sink.

pub mod batch;
pub mod client;
pub mod config;
pub mod decoder;
pub mod errors;
pub mod export;
pub mod ids;
pub mod models;
pub mod query;
pub mod storage;
