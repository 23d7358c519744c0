//! # Dead-Head Analysis Backend
//!
//! Computes the empty ("dead-head") distance dedicated vehicles drive between
//! consecutive shipments and serves the dashboard aggregates over REST.
//!
//! ## Architecture
//!
//! - [`models`]: ledger rows, vehicle bindings, distance table, attendance types
//! - [`services`]: dead-head resolver, filters, reporting, snapshot cache
//! - [`db`]: repository traits with local and Postgres backends
//! - [`routes`]: response types consumed by the dashboard front end
//! - [`http`]: axum server and request handlers
//! - [`config`]: dashboard settings (jumbo segment, snapshot TTL)
//! - [`api`]: identifier newtypes and the public DTO re-exports

// RepositoryError carries a structured context.
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
