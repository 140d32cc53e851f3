//! # Sheet Sync Library
//!
//! Turns a long-lived service-account key into short-lived bearer tokens,
//! caches them, and uses them to append rows to a remote spreadsheet as a
//! best-effort mirror of locally stored records.
//!
//! Modules:
//! - `config`: service configuration, credential store, validation
//! - `auth`: JWT assertion signing and OAuth2 token exchange
//! - `cache`: single-slot bearer token cache
//! - `sinks`: remote append client and its request/result types
//! - `server`: local HTTP sidecar in front of the append client

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod server;
pub mod sinks;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::config::ServiceConfig;
pub use crate::error::SyncError;
pub use crate::sinks::{AppendClient, AppendOutcome, CellValue, Row};
