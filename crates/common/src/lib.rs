//! Shared utilities, configuration, and error handling for Peerteam
//!
//! This crate provides common functionality used across the Peerteam application:
//! - Configuration management following 12-factor principles
//! - Error types and the JSON error envelope
//! - Repository error classification
//! - Request extractors

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;

pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::JsonBody;
