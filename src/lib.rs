//! # Token Keeper Library
//!
//! Concurrent TTL-based token store layered under a named-library cache
//! manager, with a background expiry sweep per store.
//!
//! Modules:
//! - `cache` — token store, expiry sweep and library manager
//! - `config` — service configuration and metadata persistence
//! - `observability` — prometheus metrics
//! - `server` — HTTP surface over the cache manager

pub mod cache;
pub mod config;
pub mod observability;
pub mod server;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::cache::{CacheError, CacheManager, TokenStore, Ttl};
