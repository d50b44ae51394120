//! In-memory token stores and the named-library cache manager built on them.

pub mod cache_manager;
pub mod error;
pub(crate) mod sweeper;
pub mod token;
pub mod token_store;

pub use cache_manager::CacheManager;
pub use error::CacheError;
pub use token::{Entry, EntryInfo, Ttl};
pub use token_store::TokenStore;
