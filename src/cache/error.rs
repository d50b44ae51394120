use thiserror::Error;

/// Failures reported by the cache manager. Absence of a key is never an
/// error; lookups return `None` / `false` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("library name is empty")]
    EmptyLibraryName,

    #[error("key is empty")]
    EmptyKey,

    #[error("library '{0}' already exists")]
    LibraryExists(String),

    #[error("library '{0}' not found")]
    LibraryNotFound(String),

    /// The library is registered but its store has been torn down.
    #[error("store of library '{0}' is not available")]
    StoreUnavailable(String),
}
