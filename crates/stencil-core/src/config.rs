//! Catalog storage configuration.

use std::path::PathBuf;

use crate::error::Error;

/// Configuration for the catalog's backing store.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Path to the database directory. `None` together with `temporary`
    /// means a throwaway in-memory-backed store.
    pub path: Option<PathBuf>,

    /// Use a temporary store that is discarded on drop.
    pub temporary: bool,

    /// Flush to disk after every catalog mutation.
    ///
    /// Durable but slow; intended for tooling and tests. The default relies
    /// on sled's background flushing.
    pub flush_on_write: bool,

    /// Page cache capacity in bytes. `None` uses the sled default.
    pub cache_capacity: Option<u64>,
}

impl CatalogConfig {
    /// Create a configuration backed by the given directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            temporary: false,
            flush_on_write: false,
            cache_capacity: None,
        }
    }

    /// Create a temporary configuration (discarded on drop).
    pub fn temporary() -> Self {
        Self {
            path: None,
            temporary: true,
            flush_on_write: false,
            cache_capacity: None,
        }
    }

    /// Set whether to flush after every mutation.
    pub fn flush_on_write(mut self, flush: bool) -> Self {
        self.flush_on_write = flush;
        self
    }

    /// Set the page cache capacity.
    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = Some(bytes);
        self
    }

    /// Open the backing sled database described by this configuration.
    pub(crate) fn open_db(&self) -> Result<sled::Db, Error> {
        let mut config = sled::Config::new();
        if let Some(path) = &self.path {
            config = config.path(path);
        }
        if self.temporary || self.path.is_none() {
            config = config.temporary(true);
        }
        if let Some(capacity) = self.cache_capacity {
            config = config.cache_capacity(capacity);
        }
        Ok(config.open()?)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::temporary()
    }
}
