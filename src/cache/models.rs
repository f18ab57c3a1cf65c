//! Cache generation kinds and statistics models.

// Author: kelexine (https://github.com/kelexine)

use serde::Serialize;

/// Which current generation a request is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    /// Pages, scripts, stylesheets and icons from the static manifest.
    Static,
    /// Snapshots of read-only API responses.
    Api,
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::Static => "static",
            GenerationKind::Api => "api",
        }
    }
}

/// Statistics for cache operations.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStats {
    /// Number of lookups answered from a generation.
    pub hits: u64,
    /// Number of lookups that found nothing.
    pub misses: u64,
    /// Number of completed entry writes.
    pub writes: u64,
    /// Number of writes that failed and were dropped.
    pub write_failures: u64,
    /// Number of superseded generations deleted during activation.
    pub evictions: u64,
}
