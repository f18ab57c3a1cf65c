// Cache generation store
// Author: kelexine (https://github.com/kelexine)

pub mod manager;
pub mod models;
pub mod storage;

pub use manager::GenerationStore;
pub use models::{CacheStats, GenerationKind};
pub use storage::{CacheGeneration, CacheStorage, MemoryCacheStorage, MemoryGeneration};
