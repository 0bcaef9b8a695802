//! Storage for mapdrop services.
//!
//! Provides:
//! - A key-value store seam with Redis and in-memory implementations
//! - The single-flight metadata cache built on top of it

pub mod coordinator;
pub mod store;

pub use coordinator::{lock_key, CacheSettings, MetadataCache};
pub use store::{KeyValueStore, MemoryStore, RedisStore};
