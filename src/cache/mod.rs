//! Foglio Cache System
//!
//! Read-through projection cache for the blog API: list and detail responses
//! are populated lazily on a miss, dropped explicitly on every write that
//! could stale them, and expire on their own after the configured TTL. The
//! cache is never authoritative and never a point of failure; every backend
//! error degrades to a miss or a no-op.
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `foglio.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 300
//! capacity = 1024
//! ```

mod config;
mod keys;
mod lock;
mod policy;
mod store;

pub use config::CacheConfig;
pub use keys::CacheKey;
pub use policy::ReadCache;
pub use store::{CacheStore, CacheStoreError, MemoryStore};
