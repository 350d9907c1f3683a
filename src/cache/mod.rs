// Response cache module
// Author: kelexine (https://github.com/kelexine)

pub mod key;
pub mod manager;
pub mod models;

pub use key::CacheKey;
pub use manager::ResponseCache;
pub use models::{CacheConfig, CacheEntry, CacheStats};
