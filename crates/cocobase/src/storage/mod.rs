/*
[INPUT]:  Session keys and values from the client
[OUTPUT]: Persisted token and user cache
[POS]:    Storage layer - pluggable key/value persistence for sessions
[UPDATE]: When adding new storage backends
*/

use async_trait::async_trait;

use crate::http::Result;

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Key/value persistence used to keep a session across restarts
///
/// The trait is async so backends can hit the filesystem or a remote store.
#[async_trait]
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Read a value; `Ok(None)` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing an absent key is not an error
    async fn delete(&self, key: &str) -> Result<()>;
}
