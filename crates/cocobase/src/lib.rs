/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Cocobase SDK surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

//! Client SDK for the Cocobase backend-as-a-service.
//!
//! ```no_run
//! use cocobase::{CocobaseClient, QueryBuilder};
//!
//! # async fn run() -> cocobase::Result<()> {
//! let client = CocobaseClient::new("your-api-key")?;
//! let query = QueryBuilder::new().eq("status", "published").recent().limit(10);
//! let posts = client.list_documents("posts", Some(&query)).await?;
//! println!("{} posts", posts.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod http;
pub mod query;
pub mod storage;
pub mod types;
pub mod ws;

// Re-export commonly used types from auth
pub use auth::{Session, TOKEN_STORAGE_KEY, USER_STORAGE_KEY};

// Re-export commonly used types from http
pub use http::{ClientConfig, CocobaseClient, CocobaseError, DEFAULT_BASE_URL, Result};

pub use query::{OrBuilder, Operator, QueryBuilder, SortOrder};

pub use storage::{FileStorage, MemoryStorage, Storage};

// Re-export all types
pub use types::*;

pub use ws::Connection;
