/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod documents;
pub mod error;
pub mod user;

pub use error::{CocobaseError, Result};

pub use client::{ClientConfig, CocobaseClient, DEFAULT_BASE_URL};
