/*
[INPUT]:  Bearer tokens, credentials and user profiles
[OUTPUT]: Session state and the login/registration flow
[POS]:    Auth layer - handles Cocobase user authentication
[UPDATE]: When auth flow or session fields change
*/

pub mod session;

pub use session::Session;

/// Storage key holding the bearer token
pub const TOKEN_STORAGE_KEY: &str = "cocobase-token";

/// Storage key holding the cached user as JSON
pub const USER_STORAGE_KEY: &str = "cocobase-user";
