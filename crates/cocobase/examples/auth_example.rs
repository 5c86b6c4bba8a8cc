/*
[INPUT]:  COCOBASE_API_KEY, COCOBASE_EMAIL, COCOBASE_PASSWORD
[OUTPUT]: Logged-in user and a session file restored by a second client
[POS]:    Examples - authentication flow with persisted session
[UPDATE]: When auth flow changes
*/

use std::sync::Arc;

use cocobase::*;

/// Example: authentication flow
///
/// 1. Log in with a file-backed session
/// 2. Restore the session in a fresh client
/// 3. Log out
#[tokio::main]
async fn main() {
    println!("=== Cocobase Authentication Example ===\n");

    let api_key = std::env::var("COCOBASE_API_KEY").unwrap_or_default();
    let email = std::env::var("COCOBASE_EMAIL").unwrap_or_else(|_| "demo@example.com".to_string());
    let password = std::env::var("COCOBASE_PASSWORD").unwrap_or_else(|_| "password".to_string());
    let session_path = std::env::temp_dir().join("cocobase-auth-example.json");

    let storage = match FileStorage::open(&session_path).await {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            eprintln!("Failed to open session file: {}", e);
            return;
        }
    };

    let client = match CocobaseClient::with_storage(ClientConfig::new(api_key.clone()), storage) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    match client.login(&email, &password).await {
        Ok(user) => {
            println!("✓ Logged in as {} ({})", user.email, user.id);
            if let Some(expires_at) = client.session().token_expires_at() {
                println!("  Token expires at {}", expires_at);
            }
        }
        Err(e) => {
            eprintln!("✗ Login failed: {}", e);
            return;
        }
    }

    // Step 2: a new client picks the session up from disk
    let storage = match FileStorage::open(&session_path).await {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            eprintln!("Failed to reopen session file: {}", e);
            return;
        }
    };
    let restored = match CocobaseClient::with_storage(ClientConfig::new(api_key), storage) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    match restored.init_auth().await {
        Ok(()) => println!(
            "✓ Session restored, authenticated: {}",
            restored.is_authenticated()
        ),
        Err(e) => eprintln!("✗ Restore failed: {}", e),
    }

    if let Err(e) = restored.logout().await {
        eprintln!("✗ Logout failed: {}", e);
        return;
    }
    println!("✓ Logged out");
}
