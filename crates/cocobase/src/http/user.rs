/*
[INPUT]:  Credentials, profile updates and the persisted session
[OUTPUT]: Bearer token and cached user profile
[POS]:    HTTP layer - auth-collection endpoints (login, signup, profile)
[UPDATE]: When auth endpoints or session persistence change
*/

// ### User Endpoints

use reqwest::Method;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::auth::{TOKEN_STORAGE_KEY, USER_STORAGE_KEY};
use crate::http::{CocobaseClient, CocobaseError, Result};
use crate::types::{AppUser, JsonObject, TokenResponse, UserUpdate};

impl CocobaseClient {
    /// Current bearer token
    pub fn token(&self) -> Option<String> {
        self.session.token()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Cached user, set by login/register/get_current_user
    pub fn current_user(&self) -> Option<AppUser> {
        self.session.user()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.session.has_role(role)
    }

    /// Adopt a token and persist it when storage is configured
    pub async fn set_token(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        self.session.set_token(token.clone());

        if let Some(storage) = &self.storage {
            storage.set(TOKEN_STORAGE_KEY, &token).await?;
        }
        Ok(())
    }

    /// Restore a stored session
    ///
    /// No-op without storage or without a stored token. A restored token is
    /// validated by fetching the current user.
    pub async fn init_auth(&self) -> Result<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };

        let token = match storage.get(TOKEN_STORAGE_KEY).await {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => return Ok(()),
            Err(err) => {
                warn!(error = %err, "failed to read stored token");
                return Ok(());
            }
        };

        self.session.set_token(token);
        let user = self.get_current_user().await?;
        info!(user_id = %user.id, "session restored");
        Ok(())
    }

    /// Sign in with email and password
    ///
    /// POST /auth-collections/login
    pub async fn login(&self, email: &str, password: &str) -> Result<AppUser> {
        let url = self.endpoint(&["auth-collections", "login"])?;
        let body = json!({
            "email": email,
            "password": password,
        });

        let token: TokenResponse = self.send_json(Method::POST, url, Some(body), false).await?;
        let user = self.complete_sign_in(token).await?;
        info!(user_id = %user.id, "logged in");
        Ok(user)
    }

    /// Create an account and sign in
    ///
    /// POST /auth-collections/signup
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        data: Option<JsonObject>,
    ) -> Result<AppUser> {
        let url = self.endpoint(&["auth-collections", "signup"])?;
        let mut body = json!({
            "email": email,
            "password": password,
        });
        if let Some(data) = data {
            body["data"] = Value::Object(data);
        }

        let token: TokenResponse = self.send_json(Method::POST, url, Some(body), false).await?;
        let user = self.complete_sign_in(token).await?;
        info!(user_id = %user.id, "registered");
        Ok(user)
    }

    async fn complete_sign_in(&self, token: TokenResponse) -> Result<AppUser> {
        self.set_token(token.access_token).await?;
        self.get_current_user().await
    }

    /// Drop the session and remove it from storage
    pub async fn logout(&self) -> Result<()> {
        self.session.clear();

        if let Some(storage) = &self.storage {
            storage.delete(TOKEN_STORAGE_KEY).await?;
            storage.delete(USER_STORAGE_KEY).await?;
        }
        info!("logged out");
        Ok(())
    }

    /// Fetch the signed-in user and refresh the cached copy
    ///
    /// GET /auth-collections/user
    pub async fn get_current_user(&self) -> Result<AppUser> {
        if !self.is_authenticated() {
            return Err(CocobaseError::NotAuthenticated);
        }

        let url = self.endpoint(&["auth-collections", "user"])?;
        let user: AppUser = self.send_json(Method::GET, url, None, true).await?;

        self.session.set_user(user.clone());
        self.persist_user(&user).await;
        Ok(user)
    }

    /// Update the signed-in user
    ///
    /// `data` is shallow-merged over the cached user's data before sending.
    ///
    /// PATCH /auth-collections/user
    pub async fn update_user(&self, update: UserUpdate) -> Result<AppUser> {
        if !self.is_authenticated() {
            return Err(CocobaseError::NotAuthenticated);
        }

        let mut body = JsonObject::new();
        if let Some(data) = update.data {
            let merged = merge_data(self.session.user_data(), data);
            body.insert("data".to_string(), Value::Object(merged));
        }
        if let Some(email) = update.email {
            body.insert("email".to_string(), Value::String(email));
        }
        if let Some(password) = update.password {
            body.insert("password".to_string(), Value::String(password));
        }

        let url = self.endpoint(&["auth-collections", "user"])?;
        let user: AppUser = self
            .send_json(Method::PATCH, url, Some(Value::Object(body)), false)
            .await?;

        self.session.set_user(user.clone());
        self.persist_user(&user).await;
        Ok(user)
    }

    async fn persist_user(&self, user: &AppUser) {
        let Some(storage) = &self.storage else {
            return;
        };

        let result = match serde_json::to_string(user) {
            Ok(raw) => storage.set(USER_STORAGE_KEY, &raw).await,
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            warn!(error = %err, "failed to persist user");
        }
    }
}

/// Shallow merge; keys in `updates` win
fn merge_data(mut current: JsonObject, updates: JsonObject) -> JsonObject {
    current.extend(updates);
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use async_trait::async_trait;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::ClientConfig;
    use crate::storage::{MemoryStorage, Storage};

    fn config_for(server: &MockServer) -> ClientConfig {
        ClientConfig::new("test-key").with_base_url(server.uri())
    }

    fn user_json(data: Value) -> Value {
        json!({
            "id": "user-1",
            "email": "ada@example.com",
            "roles": ["admin"],
            "data": data,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    async fn mount_current_user(server: &MockServer, token: &str, data: Value) {
        Mock::given(method("GET"))
            .and(path("/auth-collections/user"))
            .and(header("authorization", format!("Bearer {token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json(data)))
            .mount(server)
            .await;
    }

    #[derive(Debug)]
    struct FailingStorage;

    #[async_trait]
    impl Storage for FailingStorage {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(CocobaseError::Storage("unavailable".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(CocobaseError::Storage("unavailable".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Err(CocobaseError::Storage("unavailable".to_string()))
        }
    }

    #[test]
    fn test_merge_data_updates_win() {
        let current = json!({"theme": "light", "lang": "en"});
        let updates = json!({"theme": "dark"});
        let merged = merge_data(
            current.as_object().cloned().unwrap(),
            updates.as_object().cloned().unwrap(),
        );
        assert_eq!(Value::Object(merged), json!({"theme": "dark", "lang": "en"}));
    }

    #[tokio::test]
    async fn test_login_stores_token_and_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth-collections/login"))
            .and(body_json(json!({
                "email": "ada@example.com",
                "password": "secret",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-token",
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_current_user(&server, "jwt-token", json!({})).await;

        let storage = Arc::new(MemoryStorage::new());
        let client = CocobaseClient::with_storage(config_for(&server), storage.clone()).unwrap();

        let user = client.login("ada@example.com", "secret").await.unwrap();

        assert_eq!(user.id, "user-1");
        assert_eq!(client.token(), Some("jwt-token".to_string()));
        assert!(client.has_role("admin"));
        assert_eq!(
            storage.get(TOKEN_STORAGE_KEY).await.unwrap(),
            Some("jwt-token".to_string())
        );
        let cached: AppUser =
            serde_json::from_str(&storage.get(USER_STORAGE_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(cached.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_register_sends_optional_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth-collections/signup"))
            .and(body_json(json!({
                "email": "ada@example.com",
                "password": "secret",
                "data": {"name": "Ada"},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new-token",
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_current_user(&server, "new-token", json!({"name": "Ada"})).await;

        let client = CocobaseClient::with_config(config_for(&server)).unwrap();
        let data = json!({"name": "Ada"}).as_object().cloned();
        let user = client
            .register("ada@example.com", "secret", data)
            .await
            .unwrap();

        assert_eq!(user.data["name"], "Ada");
        assert!(client.is_authenticated());
    }

    #[tokio::test]
    async fn test_register_without_data_omits_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth-collections/signup"))
            .and(body_json(json!({
                "email": "ada@example.com",
                "password": "secret",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new-token",
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_current_user(&server, "new-token", json!({})).await;

        let client = CocobaseClient::with_config(config_for(&server)).unwrap();
        client
            .register("ada@example.com", "secret", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_login_keeps_session_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth-collections/login"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let client = CocobaseClient::with_config(config_for(&server)).unwrap();
        let err = client.login("ada@example.com", "wrong").await.unwrap_err();

        assert!(err.is_auth_error());
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn test_get_current_user_requires_token() {
        let client = CocobaseClient::new("key").unwrap();
        let err = client.get_current_user().await.unwrap_err();
        assert!(matches!(err, CocobaseError::NotAuthenticated));

        let err = client.update_user(UserUpdate::new()).await.unwrap_err();
        assert!(matches!(err, CocobaseError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_update_user_merges_cached_data() {
        let server = MockServer::start().await;
        mount_current_user(&server, "tok", json!({"theme": "light", "lang": "en"})).await;
        Mock::given(method("PATCH"))
            .and(path("/auth-collections/user"))
            .and(body_json(json!({
                "data": {"theme": "dark", "lang": "en"},
                "email": "new@example.com",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(user_json(json!({"theme": "dark", "lang": "en"}))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = CocobaseClient::with_config(config_for(&server)).unwrap();
        client.set_token("tok").await.unwrap();
        client.get_current_user().await.unwrap();

        let update = UserUpdate::new()
            .data(json!({"theme": "dark"}).as_object().cloned().unwrap())
            .email("new@example.com");
        let user = client.update_user(update).await.unwrap();

        assert_eq!(user.data["theme"], "dark");
        assert_eq!(client.current_user().unwrap().data["theme"], "dark");
    }

    #[tokio::test]
    async fn test_logout_clears_storage() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_STORAGE_KEY, "tok").await.unwrap();
        storage.set(USER_STORAGE_KEY, "{}").await.unwrap();

        let client = CocobaseClient::with_storage(ClientConfig::new("key"), storage.clone()).unwrap();
        client.set_token("tok").await.unwrap();
        client.logout().await.unwrap();

        assert!(!client.is_authenticated());
        assert!(client.current_user().is_none());
        assert_eq!(storage.get(TOKEN_STORAGE_KEY).await.unwrap(), None);
        assert_eq!(storage.get(USER_STORAGE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_init_auth_without_storage_is_noop() {
        let client = CocobaseClient::new("key").unwrap();
        client.init_auth().await.unwrap();
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn test_init_auth_without_stored_token_is_noop() {
        let client =
            CocobaseClient::with_storage(ClientConfig::new("key"), Arc::new(MemoryStorage::new()))
                .unwrap();
        client.init_auth().await.unwrap();
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn test_init_auth_restores_session() {
        let server = MockServer::start().await;
        mount_current_user(&server, "stored-token", json!({})).await;

        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_STORAGE_KEY, "stored-token").await.unwrap();

        let client = CocobaseClient::with_storage(config_for(&server), storage).unwrap();
        client.init_auth().await.unwrap();

        assert_eq!(client.token(), Some("stored-token".to_string()));
        assert_eq!(client.current_user().unwrap().id, "user-1");
    }

    #[tokio::test]
    async fn test_user_cache_failure_is_not_fatal() {
        let server = MockServer::start().await;
        mount_current_user(&server, "tok", json!({})).await;

        let client = CocobaseClient::with_storage(config_for(&server), Arc::new(FailingStorage))
            .unwrap();
        client.session().set_token("tok");

        let user = client.get_current_user().await.unwrap();
        assert_eq!(user.id, "user-1");

        client.init_auth().await.unwrap();
        let err = client.set_token("other").await.unwrap_err();
        assert!(matches!(err, CocobaseError::Storage(_)));
    }
}
