/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Document and user models with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form JSON object stored in documents and user profiles
pub type JsonObject = Map<String, Value>;

/// A document stored in a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub data: JsonObject,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Decode the document payload into a typed struct
    pub fn data_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(Value::Object(self.data.clone()))
    }
}

/// An authenticated application user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub data: JsonObject,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AppUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Fields to change on the current user; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub data: Option<JsonObject>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UserUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(mut self, data: JsonObject) -> Self {
        self.data = Some(data);
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}
