use serde::{Deserialize, Serialize};

/// Registered user document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
}

/// Request model for logging in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

/// Request model for registering a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
}

/// Identifier handed out to anonymous shoppers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymousId {
    pub uuid: String,
}

impl AnonymousId {
    pub fn from_counter(value: i64) -> Self {
        Self {
            uuid: format!("anonymous-{}", value),
        }
    }
}

impl From<RegisterRequest> for User {
    fn from(request: RegisterRequest) -> Self {
        Self {
            name: request.name.trim().to_string(),
            password: request.password,
            email: request.email.trim().to_string(),
        }
    }
}
