use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: String,
}

impl Subscription {
    /// Plan every new account starts on
    pub fn free(now: DateTime<Utc>) -> Self {
        Self {
            plan: "free".to_string(),
            start_date: now,
            end_date: None,
            status: "active".to_string(),
        }
    }

    /// Active status with no end date, or an end date not yet passed
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == "active" && self.end_date.map_or(true, |end| end >= now)
    }
}

/// Account record. Credential checks live with the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub lastname: Option<String>,
    pub subscription: Subscription,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name shown to operators: name, then username
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.username.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or("Unknown")
    }
}

/// Fields supplied at registration
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub lastname: Option<String>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            ..Default::default()
        }
    }

    pub fn into_user(self, id: String, now: DateTime<Utc>) -> User {
        User {
            id,
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            username: self.username,
            phone: self.phone,
            lastname: self.lastname,
            subscription: Subscription::free(now),
            created_at: now,
            updated_at: now,
        }
    }
}
