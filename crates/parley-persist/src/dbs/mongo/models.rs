use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use parley_types::Role;
use serde::{Deserialize, Serialize};

use crate::models::{StoredMessage, Subscription, Thread, User};

/// MongoDB-specific Thread model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner_id: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// MongoDB-specific Message model (ObjectId gives the insertion tie-break)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner_id: Option<String>,
    pub role: Role,
    pub content: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSubscription {
    pub plan: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub end_date: Option<bson::DateTime>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUser {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lastname: Option<String>,
    pub subscription: MongoSubscription,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

// Conversions between database-agnostic and MongoDB-specific models

impl From<Thread> for MongoThread {
    fn from(thread: Thread) -> Self {
        Self {
            id: ObjectId::new(),
            thread_id: thread.thread_id,
            owner_id: thread.owner_id,
            created_at: thread.created_at,
        }
    }
}

impl From<MongoThread> for Thread {
    fn from(thread: MongoThread) -> Self {
        Self {
            thread_id: thread.thread_id,
            owner_id: thread.owner_id,
            created_at: thread.created_at,
        }
    }
}

impl From<StoredMessage> for MongoMessage {
    fn from(msg: StoredMessage) -> Self {
        Self {
            id: ObjectId::new(),
            thread_id: msg.thread_id,
            owner_id: msg.owner_id,
            role: msg.role,
            content: msg.content,
            created_at: msg.created_at,
        }
    }
}

impl From<MongoMessage> for StoredMessage {
    fn from(msg: MongoMessage) -> Self {
        Self {
            id: msg.id.to_hex(),
            thread_id: msg.thread_id,
            owner_id: msg.owner_id,
            role: msg.role,
            content: msg.content,
            created_at: msg.created_at,
        }
    }
}

impl From<Subscription> for MongoSubscription {
    fn from(sub: Subscription) -> Self {
        Self {
            plan: sub.plan,
            start_date: sub.start_date,
            end_date: sub.end_date.map(bson::DateTime::from_chrono),
            status: sub.status,
        }
    }
}

impl From<MongoSubscription> for Subscription {
    fn from(sub: MongoSubscription) -> Self {
        Self {
            plan: sub.plan,
            start_date: sub.start_date,
            end_date: sub.end_date.map(|d| d.to_chrono()),
            status: sub.status,
        }
    }
}

impl MongoUser {
    pub fn from_user(id: ObjectId, user: User) -> Self {
        Self {
            id,
            email: user.email,
            password: user.password_hash,
            name: user.name,
            username: user.username,
            phone: user.phone,
            lastname: user.lastname,
            subscription: user.subscription.into(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<MongoUser> for User {
    fn from(user: MongoUser) -> Self {
        Self {
            id: user.id.to_hex(),
            email: user.email,
            password_hash: user.password,
            name: user.name,
            username: user.username,
            phone: user.phone,
            lastname: user.lastname,
            subscription: user.subscription.into(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
