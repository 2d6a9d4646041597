use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::Client;

use crate::dbs::mongo::models::{MongoMessage, MongoThread, MongoUser};
use crate::dbs::mongo::repositories::{
    MongoMessageRepository, MongoThreadRepository, MongoUserRepository,
};
use crate::error::{PersistError, Result};
use crate::models::{NewUser, StoredMessage, Thread, User};
use crate::trait_client::{ConversationStore, UserStore};

pub struct MongoStore {
    message_repo: MongoMessageRepository,
    thread_repo: MongoThreadRepository,
    user_repo: MongoUserRepository,
}

impl MongoStore {
    /// Connect to MongoDB and create client
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        tracing::info!(database, "connected to MongoDB");

        Ok(Self {
            message_repo: MongoMessageRepository::new(&client, database),
            thread_repo: MongoThreadRepository::new(&client, database),
            user_repo: MongoUserRepository::new(&client, database),
        })
    }
}

#[async_trait]
impl ConversationStore for MongoStore {
    async fn create_thread(&self, thread: Thread) -> Result<()> {
        self.thread_repo.create_thread(thread.into()).await
    }

    async fn find_thread_by_owner(&self, owner_id: &str) -> Result<Option<Thread>> {
        Ok(self.thread_repo.find_by_owner(owner_id).await?.map(Thread::from))
    }

    async fn find_owned_thread(&self, thread_id: &str, owner_id: &str) -> Result<Option<Thread>> {
        Ok(self
            .thread_repo
            .find_owned(thread_id, owner_id)
            .await?
            .map(Thread::from))
    }

    async fn save_message(&self, message: StoredMessage) -> Result<()> {
        let mongo_message: MongoMessage = message.into();
        self.message_repo.save_message(mongo_message).await
    }

    async fn get_messages(&self, thread_id: &str) -> Result<Vec<StoredMessage>> {
        let messages = self.message_repo.get_messages(thread_id).await?;
        Ok(messages.into_iter().map(StoredMessage::from).collect())
    }

    async fn latest_message_at(&self, thread_id: &str) -> Result<Option<DateTime<Utc>>> {
        let latest = self.message_repo.latest_message(thread_id).await?;
        Ok(latest.map(|m| m.created_at))
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        if self.user_repo.find_by_email(&user.email).await?.is_some() {
            return Err(PersistError::DuplicateEmail(user.email));
        }

        let id = ObjectId::new();
        let mut user = user.into_user(id.to_hex(), Utc::now());
        user.email = user.email.to_lowercase();
        self.user_repo
            .insert(&MongoUser::from_user(id, user.clone()))
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.user_repo.find_by_email(email).await?.map(User::from))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        // Ids minted elsewhere can't match an ObjectId
        if ObjectId::parse_str(id).is_err() {
            return Ok(None);
        }
        Ok(self.user_repo.find_by_id(id).await?.map(User::from))
    }
}
