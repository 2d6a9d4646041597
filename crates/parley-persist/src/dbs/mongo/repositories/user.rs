use mongodb::{bson::doc, bson::oid::ObjectId, Client, Collection};

use crate::dbs::mongo::models::MongoUser;
use crate::error::{PersistError, Result};

#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<MongoUser>,
}

impl MongoUserRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("users");
        Self { collection }
    }

    pub async fn insert(&self, user: &MongoUser) -> Result<()> {
        self.collection.insert_one(user).await?;
        Ok(())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<MongoUser>> {
        let filter = doc! { "email": email.to_lowercase() };
        Ok(self.collection.find_one(filter).await?)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<MongoUser>> {
        let object_id =
            ObjectId::parse_str(id).map_err(|e| PersistError::InvalidObjectId(e.to_string()))?;
        Ok(self.collection.find_one(doc! { "_id": object_id }).await?)
    }
}
