use mongodb::{bson::doc, Client, Collection};

use crate::dbs::mongo::models::MongoThread;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoThreadRepository {
    collection: Collection<MongoThread>,
}

impl MongoThreadRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self { collection }
    }

    pub async fn create_thread(&self, thread: MongoThread) -> Result<()> {
        self.collection.insert_one(&thread).await?;
        Ok(())
    }

    /// Most recent thread for an owner
    pub async fn find_by_owner(&self, owner_id: &str) -> Result<Option<MongoThread>> {
        let filter = doc! { "owner_id": owner_id };
        Ok(self
            .collection
            .find_one(filter)
            .sort(doc! { "created_at": -1, "_id": -1 })
            .await?)
    }

    pub async fn find_owned(&self, thread_id: &str, owner_id: &str) -> Result<Option<MongoThread>> {
        let filter = doc! { "thread_id": thread_id, "owner_id": owner_id };
        Ok(self.collection.find_one(filter).await?)
    }
}
