use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::Database, errors::AppResult, models::domain::ClassGroup};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClassRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<ClassGroup>>;
    async fn find_by_id_and_admin(
        &self,
        id: &str,
        admin_id: &str,
    ) -> AppResult<Option<ClassGroup>>;
    async fn find_by_admin(&self, admin_id: &str) -> AppResult<Vec<ClassGroup>>;
    async fn create(&self, class: ClassGroup) -> AppResult<ClassGroup>;
    async fn update(&self, class: ClassGroup) -> AppResult<ClassGroup>;
    async fn delete(&self, id: &str) -> AppResult<()>;
}

pub struct MongoClassRepository {
    collection: Collection<ClassGroup>,
}

impl MongoClassRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("classes");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for classes collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let admin_index = IndexModel::builder()
            .keys(doc! { "admin_id": 1 })
            .options(IndexOptions::builder().name("admin_id".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(admin_index).await?;

        Ok(())
    }
}

#[async_trait]
impl ClassRepository for MongoClassRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<ClassGroup>> {
        let class = self.collection.find_one(doc! { "id": id }).await?;
        Ok(class)
    }

    async fn find_by_id_and_admin(
        &self,
        id: &str,
        admin_id: &str,
    ) -> AppResult<Option<ClassGroup>> {
        let class = self
            .collection
            .find_one(doc! { "id": id, "admin_id": admin_id })
            .await?;
        Ok(class)
    }

    async fn find_by_admin(&self, admin_id: &str) -> AppResult<Vec<ClassGroup>> {
        let classes = self
            .collection
            .find(doc! { "admin_id": admin_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(classes)
    }

    async fn create(&self, class: ClassGroup) -> AppResult<ClassGroup> {
        self.collection.insert_one(&class).await?;
        Ok(class)
    }

    async fn update(&self, class: ClassGroup) -> AppResult<ClassGroup> {
        self.collection
            .replace_one(doc! { "id": &class.id }, &class)
            .await?;
        Ok(class)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.collection.delete_one(doc! { "id": id }).await?;
        Ok(())
    }
}
