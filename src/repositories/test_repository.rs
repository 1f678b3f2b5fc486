use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::Database, errors::AppResult, models::domain::Test};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Test>>;
    /// Active test lookup; with `require_public` the test must also be
    /// open to everyone (the self-serve student flow).
    async fn find_active(&self, id: &str, require_public: bool) -> AppResult<Option<Test>>;
    async fn find_by_admin(&self, admin_id: &str) -> AppResult<Vec<Test>>;
    async fn find_by_class(&self, class_id: &str, admin_id: &str) -> AppResult<Vec<Test>>;
    async fn find_public_active(&self) -> AppResult<Vec<Test>>;
    async fn create(&self, test: Test) -> AppResult<Test>;
    async fn update(&self, test: Test) -> AppResult<Test>;
    async fn delete(&self, id: &str) -> AppResult<()>;
}

pub struct MongoTestRepository {
    collection: Collection<Test>,
}

impl MongoTestRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("tests");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for tests collection");

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
impl TestRepository for MongoTestRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Test>> {
        let test = self.collection.find_one(doc! { "id": id }).await?;
        Ok(test)
    }

    async fn find_active(&self, id: &str, require_public: bool) -> AppResult<Option<Test>> {
        let mut filter = doc! { "id": id, "is_active": true };
        if require_public {
            filter.insert("is_public", true);
        }

        let test = self.collection.find_one(filter).await?;
        Ok(test)
    }

    async fn find_by_admin(&self, admin_id: &str) -> AppResult<Vec<Test>> {
        let tests = self
            .collection
            .find(doc! { "admin_id": admin_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(tests)
    }

    async fn find_by_class(&self, class_id: &str, admin_id: &str) -> AppResult<Vec<Test>> {
        let tests = self
            .collection
            .find(doc! { "class_id": class_id, "admin_id": admin_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(tests)
    }

    async fn find_public_active(&self) -> AppResult<Vec<Test>> {
        let tests = self
            .collection
            .find(doc! { "is_active": true, "is_public": true })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(tests)
    }

    async fn create(&self, test: Test) -> AppResult<Test> {
        self.collection.insert_one(&test).await?;
        Ok(test)
    }

    async fn update(&self, test: Test) -> AppResult<Test> {
        self.collection
            .replace_one(doc! { "id": &test.id }, &test)
            .await?;
        Ok(test)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.collection.delete_one(doc! { "id": id }).await?;
        Ok(())
    }
}
