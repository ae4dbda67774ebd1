use crate::error::AppError;
use crate::models::{Bootcamp, Course, Review, User};
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Client as MongoClient, Collection, Database, IndexModel,
};

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for bootcamp-service");

        // Unique email for account lookup and duplicate prevention
        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(
                        IndexOptions::builder()
                            .name("email_unique".to_string())
                            .unique(true)
                            .build(),
                    )
                    .build(),
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to create email index on users: {}", e);
                AppError::from(e)
            })?;

        // 2dsphere index for $geoWithin radius queries
        self.bootcamps()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "location": "2dsphere" })
                    .options(
                        IndexOptions::builder()
                            .name("location_geo".to_string())
                            .build(),
                    )
                    .build(),
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to create geo index on bootcamps: {}", e);
                AppError::from(e)
            })?;

        // Owner lookup for the single-ownership check and ownership gates
        self.bootcamps()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user": 1 })
                    .options(
                        IndexOptions::builder()
                            .name("owner_lookup".to_string())
                            .build(),
                    )
                    .build(),
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to create owner index on bootcamps: {}", e);
                AppError::from(e)
            })?;

        // Parent lookup for nested course listings and aggregate recomputes
        self.courses()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "bootcamp": 1 })
                    .options(
                        IndexOptions::builder()
                            .name("bootcamp_lookup".to_string())
                            .build(),
                    )
                    .build(),
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to create bootcamp index on courses: {}", e);
                AppError::from(e)
            })?;

        // One review per (bootcamp, user)
        self.reviews()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "bootcamp": 1, "user": 1 })
                    .options(
                        IndexOptions::builder()
                            .name("one_review_per_user".to_string())
                            .unique(true)
                            .build(),
                    )
                    .build(),
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to create review uniqueness index: {}", e);
                AppError::from(e)
            })?;

        tracing::info!("MongoDB indexes created");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn bootcamps(&self) -> Collection<Bootcamp> {
        self.db.collection("bootcamps")
    }

    pub fn courses(&self) -> Collection<Course> {
        self.db.collection("courses")
    }

    pub fn reviews(&self) -> Collection<Review> {
        self.db.collection("reviews")
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    /// Whether an email is already registered. `exclude_user_id` lets update
    /// paths skip the account being updated, so the check fires on the same
    /// inputs that would trip the unique email index.
    pub async fn email_taken(
        &self,
        email: &str,
        exclude_user_id: Option<&str>,
    ) -> Result<bool, AppError> {
        let existing = self
            .users()
            .find_one(email_filter(email, exclude_user_id), None)
            .await
            .map_err(AppError::from)?;
        Ok(existing.is_some())
    }

    /// Recompute a bootcamp's average tuition from its courses. The mean is
    /// rounded up to the nearest 10; no courses clears the field.
    pub async fn recompute_average_cost(&self, bootcamp_id: &str) -> Result<(), AppError> {
        let pipeline = vec![
            doc! { "$match": { "bootcamp": bootcamp_id } },
            doc! { "$group": { "_id": "$bootcamp", "average": { "$avg": "$tuition" } } },
        ];

        let mut cursor = self
            .courses()
            .aggregate(pipeline, None)
            .await
            .map_err(AppError::from)?;

        let update = match cursor.try_next().await.map_err(AppError::from)? {
            Some(group) => {
                let average = group.get_f64("average").unwrap_or(0.0);
                let rounded = (average / 10.0).ceil() * 10.0;
                doc! { "$set": { "average_cost": rounded } }
            }
            None => doc! { "$unset": { "average_cost": "" } },
        };

        self.bootcamps()
            .update_one(doc! { "_id": bootcamp_id }, update, None)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    /// Recompute a bootcamp's average rating from its reviews; no reviews
    /// clears the field.
    pub async fn recompute_average_rating(&self, bootcamp_id: &str) -> Result<(), AppError> {
        let pipeline = vec![
            doc! { "$match": { "bootcamp": bootcamp_id } },
            doc! { "$group": { "_id": "$bootcamp", "average": { "$avg": "$rating" } } },
        ];

        let mut cursor = self
            .reviews()
            .aggregate(pipeline, None)
            .await
            .map_err(AppError::from)?;

        let update = match cursor.try_next().await.map_err(AppError::from)? {
            Some(group) => {
                let average = group.get_f64("average").unwrap_or(0.0);
                doc! { "$set": { "average_rating": average } }
            }
            None => doc! { "$unset": { "average_rating": "" } },
        };

        self.bootcamps()
            .update_one(doc! { "_id": bootcamp_id }, update, None)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}

fn email_filter(email: &str, exclude_user_id: Option<&str>) -> Document {
    let mut filter = doc! { "email": email };
    if let Some(id) = exclude_user_id {
        filter.insert("_id", doc! { "$ne": id });
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_lookup_excludes_the_updated_account() {
        assert_eq!(email_filter("a@b.com", None), doc! { "email": "a@b.com" });
        assert_eq!(
            email_filter("a@b.com", Some("u1")),
            doc! { "email": "a@b.com", "_id": { "$ne": "u1" } }
        );
    }
}
