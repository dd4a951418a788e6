use crate::domain::{
    Subscriber, SubscriberEmail, SubscriberId, SubscriberName, SubscriberStore,
    SubscriberStoreError,
};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

const DUPLICATE_KEY: i32 = 11000;

/// Shape of a subscriber inside the MongoDB collection.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriberDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub subscribed_at: BsonDateTime,
}

impl From<&Subscriber> for SubscriberDocument {
    fn from(subscriber: &Subscriber) -> Self {
        Self {
            id: subscriber.id.to_string(),
            name: subscriber.name.to_string(),
            email: subscriber.email.to_string(),
            subscribed_at: BsonDateTime::from_millis(subscriber.subscribed_at.timestamp_millis()),
        }
    }
}

impl TryFrom<SubscriberDocument> for Subscriber {
    type Error = anyhow::Error;

    fn try_from(document: SubscriberDocument) -> Result<Self, Self::Error> {
        let subscribed_at =
            DateTime::<Utc>::from_timestamp_millis(document.subscribed_at.timestamp_millis())
                .ok_or_else(|| anyhow!("{} has an out of range subscription date", document.id))?;

        Ok(Subscriber {
            id: SubscriberId::parse(&document.id).map_err(|e| anyhow!(e))?,
            name: SubscriberName::parse(document.name).map_err(|e| anyhow!(e))?,
            email: SubscriberEmail::parse(document.email).map_err(|e| anyhow!(e))?,
            subscribed_at,
        })
    }
}

/// Subscribers in a single MongoDB collection.
///
/// The unique index on `email` is created before the first write, so
/// concurrent sign-ups for the same address cannot both succeed even if
/// `apply_migrations` was never called.
#[derive(Debug, Clone)]
pub struct MongoDbSubscriberStore {
    collection: Collection<SubscriberDocument>,
    indexes_ready: OnceCell<()>,
}

impl MongoDbSubscriberStore {
    pub fn new(collection: Collection<SubscriberDocument>) -> Self {
        Self {
            collection,
            indexes_ready: OnceCell::new(),
        }
    }

    async fn ensure_indexes(&self) -> Result<(), SubscriberStoreError> {
        self.indexes_ready
            .get_or_try_init(|| async {
                let unique_email = IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(
                        IndexOptions::builder()
                            .unique(true)
                            .name("subscribers_email_unique".to_string())
                            .build(),
                    )
                    .build();

                self.collection
                    .create_index(unique_email, None)
                    .await
                    .context(format!(
                        "Failure creating indexes on MongoDB collection {}",
                        self.collection.name()
                    ))?;
                Ok::<(), anyhow::Error>(())
            })
            .await?;
        Ok(())
    }

    async fn email_taken_by_other(
        &self,
        subscriber: &Subscriber,
    ) -> Result<bool, SubscriberStoreError> {
        let filter = doc! {
            "email": subscriber.email.as_ref(),
            "_id": { "$ne": subscriber.id.to_string() },
        };
        let existing = self
            .collection
            .find_one(filter, None)
            .await
            .context("Failure querying subscribers by email in MongoDB")?;
        Ok(existing.is_some())
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn write_error(
    error: mongodb::error::Error,
    subscriber: &Subscriber,
    action: &str,
) -> SubscriberStoreError {
    if is_duplicate_key(&error) {
        SubscriberStoreError::DuplicateEmail(subscriber.email.to_string())
    } else {
        tracing::error!("Failed to execute query: {:?}", error);
        SubscriberStoreError::UnexpectedError(
            anyhow::Error::new(error).context(format!("Failure {} subscriber in MongoDB", action)),
        )
    }
}

#[async_trait]
impl SubscriberStore for MongoDbSubscriberStore {
    #[tracing::instrument(name = "List subscribers in MongoDB", skip(self))]
    async fn list(&self) -> Result<Vec<Subscriber>, SubscriberStoreError> {
        let options = FindOptions::builder().sort(doc! { "email": 1 }).build();
        let documents: Vec<SubscriberDocument> = self
            .collection
            .find(None, options)
            .await
            .context("Failure listing subscribers in MongoDB")?
            .try_collect()
            .await
            .context("Failure reading subscriber documents from MongoDB")?;

        let subscribers = documents
            .into_iter()
            .map(Subscriber::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subscribers)
    }

    #[tracing::instrument(name = "Find subscriber by id in MongoDB", skip(self))]
    async fn find_by_id(&self, id: SubscriberId) -> Result<Option<Subscriber>, SubscriberStoreError> {
        let document = self
            .collection
            .find_one(doc! { "_id": id.to_string() }, None)
            .await
            .context("Failure querying subscribers by id in MongoDB")?;

        Ok(document.map(Subscriber::try_from).transpose()?)
    }

    #[tracing::instrument(name = "Find subscriber by email in MongoDB", skip(self, email))]
    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, SubscriberStoreError> {
        let document = self
            .collection
            .find_one(doc! { "email": email.as_ref() }, None)
            .await
            .context("Failure querying subscribers by email in MongoDB")?;

        Ok(document.map(Subscriber::try_from).transpose()?)
    }

    #[tracing::instrument(
        name = "Insert subscriber in MongoDB",
        skip(self, subscriber),
        fields(subscriber_id = %subscriber.id)
    )]
    async fn insert(&self, subscriber: &Subscriber) -> Result<(), SubscriberStoreError> {
        self.ensure_indexes().await?;

        if self.exists(&subscriber.email).await? {
            return Err(SubscriberStoreError::DuplicateEmail(
                subscriber.email.to_string(),
            ));
        }

        self.collection
            .insert_one(SubscriberDocument::from(subscriber), None)
            .await
            .map_err(|e| write_error(e, subscriber, "inserting"))?;

        Ok(())
    }

    #[tracing::instrument(
        name = "Update subscriber in MongoDB",
        skip(self, subscriber),
        fields(subscriber_id = %subscriber.id)
    )]
    async fn update(&self, subscriber: &Subscriber) -> Result<(), SubscriberStoreError> {
        self.ensure_indexes().await?;

        // A missing id wins over a taken email.
        if self.find_by_id(subscriber.id).await?.is_none() {
            return Err(SubscriberStoreError::NotFound(subscriber.id.to_string()));
        }
        if self.email_taken_by_other(subscriber).await? {
            return Err(SubscriberStoreError::DuplicateEmail(
                subscriber.email.to_string(),
            ));
        }

        let result = self
            .collection
            .replace_one(
                doc! { "_id": subscriber.id.to_string() },
                SubscriberDocument::from(subscriber),
                None,
            )
            .await
            .map_err(|e| write_error(e, subscriber, "updating"))?;

        if result.matched_count == 0 {
            return Err(SubscriberStoreError::NotFound(subscriber.id.to_string()));
        }
        Ok(())
    }

    #[tracing::instrument(name = "Delete subscriber in MongoDB", skip(self, email))]
    async fn delete_by_email(&self, email: &SubscriberEmail) -> Result<(), SubscriberStoreError> {
        let result = self
            .collection
            .delete_one(doc! { "email": email.as_ref() }, None)
            .await
            .context("Failure deleting subscriber in MongoDB")?;

        if result.deleted_count == 0 {
            return Err(SubscriberStoreError::NotFound(email.to_string()));
        }
        Ok(())
    }

    #[tracing::instrument(name = "Create MongoDB subscriber indexes", skip(self))]
    async fn apply_migrations(&self) -> Result<(), SubscriberStoreError> {
        self.ensure_indexes().await
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}
