use crate::domain::subscriber::{Subscriber, SubscriberId};
use crate::domain::subscriber_email::SubscriberEmail;
use crate::utils::error_chain_fmt;
use async_trait::async_trait;

#[derive(thiserror::Error)]
pub enum SubscriberStoreError {
    #[error("A subscriber with the email {0} already exists.")]
    DuplicateEmail(String),
    #[error("No subscriber matches {0}.")]
    NotFound(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscriberStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Persistence for newsletter subscribers.
///
/// Every backend reports the same outcomes for the same calls: an email is
/// unique across the store, writes against a missing record are `NotFound`,
/// and anything the backend itself trips over is an `UnexpectedError`.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// All subscribers, ordered by email.
    async fn list(&self) -> Result<Vec<Subscriber>, SubscriberStoreError>;

    async fn find_by_id(&self, id: SubscriberId) -> Result<Option<Subscriber>, SubscriberStoreError>;

    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, SubscriberStoreError>;

    async fn exists(&self, email: &SubscriberEmail) -> Result<bool, SubscriberStoreError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn insert(&self, subscriber: &Subscriber) -> Result<(), SubscriberStoreError>;

    /// Replaces the record sharing `subscriber.id`.
    async fn update(&self, subscriber: &Subscriber) -> Result<(), SubscriberStoreError>;

    async fn delete_by_email(&self, email: &SubscriberEmail) -> Result<(), SubscriberStoreError>;

    async fn apply_migrations(&self) -> Result<(), SubscriberStoreError>;

    fn backend_name(&self) -> &'static str;
}
