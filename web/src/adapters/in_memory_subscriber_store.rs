use crate::domain::{
    Subscriber, SubscriberEmail, SubscriberId, SubscriberStore, SubscriberStoreError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct InMemorySubscriberStore {
    subscribers: RwLock<HashMap<SubscriberId, Subscriber>>,
}

impl InMemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken_by_other(
    subscribers: &HashMap<SubscriberId, Subscriber>,
    candidate: &Subscriber,
) -> bool {
    subscribers
        .values()
        .any(|s| s.email == candidate.email && s.id != candidate.id)
}

#[async_trait]
impl SubscriberStore for InMemorySubscriberStore {
    #[tracing::instrument(name = "List subscribers in memory", skip(self))]
    async fn list(&self) -> Result<Vec<Subscriber>, SubscriberStoreError> {
        let mut subscribers: Vec<Subscriber> =
            self.subscribers.read().await.values().cloned().collect();
        subscribers.sort_by(|a, b| a.email.as_ref().cmp(b.email.as_ref()));
        Ok(subscribers)
    }

    async fn find_by_id(&self, id: SubscriberId) -> Result<Option<Subscriber>, SubscriberStoreError> {
        Ok(self.subscribers.read().await.get(&id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, SubscriberStoreError> {
        Ok(self
            .subscribers
            .read()
            .await
            .values()
            .find(|s| &s.email == email)
            .cloned())
    }

    #[tracing::instrument(
        name = "Insert subscriber in memory",
        skip(self, subscriber),
        fields(subscriber_id = %subscriber.id)
    )]
    async fn insert(&self, subscriber: &Subscriber) -> Result<(), SubscriberStoreError> {
        let mut subscribers = self.subscribers.write().await;
        if subscribers.contains_key(&subscriber.id) || email_taken_by_other(&subscribers, subscriber)
        {
            return Err(SubscriberStoreError::DuplicateEmail(
                subscriber.email.to_string(),
            ));
        }
        subscribers.insert(subscriber.id, subscriber.clone());
        Ok(())
    }

    #[tracing::instrument(
        name = "Update subscriber in memory",
        skip(self, subscriber),
        fields(subscriber_id = %subscriber.id)
    )]
    async fn update(&self, subscriber: &Subscriber) -> Result<(), SubscriberStoreError> {
        let mut subscribers = self.subscribers.write().await;
        if !subscribers.contains_key(&subscriber.id) {
            return Err(SubscriberStoreError::NotFound(subscriber.id.to_string()));
        }
        if email_taken_by_other(&subscribers, subscriber) {
            return Err(SubscriberStoreError::DuplicateEmail(
                subscriber.email.to_string(),
            ));
        }
        subscribers.insert(subscriber.id, subscriber.clone());
        Ok(())
    }

    #[tracing::instrument(name = "Delete subscriber in memory", skip(self, email))]
    async fn delete_by_email(&self, email: &SubscriberEmail) -> Result<(), SubscriberStoreError> {
        let mut subscribers = self.subscribers.write().await;
        let id = subscribers
            .values()
            .find(|s| &s.email == email)
            .map(|s| s.id)
            .ok_or_else(|| SubscriberStoreError::NotFound(email.to_string()))?;
        subscribers.remove(&id);
        Ok(())
    }

    async fn apply_migrations(&self) -> Result<(), SubscriberStoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "in_memory"
    }
}
