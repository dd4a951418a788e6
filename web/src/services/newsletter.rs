use crate::domain::{NewSubscriber, Subscriber, SubscriberEmail, SubscriberStore, SubscriberStoreError};
use crate::utils::error_chain_fmt;
use anyhow::Context;
use std::sync::Arc;

#[derive(thiserror::Error)]
pub enum SignUpError {
    #[error("You are already subscribed to our newsletter.")]
    AlreadySubscribed,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SignUpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(thiserror::Error)]
pub enum OptOutError {
    #[error("We couldn't find your subscription in our system.")]
    NotSubscribed,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for OptOutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Sign-up and opt-out rules on top of whichever subscriber store is active.
#[derive(Clone)]
pub struct NewsletterService {
    store: Arc<dyn SubscriberStore>,
}

impl NewsletterService {
    pub fn new(store: Arc<dyn SubscriberStore>) -> Self {
        Self { store }
    }

    pub fn welcome_message(subscriber: &Subscriber) -> String {
        format!(
            "Welcome to our newsletter, {}! You'll receive updates soon.",
            subscriber.name
        )
    }

    pub fn farewell_message() -> &'static str {
        "You have been successfully removed from our newsletter. We're sorry to see you go!"
    }

    #[tracing::instrument(
        name = "Signing up for the newsletter",
        skip(self, new_subscriber),
        fields(subscriber_email = %new_subscriber.email)
    )]
    pub async fn sign_up(&self, new_subscriber: NewSubscriber) -> Result<Subscriber, SignUpError> {
        let already_subscribed = self
            .store
            .exists(&new_subscriber.email)
            .await
            .context("Failed to check for an existing subscription.")?;
        if already_subscribed {
            return Err(SignUpError::AlreadySubscribed);
        }

        let subscriber = Subscriber::register(new_subscriber);
        match self.store.insert(&subscriber).await {
            Ok(()) => {
                tracing::info!(subscriber_id = %subscriber.id, "New subscriber saved");
                Ok(subscriber)
            }
            Err(SubscriberStoreError::DuplicateEmail(_)) => Err(SignUpError::AlreadySubscribed),
            Err(e) => Err(anyhow::Error::new(e)
                .context("Failed to insert new subscriber in the store.")
                .into()),
        }
    }

    #[tracing::instrument(
        name = "Opting out of the newsletter",
        skip(self, email),
        fields(subscriber_email = %email)
    )]
    pub async fn opt_out(&self, email: &SubscriberEmail) -> Result<(), OptOutError> {
        match self.store.delete_by_email(email).await {
            Ok(()) => Ok(()),
            Err(SubscriberStoreError::NotFound(_)) => Err(OptOutError::NotSubscribed),
            Err(e) => Err(anyhow::Error::new(e)
                .context("Failed to remove subscriber from the store.")
                .into()),
        }
    }

    #[tracing::instrument(name = "Listing active subscribers", skip(self))]
    pub async fn active_subscribers(&self) -> Result<Vec<Subscriber>, anyhow::Error> {
        self.store
            .list()
            .await
            .context("Failed to list subscribers from the store.")
    }
}
