use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| format!("{} is not a valid subscriber id.", s))
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Sign-up request, validated but not yet stored.
#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub name: SubscriberName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub name: SubscriberName,
    pub email: SubscriberEmail,
    pub subscribed_at: DateTime<Utc>,
}

impl Subscriber {
    pub fn register(new_subscriber: NewSubscriber) -> Self {
        Self {
            id: SubscriberId::generate(),
            name: new_subscriber.name,
            email: new_subscriber.email,
            subscribed_at: Utc::now(),
        }
    }
}
