mod image;
mod image_store;
mod subscriber;
mod subscriber_email;
mod subscriber_name;
mod subscriber_store;

pub use image::{Image, ImageFormat, ImageId};
pub use image_store::{ImageStore, ImageStoreError};
pub use subscriber::{NewSubscriber, Subscriber, SubscriberId};
pub use subscriber_email::SubscriberEmail;
pub use subscriber_name::SubscriberName;
pub use subscriber_store::{SubscriberStore, SubscriberStoreError};
