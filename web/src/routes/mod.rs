mod health_check;
mod home;
mod images;
mod layout;
mod migrate;
mod newsletter;

pub use health_check::health_check;
pub use home::{error, index, privacy, HeroImage};
pub use images::{get_image, upload_image};
pub use migrate::migrate_db;
pub use newsletter::{subscribe, subscribe_form, subscribers, unsubscribe, unsubscribe_form};
