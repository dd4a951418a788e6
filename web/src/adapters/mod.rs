mod azure_blob_image_store;
mod in_memory_subscriber_store;
mod local_image_store;
mod mongodb_subscriber_store;

pub use azure_blob_image_store::AzureBlobImageStore;
pub use in_memory_subscriber_store::InMemorySubscriberStore;
pub use local_image_store::LocalImageStore;
pub use mongodb_subscriber_store::MongoDbSubscriberStore;
